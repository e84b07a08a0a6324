use tracing::{debug, info};

use crate::api::{route_with_fallback, RoadRouter};
use crate::config::DispatchConfig;
use crate::domain::hospital::Hospital;
use crate::geo::{self, LatLon};

#[derive(Debug, Clone, Copy, Default)]
pub struct DetourStats {
    /// Arcs whose straight segment crossed the closure tube.
    pub checked: usize,
    /// Arcs whose replacement route actually took the detour waypoint.
    pub rerouted: usize,
}

/// Rewrites the arcs affected by a road closure with real detoured
/// durations. Entries only ever increase: a sentinel (or a router that
/// happens to find a shorter path) must never make the disruption look
/// like an improvement, and infinities would make the solver drop the
/// arcs instead of detouring.
pub async fn apply_detour_durations<R: RoadRouter>(
    matrix: &mut [Vec<f64>],
    hospitals: &[Hospital],
    avoid: LatLon,
    router: &R,
    config: &DispatchConfig,
) -> DetourStats {
    let n = hospitals.len();
    let mut stats = DetourStats::default();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }

            let origin = hospitals[i].position();
            let dest = hospitals[j].position();

            // Cheap pre-filter before the 11-sample tube test.
            if geo::haversine_km(origin, avoid) > config.prefilter_radius_km
                && geo::haversine_km(dest, avoid) > config.prefilter_radius_km
            {
                continue;
            }
            if !geo::segment_near_point(origin, dest, avoid, config.impact_radius_km) {
                continue;
            }

            stats.checked += 1;
            let routed = route_with_fallback(router, origin, dest, Some(avoid)).await;
            let original = matrix[i][j];
            matrix[i][j] = original.max(routed.duration_min);
            if routed.detoured {
                stats.rerouted += 1;
            }
            debug!(
                from = %hospitals[i].name,
                to = %hospitals[j].name,
                original,
                rewritten = matrix[i][j],
                "arc rewritten around closure"
            );
        }
    }

    info!(
        checked = stats.checked,
        rerouted = stats.rerouted,
        "closure applied to travel-time matrix"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RouteData, SnappedPoint};
    use crate::domain::hospital::Tier;

    struct StubRouter {
        duration_min: f64,
    }

    impl RoadRouter for StubRouter {
        async fn snap(&self, _point: LatLon) -> Option<SnappedPoint> {
            None
        }

        async fn route(
            &self,
            origin: LatLon,
            dest: LatLon,
            avoid: Option<LatLon>,
        ) -> Option<RouteData> {
            Some(RouteData {
                duration_min: self.duration_min,
                distance_km: geo::haversine_km(origin, dest),
                geometry: vec![(origin.lat, origin.lon), (dest.lat, dest.lon)],
                detoured: avoid.is_some(),
            })
        }
    }

    fn hospitals() -> Vec<Hospital> {
        [
            ("Source", -34.00, 150.00, Tier::Source),
            ("Near", -34.00, 150.40, Tier::Metro),
            ("Far", -36.50, 148.00, Tier::Remote),
        ]
        .into_iter()
        .map(|(name, lat, lon, tier)| Hospital {
            name: name.to_string(),
            lat,
            lon,
            tier,
            kind: "General".to_string(),
        })
        .collect()
    }

    #[tokio::test]
    async fn cells_never_decrease() {
        let hs = hospitals();
        let mut matrix = vec![
            vec![0.0, 30.0, 200.0],
            vec![30.0, 0.0, 180.0],
            vec![200.0, 180.0, 0.0],
        ];
        let original = matrix.clone();
        // Router reports a duration shorter than the existing estimates;
        // the max guard must keep every cell at least as large.
        let router = StubRouter { duration_min: 5.0 };
        let avoid = LatLon::new(-34.0, 150.2);

        apply_detour_durations(&mut matrix, &hs, avoid, &router, &DispatchConfig::default()).await;

        for i in 0..3 {
            for j in 0..3 {
                assert!(matrix[i][j] >= original[i][j]);
            }
        }
    }

    #[tokio::test]
    async fn impacted_arcs_take_the_detour_duration() {
        let hs = hospitals();
        let mut matrix = vec![
            vec![0.0, 30.0, 200.0],
            vec![30.0, 0.0, 180.0],
            vec![200.0, 180.0, 0.0],
        ];
        let router = StubRouter { duration_min: 95.0 };
        // Sits on the Source->Near segment.
        let avoid = LatLon::new(-34.0, 150.2);

        let stats =
            apply_detour_durations(&mut matrix, &hs, avoid, &router, &DispatchConfig::default())
                .await;

        assert!(stats.checked >= 2);
        assert_eq!(matrix[0][1], 95.0);
        assert_eq!(matrix[1][0], 95.0);
    }

    #[tokio::test]
    async fn arcs_outside_the_tube_are_untouched() {
        let hs = hospitals();
        let mut matrix = vec![
            vec![0.0, 30.0, 200.0],
            vec![30.0, 0.0, 180.0],
            vec![200.0, 180.0, 0.0],
        ];
        let original = matrix.clone();
        let router = StubRouter { duration_min: 999.0 };
        // Far from every arc: pre-filter plus tube test leave the matrix alone.
        let avoid = LatLon::new(10.0, 10.0);

        let stats =
            apply_detour_durations(&mut matrix, &hs, avoid, &router, &DispatchConfig::default())
                .await;

        assert_eq!(stats.checked, 0);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix[i][j], original[i][j]);
            }
        }
    }
}
