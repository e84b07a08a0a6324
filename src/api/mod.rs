pub mod osrm;
pub mod transit;

pub use osrm::OsrmClient;
pub use transit::TransitClient;

use std::future::Future;

use crate::domain::hospital::Tier;
use crate::geo::{self, LatLon};

/// A routed leg between two points.
#[derive(Debug, Clone)]
pub struct RouteData {
    pub duration_min: f64,
    pub distance_km: f64,
    /// Decoded path as (lat, lon) pairs.
    pub geometry: Vec<(f64, f64)>,
    /// Whether a detour waypoint was injected around an avoid point.
    pub detoured: bool,
}

/// A coordinate snapped onto the road network.
#[derive(Debug, Clone)]
pub struct SnappedPoint {
    pub point: LatLon,
    pub offset_m: f64,
    pub road: String,
}

/// Road-network services consumed by the matrix rewriter, the geometry
/// pass and incident snapping. Everything goes through this seam so tests
/// can inject deterministic responses.
pub trait RoadRouter {
    fn snap(&self, point: LatLon) -> impl Future<Output = Option<SnappedPoint>> + Send;

    fn route(
        &self,
        origin: LatLon,
        dest: LatLon,
        avoid: Option<LatLon>,
    ) -> impl Future<Output = Option<RouteData>> + Send;
}

/// Best-effort per-arc travel-time source used while building the matrix.
pub trait TravelTimeEstimator {
    fn estimate_min(
        &self,
        origin: LatLon,
        dest: LatLon,
    ) -> impl Future<Output = Option<f64>> + Send;
}

/// Resolves a failed routing call into the analytic estimate with a
/// straight-line two-point geometry. This is the only place a routing
/// failure is absorbed.
pub async fn route_with_fallback<R: RoadRouter>(
    router: &R,
    origin: LatLon,
    dest: LatLon,
    avoid: Option<LatLon>,
) -> RouteData {
    match router.route(origin, dest, avoid).await {
        Some(data) => data,
        None => {
            let distance_km = geo::haversine_km(origin, dest);
            RouteData {
                duration_min: geo::fallback_duration_min(distance_km, Tier::Metro),
                distance_km,
                geometry: vec![(origin.lat, origin.lon), (dest.lat, dest.lon)],
                detoured: false,
            }
        }
    }
}

/// Convenience wrapper that returns only the decoded path of a leg,
/// falling back to the straight line.
pub async fn fetch_route_geometry<R: RoadRouter>(
    router: &R,
    origin: LatLon,
    dest: LatLon,
    avoid: Option<LatLon>,
) -> Vec<(f64, f64)> {
    route_with_fallback(router, origin, dest, avoid).await.geometry
}

/// Resolves a failed snap into the input point with zero offset.
pub async fn snap_or_identity<R: RoadRouter>(router: &R, point: LatLon) -> SnappedPoint {
    match router.snap(point).await {
        Some(snapped) => snapped,
        None => SnappedPoint {
            point,
            offset_m: 0.0,
            road: String::new(),
        },
    }
}
