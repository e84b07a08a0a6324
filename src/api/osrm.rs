use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{RoadRouter, RouteData, SnappedPoint};
use crate::geo::{self, LatLon};

const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";
const NEAREST_TIMEOUT: Duration = Duration::from_secs(5);
const ROUTE_TIMEOUT: Duration = Duration::from_secs(10);
/// Snap radius (metres) pinning the injected detour waypoint.
const DETOUR_SNAP_RADIUS_M: u32 = 50;

/// Client for the public-routing HTTP envelope (nearest + route services).
/// All failures collapse to `None`; callers decide the fallback.
pub struct OsrmClient {
    http: Client,
    base_url: String,
    impact_radius_km: f64,
    detour_offset_deg: f64,
}

impl OsrmClient {
    /// Base URL from `OSRM_BASE_URL`, defaulting to the public instance.
    pub fn from_env() -> Self {
        let base_url = env::var("OSRM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            impact_radius_km: 2.0,
            detour_offset_deg: 0.045,
        }
    }

    fn request(&self, url: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let mut builder = self.http.get(url).timeout(timeout);
        // Public OSRM asks bulk users to identify themselves.
        if self.base_url.contains("router.project-osrm.org") {
            builder = builder.header("User-Agent", "isodispatch/0.1");
        }
        builder
    }
}

#[derive(Debug, Deserialize)]
struct NearestResponse {
    code: String,
    #[serde(default)]
    waypoints: Vec<NearestWaypoint>,
}

#[derive(Debug, Deserialize)]
struct NearestWaypoint {
    /// `[lon, lat]` per the routing envelope.
    location: [f64; 2],
    distance: f64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<RoutedLeg>,
}

#[derive(Debug, Deserialize)]
struct RoutedLeg {
    /// Seconds.
    duration: f64,
    /// Metres.
    distance: f64,
    /// Encoded polyline, precision 5.
    geometry: String,
}

impl RoadRouter for OsrmClient {
    async fn snap(&self, point: LatLon) -> Option<SnappedPoint> {
        let url = format!(
            "{}/nearest/v1/driving/{},{}?number=1",
            self.base_url, point.lon, point.lat
        );
        trace!(%url, "snapping point to road network");

        let response = match self.request(&url, NEAREST_TIMEOUT).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(status = %resp.status(), "nearest service returned non-success");
                return None;
            }
            Err(e) => {
                debug!("nearest request failed: {e}");
                return None;
            }
        };

        let body: NearestResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("failed to parse nearest response: {e}");
                return None;
            }
        };
        if body.code != "Ok" {
            debug!(code = %body.code, "nearest service rejected the query");
            return None;
        }

        let wp = body.waypoints.into_iter().next()?;
        Some(SnappedPoint {
            point: LatLon::new(wp.location[1], wp.location[0]),
            offset_m: wp.distance,
            road: wp.name,
        })
    }

    async fn route(
        &self,
        origin: LatLon,
        dest: LatLon,
        avoid: Option<LatLon>,
    ) -> Option<RouteData> {
        // Inject a detour waypoint only when the straight segment actually
        // passes the closure.
        let detour_wp = avoid
            .filter(|p| geo::segment_near_point(origin, dest, *p, self.impact_radius_km))
            .map(|p| geo::detour_waypoint(origin, dest, p, self.detour_offset_deg));

        let (coords, radiuses) = match detour_wp {
            Some(wp) => (
                format!(
                    "{},{};{},{};{},{}",
                    origin.lon, origin.lat, wp.lon, wp.lat, dest.lon, dest.lat
                ),
                Some(format!("unlimited;{DETOUR_SNAP_RADIUS_M};unlimited")),
            ),
            None => (
                format!("{},{};{},{}", origin.lon, origin.lat, dest.lon, dest.lat),
                None,
            ),
        };

        let mut url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=polyline",
            self.base_url, coords
        );
        if let Some(r) = &radiuses {
            url.push_str("&radiuses=");
            url.push_str(r);
        }
        trace!(%url, detoured = detour_wp.is_some(), "fetching route");

        let response = match self.request(&url, ROUTE_TIMEOUT).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(status = %resp.status(), "route service returned non-success");
                return None;
            }
            Err(e) => {
                debug!("route request failed: {e}");
                return None;
            }
        };

        let body: RouteResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("failed to parse route response: {e}");
                return None;
            }
        };
        if body.code != "Ok" {
            debug!(code = %body.code, "route service rejected the query");
            return None;
        }

        let leg = body.routes.into_iter().next()?;
        let geometry = decode_geometry(&leg.geometry)?;
        Some(RouteData {
            duration_min: leg.duration / 60.0,
            distance_km: leg.distance / 1000.0,
            geometry,
            detoured: detour_wp.is_some(),
        })
    }
}

fn decode_geometry(encoded: &str) -> Option<Vec<(f64, f64)>> {
    let line = match polyline::decode_polyline(encoded, 5) {
        Ok(line) => line,
        Err(e) => {
            debug!("failed to decode polyline geometry: {e}");
            return None;
        }
    };
    Some(line.coords().map(|c| (c.y, c.x)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_polyline_precision_5() {
        // Reference string from the polyline format documentation.
        let pts = decode_geometry("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(pts.len(), 3);
        assert!((pts[0].0 - 38.5).abs() < 1e-5);
        assert!((pts[0].1 - -120.2).abs() < 1e-5);
        assert!((pts[2].0 - 43.252).abs() < 1e-3);
    }

    #[test]
    fn parses_nearest_envelope() {
        let json = r#"{
            "code": "Ok",
            "waypoints": [
                {"location": [151.03, -34.05], "distance": 12.5, "name": "New Illawarra Rd"}
            ]
        }"#;
        let body: NearestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.code, "Ok");
        assert_eq!(body.waypoints[0].location[0], 151.03);
        assert_eq!(body.waypoints[0].name, "New Illawarra Rd");
    }

    #[test]
    fn parses_route_envelope() {
        let json = r#"{
            "code": "Ok",
            "routes": [{"duration": 1800.0, "distance": 24000.0, "geometry": "_p~iF~ps|U_ulLnnqC"}]
        }"#;
        let body: RouteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.routes[0].duration, 1800.0);
        assert_eq!(body.routes[0].distance, 24000.0);
    }
}
