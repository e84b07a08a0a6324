use serde::{Deserialize, Serialize};

use crate::domain::hospital::Tier;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS-84 point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(origin: LatLon, dest: LatLon) -> f64 {
    let dlat = (dest.lat - origin.lat).to_radians();
    let dlon = (dest.lon - origin.lon).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + origin.lat.to_radians().cos() * dest.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Analytic travel-time estimate in minutes when no routed duration is
/// available. Metro/regional legs assume slower urban roads with a detour
/// factor; depot and remote legs assume highway speed.
pub fn fallback_duration_min(distance_km: f64, dest_tier: Tier) -> f64 {
    let (speed_kmh, multiplier) = match dest_tier {
        Tier::Metro | Tier::Regional => (50.0, 1.4),
        Tier::Source | Tier::Remote => (80.0, 1.0),
    };
    (distance_km * multiplier / speed_kmh) * 60.0
}

/// Linear position interpolation along the straight origin-to-dest segment.
pub fn interpolate(origin: LatLon, dest: LatLon, fraction: f64) -> LatLon {
    LatLon {
        lat: origin.lat + (dest.lat - origin.lat) * fraction,
        lon: origin.lon + (dest.lon - origin.lon) * fraction,
    }
}

/// Samples the straight origin-to-dest segment at t = 0.0, 0.1, ..., 1.0 and
/// reports whether any sample falls within `radius_km` of `point`.
pub fn segment_near_point(origin: LatLon, dest: LatLon, point: LatLon, radius_km: f64) -> bool {
    (0..11).any(|i| {
        let t = i as f64 / 10.0;
        haversine_km(interpolate(origin, dest, t), point) < radius_km
    })
}

/// Synthetic waypoint that forces the router around `avoid`: offset the
/// avoid point along the unit perpendicular of origin-to-dest by
/// `offset_deg` on both sides and keep the candidate closer to the
/// segment midpoint.
pub fn detour_waypoint(origin: LatLon, dest: LatLon, avoid: LatLon, offset_deg: f64) -> LatLon {
    let dx = dest.lat - origin.lat;
    let dy = dest.lon - origin.lon;
    let (mut px, mut py) = (-dy, dx);
    let mag = (px * px + py * py).sqrt();
    if mag == 0.0 {
        return LatLon::new(avoid.lat + 0.04, avoid.lon);
    }
    px /= mag;
    py /= mag;

    let wp1 = LatLon::new(avoid.lat + px * offset_deg, avoid.lon + py * offset_deg);
    let wp2 = LatLon::new(avoid.lat - px * offset_deg, avoid.lon - py * offset_deg);
    let mid = interpolate(origin, dest, 0.5);
    if haversine_km(wp1, mid) < haversine_km(wp2, mid) {
        wp1
    } else {
        wp2
    }
}
