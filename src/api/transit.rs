use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::TravelTimeEstimator;
use crate::geo::LatLon;

const DEFAULT_BASE_URL: &str = "https://api.transport.nsw.gov.au/v1/tp";
const TRIP_TIMEOUT: Duration = Duration::from_secs(10);

/// Optional regional-transit trip planner. When a token is configured it
/// contributes an alternative per-arc travel-time estimate; every failure
/// mode yields `None` and the matrix build proceeds on the analytic
/// fallback.
pub struct TransitClient {
    http: Client,
    base_url: String,
    token: String,
}

impl TransitClient {
    pub fn new(token: impl Into<String>) -> Self {
        let base_url =
            env::var("TRANSIT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Builds a client only when `TRANSIT_API_TOKEN` is present.
    pub fn from_env() -> Option<Self> {
        match env::var("TRANSIT_API_TOKEN") {
            Ok(token) if !token.trim().is_empty() => {
                info!("transit API token configured, matrix will query the trip planner");
                Some(Self::new(token.trim().to_string()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TripResponse {
    #[serde(default)]
    journeys: Vec<Journey>,
}

#[derive(Debug, Deserialize)]
struct Journey {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    /// Seconds.
    #[serde(default)]
    duration: f64,
}

impl TravelTimeEstimator for TransitClient {
    async fn estimate_min(&self, origin: LatLon, dest: LatLon) -> Option<f64> {
        let url = format!("{}/trip", self.base_url);
        let name_origin = format!("{}:{}:EPSG:4326", origin.lon, origin.lat);
        let name_destination = format!("{}:{}:EPSG:4326", dest.lon, dest.lat);
        let response = match self
            .http
            .get(&url)
            .header("Authorization", format!("apikey {}", self.token))
            .query(&[
                ("outputFormat", "rapidJSON"),
                ("coordOutputFormat", "EPSG:4326"),
                ("depArrMacro", "dep"),
                ("type_origin", "coord"),
                ("name_origin", name_origin.as_str()),
                ("type_destination", "coord"),
                ("name_destination", name_destination.as_str()),
                ("calcNumberOfTrips", "1"),
            ])
            .timeout(TRIP_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(status = %resp.status(), "trip planner returned non-success");
                return None;
            }
            Err(e) => {
                debug!("trip planner request failed: {e}");
                return None;
            }
        };

        let body: TripResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("failed to parse trip planner response: {e}");
                return None;
            }
        };

        let journey = body.journeys.into_iter().next()?;
        let seconds: f64 = journey.legs.iter().map(|leg| leg.duration).sum();
        if seconds <= 0.0 {
            return None;
        }
        Some(seconds / 60.0)
    }
}
