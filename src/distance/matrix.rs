use tracing::{debug, info};

use crate::api::{TransitClient, TravelTimeEstimator};
use crate::config::DispatchConfig;
use crate::domain::hospital::Hospital;
use crate::geo;

/// Builds the dense N×N travel-time matrix in minutes. Each arc tries the
/// transit estimator when one is configured, paced to stay under the
/// upstream rate limit; any miss falls back to the analytic estimate for
/// the destination tier. The diagonal is zero and every entry is finite.
pub async fn build_time_matrix(
    hospitals: &[Hospital],
    transit: Option<&TransitClient>,
    config: &DispatchConfig,
) -> Vec<Vec<f64>> {
    info!(
        locations = hospitals.len(),
        transit = transit.is_some(),
        "building travel-time matrix"
    );
    build_matrix_with(hospitals, transit, config).await
}

pub(crate) async fn build_matrix_with<E: TravelTimeEstimator>(
    hospitals: &[Hospital],
    estimator: Option<&E>,
    config: &DispatchConfig,
) -> Vec<Vec<f64>> {
    let n = hospitals.len();
    let mut matrix = vec![vec![0.0; n]; n];
    let mut estimated = 0usize;

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let origin = hospitals[i].position();
            let dest = hospitals[j].position();

            let mut duration = None;
            if let Some(est) = estimator {
                tokio::time::sleep(config.request_interval).await;
                duration = est.estimate_min(origin, dest).await;
            }

            matrix[i][j] = match duration {
                Some(min) => {
                    estimated += 1;
                    min
                }
                None => {
                    let dist = geo::haversine_km(origin, dest);
                    geo::fallback_duration_min(dist, hospitals[j].tier)
                }
            };
        }
    }

    debug!(
        arcs = n * n.saturating_sub(1),
        estimated, "travel-time matrix populated"
    );
    matrix
}
