use tracing::{info, warn};

use crate::api::{snap_or_identity, RoadRouter, SnappedPoint, TransitClient};
use crate::config::DispatchConfig;
use crate::distance::{apply_detour_durations, build_time_matrix};
use crate::domain::hospital::{validate_hospitals, Hospital};
use crate::domain::plan::PlanPayload;
use crate::error::DispatchError;
use crate::geo::LatLon;
use crate::plan::materialize;
use crate::solver::{self, RoutingProblem, SearchParams};

/// One dispatch job: owns the hospital set and its travel-time matrix
/// exclusively from construction until the plan is returned. Not
/// re-entrant; build a fresh instance per solve.
pub struct Optimizer<'r, R: RoadRouter> {
    hospitals: Vec<Hospital>,
    time_matrix: Vec<Vec<f64>>,
    router: &'r R,
    config: DispatchConfig,
    num_vehicles: usize,
    vehicle_capacity: u64,
    avoid_point: Option<LatLon>,
    snapped_incident: Option<SnappedPoint>,
}

impl<'r, R: RoadRouter> Optimizer<'r, R> {
    /// Validates the hospital set and builds the matrix, querying the
    /// transit estimator when one is configured.
    pub async fn new(
        hospitals: Vec<Hospital>,
        router: &'r R,
        transit: Option<&TransitClient>,
        config: DispatchConfig,
    ) -> Result<Optimizer<'r, R>, DispatchError> {
        validate_hospitals(&hospitals)?;
        let time_matrix = build_time_matrix(&hospitals, transit, &config).await;
        Ok(Self::assemble(hospitals, time_matrix, router, config))
    }

    /// Skips the matrix build and uses the given travel times directly.
    pub fn with_matrix(
        hospitals: Vec<Hospital>,
        time_matrix: Vec<Vec<f64>>,
        router: &'r R,
        config: DispatchConfig,
    ) -> Result<Optimizer<'r, R>, DispatchError> {
        validate_hospitals(&hospitals)?;
        Ok(Self::assemble(hospitals, time_matrix, router, config))
    }

    fn assemble(
        hospitals: Vec<Hospital>,
        time_matrix: Vec<Vec<f64>>,
        router: &'r R,
        config: DispatchConfig,
    ) -> Optimizer<'r, R> {
        let num_vehicles = config.num_vehicles;
        let vehicle_capacity = config.vehicle_capacity;
        Optimizer {
            hospitals,
            time_matrix,
            router,
            config,
            num_vehicles,
            vehicle_capacity,
            avoid_point: None,
            snapped_incident: None,
        }
    }

    /// Overrides the fleet for reduced problems (the simulator re-plans a
    /// single vehicle from its interpolated position).
    pub fn set_fleet(&mut self, num_vehicles: usize, vehicle_capacity: u64) {
        self.num_vehicles = num_vehicles;
        self.vehicle_capacity = vehicle_capacity;
    }

    /// Runs the full pipeline: snap the incident, rewrite affected arcs,
    /// solve the routing problem and materialize the plan.
    pub async fn solve_and_report(
        &mut self,
        avoid_point: Option<LatLon>,
    ) -> Result<PlanPayload, DispatchError> {
        self.avoid_point = None;
        self.snapped_incident = None;

        if let Some(raw) = avoid_point {
            let snapped = snap_or_identity(self.router, raw).await;
            info!(
                lat = snapped.point.lat,
                lon = snapped.point.lon,
                offset_m = snapped.offset_m,
                road = %snapped.road,
                "incident snapped to road network"
            );
            self.avoid_point = Some(snapped.point);
            let stats = apply_detour_durations(
                &mut self.time_matrix,
                &self.hospitals,
                snapped.point,
                self.router,
                &self.config,
            )
            .await;
            if stats.checked == 0 {
                warn!("avoid point is clear of every arc, plan will match baseline");
            }
            self.snapped_incident = Some(snapped);
        }

        let problem = RoutingProblem::new(
            &self.hospitals,
            self.time_matrix.clone(),
            self.num_vehicles,
            self.vehicle_capacity,
            &self.config,
        );
        let solution = solver::solve(&problem, &SearchParams::from_config(&self.config))?;
        info!(
            served = solution.served_count(),
            dropped = solution.dropped.len(),
            objective = solution.objective,
            "routing solved"
        );

        let snapped_road = self
            .snapped_incident
            .as_ref()
            .map(|s| s.road.clone())
            .unwrap_or_default();
        Ok(materialize(
            &solution,
            &self.hospitals,
            self.router,
            self.avoid_point,
            &snapped_road,
            &self.config,
        )
        .await)
    }
}
