use crate::config::DispatchConfig;
use crate::domain::hospital::{Hospital, Tier};
use crate::evaluation::penalty::PenaltySchedule;

/// One routing job handed to the search: the rewritten time matrix plus
/// the fleet and timing constraints. Node 0 is always the depot.
#[derive(Debug, Clone)]
pub struct RoutingProblem {
    pub time_matrix: Vec<Vec<f64>>,
    pub tiers: Vec<Tier>,
    pub demands: Vec<u64>,
    pub num_vehicles: usize,
    pub vehicle_capacity: u64,
    /// Hard ceiling on arrival at any non-depot node.
    pub node_time_cap_min: i64,
    /// The full route, back at the depot, must fit in this horizon.
    pub horizon_min: i64,
    pub penalties: PenaltySchedule,
}

impl RoutingProblem {
    pub fn new(
        hospitals: &[Hospital],
        time_matrix: Vec<Vec<f64>>,
        num_vehicles: usize,
        vehicle_capacity: u64,
        config: &DispatchConfig,
    ) -> Self {
        let tiers: Vec<Tier> = hospitals.iter().map(|h| h.tier).collect();
        let demands = tiers
            .iter()
            .map(|t| if t.is_depot() { 0 } else { 1 })
            .collect();
        Self {
            time_matrix,
            tiers,
            demands,
            num_vehicles,
            vehicle_capacity,
            node_time_cap_min: config.node_time_cap_min,
            horizon_min: config.horizon_min,
            penalties: PenaltySchedule::default(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.tiers.len()
    }

    /// Transit time in whole minutes, truncated like the time-dimension
    /// callback the matrix feeds.
    pub fn transit_min(&self, from: usize, to: usize) -> i64 {
        self.time_matrix[from][to] as i64
    }

    /// Every deliverable node (all non-depot indices).
    pub fn customers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_nodes()).filter(|&i| !self.tiers[i].is_depot())
    }
}
