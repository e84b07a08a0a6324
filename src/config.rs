use std::time::Duration;

/// Policy knobs for one dispatch job. Defaults are the production values;
/// tests and the disruption simulator override individual fields.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Isotope half-life in hours (Tc-99m).
    pub half_life_hours: f64,
    /// Activity at depot departure, in percent.
    pub initial_activity: f64,
    /// Minimum potency (percent) below which a delivery is canceled.
    pub futility_threshold: f64,
    /// Manufacturing + logistics cost per dose.
    pub dose_value: f64,
    pub num_vehicles: usize,
    pub vehicle_capacity: u64,
    /// Route must be back at the depot within this horizon (minutes).
    pub horizon_min: i64,
    /// Hard ceiling on arrival at any non-depot node (minutes).
    pub node_time_cap_min: i64,
    /// Straight-segment impact sampling radius around an avoid point (km).
    pub impact_radius_km: f64,
    /// Perpendicular detour waypoint offset in degrees (~5 km).
    pub detour_offset_deg: f64,
    /// Arcs with both endpoints farther than this from the avoid point
    /// are never rewritten (km).
    pub prefilter_radius_km: f64,
    pub solver_time_limit: Duration,
    pub solver_seed: u64,
    /// Minimum spacing between consecutive transit-API requests.
    pub request_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 6.0,
            initial_activity: 100.0,
            futility_threshold: 35.0,
            dose_value: 1500.0,
            num_vehicles: 4,
            vehicle_capacity: 10,
            horizon_min: 1440,
            node_time_cap_min: 720,
            impact_radius_km: 2.0,
            detour_offset_deg: 0.045,
            prefilter_radius_km: 50.0,
            solver_time_limit: Duration::from_secs(10),
            solver_seed: 64,
            request_interval: Duration::from_millis(250),
        }
    }
}

/// Scripted black-swan inputs for the dynamic simulator.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Simulated minutes after depot departure at which the closure hits.
    pub disruption_time_min: f64,
    /// Multiplier applied to the next-hop travel time.
    pub spike_factor: f64,
    /// Preferred metro stop whose route gets disrupted.
    pub target_stop: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            disruption_time_min: 45.0,
            spike_factor: 10.0,
            target_stop: "St George".to_string(),
        }
    }
}
