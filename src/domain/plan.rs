use serde::{Deserialize, Serialize};

/// Per-stop badge derived from the computed potency at arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Triage {
    Depot,
    Optimal,
    Degraded,
    Canceled,
}

/// One delivery (or depot marker) on a vehicle's schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub tier: u8,
    pub arrival_time_min: i64,
    pub lat: f64,
    pub lon: f64,
    /// Percent of the initial activity remaining at arrival, rounded to 0.1.
    pub potency: f64,
    pub triage: Triage,
}

impl Stop {
    pub fn is_depot(&self) -> bool {
        self.tier == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleFinancial {
    pub mission_value: f64,
    pub preserved_value: f64,
    pub waste_value: f64,
}

/// One vehicle's materialized plan: the viable schedule, the stops that
/// were futile by arrival time, and the road geometry of the viable path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePlan {
    pub vehicle_id: usize,
    pub steps: Vec<Stop>,
    pub canceled: Vec<Stop>,
    pub geometry: Vec<(f64, f64)>,
    pub avg_potency: f64,
    pub financial: VehicleFinancial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanceledMission {
    pub name: String,
    pub potency: f64,
    pub tier: u8,
    pub original_eta_min: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalOutcomes {
    pub doses_saved: usize,
    pub cardiac_ready: usize,
    pub avoided_waste_count: usize,
    pub avoided_waste_cost: f64,
    pub canceled_missions: Vec<CanceledMission>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetFinancial {
    pub dose_value: f64,
    pub total_mission_value: f64,
    pub total_preserved_value: f64,
    pub total_waste_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub fleet_avg_potency: f64,
    pub fleet_total_potency: f64,
    pub fleet_stops_served: usize,
    pub incident_active: bool,
    pub snapped_road: String,
    pub clinical_outcomes: ClinicalOutcomes,
    pub financial: FleetFinancial,
}

/// The full result of one dispatch job, returned to callers and persisted
/// by the binaries as a side channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    pub routes: Vec<VehiclePlan>,
    pub analytics: Analytics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Triage::Canceled).unwrap(), "\"CANCELED\"");
        assert_eq!(serde_json::to_string(&Triage::Depot).unwrap(), "\"DEPOT\"");
    }

    #[test]
    fn geometry_serializes_as_coordinate_pairs() {
        let plan = VehiclePlan {
            vehicle_id: 0,
            steps: vec![],
            canceled: vec![],
            geometry: vec![(-34.0, 150.0), (-34.1, 150.2)],
            avg_potency: 0.0,
            financial: VehicleFinancial {
                mission_value: 0.0,
                preserved_value: 0.0,
                waste_value: 0.0,
            },
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["geometry"][0][0], -34.0);
        assert_eq!(json["geometry"][1][1], 150.2);
    }
}
