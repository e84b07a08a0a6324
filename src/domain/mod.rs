pub mod hospital;
pub mod plan;

pub use hospital::{load_hospitals, validate_hospitals, Hospital, Tier};
pub use plan::{
    Analytics, CanceledMission, ClinicalOutcomes, FleetFinancial, PlanPayload, Stop, Triage,
    VehicleFinancial, VehiclePlan,
};
