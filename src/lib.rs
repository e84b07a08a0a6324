pub mod api;
pub mod config;
pub mod decay;
pub mod distance;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod geo;
pub mod optimizer;
pub mod plan;
pub mod simulator;
pub mod solver;

pub use config::{DispatchConfig, ScenarioConfig};
pub use domain::{load_hospitals, Hospital, PlanPayload, Tier};
pub use error::DispatchError;
pub use geo::LatLon;
pub use optimizer::Optimizer;
pub use simulator::{DynamicSimulator, SimulationReport};
