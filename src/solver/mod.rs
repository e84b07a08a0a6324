pub mod construct;
pub mod model;
pub mod search;
pub mod solution;

pub use model::RoutingProblem;
pub use search::{solve, SearchParams};
pub use solution::{FleetSolution, VehicleRoute};
