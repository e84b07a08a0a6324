pub mod cost;
pub mod fitness;
pub mod penalty;

pub use cost::{arc_cost, route_arrivals};
pub use fitness::objective;
pub use penalty::PenaltySchedule;
