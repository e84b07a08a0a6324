pub mod disruption;
pub mod matrix;

pub use disruption::{apply_detour_durations, DetourStats};
pub use matrix::build_time_matrix;
