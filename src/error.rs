use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to read hospital data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse hospital data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hospital list is empty")]
    EmptyHospitalList,

    #[error("expected exactly one tier-0 depot, found {0}")]
    DepotCount(usize),

    #[error("the tier-0 depot must be the first entry, found it at index {0}")]
    DepotNotFirst(usize),

    #[error("invalid tier {0}: must be 0..=3")]
    InvalidTier(u8),

    #[error("no feasible routing solution within the time limit")]
    NoSolution,

    #[error("no route suitable for the disruption scenario")]
    NoTargetRoute,
}
