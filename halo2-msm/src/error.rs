use thiserror::Error;

/// Errors surfaced by the MSM entry points and their configuration.
///
/// Capacity limits are not errors: oversized batches are chunked by the driver.
#[derive(Debug, Error)]
pub enum MsmError {
    #[error("point table holds {points} points but {scalars} scalars were supplied")]
    TableTooShort { scalars: usize, points: usize },

    #[error("invalid msm config: {0}")]
    InvalidConfig(String),

    #[error("endomorphism parameters rejected: {0}")]
    InvalidEndomorphism(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
