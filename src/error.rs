//! Input validation errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid grid dimensions {rows}x{cols}: both must be at least 1")]
    InvalidDimension { rows: usize, cols: usize },

    #[error("invalid probability {0}: must lie in [0, 1]")]
    InvalidProbability(f64),

    #[error("invalid run count {0}: must be at least 1")]
    InvalidRunCount(usize),

    #[error("invalid probability sequence: entry {index} is {value}, must lie in [0, 1]")]
    InvalidProbabilitySequence { index: usize, value: f64 },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("sweep cancelled")]
    Cancelled,
}
