//! Error types for trackstat

use thiserror::Error;

/// Errors raised by sample transformation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SamplingError {
    /// Padding was requested for a sample with no declared regularity.
    #[error("data sample has no regularity; padding requires a regular sample")]
    InvalidRegularity,
}

/// Errors raised by the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures surfaced to the presentation layer inside an error view data.
///
/// Factories convert every pipeline failure into one of these; a raw fault
/// never escapes a factory boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphStatError {
    #[error("graph or stat configuration not found")]
    GraphNotFound,

    #[error("not enough data to compute statistic ({0} points available)")]
    NotEnoughData(usize),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
