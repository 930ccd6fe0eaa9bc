//! Error types for sampling and aggregation

use thiserror::Error;

/// Failures the sampler cannot absorb. Transient misses such as a process
/// exiting mid-read are not errors and never show up here.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("host reports no logical CPU")]
    NoCpus,

    #[error("host reports no physical memory")]
    NoMemory,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Precondition violations detected by the aggregator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("history is empty")]
    EmptyHistory,

    #[error("series length mismatch: {xs} abscissas for {ys} ordinates")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("at least 2 points are required, got {0}")]
    TooFewPoints(usize),

    #[error("least-squares solve failed: {0}")]
    Solver(String),
}
