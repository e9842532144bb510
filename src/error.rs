use thiserror::Error;

/// Everything that can stop a run.
///
/// The first group are contract violations: they only show up when a caller
/// hands the core something it promised never to pass, so they end the run.
/// Degenerate distributions and agents leaving the grid are handled where they
/// happen and never become errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("ring rotation needs a square matrix, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("turning kernel must be 3x3, got {size}x{size}")]
    KernelShape { size: usize },

    #[error("turning kernel weight {0} is negative or not finite")]
    InvalidWeight(f64),

    #[error("probability must be within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    #[error("no valid weights to sample from: {0}")]
    Distribution(#[from] rand::distributions::WeightedError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
