//! Error types for the coherence engine

use thiserror::Error;

/// Result type for coherence engine operations
pub type Result<T> = std::result::Result<T, CoherenceError>;

/// Error types for coherence engine operations
#[derive(Error, Debug)]
pub enum CoherenceError {
    /// Configuration failed validation at engine construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A dimension name could not be parsed
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),
}
