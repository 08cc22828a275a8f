//! Error types for the s3sign core.

/// Core error type for s3sign infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid region identifier.
    #[error("invalid region: {0:?} (must be non-empty and must not contain '/')")]
    InvalidRegion(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for s3sign core operations.
pub type CoreResult<T> = Result<T, CoreError>;
