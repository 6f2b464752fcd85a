use thiserror::Error;

/// Errors returned by quality cache operations.
///
/// Loading never produces an error: missing or malformed documents read as
/// absent. Only writes can fail.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("qualitycache: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("qualitycache: serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("qualitycache: store error: {0}")]
    Store(String),
}
