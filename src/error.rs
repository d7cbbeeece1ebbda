use thiserror::Error;

pub type Result<T> = std::result::Result<T, TontineError>;

/// Error taxonomy for the round engine.
///
/// The first five variants are terminal for the triggering request and map
/// one-to-one onto caller-facing failure kinds. `Storage` covers transient
/// backend faults; nothing is committed, so the caller may retry verbatim.
#[derive(Error, Debug)]
pub enum TontineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for TontineError {
    fn from(e: rocksdb::Error) -> Self {
        Self::Storage(Box::new(e))
    }
}
