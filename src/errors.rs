//! Key-Value Storage Error Hierarchy
//!
//! Every engine maps its native faults onto [`StorageError`], so callers in the
//! log-database layer can handle failures without knowing which engine is
//! underneath. Not-found on a point read is not an error.

use std::path::PathBuf;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine-level failures (open, read, write, commit, compaction)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error raised by a caller-supplied visitor, returned unchanged
    #[error("Visitor failed: {0}")]
    Visitor(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Directory unavailable, locked or corrupted at open time
    #[error("Failed to open {engine} store at {path:?}: {reason}")]
    Open {
        engine: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Engine fault during a point read or an iteration step
    #[error("Read failure: {0}")]
    Read(String),

    /// Engine fault during a synchronous point write or delete
    #[error("Write failure: {0}")]
    Write(String),

    /// Engine fault while applying a write batch
    #[error("Commit failure: {0}")]
    Commit(String),

    /// Range or full compaction failed; data is intact
    #[error("Compaction failure: {0}")]
    Compaction(String),

    /// Disk I/O failures while preparing store directories
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Wraps an arbitrary error raised inside an iteration visitor.
    pub fn visitor<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Visitor(err.into())
    }
}
