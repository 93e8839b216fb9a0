//! Error types for the query engine.

use thiserror::Error;

use crate::coord::CoordError;
use crate::index::IndexError;

/// Errors returned by a proximity search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The query itself is malformed: bad origin, radius, limit or cursor.
    ///
    /// Never retried; the caller must correct the query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The caller's cancellation token or deadline fired mid-scan.
    #[error("Search cancelled before completion")]
    Cancelled,

    /// The index violated an internal invariant even after being rebuilt.
    #[error("Spatial index inconsistent: {0}")]
    IndexInconsistent(#[from] IndexError),
}

impl From<CoordError> for SearchError {
    fn from(e: CoordError) -> Self {
        SearchError::InvalidQuery(format!("origin: {}", e))
    }
}

/// Errors raised while constructing an engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A configuration value is out of range.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The spatial index could not be created.
    #[error("Failed to create spatial index: {0}")]
    Index(#[from] IndexError),
}
