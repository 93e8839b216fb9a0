//! Error types for the spatial index.

use thiserror::Error;

use crate::record::RecordId;

/// Errors raised by the spatial index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// Grid cell size outside the supported range.
    #[error("Invalid grid cell size: {0} degrees (must be > 0 and <= 90)")]
    InvalidCellSize(f64),

    /// An internal invariant was violated, e.g. a record listed in two cells.
    ///
    /// This should never happen. It is surfaced for operator alerting and
    /// answered by rebuilding the snapshot, never by retrying the operation.
    #[error("Spatial index inconsistent for record '{id}': {detail}")]
    Inconsistent { id: RecordId, detail: String },
}
