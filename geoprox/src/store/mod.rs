//! Record store seam.
//!
//! The engine never talks to a database. Records reach the index either in
//! bulk from a [`RecordSource`] or one by one as [`IndexEvent`]s mirroring the
//! store's create/update/delete notifications.

mod json;

pub use json::JsonSnapshotFile;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::{GeoRecord, RecordId};

/// Errors raised while loading records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },
}

/// Bulk provider of the authoritative record set.
pub trait RecordSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Loads every record currently in the store.
    fn load(&self) -> Result<Vec<GeoRecord>, StoreError>;
}

/// A change notification from the record store.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent {
    /// A record was created or changed.
    Upsert(GeoRecord),
    /// A record was deleted.
    Remove(RecordId),
    /// The whole record set should replace the index.
    Rebuild(Vec<GeoRecord>),
}

impl IndexEvent {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            IndexEvent::Upsert(_) => "upsert",
            IndexEvent::Remove(_) => "remove",
            IndexEvent::Rebuild(_) => "rebuild",
        }
    }
}

/// Records held in memory, mainly for tests and embedding.
impl RecordSource for Vec<GeoRecord> {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<Vec<GeoRecord>, StoreError> {
        Ok(self.clone())
    }
}
