//! JSON snapshot file source.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RecordSource, StoreError};
use crate::coord::validate_optional;
use crate::record::{GeoRecord, RecordKind};

/// On-disk row. Coordinates are loose here and validated on conversion.
#[derive(Debug, Serialize, Deserialize)]
struct RecordRow {
    id: String,
    kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accuracy_meters: Option<f64>,
}

impl RecordRow {
    fn into_record(self) -> Result<GeoRecord, StoreError> {
        let coordinate =
            validate_optional(self.latitude, self.longitude).map_err(|e| {
                StoreError::InvalidRecord {
                    id: self.id.clone(),
                    reason: e.to_string(),
                }
            })?;

        let mut record = GeoRecord::new(self.id, self.kind);
        record.coordinate = coordinate;
        record.accuracy_meters = self.accuracy_meters;
        if let Some(updated_at) = self.updated_at {
            record.updated_at = updated_at;
        }
        Ok(record)
    }
}

impl From<&GeoRecord> for RecordRow {
    fn from(record: &GeoRecord) -> Self {
        Self {
            id: record.id.to_string(),
            kind: record.kind,
            latitude: record.coordinate.map(|c| c.latitude()),
            longitude: record.coordinate.map(|c| c.longitude()),
            updated_at: Some(record.updated_at),
            accuracy_meters: record.accuracy_meters,
        }
    }
}

/// Records exported to a JSON array file.
///
/// ```json
/// [
///   { "id": "u1", "kind": "user", "latitude": 37.77, "longitude": -122.42 },
///   { "id": "i9", "kind": "item" }
/// ]
/// ```
///
/// A row with only one of `latitude`/`longitude` is loaded as unlocated.
/// An out-of-range coordinate fails the whole load.
#[derive(Debug, Clone)]
pub struct JsonSnapshotFile {
    path: PathBuf,
    name: String,
}

impl JsonSnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes records in the format `load` reads.
    pub fn save(&self, records: &[GeoRecord]) -> Result<(), StoreError> {
        let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
        let json = serde_json::to_string_pretty(&rows).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl RecordSource for JsonSnapshotFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<GeoRecord>, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let rows: Vec<RecordRow> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let records = rows
            .into_iter()
            .map(RecordRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %self.path.display(), records = records.len(), "Loaded snapshot file");
        Ok(records)
    }
}
