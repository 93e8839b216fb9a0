//! Geotagged record types.
//!
//! Records are owned by the external record store. The engine only ever holds
//! read-only copies inside an index snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coord::Coordinate;

/// Opaque record identifier.
///
/// Ordering is lexicographic and is used to break distance ties, so result
/// order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A person's last known location
    User,
    /// A listed item's location
    Item,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::Item => "item",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "users" => Ok(RecordKind::User),
            "item" | "items" => Ok(RecordKind::Item),
            other => Err(format!(
                "unknown record kind '{}' (must be 'user' or 'item')",
                other
            )),
        }
    }
}

/// A geotagged record as supplied by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    /// Current position; `None` when the record has never been located.
    pub coordinate: Option<Coordinate>,
    pub updated_at: DateTime<Utc>,
    /// Reported error margin of the position in metres, if known.
    pub accuracy_meters: Option<f64>,
}

impl GeoRecord {
    /// Creates a record with no position, stamped with the current time.
    pub fn new(id: impl Into<RecordId>, kind: RecordKind) -> Self {
        Self {
            id: id.into(),
            kind,
            coordinate: None,
            updated_at: Utc::now(),
            accuracy_meters: None,
        }
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy_meters = Some(meters);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Returns true if the record has a position and can take part in
    /// proximity queries.
    #[inline]
    pub fn is_located(&self) -> bool {
        self.coordinate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::validate;

    #[test]
    fn test_new_record_is_unlocated() {
        let record = GeoRecord::new("u1", RecordKind::User);
        assert!(!record.is_located());
        assert!(record.accuracy_meters.is_none());
    }

    #[test]
    fn test_builder() {
        let coord = validate(37.78, -122.43).unwrap();
        let record = GeoRecord::new("i1", RecordKind::Item)
            .with_coordinate(coord)
            .with_accuracy(8.0);
        assert!(record.is_located());
        assert_eq!(record.coordinate, Some(coord));
        assert_eq!(record.accuracy_meters, Some(8.0));
    }

    #[test]
    fn test_record_id_ordering() {
        let mut ids = vec![RecordId::from("b"), RecordId::from("a10"), RecordId::from("a2")];
        ids.sort();
        assert_eq!(
            ids,
            vec![RecordId::from("a10"), RecordId::from("a2"), RecordId::from("b")]
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("user".parse::<RecordKind>(), Ok(RecordKind::User));
        assert_eq!("Items".parse::<RecordKind>(), Ok(RecordKind::Item));
        assert!("place".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&RecordKind::Item).unwrap(), "\"item\"");
    }
}
