//! Immutable index versions.
//!
//! An [`IndexSnapshot`] is one consistent version of the grid. Readers hold
//! it through an `Arc` and never observe a half-applied write.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::cell::{CellKey, GridGeometry};
use super::error::IndexError;
use crate::geo::BoundingBox;
use crate::record::{GeoRecord, RecordId};

/// Grid bucket holding the ids of every record located inside it.
#[derive(Debug, Clone, Default)]
pub struct IndexCell {
    ids: HashSet<RecordId>,
}

impl IndexCell {
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A record together with the cell it is filed under.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub record: Arc<GeoRecord>,
    pub cell: CellKey,
}

/// Result of applying a single change to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChange {
    /// New record filed under its cell
    Inserted,
    /// Existing record replaced within the same cell
    Updated,
    /// Existing record moved from one cell to another
    Moved,
    /// Record dropped from the index
    Removed,
    /// Nothing to do (unknown id, or a record without a position)
    Unchanged,
}

/// One consistent version of the spatial grid.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    geometry: GridGeometry,
    cells: HashMap<CellKey, IndexCell>,
    records: HashMap<RecordId, IndexedRecord>,
    version: u64,
}

impl IndexSnapshot {
    /// Creates an empty snapshot.
    pub fn empty(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            cells: HashMap::new(),
            records: HashMap::new(),
            version: 0,
        }
    }

    /// Builds a snapshot from a full set of records.
    ///
    /// Records without a position are skipped. Duplicate ids keep the last
    /// occurrence.
    pub fn from_records<I>(geometry: GridGeometry, records: I) -> Self
    where
        I: IntoIterator<Item = GeoRecord>,
    {
        let mut snapshot = Self::empty(geometry);
        for record in records {
            snapshot.upsert(record);
        }
        snapshot.version = 0;
        snapshot
    }

    /// Monotonic version, bumped on every change.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(super) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Looks up an indexed record.
    pub fn get(&self, id: &RecordId) -> Option<&Arc<GeoRecord>> {
        self.records.get(id).map(|entry| &entry.record)
    }

    /// Looks up an indexed record together with its cell.
    pub fn entry(&self, id: &RecordId) -> Option<&IndexedRecord> {
        self.records.get(id)
    }

    /// Iterates over all indexed records in unspecified order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<GeoRecord>> {
        self.records.values().map(|entry| &entry.record)
    }

    /// Occupied cells overlapping the box, in ascending key order.
    ///
    /// Walks whichever is smaller: the cells covered by the box or the
    /// occupied cells. Either way the result is the same set.
    pub fn cells_in_box(&self, bbox: &BoundingBox) -> Vec<(CellKey, &IndexCell)> {
        let rows = self.geometry.rows_for(bbox);
        let col_ranges = self.geometry.col_ranges_for(bbox);

        let mut hits: Vec<(CellKey, &IndexCell)> =
            if self.geometry.cells_in_box(bbox) <= self.cells.len() {
                let mut hits = Vec::new();
                for row in rows {
                    for cols in &col_ranges {
                        for col in cols.clone() {
                            let key = CellKey { row, col };
                            if let Some(cell) = self.cells.get(&key) {
                                hits.push((key, cell));
                            }
                        }
                    }
                }
                hits
            } else {
                self.cells
                    .iter()
                    .filter(|(key, _)| {
                        rows.contains(&key.row) && col_ranges.iter().any(|c| c.contains(&key.col))
                    })
                    .map(|(key, cell)| (*key, cell))
                    .collect()
            };

        hits.sort_unstable_by_key(|(key, _)| *key);
        hits
    }

    /// Ids of every record in every cell overlapping the box.
    ///
    /// Over-inclusive: callers must apply the exact distance test.
    pub fn query_bounding_box(&self, bbox: &BoundingBox) -> HashSet<RecordId> {
        self.cells_in_box(bbox)
            .into_iter()
            .flat_map(|(_, cell)| cell.ids().cloned())
            .collect()
    }

    /// Inserts or replaces a record, moving it between cells when needed.
    pub(super) fn upsert(&mut self, record: GeoRecord) -> IndexChange {
        let Some(coordinate) = record.coordinate else {
            // A record that lost its position leaves the index
            return self.remove(&record.id);
        };

        let new_cell = self.geometry.key_for(&coordinate);
        let id = record.id.clone();
        let entry = IndexedRecord {
            record: Arc::new(record),
            cell: new_cell,
        };

        let change = match self.records.insert(id.clone(), entry) {
            None => IndexChange::Inserted,
            Some(previous) if previous.cell == new_cell => IndexChange::Updated,
            Some(previous) => {
                self.detach(previous.cell, &id);
                IndexChange::Moved
            }
        };

        if change != IndexChange::Updated {
            self.cells.entry(new_cell).or_default().ids.insert(id);
        }
        self.version += 1;
        change
    }

    /// Removes a record from its cell and the record table.
    pub(super) fn remove(&mut self, id: &RecordId) -> IndexChange {
        match self.records.remove(id) {
            Some(previous) => {
                self.detach(previous.cell, id);
                self.version += 1;
                IndexChange::Removed
            }
            None => IndexChange::Unchanged,
        }
    }

    fn detach(&mut self, key: CellKey, id: &RecordId) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.ids.remove(id);
            if cell.ids.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Checks that every record is filed in exactly one cell, the one its
    /// coordinate maps to.
    pub fn verify(&self) -> Result<(), IndexError> {
        let mut filed = 0usize;
        for (key, cell) in &self.cells {
            for id in cell.ids() {
                let entry = self.records.get(id).ok_or_else(|| IndexError::Inconsistent {
                    id: id.clone(),
                    detail: format!("listed in cell {:?} but missing from record table", key),
                })?;
                if entry.cell != *key {
                    return Err(IndexError::Inconsistent {
                        id: id.clone(),
                        detail: format!("listed in cell {:?} but filed under {:?}", key, entry.cell),
                    });
                }
                let expected = entry
                    .record
                    .coordinate
                    .map(|c| self.geometry.key_for(&c));
                if expected != Some(*key) {
                    return Err(IndexError::Inconsistent {
                        id: id.clone(),
                        detail: format!("coordinate maps to {:?}, not {:?}", expected, key),
                    });
                }
                filed += 1;
            }
        }

        if filed != self.records.len() {
            let orphan = self
                .records
                .iter()
                .find(|(id, entry)| {
                    !self
                        .cells
                        .get(&entry.cell)
                        .is_some_and(|cell| cell.ids.contains(*id))
                })
                .map(|(id, _)| id.clone())
                .unwrap_or_else(|| RecordId::from("<unknown>"));
            return Err(IndexError::Inconsistent {
                id: orphan,
                detail: format!(
                    "{} records in table but {} filed in cells",
                    self.records.len(),
                    filed
                ),
            });
        }

        Ok(())
    }

    /// Files an id under a cell without touching the record table.
    #[cfg(test)]
    pub(crate) fn file_stray_id(&mut self, key: CellKey, id: RecordId) {
        self.cells.entry(key).or_default().ids.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::validate;
    use crate::geo::bounding_box;
    use crate::record::RecordKind;

    fn item(id: &str, lat: f64, lon: f64) -> GeoRecord {
        GeoRecord::new(id, RecordKind::Item).with_coordinate(validate(lat, lon).unwrap())
    }

    fn grid() -> GridGeometry {
        GridGeometry::new(1.0).unwrap()
    }

    #[test]
    fn test_upsert_insert_update_move() {
        let mut snap = IndexSnapshot::empty(grid());
        assert_eq!(snap.upsert(item("a", 10.2, 20.2)), IndexChange::Inserted);
        assert_eq!(snap.upsert(item("a", 10.8, 20.8)), IndexChange::Updated);
        assert_eq!(snap.upsert(item("a", 12.5, 20.8)), IndexChange::Moved);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.occupied_cells(), 1);
        assert_eq!(snap.version(), 3);
        snap.verify().unwrap();
    }

    #[test]
    fn test_upsert_without_coordinate_removes() {
        let mut snap = IndexSnapshot::empty(grid());
        snap.upsert(item("a", 1.0, 1.0));
        let unlocated = GeoRecord::new("a", RecordKind::Item);
        assert_eq!(snap.upsert(unlocated), IndexChange::Removed);
        assert!(snap.is_empty());
        assert_eq!(snap.occupied_cells(), 0);
    }

    #[test]
    fn test_unlocated_record_never_indexed() {
        let mut snap = IndexSnapshot::empty(grid());
        let change = snap.upsert(GeoRecord::new("ghost", RecordKind::User));
        assert_eq!(change, IndexChange::Unchanged);
        assert!(snap.get(&RecordId::from("ghost")).is_none());
    }

    #[test]
    fn test_remove_unknown_is_unchanged() {
        let mut snap = IndexSnapshot::empty(grid());
        assert_eq!(snap.remove(&RecordId::from("nope")), IndexChange::Unchanged);
        assert_eq!(snap.version(), 0);
    }

    #[test]
    fn test_from_records_keeps_last_duplicate() {
        let snap = IndexSnapshot::from_records(
            grid(),
            vec![item("a", 1.0, 1.0), item("a", 40.0, 40.0), item("b", 2.0, 2.0)],
        );
        assert_eq!(snap.len(), 2);
        let a = snap.get(&RecordId::from("a")).unwrap();
        assert_eq!(a.coordinate.unwrap().latitude(), 40.0);
        snap.verify().unwrap();
    }

    #[test]
    fn test_both_strategies_agree() {
        let records = (0..200).map(|i| {
            let lat = -60.0 + (i as f64 * 0.61) % 120.0;
            let lon = -170.0 + (i as f64 * 1.73) % 340.0;
            item(&format!("r{}", i), lat, lon)
        });
        let snap = IndexSnapshot::from_records(grid(), records);

        // Small box: walks box cells. World box: walks occupied cells.
        let small = bounding_box(&validate(0.0, 0.0).unwrap(), 500.0);
        let by_box: HashSet<_> = snap.query_bounding_box(&small);
        let by_scan: HashSet<_> = snap
            .records()
            .filter(|r| {
                let key = snap.geometry().key_for(&r.coordinate.unwrap());
                snap.geometry().rows_for(&small).contains(&key.row)
                    && snap
                        .geometry()
                        .col_ranges_for(&small)
                        .iter()
                        .any(|c| c.contains(&key.col))
            })
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(by_box, by_scan);

        let all = snap.query_bounding_box(&BoundingBox::WORLD);
        assert_eq!(all.len(), 200);
    }

    #[test]
    fn test_verify_detects_stray_id() {
        let mut snap = IndexSnapshot::from_records(grid(), vec![item("a", 5.5, 5.5)]);
        snap.verify().unwrap();

        snap.file_stray_id(CellKey { row: 0, col: 0 }, RecordId::from("a"));
        let err = snap.verify().unwrap_err();
        assert!(matches!(err, IndexError::Inconsistent { .. }));
    }
}
