//! Grid-bucketed spatial index over geotagged records.
//!
//! # Design
//!
//! The globe is divided into square lat/lon cells (1° by default). Each
//! record is filed under the one cell its coordinate falls in, so a proximity
//! query only has to look at the handful of cells overlapping its bounding
//! box instead of every record.
//!
//! ```text
//! record (37.80, -122.27) ──▶ cell (row 127, col 57)
//! query box 37.6..37.9, -122.7..-122.1 ──▶ cells (127, 57..=57)
//! ```
//!
//! # Concurrency
//!
//! The current version lives in an `Arc<IndexSnapshot>` behind a
//! `parking_lot::RwLock`. Readers hold the lock only long enough to clone the
//! `Arc` and then scan lock-free, so a long query never blocks a writer.
//!
//! Writers are serialized by a separate mutex and apply changes
//! copy-on-write. When no reader holds the current version the change is
//! made in place under the write lock. Otherwise the version is copied and
//! changed outside the lock, and only the pointer swap takes the write lock,
//! so readers never wait on a copy. A move between cells is applied as one
//! write, so no reader ever sees a record in zero or two cells.
//!
//! Rebuilds and heals take the writer mutex too. A write issued while a heal
//! is running waits for it and lands on the healed version.
//!
//! # Staleness
//!
//! The index is a cache of the record store. A record missing from the index
//! may simply not have been indexed yet; callers that need strong
//! consistency rebuild from the store with [`SpatialIndex::rebuild_snapshot`].

mod cell;
mod error;
mod snapshot;

pub use cell::{CellKey, GridGeometry};
pub use error::IndexError;
pub use snapshot::{IndexCell, IndexChange, IndexSnapshot, IndexedRecord};

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::geo::BoundingBox;
use crate::record::{GeoRecord, RecordId};

/// Default grid cell size in degrees.
pub const DEFAULT_CELL_SIZE_DEG: f64 = 1.0;

/// Configuration for the spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Grid cell size in degrees (default: 1.0)
    pub cell_size_deg: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cell_size_deg: DEFAULT_CELL_SIZE_DEG,
        }
    }
}

/// Concurrent spatial index of located records.
pub struct SpatialIndex {
    current: RwLock<Arc<IndexSnapshot>>,
    /// Held by every writer for the whole of its change
    writer: Mutex<()>,
    geometry: GridGeometry,
}

impl SpatialIndex {
    /// Create a new empty index.
    pub fn new(config: IndexConfig) -> Result<Self, IndexError> {
        let geometry = GridGeometry::new(config.cell_size_deg)?;
        Ok(Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty(geometry))),
            writer: Mutex::new(()),
            geometry,
        })
    }

    /// Create with the default 1° grid.
    pub fn with_defaults() -> Self {
        let geometry = GridGeometry::default();
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty(geometry))),
            writer: Mutex::new(()),
            geometry,
        }
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Returns the current version for lock-free reading.
    ///
    /// The returned snapshot is immutable; later writes never affect it.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.current.read())
    }

    fn apply<F>(&self, f: F) -> IndexChange
    where
        F: FnOnce(&mut IndexSnapshot) -> IndexChange,
    {
        let _writer = self.writer.lock();

        {
            let mut current = self.current.write();
            if let Some(snapshot) = Arc::get_mut(&mut current) {
                return f(snapshot);
            }
        }

        // A reader holds the current version. Only writers replace it and we
        // hold the writer mutex, so copying it outside the lock is safe.
        let mut next = IndexSnapshot::clone(&self.snapshot());
        let change = f(&mut next);
        *self.current.write() = Arc::new(next);
        change
    }

    /// Swaps in a freshly built version. Caller holds the writer mutex.
    fn install(&self, mut fresh: IndexSnapshot) -> u64 {
        let mut current = self.current.write();
        let version = current.version() + 1;
        fresh.set_version(version);
        *current = Arc::new(fresh);
        version
    }

    /// Files a new record under its cell.
    ///
    /// A record without a coordinate is not indexed. Inserting an id that is
    /// already present replaces it.
    pub fn insert(&self, record: GeoRecord) -> IndexChange {
        let id = record.id.clone();
        let change = self.apply(|snapshot| snapshot.upsert(record));
        if change == IndexChange::Unchanged {
            debug!(id = %id, "Record has no coordinate, not indexed");
        }
        change
    }

    /// Applies a changed record, moving it between cells if its position
    /// changed and removing it if its position was cleared.
    pub fn update(&self, record: GeoRecord) -> IndexChange {
        let id = record.id.clone();
        let change = self.apply(|snapshot| snapshot.upsert(record));
        if change == IndexChange::Moved {
            debug!(id = %id, "Record moved to a new cell");
        }
        change
    }

    /// Drops a record from the index.
    pub fn remove(&self, id: &RecordId) -> IndexChange {
        self.apply(|snapshot| snapshot.remove(id))
    }

    /// Ids of every record in every cell overlapping the box.
    pub fn query_bounding_box(&self, bbox: &BoundingBox) -> HashSet<RecordId> {
        self.snapshot().query_bounding_box(bbox)
    }

    /// Replaces the whole index with a version built from `records`.
    ///
    /// The new version is built without holding any lock and swapped in
    /// atomically. Returns the new version number.
    pub fn rebuild_snapshot<I>(&self, records: I) -> u64
    where
        I: IntoIterator<Item = GeoRecord>,
    {
        let fresh = IndexSnapshot::from_records(self.geometry, records);

        let version = {
            let _writer = self.writer.lock();
            self.install(fresh)
        };

        let snapshot = self.snapshot();
        info!(
            version,
            records = snapshot.len(),
            cells = snapshot.occupied_cells(),
            "Rebuilt spatial index snapshot"
        );
        version
    }

    /// Rebuilds the grid from the index's own record table.
    ///
    /// Used to recover from an [`IndexError::Inconsistent`] without going
    /// back to the record store. Writers wait for the heal to finish, so no
    /// concurrent insert, update or remove is lost. Readers keep scanning the
    /// old version until the swap.
    pub fn heal(&self) -> u64 {
        let _writer = self.writer.lock();

        let current = self.snapshot();
        let fresh = IndexSnapshot::from_records(
            self.geometry,
            current.records().map(|record| (**record).clone()),
        );
        let records = fresh.len();
        let version = self.install(fresh);

        info!(version, records, "Healed spatial index snapshot");
        version
    }

    /// Looks up an indexed record.
    pub fn get(&self, id: &RecordId) -> Option<Arc<GeoRecord>> {
        self.snapshot().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    pub fn occupied_cells(&self) -> usize {
        self.current.read().occupied_cells()
    }

    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Checks the one-cell-per-record invariant on the current version.
    pub fn verify(&self) -> Result<(), IndexError> {
        self.snapshot().verify()
    }

    #[cfg(test)]
    pub(crate) fn corrupt_for_test(&self, key: CellKey, id: RecordId) {
        let _writer = self.writer.lock();
        let mut current = self.current.write();
        Arc::make_mut(&mut current).file_stray_id(key, id);
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::validate;
    use crate::geo::bounding_box;
    use crate::record::RecordKind;

    fn user(id: &str, lat: f64, lon: f64) -> GeoRecord {
        GeoRecord::new(id, RecordKind::User).with_coordinate(validate(lat, lon).unwrap())
    }

    fn ids(set: HashSet<RecordId>) -> Vec<String> {
        let mut v: Vec<String> = set.into_iter().map(|id| id.to_string()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_invalid_config() {
        let result = SpatialIndex::new(IndexConfig { cell_size_deg: 0.0 });
        assert!(matches!(result, Err(IndexError::InvalidCellSize(_))));
    }

    #[test]
    fn test_insert_and_query() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("oakland", 37.8044, -122.2712));
        index.insert(user("nyc", 40.7128, -74.0060));

        let bbox = bounding_box(&validate(37.7749, -122.4194).unwrap(), 20.0);
        assert_eq!(ids(index.query_bounding_box(&bbox)), vec!["oakland"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_update_moves_between_cells() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("u1", 37.8, -122.3));
        assert_eq!(index.update(user("u1", 40.7, -74.0)), IndexChange::Moved);

        let sf_box = bounding_box(&validate(37.8, -122.3).unwrap(), 10.0);
        let ny_box = bounding_box(&validate(40.7, -74.0).unwrap(), 10.0);
        assert!(index.query_bounding_box(&sf_box).is_empty());
        assert_eq!(ids(index.query_bounding_box(&ny_box)), vec!["u1"]);
        assert_eq!(index.occupied_cells(), 1);
        index.verify().unwrap();
    }

    #[test]
    fn test_remove() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("u1", 1.0, 1.0));
        assert_eq!(index.remove(&RecordId::from("u1")), IndexChange::Removed);
        assert!(index.is_empty());
        assert_eq!(index.remove(&RecordId::from("u1")), IndexChange::Unchanged);
    }

    #[test]
    fn test_unlocated_records_are_excluded() {
        let index = SpatialIndex::with_defaults();
        let change = index.insert(GeoRecord::new("ghost", RecordKind::Item));
        assert_eq!(change, IndexChange::Unchanged);
        assert!(index.query_bounding_box(&BoundingBox::WORLD).is_empty());
    }

    #[test]
    fn test_antimeridian_query_finds_both_sides() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("east", 0.0, 179.95));
        index.insert(user("west", 0.0, -179.9));
        index.insert(user("far", 0.0, 0.0));

        let bbox = bounding_box(&validate(0.0, 179.9).unwrap(), 30.0);
        assert_eq!(ids(index.query_bounding_box(&bbox)), vec!["east", "west"]);
    }

    #[test]
    fn test_polar_query() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("a", 89.9, 0.0));
        index.insert(user("b", 89.9, 180.0));

        let bbox = bounding_box(&validate(89.95, 90.0).unwrap(), 50.0);
        assert_eq!(ids(index.query_bounding_box(&bbox)), vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_isolation() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("u1", 10.0, 10.0));

        let before = index.snapshot();
        index.insert(user("u2", 10.1, 10.1));
        index.remove(&RecordId::from("u1"));

        assert_eq!(before.len(), 1);
        assert!(before.get(&RecordId::from("u1")).is_some());
        assert_eq!(index.len(), 1);
        assert!(index.get(&RecordId::from("u2")).is_some());
        assert!(index.version() > before.version());
    }

    #[test]
    fn test_rebuild_snapshot_replaces_contents() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("old", 5.0, 5.0));
        let v1 = index.version();

        let v2 = index.rebuild_snapshot(vec![user("new1", 1.0, 1.0), user("new2", 2.0, 2.0)]);
        assert!(v2 > v1);
        assert_eq!(index.len(), 2);
        assert!(index.get(&RecordId::from("old")).is_none());
        index.verify().unwrap();
    }

    #[test]
    fn test_heal_repairs_corruption() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("a", 12.5, 12.5));
        index.corrupt_for_test(CellKey { row: 0, col: 0 }, RecordId::from("a"));
        assert!(index.verify().is_err());

        index.heal();
        index.verify().unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_heal_keeps_concurrent_writes() {
        let index = SpatialIndex::with_defaults();
        index.rebuild_snapshot(
            (0..20_000).map(|i| user(&format!("seed{}", i), (i % 170) as f64 - 85.0, (i % 350) as f64 - 175.0)),
        );
        index.insert(user("a", 12.5, 12.5));
        index.remove(&RecordId::from("seed0"));

        for round in 0..3 {
            index.corrupt_for_test(CellKey { row: 0, col: 0 }, RecordId::from("a"));

            std::thread::scope(|scope| {
                let writer = &index;
                scope.spawn(move || {
                    for i in 0..200 {
                        writer.insert(user(&format!("new{}-{}", round, i), 40.0, (i % 100) as f64));
                    }
                    writer.remove(&RecordId::from(format!("seed{}", round + 1).as_str()));
                });
                let healer = &index;
                scope.spawn(move || {
                    for _ in 0..5 {
                        healer.heal();
                    }
                });
            });

            index.verify().unwrap();
            for i in 0..200 {
                let id = RecordId::from(format!("new{}-{}", round, i).as_str());
                assert!(index.get(&id).is_some(), "round {} lost {}", round, id);
            }
            let removed = RecordId::from(format!("seed{}", round + 1).as_str());
            assert!(index.get(&removed).is_none(), "round {} resurrected {}", round, removed);
        }

        assert_eq!(index.len(), 20_000 - 4 + 1 + 600);
    }

    #[test]
    fn test_write_while_reader_holds_version() {
        let index = SpatialIndex::with_defaults();
        index.insert(user("a", 1.0, 1.0));

        let held = index.snapshot();
        let before = held.version();
        assert_eq!(index.insert(user("b", 2.0, 2.0)), IndexChange::Inserted);
        assert_eq!(index.update(user("a", 50.0, 50.0)), IndexChange::Moved);

        // The held version is untouched and the writes landed on a copy
        assert_eq!(held.version(), before);
        assert_eq!(held.len(), 1);
        assert!(held.get(&RecordId::from("b")).is_none());
        assert_eq!(index.len(), 2);
        assert_eq!(index.version(), before + 2);
        index.verify().unwrap();

        drop(held);
        assert_eq!(index.remove(&RecordId::from("b")), IndexChange::Removed);
        assert_eq!(index.version(), before + 3);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let index = SpatialIndex::with_defaults();
        for i in 0..100 {
            index.insert(user(&format!("seed{}", i), (i % 50) as f64, (i % 90) as f64));
        }

        std::thread::scope(|scope| {
            for w in 0..4 {
                let index = &index;
                scope.spawn(move || {
                    for i in 0..250 {
                        let id = format!("w{}-{}", w, i % 25);
                        let lat = ((i * 7 + w) % 170) as f64 - 85.0;
                        let lon = ((i * 13 + w) % 350) as f64 - 175.0;
                        index.update(user(&id, lat, lon));
                        if i % 10 == 0 {
                            index.remove(&RecordId::from(id.as_str()));
                        }
                    }
                });
            }
            for _ in 0..4 {
                let index = &index;
                scope.spawn(move || {
                    for _ in 0..250 {
                        let snapshot = index.snapshot();
                        snapshot.verify().unwrap();
                        let _ = snapshot.query_bounding_box(&BoundingBox::WORLD);
                    }
                });
            }
        });

        index.verify().unwrap();
    }
}
