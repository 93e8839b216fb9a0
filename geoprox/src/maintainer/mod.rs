//! Index maintenance daemon.
//!
//! The [`IndexMaintainer`] runs as an independent async task that receives
//! [`IndexEvent`]s from the record store and applies them to the shared
//! [`SpatialIndex`]. Producers hold a cloneable [`IndexMaintainerHandle`].
//!
//! ```text
//! store hooks ──▶ IndexMaintainerHandle ──mpsc──▶ IndexMaintainer ──▶ SpatialIndex
//! ```
//!
//! Searches never wait on the maintainer: they read whichever snapshot is
//! current, so a search may miss an event still sitting in the channel.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::index::{IndexChange, SpatialIndex};
use crate::record::{GeoRecord, RecordId};
use crate::store::IndexEvent;

/// Errors raised by the maintainer handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaintainerError {
    #[error("Index maintainer has stopped")]
    Closed,
}

/// Counts of what the maintainer applied during its run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintainerStats {
    pub events: u64,
    pub inserted: u64,
    pub updated: u64,
    pub moved: u64,
    pub removed: u64,
    pub unchanged: u64,
    pub rebuilds: u64,
}

impl MaintainerStats {
    fn record(&mut self, change: IndexChange) {
        match change {
            IndexChange::Inserted => self.inserted += 1,
            IndexChange::Updated => self.updated += 1,
            IndexChange::Moved => self.moved += 1,
            IndexChange::Removed => self.removed += 1,
            IndexChange::Unchanged => self.unchanged += 1,
        }
    }
}

/// Sending side of the maintainer channel.
#[derive(Debug, Clone)]
pub struct IndexMaintainerHandle {
    tx: mpsc::UnboundedSender<IndexEvent>,
}

impl IndexMaintainerHandle {
    pub fn send(&self, event: IndexEvent) -> Result<(), MaintainerError> {
        self.tx.send(event).map_err(|_| MaintainerError::Closed)
    }

    /// A record was created or changed.
    pub fn upsert(&self, record: GeoRecord) -> Result<(), MaintainerError> {
        self.send(IndexEvent::Upsert(record))
    }

    /// A record was deleted.
    pub fn remove(&self, id: RecordId) -> Result<(), MaintainerError> {
        self.send(IndexEvent::Remove(id))
    }

    /// Replace the index with the given record set.
    pub fn rebuild(&self, records: Vec<GeoRecord>) -> Result<(), MaintainerError> {
        self.send(IndexEvent::Rebuild(records))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The index maintenance daemon.
pub struct IndexMaintainer {
    rx: mpsc::UnboundedReceiver<IndexEvent>,
    index: Arc<SpatialIndex>,
    stats: MaintainerStats,
}

impl IndexMaintainer {
    /// Creates a maintainer for `index` and the handle that feeds it.
    pub fn new(index: Arc<SpatialIndex>) -> (Self, IndexMaintainerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let maintainer = Self {
            rx,
            index,
            stats: MaintainerStats::default(),
        };
        (maintainer, IndexMaintainerHandle { tx })
    }

    /// Runs until shutdown is signalled or every handle is dropped.
    ///
    /// Events already queued when shutdown fires are discarded; the index is
    /// a cache and the next rebuild restores them.
    pub async fn run(mut self, shutdown: CancellationToken) -> MaintainerStats {
        info!("Index maintainer starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Index maintainer shutting down");
                    break;
                }

                event = self.rx.recv() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        debug!("All maintainer handles dropped");
                        break;
                    }
                },
            }
        }

        debug!(
            events = self.stats.events,
            rebuilds = self.stats.rebuilds,
            "Index maintainer stopped"
        );
        self.stats
    }

    fn apply(&mut self, event: IndexEvent) {
        self.stats.events += 1;
        let kind = event.kind();

        match event {
            IndexEvent::Upsert(record) => {
                let change = self.index.update(record);
                self.stats.record(change);
                debug!(event = kind, ?change, "Applied index event");
            }
            IndexEvent::Remove(id) => {
                let change = self.index.remove(&id);
                self.stats.record(change);
                debug!(event = kind, id = %id, ?change, "Applied index event");
            }
            IndexEvent::Rebuild(records) => {
                self.index.rebuild_snapshot(records);
                self.stats.rebuilds += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::validate;
    use crate::record::RecordKind;

    fn item(id: &str, lat: f64, lon: f64) -> GeoRecord {
        GeoRecord::new(id, RecordKind::Item).with_coordinate(validate(lat, lon).unwrap())
    }

    #[tokio::test]
    async fn test_applies_events_until_handles_drop() {
        let index = Arc::new(SpatialIndex::with_defaults());
        let (maintainer, handle) = IndexMaintainer::new(Arc::clone(&index));
        let task = tokio::spawn(maintainer.run(CancellationToken::new()));

        handle.upsert(item("a", 10.0, 10.0)).unwrap();
        handle.upsert(item("b", 20.0, 20.0)).unwrap();
        handle.upsert(item("a", 30.0, 30.0)).unwrap();
        handle.remove(RecordId::from("b")).unwrap();
        handle.remove(RecordId::from("missing")).unwrap();
        drop(handle);

        let stats = task.await.unwrap();
        assert_eq!(stats.events, 5);
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.unchanged, 1);

        assert_eq!(index.len(), 1);
        let a = index.get(&RecordId::from("a")).unwrap();
        assert_eq!(a.coordinate, Some(validate(30.0, 30.0).unwrap()));
        index.verify().unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_event() {
        let index = Arc::new(SpatialIndex::with_defaults());
        index.insert(item("old", 0.0, 0.0));
        let (maintainer, handle) = IndexMaintainer::new(Arc::clone(&index));
        let task = tokio::spawn(maintainer.run(CancellationToken::new()));

        handle
            .rebuild(vec![item("x", 1.0, 1.0), item("y", 2.0, 2.0)])
            .unwrap();
        drop(handle);

        let stats = task.await.unwrap();
        assert_eq!(stats.rebuilds, 1);
        assert_eq!(index.len(), 2);
        assert!(index.get(&RecordId::from("old")).is_none());
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let index = Arc::new(SpatialIndex::with_defaults());
        let (maintainer, handle) = IndexMaintainer::new(index);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(maintainer.run(shutdown.clone()));

        shutdown.cancel();
        let stats = task.await.unwrap();
        assert_eq!(stats, MaintainerStats::default());

        assert!(handle.is_closed());
        assert_eq!(
            handle.upsert(item("late", 0.0, 0.0)),
            Err(MaintainerError::Closed)
        );
    }
}
