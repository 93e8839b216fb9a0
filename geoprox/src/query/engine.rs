//! The proximity query engine.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::error::{EngineError, SearchError};
use super::types::{Cursor, SearchControl, SearchPage, SearchQuery, SearchResult, DEFAULT_LIMIT};
use crate::accuracy::classify;
use crate::coord::{validate, Coordinate};
use crate::geo::{bounding_box, great_circle_distance_km, EARTH_RADIUS_KM};
use crate::index::{IndexChange, IndexConfig, IndexError, SpatialIndex};
use crate::record::{GeoRecord, RecordId};
use crate::store::{RecordSource, StoreError};

/// Candidates scanned between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: usize = 256;

/// Default hard cap on page size.
pub const DEFAULT_MAX_LIMIT: usize = 500;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Spatial grid settings
    pub index: IndexConfig,
    /// Sphere radius used for exact distances (default: 6371 km)
    pub earth_radius_km: f64,
    /// Page size suggested to callers that do not pick one
    pub default_limit: usize,
    /// Larger limits are clamped to this value
    pub max_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            earth_radius_km: EARTH_RADIUS_KM,
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), EngineError> {
        if !self.earth_radius_km.is_finite() || self.earth_radius_km <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "earth_radius_km must be positive, got {}",
                self.earth_radius_km
            )));
        }
        if self.max_limit == 0 {
            return Err(EngineError::InvalidConfig(
                "max_limit must be at least 1".to_string(),
            ));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(EngineError::InvalidConfig(format!(
                "default_limit must be between 1 and max_limit ({}), got {}",
                self.max_limit, self.default_limit
            )));
        }
        Ok(())
    }
}

/// Proximity search over a shared spatial index.
///
/// Construct one per index and share it by `Arc`; every method takes `&self`
/// and is safe to call from many tasks at once.
pub struct ProximityEngine {
    config: EngineConfig,
    index: Arc<SpatialIndex>,
}

impl ProximityEngine {
    /// Creates an engine with a fresh, empty index.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let index = Arc::new(SpatialIndex::new(config.index.clone())?);
        Ok(Self { config, index })
    }

    /// Creates an engine over an existing index.
    pub fn with_index(config: EngineConfig, index: Arc<SpatialIndex>) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config, index })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle to the index, e.g. for an `IndexMaintainer`.
    pub fn index(&self) -> Arc<SpatialIndex> {
        Arc::clone(&self.index)
    }

    /// Runs a search and returns the ranked results of one page.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        self.search_page(query, &SearchControl::none())
            .map(|page| page.results)
    }

    /// Runs a search honouring the caller's cancellation token and deadline.
    ///
    /// Validates the query, gathers candidates from the cells overlapping the
    /// search box, keeps those within `radius_km` by exact great-circle
    /// distance, applies the kind filter and cursor, and returns up to
    /// `limit` results ordered by `(distance, id)`.
    ///
    /// If the scan trips over an index invariant violation, the index is
    /// rebuilt from its own record table and the scan retried once.
    pub fn search_page(
        &self,
        query: &SearchQuery,
        control: &SearchControl,
    ) -> Result<SearchPage, SearchError> {
        let origin = validate(query.origin.0, query.origin.1)?;
        let limit = self.check_query(query)?;

        match self.scan(&origin, query, limit, control) {
            Err(SearchError::IndexInconsistent(e)) => {
                error!(error = %e, "Spatial index inconsistent, rebuilding snapshot");
                let version = self.index.heal();
                debug!(version, "Retrying search on rebuilt snapshot");
                self.scan(&origin, query, limit, control)
            }
            other => other,
        }
    }

    /// Validates radius, limit and cursor; returns the effective limit.
    fn check_query(&self, query: &SearchQuery) -> Result<usize, SearchError> {
        if !query.radius_km.is_finite() || query.radius_km <= 0.0 {
            return Err(SearchError::InvalidQuery(format!(
                "radius must be a positive number of kilometres, got {}",
                query.radius_km
            )));
        }
        if query.limit == 0 {
            return Err(SearchError::InvalidQuery(
                "limit must be at least 1".to_string(),
            ));
        }
        if let Some(cursor) = &query.cursor {
            if !cursor.is_well_formed() {
                return Err(SearchError::InvalidQuery(format!(
                    "malformed cursor: distance {}",
                    cursor.last_distance_km
                )));
            }
        }

        if query.limit > self.config.max_limit {
            warn!(
                requested = query.limit,
                max = self.config.max_limit,
                "Search limit above maximum, clamping to {}",
                self.config.max_limit
            );
            Ok(self.config.max_limit)
        } else {
            Ok(query.limit)
        }
    }

    fn scan(
        &self,
        origin: &Coordinate,
        query: &SearchQuery,
        limit: usize,
        control: &SearchControl,
    ) -> Result<SearchPage, SearchError> {
        let snapshot = self.index.snapshot();

        // The box is sized on the mean-radius sphere; rescale so a custom
        // radius covers the same angular extent.
        let box_radius_km = query.radius_km * (EARTH_RADIUS_KM / self.config.earth_radius_km);
        let bbox = bounding_box(origin, box_radius_km);

        let mut matches: Vec<SearchResult> = Vec::new();
        let mut scanned = 0usize;

        for (key, cell) in snapshot.cells_in_box(&bbox) {
            if control.should_stop() {
                return Err(SearchError::Cancelled);
            }

            for id in cell.ids() {
                scanned += 1;
                if scanned % CANCEL_CHECK_INTERVAL == 0 && control.should_stop() {
                    return Err(SearchError::Cancelled);
                }

                let entry = snapshot.entry(id).ok_or_else(|| IndexError::Inconsistent {
                    id: id.clone(),
                    detail: format!("listed in cell {:?} but missing from record table", key),
                })?;
                if entry.cell != key {
                    return Err(IndexError::Inconsistent {
                        id: id.clone(),
                        detail: format!("listed in cell {:?} but filed under {:?}", key, entry.cell),
                    }
                    .into());
                }

                let record = &entry.record;
                let Some(coordinate) = record.coordinate else {
                    return Err(IndexError::Inconsistent {
                        id: id.clone(),
                        detail: "indexed without a coordinate".to_string(),
                    }
                    .into());
                };

                if query.kind_filter.is_some_and(|kind| kind != record.kind) {
                    continue;
                }

                let distance_km =
                    great_circle_distance_km(origin, &coordinate, self.config.earth_radius_km);
                if distance_km > query.radius_km {
                    continue;
                }
                if let Some(cursor) = &query.cursor {
                    if !cursor.precedes(distance_km, &record.id) {
                        continue;
                    }
                }

                matches.push(SearchResult {
                    record: Arc::clone(record),
                    distance_km,
                    accuracy_tier: classify(record.accuracy_meters),
                });
            }
        }

        matches.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });

        let total_matches = matches.len();
        matches.truncate(limit);
        let next_cursor = if total_matches > limit {
            matches.last().map(Cursor::after)
        } else {
            None
        };

        debug!(
            origin = %origin,
            radius_km = query.radius_km,
            scanned,
            matches = total_matches,
            returned = matches.len(),
            version = snapshot.version(),
            "Proximity search complete"
        );

        Ok(SearchPage {
            results: matches,
            next_cursor,
            total_matches,
            snapshot_version: snapshot.version(),
        })
    }

    /// Files a newly created record.
    pub fn index_insert(&self, record: GeoRecord) -> IndexChange {
        self.index.insert(record)
    }

    /// Applies a changed record.
    pub fn index_update(&self, record: GeoRecord) -> IndexChange {
        self.index.update(record)
    }

    /// Drops a deleted record.
    pub fn index_remove(&self, id: &RecordId) -> IndexChange {
        self.index.remove(id)
    }

    /// Replaces the index contents; returns the new version.
    pub fn rebuild_snapshot<I>(&self, records: I) -> u64
    where
        I: IntoIterator<Item = GeoRecord>,
    {
        self.index.rebuild_snapshot(records)
    }

    /// Reloads the index from a record source.
    ///
    /// On failure the current index is left untouched.
    pub fn refresh_from(&self, source: &dyn RecordSource) -> Result<u64, StoreError> {
        let records = source.load()?;
        debug!(source = source.name(), records = records.len(), "Loaded records");
        Ok(self.rebuild_snapshot(records))
    }

    /// Great-circle distance using the configured sphere radius.
    pub fn distance_between(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        great_circle_distance_km(a, b, self.config.earth_radius_km)
    }
}
