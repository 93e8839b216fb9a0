//! Geoprox - proximity search over geotagged records
//!
//! Answers "which users or items are within R km of this point, nearest
//! first" using a grid-bucketed spatial index and exact haversine distance.
//!
//! # High-Level API
//!
//! ```
//! use geoprox::coord::validate;
//! use geoprox::query::{EngineConfig, ProximityEngine, SearchQuery};
//! use geoprox::record::{GeoRecord, RecordKind};
//!
//! let engine = ProximityEngine::new(EngineConfig::default()).unwrap();
//! engine.index_insert(
//!     GeoRecord::new("u1", RecordKind::User)
//!         .with_coordinate(validate(37.7749, -122.4194).unwrap())
//!         .with_accuracy(8.0),
//! );
//!
//! let page = engine.search(&SearchQuery::new(37.78, -122.41, 5.0)).unwrap();
//! assert_eq!(page[0].record.id.as_str(), "u1");
//! ```
//!
//! # Modules
//!
//! - [`coord`] / [`geo`]: validated coordinates, haversine, bounding boxes
//! - [`index`]: copy-on-write spatial grid shared by readers and writers
//! - [`query`]: the search engine, cursors and cancellation
//! - [`store`] / [`maintainer`]: feeding the index from the record store
//! - [`position`]: where "near me" is
//! - [`config`] / [`logging`]: ambient setup for the CLI

pub mod accuracy;
pub mod config;
pub mod coord;
pub mod geo;
pub mod index;
pub mod logging;
pub mod maintainer;
pub mod position;
pub mod query;
pub mod record;
pub mod store;

/// Version of the geoprox library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
