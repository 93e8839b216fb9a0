//! Proximity query engine.
//!
//! Answers "which records lie within R km of this point, nearest first":
//!
//! 1. Validate the origin, radius, limit and cursor
//! 2. Compute a conservative bounding box around the origin
//! 3. Collect candidates from the grid cells overlapping the box
//! 4. Keep candidates whose exact haversine distance is within the radius
//! 5. Apply the kind filter and the cursor
//! 6. Sort by `(distance, id)`, truncate to the limit, attach accuracy tiers
//!
//! # Example
//!
//! ```
//! use geoprox::coord::validate;
//! use geoprox::query::{EngineConfig, ProximityEngine, SearchQuery};
//! use geoprox::record::{GeoRecord, RecordKind};
//!
//! let engine = ProximityEngine::new(EngineConfig::default()).unwrap();
//! engine.index_insert(
//!     GeoRecord::new("oakland", RecordKind::Item)
//!         .with_coordinate(validate(37.8044, -122.2712).unwrap()),
//! );
//!
//! let results = engine.search(&SearchQuery::new(37.7749, -122.4194, 20.0)).unwrap();
//! assert_eq!(results.len(), 1);
//! ```

mod engine;
mod error;
mod types;

pub use engine::{EngineConfig, ProximityEngine, CANCEL_CHECK_INTERVAL, DEFAULT_MAX_LIMIT};
pub use error::{EngineError, SearchError};
pub use types::{Cursor, SearchControl, SearchPage, SearchQuery, SearchResult, DEFAULT_LIMIT};
