//! Query, result and pagination types.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::accuracy::AccuracyTier;
use crate::record::{GeoRecord, RecordId, RecordKind};

/// Default page size when the caller does not set one.
pub const DEFAULT_LIMIT: usize = 20;

/// A proximity search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Search centre as `(latitude, longitude)`; validated by the engine
    pub origin: (f64, f64),
    /// Search radius in kilometres (> 0)
    pub radius_km: f64,
    /// Restrict results to one record kind
    pub kind_filter: Option<RecordKind>,
    /// Maximum results per page (> 0)
    pub limit: usize,
    /// Continue after the last result of a previous page
    pub cursor: Option<Cursor>,
}

impl SearchQuery {
    /// Creates a query with the default limit, no kind filter and no cursor.
    pub fn new(lat: f64, lon: f64, radius_km: f64) -> Self {
        Self {
            origin: (lat, lon),
            radius_km,
            kind_filter: None,
            limit: DEFAULT_LIMIT,
            cursor: None,
        }
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind_filter = Some(kind);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Same query, continuing after `cursor` (or from the start if `None`).
    pub fn continue_from(&self, cursor: Option<Cursor>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub record: Arc<GeoRecord>,
    /// Great-circle distance from the query origin
    pub distance_km: f64,
    /// Present only when the record reports an accuracy
    pub accuracy_tier: Option<AccuracyTier>,
}

/// A page of results plus the token for the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Results ordered by ascending distance, ties by record id
    pub results: Vec<SearchResult>,
    /// Set when more matches exist past this page
    pub next_cursor: Option<Cursor>,
    /// Matches after the cursor, before truncation to the limit
    pub total_matches: usize,
    /// Index version the page was read from
    pub snapshot_version: u64,
}

/// Sort key of the last result a caller has seen.
///
/// Continuing from a cursor returns only results strictly after
/// `(last_distance_km, last_id)`, so records inserted between page fetches
/// never shift or duplicate what was already returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub last_distance_km: f64,
    pub last_id: RecordId,
}

impl Cursor {
    /// Cursor positioned after the given result.
    pub fn after(result: &SearchResult) -> Self {
        Self {
            last_distance_km: result.distance_km,
            last_id: result.record.id.clone(),
        }
    }

    /// Returns true if a result with this sort key comes after the cursor.
    #[inline]
    pub fn precedes(&self, distance_km: f64, id: &RecordId) -> bool {
        distance_km
            .total_cmp(&self.last_distance_km)
            .then_with(|| id.cmp(&self.last_id))
            .is_gt()
    }

    /// Returns true if the cursor describes a reachable position.
    pub fn is_well_formed(&self) -> bool {
        self.last_distance_km.is_finite() && self.last_distance_km >= 0.0
    }
}

/// Text form `<distance bits as 16 hex digits>:<id>`.
///
/// The distance is written as raw IEEE-754 bits so it round-trips exactly.
impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}:{}", self.last_distance_km.to_bits(), self.last_id)
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bits, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed cursor '{}'", s))?;
        if bits.len() != 16 || id.is_empty() {
            return Err(format!("malformed cursor '{}'", s));
        }
        let bits = u64::from_str_radix(bits, 16).map_err(|_| format!("malformed cursor '{}'", s))?;

        let cursor = Cursor {
            last_distance_km: f64::from_bits(bits),
            last_id: RecordId::from(id),
        };
        if !cursor.is_well_formed() {
            return Err(format!("cursor distance out of range in '{}'", s));
        }
        Ok(cursor)
    }
}

/// Caller-supplied cancellation for a single search.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    pub cancel: Option<CancellationToken>,
    pub deadline: Option<Instant>,
}

impl SearchControl {
    /// No cancellation and no deadline.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns true once the token fired or the deadline passed.
    pub fn should_stop(&self) -> bool {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
