//! Current-position capability.
//!
//! "Search near me" needs to know where "me" is. That knowledge is injected
//! through a [`PositionProvider`]; when no provider can produce a fix the
//! caller gets a [`PositionError`] and decides what to do. No placeholder
//! coordinate is ever substituted.

use thiserror::Error;

use crate::accuracy::{classify, AccuracyTier};
use crate::coord::{validate, Coordinate, CoordError};

/// Errors returned when no position fix is available.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("No position source is configured")]
    Unavailable,

    #[error("Position source returned an invalid coordinate: {0}")]
    Invalid(#[from] CoordError),
}

/// A position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    /// Reported error margin in metres, if known
    pub accuracy_meters: Option<f64>,
}

impl Fix {
    pub fn accuracy_tier(&self) -> Option<AccuracyTier> {
        classify(self.accuracy_meters)
    }
}

/// Source of the caller's current position.
pub trait PositionProvider: Send + Sync {
    fn current_fix(&self) -> Result<Fix, PositionError>;

    /// Returns true if `current_fix` can be expected to succeed.
    fn is_available(&self) -> bool {
        self.current_fix().is_ok()
    }
}

/// A fixed, configured location such as a home position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition {
    fix: Fix,
}

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PositionError> {
        Ok(Self {
            fix: Fix {
                coordinate: validate(latitude, longitude)?,
                accuracy_meters: None,
            },
        })
    }

    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.fix.accuracy_meters = Some(accuracy_meters);
        self
    }
}

impl PositionProvider for FixedPosition {
    fn current_fix(&self) -> Result<Fix, PositionError> {
        Ok(self.fix)
    }
}

/// Provider used when no position source exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl PositionProvider for Unavailable {
    fn current_fix(&self) -> Result<Fix, PositionError> {
        Err(PositionError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}
