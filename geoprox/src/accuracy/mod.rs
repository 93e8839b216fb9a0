//! Position accuracy classification.
//!
//! Maps a raw error margin in metres to a human-meaningful tier. A record
//! that carries no accuracy gets no tier; nothing here ever assumes a record
//! is accurate just because it did not say otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound (inclusive, metres) for [`AccuracyTier::Excellent`].
pub const EXCELLENT_MAX_M: f64 = 5.0;
/// Upper bound (inclusive, metres) for [`AccuracyTier::Good`].
pub const GOOD_MAX_M: f64 = 10.0;
/// Upper bound (inclusive, metres) for [`AccuracyTier::Fair`].
pub const FAIR_MAX_M: f64 = 20.0;
/// Upper bound (inclusive, metres) for [`AccuracyTier::Poor`].
pub const POOR_MAX_M: f64 = 50.0;

/// Accuracy tier, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccuracyTier {
    /// Within 5 m
    Excellent,
    /// Within 10 m
    Good,
    /// Within 20 m
    Fair,
    /// Within 50 m
    Poor,
    /// Worse than 50 m
    VeryPoor,
}

impl AccuracyTier {
    /// Classifies a known error margin in metres.
    ///
    /// Returns `None` for NaN or negative input, which cannot describe an
    /// error radius.
    pub fn from_meters(meters: f64) -> Option<Self> {
        if meters.is_nan() || meters < 0.0 {
            return None;
        }

        let tier = if meters <= EXCELLENT_MAX_M {
            AccuracyTier::Excellent
        } else if meters <= GOOD_MAX_M {
            AccuracyTier::Good
        } else if meters <= FAIR_MAX_M {
            AccuracyTier::Fair
        } else if meters <= POOR_MAX_M {
            AccuracyTier::Poor
        } else {
            AccuracyTier::VeryPoor
        };
        Some(tier)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AccuracyTier::Excellent => "Excellent",
            AccuracyTier::Good => "Good",
            AccuracyTier::Fair => "Fair",
            AccuracyTier::Poor => "Poor",
            AccuracyTier::VeryPoor => "Very Poor",
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies an optional accuracy value.
///
/// Absent accuracy maps to an absent tier.
pub fn classify(accuracy_meters: Option<f64>) -> Option<AccuracyTier> {
    let meters = accuracy_meters?;
    let tier = AccuracyTier::from_meters(meters);
    if tier.is_none() {
        tracing::debug!(meters, "Ignoring unusable accuracy value");
    }
    tier
}
