//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Spatial index settings
    pub index: IndexSettings,
    /// Search defaults and limits
    pub search: SearchSettings,
    /// Configured home position
    pub position: PositionSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Spatial index configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    /// Grid cell edge length in degrees
    pub cell_size_deg: f64,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Radius used when a search does not give one
    pub default_radius_km: f64,
    /// Page size used when a search does not give one
    pub default_limit: usize,
    /// Larger page sizes are clamped to this
    pub max_limit: usize,
    /// Sphere radius for distance computation
    pub earth_radius_km: f64,
}

/// Home position used for "search near me".
///
/// Latitude and longitude are either both set or both absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionSettings {
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
    pub home_accuracy_meters: Option<f64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
