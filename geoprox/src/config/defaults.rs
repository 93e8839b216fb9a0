//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;
use crate::geo::EARTH_RADIUS_KM;
use crate::index::DEFAULT_CELL_SIZE_DEG;
use crate::query::{DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};

/// Default search radius when none is given (50 km).
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Largest accepted grid cell size in degrees.
pub const MAX_CELL_SIZE_DEG: f64 = 90.0;

/// Default log file name inside the logs directory.
pub const DEFAULT_LOG_FILE: &str = "geoprox.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            index: IndexSettings {
                cell_size_deg: DEFAULT_CELL_SIZE_DEG,
            },
            search: SearchSettings {
                default_radius_km: DEFAULT_RADIUS_KM,
                default_limit: DEFAULT_LIMIT,
                max_limit: DEFAULT_MAX_LIMIT,
                earth_radius_km: EARTH_RADIUS_KM,
            },
            position: PositionSettings::default(),
            logging: LoggingSettings {
                file: config_directory().join("logs").join(DEFAULT_LOG_FILE),
            },
        }
    }
}
