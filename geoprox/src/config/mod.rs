//! Configuration for the proximity engine and CLI.
//!
//! User settings live in `~/.geoprox/config.ini`:
//!
//! ```ini
//! [index]
//! cell_size_deg = 1.0
//!
//! [search]
//! default_radius_km = 50
//! default_limit = 20
//! max_limit = 500
//! earth_radius_km = 6371
//!
//! [position]
//! home_latitude = 37.7749
//! home_longitude = -122.4194
//!
//! [logging]
//! file = ~/.geoprox/logs/geoprox.log
//! ```
//!
//! A missing file yields defaults. Unknown keys are ignored.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{DEFAULT_LOG_FILE, DEFAULT_RADIUS_KM, MAX_CELL_SIZE_DEG};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, IndexSettings, LoggingSettings, PositionSettings, SearchSettings};

use crate::index::IndexConfig;
use crate::position::{FixedPosition, PositionError, PositionProvider, Unavailable};
use crate::query::EngineConfig;

impl From<&ConfigFile> for EngineConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            index: IndexConfig {
                cell_size_deg: config.index.cell_size_deg,
            },
            earth_radius_km: config.search.earth_radius_km,
            default_limit: config.search.default_limit,
            max_limit: config.search.max_limit,
        }
    }
}

impl PositionSettings {
    /// Builds the position provider for the configured home location.
    ///
    /// Returns [`Unavailable`] when no home position is set.
    pub fn provider(&self) -> Result<Box<dyn PositionProvider>, PositionError> {
        match (self.home_latitude, self.home_longitude) {
            (Some(lat), Some(lon)) => {
                let mut home = FixedPosition::new(lat, lon)?;
                if let Some(meters) = self.home_accuracy_meters {
                    home = home.with_accuracy(meters);
                }
                Ok(Box::new(home))
            }
            _ => Ok(Box::new(Unavailable)),
        }
    }
}
