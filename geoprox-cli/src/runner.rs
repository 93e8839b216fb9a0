//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and engine creation
//! to reduce duplication across command handlers.

use std::path::Path;

use geoprox::config::ConfigFile;
use geoprox::logging::{init_logging, split_log_path, LoggingGuard};
use geoprox::query::{EngineConfig, ProximityEngine};
use geoprox::store::RecordSource;
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a runner, loading config from `config_path` and initializing
    /// logging.
    ///
    /// Log events go to the configured file. They are mirrored to stdout
    /// only in debug mode so normal output stays clean.
    pub fn new(config_path: &Path, debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load_from(config_path)?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let logging_guard = init_logging(&log_dir, &log_file, debug_mode, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("GeoProx v{}", geoprox::VERSION);
        info!("GeoProx CLI: {} command", command);
    }

    /// Build an engine from the config and fill it from `source`.
    pub fn load_engine(&self, source: &dyn RecordSource) -> Result<ProximityEngine, CliError> {
        let engine = ProximityEngine::new(EngineConfig::from(&self.config))?;
        let version = engine.refresh_from(source)?;
        info!(
            source = source.name(),
            records = engine.index().len(),
            version,
            "Index loaded"
        );
        Ok(engine)
    }
}
