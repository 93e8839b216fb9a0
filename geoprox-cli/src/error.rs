//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geoprox::config::ConfigFileError;
use geoprox::position::PositionError;
use geoprox::query::{EngineError, SearchError};
use geoprox::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// Engine could not be built from the configuration
    Engine(EngineError),
    /// Records could not be loaded
    Store(StoreError),
    /// Search failed
    Search(SearchError),
    /// No origin given and no home position available
    NoPosition(PositionError),
    /// A command-line argument is malformed
    InvalidArgument(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::NoPosition(PositionError::Unavailable) => {
                eprintln!();
                eprintln!("Either:");
                eprintln!("  1. Pass the search origin with --lat and --lon");
                eprintln!("  2. Set home_latitude and home_longitude under [position]");
                eprintln!("     in the file shown by 'geoprox config path'");
            }
            CliError::Store(StoreError::Parse { .. }) => {
                eprintln!();
                eprintln!("The snapshot must be a JSON array of records, e.g.:");
                eprintln!(
                    r#"  [{{"id": "u1", "kind": "user", "latitude": 37.77, "longitude": -122.42}}]"#
                );
            }
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value in the config file, or regenerate it with:");
                eprintln!("  geoprox config init --force");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Engine(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "Failed to load records: {}", e),
            CliError::Search(e) => write!(f, "Search failed: {}", e),
            CliError::NoPosition(e) => write!(f, "No search origin: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Search(e) => Some(e),
            CliError::NoPosition(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<SearchError> for CliError {
    fn from(e: SearchError) -> Self {
        CliError::Search(e)
    }
}

impl From<PositionError> for CliError {
    fn from(e: PositionError) -> Self {
        CliError::NoPosition(e)
    }
}
