//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::Path;

use clap::Subcommand;
use geoprox::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(config_path),
        ConfigCommands::Show => run_show(config_path),
        ConfigCommands::Init { force } => run_init(config_path, force),
    }
}

fn run_path(config_path: &Path) -> Result<(), CliError> {
    println!("{}", config_path.display());
    Ok(())
}

fn run_show(config_path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(config_path)?;
    if !config_path.exists() {
        println!("; {} not found, showing defaults", config_path.display());
    }

    println!("[index]");
    println!("  cell_size_deg = {}", config.index.cell_size_deg);
    println!();
    println!("[search]");
    println!("  default_radius_km = {}", config.search.default_radius_km);
    println!("  default_limit = {}", config.search.default_limit);
    println!("  max_limit = {}", config.search.max_limit);
    println!("  earth_radius_km = {}", config.search.earth_radius_km);
    println!();
    println!("[position]");
    println!("  home_latitude = {}", show(config.position.home_latitude));
    println!("  home_longitude = {}", show(config.position.home_longitude));
    println!(
        "  home_accuracy_meters = {}",
        show(config.position.home_accuracy_meters)
    );
    println!();
    println!("[logging]");
    println!("  file = {}", config.logging.file.display());

    Ok(())
}

fn run_init(config_path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(config_path)?;
        println!("Wrote default configuration to {}", config_path.display());
    } else if ConfigFile::ensure_exists_at(config_path)? {
        println!("Created {}", config_path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", config_path.display());
    }
    Ok(())
}

fn show(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}
