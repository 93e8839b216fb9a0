//! GeoProx CLI - Command-line interface
//!
//! Proximity search over a snapshot of geotagged records.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::config::ConfigCommands;
use commands::distance::DistanceArgs;
use commands::search::SearchArgs;
use geoprox::config::config_file_path;

#[derive(Parser)]
#[command(name = "geoprox")]
#[command(version = geoprox::VERSION)]
#[command(about = "Find users and items near a location", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.geoprox/config.ini
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging (also mirrored to stdout)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a record snapshot for records near a point
    Search(SearchArgs),

    /// Great-circle distance and bearing between two points
    Distance(DistanceArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_file_path);

    let result = match cli.command {
        Commands::Search(args) => commands::search::run(args, &config_path, cli.debug),
        Commands::Distance(args) => commands::distance::run(args),
        Commands::Config(command) => commands::config::run(command, &config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
