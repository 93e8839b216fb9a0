//! Distance command.

use clap::Args;
use geoprox::coord::{validate, Coordinate};
use geoprox::geo::{format_distance, haversine_distance_km, initial_bearing_deg};

use crate::error::CliError;

/// Arguments for `geoprox distance`.
#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// Start point as "lat,lon"
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub from: Coordinate,

    /// End point as "lat,lon"
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub to: Coordinate,
}

/// Run the distance command.
pub fn run(args: DistanceArgs) -> Result<(), CliError> {
    let km = haversine_distance_km(&args.from, &args.to);
    let bearing = initial_bearing_deg(&args.from, &args.to);

    println!("From:     {}", args.from);
    println!("To:       {}", args.to);
    println!("Distance: {} ({:.3} km)", format_distance(km), km);
    println!("Bearing:  {:.1}°", bearing);
    Ok(())
}

/// Parses "lat,lon" into a validated coordinate.
pub fn parse_point(s: &str) -> Result<Coordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{}\"", s))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude \"{}\"", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude \"{}\"", lon.trim()))?;
    validate(lat, lon).map_err(|e| e.to_string())
}
