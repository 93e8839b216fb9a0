//! Search command.
//!
//! Loads a JSON record snapshot into a fresh index and prints the records
//! nearest to the origin, one page at a time.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, ValueEnum};
use geoprox::coord::{validate, Coordinate};
use geoprox::geo::format_distance;
use geoprox::query::{Cursor, SearchControl, SearchPage, SearchQuery};
use geoprox::record::RecordKind;
use geoprox::store::JsonSnapshotFile;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Only users
    User,
    /// Only items
    Item,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::User => RecordKind::User,
            KindArg::Item => RecordKind::Item,
        }
    }
}

/// Arguments for `geoprox search`.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// JSON file holding the records to search
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Origin latitude (defaults to the configured home position)
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Origin longitude (defaults to the configured home position)
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Search radius in kilometres (default: search.default_radius_km)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Restrict results to one kind of record
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Results per page (default: search.default_limit)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Continue after a previous page (token printed with each page)
    #[arg(long)]
    pub cursor: Option<String>,

    /// Give up if the search takes longer than this many milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

/// Run the search command.
pub fn run(args: SearchArgs, config_path: &Path, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("search");

    let origin = resolve_origin(&args, &runner)?;
    let cursor = args
        .cursor
        .as_deref()
        .map(|token| {
            token
                .parse::<Cursor>()
                .map_err(|e| CliError::InvalidArgument(format!("--cursor: {}", e)))
        })
        .transpose()?;

    let search = &runner.config().search;
    let mut query = SearchQuery::new(
        origin.latitude(),
        origin.longitude(),
        args.radius.unwrap_or(search.default_radius_km),
    )
    .with_limit(args.limit.unwrap_or(search.default_limit))
    .continue_from(cursor);
    if let Some(kind) = args.kind {
        query = query.with_kind(kind.into());
    }

    let engine = runner.load_engine(&JsonSnapshotFile::new(&args.snapshot))?;
    // The timeout covers the search alone, not loading the snapshot
    let control = search_control(args.timeout_ms, Instant::now());
    let page = engine.search_page(&query, &control)?;
    info!(
        results = page.results.len(),
        total = page.total_matches,
        "Search finished"
    );

    print_page(&origin, query.radius_km, query.cursor.is_some(), &page);
    Ok(())
}

fn search_control(timeout_ms: Option<u64>, start: Instant) -> SearchControl {
    match timeout_ms {
        Some(ms) => SearchControl::none().with_deadline(start + Duration::from_millis(ms)),
        None => SearchControl::none(),
    }
}

/// Explicit `--lat/--lon` win; otherwise the configured home position.
fn resolve_origin(args: &SearchArgs, runner: &CliRunner) -> Result<Coordinate, CliError> {
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => validate(lat, lon)
            .map_err(|e| CliError::InvalidArgument(format!("--lat/--lon: {}", e))),
        _ => {
            let provider = runner.config().position.provider()?;
            let fix = provider.current_fix()?;
            info!(origin = %fix.coordinate, "Using configured home position");
            Ok(fix.coordinate)
        }
    }
}

/// `total_matches` counts only what lies past the cursor, so a continued
/// page reports it as remaining.
fn print_page(origin: &Coordinate, radius_km: f64, continued: bool, page: &SearchPage) {
    println!(
        "{}",
        summary_line(origin, radius_km, continued, page.total_matches)
    );

    if page.results.is_empty() {
        return;
    }
    println!();

    for (i, result) in page.results.iter().enumerate() {
        let accuracy = result
            .accuracy_tier
            .map(|tier| tier.label())
            .unwrap_or("-");
        println!(
            "{:>4}. {:<24} {:<5} {:>10}  {}",
            i + 1,
            result.record.id.as_str(),
            result.record.kind.as_str(),
            format_distance(result.distance_km),
            accuracy
        );
    }

    if let Some(cursor) = &page.next_cursor {
        println!();
        println!("More results: --cursor {}", cursor);
    }
}

fn summary_line(origin: &Coordinate, radius_km: f64, continued: bool, matches: usize) -> String {
    let remaining = if continued { " remaining" } else { "" };
    format!(
        "{}{} match(es) within {} of {}",
        matches,
        remaining,
        format_distance(radius_km),
        origin
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_control_without_timeout() {
        let control = search_control(None, Instant::now());
        assert!(control.deadline.is_none());
        assert!(!control.should_stop());
    }

    #[test]
    fn test_search_control_deadline_counts_from_start() {
        // The start is taken once the snapshot is loaded
        let start = Instant::now();
        let control = search_control(Some(250), start);
        assert_eq!(control.deadline, Some(start + Duration::from_millis(250)));

        let control = search_control(Some(0), start);
        assert!(control.should_stop());
    }

    #[test]
    fn test_summary_line_marks_continued_pages() {
        let origin = validate(37.7749, -122.4194).unwrap();
        let first = summary_line(&origin, 50.0, false, 3);
        assert!(first.starts_with("3 match(es) within"));

        let next = summary_line(&origin, 50.0, true, 1);
        assert!(next.starts_with("1 remaining match(es) within"));
    }
}
