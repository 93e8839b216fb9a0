//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::MAX_CELL_SIZE_DEG;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::validate;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
/// Unknown sections and keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [index] section
    if let Some(section) = ini.section(Some("index")) {
        if let Some(v) = section.get("cell_size_deg") {
            let size: f64 = parse_value("index", "cell_size_deg", v)?;
            if size.is_nan() || size <= 0.0 || size > MAX_CELL_SIZE_DEG {
                return Err(invalid(
                    "index",
                    "cell_size_deg",
                    v,
                    "must be greater than 0 and at most 90",
                ));
            }
            config.index.cell_size_deg = size;
        }
    }

    // [search] section
    if let Some(section) = ini.section(Some("search")) {
        if let Some(v) = section.get("default_radius_km") {
            config.search.default_radius_km = parse_positive("search", "default_radius_km", v)?;
        }
        if let Some(v) = section.get("earth_radius_km") {
            config.search.earth_radius_km = parse_positive("search", "earth_radius_km", v)?;
        }
        if let Some(v) = section.get("max_limit") {
            let limit: usize = parse_value("search", "max_limit", v)?;
            if limit == 0 {
                return Err(invalid("search", "max_limit", v, "must be at least 1"));
            }
            config.search.max_limit = limit;
        }
        if let Some(v) = section.get("default_limit") {
            let limit: usize = parse_value("search", "default_limit", v)?;
            if limit == 0 {
                return Err(invalid("search", "default_limit", v, "must be at least 1"));
            }
            config.search.default_limit = limit;
        }
        if config.search.default_limit > config.search.max_limit {
            return Err(invalid(
                "search",
                "default_limit",
                &config.search.default_limit.to_string(),
                &format!("must not exceed max_limit ({})", config.search.max_limit),
            ));
        }
    }

    // [position] section
    if let Some(section) = ini.section(Some("position")) {
        let latitude = parse_optional("position", "home_latitude", section.get("home_latitude"))?;
        let longitude =
            parse_optional("position", "home_longitude", section.get("home_longitude"))?;

        match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                validate(lat, lon).map_err(|e| {
                    invalid("position", "home_latitude", &format!("{}, {}", lat, lon), &e.to_string())
                })?;
                config.position.home_latitude = Some(lat);
                config.position.home_longitude = Some(lon);
            }
            (None, None) => {}
            (Some(lat), None) => {
                return Err(invalid(
                    "position",
                    "home_longitude",
                    "",
                    &format!("required when home_latitude is set ({})", lat),
                ));
            }
            (None, Some(lon)) => {
                return Err(invalid(
                    "position",
                    "home_latitude",
                    "",
                    &format!("required when home_longitude is set ({})", lon),
                ));
            }
        }

        if let Some(meters) = parse_optional(
            "position",
            "home_accuracy_meters",
            section.get("home_accuracy_meters"),
        )? {
            if meters.is_nan() || meters < 0.0 {
                return Err(invalid(
                    "position",
                    "home_accuracy_meters",
                    &meters.to_string(),
                    "must not be negative",
                ));
            }
            config.position.home_accuracy_meters = Some(meters);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(section: &str, key: &str, v: &str) -> Result<T, ConfigFileError> {
    v.trim()
        .parse()
        .map_err(|_| invalid(section, key, v, "not a valid number"))
}

fn parse_positive(section: &str, key: &str, v: &str) -> Result<f64, ConfigFileError> {
    let value: f64 = parse_value(section, key, v)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(section, key, v, "must be a positive number"));
    }
    Ok(value)
}

/// Empty values mean "not set".
fn parse_optional(
    section: &str,
    key: &str,
    v: Option<&str>,
) -> Result<Option<f64>, ConfigFileError> {
    match v.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_value(section, key, v).map(Some),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
