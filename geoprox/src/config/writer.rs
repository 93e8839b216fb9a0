//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let home_latitude = optional(config.position.home_latitude);
    let home_longitude = optional(config.position.home_longitude);
    let home_accuracy = optional(config.position.home_accuracy_meters);

    format!(
        r#"[index]
; Grid cell edge length in degrees (default: 1.0)
; Smaller cells mean fewer candidates per query but more cells to visit.
cell_size_deg = {}

[search]
; Radius used when a search does not give one (default: 50)
default_radius_km = {}
; Results per page when a search does not give a limit (default: 20)
default_limit = {}
; Larger limits are clamped to this value (default: 500)
max_limit = {}
; Sphere radius used for distances (default: 6371, the mean Earth radius)
earth_radius_km = {}

[position]
; Home position for searches without --lat/--lon. Leave empty to require them.
home_latitude = {}
home_longitude = {}
; Reported accuracy of the home position in metres (optional)
home_accuracy_meters = {}

[logging]
; Log file path (default: ~/.geoprox/logs/geoprox.log)
file = {}
"#,
        config.index.cell_size_deg,
        config.search.default_radius_km,
        config.search.default_limit,
        config.search.max_limit,
        config.search.earth_radius_km,
        home_latitude,
        home_longitude,
        home_accuracy,
        path_to_string(&config.logging.file),
    )
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_section() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[index]", "[search]", "[position]", "[logging]"] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert!(content.contains("default_radius_km = 50\n"));
        assert!(content.contains("home_latitude = \n"));
    }

    #[test]
    fn test_writes_home_position() {
        let mut config = ConfigFile::default();
        config.position.home_latitude = Some(-33.8688);
        config.position.home_longitude = Some(151.2093);

        let content = to_config_string(&config);
        assert!(content.contains("home_latitude = -33.8688\n"));
        assert!(content.contains("home_longitude = 151.2093\n"));
    }
}
