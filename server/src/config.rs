use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_MAPS_DIR: &str = "client/public/maps";
pub const STATES_TOPO_FILE: &str = "us-states.topo.json";
pub const COUNTIES_TOPO_FILE: &str = "us-counties.topo.json";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    non_empty_var("VELOX_PORT")
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Built client bundle served for every path outside `/api` and `/maps`.
pub fn static_dir() -> PathBuf {
    non_empty_var("VELOX_STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

/// Directory holding the boundary topology files served under `/maps`.
pub fn maps_dir() -> PathBuf {
    non_empty_var("VELOX_MAPS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPS_DIR))
}

/// Optional territory catalog file replacing the embedded one.
pub fn catalog_path() -> Option<PathBuf> {
    non_empty_var("VELOX_CATALOG_PATH").map(PathBuf::from)
}

/// Location (URL or file path) of the state outlines used by the startup audit.
pub fn states_topo() -> String {
    non_empty_var("VELOX_STATES_TOPO")
        .unwrap_or_else(|| maps_dir().join(STATES_TOPO_FILE).to_string_lossy().into_owned())
}

/// Location (URL or file path) of the county outlines used by the startup audit.
pub fn counties_topo() -> String {
    non_empty_var("VELOX_COUNTIES_TOPO")
        .unwrap_or_else(|| maps_dir().join(COUNTIES_TOPO_FILE).to_string_lossy().into_owned())
}

pub fn fetch_timeout() -> Duration {
    non_empty_var("VELOX_FETCH_TIMEOUT_SECS")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_falls_back_on_invalid_values() {
        temp_env::with_var("VELOX_PORT", Some("8080"), || {
            assert_eq!(server_port(), 8080);
        });
        temp_env::with_var("VELOX_PORT", Some("0"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("VELOX_PORT", Some("not-a-port"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var_unset("VELOX_PORT", || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
    }

    #[test]
    fn topology_locations_default_into_maps_dir() {
        temp_env::with_vars(
            [
                ("VELOX_MAPS_DIR", Some("/srv/maps")),
                ("VELOX_STATES_TOPO", None),
                ("VELOX_COUNTIES_TOPO", Some("https://cdn.example.com/counties.json")),
            ],
            || {
                assert_eq!(states_topo(), "/srv/maps/us-states.topo.json");
                assert_eq!(counties_topo(), "https://cdn.example.com/counties.json");
            },
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        temp_env::with_vars(
            [
                ("VELOX_CATALOG_PATH", Some("   ")),
                ("VELOX_STATIC_DIR", Some("")),
            ],
            || {
                assert_eq!(catalog_path(), None);
                assert_eq!(static_dir(), PathBuf::from(DEFAULT_STATIC_DIR));
            },
        );
    }

    #[test]
    fn fetch_timeout_requires_positive_seconds() {
        temp_env::with_var("VELOX_FETCH_TIMEOUT_SECS", Some("3"), || {
            assert_eq!(fetch_timeout(), Duration::from_secs(3));
        });
        temp_env::with_var("VELOX_FETCH_TIMEOUT_SECS", Some("0"), || {
            assert_eq!(fetch_timeout(), Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        });
    }
}
