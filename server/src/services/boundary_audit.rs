use std::time::Instant;

use tracing::{info, warn};
use velox_shared::{BoundaryFetch, GeoFeatureLoader, LoadError, audit_catalog};

use crate::config::{counties_topo, states_topo};
use crate::state::AppState;

/// Reads topology documents over HTTP(S) or from the local filesystem.
pub struct ServerFetch {
    client: reqwest::Client,
}

impl ServerFetch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl BoundaryFetch for ServerFetch {
    async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
        if !is_remote(url) {
            return tokio::fs::read_to_string(url)
                .await
                .map_err(|e| LoadError::Fetch {
                    url: url.to_string(),
                    message: e.to_string(),
                });
        }

        let fetch_error = |e: reqwest::Error| LoadError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };
        let resp = self.client.get(url).send().await.map_err(fetch_error)?;
        if !resp.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        resp.text().await.map_err(fetch_error)
    }
}

/// Load the boundary files once and check every catalog county against them.
/// Failures are logged and leave the coverage report without an audit.
pub async fn run(state: AppState) {
    let started = Instant::now();
    let states_url = states_topo();
    let counties_url = counties_topo();
    let loader = GeoFeatureLoader::new(ServerFetch::new(state.http_client.clone()));

    let boundaries = match loader.load_boundaries(&states_url, &counties_url).await {
        Ok(boundaries) => boundaries,
        Err(e) => {
            warn!(error = %e, "boundary audit skipped");
            return;
        }
    };

    let audit = audit_catalog(&state.catalog.index, &boundaries.counties.features);
    info!(
        states = boundaries.states.features.len(),
        counties = boundaries.counties.features.len(),
        county_object = %boundaries.counties.object_name,
        matched = audit.matched_features,
        unmatched = audit.unmatched_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "boundary audit finished"
    );
    state.coverage.write().await.audit = Some(audit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use velox_shared::TerritoryCatalog;

    const STATES: &str = r#"{"type":"Topology","arcs":[[[0,0],[1,0],[1,1],[0,0]]],
        "objects":{"states":{"type":"GeometryCollection","geometries":[
            {"type":"Polygon","id":"04","arcs":[[0]]}]}}}"#;
    const COUNTIES: &str = r#"{"type":"Topology","arcs":[[[0,0],[1,0],[1,1],[0,0]]],
        "objects":{"counties":{"type":"GeometryCollection","geometries":[
            {"type":"Polygon","id":"04013","properties":{"name":"Maricopa"},"arcs":[[0]]}]}}}"#;

    #[test]
    fn remote_locations_are_detected() {
        assert!(is_remote("https://cdn.example.com/us.json"));
        assert!(!is_remote("client/public/maps/us-states.topo.json"));
    }

    #[tokio::test]
    async fn missing_files_are_fetch_errors() {
        let fetch = ServerFetch::new(reqwest::Client::new());
        let err = fetch
            .fetch_text("/nonexistent/velox/states.json")
            .await
            .expect_err("file is missing");
        assert!(matches!(err, LoadError::Fetch { .. }));
    }

    #[tokio::test]
    async fn audit_runs_against_local_files() {
        let dir = std::env::temp_dir().join(format!("velox-audit-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("create temp dir");
        let states = dir.join("states.json");
        let counties = dir.join("counties.json");
        tokio::fs::write(&states, STATES).await.expect("write states");
        tokio::fs::write(&counties, COUNTIES).await.expect("write counties");

        let catalog = TerritoryCatalog::from_json(
            r#"{"AZ":[{"key":"AZ_PHOENIX","label":"Phoenix","type":"GREEN","counties":["Maricopa","Yuma"]}]}"#,
        )
        .expect("catalog parses");
        let state = AppState::new(catalog);

        temp_env::async_with_vars(
            [
                ("VELOX_STATES_TOPO", Some(states.to_string_lossy().into_owned())),
                ("VELOX_COUNTIES_TOPO", Some(counties.to_string_lossy().into_owned())),
            ],
            run(state.clone()),
        )
        .await;
        let _ = tokio::fs::remove_dir_all(&dir).await;

        let report = state.coverage.read().await;
        let audit = report.audit.as_ref().expect("audit ran");
        assert_eq!(audit.matched_features, 1);
        assert_eq!(audit.unmatched.get("AZ"), Some(&vec!["Yuma".to_string()]));
    }
}
