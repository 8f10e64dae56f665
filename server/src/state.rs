use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use velox_shared::{CatalogAudit, CatalogWarning, TerritoryCatalog, TerritoryIndex};

use crate::config::fetch_timeout;

/// Catalog served by the API, serialized once at startup.
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub index: Arc<TerritoryIndex>,
    pub json: Bytes,
    pub etag: String,
}

impl CatalogSnapshot {
    pub fn new(catalog: TerritoryCatalog) -> Self {
        let json = serde_json::to_vec(&catalog)
            .map(Bytes::from)
            .unwrap_or_else(|e| {
                error!(error = %e, "failed to serialize territory catalog");
                Bytes::from_static(b"{}")
            });
        let etag = catalog_etag(&json);
        Self {
            index: Arc::new(TerritoryIndex::build(catalog)),
            json,
            etag,
        }
    }
}

pub fn catalog_etag(json: &[u8]) -> String {
    format!("\"catalog-{:08x}\"", crc32fast::hash(json))
}

/// Read the catalog file at `path`, falling back to the embedded catalog
/// when no path is configured or the file cannot be used.
pub async fn load_catalog(path: Option<&Path>) -> TerritoryCatalog {
    let Some(path) = path else {
        return TerritoryCatalog::embedded();
    };
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, path = %path.display(), "failed to read territory catalog, using embedded catalog");
            return TerritoryCatalog::embedded();
        }
    };
    match TerritoryCatalog::from_json(&text) {
        Ok(catalog) => {
            info!(
                path = %path.display(),
                states = catalog.state_count(),
                territories = catalog.territory_count(),
                "loaded territory catalog"
            );
            catalog
        }
        Err(e) => {
            error!(error = %e, path = %path.display(), "invalid territory catalog, using embedded catalog");
            TerritoryCatalog::embedded()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateCoverage {
    pub state: String,
    pub territories: usize,
    pub covered_counties: usize,
    pub interactive: bool,
}

/// Per-state coverage plus the outcome of the boundary audit, once it has run.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub states: Vec<StateCoverage>,
    pub warnings: Vec<CatalogWarning>,
    pub audit: Option<CatalogAudit>,
}

impl CoverageReport {
    pub fn from_index(index: &TerritoryIndex) -> Self {
        let states = index
            .catalog()
            .states()
            .map(|(state, territories)| StateCoverage {
                state: state.to_string(),
                territories: territories.len(),
                covered_counties: index.covered_county_count(state),
                interactive: index.is_state_interactive(state),
            })
            .collect();
        Self {
            states,
            warnings: index.warnings().to_vec(),
            audit: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogSnapshot>,
    pub coverage: Arc<RwLock<CoverageReport>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(catalog: TerritoryCatalog) -> Self {
        let snapshot = CatalogSnapshot::new(catalog);
        let coverage = CoverageReport::from_index(&snapshot.index);
        let timeout = fetch_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("velox-map/0.1")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build configured HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self {
            catalog: Arc::new(snapshot),
            coverage: Arc::new(RwLock::new(coverage)),
            http_client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_tracks_catalog_content() {
        let a = CatalogSnapshot::new(TerritoryCatalog::embedded());
        let b = CatalogSnapshot::new(TerritoryCatalog::embedded());
        let empty = CatalogSnapshot::new(TerritoryCatalog::default());
        assert_eq!(a.etag, b.etag);
        assert_ne!(a.etag, empty.etag);
        assert!(a.etag.starts_with("\"catalog-") && a.etag.ends_with('"'));
        assert_eq!(&empty.json[..], b"{}");
    }

    #[test]
    fn coverage_report_lists_states_in_catalog_order() {
        let state = AppState::new(TerritoryCatalog::embedded());
        let report = state.coverage.try_read().expect("uncontended lock");
        assert_eq!(report.states.first().map(|s| s.state.as_str()), Some("TX"));
        let alabama = report
            .states
            .iter()
            .find(|s| s.state == "AL")
            .expect("AL is listed");
        assert_eq!(alabama.territories, 0);
        assert!(!alabama.interactive);
        assert_eq!(report.warnings.len(), 3);
        assert!(report.audit.is_none());
    }

    #[tokio::test]
    async fn unreadable_catalog_falls_back_to_embedded() {
        let catalog = load_catalog(Some(Path::new("/nonexistent/velox/catalog.json"))).await;
        assert_eq!(catalog.state_count(), TerritoryCatalog::embedded().state_count());
    }

    #[tokio::test]
    async fn catalog_file_replaces_embedded() {
        let path = std::env::temp_dir().join(format!("velox-catalog-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"{"AZ":[{"key":"AZ_PHOENIX","label":"Phoenix","type":"GREEN","counties":["Maricopa"],"url":""}]}"#,
        )
        .await
        .expect("write catalog");
        let catalog = load_catalog(Some(&path)).await;
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(catalog.state_count(), 1);
        assert_eq!(catalog.territory_count(), 1);
    }
}
