use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{Territory, TerritoryCatalog};
use crate::feature::GeoFeature;
use crate::identity;

/// Problems found while indexing a catalog. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogWarning {
    /// The same county is listed by two territories of one state; the later one wins.
    DuplicateCounty {
        state: String,
        county: String,
        previous: String,
        replacement: String,
    },
    /// A catalog key that is not a known state postal code.
    UnknownState { state: String },
}

/// `(state postal code, normalized county name) -> territory`, built once per catalog.
#[derive(Debug, Clone, Default)]
pub struct TerritoryIndex {
    catalog: TerritoryCatalog,
    by_state: HashMap<String, HashMap<String, Arc<Territory>>>,
    warnings: Vec<CatalogWarning>,
}

impl TerritoryIndex {
    pub fn build(catalog: TerritoryCatalog) -> Self {
        let mut by_state: HashMap<String, HashMap<String, Arc<Territory>>> = HashMap::new();
        let mut warnings = Vec::new();

        for (state, territories) in catalog.states() {
            let state = state.to_ascii_uppercase();
            if identity::fips_for_usps(&state).is_none() {
                tracing::warn!(state = %state, "catalog lists an unknown state");
                warnings.push(CatalogWarning::UnknownState {
                    state: state.clone(),
                });
            }

            let counties = by_state.entry(state.clone()).or_default();
            for territory in territories {
                for county in &territory.counties {
                    let name = identity::normalize_county_name(county);
                    if name.is_empty() {
                        continue;
                    }
                    if let Some(previous) = counties.insert(name, Arc::clone(territory))
                        && previous.key != territory.key
                    {
                        tracing::warn!(
                            state = %state,
                            county = county.as_str(),
                            previous = previous.key.as_str(),
                            replacement = territory.key.as_str(),
                            "county listed by two territories, keeping the later one"
                        );
                        warnings.push(CatalogWarning::DuplicateCounty {
                            state: state.clone(),
                            county: identity::clean_county_name(county),
                            previous: previous.key.clone(),
                            replacement: territory.key.clone(),
                        });
                    }
                }
            }
        }

        Self {
            catalog,
            by_state,
            warnings,
        }
    }

    pub fn catalog(&self) -> &TerritoryCatalog {
        &self.catalog
    }

    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    /// Territory a county feature belongs to, if any.
    pub fn classify(&self, county: &GeoFeature) -> Option<Arc<Territory>> {
        let state = identity::county_state_code(county)?;
        let name = identity::county_name(county)?;
        self.classify_county(state, &name)
    }

    pub fn classify_county(&self, state: &str, county_name: &str) -> Option<Arc<Territory>> {
        self.by_state
            .get(&state.to_ascii_uppercase())?
            .get(&identity::normalize_county_name(county_name))
            .cloned()
    }

    /// True when the catalog lists at least one territory for the state.
    pub fn state_has_coverage(&self, state: &str) -> bool {
        !self.catalog.territories(state).is_empty()
    }

    pub fn covered_county_count(&self, state: &str) -> usize {
        self.by_state
            .get(&state.to_ascii_uppercase())
            .map_or(0, HashMap::len)
    }

    /// States with at least one covered county are highlighted and hoverable.
    pub fn is_state_interactive(&self, state: &str) -> bool {
        self.covered_county_count(state) > 0
    }

    pub fn territories_for(&self, state: &str) -> &[Arc<Territory>] {
        self.catalog.territories(state)
    }
}
