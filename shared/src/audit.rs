use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::feature::GeoFeature;
use crate::identity;
use crate::index::TerritoryIndex;

/// Result of checking catalog county names against loaded county boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogAudit {
    /// County boundaries that resolved to a catalog territory.
    pub matched_features: usize,
    /// Per state, catalog county names with no boundary feature of that name.
    pub unmatched: BTreeMap<String, Vec<String>>,
}

impl CatalogAudit {
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.values().map(Vec::len).sum()
    }
}

pub fn audit_catalog(index: &TerritoryIndex, counties: &[GeoFeature]) -> CatalogAudit {
    let mut known: HashSet<(&'static str, String)> = HashSet::new();
    let mut matched_features = 0;
    for county in counties {
        let (Some(state), Some(name)) = (
            identity::county_state_code(county),
            identity::county_name(county),
        ) else {
            continue;
        };
        if index.classify_county(state, &name).is_some() {
            matched_features += 1;
        }
        known.insert((state, identity::normalize_county_name(&name)));
    }

    let mut unmatched: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (state, territories) in index.catalog().states() {
        let state = state.to_ascii_uppercase();
        let Some(usps) = identity::fips_for_usps(&state).and_then(identity::usps_for_fips) else {
            continue;
        };
        for territory in territories {
            for county in &territory.counties {
                let key = (usps, identity::normalize_county_name(county));
                if !known.contains(&key) {
                    let missing = unmatched.entry(state.clone()).or_default();
                    let name = identity::clean_county_name(county);
                    if !missing.contains(&name) {
                        missing.push(name);
                    }
                }
            }
        }
    }

    for (state, names) in &unmatched {
        tracing::warn!(state = %state, counties = ?names, "catalog counties missing from boundary data");
    }

    CatalogAudit {
        matched_features,
        unmatched,
    }
}
