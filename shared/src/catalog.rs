use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::colors;

/// Territory catalog compiled into the crate, keyed by state postal code.
pub const EMBEDDED_CATALOG: &str = include_str!("../data/territories.json");

/// Business classification of a territory. Each has a fixed display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Classification {
    Corporate,
    Franchise,
    Green,
}

impl Classification {
    pub fn color(self) -> &'static str {
        match self {
            Classification::Corporate => colors::CORPORATE,
            Classification::Franchise => colors::FRANCHISE,
            Classification::Green => colors::GREEN,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::Corporate => "Corporate",
            Classification::Franchise => "Franchise",
            Classification::Green => "Green",
        }
    }

    pub const ALL: [Classification; 3] = [
        Classification::Corporate,
        Classification::Franchise,
        Classification::Green,
    ];
}

/// Unrecognized values render as corporate territories.
impl From<String> for Classification {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "FRANCHISE" => Classification::Franchise,
            "GREEN" => Classification::Green,
            _ => Classification::Corporate,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named sales region made of whole counties within one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: Classification,
    /// Owning state postal code; filled in from the catalog key.
    #[serde(skip)]
    pub state: String,
    #[serde(default)]
    pub counties: Vec<String>,
    #[serde(default)]
    pub url: String,
}

/// Ordered mapping from state postal code to its territories.
///
/// Serialized as `{ "TX": [{key, label, type, counties, url}], ... }` with
/// document order preserved.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct TerritoryCatalog {
    states: Vec<(String, Vec<Arc<Territory>>)>,
}

impl TerritoryCatalog {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The catalog shipped with the crate. An unreadable embedded document
    /// yields an empty catalog.
    pub fn embedded() -> Self {
        Self::from_json(EMBEDDED_CATALOG).unwrap_or_else(|err| {
            tracing::error!(%err, "embedded territory catalog is invalid");
            Self::default()
        })
    }

    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Territory>)>,
    {
        let states = states
            .into_iter()
            .map(|(state, territories)| {
                let state = state.to_ascii_uppercase();
                let territories = territories
                    .into_iter()
                    .map(|mut territory| {
                        territory.state = state.clone();
                        Arc::new(territory)
                    })
                    .collect();
                (state, territories)
            })
            .collect();
        Self { states }
    }

    pub fn states(&self) -> impl Iterator<Item = (&str, &[Arc<Territory>])> {
        self.states
            .iter()
            .map(|(state, territories)| (state.as_str(), territories.as_slice()))
    }

    /// Territories listed for `state` (postal code, any case).
    pub fn territories(&self, state: &str) -> &[Arc<Territory>] {
        self.states
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(state))
            .map(|(_, territories)| territories.as_slice())
            .unwrap_or(&[])
    }

    pub fn territory(&self, key: &str) -> Option<&Arc<Territory>> {
        self.states
            .iter()
            .flat_map(|(_, territories)| territories)
            .find(|territory| territory.key == key)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn territory_count(&self) -> usize {
        self.states.iter().map(|(_, territories)| territories.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for TerritoryCatalog {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let states = map
            .into_iter()
            .map(|(state, territories)| {
                serde_json::from_value::<Vec<Territory>>(territories).map(|list| (state, list))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_states(states))
    }
}

impl Serialize for TerritoryCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.states.len()))?;
        for (state, territories) in &self.states {
            let list: Vec<&Territory> = territories.iter().map(Arc::as_ref).collect();
            map.serialize_entry(state, &list)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses_in_document_order() {
        let catalog = TerritoryCatalog::embedded();
        assert_eq!(catalog.state_count(), 24);
        assert_eq!(catalog.territory_count(), 65);
        assert_eq!(catalog.states().next().map(|(state, _)| state), Some("TX"));
        assert!(catalog.territories("AL").is_empty());
        let phoenix = catalog.territory("AZ_PHOENIX").expect("phoenix is listed");
        assert_eq!(phoenix.state, "AZ");
        assert_eq!(phoenix.kind, Classification::Green);
        assert_eq!(phoenix.counties, vec!["Maricopa".to_string()]);
    }

    #[test]
    fn classification_parses_loosely() {
        let json = r#"{"XX": [
            {"key": "A", "label": "A", "type": "franchise", "counties": []},
            {"key": "B", "label": "B", "type": "mystery", "counties": []}
        ]}"#;
        let catalog = TerritoryCatalog::from_json(json).expect("catalog parses");
        let kinds: Vec<_> = catalog.territories("xx").iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Classification::Franchise, Classification::Corporate]);
        assert_eq!(catalog.territories("XX")[0].url, "");
    }

    #[test]
    fn serializes_back_to_record_shape() {
        let json = r#"{"AZ":[{"key":"AZ_PHOENIX","label":"Phoenix","type":"GREEN","counties":["Maricopa"],"url":"https://example.com/phx"}]}"#;
        let catalog = TerritoryCatalog::from_json(json).expect("catalog parses");
        let out = serde_json::to_string(&catalog).expect("catalog serializes");
        assert_eq!(out, json);
    }

    #[test]
    fn owning_state_is_normalized_to_the_postal_code() {
        let json = r#"{"tx": [{"key": "TX_AUSTIN", "label": "Austin", "type": "GREEN", "counties": ["Travis"]}]}"#;
        let catalog = TerritoryCatalog::from_json(json).expect("catalog parses");
        assert_eq!(catalog.states().next().map(|(state, _)| state), Some("TX"));
        let austin = catalog.territory("TX_AUSTIN").expect("austin is listed");
        assert_eq!(austin.state, "TX");
    }

    #[test]
    fn rejects_malformed_records() {
        assert!(TerritoryCatalog::from_json(r#"{"TX": [{"label": "no key"}]}"#).is_err());
        assert!(TerritoryCatalog::from_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn classification_colors_are_fixed() {
        assert_eq!(Classification::Corporate.color(), "#F2AF58");
        assert_eq!(Classification::Franchise.color(), "#9B2E2E");
        assert_eq!(Classification::Green.color(), "#96CB91");
    }
}
