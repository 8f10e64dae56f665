use geo::MultiPolygon;
use serde_json::{Map, Value};

/// One state or county boundary decoded from a topology document.
///
/// Coordinates are longitude/latitude degrees. Features are immutable once
/// loaded and shared behind `Arc<[GeoFeature]>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: Option<MultiPolygon<f64>>,
}

impl GeoFeature {
    /// First of `keys` present as a non-empty string or a number, rendered as text.
    pub fn property_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.properties.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(properties: Value) -> GeoFeature {
        GeoFeature {
            properties: properties.as_object().cloned().unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn property_text_skips_missing_and_empty_keys() {
        let f = feature(json!({"NAME": "", "name": "Travis"}));
        assert_eq!(f.property_text(&["NAME", "name"]).as_deref(), Some("Travis"));
        assert_eq!(f.property_text(&["county"]), None);
    }

    #[test]
    fn numeric_properties_render_as_text() {
        let f = feature(json!({"STATEFP": 6}));
        assert_eq!(f.property_text(&["STATEFP"]).as_deref(), Some("6"));
    }
}
