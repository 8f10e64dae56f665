//! Resolve boundary features to canonical identifiers.
//!
//! Boundary files from different sources name the same attribute in different
//! ways, so every accessor probes a fixed list of property keys in order.

use crate::feature::GeoFeature;

/// Two-digit state FIPS code to USPS postal abbreviation (50 states + DC).
pub const FIPS_TO_USPS: [(&str, &str); 51] = [
    ("01", "AL"),
    ("02", "AK"),
    ("04", "AZ"),
    ("05", "AR"),
    ("06", "CA"),
    ("08", "CO"),
    ("09", "CT"),
    ("10", "DE"),
    ("11", "DC"),
    ("12", "FL"),
    ("13", "GA"),
    ("15", "HI"),
    ("16", "ID"),
    ("17", "IL"),
    ("18", "IN"),
    ("19", "IA"),
    ("20", "KS"),
    ("21", "KY"),
    ("22", "LA"),
    ("23", "ME"),
    ("24", "MD"),
    ("25", "MA"),
    ("26", "MI"),
    ("27", "MN"),
    ("28", "MS"),
    ("29", "MO"),
    ("30", "MT"),
    ("31", "NE"),
    ("32", "NV"),
    ("33", "NH"),
    ("34", "NJ"),
    ("35", "NM"),
    ("36", "NY"),
    ("37", "NC"),
    ("38", "ND"),
    ("39", "OH"),
    ("40", "OK"),
    ("41", "OR"),
    ("42", "PA"),
    ("44", "RI"),
    ("45", "SC"),
    ("46", "SD"),
    ("47", "TN"),
    ("48", "TX"),
    ("49", "UT"),
    ("50", "VT"),
    ("51", "VA"),
    ("53", "WA"),
    ("54", "WV"),
    ("55", "WI"),
    ("56", "WY"),
];

const STATE_CODE_KEYS: &[&str] = &["STUSPS", "postal", "abbr"];
const COUNTY_ID_KEYS: &[&str] = &["GEOID", "geoid"];
const COUNTY_STATE_KEYS: &[&str] = &["STATEFP", "statefp", "STATE", "state", "STATE_FIPS", "state_fips"];
const COUNTY_NAME_KEYS: &[&str] = &["NAME", "name", "NAMELSAD", "county", "COUNTY"];

pub fn usps_for_fips(fips: &str) -> Option<&'static str> {
    let padded = pad_fips(fips);
    FIPS_TO_USPS
        .iter()
        .find(|(code, _)| *code == padded)
        .map(|(_, usps)| *usps)
}

pub fn fips_for_usps(usps: &str) -> Option<&'static str> {
    FIPS_TO_USPS
        .iter()
        .find(|(_, code)| code.eq_ignore_ascii_case(usps))
        .map(|(fips, _)| *fips)
}

/// Left-pad a numeric code to two digits.
pub fn pad_fips(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() >= 2 {
        raw.to_string()
    } else {
        format!("{raw:0>2}")
    }
}

/// Postal code of a state feature.
///
/// An explicit postal property is returned verbatim. Otherwise `STATEFP` or the
/// feature id is padded and looked up; codes outside the table come back padded.
pub fn state_code(feature: &GeoFeature) -> String {
    if let Some(code) = feature.property_text(STATE_CODE_KEYS) {
        return code;
    }
    let raw = feature
        .property_text(&["STATEFP"])
        .or_else(|| feature.id.clone())
        .unwrap_or_default();
    let padded = pad_fips(&raw);
    usps_for_fips(&padded)
        .map(str::to_string)
        .unwrap_or(padded)
}

pub fn county_id(feature: &GeoFeature) -> Option<String> {
    feature
        .property_text(COUNTY_ID_KEYS)
        .or_else(|| feature.id.clone())
        .filter(|id| !id.is_empty())
}

/// Two-digit state FIPS code of a county feature.
pub fn county_state_fips(feature: &GeoFeature) -> Option<String> {
    if let Some(raw) = feature.property_text(COUNTY_STATE_KEYS) {
        return Some(pad_fips(&raw));
    }
    let id = county_id(feature)?;
    id.get(..2).map(str::to_string)
}

/// Postal code of the state a county belongs to.
pub fn county_state_code(feature: &GeoFeature) -> Option<&'static str> {
    county_state_fips(feature).and_then(|fips| usps_for_fips(&fips))
}

pub fn county_name(feature: &GeoFeature) -> Option<String> {
    feature.property_text(COUNTY_NAME_KEYS)
}

/// Strip one trailing " County" suffix (any case) and surrounding whitespace.
pub fn clean_county_name(name: &str) -> String {
    const SUFFIX: &str = " county";
    let cut = name.len().checked_sub(SUFFIX.len()).filter(|&at| {
        name.is_char_boundary(at) && name[at..].eq_ignore_ascii_case(SUFFIX)
    });
    match cut {
        Some(at) => name[..at].trim().to_string(),
        None => name.trim().to_string(),
    }
}

/// Key used to match a county name against catalog entries.
pub fn normalize_county_name(name: &str) -> String {
    clean_county_name(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn feature(id: Option<&str>, properties: Value) -> GeoFeature {
        GeoFeature {
            id: id.map(str::to_string),
            properties: properties.as_object().cloned().unwrap_or_default(),
            geometry: None,
        }
    }

    #[test]
    fn fips_table_covers_fifty_states_and_dc() {
        assert_eq!(FIPS_TO_USPS.len(), 51);
        assert_eq!(usps_for_fips("48"), Some("TX"));
        assert_eq!(usps_for_fips("6"), Some("CA"));
        assert_eq!(usps_for_fips("72"), None);
        assert_eq!(fips_for_usps("dc"), Some("11"));
    }

    #[test]
    fn explicit_postal_code_is_returned_verbatim() {
        let f = feature(Some("48"), json!({"STUSPS": "Tx"}));
        assert_eq!(state_code(&f), "Tx");
        let f = feature(None, json!({"postal": "ZZ"}));
        assert_eq!(state_code(&f), "ZZ");
    }

    #[test]
    fn numeric_id_is_padded_and_looked_up() {
        assert_eq!(state_code(&feature(Some("4"), json!({}))), "AZ");
        assert_eq!(state_code(&feature(None, json!({"STATEFP": "48"}))), "TX");
    }

    #[test]
    fn unknown_fips_falls_back_to_padded_code() {
        assert_eq!(state_code(&feature(Some("7"), json!({}))), "07");
        assert_eq!(state_code(&feature(Some("72"), json!({}))), "72");
    }

    #[test]
    fn county_state_prefers_properties_then_geoid_prefix() {
        let f = feature(Some("04013"), json!({"STATE": 4}));
        assert_eq!(county_state_fips(&f).as_deref(), Some("04"));
        let f = feature(Some("48453"), json!({}));
        assert_eq!(county_state_fips(&f).as_deref(), Some("48"));
        assert_eq!(county_state_code(&f), Some("TX"));
        let f = feature(None, json!({"GEOID": "06037"}));
        assert_eq!(county_id(&f).as_deref(), Some("06037"));
        assert_eq!(county_state_fips(&feature(Some("4"), json!({}))), None);
    }

    #[test]
    fn county_name_probes_known_keys() {
        let f = feature(None, json!({"NAMELSAD": "Travis County"}));
        assert_eq!(county_name(&f).as_deref(), Some("Travis County"));
        assert_eq!(county_name(&feature(None, json!({}))), None);
    }

    #[test]
    fn clean_county_name_strips_suffix_and_whitespace() {
        assert_eq!(clean_county_name("  Maricopa County"), "Maricopa");
        assert_eq!(clean_county_name("Travis COUNTY"), "Travis");
        assert_eq!(clean_county_name("County"), "County");
        assert_eq!(clean_county_name("Miami-Dade"), "Miami-Dade");
        assert_eq!(clean_county_name("Dona Ana County "), "Dona Ana County");
        assert_eq!(normalize_county_name("St. Johns County"), "st. johns");
    }
}
