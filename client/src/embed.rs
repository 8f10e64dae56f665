use velox_shared::{MapConfig, ProjectionKind};

pub(crate) const DEFAULT_STATES_URL: &str = "/maps/us-states.topo.json";
pub(crate) const DEFAULT_COUNTIES_URL: &str = "/maps/us-counties.topo.json";

/// Host-provided settings read from the mount element's `data-*` attributes,
/// falling back to same-named query parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EmbedConfig {
    pub states_url: String,
    pub counties_url: String,
    /// `None` uses the catalog compiled into the bundle.
    pub catalog_url: Option<String>,
    pub overview: MapConfig,
    pub detail: MapConfig,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            states_url: DEFAULT_STATES_URL.to_string(),
            counties_url: DEFAULT_COUNTIES_URL.to_string(),
            catalog_url: None,
            overview: MapConfig::overview(),
            detail: MapConfig::detail(),
        }
    }
}

impl EmbedConfig {
    /// Resolve every setting through `lookup`, which answers for a bare key
    /// such as `states-url`.
    pub(crate) fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();
        if let Some(url) = get("states-url") {
            config.states_url = url;
        }
        if let Some(url) = get("counties-url") {
            config.counties_url = url;
        }
        config.catalog_url = get("catalog-url");

        if let Some(kind) = get("projection").as_deref().and_then(parse_projection) {
            config.overview = config.overview.with_projection(kind);
        }
        if let Some(show) = get("borders").as_deref().and_then(parse_flag) {
            config.overview = config.overview.with_borders(show);
            config.detail = config.detail.with_borders(show);
        }
        if let Some(states) = get("exclude") {
            let states: Vec<String> = states
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_ascii_uppercase)
                .collect();
            config.overview = config.overview.with_fit_exclusions(states);
        }
        config
    }

    /// Read the configuration for a widget mounted on `element`.
    pub(crate) fn from_page(element: Option<&web_sys::Element>) -> Self {
        let query = web_sys::window()
            .and_then(|window| window.location().search().ok())
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok());
        Self::resolve(|key| {
            element
                .and_then(|el| el.get_attribute(&format!("data-{key}")))
                .or_else(|| query.as_ref().and_then(|params| params.get(key)))
        })
    }
}

fn parse_projection(value: &str) -> Option<ProjectionKind> {
    match value.to_ascii_lowercase().replace('-', "_").as_str() {
        "albers_usa" | "albers" => Some(ProjectionKind::AlbersUsa),
        "mercator" => Some(ProjectionKind::Mercator),
        _ => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
