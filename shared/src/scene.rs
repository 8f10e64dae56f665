//! Drawable scene for the overview and detail maps.
//!
//! A [`MapLayout`] holds the projected regions of one view and is rebuilt only
//! when the features, the selected state or the viewport change. A [`Scene`]
//! is cheap to rebuild from a layout on every interaction.

use std::collections::HashMap;
use std::sync::Arc;

use geo::unary_union;
use serde::{Deserialize, Serialize};

use crate::catalog::Territory;
use crate::colors;
use crate::feature::GeoFeature;
use crate::hit::HitGrid;
use crate::identity;
use crate::index::TerritoryIndex;
use crate::projection::{ProjectedRegion, ProjectionKind, Projector, shape_to_path};
use crate::view_model::{Hit, Tooltip, ViewState};

const HOVERED_OPACITY: f64 = 1.0;
const RESTING_OPACITY: f64 = 0.9;
const OUTLINE_OUTER_WIDTH: f64 = 6.0;
const OUTLINE_INNER_WIDTH: f64 = 2.5;

/// Rendering options for one map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
    pub projection: ProjectionKind,
    pub show_borders: bool,
    pub border_width: f64,
    pub label_font_size: f64,
    /// States left out of the overview fit.
    pub fit_exclusions: Vec<String>,
    /// Also leave excluded states (and their counties) out of the drawing.
    pub hide_excluded: bool,
    /// Fraction of the viewport left empty around the detail view.
    pub detail_margin: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::overview()
    }
}

impl MapConfig {
    /// National view: composite projection filling 1000×600.
    pub fn overview() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            projection: ProjectionKind::AlbersUsa,
            show_borders: true,
            border_width: 2.0,
            label_font_size: 10.0,
            fit_exclusions: vec!["AK".to_string()],
            hide_excluded: true,
            detail_margin: 0.0,
        }
    }

    /// Single-state view: Mercator at 900×650 with a 5% margin.
    pub fn detail() -> Self {
        Self {
            width: 900.0,
            height: 650.0,
            projection: ProjectionKind::Mercator,
            show_borders: true,
            border_width: 1.1,
            label_font_size: 14.0,
            fit_exclusions: Vec::new(),
            hide_excluded: false,
            detail_margin: 0.05,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_projection(mut self, projection: ProjectionKind) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_borders(mut self, show: bool) -> Self {
        self.show_borders = show;
        self
    }

    pub fn with_border_width(mut self, width: f64) -> Self {
        self.border_width = width;
        self
    }

    pub fn with_label_font_size(mut self, size: f64) -> Self {
        self.label_font_size = size;
        self
    }

    pub fn with_fit_exclusions<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fit_exclusions = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hide_excluded(mut self, hide: bool) -> Self {
        self.hide_excluded = hide;
        self
    }

    pub fn with_detail_margin(mut self, margin: f64) -> Self {
        self.detail_margin = margin;
        self
    }

    fn is_excluded(&self, state: &str) -> bool {
        self.fit_exclusions
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(state))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateRegion {
    pub code: String,
    pub interactive: bool,
    pub region: ProjectedRegion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountyRegion {
    /// County name with any " County" suffix removed.
    pub name: String,
    pub territory: Option<Arc<Territory>>,
    pub region: ProjectedRegion,
}

/// Projected regions of one view, with their classification resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapLayout {
    pub projector: Option<Projector>,
    pub states: Vec<StateRegion>,
    pub counties: Vec<CountyRegion>,
    /// Merged outline path of each territory's counties, keyed by territory key.
    pub territory_outlines: HashMap<String, Arc<str>>,
}

impl MapLayout {
    /// All states plus the counties that belong to a territory.
    pub fn overview(
        config: &MapConfig,
        states: &[GeoFeature],
        counties: &[GeoFeature],
        index: &TerritoryIndex,
    ) -> Self {
        let codes: Vec<String> = states.iter().map(identity::state_code).collect();
        let fit_set = states
            .iter()
            .zip(&codes)
            .filter(|(_, code)| !config.is_excluded(code))
            .map(|(feature, _)| feature);
        let Some(projector) =
            Projector::fit(config.projection, fit_set, config.width, config.height, 0.0)
        else {
            return Self::default();
        };

        let layer = projector.project_layer(states);
        let states = codes
            .into_iter()
            .enumerate()
            .filter(|(_, code)| !(config.hide_excluded && config.is_excluded(code)))
            .filter_map(|(idx, code)| {
                Some(StateRegion {
                    interactive: index.is_state_interactive(&code),
                    region: layer.region(idx)?.clone(),
                    code,
                })
            })
            .collect();

        let counties = counties
            .iter()
            .enumerate()
            .filter_map(|(idx, feature)| {
                let territory = index.classify(feature)?;
                if config.hide_excluded && config.is_excluded(&territory.state) {
                    return None;
                }
                let region = projector.project_region(idx, feature)?;
                Some(CountyRegion {
                    name: identity::clean_county_name(&identity::county_name(feature)?),
                    territory: Some(territory),
                    region,
                })
            })
            .collect::<Vec<_>>();

        Self {
            projector: Some(projector),
            states,
            territory_outlines: territory_outlines(&counties),
            counties,
        }
    }

    /// Every county of `state`, fitted with the configured margin.
    pub fn detail(
        config: &MapConfig,
        state: &str,
        counties: &[GeoFeature],
        index: &TerritoryIndex,
    ) -> Self {
        let in_state: Vec<(usize, &GeoFeature)> = counties
            .iter()
            .enumerate()
            .filter(|(_, feature)| {
                identity::county_state_code(feature)
                    .is_some_and(|code| code.eq_ignore_ascii_case(state))
            })
            .collect();
        let Some(projector) = Projector::fit(
            config.projection,
            in_state.iter().map(|(_, feature)| *feature),
            config.width,
            config.height,
            config.detail_margin,
        ) else {
            return Self::default();
        };

        let counties = in_state
            .into_iter()
            .filter_map(|(idx, feature)| {
                let region = projector.project_region(idx, feature)?;
                Some(CountyRegion {
                    name: identity::county_name(feature)
                        .map(|name| identity::clean_county_name(&name))
                        .unwrap_or_default(),
                    territory: index.classify(feature),
                    region,
                })
            })
            .collect::<Vec<_>>();

        Self {
            projector: Some(projector),
            states: Vec::new(),
            territory_outlines: territory_outlines(&counties),
            counties,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.counties.is_empty()
    }

    /// Hit-test grid: states on the bottom layer, territory counties above.
    pub fn hit_grid(&self) -> HitGrid<Hit> {
        let states = self.states.iter().filter_map(|state| {
            Some((
                Arc::clone(&state.region.shape),
                state.region.bounds?,
                0,
                Hit::State {
                    code: state.code.clone(),
                },
            ))
        });
        let counties = self.counties.iter().filter_map(|county| {
            Some((
                Arc::clone(&county.region.shape),
                county.region.bounds?,
                u8::from(county.territory.is_some()),
                Hit::County {
                    name: county.name.clone(),
                    territory: county.territory.clone(),
                },
            ))
        });
        HitGrid::build(states.chain(counties))
    }
}

/// Union of each territory's county shapes, so shared county edges drop out.
fn territory_outlines(counties: &[CountyRegion]) -> HashMap<String, Arc<str>> {
    let mut groups: HashMap<&str, Vec<&geo::MultiPolygon<f64>>> = HashMap::new();
    for county in counties {
        if let Some(territory) = &county.territory {
            groups
                .entry(territory.key.as_str())
                .or_default()
                .push(county.region.shape.as_ref());
        }
    }
    groups
        .into_iter()
        .filter_map(|(key, shapes)| {
            let path = shape_to_path(&unary_union(shapes));
            (!path.is_empty()).then(|| (key.to_string(), Arc::from(path)))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub path: Arc<str>,
    /// `None` draws nothing; the region is visible only through its border.
    pub color: Option<&'static str>,
    pub opacity: f64,
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub path: Arc<str>,
    pub color: &'static str,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: f64,
    pub color: &'static str,
}

/// Everything one frame draws, in z-order: fills, borders, outlines, labels, tooltip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub fills: Vec<Fill>,
    pub borders: Vec<Stroke>,
    pub outlines: Vec<Stroke>,
    pub labels: Vec<Label>,
    pub tooltip: Option<Tooltip>,
    classified: usize,
    unclassified: usize,
}

impl Scene {
    /// County regions drawn in a territory color.
    pub fn classified_count(&self) -> usize {
        self.classified
    }

    /// County regions drawn with a border only.
    pub fn unclassified_count(&self) -> usize {
        self.unclassified
    }
}

pub fn build_scene(config: &MapConfig, layout: &MapLayout, view: &ViewState) -> Scene {
    let mut scene = Scene {
        width: config.width,
        height: config.height,
        tooltip: view.tooltip.clone(),
        ..Scene::default()
    };
    let hovered_territory = view.hovered_territory.as_deref();

    for state in &layout.states {
        let color = if !state.interactive {
            colors::UNCOVERED_STATE
        } else if view.hovered_region.as_deref() == Some(state.code.as_str()) {
            colors::COVERED_STATE_HOVER
        } else {
            colors::COVERED_STATE
        };
        scene.fills.push(Fill {
            path: Arc::clone(&state.region.path),
            color: Some(color),
            opacity: 1.0,
            interactive: state.interactive,
        });
        if config.show_borders {
            scene.borders.push(Stroke {
                path: Arc::clone(&state.region.path),
                color: colors::BORDER,
                width: config.border_width,
            });
        }
    }

    for county in &layout.counties {
        let fill = match &county.territory {
            Some(territory) => {
                scene.classified += 1;
                let hovered = hovered_territory == Some(territory.key.as_str());
                Fill {
                    path: Arc::clone(&county.region.path),
                    color: Some(territory.kind.color()),
                    opacity: if hovered { HOVERED_OPACITY } else { RESTING_OPACITY },
                    interactive: true,
                }
            }
            None => {
                scene.unclassified += 1;
                Fill {
                    path: Arc::clone(&county.region.path),
                    color: None,
                    opacity: 0.0,
                    interactive: false,
                }
            }
        };
        scene.fills.push(fill);
        // Overview counties sit on a state fill that already carries the border.
        if config.show_borders && layout.states.is_empty() {
            scene.borders.push(Stroke {
                path: Arc::clone(&county.region.path),
                color: colors::BORDER,
                width: config.border_width,
            });
        }
    }

    if let Some(path) = hovered_territory.and_then(|key| layout.territory_outlines.get(key)) {
        for (color, width) in [
            (colors::TERRITORY_OUTLINE_OUTER, OUTLINE_OUTER_WIDTH),
            (colors::TERRITORY_OUTLINE, OUTLINE_INNER_WIDTH),
        ] {
            scene.outlines.push(Stroke {
                path: Arc::clone(path),
                color,
                width,
            });
        }
    }

    if layout.states.is_empty() {
        scene.labels.extend(layout.counties.iter().filter_map(|county| {
            let (x, y) = county.region.centroid?;
            (!county.name.is_empty()).then(|| Label {
                x,
                y,
                text: county.name.clone(),
                font_size: config.label_font_size,
                color: colors::LABEL,
            })
        }));
    } else {
        scene.labels.extend(layout.states.iter().filter_map(|state| {
            let (x, y) = state.region.centroid?;
            Some(Label {
                x,
                y,
                text: state.code.clone(),
                font_size: config.label_font_size,
                color: colors::LABEL,
            })
        }));
    }

    scene
}
