//! Spherical to screen projections and SVG path generation.
//!
//! All projections are expressed as a unit projection (scale 1, no
//! translation, y pointing down) followed by a uniform scale and a
//! translation chosen by fitting a feature collection into a viewport.

use std::f64::consts::{FRAC_PI_4, PI, TAU};
use std::fmt::Write;
use std::sync::{Arc, LazyLock};

use geo::{BoundingRect, Centroid, Coord, LineString, MultiPolygon, Polygon, Rect};

use crate::feature::GeoFeature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Composite conic equal-area projection with Alaska and Hawaii insets.
    #[default]
    AlbersUsa,
    Mercator,
}

/// Lambert conic equal-area with the standard parallels and center of one
/// part of the composite projection.
#[derive(Debug, Clone, Copy)]
struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    rotate: f64,
    center: (f64, f64),
}

impl ConicEqualArea {
    fn new(parallels: (f64, f64), rotate_deg: f64, center_deg: (f64, f64)) -> Self {
        let sy0 = parallels.0.to_radians().sin();
        let n = (sy0 + parallels.1.to_radians().sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;
        let mut conic = Self {
            n,
            c,
            r0,
            rotate: rotate_deg.to_radians(),
            center: (0.0, 0.0),
        };
        conic.center = conic.raw(center_deg.0.to_radians(), center_deg.1.to_radians());
        conic
    }

    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let a = lambda * self.n;
        (r * a.sin(), self.r0 - r * a.cos())
    }

    /// Unit-scale screen position relative to the projection center.
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lambda = wrap_longitude(lon.to_radians() + self.rotate);
        let (x, y) = self.raw(lambda, lat.to_radians());
        (x - self.center.0, -(y - self.center.1))
    }
}

fn wrap_longitude(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - TAU
    } else if lambda < -PI {
        lambda + TAU
    } else {
        lambda
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inset {
    Lower48,
    Alaska,
    Hawaii,
}

impl Inset {
    fn for_point(lon: f64, lat: f64) -> Self {
        if lat >= 50.0 && (lon <= -129.0 || lon >= 170.0) {
            Inset::Alaska
        } else if (18.0..=23.0).contains(&lat) && (-161.0..=-154.0).contains(&lon) {
            Inset::Hawaii
        } else {
            Inset::Lower48
        }
    }
}

struct AlbersUsa {
    lower48: ConicEqualArea,
    alaska: ConicEqualArea,
    hawaii: ConicEqualArea,
}

const ALASKA_SCALE: f64 = 0.35;
const ALASKA_OFFSET: (f64, f64) = (-0.307, 0.201);
const HAWAII_OFFSET: (f64, f64) = (-0.205, 0.212);

impl AlbersUsa {
    fn new() -> Self {
        Self {
            lower48: ConicEqualArea::new((29.5, 45.5), 96.0, (-0.6, 38.7)),
            alaska: ConicEqualArea::new((55.0, 65.0), 154.0, (-2.0, 58.5)),
            hawaii: ConicEqualArea::new((8.0, 18.0), 157.0, (-3.0, 19.9)),
        }
    }

    fn project(&self, inset: Inset, lon: f64, lat: f64) -> (f64, f64) {
        match inset {
            Inset::Lower48 => self.lower48.project(lon, lat),
            Inset::Alaska => {
                let (x, y) = self.alaska.project(lon, lat);
                (
                    x * ALASKA_SCALE + ALASKA_OFFSET.0,
                    y * ALASKA_SCALE + ALASKA_OFFSET.1,
                )
            }
            Inset::Hawaii => {
                let (x, y) = self.hawaii.project(lon, lat);
                (x + HAWAII_OFFSET.0, y + HAWAII_OFFSET.1)
            }
        }
    }
}

/// Latitude where Mercator's square world ends.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let phi = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    (lon.to_radians(), -(FRAC_PI_4 + phi / 2.0).tan().ln())
}

/// A fitted projection: unit projection, then `scale`, then `translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub kind: ProjectionKind,
    pub scale: f64,
    pub translate: (f64, f64),
}

impl Projector {
    /// Fit the features into `width × height`, shrinking by `margin` (0..1)
    /// and centering. Returns `None` when no feature has usable geometry.
    pub fn fit<'a>(
        kind: ProjectionKind,
        features: impl IntoIterator<Item = &'a GeoFeature>,
        width: f64,
        height: f64,
        margin: f64,
    ) -> Option<Self> {
        let unit = Self {
            kind,
            scale: 1.0,
            translate: (0.0, 0.0),
        };
        let mut bounds: Option<Rect<f64>> = None;
        for feature in features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let Some(rect) = unit.project_shape(geometry).bounding_rect() else {
                continue;
            };
            bounds = Some(match bounds {
                Some(b) => merge_rects(b, rect),
                None => rect,
            });
        }

        let bounds = bounds?;
        let (dx, dy) = (bounds.width(), bounds.height());
        if !(dx > 0.0 && dy > 0.0) || !(width > 0.0 && height > 0.0) {
            return None;
        }
        let margin = margin.clamp(0.0, 0.99);
        let k = (1.0 - margin) * (width / dx).min(height / dy);
        let tx = (width - k * (bounds.min().x + bounds.max().x)) / 2.0;
        let ty = (height - k * (bounds.min().y + bounds.max().y)) / 2.0;
        Some(Self {
            kind,
            scale: k,
            translate: (tx, ty),
        })
    }

    /// Composite projection fitted so the states fill the viewport exactly.
    pub fn fit_overview<'a>(
        states: impl IntoIterator<Item = &'a GeoFeature>,
        width: f64,
        height: f64,
    ) -> Option<Self> {
        Self::fit(ProjectionKind::AlbersUsa, states, width, height, 0.0)
    }

    /// Mercator fitted to one state's counties with a fractional margin.
    pub fn fit_detail<'a>(
        counties: impl IntoIterator<Item = &'a GeoFeature>,
        width: f64,
        height: f64,
        margin: f64,
    ) -> Option<Self> {
        Self::fit(ProjectionKind::Mercator, counties, width, height, margin)
    }

    /// Project a lon/lat point. The composite projection picks its inset from
    /// the point itself.
    pub fn project_point(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.project_in(Inset::for_point(lon, lat), lon, lat)
    }

    fn project_in(&self, inset: Inset, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = match self.kind {
            ProjectionKind::AlbersUsa => ALBERS_USA.project(inset, lon, lat),
            ProjectionKind::Mercator => mercator(lon, lat),
        };
        (
            self.translate.0 + self.scale * x,
            self.translate.1 + self.scale * y,
        )
    }

    /// Project every polygon, choosing one inset per polygon from its first vertex.
    pub fn project_shape(&self, shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon(
            shape
                .0
                .iter()
                .map(|polygon| {
                    let inset = polygon
                        .exterior()
                        .0
                        .first()
                        .map_or(Inset::Lower48, |c| Inset::for_point(c.x, c.y));
                    let ring = |ring: &LineString<f64>| -> LineString<f64> {
                        ring.0
                            .iter()
                            .map(|c| {
                                let (x, y) = self.project_in(inset, c.x, c.y);
                                Coord { x, y }
                            })
                            .collect()
                    };
                    Polygon::new(
                        ring(polygon.exterior()),
                        polygon.interiors().iter().map(ring).collect(),
                    )
                })
                .collect(),
        )
    }

    /// SVG path data for the feature, or `None` without usable geometry.
    pub fn path(&self, feature: &GeoFeature) -> Option<String> {
        let geometry = feature.geometry.as_ref()?;
        let path = shape_to_path(&self.project_shape(geometry));
        (!path.is_empty()).then_some(path)
    }

    /// Area-weighted centroid of the projected shape.
    pub fn centroid(&self, feature: &GeoFeature) -> Option<(f64, f64)> {
        let geometry = feature.geometry.as_ref()?;
        let point = self.project_shape(geometry).centroid()?;
        Some((point.x(), point.y())).filter(|(x, y)| x.is_finite() && y.is_finite())
    }

    /// Project one feature, keeping path, shape, centroid and bounds.
    /// `index` is recorded as the feature's position in its source slice.
    pub fn project_region(&self, index: usize, feature: &GeoFeature) -> Option<ProjectedRegion> {
        let shape = self.project_shape(feature.geometry.as_ref()?);
        let path = shape_to_path(&shape);
        if path.is_empty() {
            return None;
        }
        let centroid = shape
            .centroid()
            .map(|p| (p.x(), p.y()))
            .filter(|(x, y)| x.is_finite() && y.is_finite());
        let bounds = shape.bounding_rect();
        Some(ProjectedRegion {
            index,
            path: path.into(),
            shape: Arc::new(shape),
            centroid,
            bounds,
        })
    }

    /// Project a whole layer once. Features without geometry are skipped.
    pub fn project_layer(&self, features: &[GeoFeature]) -> ProjectedLayer {
        let regions = features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| self.project_region(index, feature))
            .collect();
        ProjectedLayer {
            projector: *self,
            regions,
        }
    }
}

static ALBERS_USA: LazyLock<AlbersUsa> = LazyLock::new(AlbersUsa::new);

fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// `M x,y L x,y ... Z` for every ring, exteriors followed by their holes.
pub(crate) fn shape_to_path(shape: &MultiPolygon<f64>) -> String {
    let mut out = String::new();
    for polygon in &shape.0 {
        ring_to_path(polygon.exterior(), &mut out);
        for interior in polygon.interiors() {
            ring_to_path(interior, &mut out);
        }
    }
    out
}

fn ring_to_path(ring: &LineString<f64>, out: &mut String) {
    let mut coords = ring.0.iter().filter(|c| c.x.is_finite() && c.y.is_finite());
    let Some(first) = coords.next() else {
        return;
    };
    let _ = write!(out, "M{:.3},{:.3}", first.x, first.y);
    for c in coords {
        let _ = write!(out, "L{:.3},{:.3}", c.x, c.y);
    }
    out.push('Z');
}

/// One projected feature. `index` points into the source feature slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRegion {
    pub index: usize,
    pub path: Arc<str>,
    pub shape: Arc<MultiPolygon<f64>>,
    pub centroid: Option<(f64, f64)>,
    pub bounds: Option<Rect<f64>>,
}

/// Memoized projection of one feature layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLayer {
    pub projector: Projector,
    pub regions: Vec<ProjectedRegion>,
}

impl ProjectedLayer {
    pub fn region(&self, feature_index: usize) -> Option<&ProjectedRegion> {
        self.regions
            .binary_search_by_key(&feature_index, |region| region.index)
            .ok()
            .map(|at| &self.regions[at])
    }
}
