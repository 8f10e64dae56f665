use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::feature::GeoFeature;

/// A TopoJSON document. Only the parts needed to rebuild polygon features are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    /// Named geometry objects in document order.
    #[serde(default)]
    pub objects: Map<String, Value>,
}

/// Quantization transform applied to delta-encoded arc positions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
struct TopoGeometry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    geometries: Vec<TopoGeometry>,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Name of the object whose name contains `hint` (ASCII case-insensitive),
    /// falling back to the first object in the document.
    pub fn select_object(&self, hint: &str) -> Option<&str> {
        let hint = hint.to_ascii_lowercase();
        self.object_names()
            .find(|name| name.to_ascii_lowercase().contains(&hint))
            .or_else(|| self.object_names().next())
    }

    /// Convert one named object into a flat list of features.
    ///
    /// A `GeometryCollection` yields one feature per member; any other object
    /// yields a single feature. Geometry that is not polygonal is kept as a
    /// feature without geometry so its identity can still be inspected.
    pub fn features(&self, object_name: &str) -> Result<Vec<GeoFeature>, serde_json::Error> {
        let Some(object) = self.objects.get(object_name) else {
            return Ok(Vec::new());
        };
        let geometry = TopoGeometry::deserialize(object)?;
        let arcs = self.decode_arcs();

        let members = if geometry.kind.as_deref() == Some("GeometryCollection") {
            geometry.geometries
        } else {
            vec![geometry]
        };

        Ok(members
            .into_iter()
            .map(|member| {
                let mut polygons = Vec::new();
                collect_polygons(&member, &arcs, &mut polygons);
                GeoFeature {
                    id: member.id.as_ref().and_then(id_to_string),
                    properties: member.properties.unwrap_or_default(),
                    geometry: (!polygons.is_empty()).then(|| MultiPolygon(polygons)),
                }
            })
            .collect())
    }

    /// Absolute coordinates for every arc, with the quantization transform applied.
    fn decode_arcs(&self) -> Vec<Vec<Coord<f64>>> {
        self.arcs
            .iter()
            .map(|arc| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .filter(|position| position.len() >= 2)
                    .map(|position| match self.transform {
                        Some(t) => {
                            x += position[0];
                            y += position[1];
                            Coord {
                                x: x * t.scale[0] + t.translate[0],
                                y: y * t.scale[1] + t.translate[1],
                            }
                        }
                        None => Coord {
                            x: position[0],
                            y: position[1],
                        },
                    })
                    .collect()
            })
            .collect()
    }
}

fn collect_polygons(
    geometry: &TopoGeometry,
    arcs: &[Vec<Coord<f64>>],
    out: &mut Vec<Polygon<f64>>,
) {
    match geometry.kind.as_deref() {
        Some("Polygon") => {
            if let Some(rings) = geometry
                .arcs
                .as_ref()
                .and_then(|value| Vec::<Vec<i64>>::deserialize(value).ok())
                && let Some(polygon) = build_polygon(&rings, arcs)
            {
                out.push(polygon);
            }
        }
        Some("MultiPolygon") => {
            if let Some(polygons) = geometry
                .arcs
                .as_ref()
                .and_then(|value| Vec::<Vec<Vec<i64>>>::deserialize(value).ok())
            {
                out.extend(
                    polygons
                        .iter()
                        .filter_map(|rings| build_polygon(rings, arcs)),
                );
            }
        }
        Some("GeometryCollection") => {
            for member in &geometry.geometries {
                collect_polygons(member, arcs, out);
            }
        }
        _ => {}
    }
}

fn build_polygon(rings: &[Vec<i64>], arcs: &[Vec<Coord<f64>>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|refs| stitch_ring(refs, arcs));
    let exterior = rings.next()?;
    if exterior.0.len() < 4 {
        return None;
    }
    let interiors = rings.filter(|ring| ring.0.len() >= 4).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Join arcs into one ring. A negative index `!i` walks arc `i` backwards, and
/// the first point of every arc after the first repeats the previous arc's last point.
fn stitch_ring(refs: &[i64], arcs: &[Vec<Coord<f64>>]) -> LineString<f64> {
    let mut points: Vec<Coord<f64>> = Vec::new();
    for &arc_ref in refs {
        let (index, reversed) = if arc_ref < 0 {
            ((!arc_ref) as usize, true)
        } else {
            (arc_ref as usize, false)
        };
        let Some(arc) = arcs.get(index) else {
            continue;
        };
        if !points.is_empty() {
            points.pop();
        }
        if reversed {
            points.extend(arc.iter().rev().copied());
        } else {
            points.extend(arc.iter().copied());
        }
    }
    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied())
        && first != last
    {
        points.push(first);
    }
    LineString(points)
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(
            n.as_i64()
                .map(|v| v.to_string())
                .or_else(|| n.as_u64().map(|v| v.to_string()))
                .unwrap_or_else(|| n.to_string()),
        ),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two unit squares sharing an edge, quantized with a 1/10 scale.
    pub(crate) const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [0.1, 0.1], "translate": [-100.0, 30.0]},
        "arcs": [
            [[10, 0], [0, 10]],
            [[10, 10], [-10, 0], [0, -10], [10, 0]],
            [[10, 0], [10, 0], [0, 10], [-10, 0]]
        ],
        "objects": {
            "land": {"type": "GeometryCollection", "geometries": []},
            "states-outline": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "48", "properties": {"name": "Texas"}, "arcs": [[0, 1]]},
                    {"type": "Polygon", "id": 4, "properties": {"name": "Arizona"}, "arcs": [[2, -1]]},
                    {"type": "Point", "id": "99", "coordinates": [0, 0]}
                ]
            }
        }
    }"#;

    #[test]
    fn selects_object_by_case_insensitive_substring() {
        let topo = Topology::from_json(TWO_SQUARES).expect("topology parses");
        assert_eq!(topo.select_object("STATES"), Some("states-outline"));
        assert_eq!(topo.select_object("count"), Some("land"));
    }

    #[test]
    fn empty_document_has_no_selectable_object() {
        let topo = Topology::from_json(r#"{"type":"Topology","arcs":[],"objects":{}}"#)
            .expect("topology parses");
        assert_eq!(topo.select_object("states"), None);
    }

    #[test]
    fn decodes_quantized_arcs_into_closed_rings() {
        let topo = Topology::from_json(TWO_SQUARES).expect("topology parses");
        let features = topo.features("states-outline").expect("features decode");
        assert_eq!(features.len(), 3);

        let texas = &features[0];
        assert_eq!(texas.id.as_deref(), Some("48"));
        let geometry = texas.geometry.as_ref().expect("texas has geometry");
        let ring = geometry.0[0].exterior();
        assert_eq!(ring.0.first(), ring.0.last());
        assert_eq!(ring.0.len(), 5);
        let first = ring.0[0];
        assert!((first.x - -99.0).abs() < 1e-9);
        assert!((first.y - 30.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_arc_reference_walks_backwards() {
        let topo = Topology::from_json(TWO_SQUARES).expect("topology parses");
        let features = topo.features("states-outline").expect("features decode");
        let arizona = &features[1];
        assert_eq!(arizona.id.as_deref(), Some("4"));
        let ring = arizona.geometry.as_ref().expect("geometry").0[0].exterior();
        // arc 2 ends at (-99, 31); reversed arc 0 then returns to (-99, 30).
        let last = ring.0[ring.0.len() - 1];
        assert!((last.x - -99.0).abs() < 1e-9);
        assert!((last.y - 30.0).abs() < 1e-9);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn non_polygon_members_keep_identity_without_geometry() {
        let topo = Topology::from_json(TWO_SQUARES).expect("topology parses");
        let features = topo.features("states-outline").expect("features decode");
        assert_eq!(features[2].id.as_deref(), Some("99"));
        assert!(features[2].geometry.is_none());
    }

    #[test]
    fn untransformed_arcs_are_used_verbatim() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 0.5]]],
            "objects": {"x": {"type": "Polygon", "arcs": [[0]]}}
        }"#;
        let topo = Topology::from_json(json).expect("topology parses");
        let features = topo.features("x").expect("features decode");
        assert_eq!(features.len(), 1);
        let ring = features[0].geometry.as_ref().expect("geometry").0[0].exterior();
        assert_eq!(ring.0[1], Coord { x: 1.5, y: 0.5 });
    }
}
