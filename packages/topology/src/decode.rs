//! Arc stitching: `TopoJSON` geometry objects to absolute-coordinate shapes.
//!
//! Follows the reference `topojson-client` feature conversion: arcs are
//! delta-decoded and transformed once up front, then every geometry pulls
//! its rings from the shared arc table. Polygon rings are padded to at
//! least four points and are always closed.
//!
//! Polygonal geometries are reprojected from spherical Mercator meters to
//! WGS84 degrees after stitching. Other geometry types are left in source
//! units.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MapCoords as _, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use serde::Deserialize as _;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::document::{GeometryObject, TOPOLOGY_KIND, TopologyDocument, Transform};
use crate::reproject::reproject_coord;
use crate::{BoundaryFeature, TopologyError};

/// Why a single geometry could not be decoded. Never fatal to the document.
#[derive(Debug, Error)]
enum GeometryDecodeError {
    #[error("arc reference {0} is out of range")]
    ArcOutOfRange(i64),

    #[error("geometry references no arcs")]
    EmptyLine,

    #[error("{kind} has no `{field}` member")]
    Missing {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{kind} has a malformed `{field}` member: {source}")]
    Shape {
        kind: &'static str,
        field: &'static str,
        source: serde_json::Error,
    },

    #[error("position has fewer than two components")]
    ShortPosition,

    #[error("unsupported geometry type `{0}`")]
    Unsupported(String),
}

/// Decodes the first named object of a topology into boundary features.
///
/// Features come back in source order, one per member of the object's
/// geometry collection (or exactly one if the object is a bare geometry).
/// Members with null or undecodable geometry are still returned, with
/// `geometry` set to `None`.
///
/// # Errors
///
/// Returns [`TopologyError::Format`] if the document kind is not
/// `Topology`, if it has no named objects, if the first object is not a
/// geometry object, or if any shared arc contains a short position.
pub fn decode(doc: &TopologyDocument) -> Result<Vec<BoundaryFeature>, TopologyError> {
    if doc.kind != TOPOLOGY_KIND {
        return Err(TopologyError::Format {
            message: format!(
                "expected document type `{TOPOLOGY_KIND}`, found `{}`",
                doc.kind
            ),
        });
    }

    let (name, raw) = doc.first_object()?;
    let object = GeometryObject::deserialize(raw).map_err(|e| TopologyError::Format {
        message: format!("object `{name}` is not a geometry object: {e}"),
    })?;

    let arcs = ArcTable::build(doc)?;

    let members: Vec<&Value> = if object.kind.as_deref() == Some("GeometryCollection") {
        object.geometries.iter().flatten().collect()
    } else {
        vec![raw]
    };

    log::info!(
        "Decoding {} features from topology object `{name}` ({} arcs)",
        members.len(),
        arcs.arcs.len()
    );

    let features: Vec<BoundaryFeature> = members
        .into_iter()
        .enumerate()
        .map(|(index, member)| arcs.feature(index, member))
        .collect();

    let missing = features.iter().filter(|f| f.geometry.is_none()).count();
    if missing > 0 {
        log::warn!("{missing} of {} features have no geometry", features.len());
    }

    Ok(features)
}

/// All arcs of a document, delta-decoded and transformed to absolute
/// source coordinates.
struct ArcTable {
    arcs: Vec<Vec<Coord<f64>>>,
    transform: Option<Transform>,
}

impl ArcTable {
    fn build(doc: &TopologyDocument) -> Result<Self, TopologyError> {
        let mut arcs = Vec::with_capacity(doc.arcs.len());

        for (index, arc) in doc.arcs.iter().enumerate() {
            let mut x = 0.0;
            let mut y = 0.0;
            let mut points = Vec::with_capacity(arc.len());

            for position in arc {
                let [px, py, ..] = position.as_slice() else {
                    return Err(TopologyError::Format {
                        message: format!("arc {index} has a position with fewer than two components"),
                    });
                };

                let (ax, ay) = match &doc.transform {
                    Some(transform) => {
                        x += px;
                        y += py;
                        transform.apply(x, y)
                    }
                    None => (*px, *py),
                };
                points.push(Coord { x: ax, y: ay });
            }

            arcs.push(points);
        }

        Ok(Self {
            arcs,
            transform: doc.transform,
        })
    }

    fn feature(&self, index: usize, raw: &Value) -> BoundaryFeature {
        let object = match GeometryObject::deserialize(raw) {
            Ok(object) => object,
            Err(e) => {
                log::warn!("Feature {index}: not a geometry object ({e}); geometry dropped");
                return BoundaryFeature {
                    id: raw.get("id").cloned(),
                    geometry: None,
                    properties: raw
                        .get("properties")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                };
            }
        };

        let geometry = match self.geometry(&object) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::warn!("Feature {index}: {e}; geometry dropped");
                None
            }
        };

        BoundaryFeature {
            id: object.id,
            geometry,
            properties: object.properties.unwrap_or_default(),
        }
    }

    fn geometry(
        &self,
        object: &GeometryObject,
    ) -> Result<Option<Geometry<f64>>, GeometryDecodeError> {
        let Some(kind) = object.kind.as_deref() else {
            return Ok(None);
        };

        let geometry = match kind {
            "Point" => {
                let position: Vec<f64> = member(object.coordinates.as_ref(), "Point", "coordinates")?;
                Geometry::Point(Point::from(self.point(&position)?))
            }
            "MultiPoint" => {
                let positions: Vec<Vec<f64>> =
                    member(object.coordinates.as_ref(), "MultiPoint", "coordinates")?;
                let points = positions
                    .iter()
                    .map(|p| self.point(p).map(Point::from))
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::MultiPoint(MultiPoint(points))
            }
            "LineString" => {
                let refs: Vec<i64> = member(object.arcs.as_ref(), "LineString", "arcs")?;
                Geometry::LineString(LineString(self.line(&refs)?))
            }
            "MultiLineString" => {
                let lines: Vec<Vec<i64>> = member(object.arcs.as_ref(), "MultiLineString", "arcs")?;
                let lines = lines
                    .iter()
                    .map(|refs| self.line(refs).map(LineString))
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::MultiLineString(MultiLineString(lines))
            }
            "Polygon" => {
                let rings: Vec<Vec<i64>> = member(object.arcs.as_ref(), "Polygon", "arcs")?;
                Geometry::Polygon(self.polygon(&rings)?.map_coords(reproject_coord))
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Vec<i64>>> =
                    member(object.arcs.as_ref(), "MultiPolygon", "arcs")?;
                let polygons = polygons
                    .iter()
                    .map(|rings| self.polygon(rings))
                    .collect::<Result<Vec<_>, _>>()?;
                Geometry::MultiPolygon(MultiPolygon(polygons).map_coords(reproject_coord))
            }
            "GeometryCollection" => {
                let mut members = Vec::new();
                for child in object.geometries.iter().flatten() {
                    let child: GeometryObject =
                        member(Some(child), "GeometryCollection", "geometries")?;
                    if let Some(geometry) = self.geometry(&child)? {
                        members.push(geometry);
                    }
                }
                Geometry::GeometryCollection(GeometryCollection(members))
            }
            other => return Err(GeometryDecodeError::Unsupported(other.to_string())),
        };

        Ok(Some(geometry))
    }

    /// Quantized points are transformed but never delta-encoded.
    fn point(&self, position: &[f64]) -> Result<Coord<f64>, GeometryDecodeError> {
        let [x, y, ..] = position else {
            return Err(GeometryDecodeError::ShortPosition);
        };
        let (x, y) = self
            .transform
            .as_ref()
            .map_or((*x, *y), |t| t.apply(*x, *y));
        Ok(Coord { x, y })
    }

    /// Concatenates arcs into one line, dropping each shared endpoint.
    fn line(&self, refs: &[i64]) -> Result<Vec<Coord<f64>>, GeometryDecodeError> {
        let mut points: Vec<Coord<f64>> = Vec::new();

        for &reference in refs {
            let index = if reference < 0 { !reference } else { reference };
            let arc = usize::try_from(index)
                .ok()
                .and_then(|i| self.arcs.get(i))
                .ok_or(GeometryDecodeError::ArcOutOfRange(reference))?;

            points.pop();
            let start = points.len();
            points.extend_from_slice(arc);
            if reference < 0 {
                points[start..].reverse();
            }
        }

        let first = *points.first().ok_or(GeometryDecodeError::EmptyLine)?;
        if points.len() < 2 {
            points.push(first);
        }

        Ok(points)
    }

    fn ring(&self, refs: &[i64]) -> Result<LineString<f64>, GeometryDecodeError> {
        let mut points = self.line(refs)?;
        let first = points[0];
        while points.len() < 4 {
            points.push(first);
        }

        let mut ring = LineString(points);
        ring.close();
        Ok(ring)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Polygon<f64>, GeometryDecodeError> {
        let mut rings = rings
            .iter()
            .map(|refs| self.ring(refs))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();

        let exterior = rings.next().unwrap_or_else(|| LineString(Vec::new()));
        Ok(Polygon::new(exterior, rings.collect()))
    }
}

/// Deserializes a required geometry member into its expected nesting.
fn member<T: DeserializeOwned>(
    value: Option<&Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<T, GeometryDecodeError> {
    let value = value.ok_or(GeometryDecodeError::Missing { kind, field })?;
    T::deserialize(value).map_err(|source| GeometryDecodeError::Shape {
        kind,
        field,
        source,
    })
}
