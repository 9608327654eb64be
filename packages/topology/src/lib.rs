#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `TopoJSON` decoding for municipal boundary maps.
//!
//! Municipal boundaries are published as a quantized, arc-based `TopoJSON`
//! document in spherical Mercator meters. This crate stitches arcs back into
//! standalone polygons, reprojects polygon coordinates to WGS84 degrees, and
//! exports the result as `GeoJSON` for map rendering.

pub mod decode;
pub mod document;
pub mod export;
pub mod reproject;

use geo::{Geometry, MultiPolygon};
use serde_json::{Map, Value};
use thiserror::Error;

pub use decode::decode;
pub use document::TopologyDocument;

/// Loosely-typed attribute bag copied from the source geometry object.
///
/// Key spellings vary between records; consumers must not assume any key is
/// present or has a particular JSON type.
pub type PropertyBag = Map<String, Value>;

/// Errors that make a topology document unusable as a whole.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The document is JSON but not a usable topology.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },

    /// The document could not be parsed as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One administrative unit's decoded shape plus its raw attributes.
///
/// Created once per document load and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// Identifier carried on the source geometry object, if any.
    pub id: Option<Value>,
    /// Decoded geometry. `None` for null geometries and for geometries that
    /// failed to decode.
    pub geometry: Option<Geometry<f64>>,
    /// Raw attribute bag.
    pub properties: PropertyBag,
}

impl BoundaryFeature {
    /// Returns the polygonal part of the geometry, if it has one.
    ///
    /// Non-polygonal members of a geometry collection are ignored.
    #[must_use]
    pub fn polygons(&self) -> Option<MultiPolygon<f64>> {
        fn collect(geometry: &Geometry<f64>, out: &mut Vec<geo::Polygon<f64>>) {
            match geometry {
                Geometry::Polygon(p) => out.push(p.clone()),
                Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
                Geometry::GeometryCollection(gc) => {
                    for g in &gc.0 {
                        collect(g, out);
                    }
                }
                _ => {}
            }
        }

        let mut polygons = Vec::new();
        collect(self.geometry.as_ref()?, &mut polygons);
        if polygons.is_empty() {
            None
        } else {
            Some(MultiPolygon(polygons))
        }
    }

    /// Returns a property as a non-empty trimmed string.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
