//! Serde types for the `TopoJSON` topology document.
//!
//! Geometry objects are kept loosely typed: the shape of `arcs` and
//! `coordinates` depends on the geometry `type`, and a malformed geometry
//! must only knock out its own feature, not the whole document.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::TopologyError;

/// The only document `type` accepted by the decoder.
pub const TOPOLOGY_KIND: &str = "Topology";

/// A parsed `TopoJSON` document.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyDocument {
    /// Declared document kind. Must equal [`TOPOLOGY_KIND`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Named geometry objects, in source order.
    #[serde(default)]
    pub objects: Map<String, Value>,
    /// Shared arcs. Each arc is a list of positions; only the first two
    /// components of a position are used.
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    /// Quantization transform. When present, arcs are delta-encoded.
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Optional document bounding box, passed through untouched.
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
}

impl TopologyDocument {
    /// Parses a document from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Json`] if the bytes are not JSON or do not
    /// have the overall shape of a topology document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TopologyError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Returns the first named object and its name.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Format`] if the document has no objects.
    pub fn first_object(&self) -> Result<(&str, &Value), TopologyError> {
        self.objects
            .iter()
            .next()
            .map(|(name, value)| (name.as_str(), value))
            .ok_or_else(|| TopologyError::Format {
                message: "topology contains no named geometry collections".to_string(),
            })
    }
}

/// Quantization parameters: `absolute = quantized * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    /// Per-axis scale factors.
    pub scale: [f64; 2],
    /// Per-axis offsets.
    pub translate: [f64; 2],
}

impl Transform {
    /// Applies the transform to a quantized position.
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.mul_add(self.scale[0], self.translate[0]),
            y.mul_add(self.scale[1], self.translate[1]),
        )
    }
}

/// One geometry object inside a collection.
///
/// `kind` is `None` for null geometries, which still carry properties.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeometryObject {
    /// Geometry type (`Polygon`, `MultiPolygon`, ...), or `None`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Optional feature identifier.
    #[serde(default)]
    pub id: Option<Value>,
    /// Attribute bag copied onto the decoded feature.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    /// Arc references; nesting depth depends on `kind`.
    #[serde(default)]
    pub arcs: Option<Value>,
    /// Point coordinates for `Point`/`MultiPoint`.
    #[serde(default)]
    pub coordinates: Option<Value>,
    /// Members of a nested `GeometryCollection`, converted one at a time
    /// so a malformed member only loses its own geometry.
    #[serde(default)]
    pub geometries: Option<Vec<Value>>,
}
