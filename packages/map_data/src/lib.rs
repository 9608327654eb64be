#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Process-wide map data: the decoded boundary features, their resolved
//! municipality records, and a spatial index over them.
//!
//! [`MapDataLoader`] fetches and decodes the topology document once and
//! hands the same [`MapData`] to every caller until it is invalidated.

pub mod fetch;
pub mod loader;

use std::path::PathBuf;

use geojson::FeatureCollection;
use muni_budget_municipality::{all_records, fields, find_by_id, resolve, search};
use muni_budget_municipality_models::MunicipalityRecord;
use muni_budget_spatial::BoundaryIndex;
use muni_budget_topology::{
    BoundaryFeature, PropertyBag, TopologyDocument, TopologyError, decode, export,
};
use serde_json::Value;
use thiserror::Error;

pub use fetch::{FileFetcher, HttpFetcher, TopologyFetcher, TopologySource};
pub use loader::{LoadStatus, MapDataLoader};

/// Errors that make the map data unavailable.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The topology document could not be downloaded.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The topology document could not be read from disk.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a usable topology.
    #[error(transparent)]
    Format(#[from] TopologyError),
}

/// Decoded and resolved map data. Immutable once built.
pub struct MapData {
    /// Boundary features in source order.
    pub features: Vec<BoundaryFeature>,
    /// Records for every named feature, in source order.
    pub records: Vec<MunicipalityRecord>,
    /// Records for features without a name. Reachable by id only.
    unnamed: Vec<MunicipalityRecord>,
    index: BoundaryIndex,
    enriched: FeatureCollection,
}

impl std::fmt::Debug for MapData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapData")
            .field("features", &self.features.len())
            .field("records", &self.records.len())
            .field("unnamed", &self.unnamed.len())
            .field("indexed", &self.index.len())
            .finish()
    }
}

impl MapData {
    /// Parses and decodes a topology document.
    ///
    /// # Errors
    ///
    /// * If the bytes are not a topology document
    /// * If the document has the wrong kind or no geometry collections
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let document = TopologyDocument::from_slice(bytes)?;
        let features = decode(&document)?;
        Ok(Self::from_features(features))
    }

    #[must_use]
    pub fn from_features(features: Vec<BoundaryFeature>) -> Self {
        let records = all_records(&features);
        let unnamed = features
            .iter()
            .filter(|f| fields::NAME.lookup(&f.properties).is_none())
            .map(|f| resolve(&f.properties))
            .collect();
        let index = BoundaryIndex::build(&features);
        let enriched = enriched_collection(&features);
        log::info!(
            "Map data ready: {} features, {} named municipalities",
            features.len(),
            records.len()
        );
        Self {
            features,
            records,
            unnamed,
            index,
            enriched,
        }
    }

    /// Record of the municipality containing a point.
    #[must_use]
    pub fn locate(&self, lat: f64, lon: f64) -> Option<MunicipalityRecord> {
        self.index.locate(lat, lon, &self.features)
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&MunicipalityRecord> {
        search(&self.records, query)
    }

    /// Record with the given id. Unnamed features are included, so any
    /// id returned by [`Self::locate`] resolves here too.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&MunicipalityRecord> {
        find_by_id(&self.records, id).or_else(|| find_by_id(&self.unnamed, id))
    }

    /// Features with their resolved record fields merged into the
    /// properties. Built once with the map data.
    #[must_use]
    pub const fn enriched_geojson(&self) -> &FeatureCollection {
        &self.enriched
    }

    /// Exports all features as `GeoJSON`. With `enrich`, each feature's
    /// resolved record fields are merged into its properties.
    #[must_use]
    pub fn to_geojson(&self, enrich: bool) -> FeatureCollection {
        if enrich {
            self.enriched.clone()
        } else {
            export::to_feature_collection(&self.features)
        }
    }
}

fn enriched_collection(features: &[BoundaryFeature]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features
            .iter()
            .map(|f| {
                let extra = record_properties(&resolve(&f.properties));
                export::to_geojson_feature(f, Some(&extra))
            })
            .collect(),
        foreign_members: None,
    }
}

/// Record fields merged into exported feature properties.
#[must_use]
pub fn record_properties(record: &MunicipalityRecord) -> PropertyBag {
    let mut properties = PropertyBag::new();
    properties.insert("id".into(), Value::from(record.id.clone()));
    properties.insert("budget".into(), Value::from(record.budget));
    properties.insert("province".into(), Value::from(record.province.clone()));
    properties.insert("district".into(), Value::from(record.district.clone()));
    properties.insert("type".into(), Value::from(record.type_label.clone()));
    if let Some(population) = record.population {
        properties.insert("population".into(), Value::from(population));
    }
    if let Some(area) = record.area {
        properties.insert("area".into(), Value::from(area));
    }
    properties
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use serde_json::json;

    /// Two quantized squares around Bangkok (one named, one not) and a null
    /// geometry, in spherical Mercator meters.
    pub fn topology_json() -> serde_json::Value {
        json!({
            "type": "Topology",
            "transform": { "scale": [100.0, 100.0], "translate": [11_100_000.0, 1_500_000.0] },
            "objects": {
                "municipalities": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {
                            "type": "Polygon",
                            "arcs": [[0]],
                            "properties": {
                                "muni_code": "1001",
                                "name": "เทศบาลนครทดสอบ",
                                "cwt_name": "กรุงเทพมหานคร",
                                "type": "เทศบาลนคร",
                                "1- clean-extracted_46_to_235_total": "2,000",
                                "1- clean-extracted_46_to_235_poppu": "50000"
                            }
                        },
                        {
                            "type": "Polygon",
                            "arcs": [[1]],
                            "properties": { "cwt_name": "นนทบุรี" }
                        },
                        { "type": null, "properties": { "name": "ไม่มีรูปร่าง" } }
                    ]
                }
            },
            "arcs": [
                [[0, 0], [1000, 0], [0, 1000], [-1000, 0], [0, -1000]],
                [[2000, 0], [1000, 0], [0, 1000], [-1000, 0], [0, -1000]]
            ]
        })
    }

    pub fn topology_bytes() -> Vec<u8> {
        serde_json::to_vec(&topology_json()).unwrap()
    }
}
