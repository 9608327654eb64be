//! `GeoJSON` export of decoded boundary features.

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection};
use serde_json::Value;

use crate::{BoundaryFeature, PropertyBag};

/// Converts one boundary feature to a `GeoJSON` feature.
///
/// Keys in `extra` are merged over the feature's own properties.
#[must_use]
pub fn to_geojson_feature(feature: &BoundaryFeature, extra: Option<&PropertyBag>) -> Feature {
    let mut properties = feature.properties.clone();
    if let Some(extra) = extra {
        for (key, value) in extra {
            properties.insert(key.clone(), value.clone());
        }
    }

    Feature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: feature.id.as_ref().and_then(feature_id),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Converts a decoded feature set to a `FeatureCollection`, preserving order.
#[must_use]
pub fn to_feature_collection(features: &[BoundaryFeature]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features
            .iter()
            .map(|f| to_geojson_feature(f, None))
            .collect(),
        foreign_members: None,
    }
}

fn feature_id(value: &Value) -> Option<Id> {
    match value {
        Value::String(s) => Some(Id::String(s.clone())),
        Value::Number(n) => Some(Id::Number(n.clone())),
        _ => None,
    }
}
