#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-in-polygon lookup for "find my municipality".
//!
//! [`locate`] scans the decoded features in source order and resolves only
//! the first boundary that contains the point. [`BoundaryIndex`] answers the
//! same question through an R-tree over feature envelopes, for callers that
//! query the same feature set repeatedly.
//!
//! A feature whose geometry is unusable (no polygons, no bounds, non-finite
//! coordinates) raises a [`GeometryError`] that is logged and skipped; it
//! never aborts the scan.

use geo::{BoundingRect, Contains, CoordsIter, Intersects, MultiPolygon, Point, Rect};
use muni_budget_municipality::resolve;
use muni_budget_municipality_models::MunicipalityRecord;
use muni_budget_topology::BoundaryFeature;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

/// A single feature's geometry cannot take part in containment tests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("feature has no polygonal geometry")]
    NoPolygons,
    #[error("feature bounds could not be computed")]
    NoBounds,
    #[error("feature has non-finite coordinates")]
    NonFinite,
}

/// Polygons and bounding rectangle of a feature.
///
/// # Errors
///
/// * If the feature has no polygon rings
/// * If any coordinate is non-finite
/// * If the bounding rectangle cannot be computed
pub fn bounds(feature: &BoundaryFeature) -> Result<(MultiPolygon<f64>, Rect<f64>), GeometryError> {
    let polygons = feature.polygons().ok_or(GeometryError::NoPolygons)?;
    if polygons
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(GeometryError::NonFinite);
    }
    let rect = polygons.bounding_rect().ok_or(GeometryError::NoBounds)?;
    Ok((polygons, rect))
}

/// Whether a feature's polygons contain a point. Holes are excluded.
///
/// # Errors
///
/// * If the feature's geometry is unusable, see [`bounds`]
pub fn contains_point(feature: &BoundaryFeature, lat: f64, lon: f64) -> Result<bool, GeometryError> {
    let (polygons, rect) = bounds(feature)?;
    let point = Point::new(lon, lat);
    Ok(rect.intersects(&point) && polygons.contains(&point))
}

/// Returns the first feature, in source order, that contains the point.
#[must_use]
pub fn locate_feature(lat: f64, lon: f64, features: &[BoundaryFeature]) -> Option<&BoundaryFeature> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    features
        .iter()
        .enumerate()
        .find(|(position, feature)| match contains_point(feature, lat, lon) {
            Ok(hit) => hit,
            Err(GeometryError::NoPolygons) => false,
            Err(e) => {
                log::warn!("Skipping feature {position} during locate: {e}");
                false
            }
        })
        .map(|(_, feature)| feature)
}

/// Resolves the record of the first feature containing the point.
///
/// Only the matching feature's properties are resolved.
#[must_use]
pub fn locate(lat: f64, lon: f64, features: &[BoundaryFeature]) -> Option<MunicipalityRecord> {
    locate_feature(lat, lon, features).map(|f| resolve(&f.properties))
}

/// A boundary polygon stored in the R-tree with its source position.
struct BoundaryEntry {
    position: usize,
    envelope: AABB<[f64; 2]>,
    polygons: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the usable polygons of a feature set.
///
/// Lookups return the same feature as [`locate_feature`]: when boundaries
/// overlap, the one earliest in source order wins.
pub struct BoundaryIndex {
    tree: RTree<BoundaryEntry>,
    skipped: usize,
}

impl BoundaryIndex {
    /// Builds the index. Features with unusable geometry are left out.
    #[must_use]
    pub fn build(features: &[BoundaryFeature]) -> Self {
        let mut entries = Vec::with_capacity(features.len());
        let mut skipped = 0;

        for (position, feature) in features.iter().enumerate() {
            match bounds(feature) {
                Ok((polygons, rect)) => entries.push(BoundaryEntry {
                    position,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    polygons,
                }),
                Err(GeometryError::NoPolygons) => skipped += 1,
                Err(e) => {
                    log::warn!("Leaving feature {position} out of the spatial index: {e}");
                    skipped += 1;
                }
            }
        }

        log::info!(
            "Indexed {} boundaries ({skipped} without usable geometry)",
            entries.len()
        );

        Self {
            tree: RTree::bulk_load(entries),
            skipped,
        }
    }

    /// Source position of the containing feature.
    #[must_use]
    pub fn lookup(&self, lat: f64, lon: f64) -> Option<usize> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }

        let point = Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygons.contains(&point))
            .map(|entry| entry.position)
            .min()
    }

    /// Resolves the record of the containing feature.
    ///
    /// `features` must be the slice the index was built from.
    #[must_use]
    pub fn locate(
        &self,
        lat: f64,
        lon: f64,
        features: &[BoundaryFeature],
    ) -> Option<MunicipalityRecord> {
        self.lookup(lat, lon)
            .and_then(|position| features.get(position))
            .map(|f| resolve(&f.properties))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Number of features left out of the index.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}
