//! Record listing and lookup over a decoded feature set.

use muni_budget_municipality_models::MunicipalityRecord;
use muni_budget_topology::BoundaryFeature;

use crate::{fields, resolve::resolve};

/// Resolves every feature that carries a name, in feature order.
#[must_use]
pub fn all_records(features: &[BoundaryFeature]) -> Vec<MunicipalityRecord> {
    features
        .iter()
        .filter(|f| fields::NAME.lookup(&f.properties).is_some())
        .map(|f| resolve(&f.properties))
        .collect()
}

/// Case-insensitive substring search over name, province, and district.
///
/// A blank query matches nothing.
#[must_use]
pub fn search<'a>(records: &'a [MunicipalityRecord], query: &str) -> Vec<&'a MunicipalityRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| {
            [&r.name, &r.province, &r.district]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[must_use]
pub fn find_by_id<'a>(records: &'a [MunicipalityRecord], id: &str) -> Option<&'a MunicipalityRecord> {
    records.iter().find(|r| r.id == id)
}

/// Finds the boundary feature a record was resolved from, matching on the
/// source identifier first and the name second.
#[must_use]
pub fn feature_for<'a>(
    features: &'a [BoundaryFeature],
    record: &MunicipalityRecord,
) -> Option<&'a BoundaryFeature> {
    features
        .iter()
        .find(|f| fields::IDENTIFIER.lookup(&f.properties).as_deref() == Some(record.id.as_str()))
        .or_else(|| {
            features
                .iter()
                .find(|f| fields::NAME.lookup(&f.properties).as_deref() == Some(record.name.as_str()))
        })
}
