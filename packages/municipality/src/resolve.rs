//! Property bag → [`MunicipalityRecord`].

use muni_budget_municipality_models::{BudgetSources, MunicipalityRecord, MunicipalityType};
use muni_budget_topology::PropertyBag;
use sha2::{Digest, Sha256};

use crate::{corrections, fields};

/// Placeholder for missing name, province, or district.
pub const UNKNOWN: &str = "Unknown";

/// Source budgets are published in millions of baht.
const BUDGET_UNIT: f64 = 1_000_000.0;

/// Length of the hex fingerprint used in synthetic identifiers.
const FINGERPRINT_LEN: usize = 7;

/// Resolves a raw property bag into a normalized record.
///
/// Never fails: every missing or malformed attribute has a default. The
/// result depends only on `properties`, so resolving the same bag twice
/// yields identical records, synthetic identifiers included.
#[must_use]
pub fn resolve(properties: &PropertyBag) -> MunicipalityRecord {
    let type_text = fields::TYPE.lookup(properties);
    let municipality_type = type_text
        .as_deref()
        .map_or(MunicipalityType::Subdistrict, MunicipalityType::classify);
    let type_label =
        type_text.unwrap_or_else(|| MunicipalityType::Subdistrict.thai_label().to_string());

    let source_id = fields::IDENTIFIER.lookup(properties);
    let name = fields::NAME.lookup(properties).unwrap_or_else(|| {
        if source_id.is_some() {
            UNKNOWN.to_string()
        } else {
            format!("{UNKNOWN}-{}", fingerprint(properties))
        }
    });
    let id = source_id.unwrap_or_else(|| format!("muni-{name}-{}", fingerprint(properties)));

    let budget = resolve_budget(properties, &name, municipality_type);
    let budget_sources = resolve_budget_sources(properties, municipality_type, budget);

    MunicipalityRecord {
        id,
        province: fields::PROVINCE
            .lookup(properties)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        district: fields::DISTRICT
            .lookup(properties)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        population: fields::POPULATION.lookup(properties),
        area: fields::AREA.lookup(properties),
        name,
        municipality_type,
        type_label,
        budget,
        budget_sources,
    }
}

fn resolve_budget(properties: &PropertyBag, name: &str, municipality_type: MunicipalityType) -> f64 {
    if let Some(correction) = corrections::correction_for(name, municipality_type) {
        log::debug!("Applying budget correction for {name}: {}", correction.budget);
        return correction.budget;
    }

    match fields::BUDGET.lookup(properties) {
        Some(raw) if raw > 0.0 && (raw * BUDGET_UNIT).is_finite() => raw * BUDGET_UNIT,
        Some(raw) => {
            log::debug!(
                "Unusable {} value {raw} for {name}, using {municipality_type} default",
                fields::BUDGET.name
            );
            municipality_type.default_budget()
        }
        None => municipality_type.default_budget(),
    }
}

fn resolve_budget_sources(
    properties: &PropertyBag,
    municipality_type: MunicipalityType,
    budget: f64,
) -> BudgetSources {
    let reported = BudgetSources {
        self_collected: fields::SELF_COLLECTED.lookup(properties).unwrap_or(0.0),
        state_allocated: fields::STATE_ALLOCATED.lookup(properties).unwrap_or(0.0),
        subsidies: fields::SUBSIDIES.lookup(properties).unwrap_or(0.0),
    };

    if reported.total() > 0.0 {
        reported
    } else {
        BudgetSources::estimate(municipality_type, budget)
    }
}

/// Short stable hash of the whole property bag.
fn fingerprint(properties: &PropertyBag) -> String {
    let bytes = serde_json::to_vec(properties).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}
