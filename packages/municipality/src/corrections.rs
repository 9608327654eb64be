//! Known-bad budget figures and their corrected values.
//!
//! A handful of published records carry budget totals that are wrong by a
//! wide margin. The corrected totals below replace whatever the source
//! says. Add entries here; the resolver needs no change.

use muni_budget_municipality_models::MunicipalityType;

/// A corrected total budget for one municipality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetCorrection {
    /// Full official name; an exact match applies the correction
    /// regardless of the recorded type.
    pub full_name: &'static str,
    /// Distinctive part of the name; matches city municipalities only.
    pub name_fragment: &'static str,
    /// Corrected total budget in baht.
    pub budget: f64,
}

pub const BUDGET_CORRECTIONS: &[BudgetCorrection] = &[
    // Chiang Mai City Municipality
    BudgetCorrection {
        full_name: "เทศบาลนครเชียงใหม่",
        name_fragment: "เชียงใหม่",
        budget: 1_755_970_000.0,
    },
    // Laem Chabang City Municipality
    BudgetCorrection {
        full_name: "เทศบาลนครแหลมฉบัง",
        name_fragment: "แหลมฉบัง",
        budget: 1_423_500_000.0,
    },
];

/// Lowercases and removes all whitespace.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Finds the correction that applies to a municipality, if any.
#[must_use]
pub fn correction_for(
    name: &str,
    municipality_type: MunicipalityType,
) -> Option<&'static BudgetCorrection> {
    let normalized = normalize_name(name);
    BUDGET_CORRECTIONS.iter().find(|c| {
        normalized == normalize_name(c.full_name)
            || (municipality_type == MunicipalityType::City
                && normalized.contains(&normalize_name(c.name_fragment)))
    })
}
