#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized municipality types.
//!
//! A [`MunicipalityRecord`] is the typed view of one boundary feature's
//! loosely-keyed attribute bag. Records are derived on every load and never
//! persisted.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Thai municipal administrative tier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MunicipalityType {
    /// เทศบาลนคร (Thesaban Nakhon)
    City,
    /// เทศบาลเมือง (Thesaban Mueang)
    Town,
    /// เทศบาลตำบล (Thesaban Tambon)
    Subdistrict,
}

/// Substrings (lowercased) that mark a city municipality.
const CITY_TOKENS: &[&str] = &["นคร", "nakhon", "city"];

/// Substrings (lowercased) that mark a town municipality.
const TOWN_TOKENS: &[&str] = &["เมือง", "mueang", "muang", "town"];

impl MunicipalityType {
    /// Classifies a free-text type description.
    ///
    /// Case-insensitive substring match against Thai tokens and their Latin
    /// transliterations. City tokens are checked before town tokens. Falls
    /// back to [`Self::Subdistrict`] when nothing matches.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if contains_any(&lower, CITY_TOKENS) {
            Self::City
        } else if contains_any(&lower, TOWN_TOKENS) {
            Self::Town
        } else {
            Self::Subdistrict
        }
    }

    /// Total annual budget assumed when the source has no usable figure, in
    /// baht.
    #[must_use]
    pub const fn default_budget(self) -> f64 {
        match self {
            Self::City => 1_200_000_000.0,
            Self::Town => 400_000_000.0,
            Self::Subdistrict => 80_000_000.0,
        }
    }

    /// Typical revenue split as fractions of the total budget:
    /// `(self_collected, state_allocated, subsidies)`.
    #[must_use]
    pub const fn funding_split(self) -> (f64, f64, f64) {
        match self {
            Self::City => (0.30, 0.25, 0.45),
            Self::Town => (0.20, 0.30, 0.50),
            Self::Subdistrict => (0.15, 0.30, 0.55),
        }
    }

    /// Thai label used when the source has no type text at all.
    #[must_use]
    pub const fn thai_label(self) -> &'static str {
        match self {
            Self::City => "เทศบาลนคร",
            Self::Town => "เทศบาลเมือง",
            Self::Subdistrict => "เทศบาลตำบล",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::City, Self::Town, Self::Subdistrict]
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Revenue breakdown, each component in millions of baht.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSources {
    /// Locally collected revenue (จัดเก็บเอง).
    pub self_collected: f64,
    /// Revenue allocated by the central government (รัฐจัดสรร).
    pub state_allocated: f64,
    /// Grants and subsidies (เงินอุดหนุน).
    pub subsidies: f64,
}

impl BudgetSources {
    /// Synthesizes a breakdown from the type's typical split.
    #[must_use]
    pub fn estimate(municipality_type: MunicipalityType, total_budget: f64) -> Self {
        let millions = total_budget / 1_000_000.0;
        let (own, state, grants) = municipality_type.funding_split();
        Self {
            self_collected: millions * own,
            state_allocated: millions * state,
            subsidies: millions * grants,
        }
    }

    /// Sum of all components, in millions of baht.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.self_collected + self.state_allocated + self.subsidies
    }
}

/// Normalized view of one municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityRecord {
    /// Stable identifier (source code if present, otherwise synthesized).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Administrative tier inferred from the type text.
    pub municipality_type: MunicipalityType,
    /// Type text as published (e.g. `"เทศบาลนคร"`).
    #[serde(rename = "type")]
    pub type_label: String,
    /// Province (จังหวัด).
    pub province: String,
    /// District (อำเภอ).
    pub district: String,
    /// Total annual budget in baht. Never negative.
    pub budget: f64,
    /// Registered population.
    pub population: Option<u64>,
    /// Land area in square kilometers.
    pub area: Option<f64>,
    /// Revenue breakdown in millions of baht.
    pub budget_sources: BudgetSources,
}
