#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Attribute resolution for municipal boundary features.
//!
//! Boundary properties come from several merged spreadsheets and use
//! inconsistent keys, units, and formatting. [`resolve`] maps any property
//! bag to a [`MunicipalityRecord`] using the candidate-key table in
//! [`fields`], the lenient parsers in [`parsing`], and the overrides in
//! [`corrections`].
//!
//! [`MunicipalityRecord`]: muni_budget_municipality_models::MunicipalityRecord

pub mod corrections;
pub mod fields;
pub mod parsing;
pub mod resolve;
pub mod search;

pub use resolve::resolve;
pub use search::{all_records, feature_for, find_by_id, search};
