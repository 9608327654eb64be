#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Budget allocation simulator.
//!
//! Keeps a user's percentage split across the fixed spending categories
//! for one municipality, and sends finished allocations to the record sink.

pub mod catalog;
pub mod simulator;
pub mod sink;

use thiserror::Error;

pub use catalog::{CategoryDefinition, default_catalog};
pub use simulator::{AllocationSimulator, StartingPoint};
pub use sink::RecordSinkClient;

/// Errors from editing an allocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// No category with this id exists in the catalog.
    #[error("Unknown allocation category: {0}")]
    UnknownCategory(String),
}

/// Errors from submitting an allocation.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("Record sink rejected submission ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the sink's error body, or the raw body.
        message: String,
    },

    /// The success body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
