#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the municipal budget map server.
//!
//! These types are serialized to JSON for the REST API. The record sink
//! client deserializes the same types, so the contract lives in one place.

use chrono::{DateTime, Utc};
use muni_budget_allocation_models::StoredAllocation;
use serde::{Deserialize, Serialize};

/// Largest number of stored allocations returned by one listing.
pub const MAX_LISTED_ALLOCATIONS: u32 = 100;

/// Message returned when an allocation is stored.
pub const STORED_MESSAGE: &str = "Budget allocation stored successfully";

/// Message returned when map data is unavailable.
pub const MAP_DATA_UNAVAILABLE: &str = "could not load map data";

/// Response to `POST /api/budget-allocations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStoredAllocation {
    pub success: bool,
    /// Identifier assigned to the stored document.
    pub id: String,
    pub message: String,
}

/// Response to `GET /api/budget-allocations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAllocationList {
    pub success: bool,
    /// Number of entries in `data`.
    pub count: usize,
    /// Stored allocations, newest first.
    pub data: Vec<StoredAllocation>,
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// What the server was doing when it failed.
    pub message: String,
    /// Underlying error detail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.to_string()),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `"ok"` when the server answers.
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Query parameters for the allocation listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationListParams {
    /// Maximum number of results, capped at [`MAX_LISTED_ALLOCATIONS`].
    pub limit: Option<u32>,
}

impl AllocationListParams {
    /// Requested limit, capped.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .map_or(MAX_LISTED_ALLOCATIONS, |l| l.min(MAX_LISTED_ALLOCATIONS))
    }
}

/// Query parameters for municipality search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MunicipalitySearchParams {
    /// Free-text query over name, province, and district.
    pub q: Option<String>,
}

/// Query parameters for "find my municipality".
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocateParams {
    pub lat: f64,
    pub lon: f64,
}
