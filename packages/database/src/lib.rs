#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Append-only storage for submitted budget allocations, backed by `SQLite`.
//!
//! Each submission is stored as its JSON document plus the fields assigned
//! on receipt (id, timestamp, requester metadata). There is no update or
//! delete path. Uses `switchy_database` for all database operations.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use moosicbox_json_utils::database::ToValue as _;
use muni_budget_allocation_models::{AllocationSubmission, RequesterInfo, StoredAllocation};
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the allocations database.
pub const DEFAULT_DB_PATH: &str = "data/budget-allocations.db";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from allocation storage operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored timestamp could not be parsed.
    #[error("Invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

// ---------------------------------------------------------------------------
// Database lifecycle
// ---------------------------------------------------------------------------

/// Opens (or creates) the allocations `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DatabaseError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DatabaseError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DatabaseError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;
    log::info!("Opened allocations database at {}", path.display());

    Ok(db)
}

/// Creates the table and index if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DatabaseError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS budget_allocations (
            id              TEXT PRIMARY KEY,
            municipality_id TEXT NOT NULL,
            over_budget     INTEGER NOT NULL,
            document        TEXT NOT NULL,
            ip_address      TEXT,
            user_agent      TEXT,
            created_at      TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| DatabaseError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_budget_allocations_created
         ON budget_allocations (created_at)",
    )
    .await
    .map_err(|e| DatabaseError::Database(e.to_string()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Stores a submission received now.
///
/// # Errors
///
/// Returns [`DatabaseError`] if serialization or the insert fails.
pub async fn insert_allocation(
    db: &dyn Database,
    submission: AllocationSubmission,
    user_info: RequesterInfo,
) -> Result<StoredAllocation, DatabaseError> {
    insert_allocation_at(db, submission, user_info, Utc::now()).await
}

/// Stores a submission with an explicit receipt timestamp and a fresh
/// UUID v4 id.
///
/// # Errors
///
/// Returns [`DatabaseError`] if serialization or the insert fails.
pub async fn insert_allocation_at(
    db: &dyn Database,
    submission: AllocationSubmission,
    user_info: RequesterInfo,
    timestamp: DateTime<Utc>,
) -> Result<StoredAllocation, DatabaseError> {
    let id = uuid::Uuid::new_v4().to_string();
    let document = serde_json::to_string(&submission)?;

    db.exec_raw_params(
        "INSERT INTO budget_allocations
            (id, municipality_id, over_budget, document, ip_address, user_agent, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            DatabaseValue::String(id.clone()),
            DatabaseValue::String(submission.municipality_id.clone()),
            DatabaseValue::Int32(i32::from(submission.over_budget)),
            DatabaseValue::String(document),
            optional(user_info.ip_address.clone()),
            optional(user_info.user_agent.clone()),
            DatabaseValue::String(format_timestamp(timestamp)),
        ],
    )
    .await
    .map_err(|e| DatabaseError::Database(e.to_string()))?;

    log::info!(
        "Budget allocation stored with ID: {id} (municipality {})",
        submission.municipality_id
    );

    Ok(StoredAllocation {
        id,
        submission,
        timestamp,
        user_info,
    })
}

/// Lists the most recent allocations, newest first. Allocations received
/// at the same instant come back in reverse insertion order.
///
/// # Errors
///
/// Returns [`DatabaseError`] if the query fails or a stored row is corrupt.
pub async fn list_recent(db: &dyn Database, limit: u32) -> Result<Vec<StoredAllocation>, DatabaseError> {
    let rows = db
        .query_raw_params(
            "SELECT id, document, ip_address, user_agent, created_at
             FROM budget_allocations
             ORDER BY created_at DESC, rowid DESC
             LIMIT $1",
            &[DatabaseValue::Int32(i32::try_from(limit).unwrap_or(i32::MAX))],
        )
        .await
        .map_err(|e| DatabaseError::Database(e.to_string()))?;

    let mut allocations = Vec::with_capacity(rows.len());
    for row in &rows {
        let document: String = row.to_value("document").unwrap_or_default();
        let created_at: String = row.to_value("created_at").unwrap_or_default();

        allocations.push(StoredAllocation {
            id: row.to_value("id").unwrap_or_default(),
            submission: serde_json::from_str(&document)?,
            timestamp: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
            user_info: RequesterInfo {
                ip_address: row.to_value("ip_address").unwrap_or(None),
                user_agent: row.to_value("user_agent").unwrap_or(None),
            },
        });
    }

    Ok(allocations)
}

/// Returns the total number of stored allocations.
///
/// # Errors
///
/// Returns [`DatabaseError`] if the query fails.
pub async fn count_allocations(db: &dyn Database) -> Result<u64, DatabaseError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) as cnt FROM budget_allocations", &[])
        .await
        .map_err(|e| DatabaseError::Database(e.to_string()))?;

    let count: i64 = rows.first().map_or(0, |r| r.to_value("cnt").unwrap_or(0));

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn optional(value: Option<String>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::String)
}
