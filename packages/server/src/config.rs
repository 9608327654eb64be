//! Startup configuration read from environment variables.

use std::path::PathBuf;

use muni_budget_database::DEFAULT_DB_PATH;
use muni_budget_map_data::TopologySource;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_TOPOLOGY_PATH: &str = "data/topo-data.json";
pub const DEFAULT_STATIC_DIR: &str = "frontend/build";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// `SQLite` file holding submitted allocations.
    pub database_path: PathBuf,
    pub topology: TopologySource,
    /// Built frontend. Served only if the directory exists.
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `DATABASE_PATH`, `TOPOLOGY_URL`,
    /// `TOPOLOGY_PATH`, and `STATIC_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Empty values
    /// count as unset, and an unparsable `PORT` falls back to the default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let topology = var("TOPOLOGY_URL").map_or_else(
            || {
                TopologySource::Path(PathBuf::from(
                    var("TOPOLOGY_PATH").unwrap_or_else(|| DEFAULT_TOPOLOGY_PATH.to_string()),
                ))
            },
            TopologySource::Url,
        );

        Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port: var("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_path: PathBuf::from(
                var("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            topology,
            static_dir: PathBuf::from(
                var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            ),
        }
    }
}
