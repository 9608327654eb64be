//! Where the topology document comes from.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::LoadError;

/// Source of raw topology document bytes.
#[async_trait]
pub trait TopologyFetcher: Send + Sync {
    /// Human-readable origin, for logging.
    fn describe(&self) -> String;

    /// Fetches the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the document cannot be retrieved.
    async fn fetch(&self) -> Result<Vec<u8>, LoadError>;
}

/// Configured origin of the topology document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologySource {
    Url(String),
    Path(PathBuf),
}

impl TopologySource {
    /// Builds the fetcher for this source.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Network`] if the HTTP client cannot be built.
    pub fn fetcher(&self) -> Result<Arc<dyn TopologyFetcher>, LoadError> {
        Ok(match self {
            Self::Url(url) => Arc::new(HttpFetcher::new(url.clone())?),
            Self::Path(path) => Arc::new(FileFetcher::new(path.clone())),
        })
    }
}

impl std::fmt::Display for TopologySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Downloads the document with a single GET.
///
/// A `t=<millis>` query parameter defeats intermediate caches so a
/// redeployed document is picked up on the next load.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`LoadError::Network`] if the client cannot be built.
    pub fn new(url: String) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, url })
    }
}

/// Appends the cache-busting timestamp parameter.
#[must_use]
pub fn cache_busted(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={millis}")
}

#[async_trait]
impl TopologyFetcher for HttpFetcher {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        let url = cache_busted(&self.url, chrono::Utc::now().timestamp_millis());
        log::debug!("GET {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::debug!("Fetched {} bytes of topology", bytes.len());

        Ok(bytes.to_vec())
    }
}

/// Reads the document from disk.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl TopologyFetcher for FileFetcher {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
