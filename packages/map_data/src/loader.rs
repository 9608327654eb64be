//! Initialize-once, invalidate-on-reload map data state.
//!
//! The first caller starts the load; callers arriving while it is in
//! flight await the same shared future. Success and failure are both
//! remembered until [`MapDataLoader::invalidate`] is called, so a failed
//! load is never retried on its own.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};

use crate::{LoadError, MapData, TopologyFetcher};

type LoadResult = Result<Arc<MapData>, Arc<LoadError>>;
type LoadFuture = Shared<BoxFuture<'static, LoadResult>>;

enum LoadState {
    Unloaded,
    Loading { generation: u64, future: LoadFuture },
    Ready(Arc<MapData>),
    Failed(Arc<LoadError>),
}

/// Payload-free view of the load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

struct Inner {
    state: LoadState,
    generation: u64,
}

/// Process-scoped owner of the map data.
pub struct MapDataLoader {
    fetcher: Arc<dyn TopologyFetcher>,
    inner: Mutex<Inner>,
}

impl MapDataLoader {
    #[must_use]
    pub fn new(fetcher: Arc<dyn TopologyFetcher>) -> Self {
        Self {
            fetcher,
            inner: Mutex::new(Inner {
                state: LoadState::Unloaded,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the map data, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the remembered [`LoadError`] if the load failed.
    pub async fn get(&self) -> LoadResult {
        let (generation, future) = {
            let mut inner = self.lock();
            match &inner.state {
                LoadState::Ready(data) => return Ok(Arc::clone(data)),
                LoadState::Failed(e) => return Err(Arc::clone(e)),
                LoadState::Loading { generation, future } => (*generation, future.clone()),
                LoadState::Unloaded => {
                    inner.generation += 1;
                    let generation = inner.generation;
                    let future = Self::start(Arc::clone(&self.fetcher));
                    inner.state = LoadState::Loading {
                        generation,
                        future: future.clone(),
                    };
                    (generation, future)
                }
            }
        };

        let result = future.await;

        // An invalidate() during the load leaves a newer generation (or
        // Unloaded) in place; the stale result is returned but not stored.
        let mut inner = self.lock();
        if matches!(&inner.state, LoadState::Loading { generation: g, .. } if *g == generation) {
            inner.state = match &result {
                Ok(data) => LoadState::Ready(Arc::clone(data)),
                Err(e) => LoadState::Failed(Arc::clone(e)),
            };
        }

        result
    }

    fn start(fetcher: Arc<dyn TopologyFetcher>) -> LoadFuture {
        async move {
            let origin = fetcher.describe();
            log::info!("Loading map data from {origin}");

            let loaded = match fetcher.fetch().await {
                Ok(bytes) => MapData::from_slice(&bytes),
                Err(e) => Err(e),
            };

            loaded.map(Arc::new).map_err(|e| {
                log::error!("Could not load map data from {origin}: {e}");
                Arc::new(e)
            })
        }
        .boxed()
        .shared()
    }

    /// Loaded data, without triggering a load.
    #[must_use]
    pub fn current(&self) -> Option<Arc<MapData>> {
        match &self.lock().state {
            LoadState::Ready(data) => Some(Arc::clone(data)),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> LoadStatus {
        match &self.lock().state {
            LoadState::Unloaded => LoadStatus::Unloaded,
            LoadState::Loading { .. } => LoadStatus::Loading,
            LoadState::Ready(_) => LoadStatus::Ready,
            LoadState::Failed(_) => LoadStatus::Failed,
        }
    }

    /// Drops loaded or failed data. The next [`Self::get`] fetches again.
    pub fn invalidate(&self) {
        let mut inner = self.lock();
        if !matches!(inner.state, LoadState::Unloaded) {
            log::info!("Invalidating map data");
        }
        inner.state = LoadState::Unloaded;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use muni_budget_topology::TopologyError;

    use super::*;
    use crate::test_fixtures::topology_bytes;

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
    }

    impl CountingFetcher {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TopologyFetcher for CountingFetcher {
        fn describe(&self) -> String {
            "counting fetcher".to_string()
        }

        async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                Ok(b"{\"type\":\"NotATopology\",\"objects\":{}}".to_vec())
            } else {
                Ok(topology_bytes())
            }
        }
    }

    #[tokio::test]
    async fn second_call_uses_cached_data() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let loader = MapDataLoader::new(fetcher.clone());

        assert_eq!(loader.status(), LoadStatus::Unloaded);
        let first = loader.get().await.unwrap();
        let second = loader.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(loader.status(), LoadStatus::Ready);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50));
        let loader = MapDataLoader::new(fetcher.clone());

        let (a, b, c) = tokio::join!(loader.get(), loader.get(), loader.get());

        assert_eq!(fetcher.calls(), 1);
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[tokio::test]
    async fn failure_is_remembered_without_refetch() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        fetcher.fail.store(true, Ordering::SeqCst);
        let loader = MapDataLoader::new(fetcher.clone());

        let err = loader.get().await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            LoadError::Format(TopologyError::Format { .. })
        ));
        assert_eq!(loader.status(), LoadStatus::Failed);

        assert!(loader.get().await.is_err());
        assert_eq!(fetcher.calls(), 1);
        assert!(loader.current().is_none());
    }

    #[tokio::test]
    async fn invalidate_triggers_fresh_load() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        fetcher.fail.store(true, Ordering::SeqCst);
        let loader = MapDataLoader::new(fetcher.clone());
        assert!(loader.get().await.is_err());

        fetcher.fail.store(false, Ordering::SeqCst);
        loader.invalidate();
        assert_eq!(loader.status(), LoadStatus::Unloaded);

        let data = loader.get().await.unwrap();
        assert_eq!(data.features.len(), 3);
        assert_eq!(fetcher.calls(), 2);
        assert!(loader.current().is_some());
    }

    #[tokio::test]
    async fn invalidate_during_load_discards_stale_result() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50));
        let loader = Arc::new(MapDataLoader::new(fetcher.clone()));

        let pending = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.get().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(loader.status(), LoadStatus::Loading);
        loader.invalidate();

        assert!(pending.await.unwrap().is_ok());
        assert_eq!(loader.status(), LoadStatus::Unloaded);
    }
}
