//! Catalog sync service.
//!
//! Owns the polling lifecycle: `start()` spawns a loop that re-fetches the
//! catalog at a fixed interval while the network is reported online, `stop()`
//! cancels it. The consumer callback is handed in at construction and receives
//! the latest catalog after every successful poll.
//!
//! State transitions:
//!
//! ```text
//! Empty ──fetch──▶ Fetching ──ok──▶ Fresh ──ttl──▶ Stale ──refresh──▶ Fetching
//!                     │                                                  │
//!                     └──fail, no cache──▶ EmptyAfterFailure             ▼
//! any ──offline──▶ Offline ──online──▶ Fetching                        Fresh
//! ```

use crate::core::catalog::Catalog;
use crate::core::fetcher::{CatalogOrigin, RemoteCatalog, SheetSource};
use crate::errors::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Poll interval used when a zero interval is requested
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Callback receiving the latest catalog after each successful poll
pub type CatalogCallback = Arc<dyn Fn(&Catalog) + Send + Sync>;

/// Sync lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing loaded yet
    Empty,
    /// A fetch is in flight
    Fetching,
    /// Data younger than the fresh TTL
    Fresh,
    /// Data served from an older cache entry
    Stale,
    /// Polling suspended until the network comes back
    Offline,
    /// The first fetch failed and there was no cache to fall back on
    EmptyAfterFailure,
}

struct Inner<S> {
    remote: RemoteCatalog<S>,
    poll_interval: Duration,
    callback: CatalogCallback,
    online: watch::Sender<bool>,
    state: RwLock<SyncState>,
    latest: RwLock<Catalog>,
    refreshing: AtomicBool,
}

impl<S: SheetSource> Inner<S> {
    async fn set_state(&self, next: SyncState) {
        let mut state = self.state.write().await;
        if *state != next {
            debug!("Catalog sync state {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    /// One fetch-and-diff cycle. Returns whether the poll succeeded.
    async fn poll_once(&self) -> bool {
        self.set_state(SyncState::Fetching).await;

        match self.remote.refresh().await {
            Ok(catalog) => {
                {
                    let mut latest = self.latest.write().await;
                    if *latest == catalog {
                        debug!("Catalog unchanged after poll");
                    } else {
                        info!(
                            "Catalog changed: {} products, {} colors",
                            catalog.products.len(),
                            catalog.colors.len()
                        );
                        *latest = catalog.clone();
                    }
                }
                self.set_state(SyncState::Fresh).await;
                (self.callback)(&catalog);
                true
            }
            Err(e) => {
                warn!("Catalog poll failed: {}", e);
                let has_data = !self.latest.read().await.is_empty();
                let next = if !*self.online.borrow() {
                    SyncState::Offline
                } else if has_data {
                    SyncState::Stale
                } else {
                    SyncState::EmptyAfterFailure
                };
                self.set_state(next).await;
                false
            }
        }
    }
}

/// Catalog service with stale-while-revalidate reads and a polling loop
pub struct CatalogService<S> {
    inner: Arc<Inner<S>>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl<S: SheetSource> CatalogService<S> {
    /// Creates a stopped service. The network is assumed online.
    ///
    /// A zero `poll_interval` is replaced by [`DEFAULT_POLL_INTERVAL`].
    pub fn new(remote: RemoteCatalog<S>, poll_interval: Duration, callback: CatalogCallback) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            warn!("Zero catalog poll interval, using {:?}", DEFAULT_POLL_INTERVAL);
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        let (online, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                remote,
                poll_interval,
                callback,
                online,
                state: RwLock::new(SyncState::Empty),
                latest: RwLock::new(Catalog::default()),
                refreshing: AtomicBool::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SyncState {
        *self.inner.state.read().await
    }

    /// Most recent catalog known to the service
    pub async fn latest(&self) -> Catalog {
        self.inner.latest.read().await.clone()
    }

    /// Returns cached data immediately. Stale data (older than the fresh TTL,
    /// younger than the stale TTL) is returned as is and a background refresh
    /// is spawned. Without a usable cache the result is an empty catalog.
    pub async fn get_instant_data(&self) -> Result<Catalog> {
        let cache = self.inner.remote.cache();
        let now = chrono::Utc::now();
        let Some(entry) = cache.get_cached_at(now).await? else {
            debug!("No usable catalog cache");
            return Ok(Catalog::default());
        };

        let catalog = entry.catalog();
        *self.inner.latest.write().await = catalog.clone();

        if cache.is_stale(&entry, now) {
            self.inner.set_state(SyncState::Stale).await;
            self.spawn_background_refresh();
        } else {
            self.inner.set_state(SyncState::Fresh).await;
        }
        Ok(catalog)
    }

    /// Instant data when available, otherwise a full fetch with fallbacks.
    pub async fn load(&self) -> Result<Catalog> {
        let instant = self.get_instant_data().await?;
        if !instant.is_empty() {
            return Ok(instant);
        }

        self.inner.set_state(SyncState::Fetching).await;
        let (catalog, origin) = self.inner.remote.fetch_all().await?;
        let next = match origin {
            CatalogOrigin::Remote => SyncState::Fresh,
            CatalogOrigin::Cache => SyncState::Stale,
            CatalogOrigin::Empty => SyncState::EmptyAfterFailure,
        };
        *self.inner.latest.write().await = catalog.clone();
        self.inner.set_state(next).await;
        Ok(catalog)
    }

    fn spawn_background_refresh(&self) {
        if self.inner.refreshing.swap(true, Ordering::SeqCst) {
            debug!("Background refresh already running");
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            debug!("Refreshing stale catalog in the background");
            inner.poll_once().await;
            inner.refreshing.store(false, Ordering::SeqCst);
        });
    }

    /// Reports network availability. Going offline suspends polling; coming
    /// back online resumes it with an immediate poll.
    pub async fn set_online(&self, online: bool) {
        let previous = self.inner.online.send_replace(online);
        if previous == online {
            return;
        }
        if online {
            info!("Network online, catalog polling resumes");
        } else {
            info!("Network offline, catalog polling suspended");
            self.inner.set_state(SyncState::Offline).await;
        }
    }

    /// Whether the network is currently reported online
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    /// Runs one poll immediately
    pub async fn poll_now(&self) -> bool {
        self.inner.poll_once().await
    }

    /// Starts the polling loop. Calling `start` on a running service is a no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { poll_loop(inner, loop_token).await });
        *task = Some((token, handle));
        info!(
            "Catalog polling started (every {:?})",
            self.inner.poll_interval
        );
    }

    /// Stops the polling loop and waits for it to finish.
    pub async fn stop(&self) {
        let Some((token, handle)) = self.task.lock().await.take() else {
            return;
        };
        token.cancel();
        if let Err(e) = handle.await {
            error!("Catalog polling task ended abnormally: {}", e);
        }
        info!("Catalog polling stopped");
    }

    /// Interval between polls
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Whether the polling loop is running
    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

async fn poll_loop<S: SheetSource>(inner: Arc<Inner<S>>, token: CancellationToken) {
    let mut online_rx = inner.online.subscribe();
    let mut ticker = tokio::time::interval(inner.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let online = *online_rx.borrow();
        tokio::select! {
            () = token.cancelled() => break,

            changed = online_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if *online_rx.borrow_and_update() {
                    ticker.reset();
                    inner.poll_once().await;
                }
            }

            _ = ticker.tick(), if online => {
                inner.poll_once().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::CatalogCache;
    use crate::core::fetcher::RetryPolicy;
    use crate::test_utils::{MockSheetSource, sample_catalog, setup_test_db};
    use chrono::{TimeDelta, Utc};
    use std::sync::atomic::AtomicUsize;

    struct Harness {
        service: CatalogService<MockSheetSource>,
        source: MockSheetSource,
        cache: CatalogCache,
        callbacks: Arc<AtomicUsize>,
    }

    async fn harness(source: MockSheetSource) -> Result<Harness> {
        harness_with_interval(source, Duration::from_secs(5)).await
    }

    async fn harness_with_interval(source: MockSheetSource, poll_interval: Duration) -> Result<Harness> {
        let cache = CatalogCache::new(setup_test_db().await?);
        let remote = RemoteCatalog::new(source.clone(), cache.clone(), RetryPolicy::immediate(0));
        let callbacks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&callbacks);
        let callback: CatalogCallback = Arc::new(move |_catalog: &Catalog| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let service = CatalogService::new(remote, poll_interval, callback);
        Ok(Harness {
            service,
            source,
            cache,
            callbacks,
        })
    }

    #[tokio::test]
    async fn test_instant_data_without_cache_is_empty() -> Result<()> {
        let h = harness(MockSheetSource::from_catalog(&sample_catalog())).await?;
        let catalog = h.service.get_instant_data().await?;
        assert!(catalog.is_empty());
        assert_eq!(h.service.state().await, SyncState::Empty);
        assert_eq!(h.source.calls(), 0, "instant read never blocks on the network");
        Ok(())
    }

    #[tokio::test]
    async fn test_instant_data_fresh_cache() -> Result<()> {
        let h = harness(MockSheetSource::failing()).await?;
        let sample = sample_catalog();
        h.cache.set_cached(sample.products.clone(), sample.colors.clone()).await?;

        let catalog = h.service.get_instant_data().await?;
        assert_eq!(catalog, sample);
        assert_eq!(h.service.state().await, SyncState::Fresh);
        Ok(())
    }

    #[tokio::test]
    async fn test_instant_data_stale_cache_triggers_background_refresh() -> Result<()> {
        let h = harness(MockSheetSource::from_catalog(&sample_catalog())).await?;
        let old = Utc::now() - TimeDelta::minutes(10);
        h.cache.set_cached_at(Vec::new(), Vec::new(), None, old).await?;

        let catalog = h.service.get_instant_data().await?;
        assert!(catalog.is_empty(), "stale data is returned as is");

        for _ in 0..50 {
            if h.callbacks.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.callbacks.load(Ordering::SeqCst), 1);
        assert_eq!(h.service.latest().await, sample_catalog());
        assert_eq!(h.service.state().await, SyncState::Fresh);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_cache_is_not_served_instantly() -> Result<()> {
        let h = harness(MockSheetSource::failing()).await?;
        let sample = sample_catalog();
        let old = Utc::now() - TimeDelta::days(3);
        h.cache
            .set_cached_at(sample.products.clone(), sample.colors.clone(), None, old)
            .await?;

        assert!(h.service.get_instant_data().await?.is_empty());
        // the full load still falls back to the expired entry
        assert_eq!(h.service.load().await?, sample);
        assert_eq!(h.service.state().await, SyncState::Stale);
        Ok(())
    }

    #[tokio::test]
    async fn test_first_fetch_failure_without_cache() -> Result<()> {
        let h = harness(MockSheetSource::failing()).await?;
        assert!(h.service.load().await?.is_empty());
        assert_eq!(h.service.state().await, SyncState::EmptyAfterFailure);
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_invokes_callback_on_success() -> Result<()> {
        let h = harness(MockSheetSource::from_catalog(&sample_catalog())).await?;
        assert!(h.service.poll_now().await);
        assert!(h.service.poll_now().await);
        assert_eq!(h.callbacks.load(Ordering::SeqCst), 2);
        assert_eq!(h.service.state().await, SyncState::Fresh);
        Ok(())
    }

    #[tokio::test]
    async fn test_polling_loop_suspends_while_offline() -> Result<()> {
        let h = harness_with_interval(
            MockSheetSource::from_catalog(&sample_catalog()),
            Duration::from_millis(40),
        )
        .await?;
        h.service.start().await;
        assert!(h.service.is_running().await);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(h.callbacks.load(Ordering::SeqCst) >= 2);

        h.service.set_online(false).await;
        // let an in-flight poll settle
        tokio::time::sleep(Duration::from_millis(100)).await;
        let while_offline = h.callbacks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(h.callbacks.load(Ordering::SeqCst), while_offline);
        assert!(!h.service.is_online());

        h.service.set_online(true).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(h.callbacks.load(Ordering::SeqCst) > while_offline);

        h.service.stop().await;
        assert!(!h.service.is_running().await);
        let after_stop = h.callbacks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.callbacks.load(Ordering::SeqCst), after_stop);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_poll_interval_falls_back_to_default() -> Result<()> {
        let h = harness_with_interval(MockSheetSource::from_catalog(&sample_catalog()), Duration::ZERO).await?;
        assert_eq!(h.service.poll_interval(), DEFAULT_POLL_INTERVAL);

        h.service.start().await;
        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.service.is_running().await);
        assert_eq!(h.callbacks.load(Ordering::SeqCst), 1);

        h.service.stop().await;
        assert!(!h.service.is_running().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_without_start() -> Result<()> {
        let h = harness(MockSheetSource::from_catalog(&sample_catalog())).await?;
        h.service.stop().await;
        h.service.start().await;
        h.service.start().await;
        h.service.stop().await;
        assert!(!h.service.is_running().await);
        Ok(())
    }
}
