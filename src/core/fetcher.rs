//! Remote catalog fetcher.
//!
//! Reads the Products and Colors sheets from the spreadsheet-backed API,
//! normalizes them, and keeps the cache current. Each GET is retried with a
//! fixed backoff; when every attempt fails the fetcher falls back to whatever
//! the cache still holds, however old, and finally to an empty catalog.

use crate::config::CatalogConfig;
use crate::core::cache::CatalogCache;
use crate::core::catalog::{Catalog, Sheet, normalize_rows, parse_color_row, parse_product_row};
use crate::errors::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the catalog returned by [`RemoteCatalog::fetch_all`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    /// Fetched from the API just now
    Remote,
    /// API unreachable, served from cache
    Cache,
    /// API unreachable and nothing cached
    Empty,
}

/// Source of raw sheet rows
pub trait SheetSource: Send + Sync + 'static {
    /// Fetches every row of one sheet
    fn fetch_rows(&self, sheet: Sheet) -> impl Future<Output = Result<Vec<Value>>> + Send;
}

/// Sheet source backed by the HTTP catalog API
#[derive(Debug, Clone)]
pub struct HttpSheetSource {
    client: Client,
    base_url: String,
}

impl HttpSheetSource {
    /// Creates a source for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl SheetSource for HttpSheetSource {
    async fn fetch_rows(&self, sheet: Sheet) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("sheet", sheet.name())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CatalogStatus {
                sheet: sheet.name().to_string(),
                status: status.as_u16(),
            });
        }

        // The API wraps rows in {"data": [...]} on some deployments
        let body: Value = response.json().await?;
        Ok(match body {
            Value::Array(rows) => rows,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        })
    }
}

/// Delays between attempts of a failed GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(5),
        ])
    }
}

impl RetryPolicy {
    /// One retry per delay
    #[must_use]
    pub const fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Retries without waiting, for tests
    #[must_use]
    pub fn immediate(retries: usize) -> Self {
        Self::new(vec![Duration::ZERO; retries])
    }

    /// Number of retries after the first attempt
    #[must_use]
    pub fn retries(&self) -> usize {
        self.delays.len()
    }

    /// Runs `operation`, retrying after each configured delay.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0usize;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let Some(delay) = self.delays.get(attempt) else {
                        warn!("{} failed after {} attempts: {}", what, attempt + 1, e);
                        return Err(e);
                    };
                    attempt += 1;
                    debug!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what,
                        attempt,
                        self.retries() + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }
    }
}

/// Fetches, normalizes, and caches the catalog
#[derive(Debug)]
pub struct RemoteCatalog<S> {
    source: S,
    cache: CatalogCache,
    retry: RetryPolicy,
}

impl RemoteCatalog<HttpSheetSource> {
    /// Builds an HTTP-backed fetcher from configuration
    pub fn from_config(config: &CatalogConfig, cache: CatalogCache) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config {
                message: "catalog.base_url is not set (or CATALOG_API_URL)".to_string(),
            });
        }
        let source = HttpSheetSource::new(config.base_url.clone())?;
        Ok(Self::new(source, cache, RetryPolicy::new(config.retry_delays())))
    }
}

impl<S: SheetSource> RemoteCatalog<S> {
    /// Creates a fetcher over any sheet source
    pub fn new(source: S, cache: CatalogCache, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache,
            retry,
        }
    }

    /// The cache this fetcher writes to
    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Fetches both sheets and normalizes them. No fallback.
    pub async fn fetch_remote(&self) -> Result<Catalog> {
        let product_rows = self
            .retry
            .run("Fetching Products sheet", || self.source.fetch_rows(Sheet::Products))
            .await?;
        let color_rows = self
            .retry
            .run("Fetching Colors sheet", || self.source.fetch_rows(Sheet::Colors))
            .await?;

        let catalog = Catalog::new(
            normalize_rows(&product_rows, parse_product_row),
            normalize_rows(&color_rows, parse_color_row),
        );
        debug!(
            "Fetched catalog: {} products, {} colors",
            catalog.products.len(),
            catalog.colors.len()
        );
        Ok(catalog)
    }

    /// Fetches from the API and writes the cache. A failed cache write is
    /// logged; the fetched catalog is still returned.
    pub async fn refresh(&self) -> Result<Catalog> {
        let catalog = self.fetch_remote().await?;
        if let Err(e) = self
            .cache
            .set_cached(catalog.products.clone(), catalog.colors.clone())
            .await
        {
            warn!("Fetched catalog could not be cached: {}", e);
        }
        Ok(catalog)
    }

    /// Fetches the catalog, degrading to cached data of any age and then to an
    /// empty catalog. Only a cache read failure is reported as an error.
    pub async fn fetch_all(&self) -> Result<(Catalog, CatalogOrigin)> {
        match self.refresh().await {
            Ok(catalog) => {
                info!(
                    "Catalog refreshed with {} products and {} colors",
                    catalog.products.len(),
                    catalog.colors.len()
                );
                Ok((catalog, CatalogOrigin::Remote))
            }
            Err(e) => {
                warn!("Catalog fetch failed, falling back to cache: {}", e);
                match self.cache.load_any().await? {
                    Some(entry) => Ok((entry.catalog(), CatalogOrigin::Cache)),
                    None => {
                        warn!("No cached catalog available, continuing with an empty catalog");
                        Ok((Catalog::default(), CatalogOrigin::Empty))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{MockSheetSource, sample_catalog, setup_test_db};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    async fn fetcher(source: MockSheetSource, retries: usize) -> Result<RemoteCatalog<MockSheetSource>> {
        let cache = CatalogCache::new(setup_test_db().await?);
        Ok(RemoteCatalog::new(source, cache, RetryPolicy::immediate(retries)))
    }

    #[tokio::test]
    async fn test_retry_policy_gives_up_after_all_delays() {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let result: Result<()> = policy
            .run("always failing", || {
                calls += 1;
                async {
                    Err(Error::Config {
                        message: "boom".to_string(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls, 4, "one attempt plus three retries");
    }

    #[tokio::test]
    async fn test_retry_policy_stops_on_success() -> Result<()> {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let value = policy
            .run("flaky", || {
                calls += 1;
                let current = calls;
                async move {
                    if current < 2 {
                        Err(Error::Config {
                            message: "not yet".to_string(),
                        })
                    } else {
                        Ok(current)
                    }
                }
            })
            .await?;
        assert_eq!(value, 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_retry_delays_are_waited() {
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();
        let result: Result<()> = policy
            .run("always failing", || async {
                Err(Error::Config {
                    message: "down".to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_fetch_all_normalizes_and_caches() -> Result<()> {
        let source = MockSheetSource::new(
            vec![
                json!({"id": "p1", "name": "Belenco Quartz"}),
                json!({"id": "p2", "name": "Retired", "status": "PASİF"}),
            ],
            vec![json!({"id": "c1", "name": "Snow", "productId": "p1", "price": "1.250,00"})],
        );
        let remote = fetcher(source, 0).await?;

        let (catalog, origin) = remote.fetch_all().await?;
        assert_eq!(origin, CatalogOrigin::Remote);
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.colors.len(), 1);

        let cached = remote.cache().load_any().await?;
        assert_eq!(cached.map(|c| c.catalog()), Some(catalog));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_all_falls_back_to_cache() -> Result<()> {
        let source = MockSheetSource::failing();
        let remote = fetcher(source.clone(), 2).await?;
        let sample = sample_catalog();
        remote
            .cache()
            .set_cached(sample.products.clone(), sample.colors.clone())
            .await?;

        let (catalog, origin) = remote.fetch_all().await?;
        assert_eq!(origin, CatalogOrigin::Cache);
        assert_eq!(catalog, sample);
        // Products sheet was tried once plus two retries
        assert_eq!(source.calls(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_all_empty_without_cache() -> Result<()> {
        let remote = fetcher(MockSheetSource::failing(), 0).await?;
        let (catalog, origin) = remote.fetch_all().await?;
        assert_eq!(origin, CatalogOrigin::Empty);
        assert!(catalog.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_survives_cache_write_failure() -> Result<()> {
        // no tables, so every cache write fails
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        let remote = RemoteCatalog::new(
            MockSheetSource::from_catalog(&sample_catalog()),
            CatalogCache::new(db),
            RetryPolicy::immediate(0),
        );

        let catalog = remote.refresh().await?;
        assert_eq!(catalog, sample_catalog());

        let (catalog, origin) = remote.fetch_all().await?;
        assert_eq!(origin, CatalogOrigin::Remote);
        assert_eq!(catalog, sample_catalog());
        Ok(())
    }

    /// Serves one canned HTTP response per connection and records each request line.
    async fn serve(status: &'static str, body: &'static str) -> Result<(String, mpsc::UnboundedReceiver<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let text = String::from_utf8_lossy(&request);
                let _ = tx.send(text.lines().next().unwrap_or_default().to_string());
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        Ok((format!("http://{addr}/exec"), rx))
    }

    #[tokio::test]
    async fn test_http_source_reads_plain_array() -> Result<()> {
        let (url, mut requests) = serve("200 OK", r#"[{"id":"p1","name":"Belenco Quartz"}]"#).await?;
        let source = HttpSheetSource::new(url)?;

        let rows = source.fetch_rows(Sheet::Products).await?;
        assert_eq!(rows, vec![json!({"id": "p1", "name": "Belenco Quartz"})]);
        assert_eq!(requests.recv().await.unwrap(), "GET /exec?sheet=Products HTTP/1.1");
        Ok(())
    }

    #[tokio::test]
    async fn test_http_source_unwraps_data_envelope() -> Result<()> {
        let (url, mut requests) = serve("200 OK", r#"{"data":[{"id":"c1"},{"id":"c2"}]}"#).await?;
        let source = HttpSheetSource::new(url)?;

        let rows = source.fetch_rows(Sheet::Colors).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(requests.recv().await.unwrap(), "GET /exec?sheet=Colors HTTP/1.1");
        Ok(())
    }

    #[tokio::test]
    async fn test_http_source_unexpected_shape_is_empty() -> Result<()> {
        let (url, _requests) = serve("200 OK", r#"{"error":"sheet not found"}"#).await?;
        let rows = HttpSheetSource::new(url)?.fetch_rows(Sheet::Products).await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_http_source_maps_error_status() -> Result<()> {
        let (url, _requests) = serve("503 Service Unavailable", "{}").await?;
        let result = HttpSheetSource::new(url)?.fetch_rows(Sheet::Colors).await;
        match result {
            Err(Error::CatalogStatus { sheet, status }) => {
                assert_eq!(sheet, "Colors");
                assert_eq!(status, 503);
            }
            other => panic!("expected CatalogStatus, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_http_source_feeds_fetch_all() -> Result<()> {
        let (url, _requests) = serve(
            "200 OK",
            r#"[{"id":"p1","name":"Belenco Quartz","productId":"p1","price":"1.000"}]"#,
        )
        .await?;
        let cache = CatalogCache::new(setup_test_db().await?);
        let remote = RemoteCatalog::new(HttpSheetSource::new(url)?, cache, RetryPolicy::immediate(0));

        let (catalog, origin) = remote.fetch_all().await?;
        assert_eq!(origin, CatalogOrigin::Remote);
        assert_eq!(catalog.products.len(), 1);
        assert!(remote.cache().load_any().await?.is_some());
        Ok(())
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = CatalogConfig::default();
        let db = sea_orm::DatabaseConnection::Disconnected;
        let result = RemoteCatalog::from_config(&config, CatalogCache::new(db));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
