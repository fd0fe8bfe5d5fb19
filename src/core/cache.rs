//! Catalog cache.
//!
//! The last good catalog is kept as one JSON document in the key/value store.
//! Two ages matter: past the fresh TTL the data is still served but a background
//! refresh is due; past the stale TTL it is no longer served instantly, though
//! the fetcher may still fall back to it when the network is down.

use crate::core::catalog::{Catalog, Color, Product};
use crate::core::storage;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const CACHE_KEY: &str = "catalog_cache";
/// Bumped whenever the cached document layout changes
pub const CACHE_VERSION: u32 = 2;
/// Default fresh TTL (2 minutes)
pub const FRESH_TTL: Duration = Duration::from_secs(2 * 60);
/// Default stale TTL (24 hours)
pub const STALE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCatalog {
    /// Products at the time of caching
    pub products: Vec<Product>,
    /// Colors at the time of caching
    pub colors: Vec<Color>,
    /// Write time, Unix milliseconds
    pub timestamp: i64,
    /// Entity tag reported by the API, if any
    #[serde(default)]
    pub etag: Option<String>,
    /// Document layout version
    #[serde(default)]
    pub version: Option<u32>,
}

impl CachedCatalog {
    /// Age of the entry at `now`; negative ages (clock skew) count as zero
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        let millis = now.timestamp_millis().saturating_sub(self.timestamp);
        Duration::from_millis(u64::try_from(millis).unwrap_or(0))
    }

    /// Catalog contents
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.products.clone(), self.colors.clone())
    }
}

/// Persisted catalog cache with configurable TTLs
#[derive(Debug, Clone)]
pub struct CatalogCache {
    db: DatabaseConnection,
    fresh_ttl: Duration,
    stale_ttl: Duration,
}

impl CatalogCache {
    /// Creates a cache with the default TTLs
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_ttls(db, FRESH_TTL, STALE_TTL)
    }

    /// Creates a cache with explicit TTLs
    #[must_use]
    pub fn with_ttls(db: DatabaseConnection, fresh_ttl: Duration, stale_ttl: Duration) -> Self {
        Self {
            db,
            fresh_ttl,
            stale_ttl,
        }
    }

    /// `now - timestamp > fresh TTL`
    #[must_use]
    pub fn is_stale(&self, entry: &CachedCatalog, now: DateTime<Utc>) -> bool {
        entry.age_at(now) > self.fresh_ttl
    }

    /// `now - timestamp > stale TTL`
    #[must_use]
    pub fn is_expired(&self, entry: &CachedCatalog, now: DateTime<Utc>) -> bool {
        entry.age_at(now) > self.stale_ttl
    }

    /// Returns the cached entry regardless of age. Unreadable documents and
    /// documents from another layout version count as absent.
    pub async fn load_any(&self) -> Result<Option<CachedCatalog>> {
        let Some(raw) = storage::get_value(&self.db, CACHE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<CachedCatalog>(&raw) {
            Ok(entry) if entry.version == Some(CACHE_VERSION) => Ok(Some(entry)),
            Ok(entry) => {
                debug!(
                    "Ignoring catalog cache with version {:?} (expected {})",
                    entry.version, CACHE_VERSION
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Catalog cache is unreadable, ignoring it: {}", e);
                Ok(None)
            }
        }
    }

    /// Returns the cached entry if it has not passed the stale TTL at `now`.
    pub async fn get_cached_at(&self, now: DateTime<Utc>) -> Result<Option<CachedCatalog>> {
        Ok(self
            .load_any()
            .await?
            .filter(|entry| !self.is_expired(entry, now)))
    }

    /// Returns the cached entry if it has not passed the stale TTL.
    pub async fn get_cached(&self) -> Result<Option<CachedCatalog>> {
        self.get_cached_at(Utc::now()).await
    }

    /// Replaces the cached entry, stamped with the current time.
    pub async fn set_cached(&self, products: Vec<Product>, colors: Vec<Color>) -> Result<CachedCatalog> {
        self.set_cached_at(products, colors, None, Utc::now()).await
    }

    /// Replaces the cached entry with an explicit timestamp and entity tag.
    pub async fn set_cached_at(
        &self,
        products: Vec<Product>,
        colors: Vec<Color>,
        etag: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CachedCatalog> {
        let entry = CachedCatalog {
            products,
            colors,
            timestamp: now.timestamp_millis(),
            etag,
            version: Some(CACHE_VERSION),
        };
        storage::set_value(&self.db, CACHE_KEY, serde_json::to_string(&entry)?).await?;
        debug!(
            "Catalog cache written: {} products, {} colors",
            entry.products.len(),
            entry.colors.len()
        );
        Ok(entry)
    }

    /// Drops the cached entry.
    pub async fn clear(&self) -> Result<()> {
        storage::remove_value(&self.db, CACHE_KEY).await
    }
}
