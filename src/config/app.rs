//! Application configuration loading from config.toml
//!
//! Everything that differs between deployments lives here: the catalog endpoint,
//! polling and cache timings, where PDFs go, and the company block printed in the
//! quotation footer. Every field has a default so a missing section is not fatal.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog API and sync settings
    pub catalog: CatalogConfig,
    /// PDF export settings
    pub pdf: PdfConfig,
    /// Company details printed on every quotation
    pub company: CompanyConfig,
}

/// Catalog API and polling configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the spreadsheet-backed JSON endpoint
    pub base_url: String,
    /// Seconds between polls while online
    pub poll_interval_secs: u64,
    /// Age after which cached data is refreshed in the background
    pub fresh_ttl_secs: u64,
    /// Age after which cached data is no longer served instantly
    pub stale_ttl_secs: u64,
    /// Delays between retries of a failed GET, in milliseconds
    pub retry_delays_ms: Vec<u64>,
    /// Currency used when a row carries no valid currency code
    pub default_currency: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            poll_interval_secs: 5,
            fresh_ttl_secs: 120,
            stale_ttl_secs: 24 * 60 * 60,
            retry_delays_ms: vec![1000, 2000, 5000],
            default_currency: "TRY".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Poll interval as a `Duration`
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Fresh TTL as a `Duration`
    #[must_use]
    pub const fn fresh_ttl(&self) -> Duration {
        Duration::from_secs(self.fresh_ttl_secs)
    }

    /// Stale TTL as a `Duration`
    #[must_use]
    pub const fn stale_ttl(&self) -> Duration {
        Duration::from_secs(self.stale_ttl_secs)
    }

    /// Rejects settings the poll loop cannot run with.
    ///
    /// # Errors
    /// Returns `Error::Config` when the poll interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::Config {
                message: "catalog.poll_interval_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Retry delays as `Duration`s
    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

/// PDF export configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PdfConfig {
    /// URL of a Unicode TTF font with Turkish glyphs
    pub font_url: Option<String>,
    /// Directory where downloaded quotations are written
    pub output_dir: PathBuf,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            font_url: None,
            output_dir: PathBuf::from("quotations"),
        }
    }
}

/// Company contact block
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CompanyConfig {
    /// Trading name, also used as the text logo
    pub name: String,
    /// Postal address
    pub address: String,
    /// Phone number
    pub phone: String,
    /// E-mail address
    pub email: String,
    /// Web site
    pub website: String,
}

/// Environment variable overriding `catalog.base_url`
pub const CATALOG_API_URL_VAR: &str = "CATALOG_API_URL";

/// Loads the application configuration from a TOML file.
///
/// `CATALOG_API_URL` in the environment overrides `catalog.base_url`.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let mut config = read_config(path.as_ref())?;
    apply_env_overrides(&mut config, std::env::var(CATALOG_API_URL_VAR).ok());
    Ok(config)
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.catalog.validate()?;
    Ok(config)
}

/// Loads configuration from the default location (./config.toml), falling back
/// to built-in defaults when the file does not exist.
pub fn load_default_config() -> Result<AppConfig> {
    load_or_default(Path::new("config.toml"), std::env::var(CATALOG_API_URL_VAR).ok())
}

fn read_config(path: &Path) -> Result<AppConfig> {
    tracing::debug!("Attempting to load configuration from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

fn load_or_default(path: &Path, api_url: Option<String>) -> Result<AppConfig> {
    let mut config = if path.exists() {
        read_config(path)?
    } else {
        tracing::warn!("{} not found, using defaults", path.display());
        AppConfig::default()
    };
    apply_env_overrides(&mut config, api_url);
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        config.catalog.base_url = url;
    }
}
