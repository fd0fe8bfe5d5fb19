/// Application settings from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Persisted language preference
pub mod language;

pub use app::{AppConfig, CatalogConfig, CompanyConfig, PdfConfig};
pub use language::Language;
