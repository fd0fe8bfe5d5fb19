//! Unified error type for the quotation pipeline.
//!
//! Most failures in this crate degrade instead of surfacing (catalog falls back to
//! cache, fonts fall back to built-ins). The variants below cover what is left:
//! configuration, persistence, and invalid form mutations.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP request to the catalog API or font CDN failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog API answered with a non-success status
    #[error("Catalog API returned status {status} for sheet {sheet}")]
    CatalogStatus {
        /// Sheet that was requested
        sheet: String,
        /// HTTP status code
        status: u16,
    },

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF generation failed
    #[error("PDF error: {message}")]
    Pdf {
        /// Underlying printpdf message
        message: String,
    },

    /// Font could not be fetched or decoded
    #[error("Font error: {message}")]
    Font {
        /// Description of the failure
        message: String,
    },

    /// Product id not present in the catalog
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: String,
    },

    /// Color id not present in the catalog
    #[error("Color not found: {id}")]
    ColorNotFound {
        /// Requested color id
        id: String,
    },

    /// A bounded group collection is already full
    #[error("Cannot add more than {max} {kind} groups")]
    GroupLimit {
        /// Group kind (depth, panel, hood)
        kind: &'static str,
        /// Maximum number of groups
        max: usize,
    },

    /// Group id does not exist in the quotation
    #[error("Group not found: {id}")]
    GroupNotFound {
        /// Requested group id
        id: u32,
    },

    /// Selected special detail is not offered for the product category
    #[error("Special detail '{name}' is not available for this product")]
    DetailUnavailable {
        /// Special detail label
        name: String,
    },

    /// Labor service name not on the checklist
    #[error("Unknown labor service: {name}")]
    LaborNotFound {
        /// Requested service name
        name: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
