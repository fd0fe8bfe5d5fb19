/// Catalog cache persisted in the key/value store
pub mod cache;

/// Product and color model, remote row normalization
pub mod catalog;

/// `?product=&color=` links into the form
pub mod deep_link;

/// Remote catalog fetcher with retry and cache fallback
pub mod fetcher;

/// Sink, special detail and labor option tables
pub mod options;

/// Computed price list per product and color
pub mod price_list;

/// Pricing engine: multipliers, totals, price parsing and formatting
pub mod pricing;

/// Quotation form state and reducer
pub mod quotation;

/// Quotation requests read from TOML
pub mod request;

/// Key/value access to the `stored_values` table
pub mod storage;

/// Catalog polling service
pub mod sync;
