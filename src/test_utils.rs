//! Shared test utilities for `stone-quote`.
//!
//! Provides an in-memory database, a small but complete sample catalog, and a
//! scripted sheet source standing in for the catalog API.

use crate::{
    core::{
        catalog::{Catalog, Sheet, normalize_rows, parse_color_row, parse_product_row},
        fetcher::SheetSource,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Raw sheet rows behind [`sample_catalog`]
///
/// # Contents
/// * `belenco`: quartz, TRY, colors `belenco-snow` (1.000) and `belenco-nero` (1.250,00)
/// * `dekton`: porcelain, EUR, color `dekton-kelya` (1.000)
/// * `iscilik`: labor rows for Montaj (1.500), Nakliye (750), Ölçü ve Keşif (500)
#[must_use]
pub fn sample_rows() -> (Vec<Value>, Vec<Value>) {
    let products = vec![
        json!({"id": "belenco", "name": "Belenco Quartz", "stoneType": "Kuvars", "currency": "TRY"}),
        json!({"id": "dekton", "name": "Dekton", "stoneType": "Porselen", "currency": "EUR"}),
        json!({"id": "iscilik", "name": "İşçilik"}),
    ];
    let colors = vec![
        json!({"id": "belenco-snow", "name": "Snow White", "productId": "belenco", "price": "1.000", "currency": "TRY", "hexColor": "#F4F4F2"}),
        json!({"id": "belenco-nero", "name": "Nero", "productId": "belenco", "price": "1.250,00", "currency": "TRY"}),
        json!({"id": "dekton-kelya", "name": "Kelya", "productId": "dekton", "price": "1.000", "currency": "EUR"}),
        json!({"id": "labor-montaj", "name": "Montaj", "productId": "iscilik", "price": "1.500"}),
        json!({"id": "labor-nakliye", "name": "Nakliye", "productId": "iscilik", "price": "750"}),
        json!({"id": "labor-olcu", "name": "Ölçü ve Keşif", "productId": "iscilik", "price": "500"}),
    ];
    (products, colors)
}

/// The normalized sample catalog
#[must_use]
pub fn sample_catalog() -> Catalog {
    let (products, colors) = sample_rows();
    Catalog::new(
        normalize_rows(&products, parse_product_row),
        normalize_rows(&colors, parse_color_row),
    )
}

/// Asserts two prices are equal within floating point noise.
#[allow(clippy::panic)]
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-6 * expected.abs().max(1.0);
    if (actual - expected).abs() > tolerance {
        panic!("expected {expected}, got {actual}");
    }
}

/// Sheet source returning fixed rows, or failing every call.
#[derive(Debug, Clone)]
pub struct MockSheetSource {
    rows: Option<(Vec<Value>, Vec<Value>)>,
    calls: Arc<AtomicUsize>,
}

impl MockSheetSource {
    /// Serves the given rows
    #[must_use]
    pub fn new(products: Vec<Value>, colors: Vec<Value>) -> Self {
        Self {
            rows: Some((products, colors)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serves rows that normalize back into `catalog`
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let products = catalog
            .products
            .iter()
            .map(|p| {
                row([
                    ("id", Some(p.id.as_str())),
                    ("name", Some(p.name.as_str())),
                    ("stoneType", p.stone_type.as_deref()),
                    ("currency", p.currency.as_deref()),
                ])
            })
            .collect();
        let colors = catalog
            .colors
            .iter()
            .map(|c| {
                row([
                    ("id", Some(c.id.as_str())),
                    ("name", Some(c.name.as_str())),
                    ("productId", Some(c.product_id.as_str())),
                    ("price", Some(c.price.as_str())),
                    ("currency", c.currency.as_deref()),
                    ("hexColor", c.hex_color.as_deref()),
                    ("imageUrl", c.image_url.as_deref()),
                ])
            })
            .collect();
        Self::new(products, colors)
    }

    /// Fails every fetch with a 503
    #[must_use]
    pub fn failing() -> Self {
        Self {
            rows: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of fetches made so far, shared across clones
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn row<const N: usize>(fields: [(&str, Option<&str>); N]) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), Value::String(v.to_string()))))
        .collect();
    Value::Object(map)
}

impl SheetSource for MockSheetSource {
    async fn fetch_rows(&self, sheet: Sheet) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((products, colors)) = &self.rows else {
            return Err(Error::CatalogStatus {
                sheet: sheet.name().to_string(),
                status: 503,
            });
        };
        Ok(match sheet {
            Sheet::Products => products.clone(),
            Sheet::Colors => colors.clone(),
        })
    }
}
