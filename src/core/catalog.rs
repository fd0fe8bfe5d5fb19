//! Catalog model and remote row normalization.
//!
//! The catalog API hands back spreadsheet rows whose headers depend on who edited
//! the sheet last: English or Turkish, any casing, sometimes no headers at all.
//! Rows are parsed in two stages. First the keys are matched against a synonym
//! table; if no key matches, the row's values are read against a fixed
//! positional schema. Each row ends up as a tagged [`ParseResult`].

use crate::core::pricing;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Status value that marks a row as inactive (compared after folding)
pub const INACTIVE_SENTINEL: &str = "pasif";

const ID_KEYS: &[&str] = &["id", "kod", "code", "urunid", "productid"];
const NAME_KEYS: &[&str] = &["name", "ad", "adi", "isim", "urunadi", "productname"];
// color rows often repeat the product name next to their own
const COLOR_NAME_KEYS: &[&str] = &["renkadi", "colorname", "renk", "color", "name", "ad", "adi", "isim"];
const STONE_TYPE_KEYS: &[&str] = &["stonetype", "tastipi", "tip", "type", "kategori", "category", "malzeme"];
const CURRENCY_KEYS: &[&str] = &["currency", "parabirimi", "doviz", "kur"];
const STATUS_KEYS: &[&str] = &["status", "durum", "aktif", "active", "state"];
const PRODUCT_ID_KEYS: &[&str] = &["productid", "urunid", "urun", "product", "urunkodu"];
const PRICE_KEYS: &[&str] = &["price", "fiyat", "mtulfiyat", "birimfiyat", "listefiyati"];
const HEX_KEYS: &[&str] = &["hexcolor", "hex", "renkkodu", "colorcode"];
const IMAGE_KEYS: &[&str] = &["imageurl", "image", "gorsel", "resim", "foto"];

const PORCELAIN_KEYWORDS: &[&str] = &["porselen", "porcelain", "dekton", "neolith", "laminam", "sinterlenmis", "sintered"];
const QUARTZ_KEYWORDS: &[&str] = &["kuvars", "quartz", "caesarstone", "silestone", "belenco", "cimstone", "coante"];
const LABOR_KEYWORDS: &[&str] = &["iscilik", "labor", "labour", "hizmet"];

/// Stone category, drives the category multiplier and option tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Quartz / engineered stone
    Quartz,
    /// Porcelain / sintered stone
    Porcelain,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quartz => write!(f, "Quartz"),
            Self::Porcelain => write!(f, "Porcelain"),
        }
    }
}

/// A product line (e.g. a quartz brand)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Inferred category
    pub category: Option<Category>,
    /// Raw stone type column, when present
    pub stone_type: Option<String>,
    /// Three-letter currency code, when valid
    pub currency: Option<String>,
}

impl Product {
    /// Dekton products use a 61 cm baseline depth instead of 65 cm
    #[must_use]
    pub fn is_dekton(&self) -> bool {
        fold(&self.name).contains("dekton")
    }

    fn is_labor(&self) -> bool {
        let name = fold(&self.name);
        LABOR_KEYWORDS.iter().any(|k| name.contains(k))
    }
}

/// A color within a product, carrying the base price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning product id
    pub product_id: String,
    /// Locale-formatted price string as delivered by the sheet
    pub price: String,
    /// Three-letter currency code, when valid
    pub currency: Option<String>,
    /// Swatch color
    pub hex_color: Option<String>,
    /// Swatch image
    pub image_url: Option<String>,
}

impl Color {
    /// Numeric price, 0 when unparseable
    #[must_use]
    pub fn price_value(&self) -> f64 {
        pricing::parse_price(&self.price)
    }
}

/// Normalized catalog contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// All active products
    pub products: Vec<Product>,
    /// All active colors
    pub colors: Vec<Color>,
}

impl Catalog {
    /// Creates a catalog from already normalized records
    #[must_use]
    pub const fn new(products: Vec<Product>, colors: Vec<Color>) -> Self {
        Self { products, colors }
    }

    /// True when neither products nor colors are loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.colors.is_empty()
    }

    /// Looks up a product by id
    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Looks up a color by id
    #[must_use]
    pub fn color(&self, id: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.id == id)
    }

    /// All colors belonging to a product
    pub fn colors_for<'a>(&'a self, product_id: &'a str) -> impl Iterator<Item = &'a Color> + 'a {
        self.colors.iter().filter(move |c| c.product_id == product_id)
    }

    /// Products that are sold as stone (labor rows excluded)
    pub fn stone_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| !p.is_labor())
    }

    /// Price of a labor service, looked up by name among colors of labor products.
    #[must_use]
    pub fn labor_price(&self, service_name: &str) -> Option<f64> {
        let wanted = fold(service_name);
        self.colors
            .iter()
            .filter(|c| self.product(&c.product_id).is_some_and(Product::is_labor))
            .find(|c| fold(&c.name) == wanted)
            .map(Color::price_value)
    }
}

/// Sheets exposed by the catalog API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sheet {
    /// Product lines
    Products,
    /// Colors with prices
    Colors,
}

impl Sheet {
    /// Sheet name used in the `sheet=` query parameter
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Products => "Products",
            Self::Colors => "Colors",
        }
    }
}

/// Why a row was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Status column holds the inactive sentinel
    Inactive,
    /// A required field was absent or empty
    MissingField(&'static str),
    /// Value is neither an object nor an array
    NotARow,
}

/// Outcome of parsing one remote row
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult<T> {
    /// Parsed through recognised headers
    Keyed(T),
    /// No header matched; parsed by column position
    PositionalFallback(T),
    /// Row dropped
    Reject(RejectReason),
}

impl<T> ParseResult<T> {
    /// The parsed record, regardless of which stage produced it
    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Keyed(v) | Self::PositionalFallback(v) => Some(v),
            Self::Reject(_) => None,
        }
    }
}

/// Field accessor over either a keyed or a positional row
enum RowView<'a> {
    Keyed(Vec<(String, &'a Value)>),
    Positional(Vec<&'a Value>),
}

impl RowView<'_> {
    fn keyed(&self, synonyms: &[&str]) -> Option<String> {
        let Self::Keyed(fields) = self else {
            return None;
        };
        synonyms.iter().find_map(|syn| {
            fields
                .iter()
                .find(|(k, _)| k == syn)
                .and_then(|(_, v)| value_to_string(v))
        })
    }

    fn positional(&self, index: usize) -> Option<String> {
        let Self::Positional(values) = self else {
            return None;
        };
        values.get(index).and_then(|v| value_to_string(v))
    }
}

/// Splits a row into a view: keyed when at least one header is recognised,
/// positional otherwise.
fn view_row<'a>(row: &'a Value, known: &[&[&str]]) -> Option<RowView<'a>> {
    match row {
        Value::Object(map) => {
            let fields: Vec<(String, &Value)> =
                map.iter().map(|(k, v)| (fold_key(k), v)).collect();
            let recognised = fields
                .iter()
                .any(|(k, _)| known.iter().any(|syns| syns.contains(&k.as_str())));
            if recognised {
                Some(RowView::Keyed(fields))
            } else {
                Some(RowView::Positional(map.values().collect()))
            }
        }
        Value::Array(values) => Some(RowView::Positional(values.iter().collect())),
        _ => None,
    }
}

/// Parses one row of the Products sheet.
///
/// Positional schema: `[id, name, stone_type, currency, status]`.
#[must_use]
pub fn parse_product_row(row: &Value) -> ParseResult<Product> {
    let known = [ID_KEYS, NAME_KEYS, STONE_TYPE_KEYS, CURRENCY_KEYS, STATUS_KEYS];
    let Some(view) = view_row(row, &known) else {
        return ParseResult::Reject(RejectReason::NotARow);
    };

    let (id, name, stone_type, currency, status) = match &view {
        RowView::Keyed(_) => (
            view.keyed(ID_KEYS),
            view.keyed(NAME_KEYS),
            view.keyed(STONE_TYPE_KEYS),
            view.keyed(CURRENCY_KEYS),
            view.keyed(STATUS_KEYS),
        ),
        RowView::Positional(_) => (
            view.positional(0),
            view.positional(1),
            view.positional(2),
            view.positional(3),
            view.positional(4),
        ),
    };

    if status.as_deref().is_some_and(is_inactive) {
        return ParseResult::Reject(RejectReason::Inactive);
    }
    let Some(id) = id else {
        return ParseResult::Reject(RejectReason::MissingField("id"));
    };
    let Some(name) = name else {
        return ParseResult::Reject(RejectReason::MissingField("name"));
    };

    let product = Product {
        category: infer_category(stone_type.as_deref(), &name),
        id,
        name,
        stone_type,
        currency: normalize_currency(currency.as_deref()),
    };

    match view {
        RowView::Keyed(_) => ParseResult::Keyed(product),
        RowView::Positional(_) => ParseResult::PositionalFallback(product),
    }
}

/// Parses one row of the Colors sheet.
///
/// Positional schema: `[id, name, product_id, price, currency, hex_color, image_url, status]`.
#[must_use]
pub fn parse_color_row(row: &Value) -> ParseResult<Color> {
    let known = [
        ID_KEYS,
        COLOR_NAME_KEYS,
        PRODUCT_ID_KEYS,
        PRICE_KEYS,
        CURRENCY_KEYS,
        HEX_KEYS,
        IMAGE_KEYS,
        STATUS_KEYS,
    ];
    let Some(view) = view_row(row, &known) else {
        return ParseResult::Reject(RejectReason::NotARow);
    };

    let fields: [Option<String>; 8] = match &view {
        // "id" is also a product id synonym; look for the explicit product column first
        RowView::Keyed(_) => [
            view.keyed(&["id", "kod", "code", "renkid", "colorid"]),
            view.keyed(COLOR_NAME_KEYS),
            view.keyed(PRODUCT_ID_KEYS),
            view.keyed(PRICE_KEYS),
            view.keyed(CURRENCY_KEYS),
            view.keyed(HEX_KEYS),
            view.keyed(IMAGE_KEYS),
            view.keyed(STATUS_KEYS),
        ],
        RowView::Positional(_) => std::array::from_fn(|i| view.positional(i)),
    };
    let [id, name, product_id, price, currency, hex_color, image_url, status] = fields;

    if status.as_deref().is_some_and(is_inactive) {
        return ParseResult::Reject(RejectReason::Inactive);
    }
    let Some(id) = id else {
        return ParseResult::Reject(RejectReason::MissingField("id"));
    };
    let Some(name) = name else {
        return ParseResult::Reject(RejectReason::MissingField("name"));
    };
    let Some(product_id) = product_id else {
        return ParseResult::Reject(RejectReason::MissingField("product_id"));
    };

    let color = Color {
        id,
        name,
        product_id,
        price: price.unwrap_or_else(|| "0".to_string()),
        currency: normalize_currency(currency.as_deref()),
        hex_color,
        image_url,
    };

    match view {
        RowView::Keyed(_) => ParseResult::Keyed(color),
        RowView::Positional(_) => ParseResult::PositionalFallback(color),
    }
}

/// Parses a whole sheet, dropping rejected rows.
pub fn normalize_rows<T>(rows: &[Value], parse: fn(&Value) -> ParseResult<T>) -> Vec<T> {
    let mut fallback = 0usize;
    let mut rejected = 0usize;
    let records: Vec<T> = rows
        .iter()
        .filter_map(|row| match parse(row) {
            ParseResult::Keyed(v) => Some(v),
            ParseResult::PositionalFallback(v) => {
                fallback += 1;
                Some(v)
            }
            ParseResult::Reject(reason) => {
                rejected += 1;
                tracing::trace!("Dropping catalog row {:?}: {:?}", row, reason);
                None
            }
        })
        .collect();

    if fallback > 0 || rejected > 0 {
        tracing::debug!(
            "Normalized {} rows ({} positional, {} rejected)",
            records.len(),
            fallback,
            rejected
        );
    }
    records
}

/// Infers the category from the stone type column, then from the product name.
#[must_use]
pub fn infer_category(stone_type: Option<&str>, name: &str) -> Option<Category> {
    let from_keywords = |text: &str| {
        let folded = fold(text);
        if PORCELAIN_KEYWORDS.iter().any(|k| folded.contains(k)) {
            Some(Category::Porcelain)
        } else if QUARTZ_KEYWORDS.iter().any(|k| folded.contains(k)) {
            Some(Category::Quartz)
        } else {
            None
        }
    };

    stone_type.and_then(from_keywords).or_else(|| from_keywords(name))
}

/// Accepts exactly three uppercase ASCII letters.
#[must_use]
pub fn normalize_currency(code: Option<&str>) -> Option<String> {
    let code = code?.trim();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())).then(|| code.to_string())
}

fn is_inactive(status: &str) -> bool {
    fold(status) == INACTIVE_SENTINEL
}

fn value_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Lowercases with Turkish letters mapped to their ASCII base.
#[must_use]
pub fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            'İ' | 'I' | 'ı' => 'i',
            'Ş' | 'ş' => 's',
            'Ğ' | 'ğ' => 'g',
            'Ü' | 'ü' => 'u',
            'Ö' | 'ö' => 'o',
            'Ç' | 'ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Folds a header and strips separators: `"Ürün Adı"` → `"urunadi"`.
fn fold_key(key: &str) -> String {
    fold(key)
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_row_with_english_headers() {
        let row = json!({"ID": "p1", "Name": "Belenco Quartz", "Currency": "USD"});
        let result = parse_product_row(&row);
        let ParseResult::Keyed(product) = result else {
            panic!("expected keyed parse, got {result:?}");
        };
        assert_eq!(product.id, "p1");
        assert_eq!(product.category, Some(Category::Quartz));
        assert_eq!(product.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_product_row_with_turkish_headers() {
        let row = json!({"Ürün ID": "p2", "Ürün Adı": "Dekton", "Taş Tipi": "Porselen"});
        let product = parse_product_row(&row).into_record().unwrap();
        assert_eq!(product.id, "p2");
        assert_eq!(product.name, "Dekton");
        assert_eq!(product.category, Some(Category::Porcelain));
        assert!(product.is_dekton());
    }

    #[test]
    fn test_product_row_positional_fallback() {
        let row = json!({"A": "p3", "B": "Silestone", "C": "", "D": "EUR"});
        let result = parse_product_row(&row);
        let ParseResult::PositionalFallback(product) = result else {
            panic!("expected positional fallback, got {result:?}");
        };
        assert_eq!(product.id, "p3");
        assert_eq!(product.name, "Silestone");
        assert_eq!(product.stone_type, None);
        assert_eq!(product.currency.as_deref(), Some("EUR"));
        assert_eq!(product.category, Some(Category::Quartz));
    }

    #[test]
    fn test_array_row_is_positional() {
        let row = json!(["p4", "Neolith", "Porcelain", "TRY"]);
        assert!(matches!(
            parse_product_row(&row),
            ParseResult::PositionalFallback(_)
        ));
    }

    #[test]
    fn test_inactive_rows_rejected() {
        let row = json!({"id": "p5", "name": "Old Line", "Durum": "PASİF"});
        assert_eq!(
            parse_product_row(&row),
            ParseResult::Reject(RejectReason::Inactive)
        );
        let row = json!({"id": "c1", "name": "White", "productId": "p1", "status": "pasif"});
        assert_eq!(
            parse_color_row(&row),
            ParseResult::Reject(RejectReason::Inactive)
        );
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let row = json!({"name": "No Id"});
        assert_eq!(
            parse_product_row(&row),
            ParseResult::Reject(RejectReason::MissingField("id"))
        );
        assert_eq!(
            parse_product_row(&json!("just a string")),
            ParseResult::Reject(RejectReason::NotARow)
        );
    }

    #[test]
    fn test_color_row_defaults() {
        let row = json!({"id": "c2", "Renk Adı": "Calacatta", "Ürün ID": "p1", "Para Birimi": "usd"});
        let color = parse_color_row(&row).into_record().unwrap();
        assert_eq!(color.product_id, "p1");
        assert_eq!(color.price, "0", "missing price defaults to zero");
        assert_eq!(color.currency, None, "lowercase currency is not a valid code");
    }

    #[test]
    fn test_color_row_prefers_color_name_over_product_name() {
        let row = json!({
            "Renk ID": "c9",
            "Ürün Adı": "Belenco Quartz",
            "Renk Adı": "Snow White",
            "Ürün ID": "p1",
            "Fiyat": "1.000"
        });
        let color = parse_color_row(&row).into_record().unwrap();
        assert_eq!(color.id, "c9");
        assert_eq!(color.name, "Snow White");
        assert_eq!(color.product_id, "p1");

        // only the product name present: no color name, row rejected
        let row = json!({"Renk ID": "c10", "Ürün Adı": "Belenco Quartz", "Ürün ID": "p1"});
        assert_eq!(
            parse_color_row(&row),
            ParseResult::Reject(RejectReason::MissingField("name"))
        );
    }

    #[test]
    fn test_color_row_numeric_price() {
        let row = json!({"id": 7, "name": "Snow", "productId": "p1", "Fiyat": 1250.5});
        let color = parse_color_row(&row).into_record().unwrap();
        assert_eq!(color.id, "7");
        assert!((color.price_value() - 1250.5).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_rows_drops_rejects() {
        let rows = vec![
            json!({"id": "p1", "name": "Quartz A"}),
            json!({"id": "p2", "name": "Gone", "status": "PASIF"}),
            json!(42),
        ];
        let products = normalize_rows(&rows, parse_product_row);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "p1");
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency(Some(" EUR ")), Some("EUR".to_string()));
        assert_eq!(normalize_currency(Some("EURO")), None);
        assert_eq!(normalize_currency(Some("Tl")), None);
        assert_eq!(normalize_currency(None), None);
    }

    #[test]
    fn test_infer_category_prefers_stone_type() {
        assert_eq!(
            infer_category(Some("Porselen"), "Some Quartz Name"),
            Some(Category::Porcelain)
        );
        assert_eq!(infer_category(None, "Çimstone"), Some(Category::Quartz));
        assert_eq!(infer_category(Some("granit"), "Granit"), None);
    }

    #[test]
    fn test_labor_price_lookup() {
        let catalog = crate::test_utils::sample_catalog();
        assert_eq!(catalog.labor_price("montaj"), Some(1500.0));
        assert_eq!(catalog.labor_price("Unknown service"), None);
        assert!(catalog.stone_products().all(|p| !p.is_labor()));
    }
}
