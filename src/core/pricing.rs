//! Pricing engine.
//!
//! Pure functions only: every price in a quotation is a chain of multipliers over
//! the color's base price, or a flat amount from one of the option tables in
//! [`crate::core::options`]. Labels arrive as the strings shown to the user, so
//! the bucket lookups normalize dashes, spacing, and Turkish letters before
//! matching. Anything unrecognised prices at the baseline.

use crate::core::catalog::{Category, Color, Product, fold};
use serde::{Deserialize, Serialize};

/// Currency every quotation is priced in
pub const QUOTE_CURRENCY: &str = "TRY";
/// Value-added tax applied to the discounted total
pub const VAT_RATE: f64 = 0.20;
/// Panel and hood panel unit price factor over the base price
pub const PANEL_FACTOR: f64 = 1.25;
/// Porcelain surcharge
pub const PORCELAIN_FACTOR: f64 = 1.2;

/// Baseline depth label for Dekton products
pub const DEKTON_BASELINE_DEPTH: &str = "61 cm'e kadar";
/// Baseline depth label for every other product
pub const STANDARD_BASELINE_DEPTH: &str = "65 cm'e kadar";
/// Depth labels above the baseline, in display order
pub const UPPER_DEPTH_OPTIONS: [&str; 4] = ["66-75 cm", "76-89 cm", "90 cm", "90 cm üzeri"];

/// Thickness labels in display order
pub const THICKNESS_OPTIONS: [&str; 6] = [
    "h:2 cm",
    "h:3 cm",
    "h:4 cm",
    "h:5-10 cm",
    "h:11-15 cm",
    "h:16-20 cm",
];
/// Thickness selected whenever product or color changes
pub const DEFAULT_THICKNESS: &str = "h:4 cm";

/// Depth options offered for a product, baseline first
#[must_use]
pub fn depth_options(is_dekton: bool) -> Vec<&'static str> {
    let baseline = if is_dekton {
        DEKTON_BASELINE_DEPTH
    } else {
        STANDARD_BASELINE_DEPTH
    };
    std::iter::once(baseline)
        .chain(UPPER_DEPTH_OPTIONS)
        .collect()
}

/// Replaces typographic dashes, folds Turkish letters, drops whitespace.
fn normalize_label(label: &str) -> String {
    fold(label)
        .chars()
        .map(|c| match c {
            '–' | '—' | '−' | '‒' => '-',
            other => other,
        })
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Multiplier for a depth bucket label.
///
/// Ranges are checked before the bare `90` so that a range label is never
/// swallowed by a shorter match.
#[must_use]
pub fn depth_multiplier(label: &str) -> f64 {
    let normalized = normalize_label(label);
    if normalized.contains("76-89") {
        1.335
    } else if normalized.contains("66-75") {
        1.165
    } else if normalized.contains("90") {
        2.0
    } else {
        // 61 / 65 baseline and anything unrecognised
        1.0
    }
}

/// Multiplier for a thickness label such as `"h:11-15 cm"`.
#[must_use]
pub fn thickness_multiplier(label: &str) -> f64 {
    match thickness_key(label).as_str() {
        "16-20" => 1.45,
        "11-15" => 1.30,
        "5-10" => 1.15,
        "2" | "3" => 0.90,
        _ => 1.0,
    }
}

/// Reduces a thickness label to its numeric part: `"h:11-15 cm"` → `"11-15"`.
fn thickness_key(label: &str) -> String {
    let normalized = normalize_label(label);
    let trimmed = normalized.trim_start_matches("h:").trim_start_matches('h');
    trimmed.trim_end_matches("cm").to_string()
}

/// Fixed conversion from a catalog currency into the quotation currency.
#[must_use]
pub fn currency_multiplier(code: &str) -> f64 {
    match code {
        "USD" => 41.0,
        "EUR" => 48.0,
        "GBP" => 55.0,
        _ => 1.0,
    }
}

/// Category surcharge
#[must_use]
pub const fn category_multiplier(category: Option<Category>) -> f64 {
    match category {
        Some(Category::Porcelain) => PORCELAIN_FACTOR,
        Some(Category::Quartz) | None => 1.0,
    }
}

/// Currency a color is priced in: its own, then its product's, then the default.
#[must_use]
pub fn color_currency<'a>(color: &'a Color, product: Option<&'a Product>, default: &'a str) -> &'a str {
    color
        .currency
        .as_deref()
        .or_else(|| product.and_then(|p| p.currency.as_deref()))
        .unwrap_or(default)
}

/// Base price of a color converted into the quotation currency with the
/// category surcharge applied.
#[must_use]
pub fn effective_base_price(color: &Color, product: Option<&Product>, default_currency: &str) -> f64 {
    let currency = color_currency(color, product, default_currency);
    color.price_value()
        * currency_multiplier(currency)
        * category_multiplier(product.and_then(|p| p.category))
}

/// Unit price per MTÜL for a depth group
#[must_use]
pub fn depth_unit_price(base_price: f64, depth_label: &str, thickness_label: &str) -> f64 {
    base_price * depth_multiplier(depth_label) * thickness_multiplier(thickness_label)
}

/// Unit price per m² for panel and hood panel groups
#[must_use]
pub fn panel_unit_price(base_price: f64) -> f64 {
    base_price * PANEL_FACTOR
}

/// `measurement × unit_price`, with negative or non-finite inputs treated as 0
#[must_use]
pub fn line_total(measurement: f64, unit_price: f64) -> f64 {
    sanitize(measurement) * sanitize(unit_price)
}

/// Coerces negative and non-finite numbers to 0
#[must_use]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Skirting height band chosen from the front-edge thickness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkirtingBand {
    /// Up to 5 cm high
    UpTo5,
    /// Up to 10 cm high
    UpTo10,
    /// Up to 15 cm high
    UpTo15,
    /// Full height
    Full,
}

impl SkirtingBand {
    /// Band for a thickness label
    #[must_use]
    pub fn for_thickness(thickness_label: &str) -> Self {
        match thickness_key(thickness_label).as_str() {
            "16-20" => Self::Full,
            "11-15" => Self::UpTo15,
            "5-10" => Self::UpTo10,
            _ => Self::UpTo5,
        }
    }

    /// Share of the reference unit price charged for this band
    #[must_use]
    pub const fn fraction(self) -> f64 {
        match self {
            Self::UpTo5 => 1.0 / 6.0,
            Self::UpTo10 => 1.0 / 3.0,
            Self::UpTo15 => 0.5,
            Self::Full => 1.0,
        }
    }

    /// Label in the requested language
    #[must_use]
    pub const fn label(self, language: crate::config::Language) -> &'static str {
        match self {
            Self::UpTo5 => language.pick("5 cm'e kadar", "Up to 5 cm"),
            Self::UpTo10 => language.pick("10 cm'e kadar", "Up to 10 cm"),
            Self::UpTo15 => language.pick("15 cm'e kadar", "Up to 15 cm"),
            Self::Full => language.pick("Tam boy", "Full height"),
        }
    }
}

/// Skirting unit price per MTÜL: the band fraction of the 1.5 cm reference price,
/// which is the base price itself.
#[must_use]
pub fn skirting_unit_price(base_price: f64, thickness_label: &str) -> f64 {
    base_price * SkirtingBand::for_thickness(thickness_label).fraction()
}

/// The two independent discounts of a quotation, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountData {
    /// Applied to the whole list price
    pub total_list_discount: f64,
    /// Applied to the depth / panel / hood / skirting subtotal
    pub depth_panel_discount: f64,
}

/// Per-section totals of a quotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionTotals {
    /// Depth groups
    pub depth: f64,
    /// Panel groups
    pub panel: f64,
    /// Hood panel groups
    pub hood: f64,
    /// Skirting
    pub skirting: f64,
    /// Sink
    pub sink: f64,
    /// Special edge detail
    pub special_detail: f64,
    /// Active labor services
    pub labor: f64,
}

impl SectionTotals {
    /// Sum of every section
    #[must_use]
    pub fn list_price(&self) -> f64 {
        self.depth + self.panel + self.hood + self.skirting + self.sink + self.special_detail + self.labor
    }

    /// Sections the second discount applies to
    #[must_use]
    pub fn depth_panel_total(&self) -> f64 {
        self.depth + self.panel + self.hood + self.skirting
    }
}

/// Price summary printed at the bottom of a quotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Sum of all sections
    pub list_price: f64,
    /// Depth / panel / hood / skirting subtotal
    pub depth_panel_total: f64,
    /// Amount taken off by the list discount
    pub list_discount_amount: f64,
    /// Amount taken off by the depth/panel discount
    pub depth_panel_discount_amount: f64,
    /// Price after discounts, before VAT
    pub final_price: f64,
    /// VAT on the final price
    pub vat: f64,
    /// Final price including VAT
    pub grand_total: f64,
}

/// `list × (1 − d1/100) − depth_panel × d2/100`, floored at 0
#[must_use]
pub fn final_price(list_price: f64, depth_panel_total: f64, list_discount: f64, depth_panel_discount: f64) -> f64 {
    let after_list = list_price * (1.0 - sanitize(list_discount) / 100.0);
    let after_depth_panel = after_list - depth_panel_total * (sanitize(depth_panel_discount) / 100.0);
    after_depth_panel.max(0.0)
}

/// Final price with VAT
#[must_use]
pub fn grand_total(final_price: f64) -> f64 {
    final_price * (1.0 + VAT_RATE)
}

/// Builds the price summary from section totals and discounts
#[must_use]
pub fn summarize(sections: &SectionTotals, discount: &DiscountData) -> PriceSummary {
    let list_price = sections.list_price();
    let depth_panel_total = sections.depth_panel_total();
    let final_price = final_price(
        list_price,
        depth_panel_total,
        discount.total_list_discount,
        discount.depth_panel_discount,
    );
    let grand_total = grand_total(final_price);

    PriceSummary {
        list_price,
        depth_panel_total,
        list_discount_amount: list_price * sanitize(discount.total_list_discount) / 100.0,
        depth_panel_discount_amount: depth_panel_total * sanitize(discount.depth_panel_discount) / 100.0,
        final_price,
        vat: grand_total - final_price,
        grand_total,
    }
}

/// Parses a locale-formatted price string. Unparseable input yields 0.
///
/// `"1.234,56"` → 1234.56, `"1,234.56"` → 1234.56, `"1.500"` → 1500,
/// `"₺ 2.000 TL"` → 2000.
#[must_use]
pub fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let canonical = match (last_comma, last_dot) {
        // both present: whichever comes last is the decimal separator
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => {
            if cleaned.matches(',').count() > 1 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (None, Some(d)) => {
            let decimals = cleaned.len() - d - 1;
            if cleaned.matches('.').count() > 1 || decimals == 3 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    canonical
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses user-typed numeric input; empty or partial input yields 0.
#[must_use]
pub fn coerce_input(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(sanitize)
        .unwrap_or(0.0)
}

struct CurrencyLocale {
    symbol: &'static str,
    prefix: bool,
    group: char,
    decimal: char,
}

fn locale_for(currency: &str) -> Option<CurrencyLocale> {
    let locale = match currency {
        "TRY" => CurrencyLocale { symbol: "₺", prefix: true, group: '.', decimal: ',' },
        "USD" => CurrencyLocale { symbol: "$", prefix: true, group: ',', decimal: '.' },
        "EUR" => CurrencyLocale { symbol: "€", prefix: false, group: '.', decimal: ',' },
        "GBP" => CurrencyLocale { symbol: "£", prefix: true, group: ',', decimal: '.' },
        _ => return None,
    };
    Some(locale)
}

/// Formats an amount in the locale matching `currency` (TRY → tr-TR, USD → en-US,
/// EUR → de-DE, GBP → en-GB). Unknown currencies format as TRY.
#[must_use]
pub fn format_price(amount: f64, currency: &str, decimals: usize) -> String {
    let locale = locale_for(currency).or_else(|| locale_for(QUOTE_CURRENCY));
    let Some(locale) = locale else {
        return format!("{amount:.decimals$}");
    };

    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(locale.group);
        }
        grouped.push(*ch);
    }
    if !frac_part.is_empty() {
        grouped.push(locale.decimal);
        grouped.push_str(frac_part);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };
    if locale.prefix {
        format!("{sign}{}{grouped}", locale.symbol)
    } else {
        format!("{sign}{grouped} {}", locale.symbol)
    }
}
