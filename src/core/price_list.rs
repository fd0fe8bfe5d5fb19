//! Read-only price list.
//!
//! One section per stone product, one row per color. Rows carry the unit
//! prices a quotation would use at the default thickness, so the list and the
//! form can never disagree.

use crate::core::catalog::{Catalog, Category};
use crate::core::deep_link::DeepLink;
use crate::core::pricing::{self, DEFAULT_THICKNESS, SkirtingBand};
use serde::Serialize;

/// Unit price for one depth bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthPrice {
    /// Depth label
    pub label: &'static str,
    /// Price per MTÜL
    pub unit_price: f64,
}

/// Price list row for one color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceListEntry {
    /// Color id
    pub color_id: String,
    /// Color name
    pub color_name: String,
    /// Effective base price
    pub base_price: f64,
    /// Per depth bucket, baseline first
    pub depth_prices: Vec<DepthPrice>,
    /// Panel and hood panel price per m²
    pub panel_price: f64,
    /// Skirting price per MTÜL for each band
    pub skirting_prices: Vec<(SkirtingBand, f64)>,
    /// Link into the form with this color selected
    pub link: String,
}

/// Price list section for one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceListSection {
    /// Product id
    pub product_id: String,
    /// Product name
    pub product_name: String,
    /// Product category
    pub category: Option<Category>,
    /// Depth labels in column order
    pub depth_labels: Vec<&'static str>,
    /// Rows
    pub entries: Vec<PriceListEntry>,
}

const SKIRTING_BANDS: [(SkirtingBand, &str); 4] = [
    (SkirtingBand::UpTo5, "h:4 cm"),
    (SkirtingBand::UpTo10, "h:5-10 cm"),
    (SkirtingBand::UpTo15, "h:11-15 cm"),
    (SkirtingBand::Full, "h:16-20 cm"),
];

/// Builds the price list. Labor products and products without colors are left out.
#[must_use]
pub fn build_price_list(catalog: &Catalog, default_currency: &str) -> Vec<PriceListSection> {
    catalog
        .stone_products()
        .filter_map(|product| {
            let depth_labels = pricing::depth_options(product.is_dekton());
            let entries: Vec<PriceListEntry> = catalog
                .colors_for(&product.id)
                .map(|color| {
                    let base = pricing::effective_base_price(color, Some(product), default_currency);
                    PriceListEntry {
                        color_id: color.id.clone(),
                        color_name: color.name.clone(),
                        base_price: base,
                        depth_prices: depth_labels
                            .iter()
                            .map(|&label| DepthPrice {
                                label,
                                unit_price: pricing::depth_unit_price(base, label, DEFAULT_THICKNESS),
                            })
                            .collect(),
                        panel_price: pricing::panel_unit_price(base),
                        skirting_prices: SKIRTING_BANDS
                            .iter()
                            .map(|(band, thickness)| (*band, pricing::skirting_unit_price(base, thickness)))
                            .collect(),
                        link: DeepLink::to_color(&product.id, &color.id).to_query(),
                    }
                })
                .collect();

            (!entries.is_empty()).then(|| PriceListSection {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                category: product.category,
                depth_labels,
                entries,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pricing::{DEKTON_BASELINE_DEPTH, STANDARD_BASELINE_DEPTH};
    use crate::test_utils::{assert_close, sample_catalog};

    #[test]
    fn test_sections_skip_labor() {
        let sections = build_price_list(&sample_catalog(), "TRY");
        let ids: Vec<&str> = sections.iter().map(|s| s.product_id.as_str()).collect();
        assert_eq!(ids, vec!["belenco", "dekton"]);
    }

    #[test]
    fn test_entry_prices_match_pricing_engine() {
        let sections = build_price_list(&sample_catalog(), "TRY");
        let belenco = &sections[0];
        assert_eq!(belenco.depth_labels[0], STANDARD_BASELINE_DEPTH);
        let snow = &belenco.entries[0];
        assert_close(snow.base_price, 1_000.0);
        assert_close(snow.depth_prices[0].unit_price, 1_000.0);
        let ninety = snow.depth_prices.iter().find(|d| d.label == "90 cm");
        assert_close(ninety.map_or(0.0, |d| d.unit_price), 2_000.0);
        assert_close(snow.panel_price, 1_250.0);
        assert_eq!(snow.skirting_prices.len(), 4);
        assert_close(snow.skirting_prices[3].1, 1_000.0);
        assert!(snow.link.contains("source=price-list"));

        let dekton = &sections[1];
        assert_eq!(dekton.depth_labels[0], DEKTON_BASELINE_DEPTH);
        assert_close(dekton.entries[0].base_price, 57_600.0);
    }

    #[test]
    fn test_empty_catalog() {
        assert!(build_price_list(&Catalog::default(), "TRY").is_empty());
    }
}
