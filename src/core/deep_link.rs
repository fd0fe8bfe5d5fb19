//! Deep links into the quotation form.
//!
//! The price list links each color to `?product=<id>&color=<id>&source=price-list`.
//! Opening such a link preselects the product and color. Ids that are no longer
//! in the catalog are skipped with a warning instead of failing the whole link.

use crate::core::catalog::Catalog;
use crate::core::quotation::{Event, QuotationState, apply};
use crate::errors::{Error, Result};
use reqwest::Url;
use tracing::warn;

/// `source` value set by the price list
pub const PRICE_LIST_SOURCE: &str = "price-list";

/// Parsed deep link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLink {
    /// Product to preselect
    pub product: Option<String>,
    /// Color to preselect
    pub color: Option<String>,
    /// Value of the `source` parameter
    pub source: Option<String>,
}

impl DeepLink {
    /// Link for one price list row
    #[must_use]
    pub fn to_color(product_id: &str, color_id: &str) -> Self {
        Self {
            product: Some(product_id.to_string()),
            color: Some(color_id.to_string()),
            source: Some(PRICE_LIST_SOURCE.to_string()),
        }
    }

    /// Parses a full URL or a bare query string (with or without the `?`).
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = if input.contains("://") {
            Url::parse(input)
        } else {
            let query = input.trim_start_matches('?');
            Url::parse(&format!("stone-quote://form/?{query}"))
        }
        .map_err(|e| Error::Config {
            message: format!("invalid deep link '{input}': {e}"),
        })?;

        let mut link = Self::default();
        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "product" => link.product = Some(value.to_string()),
                "color" => link.color = Some(value.to_string()),
                "source" => link.source = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(link)
    }

    /// Whether the link came from the price list
    #[must_use]
    pub fn from_price_list(&self) -> bool {
        self.source.as_deref() == Some(PRICE_LIST_SOURCE)
    }

    /// Query string form, `?product=..&color=..&source=..`
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut url = match Url::parse("stone-quote://form/") {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in [
                ("product", &self.product),
                ("color", &self.color),
                ("source", &self.source),
            ] {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        url.query().map(|q| format!("?{q}")).unwrap_or_default()
    }

    /// Form events for this link, product first
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.product
            .iter()
            .map(|id| Event::SelectProduct(id.clone()))
            .chain(self.color.iter().map(|id| Event::SelectColor(id.clone())))
            .collect()
    }

    /// Applies the link to a form, skipping ids the catalog does not know.
    #[must_use]
    pub fn apply_to(&self, state: &QuotationState, catalog: &Catalog) -> QuotationState {
        self.events()
            .into_iter()
            .fold(state.clone(), |current, event| match apply(&current, event, catalog) {
                Ok(next) => next,
                Err(e) => {
                    warn!("Ignoring deep link selection: {}", e);
                    current
                }
            })
    }
}
