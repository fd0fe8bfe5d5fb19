//! Quotation requests.
//!
//! A request is a TOML file describing one quotation the way a salesperson
//! would fill in the form. It is replayed through the form reducer, so every
//! rule of the form (group caps, category gating, clamping) applies to it too.
//!
//! ```toml
//! language = "en"
//! labor = ["Montaj", "Nakliye"]
//! skirting = 3.2
//!
//! [customer]
//! company = "Atölye Mimarlık"
//! customer = "Ayşe Yılmaz"
//!
//! [selection]
//! product = "belenco"
//! color = "belenco-snow"
//! thickness = "h:4 cm"
//!
//! [[depth]]
//! depth = "65 cm'e kadar"
//! measurement = 4.2
//!
//! [sink]
//! kind = "undermount"
//!
//! [discount]
//! total_list_discount = 10
//! ```

use crate::config::Language;
use crate::core::catalog::Catalog;
use crate::core::deep_link::DeepLink;
use crate::core::options::{SinkKind, SpecialDetailKind};
use crate::core::pricing::DiscountData;
use crate::core::quotation::{CustomerInfo, Event, QuotationState, apply};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Product / color / thickness selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    /// Product id
    pub product: Option<String>,
    /// Color id
    pub color: Option<String>,
    /// Thickness label
    pub thickness: Option<String>,
    /// Deep link, applied before `product` / `color`
    pub link: Option<String>,
}

/// One depth group
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepthRequest {
    /// Depth label; the product baseline when omitted
    pub depth: Option<String>,
    /// MTÜL
    pub measurement: f64,
}

/// One panel or hood panel group
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AreaRequest {
    /// m²
    pub measurement: f64,
}

/// Sink selection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SinkRequest {
    /// Sink type name (Turkish, English, or variant name)
    pub kind: String,
    /// Number of sinks
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Special detail selection
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpecialDetailRequest {
    /// Detail name (Turkish, English, or variant name)
    pub kind: String,
    /// MTÜL
    pub measurement: f64,
}

/// A complete quotation request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuotationRequest {
    /// Output language; the stored preference when omitted
    pub language: Option<Language>,
    /// Customer block
    pub customer: CustomerInfo,
    /// Product selection
    pub selection: SelectionRequest,
    /// Depth groups in order
    pub depth: Vec<DepthRequest>,
    /// Panel groups
    pub panel: Vec<AreaRequest>,
    /// Hood panel groups
    pub hood: Vec<AreaRequest>,
    /// Skirting length
    pub skirting: Option<f64>,
    /// Sink
    pub sink: Option<SinkRequest>,
    /// Special detail
    pub special_detail: Option<SpecialDetailRequest>,
    /// Labor services to switch on
    pub labor: Vec<String>,
    /// Discounts
    pub discount: DiscountData,
}

/// Reads a request file.
pub fn load_request(path: &Path) -> Result<QuotationRequest> {
    let content = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read quotation request {}: {}", path.display(), e),
    })?;
    parse_request(&content)
}

/// Parses request TOML.
pub fn parse_request(content: &str) -> Result<QuotationRequest> {
    toml::from_str(content).map_err(|e| Error::Config {
        message: format!("Invalid quotation request: {e}"),
    })
}

impl QuotationRequest {
    /// Replays the request on top of `state`.
    pub fn build(&self, state: &QuotationState, catalog: &Catalog) -> Result<QuotationState> {
        let mut state = state.clone();
        let step = |state: &mut QuotationState, event: Event| -> Result<()> {
            *state = apply(state, event, catalog)?;
            Ok(())
        };

        if let Some(language) = self.language {
            step(&mut state, Event::SetLanguage(language))?;
        }
        step(&mut state, Event::SetCustomer(self.customer.clone()))?;

        if let Some(link) = &self.selection.link {
            state = DeepLink::parse(link)?.apply_to(&state, catalog);
        }
        if let Some(product) = &self.selection.product {
            step(&mut state, Event::SelectProduct(product.clone()))?;
        }
        if let Some(color) = &self.selection.color {
            step(&mut state, Event::SelectColor(color.clone()))?;
        }
        if let Some(thickness) = &self.selection.thickness {
            step(&mut state, Event::SetThickness(thickness.clone()))?;
        }

        for (index, depth) in self.depth.iter().enumerate() {
            // the form starts with one depth group
            if index >= state.depth_groups.len() {
                step(&mut state, Event::AddDepthGroup)?;
            }
            let id = state.depth_groups[index].id;
            if let Some(label) = &depth.depth {
                step(&mut state, Event::SetDepth { id, depth: label.clone() })?;
            }
            step(
                &mut state,
                Event::SetDepthMeasurement {
                    id,
                    measurement: depth.measurement,
                },
            )?;
        }

        for panel in &self.panel {
            step(&mut state, Event::AddPanelGroup)?;
            let id = last_id(state.panel_groups.iter().map(|g| g.id))?;
            step(
                &mut state,
                Event::SetPanelMeasurement {
                    id,
                    measurement: panel.measurement,
                },
            )?;
        }
        for hood in &self.hood {
            step(&mut state, Event::AddHoodGroup)?;
            let id = last_id(state.hood_groups.iter().map(|g| g.id))?;
            step(
                &mut state,
                Event::SetHoodMeasurement {
                    id,
                    measurement: hood.measurement,
                },
            )?;
        }

        if let Some(measurement) = self.skirting {
            step(&mut state, Event::SetSkirting { measurement: Some(measurement) })?;
        }
        if let Some(sink) = &self.sink {
            let kind = SinkKind::parse(&sink.kind).ok_or_else(|| Error::Config {
                message: format!("Unknown sink type '{}'", sink.kind),
            })?;
            step(
                &mut state,
                Event::SetSink {
                    kind: Some(kind),
                    quantity: sink.quantity,
                },
            )?;
        }
        if let Some(detail) = &self.special_detail {
            let kind = SpecialDetailKind::parse(&detail.kind).ok_or_else(|| Error::Config {
                message: format!("Unknown special detail '{}'", detail.kind),
            })?;
            step(
                &mut state,
                Event::SetSpecialDetail {
                    kind: Some(kind),
                    measurement: detail.measurement,
                },
            )?;
        }
        for name in &self.labor {
            let already_on = state.labor.iter().any(|l| &l.name == name && l.is_active);
            if !already_on {
                step(&mut state, Event::ToggleLabor(name.clone()))?;
            }
        }
        step(&mut state, Event::SetDiscount(self.discount))?;

        info!(
            "Quotation request applied: {} depth, {} panel, {} hood groups",
            state.depth_groups.len(),
            state.panel_groups.len(),
            state.hood_groups.len()
        );
        Ok(state)
    }
}

fn last_id(ids: impl Iterator<Item = u32>) -> Result<u32> {
    ids.last().ok_or(Error::GroupNotFound { id: 0 })
}
