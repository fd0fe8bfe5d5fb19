//! Quotation form state.
//!
//! The form is a plain value. [`apply`] takes the current state, one [`Event`]
//! and the catalog, and returns the next state with every derived price
//! recomputed from scratch. Rejected events (unknown ids, group caps,
//! unavailable details) leave the input state untouched because the caller
//! still owns it.

use crate::config::Language;
use crate::core::catalog::{Catalog, Category, Color, Product};
use crate::core::options::{LABOR_SERVICES, SinkKind, SpecialDetailKind};
use crate::core::pricing::{
    self, DEFAULT_THICKNESS, DEKTON_BASELINE_DEPTH, DiscountData, PriceSummary, QUOTE_CURRENCY,
    STANDARD_BASELINE_DEPTH, SectionTotals, SkirtingBand,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Maximum number of depth groups
pub const MAX_DEPTH_GROUPS: usize = 5;
/// Maximum number of panel groups
pub const MAX_PANEL_GROUPS: usize = 3;
/// Maximum number of hood panel groups
pub const MAX_HOOD_GROUPS: usize = 3;

/// Customer block printed on the quotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    /// Customer's company
    pub company: String,
    /// Contact person
    pub customer: String,
    /// Architect or designer, if any
    pub architect: String,
    /// Quotation date; today when unset
    pub date: Option<NaiveDate>,
}

/// Countertop run priced per MTÜL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthGroup {
    /// Group id, unique within the quotation
    pub id: u32,
    /// Depth bucket label
    pub depth: String,
    /// Length in MTÜL
    pub measurement: f64,
    /// Derived
    pub unit_price: f64,
    /// Derived
    pub line_total: f64,
}

/// Wall panel or hood panel priced per m²
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelGroup {
    /// Group id, unique within the quotation
    pub id: u32,
    /// Area in m²
    pub measurement: f64,
    /// Derived
    pub unit_price: f64,
    /// Derived
    pub line_total: f64,
}

/// Skirting run; the band follows the selected thickness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkirtingData {
    /// Length in MTÜL
    pub measurement: f64,
    /// Derived from the thickness
    pub band: SkirtingBand,
    /// Derived
    pub unit_price: f64,
    /// Derived
    pub total: f64,
}

/// Sink selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkData {
    /// Installation type
    pub kind: SinkKind,
    /// Number of sinks
    pub quantity: u32,
    /// Derived
    pub unit_price: f64,
    /// Derived
    pub total: f64,
}

/// Special edge detail selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialDetailData {
    /// Detail type
    pub kind: SpecialDetailKind,
    /// Length in MTÜL
    pub measurement: f64,
    /// Derived
    pub unit_price: f64,
    /// Derived
    pub total: f64,
}

/// One row of the labor checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborServiceItem {
    /// Catalog name of the service
    pub name: String,
    /// Whether the service is included
    pub is_active: bool,
    /// Catalog price when active, 0 otherwise
    pub price: f64,
}

/// Form events
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Replaces the customer block
    SetCustomer(CustomerInfo),
    /// Switches the quotation language
    SetLanguage(Language),
    /// Selects a product by id
    SelectProduct(String),
    /// Selects a color by id, switching product if needed
    SelectColor(String),
    /// Selects a thickness label
    SetThickness(String),
    /// Appends a depth group at the baseline depth
    AddDepthGroup,
    /// Removes a depth group
    RemoveDepthGroup(u32),
    /// Changes the depth bucket of a group
    SetDepth {
        /// Group id
        id: u32,
        /// Depth label
        depth: String,
    },
    /// Changes a depth group's length
    SetDepthMeasurement {
        /// Group id
        id: u32,
        /// MTÜL
        measurement: f64,
    },
    /// Appends a panel group
    AddPanelGroup,
    /// Removes a panel group
    RemovePanelGroup(u32),
    /// Changes a panel group's area
    SetPanelMeasurement {
        /// Group id
        id: u32,
        /// m²
        measurement: f64,
    },
    /// Appends a hood panel group
    AddHoodGroup,
    /// Removes a hood panel group
    RemoveHoodGroup(u32),
    /// Changes a hood panel group's area
    SetHoodMeasurement {
        /// Group id
        id: u32,
        /// m²
        measurement: f64,
    },
    /// Sets the skirting length, `None` removes it
    SetSkirting {
        /// MTÜL
        measurement: Option<f64>,
    },
    /// Sets the sink, `None` removes it
    SetSink {
        /// Installation type
        kind: Option<SinkKind>,
        /// Number of sinks
        quantity: u32,
    },
    /// Sets the special detail, `None` removes it
    SetSpecialDetail {
        /// Detail type
        kind: Option<SpecialDetailKind>,
        /// MTÜL
        measurement: f64,
    },
    /// Flips a labor service on or off
    ToggleLabor(String),
    /// Replaces both discounts
    SetDiscount(DiscountData),
}

/// The quotation form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationState {
    /// Customer block
    pub customer: CustomerInfo,
    /// Output language
    pub language: Language,
    /// Currency for colors and products without one
    pub default_currency: String,
    /// Selected product
    pub product_id: Option<String>,
    /// Selected color
    pub color_id: Option<String>,
    /// Selected thickness label
    pub thickness: String,
    /// Depth groups
    pub depth_groups: Vec<DepthGroup>,
    /// Panel groups
    pub panel_groups: Vec<PanelGroup>,
    /// Hood panel groups
    pub hood_groups: Vec<PanelGroup>,
    /// Skirting
    pub skirting: Option<SkirtingData>,
    /// Sink
    pub sink: Option<SinkData>,
    /// Special edge detail
    pub special_detail: Option<SpecialDetailData>,
    /// Labor checklist
    pub labor: Vec<LaborServiceItem>,
    /// Discounts
    pub discount: DiscountData,
    /// Derived effective base price of the selected color
    pub base_price: f64,
    /// Derived section totals
    pub totals: SectionTotals,
    /// Derived summary
    pub summary: PriceSummary,
    next_group_id: u32,
}

impl Default for QuotationState {
    fn default() -> Self {
        Self::new(Language::default(), QUOTE_CURRENCY)
    }
}

impl QuotationState {
    /// Empty form with one depth group and the labor checklist switched off
    #[must_use]
    pub fn new(language: Language, default_currency: &str) -> Self {
        Self {
            customer: CustomerInfo::default(),
            language,
            default_currency: default_currency.to_string(),
            product_id: None,
            color_id: None,
            thickness: DEFAULT_THICKNESS.to_string(),
            depth_groups: vec![DepthGroup {
                id: 1,
                depth: STANDARD_BASELINE_DEPTH.to_string(),
                measurement: 0.0,
                unit_price: 0.0,
                line_total: 0.0,
            }],
            panel_groups: Vec::new(),
            hood_groups: Vec::new(),
            skirting: None,
            sink: None,
            special_detail: None,
            labor: LABOR_SERVICES
                .iter()
                .map(|name| LaborServiceItem {
                    name: (*name).to_string(),
                    is_active: false,
                    price: 0.0,
                })
                .collect(),
            discount: DiscountData::default(),
            base_price: 0.0,
            totals: SectionTotals::default(),
            summary: PriceSummary::default(),
            next_group_id: 2,
        }
    }

    /// Selected product, if it is still in the catalog
    #[must_use]
    pub fn product<'a>(&self, catalog: &'a Catalog) -> Option<&'a Product> {
        self.product_id.as_deref().and_then(|id| catalog.product(id))
    }

    /// Selected color, if it is still in the catalog
    #[must_use]
    pub fn color<'a>(&self, catalog: &'a Catalog) -> Option<&'a Color> {
        self.color_id.as_deref().and_then(|id| catalog.color(id))
    }

    /// Category of the selected product
    #[must_use]
    pub fn category(&self, catalog: &Catalog) -> Option<Category> {
        self.product(catalog).and_then(|p| p.category)
    }

    /// Depth labels offered for the selected product
    #[must_use]
    pub fn depth_options(&self, catalog: &Catalog) -> Vec<&'static str> {
        pricing::depth_options(self.product(catalog).is_some_and(Product::is_dekton))
    }

    /// Special details offered for the selected product
    #[must_use]
    pub fn available_special_details(&self, catalog: &Catalog) -> Vec<SpecialDetailKind> {
        SpecialDetailKind::available_for(self.category(catalog))
    }

    fn take_group_id(&mut self) -> u32 {
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    /// Freezes the form into an export snapshot with a fresh id and timestamp.
    #[must_use]
    pub fn snapshot(&self, catalog: &Catalog) -> QuotationData {
        self.snapshot_with(catalog, generate_quotation_id(), Local::now())
    }

    /// Freezes the form with an explicit id and timestamp.
    #[must_use]
    pub fn snapshot_with(&self, catalog: &Catalog, id: String, created_at: DateTime<Local>) -> QuotationData {
        let product = self.product(catalog);
        let color = self.color(catalog);
        QuotationData {
            id,
            created_at,
            date: self.customer.date.unwrap_or_else(|| created_at.date_naive()),
            language: self.language,
            customer: self.customer.clone(),
            product_name: product.map(|p| p.name.clone()),
            category: product.and_then(|p| p.category),
            color_name: color.map(|c| c.name.clone()),
            currency: QUOTE_CURRENCY.to_string(),
            thickness: self.thickness.clone(),
            base_price: self.base_price,
            depth_groups: self.depth_groups.clone(),
            panel_groups: self.panel_groups.clone(),
            hood_groups: self.hood_groups.clone(),
            skirting: self.skirting.clone(),
            sink: self.sink.clone(),
            special_detail: self.special_detail.clone(),
            labor: self.labor.iter().filter(|l| l.is_active).cloned().collect(),
            discount: self.discount,
            totals: self.totals,
            summary: self.summary,
        }
    }
}

/// Export-time snapshot of a quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationData {
    /// Quotation id, also encoded in the barcode
    pub id: String,
    /// Export time
    pub created_at: DateTime<Local>,
    /// Date printed on the quotation
    pub date: NaiveDate,
    /// Output language
    pub language: Language,
    /// Customer block
    pub customer: CustomerInfo,
    /// Selected product
    pub product_name: Option<String>,
    /// Selected product's category
    pub category: Option<Category>,
    /// Selected color
    pub color_name: Option<String>,
    /// Currency of every amount
    pub currency: String,
    /// Thickness label
    pub thickness: String,
    /// Effective base price
    pub base_price: f64,
    /// Depth groups
    pub depth_groups: Vec<DepthGroup>,
    /// Panel groups
    pub panel_groups: Vec<PanelGroup>,
    /// Hood panel groups
    pub hood_groups: Vec<PanelGroup>,
    /// Skirting
    pub skirting: Option<SkirtingData>,
    /// Sink
    pub sink: Option<SinkData>,
    /// Special detail
    pub special_detail: Option<SpecialDetailData>,
    /// Active labor services only
    pub labor: Vec<LaborServiceItem>,
    /// Discounts
    pub discount: DiscountData,
    /// Section totals
    pub totals: SectionTotals,
    /// Summary
    pub summary: PriceSummary,
}

/// Eight uppercase hex digits, safe for Code 39
#[must_use]
pub fn generate_quotation_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple.chars().take(8).collect::<String>().to_ascii_uppercase()
}

/// Applies one event and recomputes every derived price.
pub fn apply(state: &QuotationState, event: Event, catalog: &Catalog) -> Result<QuotationState> {
    let mut next = state.clone();
    debug!("Applying form event {:?}", event);

    match event {
        Event::SetCustomer(customer) => next.customer = customer,
        Event::SetLanguage(language) => next.language = language,
        Event::SelectProduct(id) => select_product(&mut next, &id, catalog)?,
        Event::SelectColor(id) => {
            let color = catalog
                .color(&id)
                .ok_or_else(|| Error::ColorNotFound { id: id.clone() })?;
            if next.product_id.as_deref() != Some(color.product_id.as_str()) {
                select_product(&mut next, &color.product_id, catalog)?;
            }
            next.color_id = Some(id);
            next.thickness = DEFAULT_THICKNESS.to_string();
        }
        Event::SetThickness(label) => next.thickness = label,

        Event::AddDepthGroup => {
            ensure_capacity("depth", next.depth_groups.len(), MAX_DEPTH_GROUPS)?;
            let id = next.take_group_id();
            let depth = baseline_depth(next.product(catalog)).to_string();
            next.depth_groups.push(DepthGroup {
                id,
                depth,
                measurement: 0.0,
                unit_price: 0.0,
                line_total: 0.0,
            });
        }
        Event::RemoveDepthGroup(id) => {
            let index = position(&next.depth_groups, id, |g| g.id)?;
            next.depth_groups.remove(index);
        }
        Event::SetDepth { id, depth } => {
            let index = position(&next.depth_groups, id, |g| g.id)?;
            next.depth_groups[index].depth = depth;
        }
        Event::SetDepthMeasurement { id, measurement } => {
            let index = position(&next.depth_groups, id, |g| g.id)?;
            next.depth_groups[index].measurement = pricing::sanitize(measurement);
        }

        Event::AddPanelGroup => {
            ensure_capacity("panel", next.panel_groups.len(), MAX_PANEL_GROUPS)?;
            let id = next.take_group_id();
            next.panel_groups.push(empty_panel(id));
        }
        Event::RemovePanelGroup(id) => {
            let index = position(&next.panel_groups, id, |g| g.id)?;
            next.panel_groups.remove(index);
        }
        Event::SetPanelMeasurement { id, measurement } => {
            let index = position(&next.panel_groups, id, |g| g.id)?;
            next.panel_groups[index].measurement = pricing::sanitize(measurement);
        }

        Event::AddHoodGroup => {
            ensure_capacity("hood panel", next.hood_groups.len(), MAX_HOOD_GROUPS)?;
            let id = next.take_group_id();
            next.hood_groups.push(empty_panel(id));
        }
        Event::RemoveHoodGroup(id) => {
            let index = position(&next.hood_groups, id, |g| g.id)?;
            next.hood_groups.remove(index);
        }
        Event::SetHoodMeasurement { id, measurement } => {
            let index = position(&next.hood_groups, id, |g| g.id)?;
            next.hood_groups[index].measurement = pricing::sanitize(measurement);
        }

        Event::SetSkirting { measurement } => {
            next.skirting = measurement.map(|m| SkirtingData {
                measurement: pricing::sanitize(m),
                band: SkirtingBand::UpTo5,
                unit_price: 0.0,
                total: 0.0,
            });
        }
        Event::SetSink { kind, quantity } => {
            next.sink = kind.filter(|_| quantity > 0).map(|kind| SinkData {
                kind,
                quantity,
                unit_price: 0.0,
                total: 0.0,
            });
        }
        Event::SetSpecialDetail { kind, measurement } => {
            if let Some(kind) = kind
                && !kind.is_available_for(next.category(catalog))
            {
                return Err(Error::DetailUnavailable {
                    name: kind.label(Language::En).to_string(),
                });
            }
            next.special_detail = kind.map(|kind| SpecialDetailData {
                kind,
                measurement: pricing::sanitize(measurement),
                unit_price: 0.0,
                total: 0.0,
            });
        }
        Event::ToggleLabor(name) => {
            let item = next
                .labor
                .iter_mut()
                .find(|l| l.name == name)
                .ok_or_else(|| Error::LaborNotFound { name: name.clone() })?;
            item.is_active = !item.is_active;
        }
        Event::SetDiscount(discount) => {
            next.discount = DiscountData {
                total_list_discount: pricing::sanitize(discount.total_list_discount),
                depth_panel_discount: pricing::sanitize(discount.depth_panel_discount),
            };
        }
    }

    recompute(&mut next, catalog);
    Ok(next)
}

/// Applies events in order, stopping at the first rejected one.
pub fn apply_all<I>(state: &QuotationState, events: I, catalog: &Catalog) -> Result<QuotationState>
where
    I: IntoIterator<Item = Event>,
{
    events
        .into_iter()
        .try_fold(state.clone(), |current, event| apply(&current, event, catalog))
}

fn select_product(state: &mut QuotationState, id: &str, catalog: &Catalog) -> Result<()> {
    let product = catalog
        .product(id)
        .ok_or_else(|| Error::ProductNotFound { id: id.to_string() })?;

    let color_belongs = state
        .color(catalog)
        .is_some_and(|c| c.product_id == product.id);
    if !color_belongs {
        state.color_id = None;
    }
    state.product_id = Some(product.id.clone());
    state.thickness = DEFAULT_THICKNESS.to_string();

    let (from, to) = if product.is_dekton() {
        (STANDARD_BASELINE_DEPTH, DEKTON_BASELINE_DEPTH)
    } else {
        (DEKTON_BASELINE_DEPTH, STANDARD_BASELINE_DEPTH)
    };
    for group in &mut state.depth_groups {
        if group.depth == from {
            group.depth = to.to_string();
        }
    }

    if state
        .special_detail
        .as_ref()
        .is_some_and(|d| !d.kind.is_available_for(product.category))
    {
        debug!("Dropping special detail not offered for {}", product.name);
        state.special_detail = None;
    }
    Ok(())
}

fn recompute(state: &mut QuotationState, catalog: &Catalog) {
    let product = state.product(catalog);
    let category = product.and_then(|p| p.category);
    let base = state
        .color(catalog)
        .map_or(0.0, |c| pricing::effective_base_price(c, product, &state.default_currency));
    state.base_price = base;

    let thickness = state.thickness.clone();
    for group in &mut state.depth_groups {
        group.unit_price = pricing::depth_unit_price(base, &group.depth, &thickness);
        group.line_total = pricing::line_total(group.measurement, group.unit_price);
    }
    let panel_unit = pricing::panel_unit_price(base);
    for group in state.panel_groups.iter_mut().chain(state.hood_groups.iter_mut()) {
        group.unit_price = panel_unit;
        group.line_total = pricing::line_total(group.measurement, panel_unit);
    }
    if let Some(skirting) = &mut state.skirting {
        skirting.band = SkirtingBand::for_thickness(&thickness);
        skirting.unit_price = pricing::skirting_unit_price(base, &thickness);
        skirting.total = pricing::line_total(skirting.measurement, skirting.unit_price);
    }
    if let Some(sink) = &mut state.sink {
        sink.unit_price = sink.kind.price(category);
        sink.total = sink.unit_price * f64::from(sink.quantity);
    }
    if let Some(detail) = &mut state.special_detail {
        detail.unit_price = detail.kind.price(category);
        detail.total = pricing::line_total(detail.measurement, detail.unit_price);
    }
    for item in &mut state.labor {
        item.price = if item.is_active {
            catalog.labor_price(&item.name).unwrap_or(0.0)
        } else {
            0.0
        };
    }

    state.totals = SectionTotals {
        depth: state.depth_groups.iter().map(|g| g.line_total).sum(),
        panel: state.panel_groups.iter().map(|g| g.line_total).sum(),
        hood: state.hood_groups.iter().map(|g| g.line_total).sum(),
        skirting: state.skirting.as_ref().map_or(0.0, |s| s.total),
        sink: state.sink.as_ref().map_or(0.0, |s| s.total),
        special_detail: state.special_detail.as_ref().map_or(0.0, |d| d.total),
        labor: state.labor.iter().map(|l| l.price).sum(),
    };
    state.summary = pricing::summarize(&state.totals, &state.discount);
}

fn baseline_depth(product: Option<&Product>) -> &'static str {
    if product.is_some_and(Product::is_dekton) {
        DEKTON_BASELINE_DEPTH
    } else {
        STANDARD_BASELINE_DEPTH
    }
}

const fn empty_panel(id: u32) -> PanelGroup {
    PanelGroup {
        id,
        measurement: 0.0,
        unit_price: 0.0,
        line_total: 0.0,
    }
}

fn ensure_capacity(kind: &'static str, len: usize, max: usize) -> Result<()> {
    if len >= max {
        return Err(Error::GroupLimit { kind, max });
    }
    Ok(())
}

fn position<T>(groups: &[T], id: u32, group_id: impl Fn(&T) -> u32) -> Result<usize> {
    groups
        .iter()
        .position(|g| group_id(g) == id)
        .ok_or(Error::GroupNotFound { id })
}
