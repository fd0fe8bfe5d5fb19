//! Document content: what goes on the quotation and price list pages, in
//! which order. Sections without content are skipped, except the header,
//! summary, notes and footer, which always print.

use crate::config::{CompanyConfig, Language};
use crate::core::options::labor_label;
use crate::core::price_list::PriceListSection;
use crate::core::pricing::format_price;
use crate::core::quotation::{PanelGroup, QuotationData};
use crate::export::barcode;
use crate::export::labels::{Label, category_name, legal_notes};
use crate::export::layout::{MARGIN_MM, Measure, PAGE_WIDTH_MM, Pen, Surface, Weight};
use chrono::NaiveDate;
use tracing::warn;

const X_LABEL: f32 = MARGIN_MM;
const X_VALUE: f32 = 58.0;
const X_INDEX: f32 = MARGIN_MM;
const X_NAME: f32 = 20.0;
const X_MEASURE: f32 = 95.0;
const X_UNIT: f32 = 125.0;
const X_TOTAL: f32 = 160.0;

const BARCODE_WIDTH_MM: f32 = 60.0;
const BARCODE_HEIGHT_MM: f32 = 11.0;

const TITLE_PT: f32 = 13.0;
const LOGO_PT: f32 = 18.0;
const HEADING_PT: f32 = 11.0;
const BODY_PT: f32 = 9.0;
const TABLE_PT: f32 = 8.5;
const NOTE_PT: f32 = 7.5;
const FOOTER_PT: f32 = 8.0;

/// Everything the quotation page needs
#[derive(Debug, Clone, Copy)]
pub struct QuotationPage<'a> {
    /// Frozen quotation
    pub snapshot: &'a QuotationData,
    /// Company block for the header and footer
    pub company: &'a CompanyConfig,
    /// Output language
    pub language: Language,
}

/// Everything the price list page needs
#[derive(Debug, Clone, Copy)]
pub struct PriceListPage<'a> {
    /// Sections in print order
    pub sections: &'a [PriceListSection],
    /// Company block for the header and footer
    pub company: &'a CompanyConfig,
    /// Output language
    pub language: Language,
    /// Date printed in the header
    pub date: NaiveDate,
    /// Currency of every amount
    pub currency: &'a str,
}

/// Natural height of the quotation in millimetres at scale 1.
#[must_use]
pub fn estimate_height(snapshot: &QuotationData) -> f32 {
    let company = CompanyConfig::default();
    let page = QuotationPage {
        snapshot,
        company: &company,
        language: snapshot.language,
    };
    let mut measure = Measure;
    let mut pen = Pen::new(&mut measure, 1.0);
    draw_quotation(&mut pen, &page);
    pen.used()
}

/// Natural height of the price list in millimetres at scale 1.
#[must_use]
pub fn estimate_price_list_height(sections: &[PriceListSection], currency: &str) -> f32 {
    let company = CompanyConfig::default();
    let page = PriceListPage {
        sections,
        company: &company,
        language: Language::Tr,
        date: NaiveDate::default(),
        currency,
    };
    let mut measure = Measure;
    let mut pen = Pen::new(&mut measure, 1.0);
    draw_price_list(&mut pen, &page);
    pen.used()
}

fn heading<S: Surface>(pen: &mut Pen<'_, S>, text: &str) {
    pen.gap(2.0);
    pen.row(&[(X_LABEL, text)], HEADING_PT, Weight::Bold);
}

fn field<S: Surface>(pen: &mut Pen<'_, S>, label: Label, value: &str, language: Language) {
    pen.row(
        &[(X_LABEL, label.text(language)), (X_VALUE, value)],
        BODY_PT,
        Weight::Regular,
    );
}

fn percent(value: f64, language: Language) -> String {
    let number = if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    };
    match language {
        Language::Tr => format!("%{number}"),
        Language::En => format!("{number}%"),
    }
}

fn format_date(date: NaiveDate, language: Language) -> String {
    match language {
        Language::Tr => date.format("%d.%m.%Y").to_string(),
        Language::En => date.format("%d/%m/%Y").to_string(),
    }
}

fn draw_header<S: Surface>(pen: &mut Pen<'_, S>, company: &CompanyConfig, title: &str, meta: &str, code: Option<&str>) {
    if let Some(code) = code {
        match barcode::encode(code) {
            Some((bars, width)) => {
                let module = BARCODE_WIDTH_MM / width;
                let bars: Vec<(f32, f32)> = bars
                    .iter()
                    .map(|bar| (bar.offset * module, bar.width * module))
                    .collect();
                pen.bars(PAGE_WIDTH_MM - MARGIN_MM - BARCODE_WIDTH_MM, &bars, BARCODE_HEIGHT_MM);
            }
            None => warn!("Quotation id {:?} cannot be encoded as Code 39", code),
        }
    }
    pen.row(&[(X_LABEL, company.name.as_str())], LOGO_PT, Weight::Bold);
    pen.row(&[(X_LABEL, title)], TITLE_PT, Weight::Bold);
    pen.row(&[(X_LABEL, meta)], BODY_PT, Weight::Regular);
    pen.rule();
}

fn draw_footer<S: Surface>(pen: &mut Pen<'_, S>, company: &CompanyConfig) {
    pen.rule();
    let first = [company.name.as_str(), company.address.as_str()]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    let second = [company.phone.as_str(), company.email.as_str(), company.website.as_str()]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    pen.row(&[(X_LABEL, &first)], FOOTER_PT, Weight::Regular);
    pen.row(&[(X_LABEL, &second)], FOOTER_PT, Weight::Regular);
}

/// Draws the quotation.
pub fn draw_quotation<S: Surface>(pen: &mut Pen<'_, S>, page: &QuotationPage<'_>) {
    let q = page.snapshot;
    let lang = page.language;
    let money = |amount: f64| format_price(amount, &q.currency, 2);

    let meta = format!(
        "{}: {}    {}: {}",
        Label::QuotationNo.text(lang),
        q.id,
        Label::Date.text(lang),
        format_date(q.date, lang)
    );
    draw_header(pen, page.company, Label::QuotationTitle.text(lang), &meta, Some(&q.id));
    draw_customer(pen, q, lang);
    draw_product(pen, q, &money, lang);
    draw_depth_table(pen, q, &money, lang);
    draw_panel_table(pen, Label::PanelTable, &q.panel_groups, q.totals.panel, &money, lang);
    draw_panel_table(pen, Label::HoodTable, &q.hood_groups, q.totals.hood, &money, lang);
    draw_services(pen, q, &money, lang);

    if !q.labor.is_empty() {
        heading(pen, Label::Labor.text(lang));
        for item in &q.labor {
            pen.row(
                &[(X_NAME, labor_label(&item.name, lang)), (X_TOTAL, &money(item.price))],
                BODY_PT,
                Weight::Regular,
            );
        }
    }

    draw_discounts(pen, q, &money, lang);
    draw_summary(pen, q, &money, lang);

    pen.gap(3.0);
    pen.row(&[(X_LABEL, Label::Notes.text(lang))], BODY_PT, Weight::Bold);
    for note in legal_notes(lang) {
        pen.row(&[(X_LABEL, note)], NOTE_PT, Weight::Regular);
    }

    draw_footer(pen, page.company);
}

fn draw_customer<S: Surface>(pen: &mut Pen<'_, S>, q: &QuotationData, lang: Language) {
    let customer = [
        (Label::Company, &q.customer.company),
        (Label::Customer, &q.customer.customer),
        (Label::Architect, &q.customer.architect),
    ];
    if customer.iter().all(|(_, value)| value.trim().is_empty()) {
        return;
    }
    heading(pen, Label::CustomerSection.text(lang));
    for (label, value) in customer {
        if !value.trim().is_empty() {
            field(pen, label, value, lang);
        }
    }
}

fn draw_product<S: Surface>(pen: &mut Pen<'_, S>, q: &QuotationData, money: &dyn Fn(f64) -> String, lang: Language) {
    let Some(product) = &q.product_name else {
        return;
    };
    heading(pen, Label::ProductSection.text(lang));
    field(pen, Label::Product, product, lang);
    if let Some(color) = &q.color_name {
        field(pen, Label::Color, color, lang);
    }
    if let Some(category) = q.category {
        field(pen, Label::Category, category_name(category, lang), lang);
    }
    field(pen, Label::Thickness, &q.thickness, lang);
    field(pen, Label::BasePrice, &money(q.base_price), lang);
}

fn draw_depth_table<S: Surface>(pen: &mut Pen<'_, S>, q: &QuotationData, money: &dyn Fn(f64) -> String, lang: Language) {
    let rows: Vec<_> = q.depth_groups.iter().filter(|g| g.measurement > 0.0).collect();
    if rows.is_empty() {
        return;
    }
    heading(pen, Label::DepthTable.text(lang));
    pen.row(
        &[
            (X_INDEX, "#"),
            (X_NAME, Label::Depth.text(lang)),
            (X_MEASURE, Label::Mtul.text(lang)),
            (X_UNIT, Label::UnitPrice.text(lang)),
            (X_TOTAL, Label::Total.text(lang)),
        ],
        TABLE_PT,
        Weight::Bold,
    );
    for (i, group) in rows.iter().enumerate() {
        pen.row(
            &[
                (X_INDEX, &(i + 1).to_string()),
                (X_NAME, &group.depth),
                (X_MEASURE, &format!("{:.2}", group.measurement)),
                (X_UNIT, &money(group.unit_price)),
                (X_TOTAL, &money(group.line_total)),
            ],
            TABLE_PT,
            Weight::Regular,
        );
    }
    subtotal(pen, &money(q.totals.depth), lang);
}

fn draw_services<S: Surface>(pen: &mut Pen<'_, S>, q: &QuotationData, money: &dyn Fn(f64) -> String, lang: Language) {
    if q.skirting.is_none() && q.sink.is_none() && q.special_detail.is_none() {
        return;
    }
    heading(pen, Label::Services.text(lang));
    if let Some(skirting) = &q.skirting {
        let name = format!("{} ({})", Label::Skirting.text(lang), skirting.band.label(lang));
        service_row(
            pen,
            &name,
            &format!("{:.2} MTÜL", skirting.measurement),
            &money(skirting.unit_price),
            &money(skirting.total),
        );
    }
    if let Some(sink) = &q.sink {
        let quantity = format!("{} {}", sink.quantity, Label::Quantity.text(lang));
        service_row(pen, sink.kind.label(lang), &quantity, &money(sink.unit_price), &money(sink.total));
    }
    if let Some(detail) = &q.special_detail {
        service_row(
            pen,
            detail.kind.label(lang),
            &format!("{:.2} MTÜL", detail.measurement),
            &money(detail.unit_price),
            &money(detail.total),
        );
    }
}

fn draw_discounts<S: Surface>(pen: &mut Pen<'_, S>, q: &QuotationData, money: &dyn Fn(f64) -> String, lang: Language) {
    let discount = q.discount;
    let lines = [
        (Label::ListDiscount, discount.total_list_discount, q.summary.list_discount_amount),
        (
            Label::DepthPanelDiscount,
            discount.depth_panel_discount,
            q.summary.depth_panel_discount_amount,
        ),
    ];
    if lines.iter().all(|(_, rate, _)| *rate <= 0.0) {
        return;
    }
    heading(pen, Label::Discounts.text(lang));
    for (label, rate, amount) in lines {
        if rate > 0.0 {
            let name = format!("{} ({})", label.text(lang), percent(rate, lang));
            pen.row(
                &[(X_NAME, &name), (X_TOTAL, &format!("-{}", money(amount)))],
                BODY_PT,
                Weight::Regular,
            );
        }
    }
}

fn draw_summary<S: Surface>(pen: &mut Pen<'_, S>, q: &QuotationData, money: &dyn Fn(f64) -> String, lang: Language) {
    heading(pen, Label::Summary.text(lang));
    for (label, amount) in [
        (Label::ListPrice, q.summary.list_price),
        (Label::FinalPrice, q.summary.final_price),
        (Label::Vat, q.summary.vat),
    ] {
        pen.row(&[(X_NAME, label.text(lang)), (X_TOTAL, &money(amount))], BODY_PT, Weight::Regular);
    }
    pen.row(
        &[(X_NAME, Label::GrandTotal.text(lang)), (X_TOTAL, &money(q.summary.grand_total))],
        HEADING_PT,
        Weight::Bold,
    );
}

fn subtotal<S: Surface>(pen: &mut Pen<'_, S>, amount: &str, language: Language) {
    pen.row(
        &[(X_UNIT, Label::Subtotal.text(language)), (X_TOTAL, amount)],
        TABLE_PT,
        Weight::Bold,
    );
}

fn service_row<S: Surface>(pen: &mut Pen<'_, S>, name: &str, measure: &str, unit: &str, total: &str) {
    pen.row(
        &[(X_NAME, name), (X_MEASURE, measure), (X_UNIT, unit), (X_TOTAL, total)],
        BODY_PT,
        Weight::Regular,
    );
}

fn draw_panel_table<S: Surface>(
    pen: &mut Pen<'_, S>,
    title: Label,
    groups: &[PanelGroup],
    total: f64,
    money: &dyn Fn(f64) -> String,
    lang: Language,
) {
    let rows: Vec<_> = groups.iter().filter(|g| g.measurement > 0.0).collect();
    if rows.is_empty() {
        return;
    }
    heading(pen, title.text(lang));
    pen.row(
        &[
            (X_INDEX, "#"),
            (X_MEASURE, Label::SquareMeters.text(lang)),
            (X_UNIT, Label::UnitPrice.text(lang)),
            (X_TOTAL, Label::Total.text(lang)),
        ],
        TABLE_PT,
        Weight::Bold,
    );
    for (i, group) in rows.iter().enumerate() {
        pen.row(
            &[
                (X_INDEX, &(i + 1).to_string()),
                (X_MEASURE, &format!("{:.2}", group.measurement)),
                (X_UNIT, &money(group.unit_price)),
                (X_TOTAL, &money(group.line_total)),
            ],
            TABLE_PT,
            Weight::Regular,
        );
    }
    subtotal(pen, &money(total), lang);
}

const LIST_X_FIRST: f32 = 52.0;
const LIST_X_STEP: f32 = 20.5;
const LIST_PT: f32 = 7.5;

/// Draws the price list.
pub fn draw_price_list<S: Surface>(pen: &mut Pen<'_, S>, page: &PriceListPage<'_>) {
    let lang = page.language;
    let meta = format!("{}: {}", Label::Date.text(lang), format_date(page.date, lang));
    draw_header(pen, page.company, Label::PriceListTitle.text(lang), &meta, None);

    for section in page.sections {
        let title = match section.category {
            Some(category) => format!("{} ({})", section.product_name, category_name(category, lang)),
            None => section.product_name.clone(),
        };
        heading(pen, &title);

        // the skirting column holds the first band's price, so its header names that band
        let skirting_header = section
            .entries
            .iter()
            .find_map(|entry| entry.skirting_prices.first())
            .map_or_else(
                || Label::Skirting.text(lang).to_string(),
                |(band, _)| format!("{} ({})", Label::Skirting.text(lang), band.label(lang)),
            );
        let mut columns: Vec<&str> = vec![Label::Color.text(lang)];
        columns.extend(section.depth_labels.iter().copied());
        columns.push(Label::Panel.text(lang));
        columns.push(&skirting_header);
        let header: Vec<(f32, &str)> = columns
            .iter()
            .enumerate()
            .map(|(i, text)| (column_x(i), *text))
            .collect();
        pen.row(&header, LIST_PT, Weight::Bold);

        for entry in &section.entries {
            let mut cells: Vec<String> = vec![entry.color_name.clone()];
            cells.extend(
                entry
                    .depth_prices
                    .iter()
                    .map(|d| format_price(d.unit_price, page.currency, 0)),
            );
            cells.push(format_price(entry.panel_price, page.currency, 0));
            cells.push(
                entry
                    .skirting_prices
                    .first()
                    .map(|(_, price)| format_price(*price, page.currency, 0))
                    .unwrap_or_default(),
            );
            let row: Vec<(f32, &str)> = cells
                .iter()
                .enumerate()
                .map(|(i, text)| (column_x(i), text.as_str()))
                .collect();
            pen.row(&row, LIST_PT, Weight::Regular);
        }
    }

    draw_footer(pen, page.company);
}

#[allow(clippy::cast_precision_loss)]
fn column_x(index: usize) -> f32 {
    if index == 0 {
        X_LABEL
    } else {
        LIST_X_FIRST + (index - 1) as f32 * LIST_X_STEP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::options::{SinkKind, SpecialDetailKind};
    use crate::core::price_list::build_price_list;
    use crate::core::pricing::DiscountData;
    use crate::core::quotation::{CustomerInfo, Event, QuotationState, apply_all};
    use crate::errors::Result;
    use crate::export::layout::{PAGE_BUDGET_MM, compute_scale};
    use crate::test_utils::sample_catalog;
    use chrono::Local;

    /// Records every text drawn, in order
    #[derive(Default)]
    struct Recorder {
        texts: Vec<String>,
        bars: usize,
    }

    impl Surface for Recorder {
        fn text(&mut self, text: &str, _: f32, _: f32, _: f32, _: Weight) {
            self.texts.push(text.to_string());
        }
        fn rule(&mut self, _: f32, _: f32, _: f32) {}
        fn bar(&mut self, _: f32, _: f32, _: f32, _: f32) {
            self.bars += 1;
        }
    }

    impl Recorder {
        fn position(&self, text: &str) -> Option<usize> {
            self.texts.iter().position(|t| t == text)
        }
    }

    fn minimal(catalog: &Catalog) -> Result<QuotationData> {
        let state = apply_all(
            &QuotationState::default(),
            [
                Event::SelectColor("belenco-snow".into()),
                Event::SetDepthMeasurement { id: 1, measurement: 2.0 },
            ],
            catalog,
        )?;
        Ok(state.snapshot_with(catalog, "Q1".into(), Local::now()))
    }

    fn full(catalog: &Catalog) -> Result<QuotationData> {
        let mut events = vec![
            Event::SetCustomer(CustomerInfo {
                company: "Atölye".into(),
                customer: "Ayşe".into(),
                architect: "Mert".into(),
                date: None,
            }),
            Event::SelectColor("belenco-snow".into()),
            Event::SetDepthMeasurement { id: 1, measurement: 2.0 },
        ];
        for id in 2..=5 {
            events.push(Event::AddDepthGroup);
            events.push(Event::SetDepthMeasurement { id, measurement: 1.0 });
        }
        for id in 6..=8 {
            events.push(Event::AddPanelGroup);
            events.push(Event::SetPanelMeasurement { id, measurement: 1.0 });
        }
        for id in 9..=11 {
            events.push(Event::AddHoodGroup);
            events.push(Event::SetHoodMeasurement { id, measurement: 1.0 });
        }
        events.extend([
            Event::SetSkirting { measurement: Some(3.0) },
            Event::SetSink { kind: Some(SinkKind::Undermount), quantity: 1 },
            Event::SetSpecialDetail { kind: Some(SpecialDetailKind::Bullnose), measurement: 2.0 },
            Event::ToggleLabor("Montaj".into()),
            Event::ToggleLabor("Nakliye".into()),
            Event::ToggleLabor("Ölçü ve Keşif".into()),
            Event::ToggleLabor("Eski Tezgah Sökümü".into()),
            Event::SetDiscount(DiscountData {
                total_list_discount: 10.0,
                depth_panel_discount: 5.0,
            }),
        ]);
        let state = apply_all(&QuotationState::default(), events, catalog)?;
        Ok(state.snapshot_with(catalog, "Q2".into(), Local::now()))
    }

    fn record(snapshot: &QuotationData, language: Language) -> Recorder {
        let company = CompanyConfig {
            name: "Granit Sanat".into(),
            phone: "+90 212 000 00 00".into(),
            ..CompanyConfig::default()
        };
        let mut recorder = Recorder::default();
        let mut pen = Pen::new(&mut recorder, 1.0);
        draw_quotation(
            &mut pen,
            &QuotationPage {
                snapshot,
                company: &company,
                language,
            },
        );
        recorder
    }

    #[test]
    fn test_sections_follow_fixed_order() -> Result<()> {
        let catalog = sample_catalog();
        let recorder = record(&full(&catalog)?, Language::Tr);
        let order: Vec<Option<usize>> = [
            "Granit Sanat",
            "FİYAT TEKLİFİ",
            "Müşteri Bilgileri",
            "Ürün",
            "Tezgah",
            "Panel",
            "Davlumbaz Paneli",
            "Ek Hizmetler",
            "İşçilik",
            "İndirimler",
            "Fiyat Özeti",
            "Notlar",
            "+90 212 000 00 00",
        ]
        .iter()
        .map(|t| recorder.position(t))
        .collect();
        assert!(order.iter().all(Option::is_some), "missing section: {order:?}");
        assert!(order.windows(2).all(|w| w[0] < w[1]), "out of order: {order:?}");
        assert!(recorder.bars > 0, "barcode should be drawn");
        Ok(())
    }

    #[test]
    fn test_empty_sections_are_skipped() -> Result<()> {
        let catalog = sample_catalog();
        let recorder = record(&minimal(&catalog)?, Language::En);
        for absent in ["Customer", "Panels", "Hood panels", "Extras", "Labor", "Discounts"] {
            assert!(recorder.position(absent).is_none(), "{absent} should be skipped");
        }
        assert!(recorder.position("Price summary").is_some());
        // 2 MTÜL at 1.000 plus 20% VAT
        assert!(recorder.position("₺2.400,00").is_some(), "grand total: {:?}", recorder.texts);
        assert!(recorder.position("₺4.800,00").is_none());
        Ok(())
    }

    #[test]
    fn test_estimate_drives_scale() -> Result<()> {
        let catalog = sample_catalog();
        let small = estimate_height(&minimal(&catalog)?);
        let large = estimate_height(&full(&catalog)?);
        assert!(small < large);
        assert!((compute_scale(small, PAGE_BUDGET_MM) - 1.0).abs() < f32::EPSILON);
        let scale = compute_scale(large, PAGE_BUDGET_MM);
        assert!(scale < 1.0 && scale >= 0.55, "scale {scale} for height {large}");
        Ok(())
    }

    #[test]
    fn test_estimate_matches_drawn_height() -> Result<()> {
        let catalog = sample_catalog();
        let snapshot = full(&catalog)?;
        let company = CompanyConfig {
            name: "Granit Sanat".into(),
            address: "İstanbul".into(),
            ..CompanyConfig::default()
        };
        let mut recorder = Recorder::default();
        let mut pen = Pen::new(&mut recorder, 1.0);
        draw_quotation(
            &mut pen,
            &QuotationPage {
                snapshot: &snapshot,
                company: &company,
                language: Language::En,
            },
        );
        assert!((pen.used() - estimate_height(&snapshot)).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_price_list_rows() {
        let sections = build_price_list(&sample_catalog(), "TRY");
        let company = CompanyConfig::default();
        let mut recorder = Recorder::default();
        let mut pen = Pen::new(&mut recorder, 1.0);
        draw_price_list(
            &mut pen,
            &PriceListPage {
                sections: &sections,
                company: &company,
                language: Language::Tr,
                date: NaiveDate::default(),
                currency: "TRY",
            },
        );
        assert!(recorder.position("Belenco Quartz (Kuvars)").is_some());
        assert!(recorder.position("Kelya").is_some());
        assert!(recorder.position("₺2.000").is_some());
        assert!(recorder.position("Montaj").is_none());
        assert!(estimate_price_list_height(&sections, "TRY") > 0.0);
    }

    #[test]
    fn test_price_list_skirting_column_names_its_band() {
        let sections = build_price_list(&sample_catalog(), "TRY");
        let company = CompanyConfig::default();
        for (language, header) in [(Language::Tr, "5 cm'e kadar"), (Language::En, "Up to 5 cm")] {
            let mut recorder = Recorder::default();
            let mut pen = Pen::new(&mut recorder, 1.0);
            draw_price_list(
                &mut pen,
                &PriceListPage {
                    sections: &sections,
                    company: &company,
                    language,
                    date: NaiveDate::default(),
                    currency: "TRY",
                },
            );
            let expected = format!("{} ({header})", Label::Skirting.text(language));
            assert!(recorder.position(&expected).is_some(), "header: {:?}", recorder.texts);
            assert!(recorder.position(Label::Skirting.text(language)).is_none());
        }
    }
}
