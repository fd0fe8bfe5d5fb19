//! One-page A4 PDF export.
//!
//! The document is measured first, scaled to fit, then drawn with printpdf.
//! Output goes either to a file in the configured directory or back to the
//! caller as bytes for inline display.

use crate::config::{AppConfig, CompanyConfig, Language};
use crate::core::price_list::PriceListSection;
use crate::core::quotation::QuotationData;
use crate::errors::{Error, Result};
use crate::export::document::{
    PriceListPage, QuotationPage, draw_price_list, draw_quotation, estimate_height, estimate_price_list_height,
};
use crate::export::fonts::{FontChoice, FontLoader, to_builtin_safe};
use crate::export::layout::{PAGE_BUDGET_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Pen, Surface, Weight, compute_scale};
use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use std::path::PathBuf;
use tracing::{debug, info, warn};

const MM_TO_PT: f32 = 2.834_646;
const RULE_THICKNESS_PT: f32 = 0.5;

/// Where a rendered PDF goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Written to `dir`
    Download {
        /// Target directory, created if missing
        dir: PathBuf,
    },
    /// Returned as bytes only
    Inline,
}

/// Result of a render
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    /// Suggested file name
    pub file_name: String,
    /// PDF bytes
    pub bytes: Vec<u8>,
    /// Written file in download mode
    pub path: Option<PathBuf>,
    /// Scale the content was drawn at
    pub scale: f32,
}

/// `GS_<YYMMDD>_<HHMM>_<id>.pdf`
#[must_use]
pub fn quotation_file_name(snapshot: &QuotationData) -> String {
    format!("GS_{}_{}.pdf", snapshot.created_at.format("%y%m%d_%H%M"), snapshot.id)
}

/// `GS_PriceList_<YYMMDD>_<HHMM>.pdf`
#[must_use]
pub fn price_list_file_name(created_at: DateTime<Local>) -> String {
    format!("GS_PriceList_{}.pdf", created_at.format("%y%m%d_%H%M"))
}

/// printpdf layer seen through the layout surface
struct PdfSurface {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    unicode: bool,
}

impl PdfSurface {
    fn line(&self, from: (f32, f32), to: (f32, f32), thickness_pt: f32) {
        self.layer.set_outline_thickness(thickness_pt);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(from.0), Mm(PAGE_HEIGHT_MM - from.1)), false),
                (Point::new(Mm(to.0), Mm(PAGE_HEIGHT_MM - to.1)), false),
            ],
            is_closed: false,
        });
    }
}

impl Surface for PdfSurface {
    fn text(&mut self, text: &str, size_pt: f32, x_mm: f32, top_mm: f32, weight: Weight) {
        let font = match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        };
        let y = Mm(PAGE_HEIGHT_MM - top_mm);
        if self.unicode {
            self.layer.use_text(text, size_pt, Mm(x_mm), y, font);
        } else {
            self.layer.use_text(to_builtin_safe(text), size_pt, Mm(x_mm), y, font);
        }
    }

    fn rule(&mut self, x_from_mm: f32, x_to_mm: f32, top_mm: f32) {
        self.line((x_from_mm, top_mm), (x_to_mm, top_mm), RULE_THICKNESS_PT);
    }

    fn bar(&mut self, x_mm: f32, top_mm: f32, width_mm: f32, height_mm: f32) {
        // a stroked line is centred on its path
        let x = x_mm + width_mm / 2.0;
        self.line((x, top_mm), (x, top_mm + height_mm), width_mm * MM_TO_PT);
    }
}

fn pdf_error(e: impl std::fmt::Display) -> Error {
    Error::Pdf {
        message: e.to_string(),
    }
}

/// Builds a one-page document and hands its surface to `draw`.
fn build_pdf<F>(title: &str, font: &FontChoice, draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut PdfSurface),
{
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    let embedded = match font {
        FontChoice::Embedded(bytes) => match doc.add_external_font(std::io::Cursor::new(bytes.as_slice())) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!("Embedding the PDF font failed, using built-in Helvetica: {}", e);
                None
            }
        },
        FontChoice::Builtin => None,
    };

    let mut surface = if let Some(font) = embedded {
        PdfSurface {
            layer,
            regular: font.clone(),
            bold: font,
            unicode: true,
        }
    } else {
        PdfSurface {
            layer,
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
            unicode: false,
        }
    };
    draw(&mut surface);

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(pdf_error)?;
    writer.into_inner().map_err(pdf_error)
}

fn deliver(file_name: String, bytes: Vec<u8>, scale: f32, mode: &OutputMode) -> Result<RenderedPdf> {
    let path = match mode {
        OutputMode::Download { dir } => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(&file_name);
            std::fs::write(&path, &bytes)?;
            info!("Saved {} ({} bytes)", path.display(), bytes.len());
            Some(path)
        }
        OutputMode::Inline => None,
    };
    Ok(RenderedPdf {
        file_name,
        bytes,
        path,
        scale,
    })
}

/// Renders quotations and price lists
#[derive(Debug)]
pub struct PdfRenderer {
    company: CompanyConfig,
    fonts: FontLoader,
}

impl PdfRenderer {
    /// Creates a renderer
    #[must_use]
    pub const fn new(company: CompanyConfig, fonts: FontLoader) -> Self {
        Self { company, fonts }
    }

    /// Creates a renderer from the application settings
    ///
    /// # Errors
    /// Returns an error if the HTTP client for the font cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(config.company.clone(), FontLoader::from_config(&config.pdf)?))
    }

    /// Renders a frozen quotation.
    ///
    /// # Errors
    /// Returns an error if the PDF cannot be produced or written.
    pub async fn render(&self, snapshot: &QuotationData, mode: &OutputMode, language: Language) -> Result<RenderedPdf> {
        let estimated = estimate_height(snapshot);
        let scale = compute_scale(estimated, PAGE_BUDGET_MM);
        debug!("Quotation {} measures {:.1} mm, drawing at scale {:.3}", snapshot.id, estimated, scale);

        let font = self.fonts.resolve().await;
        let page = QuotationPage {
            snapshot,
            company: &self.company,
            language,
        };
        let title = format!("{} {}", page_title(language), snapshot.id);
        let bytes = build_pdf(&title, &font, |surface| {
            let mut pen = Pen::new(surface, scale);
            draw_quotation(&mut pen, &page);
        })?;

        deliver(quotation_file_name(snapshot), bytes, scale, mode)
    }

    /// Renders the price list.
    ///
    /// # Errors
    /// Returns an error if the PDF cannot be produced or written.
    pub async fn render_price_list(
        &self,
        sections: &[PriceListSection],
        currency: &str,
        created_at: DateTime<Local>,
        language: Language,
        mode: &OutputMode,
    ) -> Result<RenderedPdf> {
        let scale = compute_scale(estimate_price_list_height(sections, currency), PAGE_BUDGET_MM);
        let font = self.fonts.resolve().await;
        let page = PriceListPage {
            sections,
            company: &self.company,
            language,
            date: created_at.date_naive(),
            currency,
        };
        let bytes = build_pdf(language.pick("Fiyat Listesi", "Price List"), &font, |surface| {
            let mut pen = Pen::new(surface, scale);
            draw_price_list(&mut pen, &page);
        })?;

        deliver(price_list_file_name(created_at), bytes, scale, mode)
    }
}

const fn page_title(language: Language) -> &'static str {
    language.pick("Teklif", "Quotation")
}
