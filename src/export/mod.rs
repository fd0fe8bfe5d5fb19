/// Code 39 barcode of the quotation id
pub mod barcode;

/// Section layout of the quotation and price list pages
pub mod document;

/// Unicode font loading and the built-in font fallback
pub mod fonts;

/// Bilingual labels printed on documents
pub mod labels;

/// Page geometry, drawing surfaces and scale-to-fit
pub mod layout;

/// printpdf backend and file delivery
pub mod pdf;

pub use pdf::{OutputMode, PdfRenderer, RenderedPdf};
