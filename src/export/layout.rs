//! Page geometry and the two-pass layout.
//!
//! Documents are drawn through a [`Surface`]. The first pass draws onto
//! [`Measure`], which only advances the pen, to learn the natural height. The
//! scale that makes that height fit the page is then used for the real pass.
//! Horizontal positions stay fixed; font sizes and vertical advances scale.

/// A4 width
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// Margin on every side
pub const MARGIN_MM: f32 = 12.0;
/// Vertical space available for content
pub const PAGE_BUDGET_MM: f32 = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
/// Smallest scale before text becomes unreadable
pub const MIN_SCALE: f32 = 0.55;
/// Content is never enlarged
pub const MAX_SCALE: f32 = 1.0;

const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.45;

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// Regular text
    Regular,
    /// Headings and totals
    Bold,
}

/// Drawing target. Vertical positions are millimetres from the top edge.
pub trait Surface {
    /// Draws text with its baseline at `top_mm`
    fn text(&mut self, text: &str, size_pt: f32, x_mm: f32, top_mm: f32, weight: Weight);
    /// Draws a horizontal hairline
    fn rule(&mut self, x_from_mm: f32, x_to_mm: f32, top_mm: f32);
    /// Fills a rectangle whose top-left corner is at (`x_mm`, `top_mm`)
    fn bar(&mut self, x_mm: f32, top_mm: f32, width_mm: f32, height_mm: f32);
}

/// Surface that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Measure;

impl Surface for Measure {
    fn text(&mut self, _: &str, _: f32, _: f32, _: f32, _: Weight) {}
    fn rule(&mut self, _: f32, _: f32, _: f32) {}
    fn bar(&mut self, _: f32, _: f32, _: f32, _: f32) {}
}

/// Cursor over a surface
pub struct Pen<'a, S: Surface> {
    surface: &'a mut S,
    scale: f32,
    cursor: f32,
}

impl<'a, S: Surface> Pen<'a, S> {
    /// Starts at the top margin
    pub fn new(surface: &'a mut S, scale: f32) -> Self {
        Self {
            surface,
            scale,
            cursor: MARGIN_MM,
        }
    }

    /// Scale applied to sizes and advances
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Height consumed so far
    #[must_use]
    pub fn used(&self) -> f32 {
        self.cursor - MARGIN_MM
    }

    /// Draws one line of cells at their x positions and moves down by one line.
    pub fn row(&mut self, cells: &[(f32, &str)], size_pt: f32, weight: Weight) {
        let size = size_pt * self.scale;
        let baseline = self.cursor + size * PT_TO_MM;
        for (x, text) in cells {
            if !text.is_empty() {
                self.surface.text(text, size, *x, baseline, weight);
            }
        }
        self.cursor += size * PT_TO_MM * LINE_SPACING;
    }

    /// Vertical gap
    pub fn gap(&mut self, mm: f32) {
        self.cursor += mm * self.scale;
    }

    /// Full-width hairline with a little air around it
    pub fn rule(&mut self) {
        self.gap(1.0);
        self.surface.rule(MARGIN_MM, PAGE_WIDTH_MM - MARGIN_MM, self.cursor);
        self.gap(2.0);
    }

    /// Draws bars at the current position without moving the pen.
    pub fn bars(&mut self, x_mm: f32, bars: &[(f32, f32)], height_mm: f32) {
        let height = height_mm * self.scale;
        for (offset, width) in bars {
            self.surface.bar(x_mm + offset, self.cursor, *width, height);
        }
    }
}

/// Scale that fits `estimated_mm` into `budget_mm`, clamped to
/// [`MIN_SCALE`]..=[`MAX_SCALE`].
#[must_use]
pub fn compute_scale(estimated_mm: f32, budget_mm: f32) -> f32 {
    if !estimated_mm.is_finite() || estimated_mm <= 0.0 || !budget_mm.is_finite() {
        return MAX_SCALE;
    }
    (budget_mm / estimated_mm).clamp(MIN_SCALE, MAX_SCALE)
}
