//! Fixed option tables: sinks, special edge details, labor services.
//!
//! Sink and special-detail prices are flat TRY amounts keyed by product
//! category. They do not follow the base price.

use crate::config::Language;
use crate::core::catalog::Category;
use serde::{Deserialize, Serialize};

/// Sink installation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkKind {
    /// Mounted under the countertop
    Undermount,
    /// Dropped in from above
    TopMount,
    /// Fabricated from the same slab
    Integrated,
}

impl SinkKind {
    /// All sink kinds in display order
    pub const ALL: [Self; 3] = [Self::Undermount, Self::TopMount, Self::Integrated];

    /// Flat price per sink for the given category
    #[must_use]
    pub const fn price(self, category: Option<Category>) -> f64 {
        match (category, self) {
            (Some(Category::Porcelain), Self::Undermount) => 3_500.0,
            (Some(Category::Porcelain), Self::TopMount) => 2_000.0,
            (Some(Category::Porcelain), Self::Integrated) => 9_500.0,
            (_, Self::Undermount) => 2_500.0,
            (_, Self::TopMount) => 1_500.0,
            (_, Self::Integrated) => 7_500.0,
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self, language: Language) -> &'static str {
        match self {
            Self::Undermount => language.pick("Alttan Montaj Eviye", "Undermount sink"),
            Self::TopMount => language.pick("Üstten Montaj Eviye", "Top-mount sink"),
            Self::Integrated => language.pick("Entegre Eviye", "Integrated sink"),
        }
    }

    /// Parses a Turkish or English name, or the variant name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let folded = crate::core::catalog::fold(value);
        Self::ALL.into_iter().find(|kind| {
            folded == crate::core::catalog::fold(kind.label(Language::Tr))
                || folded == crate::core::catalog::fold(kind.label(Language::En))
                || folded == format!("{kind:?}").to_ascii_lowercase()
        })
    }
}

/// Special edge detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialDetailKind {
    /// Chamfered edge
    Chamfer,
    /// Rounded edge
    Bullnose,
    /// 45° mitred joint
    Mitre45,
    /// Drip groove under the front edge
    DripGroove,
}

impl SpecialDetailKind {
    /// All details in display order
    pub const ALL: [Self; 4] = [Self::Chamfer, Self::Bullnose, Self::Mitre45, Self::DripGroove];

    /// Details offered for a category. Porcelain cannot be profiled, so only
    /// joints and grooves remain.
    #[must_use]
    pub fn available_for(category: Option<Category>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|kind| kind.is_available_for(category))
            .collect()
    }

    /// Whether this detail is offered for a category
    #[must_use]
    pub const fn is_available_for(self, category: Option<Category>) -> bool {
        match category {
            Some(Category::Porcelain) => matches!(self, Self::Mitre45 | Self::DripGroove),
            Some(Category::Quartz) | None => true,
        }
    }

    /// Flat price per MTÜL for the given category
    #[must_use]
    pub const fn price(self, category: Option<Category>) -> f64 {
        match (category, self) {
            (Some(Category::Porcelain), Self::Mitre45) => 2_200.0,
            (Some(Category::Porcelain), Self::DripGroove) => 650.0,
            (_, Self::Chamfer) => 600.0,
            (_, Self::Bullnose) => 900.0,
            (_, Self::Mitre45) => 1_500.0,
            (_, Self::DripGroove) => 450.0,
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self, language: Language) -> &'static str {
        match self {
            Self::Chamfer => language.pick("Pahlı Kenar", "Chamfered edge"),
            Self::Bullnose => language.pick("Yuvarlak Kenar", "Bullnose edge"),
            Self::Mitre45 => language.pick("45° Birleşim", "45° mitre joint"),
            Self::DripGroove => language.pick("Damlalık", "Drip groove"),
        }
    }

    /// Parses a Turkish or English name, or the variant name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let folded = crate::core::catalog::fold(value);
        Self::ALL.into_iter().find(|kind| {
            folded == crate::core::catalog::fold(kind.label(Language::Tr))
                || folded == crate::core::catalog::fold(kind.label(Language::En))
                || folded == format!("{kind:?}").to_ascii_lowercase()
        })
    }
}

/// Labor services offered on every quotation, by catalog name
pub const LABOR_SERVICES: [&str; 4] = ["Montaj", "Nakliye", "Ölçü ve Keşif", "Eski Tezgah Sökümü"];

/// English label for a labor service, falling back to the catalog name
#[must_use]
pub fn labor_label(name: &str, language: Language) -> &str {
    if language == Language::Tr {
        return name;
    }
    match name {
        "Montaj" => "Installation",
        "Nakliye" => "Transport",
        "Ölçü ve Keşif" => "Site survey",
        "Eski Tezgah Sökümü" => "Old countertop removal",
        other => other,
    }
}
