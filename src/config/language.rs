//! Language preference.
//!
//! Quotations are printed in Turkish or English. The choice is remembered in the
//! key/value store so the next run starts in the same language; the
//! `QUOTE_LANGUAGE` environment variable wins over the stored value.

use crate::core::storage;
use crate::errors::Result;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use std::fmt;

const LANGUAGE_KEY: &str = "language";

/// Output language for labels and PDF text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Turkish
    #[default]
    Tr,
    /// English
    En,
}

impl Language {
    /// Parses `"tr"` / `"en"` (case-insensitive). Anything else is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tr" | "tr-tr" => Some(Self::Tr),
            "en" | "en-us" | "en-gb" => Some(Self::En),
            _ => None,
        }
    }

    /// Short code as stored
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::En => "en",
        }
    }

    /// Picks the Turkish or English variant of a label
    #[must_use]
    pub const fn pick(self, tr: &'static str, en: &'static str) -> &'static str {
        match self {
            Self::Tr => tr,
            Self::En => en,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Loads the language preference: environment first, then the stored value,
/// then Turkish.
pub async fn load_language<C>(db: &C) -> Result<Language>
where
    C: ConnectionTrait,
{
    if let Some(lang) = std::env::var("QUOTE_LANGUAGE")
        .ok()
        .as_deref()
        .and_then(Language::parse)
    {
        return Ok(lang);
    }

    let stored = storage::get_value(db, LANGUAGE_KEY).await?;
    Ok(stored.as_deref().and_then(Language::parse).unwrap_or_default())
}

/// Persists the language preference.
pub async fn save_language<C>(db: &C, language: Language) -> Result<()>
where
    C: ConnectionTrait,
{
    storage::set_value(db, LANGUAGE_KEY, language.code().to_string()).await
}
