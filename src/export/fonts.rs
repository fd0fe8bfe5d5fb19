//! Font resolution for PDF export.
//!
//! A Unicode TTF is fetched once from the configured CDN URL and kept base64
//! encoded for the rest of the process. Any failure (no URL, network error,
//! not a font) flips the loader to `Unavailable` for the session and the
//! renderer falls back to built-in Helvetica, which cannot draw Turkish
//! letters, so text is passed through [`to_builtin_safe`] first.

use crate::config::PdfConfig;
use crate::errors::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Replacements applied when drawing with a built-in font
pub const TURKISH_SUBSTITUTIONS: [(char, &str); 22] = [
    ('ş', "s"),
    ('Ş', "S"),
    ('ğ', "g"),
    ('Ğ', "G"),
    ('ı', "i"),
    ('İ', "I"),
    ('ç', "c"),
    ('Ç', "C"),
    ('ö', "o"),
    ('Ö', "O"),
    ('ü', "u"),
    ('Ü', "U"),
    ('â', "a"),
    ('î', "i"),
    ('₺', "TL"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('²', "2"),
    ('°', ""),
    ('–', "-"),
    ('—', "-"),
    ('’', "'"),
];

/// Maps Turkish letters and symbols to ASCII; anything else non-ASCII becomes `?`.
#[must_use]
pub fn to_builtin_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some((_, replacement)) = TURKISH_SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else {
            out.push('?');
        }
    }
    out
}

/// Session state of the Unicode font
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontState {
    /// Not requested yet
    Unloaded,
    /// Fetched; base64 of the TTF
    Ready(String),
    /// Fetch failed or no URL configured; built-in fonts for this session
    Unavailable,
}

/// Font the renderer draws with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontChoice {
    /// Embedded TTF bytes
    Embedded(Vec<u8>),
    /// Built-in Helvetica with substitution
    Builtin,
}

/// Fetches and caches the Unicode font
#[derive(Debug)]
pub struct FontLoader {
    client: Client,
    url: Option<String>,
    state: Mutex<FontState>,
}

impl FontLoader {
    /// Creates a loader for `url`; `None` means built-in fonts only
    pub fn new(url: Option<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.filter(|u| !u.trim().is_empty()),
            state: Mutex::new(FontState::Unloaded),
        })
    }

    /// Creates a loader from the PDF settings
    pub fn from_config(config: &PdfConfig) -> Result<Self> {
        Self::new(config.font_url.clone())
    }

    /// Current session state
    pub async fn state(&self) -> FontState {
        self.state.lock().await.clone()
    }

    /// Resolves the font, fetching it on first use.
    pub async fn resolve(&self) -> FontChoice {
        let mut state = self.state.lock().await;

        if *state == FontState::Unloaded {
            *state = match self.fetch().await {
                Ok(encoded) => {
                    info!("PDF font loaded ({} bytes encoded)", encoded.len());
                    FontState::Ready(encoded)
                }
                Err(e) => {
                    warn!("PDF font unavailable, using built-in Helvetica: {}", e);
                    FontState::Unavailable
                }
            };
        }

        let decoded = match &*state {
            FontState::Ready(encoded) => Some(STANDARD.decode(encoded)),
            FontState::Unloaded | FontState::Unavailable => None,
        };
        match decoded {
            Some(Ok(bytes)) => FontChoice::Embedded(bytes),
            Some(Err(e)) => {
                warn!("Cached PDF font is corrupt, dropping it: {}", e);
                *state = FontState::Unavailable;
                FontChoice::Builtin
            }
            None => FontChoice::Builtin,
        }
    }

    async fn fetch(&self) -> Result<String> {
        let Some(url) = &self.url else {
            return Err(Error::Font {
                message: "no font URL configured".to_string(),
            });
        };
        debug!("Fetching PDF font from {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Font {
                message: format!("font CDN returned status {}", response.status()),
            });
        }
        let bytes = response.bytes().await?;
        if !looks_like_font(&bytes) {
            return Err(Error::Font {
                message: "response is not a TrueType/OpenType font".to_string(),
            });
        }
        Ok(STANDARD.encode(&bytes))
    }

    #[cfg(test)]
    async fn seed(&self, state: FontState) {
        *self.state.lock().await = state;
    }
}

/// Checks the sfnt magic number
#[must_use]
pub fn looks_like_font(bytes: &[u8]) -> bool {
    const MAGIC: [&[u8]; 3] = [&[0x00, 0x01, 0x00, 0x00], b"true", b"OTTO"];
    bytes.get(..4).is_some_and(|head| MAGIC.iter().any(|magic| *magic == head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_substitution() {
        assert_eq!(to_builtin_safe("Şişli Çiğdem Öğüt"), "Sisli Cigdem Ogut");
        assert_eq!(to_builtin_safe("₺1.250,00"), "TL1.250,00");
        assert_eq!(to_builtin_safe("45° m²"), "45 m2");
        assert_eq!(to_builtin_safe("日"), "?");
    }

    #[test]
    fn test_font_magic() {
        assert!(looks_like_font(&[0, 1, 0, 0, 9]));
        assert!(looks_like_font(b"OTTO...."));
        assert!(!looks_like_font(b"<html>"));
        assert!(!looks_like_font(&[]));
    }

    #[tokio::test]
    async fn test_no_url_falls_back_for_the_session() -> Result<()> {
        let loader = FontLoader::new(None)?;
        assert_eq!(loader.resolve().await, FontChoice::Builtin);
        assert_eq!(loader.state().await, FontState::Unavailable);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_cdn_falls_back() -> Result<()> {
        let loader = FontLoader::new(Some("http://127.0.0.1:9/font.ttf".to_string()))?;
        assert_eq!(loader.resolve().await, FontChoice::Builtin);
        assert_eq!(loader.state().await, FontState::Unavailable);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_cache_is_decoded() -> Result<()> {
        let loader = FontLoader::new(None)?;
        let font = vec![0x00, 0x01, 0x00, 0x00, 0x42];
        loader.seed(FontState::Ready(STANDARD.encode(&font))).await;
        assert_eq!(loader.resolve().await, FontChoice::Embedded(font));

        loader.seed(FontState::Ready("***".to_string())).await;
        assert_eq!(loader.resolve().await, FontChoice::Builtin);
        assert_eq!(loader.state().await, FontState::Unavailable);
        Ok(())
    }
}
