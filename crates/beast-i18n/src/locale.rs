//! Locale management and utilities

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// Supported locales
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// English.
    English,
    /// German, the language the bot was first written for.
    #[default]
    German,
}

impl Locale {
    /// Get the language code for this locale
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::German => "de-DE",
        }
    }

    /// Get the short language code for this locale
    #[must_use]
    pub const fn short_code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::German => "de",
        }
    }

    /// Parse a locale from a language code such as `de`, `en-GB` or `de_AT`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let language = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Some(Self::English),
            "de" => Some(Self::German),
            _ => None,
        }
    }

    /// Convert to Fluent `LanguageIdentifier`
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::InvalidLanguageId`] if the code does not parse.
    pub fn to_language_identifier(self) -> I18nResult<LanguageIdentifier> {
        self.code()
            .parse()
            .map_err(|_| I18nError::InvalidLanguageId(self.code().to_string()))
    }

    /// Get all supported locales
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::English, Self::German]
    }

    /// The embedded Fluent source for this locale.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::English => include_str!("../locales/en/main.ftl"),
            Self::German => include_str!("../locales/de/main.ftl"),
        }
    }
}
