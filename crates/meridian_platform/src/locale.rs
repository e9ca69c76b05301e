//! Locales.
//!
//! A [`Locale`] is a lowercase language code with an optional uppercase
//! country code, written `en` or `en-US`. Parsing also accepts an underscore
//! separator (`en_US`), as found in POSIX environment variables.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LocaleError;

/// Environment variable read by [`Locale::from_env`].
pub const LOCALE_ENV: &str = "MERIDIAN_LOCALE";

/// Language used when no locale is configured.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A language with an optional country.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    /// A locale for `language` alone.
    #[must_use]
    pub fn new(language: impl AsRef<str>) -> Self {
        Self {
            language: language.as_ref().to_ascii_lowercase(),
            country: None,
        }
    }

    /// A locale for `language` as spoken in `country`.
    #[must_use]
    pub fn with_country(language: impl AsRef<str>, country: impl AsRef<str>) -> Self {
        Self {
            language: language.as_ref().to_ascii_lowercase(),
            country: Some(country.as_ref().to_ascii_uppercase()),
        }
    }

    /// Parses `en`, `en-US` or `en_US`.
    ///
    /// # Errors
    ///
    /// Returns [`LocaleError::Invalid`] unless the language is two or three
    /// ASCII letters and the country, if any, is two ASCII letters or three
    /// digits.
    pub fn parse(text: &str) -> Result<Self, LocaleError> {
        let invalid = || LocaleError::Invalid(text.to_string());
        let mut parts = text.split(['-', '_']);

        let language = parts.next().filter(|part| is_language(part)).ok_or_else(invalid)?;
        let country = match parts.next() {
            None => None,
            Some(part) if is_country(part) => Some(part),
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(match country {
            Some(country) => Self::with_country(language, country),
            None => Self::new(language),
        })
    }

    /// Reads the locale from `MERIDIAN_LOCALE`.
    ///
    /// Falls back to `en` when the variable is unset or invalid.
    #[must_use]
    pub fn from_env() -> Self {
        let Ok(text) = std::env::var(LOCALE_ENV) else {
            return Self::default();
        };
        Self::parse(text.trim()).unwrap_or_else(|err| {
            tracing::warn!(variable = LOCALE_ENV, %err, "ignoring locale from environment");
            Self::default()
        })
    }

    /// Returns the language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the country code, if any.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// The same language without a country.
    #[must_use]
    pub fn language_only(&self) -> Self {
        Self::new(&self.language)
    }
}

fn is_language(part: &str) -> bool {
    (2..=3).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_country(part: &str) -> bool {
    (part.len() == 2 && part.bytes().all(|b| b.is_ascii_alphabetic()))
        || (part.len() == 3 && part.bytes().all(|b| b.is_ascii_digit()))
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}-{}", self.language, country),
            None => f.write_str(&self.language),
        }
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_with_hyphen() {
        assert_eq!(Locale::new("EN").to_string(), "en");
        assert_eq!(Locale::with_country("en", "us").to_string(), "en-US");
    }

    #[test]
    fn parse_accepts_both_separators() {
        assert_eq!(Locale::parse("pt-BR"), Ok(Locale::with_country("pt", "BR")));
        assert_eq!(Locale::parse("pt_br"), Ok(Locale::with_country("pt", "BR")));
        assert_eq!(Locale::parse("es-419"), Ok(Locale::with_country("es", "419")));
        assert_eq!(Locale::parse("fil"), Ok(Locale::new("fil")));
    }

    #[test]
    fn parse_rejects_malformed_text() {
        for text in ["", "e", "english", "en-", "en-U", "en-US-x", "e1"] {
            assert!(Locale::parse(text).is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn language_only_drops_country() {
        let locale = Locale::with_country("de", "AT");
        assert_eq!(locale.language_only(), Locale::new("de"));
        assert_eq!(locale.country(), Some("AT"));
    }

    #[test]
    fn serializes_as_string() {
        let locale = Locale::with_country("en", "GB");
        let json = serde_json::to_string(&locale).unwrap();
        assert_eq!(json, "\"en-GB\"");
        assert_eq!(serde_json::from_str::<Locale>(&json).unwrap(), locale);
        assert!(serde_json::from_str::<Locale>("\"nope-nope\"").is_err());
    }
}
