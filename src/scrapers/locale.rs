//! Request locale
//!
//! A language with an optional region. Used as `Accept-Language` value and as
//! the partition key of the response cache.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ScraperError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    /// Create a locale from a language code and an optional country code
    pub fn new(language: &str, country: Option<&str>) -> Self {
        Self {
            language: language.to_lowercase(),
            country: country.map(|c| c.to_uppercase()),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Value for the `Accept-Language` header, e.g. `de-DE,de;q=0.9`
    pub fn accept_language(&self) -> String {
        match &self.country {
            Some(_) => format!("{},{};q=0.9", self, self.language),
            None => self.language.clone(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en", Some("US"))
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
    type Err = ScraperError;

    /// Accepts `en`, `en-US` and `en_US`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split(['-', '_']);
        let language = parts.next().unwrap_or_default();
        let country = parts.next();

        let valid_language =
            (2..=3).contains(&language.len()) && language.chars().all(|c| c.is_ascii_alphabetic());
        let valid_country = country
            .map(|c| c.len() == 2 && c.chars().all(|c| c.is_ascii_alphabetic()))
            .unwrap_or(true);

        if !valid_language || !valid_country || parts.next().is_some() {
            return Err(ScraperError::config(format!("Invalid locale: '{}'", s)));
        }

        Ok(Self::new(language, country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_and_country() {
        let locale: Locale = "de_de".parse().unwrap();
        assert_eq!(locale.language(), "de");
        assert_eq!(locale.country(), Some("DE"));
        assert_eq!(locale.to_string(), "de-DE");
    }

    #[test]
    fn test_parse_language_only() {
        let locale: Locale = "fr".parse().unwrap();
        assert_eq!(locale.country(), None);
        assert_eq!(locale.accept_language(), "fr");
    }

    #[test]
    fn test_accept_language_with_country() {
        assert_eq!(Locale::default().accept_language(), "en-US,en;q=0.9");
    }

    #[test]
    fn test_reject_garbage() {
        assert!("".parse::<Locale>().is_err());
        assert!("english".parse::<Locale>().is_err());
        assert!("en-USA-x".parse::<Locale>().is_err());
    }
}
