//! Scraper error values
//!
//! Every scrape job terminates with an optional [`ScraperError`]. Errors are
//! values carried in the job result, never panics across the async boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error categories a scrape job can terminate with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScraperErrorKind {
    /// Transport failure, or a successful response with an empty body
    NetworkError,
    /// Missing or malformed identifier, caller misuse
    ConfigError,
    /// Structurally invalid content (optional fields missing is not a parse error)
    ParseError,
    /// The remote source does not know the requested entity
    NotFound,
}

impl fmt::Display for ScraperErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NetworkError => "network error",
            Self::ConfigError => "config error",
            Self::ParseError => "parse error",
            Self::NotFound => "not found",
        };
        f.write_str(name)
    }
}

/// A typed, human readable scraper failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ScraperError {
    pub kind: ScraperErrorKind,
    pub message: String,
}

impl ScraperError {
    pub fn new(kind: ScraperErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ScraperErrorKind::NetworkError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ScraperErrorKind::ConfigError, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ScraperErrorKind::ParseError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ScraperErrorKind::NotFound, message)
    }

    /// Error for a fetch that succeeded on the wire but carried no content
    pub fn empty_content(what: &str) -> Self {
        Self::network(format!(
            "Loaded {} content is empty. Cannot load requested entity.",
            what
        ))
    }
}
