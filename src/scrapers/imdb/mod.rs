//! IMDb scraper
//!
//! IMDb has no public API, so titles are scraped from the HTML pages.
//! Base URL: https://www.imdb.com

pub mod episode;
pub mod parser;
pub mod show;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::api::{ApiClient, build_url};
use super::{Locale, ScraperError};
use crate::services::cache::ResponseCache;
use crate::services::network::Transport;

pub use episode::ImdbEpisodeScrapeJob;
pub use show::ImdbShowScrapeJob;

static IMDB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^tt\d+$").unwrap());

/// An IMDb title id such as `tt0944947`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImdbId(String);

impl ImdbId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn is_valid(&self) -> bool {
        IMDB_ID_RE.is_match(&self.0)
    }

    /// Parse and validate in one step
    pub fn parse(id: &str) -> Option<Self> {
        let id = Self::new(id);
        id.is_valid().then_some(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// IMDb page loader
#[derive(Clone)]
pub struct ImdbApi {
    client: ApiClient,
    base_url: String,
}

impl ImdbApi {
    pub const BASE_URL: &'static str = "https://www.imdb.com";

    pub fn new(transport: Arc<dyn Transport>, cache: Arc<ResponseCache>) -> Self {
        Self {
            client: ApiClient::new("IMDb", transport, cache),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Reference page of a title (show or episode)
    pub fn title_url(&self, id: &ImdbId) -> Result<url::Url, ScraperError> {
        build_url(&format!("{}/title/{}/reference", self.base_url, id))
    }

    /// Episode list of one season of a show
    pub fn season_url(&self, show_id: &ImdbId, season: u32) -> Result<url::Url, ScraperError> {
        build_url(&format!(
            "{}/title/{}/episodes/?season={}",
            self.base_url, show_id, season
        ))
    }

    pub async fn load_title(&self, locale: &Locale, id: &ImdbId) -> Result<String, ScraperError> {
        let url = self.title_url(id)?;
        self.client.get(locale, url).await
    }

    pub async fn load_season(
        &self,
        locale: &Locale,
        show_id: &ImdbId,
        season: u32,
    ) -> Result<String, ScraperError> {
        let url = self.season_url(show_id, season)?;
        self.client.get(locale, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imdb_id_validation() {
        assert!(ImdbId::new("tt0944947").is_valid());
        assert!(ImdbId::new(" tt0944947 ").is_valid());
        assert!(!ImdbId::new("0944947").is_valid());
        assert!(!ImdbId::new("tt").is_valid());
        assert!(!ImdbId::new("nm0000138").is_valid());
        assert!(ImdbId::parse("").is_none());
    }
}
