//! TVMaze scraper
//!
//! TVMaze is a free API that doesn't require authentication.
//! Base URL: https://api.tvmaze.com

pub mod episode;
pub mod parser;
pub mod show;

use std::sync::Arc;

use url::Url;

use super::api::{ApiClient, build_url};
use super::{Locale, ScraperError};
use crate::services::cache::ResponseCache;
use crate::services::network::Transport;

pub use episode::TvMazeEpisodeScrapeJob;
pub use show::TvMazeShowScrapeJob;

/// Parse a TVMaze id. Valid ids are positive integers.
pub fn parse_tvmaze_id(id: &str) -> Option<u32> {
    id.trim().parse::<u32>().ok().filter(|id| *id > 0)
}

/// TVMaze endpoint loader
#[derive(Clone)]
pub struct TvMazeApi {
    client: ApiClient,
    base_url: String,
}

impl TvMazeApi {
    pub const BASE_URL: &'static str = "https://api.tvmaze.com";

    pub fn new(transport: Arc<dyn Transport>, cache: Arc<ResponseCache>) -> Self {
        Self {
            client: ApiClient::new("TVMaze", transport, cache),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    pub fn show_url(&self, show_id: u32) -> Result<Url, ScraperError> {
        build_url(&format!("{}/shows/{}", self.base_url, show_id))
    }

    pub fn episode_url(&self, episode_id: u32) -> Result<Url, ScraperError> {
        build_url(&format!("{}/episodes/{}", self.base_url, episode_id))
    }

    pub fn episode_by_number_url(
        &self,
        show_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<Url, ScraperError> {
        build_url(&format!(
            "{}/shows/{}/episodebynumber?season={}&number={}",
            self.base_url, show_id, season, episode
        ))
    }

    pub async fn load_show(&self, locale: &Locale, show_id: u32) -> Result<String, ScraperError> {
        self.client.get(locale, self.show_url(show_id)?).await
    }

    pub async fn load_episode(
        &self,
        locale: &Locale,
        episode_id: u32,
    ) -> Result<String, ScraperError> {
        self.client.get(locale, self.episode_url(episode_id)?).await
    }

    pub async fn load_episode_by_number(
        &self,
        locale: &Locale,
        show_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<String, ScraperError> {
        let url = self.episode_by_number_url(show_id, season, episode)?;
        self.client.get(locale, url).await
    }
}
