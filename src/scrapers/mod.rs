//! Metadata scrapers and the scrape job pipeline
//!
//! Each remote source (IMDb, TVMaze, MusicBrainz) exposes an API wrapper that
//! fetches through the shared [`ResponseCache`](crate::services::cache::ResponseCache)
//! and a set of [`ScrapeJob`]s that fetch and parse one entity.

pub mod api;
pub mod error;
pub mod imdb;
pub mod info;
pub mod job;
pub mod locale;
pub mod musicbrainz;
pub mod registry;
pub mod tvmaze;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::{ScraperError, ScraperErrorKind};
pub use info::{InfoField, InfoFields, should_load};
pub use job::{BoxedScrapeJob, JobFinished, JobId, JobState, ScrapeJob, start};
pub use locale::Locale;
pub use registry::Scrapers;

/// Remote metadata source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperSource {
    Imdb,
    TvMaze,
    MusicBrainz,
}

impl ScraperSource {
    pub const ALL: [ScraperSource; 3] = [Self::Imdb, Self::TvMaze, Self::MusicBrainz];

    /// Identifier used on the command line and in configuration
    pub fn key(&self) -> &'static str {
        match self {
            Self::Imdb => "imdb",
            Self::TvMaze => "tvmaze",
            Self::MusicBrainz => "musicbrainz",
        }
    }
}

impl fmt::Display for ScraperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Imdb => "IMDb",
            Self::TvMaze => "TVMaze",
            Self::MusicBrainz => "MusicBrainz",
        };
        f.write_str(name)
    }
}

impl FromStr for ScraperSource {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.key() == wanted)
            .ok_or_else(|| ScraperError::config(format!("Unknown scraper: '{}'", s)))
    }
}

/// Source specific identifier of a TV show
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowIdentifier(pub String);

impl ShowIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies an episode either directly or through its show and numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeIdentifier {
    pub show_identifier: String,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub episode_identifier: Option<String>,
}

impl EpisodeIdentifier {
    /// Identify an episode by its own source id
    pub fn direct(episode_identifier: impl Into<String>) -> Self {
        Self {
            episode_identifier: Some(episode_identifier.into()),
            ..Default::default()
        }
    }

    /// Identify an episode by show id, season and episode number
    pub fn by_number(show_identifier: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            show_identifier: show_identifier.into(),
            season_number: Some(season),
            episode_number: Some(episode),
            episode_identifier: None,
        }
    }

    pub fn has_episode_identifier(&self) -> bool {
        self.episode_identifier
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

/// Identifies an album by release, or by release group to discover a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumIdentifier {
    pub release_id: Option<String>,
    pub release_group_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistIdentifier(pub String);

impl ArtistIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
