use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::parser::{apply_to_episode, parse_episode_id_from_season, parse_title};
use super::{ImdbApi, ImdbId};
use crate::media::Episode;
use crate::scrapers::{
    EpisodeIdentifier, InfoFields, JobId, Locale, ScrapeJob, ScraperError, ScraperSource,
};

/// Loads one episode from IMDb.
///
/// With an episode id the title page is loaded directly. Otherwise the
/// season page of the show is loaded first to discover the episode id.
pub struct ImdbEpisodeScrapeJob {
    id: JobId,
    api: ImdbApi,
    locale: Locale,
    identifier: EpisodeIdentifier,
    fields: InfoFields,
    episode: Episode,
}

impl ImdbEpisodeScrapeJob {
    pub fn new(
        api: ImdbApi,
        locale: Locale,
        identifier: EpisodeIdentifier,
        fields: InfoFields,
        episode: Episode,
    ) -> Self {
        Self {
            id: JobId::new(),
            api,
            locale,
            identifier,
            fields,
            episode,
        }
    }

    async fn discover_episode_id(&mut self) -> Result<ImdbId, ScraperError> {
        debug!(job_id = %self.id, "Loading season page to find the episode id");

        let show_id = ImdbId::new(self.identifier.show_identifier.as_str());
        if !show_id.is_valid() {
            return Err(ScraperError::config(
                "Neither the IMDb show id nor the episode id is valid. Cannot load requested episode.",
            ));
        }
        let (Some(season), Some(number)) = (
            self.identifier.season_number,
            self.identifier.episode_number,
        ) else {
            return Err(ScraperError::config(
                "Season and episode number are required to find an episode on IMDb.",
            ));
        };

        self.episode.season = Some(season);
        self.episode.episode = Some(number);

        let html = self.api.load_season(&self.locale, &show_id, season).await?;
        if html.is_empty() {
            return Err(ScraperError::empty_content("IMDb season"));
        }

        match parse_episode_id_from_season(&html, season, number) {
            Some(episode_id) => {
                self.episode.imdb_id = Some(episode_id.to_string());
                Ok(episode_id)
            }
            None => {
                warn!(job_id = %self.id, show_id = %show_id, season, episode = number,
                    "Could not find episode on IMDb season page");
                Err(ScraperError::config(
                    "IMDb id could not be found on the season page. Cannot load requested episode.",
                ))
            }
        }
    }

    async fn load_episode(&mut self, episode_id: ImdbId) -> Result<(), ScraperError> {
        if !episode_id.is_valid() {
            return Err(ScraperError::config(
                "IMDb id is invalid. Cannot load requested episode.",
            ));
        }

        info!(job_id = %self.id, imdb_id = %episode_id, "Loading IMDb episode");
        let html = self.api.load_title(&self.locale, &episode_id).await?;
        if html.is_empty() {
            return Err(ScraperError::empty_content("IMDb"));
        }

        let title = parse_title(&html)?;
        apply_to_episode(&title, &mut self.episode, &self.fields);
        if self.episode.imdb_id.is_none() {
            self.episode.imdb_id = Some(episode_id.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl ScrapeJob for ImdbEpisodeScrapeJob {
    type Entity = Episode;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        ScraperSource::Imdb
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        let episode_id = if self.identifier.has_episode_identifier() {
            ImdbId::new(self.identifier.episode_identifier.clone().unwrap_or_default())
        } else {
            self.discover_episode_id().await?
        };
        self.load_episode(episode_id).await
    }

    fn into_entity(self: Box<Self>) -> Episode {
        self.episode
    }
}
