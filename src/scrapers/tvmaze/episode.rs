use async_trait::async_trait;
use tracing::info;

use super::parser::{apply_to_episode, parse_episode};
use super::{TvMazeApi, parse_tvmaze_id};
use crate::media::Episode;
use crate::scrapers::{
    EpisodeIdentifier, InfoFields, JobId, Locale, ScrapeJob, ScraperError, ScraperSource,
};

/// Loads one episode from TVMaze.
///
/// TVMaze resolves show id plus season and episode number server side, so
/// both paths need a single request.
pub struct TvMazeEpisodeScrapeJob {
    id: JobId,
    api: TvMazeApi,
    locale: Locale,
    identifier: EpisodeIdentifier,
    fields: InfoFields,
    episode: Episode,
}

impl TvMazeEpisodeScrapeJob {
    pub fn new(
        api: TvMazeApi,
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

    async fn fetch(&self) -> Result<String, ScraperError> {
        if self.identifier.has_episode_identifier() {
            let episode_id = self
                .identifier
                .episode_identifier
                .as_deref()
                .and_then(parse_tvmaze_id)
                .ok_or_else(|| {
                    ScraperError::config("TVMaze episode id is invalid. Cannot load requested episode.")
                })?;
            info!(job_id = %self.id, tvmaze_id = episode_id, "Loading TVMaze episode");
            return self.api.load_episode(&self.locale, episode_id).await;
        }

        let show_id = parse_tvmaze_id(&self.identifier.show_identifier).ok_or_else(|| {
            ScraperError::config(
                "Neither the TVMaze show id nor the episode id is valid. Cannot load requested episode.",
            )
        })?;
        let (Some(season), Some(number)) = (
            self.identifier.season_number,
            self.identifier.episode_number,
        ) else {
            return Err(ScraperError::config(
                "Season and episode number are required to find an episode on TVMaze.",
            ));
        };

        info!(job_id = %self.id, tvmaze_id = show_id, season, episode = number,
            "Loading TVMaze episode by number");
        self.api
            .load_episode_by_number(&self.locale, show_id, season, number)
            .await
    }
}

#[async_trait]
impl ScrapeJob for TvMazeEpisodeScrapeJob {
    type Entity = Episode;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        ScraperSource::TvMaze
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        let json = self.fetch().await?;
        if json.is_empty() {
            return Err(ScraperError::empty_content("TVMaze"));
        }

        let data = parse_episode(&json)?;
        apply_to_episode(&data, &mut self.episode, &self.fields);
        Ok(())
    }

    fn into_entity(self: Box<Self>) -> Episode {
        self.episode
    }
}
