use async_trait::async_trait;
use tracing::info;

use super::parser::{apply_to_show, parse_show};
use super::{TvMazeApi, parse_tvmaze_id};
use crate::media::TvShow;
use crate::scrapers::{
    InfoFields, JobId, Locale, ScrapeJob, ScraperError, ScraperSource, ShowIdentifier,
};

/// Loads a TV show from TVMaze
pub struct TvMazeShowScrapeJob {
    id: JobId,
    api: TvMazeApi,
    locale: Locale,
    identifier: ShowIdentifier,
    fields: InfoFields,
    show: TvShow,
}

impl TvMazeShowScrapeJob {
    pub fn new(
        api: TvMazeApi,
        locale: Locale,
        identifier: ShowIdentifier,
        fields: InfoFields,
        show: TvShow,
    ) -> Self {
        Self {
            id: JobId::new(),
            api,
            locale,
            identifier,
            fields,
            show,
        }
    }
}

#[async_trait]
impl ScrapeJob for TvMazeShowScrapeJob {
    type Entity = TvShow;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        ScraperSource::TvMaze
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        let show_id = parse_tvmaze_id(self.identifier.as_str()).ok_or_else(|| {
            ScraperError::config("TVMaze id is invalid. Cannot load requested TV show.")
        })?;

        info!(job_id = %self.id, tvmaze_id = show_id, "Loading TVMaze show");
        let json = self.api.load_show(&self.locale, show_id).await?;
        if json.is_empty() {
            return Err(ScraperError::empty_content("TVMaze"));
        }

        let data = parse_show(&json)?;
        apply_to_show(&data, &mut self.show, &self.fields);
        Ok(())
    }

    fn into_entity(self: Box<Self>) -> TvShow {
        self.show
    }
}
