use async_trait::async_trait;
use tracing::info;

use super::parser::{apply_to_show, parse_title};
use super::{ImdbApi, ImdbId};
use crate::media::TvShow;
use crate::scrapers::{
    InfoFields, JobId, Locale, ScrapeJob, ScraperError, ScraperSource, ShowIdentifier,
};

/// Loads a TV show's title page from IMDb
pub struct ImdbShowScrapeJob {
    id: JobId,
    api: ImdbApi,
    locale: Locale,
    identifier: ShowIdentifier,
    fields: InfoFields,
    show: TvShow,
}

impl ImdbShowScrapeJob {
    pub fn new(
        api: ImdbApi,
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
impl ScrapeJob for ImdbShowScrapeJob {
    type Entity = TvShow;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        ScraperSource::Imdb
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        let show_id = ImdbId::new(self.identifier.as_str());
        if !show_id.is_valid() {
            return Err(ScraperError::config(
                "IMDb id is invalid. Cannot load requested TV show.",
            ));
        }

        info!(job_id = %self.id, imdb_id = %show_id, "Loading IMDb show");
        let html = self.api.load_title(&self.locale, &show_id).await?;
        if html.is_empty() {
            return Err(ScraperError::empty_content("IMDb"));
        }

        let title = parse_title(&html)?;
        apply_to_show(&title, &mut self.show, &self.fields);
        if self.show.imdb_id.is_none() {
            self.show.imdb_id = Some(show_id.to_string());
        }
        Ok(())
    }

    fn into_entity(self: Box<Self>) -> TvShow {
        self.show
    }
}
