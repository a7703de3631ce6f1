use async_trait::async_trait;
use tracing::{debug, info};

use super::parser::{apply_to_artist, parse_artist, parse_biography};
use super::{MusicBrainzApi, MusicBrainzId};
use crate::media::Artist;
use crate::scrapers::{
    ArtistIdentifier, InfoField, InfoFields, JobId, Locale, ScrapeJob, ScraperError,
    ScraperSource, should_load,
};

/// Loads an artist from MusicBrainz.
///
/// The artist document and, if the biography is requested, the Wikipedia
/// extract are fetched concurrently. The job ends after both have arrived.
pub struct MusicBrainzArtistScrapeJob {
    id: JobId,
    api: MusicBrainzApi,
    locale: Locale,
    identifier: ArtistIdentifier,
    fields: InfoFields,
    artist: Artist,
}

impl MusicBrainzArtistScrapeJob {
    pub fn new(
        api: MusicBrainzApi,
        locale: Locale,
        identifier: ArtistIdentifier,
        fields: InfoFields,
        artist: Artist,
    ) -> Self {
        Self {
            id: JobId::new(),
            api,
            locale,
            identifier,
            fields,
            artist,
        }
    }
}

#[async_trait]
impl ScrapeJob for MusicBrainzArtistScrapeJob {
    type Entity = Artist;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        ScraperSource::MusicBrainz
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        let artist_id = MusicBrainzId::parse(self.identifier.as_str()).ok_or_else(|| {
            ScraperError::config("MusicBrainz artist id is invalid. Cannot load requested artist.")
        })?;
        let wants_biography = should_load(InfoField::Biography, &self.fields, &self.artist);

        info!(job_id = %self.id, artist_id = %artist_id, wants_biography, "Loading MusicBrainz artist");
        let artist_request = self.api.load_artist(&self.locale, &artist_id);
        let biography_request = async {
            if wants_biography {
                Some(self.api.load_wikipedia_extract(&self.locale, &artist_id).await)
            } else {
                None
            }
        };
        let (artist_json, biography_json) = tokio::join!(artist_request, biography_request);

        let artist_json = artist_json?;
        if artist_json.is_empty() {
            return Err(ScraperError::empty_content("MusicBrainz"));
        }
        let biography_json = biography_json.transpose()?;

        let data = parse_artist(&artist_json)?;
        apply_to_artist(&data, &mut self.artist, &self.fields);

        if let Some(json) = biography_json {
            // An artist without a Wikipedia article has no extract
            match parse_biography(&json) {
                Some(biography) => self.artist.biography = Some(biography),
                None => debug!(job_id = %self.id, artist_id = %artist_id, "No biography available"),
            }
        }
        Ok(())
    }

    fn into_entity(self: Box<Self>) -> Artist {
        self.artist
    }
}
