use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::parser::{apply_to_album, parse_release, parse_release_id_from_group};
use super::{MusicBrainzApi, MusicBrainzId};
use crate::media::Album;
use crate::scrapers::{
    AlbumIdentifier, InfoFields, JobId, Locale, ScrapeJob, ScraperError, ScraperSource,
};

/// Loads an album from MusicBrainz.
///
/// A release id is loaded directly. With only a release group id the group
/// is loaded first and its first release is used.
pub struct MusicBrainzAlbumScrapeJob {
    id: JobId,
    api: MusicBrainzApi,
    locale: Locale,
    identifier: AlbumIdentifier,
    fields: InfoFields,
    album: Album,
}

impl MusicBrainzAlbumScrapeJob {
    pub fn new(
        api: MusicBrainzApi,
        locale: Locale,
        identifier: AlbumIdentifier,
        fields: InfoFields,
        album: Album,
    ) -> Self {
        Self {
            id: JobId::new(),
            api,
            locale,
            identifier,
            fields,
            album,
        }
    }

    async fn discover_release_id(&mut self) -> Result<MusicBrainzId, ScraperError> {
        let group_id = self
            .identifier
            .release_group_id
            .as_deref()
            .and_then(MusicBrainzId::parse)
            .ok_or_else(|| {
                ScraperError::config(
                    "Neither the MusicBrainz release id nor the release group id is valid. Cannot load requested album.",
                )
            })?;

        debug!(job_id = %self.id, release_group_id = %group_id, "Loading release group to find a release");
        let json = self.api.load_release_group(&self.locale, &group_id).await?;
        if json.is_empty() {
            return Err(ScraperError::empty_content("MusicBrainz release group"));
        }

        match parse_release_id_from_group(&json) {
            Some(release_id) => {
                self.album.musicbrainz_release_group_id = Some(group_id.to_string());
                Ok(release_id)
            }
            None => {
                warn!(job_id = %self.id, release_group_id = %group_id, "Release group has no releases");
                Err(ScraperError::config(
                    "No release found in the MusicBrainz release group. Cannot load requested album.",
                ))
            }
        }
    }
}

#[async_trait]
impl ScrapeJob for MusicBrainzAlbumScrapeJob {
    type Entity = Album;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        ScraperSource::MusicBrainz
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        let release_id = match self.identifier.release_id.clone() {
            Some(id) if !id.trim().is_empty() => MusicBrainzId::parse(&id).ok_or_else(|| {
                ScraperError::config("MusicBrainz release id is invalid. Cannot load requested album.")
            })?,
            _ => self.discover_release_id().await?,
        };

        info!(job_id = %self.id, release_id = %release_id, "Loading MusicBrainz release");
        let json = self.api.load_release(&self.locale, &release_id).await?;
        if json.is_empty() {
            return Err(ScraperError::empty_content("MusicBrainz"));
        }

        let release = parse_release(&json)?;
        apply_to_album(&release, &mut self.album, &self.fields);
        Ok(())
    }

    fn into_entity(self: Box<Self>) -> Album {
        self.album
    }
}
