//! Builds scrape jobs for a source from an entity's stored identifiers

use std::sync::Arc;

use super::imdb::{ImdbApi, ImdbEpisodeScrapeJob, ImdbShowScrapeJob};
use super::musicbrainz::{MusicBrainzAlbumScrapeJob, MusicBrainzApi, MusicBrainzArtistScrapeJob};
use super::tvmaze::{TvMazeApi, TvMazeEpisodeScrapeJob, TvMazeShowScrapeJob};
use super::{
    AlbumIdentifier, ArtistIdentifier, BoxedScrapeJob, EpisodeIdentifier, InfoFields, Locale,
    ScraperError, ScraperSource, ShowIdentifier,
};
use crate::media::{Album, Artist, Episode, TvShow};
use crate::services::cache::ResponseCache;
use crate::services::network::Transport;

/// All scraper APIs, sharing one transport and one response cache
#[derive(Clone)]
pub struct Scrapers {
    imdb: ImdbApi,
    tvmaze: TvMazeApi,
    musicbrainz: MusicBrainzApi,
    locale: Locale,
}

fn unsupported(source: ScraperSource, kind: &str) -> ScraperError {
    ScraperError::config(format!("{} cannot scrape {}", source, kind))
}

fn missing_id(source: ScraperSource, kind: &str) -> ScraperError {
    ScraperError::config(format!("No {} id stored for this {}", source, kind))
}

impl Scrapers {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<ResponseCache>, locale: Locale) -> Self {
        Self {
            imdb: ImdbApi::new(transport.clone(), cache.clone()),
            tvmaze: TvMazeApi::new(transport.clone(), cache.clone()),
            musicbrainz: MusicBrainzApi::new(transport, cache),
            locale,
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Sources that can scrape TV shows and episodes
    pub fn tv_sources() -> [ScraperSource; 2] {
        [ScraperSource::Imdb, ScraperSource::TvMaze]
    }

    /// Sources that can scrape albums and artists
    pub fn music_sources() -> [ScraperSource; 1] {
        [ScraperSource::MusicBrainz]
    }

    pub fn show_job(
        &self,
        source: ScraperSource,
        show: &TvShow,
        fields: &InfoFields,
    ) -> Result<BoxedScrapeJob<TvShow>, ScraperError> {
        let locale = self.locale.clone();
        let scratch = show.scratch();
        match source {
            ScraperSource::Imdb => {
                let id = show.imdb_id.clone().ok_or_else(|| missing_id(source, "show"))?;
                Ok(Box::new(ImdbShowScrapeJob::new(
                    self.imdb.clone(),
                    locale,
                    ShowIdentifier::new(id),
                    fields.clone(),
                    scratch,
                )))
            }
            ScraperSource::TvMaze => {
                let id = show.tvmaze_id.ok_or_else(|| missing_id(source, "show"))?;
                Ok(Box::new(TvMazeShowScrapeJob::new(
                    self.tvmaze.clone(),
                    locale,
                    ShowIdentifier::new(id.to_string()),
                    fields.clone(),
                    scratch,
                )))
            }
            ScraperSource::MusicBrainz => Err(unsupported(source, "TV shows")),
        }
    }

    /// Episode jobs use the episode's own id if known, otherwise the parent
    /// show's id plus season and episode number
    pub fn episode_job(
        &self,
        source: ScraperSource,
        episode: &Episode,
        show: Option<&TvShow>,
        fields: &InfoFields,
    ) -> Result<BoxedScrapeJob<Episode>, ScraperError> {
        let locale = self.locale.clone();
        let scratch = episode.scratch();
        let by_number = |show_id: String| EpisodeIdentifier {
            show_identifier: show_id,
            season_number: episode.season,
            episode_number: episode.episode,
            episode_identifier: None,
        };

        match source {
            ScraperSource::Imdb => {
                let identifier = match (&episode.imdb_id, show.and_then(|s| s.imdb_id.clone())) {
                    (Some(id), _) => EpisodeIdentifier::direct(id.clone()),
                    (None, Some(show_id)) => by_number(show_id),
                    (None, None) => return Err(missing_id(source, "episode")),
                };
                Ok(Box::new(ImdbEpisodeScrapeJob::new(
                    self.imdb.clone(),
                    locale,
                    identifier,
                    fields.clone(),
                    scratch,
                )))
            }
            ScraperSource::TvMaze => {
                let identifier = match (episode.tvmaze_id, show.and_then(|s| s.tvmaze_id)) {
                    (Some(id), _) => EpisodeIdentifier::direct(id.to_string()),
                    (None, Some(show_id)) => by_number(show_id.to_string()),
                    (None, None) => return Err(missing_id(source, "episode")),
                };
                Ok(Box::new(TvMazeEpisodeScrapeJob::new(
                    self.tvmaze.clone(),
                    locale,
                    identifier,
                    fields.clone(),
                    scratch,
                )))
            }
            ScraperSource::MusicBrainz => Err(unsupported(source, "episodes")),
        }
    }

    pub fn album_job(
        &self,
        source: ScraperSource,
        album: &Album,
        fields: &InfoFields,
    ) -> Result<BoxedScrapeJob<Album>, ScraperError> {
        match source {
            ScraperSource::MusicBrainz => {
                if album.musicbrainz_release_id.is_none()
                    && album.musicbrainz_release_group_id.is_none()
                {
                    return Err(missing_id(source, "album"));
                }
                let identifier = AlbumIdentifier {
                    release_id: album.musicbrainz_release_id.clone(),
                    release_group_id: album.musicbrainz_release_group_id.clone(),
                };
                Ok(Box::new(MusicBrainzAlbumScrapeJob::new(
                    self.musicbrainz.clone(),
                    self.locale.clone(),
                    identifier,
                    fields.clone(),
                    album.scratch(),
                )))
            }
            _ => Err(unsupported(source, "albums")),
        }
    }

    pub fn artist_job(
        &self,
        source: ScraperSource,
        artist: &Artist,
        fields: &InfoFields,
    ) -> Result<BoxedScrapeJob<Artist>, ScraperError> {
        match source {
            ScraperSource::MusicBrainz => {
                let id = artist
                    .musicbrainz_id
                    .clone()
                    .ok_or_else(|| missing_id(source, "artist"))?;
                Ok(Box::new(MusicBrainzArtistScrapeJob::new(
                    self.musicbrainz.clone(),
                    self.locale.clone(),
                    ArtistIdentifier::new(id),
                    fields.clone(),
                    artist.scratch(),
                )))
            }
            _ => Err(unsupported(source, "artists")),
        }
    }
}
