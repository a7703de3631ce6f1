//! MusicBrainz scraper
//!
//! MusicBrainz is a free, open music encyclopedia that provides metadata.
//! Base URL: https://musicbrainz.org/ws/2
//!
//! Rate limiting: MusicBrainz requires at least 1 second between requests.
//! The limit is enforced by the HTTP transport, not here.

pub mod album;
pub mod artist;
pub mod parser;

use std::fmt;
use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use super::api::{ApiClient, build_url};
use super::{Locale, ScraperError};
use crate::services::cache::ResponseCache;
use crate::services::network::Transport;

pub use album::MusicBrainzAlbumScrapeJob;
pub use parser::SearchResult;
use parser::{parse_artist_search, parse_release_search};
pub use artist::MusicBrainzArtistScrapeJob;

/// A MusicBrainz entity id (a UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicBrainzId(Uuid);

impl MusicBrainzId {
    pub fn parse(id: &str) -> Option<Self> {
        Uuid::parse_str(id.trim()).ok().map(Self)
    }
}

impl fmt::Display for MusicBrainzId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// MusicBrainz web service loader
#[derive(Clone)]
pub struct MusicBrainzApi {
    client: ApiClient,
    base_url: String,
}

impl MusicBrainzApi {
    pub const BASE_URL: &'static str = "https://musicbrainz.org";

    pub fn new(transport: Arc<dyn Transport>, cache: Arc<ResponseCache>) -> Self {
        Self {
            client: ApiClient::new("MusicBrainz", transport, cache),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    pub fn release_url(&self, id: &MusicBrainzId) -> Result<Url, ScraperError> {
        build_url(&format!(
            "{}/ws/2/release/{}?inc=url-rels+labels+artist-credits+genres&fmt=json",
            self.base_url, id
        ))
    }

    pub fn release_group_url(&self, id: &MusicBrainzId) -> Result<Url, ScraperError> {
        build_url(&format!(
            "{}/ws/2/release-group/{}?inc=releases&fmt=json",
            self.base_url, id
        ))
    }

    pub fn artist_url(&self, id: &MusicBrainzId) -> Result<Url, ScraperError> {
        build_url(&format!(
            "{}/ws/2/artist/{}?inc=genres&fmt=json",
            self.base_url, id
        ))
    }

    /// Wikipedia summary that the MusicBrainz website shows for an artist
    pub fn wikipedia_extract_url(&self, id: &MusicBrainzId) -> Result<Url, ScraperError> {
        build_url(&format!(
            "{}/artist/{}/wikipedia-extract",
            self.base_url, id
        ))
    }

    fn search_url(&self, entity: &str, query: &str) -> Result<Url, ScraperError> {
        let base = format!("{}/ws/2/{}/", self.base_url, entity);
        Url::parse_with_params(&base, &[("query", query), ("fmt", "json")])
            .map_err(|e| ScraperError::config(format!("Invalid URL '{}': {}", base, e)))
    }

    pub fn search_artist_url(&self, query: &str) -> Result<Url, ScraperError> {
        self.search_url("artist", &format!("artist:{}", lucene_phrase(query)))
    }

    pub fn search_release_url(&self, query: &str) -> Result<Url, ScraperError> {
        self.search_url("release", &format!("release:{}", lucene_phrase(query)))
    }

    pub fn search_release_with_artist_url(
        &self,
        album: &str,
        artist: &str,
    ) -> Result<Url, ScraperError> {
        self.search_url(
            "release",
            &format!(
                "release:{} AND artist:{}",
                lucene_phrase(album),
                lucene_phrase(artist)
            ),
        )
    }

    pub async fn search_artists(
        &self,
        locale: &Locale,
        query: &str,
    ) -> Result<Vec<SearchResult>, ScraperError> {
        let json = self.client.get(locale, self.search_artist_url(query)?).await?;
        parse_artist_search(&json)
    }

    /// Search releases by title, narrowed to an artist when one is given
    pub async fn search_releases(
        &self,
        locale: &Locale,
        album: &str,
        artist: Option<&str>,
    ) -> Result<Vec<SearchResult>, ScraperError> {
        let url = match artist.filter(|a| !a.trim().is_empty()) {
            Some(artist) => self.search_release_with_artist_url(album, artist)?,
            None => self.search_release_url(album)?,
        };
        let json = self.client.get(locale, url).await?;
        parse_release_search(&json)
    }

    pub async fn load_release(
        &self,
        locale: &Locale,
        id: &MusicBrainzId,
    ) -> Result<String, ScraperError> {
        self.client.get(locale, self.release_url(id)?).await
    }

    pub async fn load_release_group(
        &self,
        locale: &Locale,
        id: &MusicBrainzId,
    ) -> Result<String, ScraperError> {
        self.client.get(locale, self.release_group_url(id)?).await
    }

    pub async fn load_artist(
        &self,
        locale: &Locale,
        id: &MusicBrainzId,
    ) -> Result<String, ScraperError> {
        self.client.get(locale, self.artist_url(id)?).await
    }

    pub async fn load_wikipedia_extract(
        &self,
        locale: &Locale,
        id: &MusicBrainzId,
    ) -> Result<String, ScraperError> {
        self.client.get(locale, self.wikipedia_extract_url(id)?).await
    }
}

/// Quote a search term as a Lucene phrase
fn lucene_phrase(term: &str) -> String {
    format!("\"{}\"", term.trim().replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_musicbrainz_id_is_uuid() {
        let id = MusicBrainzId::parse("5b11f4ce-a62d-471e-81fc-a69a8278c7da").unwrap();
        assert_eq!(id.to_string(), "5b11f4ce-a62d-471e-81fc-a69a8278c7da");
        assert!(MusicBrainzId::parse("nirvana").is_none());
        assert!(MusicBrainzId::parse("").is_none());
    }

    fn api() -> MusicBrainzApi {
        struct Offline;

        #[async_trait::async_trait]
        impl Transport for Offline {
            async fn get(
                &self,
                request: crate::services::network::NetworkRequest,
            ) -> crate::services::network::NetworkResponse {
                crate::services::network::NetworkResponse::failed(
                    request.url,
                    crate::services::network::TransportError::new("offline"),
                )
            }
        }

        MusicBrainzApi::new(Arc::new(Offline), Arc::new(ResponseCache::new()))
    }

    #[test]
    fn test_search_urls_quote_and_encode_terms() {
        let api = api();

        let url = api.search_artist_url("Simon & Garfunkel").unwrap();
        assert_eq!(url.path(), "/ws/2/artist/");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("query".to_string(), "artist:\"Simon & Garfunkel\"".to_string()),
                ("fmt".to_string(), "json".to_string()),
            ]
        );
        assert!(!url.as_str().contains(" & "));

        let url = api
            .search_release_with_artist_url("Nevermind", "Nirvana")
            .unwrap();
        assert_eq!(url.path(), "/ws/2/release/");
        let query = url
            .query_pairs()
            .find(|(key, _)| key == "query")
            .map(|(_, value)| value.into_owned());
        assert_eq!(
            query.as_deref(),
            Some("release:\"Nevermind\" AND artist:\"Nirvana\"")
        );
    }

    #[test]
    fn test_search_terms_escape_quotes() {
        assert_eq!(lucene_phrase(" 12\" Mix "), "\"12\\\" Mix\"");
    }
}
