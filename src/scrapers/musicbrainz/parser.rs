//! MusicBrainz JSON documents and how they map onto library entities

use serde::{Deserialize, Serialize};

use super::MusicBrainzId;
use crate::media::{Album, Artist};
use crate::scrapers::{InfoField, InfoFields, ScraperError, should_load};
use crate::services::text_utils::clean_optional;

/// Release lookup (`/ws/2/release/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzRelease {
    pub id: String,
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<MusicBrainzArtistCredit>,
    #[serde(rename = "label-info", default)]
    pub label_info: Vec<MusicBrainzLabelInfo>,
    #[serde(rename = "release-events", default)]
    pub release_events: Vec<MusicBrainzReleaseEvent>,
    #[serde(rename = "release-group")]
    pub release_group: Option<MusicBrainzReleaseGroupRef>,
    #[serde(default)]
    pub genres: Vec<MusicBrainzGenre>,
    #[serde(default)]
    pub relations: Vec<MusicBrainzRelation>,
}

/// URL relationship (`inc=url-rels`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzRelation {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub url: Option<MusicBrainzUrl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzUrl {
    pub resource: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzArtistCredit {
    pub name: Option<String>,
    pub joinphrase: Option<String>,
    pub artist: Option<MusicBrainzArtistRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzLabelInfo {
    pub label: Option<MusicBrainzLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzLabel {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzReleaseEvent {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzReleaseGroupRef {
    pub id: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzGenre {
    pub name: String,
}

/// Release group lookup, only used to discover a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzReleaseGroup {
    pub id: String,
    #[serde(default)]
    pub releases: Vec<MusicBrainzReleaseRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzReleaseRef {
    pub id: String,
}

/// Artist lookup (`/ws/2/artist/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzArtist {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub genres: Vec<MusicBrainzGenre>,
}

/// Artist search (`/ws/2/artist/?query=...`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicBrainzArtistSearch {
    #[serde(default)]
    pub artists: Vec<MusicBrainzArtistHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzArtistHit {
    pub id: String,
    pub name: String,
    pub disambiguation: Option<String>,
    pub score: Option<u32>,
}

/// Release search (`/ws/2/release/?query=...`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicBrainzReleaseSearch {
    #[serde(default)]
    pub releases: Vec<MusicBrainzRelease>,
}

/// One search hit, ready to be shown to a user who picks the right entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
}

/// Response of the artist page's Wikipedia extract endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikipediaExtractResponse {
    pub wikipedia_extract: Option<WikipediaExtract>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikipediaExtract {
    pub content: Option<String>,
    pub url: Option<String>,
}

impl MusicBrainzRelease {
    /// Credited artists joined by their join phrases
    pub fn artist_names(&self) -> Option<String> {
        let mut names = String::new();
        let mut join_phrase: Option<&str> = None;

        for credit in &self.artist_credit {
            let Some(name) = credit
                .name
                .as_deref()
                .or(credit.artist.as_ref().map(|a| a.name.as_str()))
            else {
                continue;
            };
            if !names.is_empty() {
                names.push_str(join_phrase.filter(|p| !p.is_empty()).unwrap_or(", "));
            }
            names.push_str(name);
            join_phrase = credit.joinphrase.as_deref();
        }

        (!names.is_empty()).then_some(names)
    }

    pub fn labels(&self) -> Option<String> {
        let labels: Vec<&str> = self
            .label_info
            .iter()
            .filter_map(|info| info.label.as_ref().map(|l| l.name.as_str()))
            .collect();
        (!labels.is_empty()).then(|| labels.join(", "))
    }

    fn relation_url(&self, relation_type: &str) -> Option<&str> {
        self.relations
            .iter()
            .filter(|r| r.relation_type == relation_type)
            .find_map(|r| r.url.as_ref().map(|u| u.resource.as_str()))
    }

    /// AllMusic album id taken from an `allmusic.com/album/<id>` relation
    pub fn allmusic_id(&self) -> Option<String> {
        let (_, id) = self.relation_url("allmusic")?.split_once("allmusic.com/album/")?;
        let id = id.trim_end_matches('/');
        (!id.is_empty()).then(|| id.to_string())
    }

    pub fn discogs_url(&self) -> Option<String> {
        self.relation_url("discogs").map(str::to_string)
    }

    /// Date of the first release event, falling back to the release date
    pub fn release_date(&self) -> Option<String> {
        self.release_events
            .first()
            .and_then(|e| e.date.clone())
            .or_else(|| self.date.clone())
            .filter(|d| !d.is_empty())
    }
}

fn genre_names(genres: &[MusicBrainzGenre]) -> Option<Vec<String>> {
    (!genres.is_empty()).then(|| genres.iter().map(|g| g.name.clone()).collect())
}

pub fn parse_release(json: &str) -> Result<MusicBrainzRelease, ScraperError> {
    serde_json::from_str(json)
        .map_err(|e| ScraperError::parse(format!("Failed to parse MusicBrainz release: {}", e)))
}

pub fn parse_artist(json: &str) -> Result<MusicBrainzArtist, ScraperError> {
    serde_json::from_str(json)
        .map_err(|e| ScraperError::parse(format!("Failed to parse MusicBrainz artist: {}", e)))
}

/// Artist search hits, best match first. Entries without a valid id are dropped.
pub fn parse_artist_search(json: &str) -> Result<Vec<SearchResult>, ScraperError> {
    let search: MusicBrainzArtistSearch = serde_json::from_str(json).map_err(|e| {
        ScraperError::parse(format!("Failed to parse MusicBrainz artist search: {}", e))
    })?;

    let mut hits = search.artists;
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(hits
        .into_iter()
        .filter(|hit| MusicBrainzId::parse(&hit.id).is_some())
        .map(|hit| SearchResult {
            name: match hit.disambiguation.as_deref().filter(|d| !d.is_empty()) {
                Some(disambiguation) => format!("{} ({})", hit.name, disambiguation),
                None => hit.name,
            },
            id: hit.id,
        })
        .collect())
}

/// Release search hits named "Title - Artist (Date)"
pub fn parse_release_search(json: &str) -> Result<Vec<SearchResult>, ScraperError> {
    let search: MusicBrainzReleaseSearch = serde_json::from_str(json).map_err(|e| {
        ScraperError::parse(format!("Failed to parse MusicBrainz release search: {}", e))
    })?;

    Ok(search
        .releases
        .iter()
        .filter(|release| MusicBrainzId::parse(&release.id).is_some())
        .map(|release| {
            let mut name = release.title.clone().unwrap_or_default();
            if let Some(artist) = release.artist_names() {
                name = format!("{} - {}", name, artist);
            }
            if let Some(date) = release.release_date() {
                name = format!("{} ({})", name, date);
            }
            SearchResult {
                id: release.id.clone(),
                name,
            }
        })
        .collect())
}

/// First release of a release group
pub fn parse_release_id_from_group(json: &str) -> Option<MusicBrainzId> {
    let group: MusicBrainzReleaseGroup = serde_json::from_str(json).ok()?;
    group
        .releases
        .iter()
        .find_map(|release| MusicBrainzId::parse(&release.id))
}

/// Plain text biography from a Wikipedia extract document. Malformed
/// documents yield no biography.
pub fn parse_biography(json: &str) -> Option<String> {
    let response: WikipediaExtractResponse = serde_json::from_str(json).ok()?;
    clean_optional(response.wikipedia_extract?.content.as_deref())
}

/// Write the requested parts of a release into `album`
pub fn apply_to_album(release: &MusicBrainzRelease, album: &mut Album, fields: &InfoFields) {
    if should_load(InfoField::Title, fields, album) {
        album.title = release.title.clone();
    }
    if should_load(InfoField::Artist, fields, album) {
        album.artist = release.artist_names();
    }
    if should_load(InfoField::Label, fields, album) {
        album.label = release.labels();
    }
    if should_load(InfoField::ReleaseDate, fields, album) {
        album.release_date = release.release_date();
    }
    if should_load(InfoField::Genres, fields, album) {
        album.genres = genre_names(&release.genres);
    }

    album.musicbrainz_release_id = Some(release.id.clone());
    if let Some(id) = release.allmusic_id() {
        album.allmusic_id.get_or_insert(id);
    }
    if let Some(url) = release.discogs_url() {
        album.discogs_url.get_or_insert(url);
    }
    if let Some(group) = &release.release_group {
        album
            .musicbrainz_release_group_id
            .get_or_insert_with(|| group.id.clone());
    }
}

/// Write the requested parts of an artist document into `artist`
pub fn apply_to_artist(data: &MusicBrainzArtist, artist: &mut Artist, fields: &InfoFields) {
    if should_load(InfoField::Name, fields, artist) {
        artist.name = data.name.clone();
    }
    if should_load(InfoField::Genres, fields, artist) {
        artist.genres = genre_names(&data.genres);
    }
    artist.musicbrainz_id.get_or_insert_with(|| data.id.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RELEASE: &str = r#"{
        "id": "0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d",
        "title": "Bridge over Troubled Water",
        "date": "1970-02-01",
        "artist-credit": [
            {"name": "Simon", "joinphrase": " & ", "artist": {"id": "a", "name": "Paul Simon"}},
            {"name": "Garfunkel", "joinphrase": "", "artist": {"id": "b", "name": "Art Garfunkel"}}
        ],
        "label-info": [{"label": {"name": "Columbia"}}, {"label": null}, {"label": {"name": "CBS"}}],
        "release-events": [{"date": "1970-01-26"}],
        "release-group": {"id": "3c4c1b2f-0000-4000-8000-000000000001", "title": "Bridge"},
        "genres": [{"name": "folk rock"}],
        "relations": [
            {"type": "discogs", "url": {"resource": "https://www.discogs.com/release/1234567"}},
            {"type": "allmusic", "url": {"resource": "https://www.allmusic.com/album/mw0000189383"}},
            {"type": "wikidata", "url": {"resource": "https://www.wikidata.org/wiki/Q193483"}}
        ]
    }"#;

    #[test]
    fn test_release_maps_album_fields() {
        let release = parse_release(RELEASE).unwrap();
        let mut album = Album::new();
        apply_to_album(&release, &mut album, &InfoField::all());

        assert_eq!(album.title.as_deref(), Some("Bridge over Troubled Water"));
        assert_eq!(album.artist.as_deref(), Some("Simon & Garfunkel"));
        assert_eq!(album.label.as_deref(), Some("Columbia, CBS"));
        assert_eq!(album.release_date.as_deref(), Some("1970-01-26"));
        assert_eq!(album.genres, Some(vec!["folk rock".to_string()]));
        assert_eq!(album.allmusic_id.as_deref(), Some("mw0000189383"));
        assert_eq!(
            album.discogs_url.as_deref(),
            Some("https://www.discogs.com/release/1234567")
        );
        assert_eq!(
            album.musicbrainz_release_group_id.as_deref(),
            Some("3c4c1b2f-0000-4000-8000-000000000001")
        );
    }

    #[test]
    fn test_missing_join_phrase_defaults_to_comma() {
        let release = parse_release(
            r#"{"id": "x", "artist-credit": [
                {"name": "A", "artist": {"id": "1", "name": "A"}},
                {"name": "B", "artist": {"id": "2", "name": "B"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(release.artist_names().as_deref(), Some("A, B"));
    }

    #[test]
    fn test_release_id_from_group() {
        let id = parse_release_id_from_group(
            r#"{"id": "g", "releases": [{"id": "not-a-uuid"}, {"id": "0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d"}]}"#,
        );
        assert_eq!(
            id.map(|id| id.to_string()).as_deref(),
            Some("0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d")
        );
        assert!(parse_release_id_from_group(r#"{"id": "g", "releases": []}"#).is_none());
    }

    #[test]
    fn test_biography_is_plain_text() {
        let bio = parse_biography(
            r#"{"wikipediaExtract": {"content": "<p>Nirvana was an American <b>rock</b> band.</p>", "url": "u"}}"#,
        );
        assert_eq!(bio.as_deref(), Some("Nirvana was an American rock band."));
        assert!(parse_biography("{}").is_none());
        assert!(parse_biography("not json").is_none());
    }

    #[test]
    fn test_release_without_relations_has_no_external_ids() {
        let release = parse_release(
            r#"{"id": "x", "relations": [{"type": "allmusic", "url": {"resource": "https://www.allmusic.com/artist/mn0000"}}]}"#,
        )
        .unwrap();
        assert_eq!(release.allmusic_id(), None);
        assert_eq!(release.discogs_url(), None);
    }

    #[test]
    fn test_artist_search_orders_by_score() {
        let hits = parse_artist_search(
            r#"{"artists": [
                {"id": "0a1b2c3d-0000-4000-8000-000000000002", "name": "Nirvana", "disambiguation": "60s band from the UK", "score": 88},
                {"id": "5b11f4ce-a62d-471e-81fc-a69a8278c7da", "name": "Nirvana", "disambiguation": "90s US grunge band", "score": 100},
                {"id": "broken", "name": "Nirvana", "score": 50}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            hits,
            vec![
                SearchResult {
                    id: "5b11f4ce-a62d-471e-81fc-a69a8278c7da".to_string(),
                    name: "Nirvana (90s US grunge band)".to_string(),
                },
                SearchResult {
                    id: "0a1b2c3d-0000-4000-8000-000000000002".to_string(),
                    name: "Nirvana (60s band from the UK)".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_release_search_names_include_artist_and_date() {
        let hits = parse_release_search(&format!(r#"{{"releases": [{}]}}"#, RELEASE)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].name,
            "Bridge over Troubled Water - Simon & Garfunkel (1970-01-26)"
        );
        assert!(parse_release_search("<html>").is_err());
        assert!(parse_release_search("{}").unwrap().is_empty());
    }
}
