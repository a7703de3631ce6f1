//! TVMaze JSON documents and how they map onto library entities

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::media::{Episode, TvShow};
use crate::scrapers::{InfoField, InfoFields, ScraperError, should_load};
use crate::services::text_utils::clean_optional;

/// Show details from TVMaze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeShow {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub runtime: Option<u32>,
    #[serde(rename = "averageRuntime")]
    pub average_runtime: Option<u32>,
    pub premiered: Option<String>,
    pub network: Option<TvMazeNetwork>,
    #[serde(rename = "webChannel")]
    pub web_channel: Option<TvMazeNetwork>,
    pub image: Option<TvMazeImage>,
    pub summary: Option<String>,
    pub rating: Option<TvMazeRating>,
    pub externals: Option<TvMazeExternals>,
}

/// Network or web channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeNetwork {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeImage {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeRating {
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeExternals {
    pub thetvdb: Option<u32>,
    pub imdb: Option<String>,
}

/// Episode from TVMaze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeEpisode {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub season: Option<u32>,
    pub number: Option<u32>,
    pub airdate: Option<String>,
    pub image: Option<TvMazeImage>,
    pub summary: Option<String>,
    pub rating: Option<TvMazeRating>,
}

impl TvMazeImage {
    fn best(&self) -> Option<String> {
        self.original.clone().or_else(|| self.medium.clone())
    }
}

pub fn parse_show(json: &str) -> Result<TvMazeShow, ScraperError> {
    serde_json::from_str(json)
        .map_err(|e| ScraperError::parse(format!("Failed to parse TVMaze show: {}", e)))
}

pub fn parse_episode(json: &str) -> Result<TvMazeEpisode, ScraperError> {
    serde_json::from_str(json)
        .map_err(|e| ScraperError::parse(format!("Failed to parse TVMaze episode: {}", e)))
}

fn parse_date(date: Option<&str>) -> Option<NaiveDate> {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// Write the requested parts of a TVMaze show into `show`
pub fn apply_to_show(data: &TvMazeShow, show: &mut TvShow, fields: &InfoFields) {
    if should_load(InfoField::Title, fields, show) {
        show.title = data.name.clone();
    }
    if should_load(InfoField::Overview, fields, show) {
        show.overview = clean_optional(data.summary.as_deref());
    }
    if should_load(InfoField::FirstAired, fields, show) {
        show.first_aired = parse_date(data.premiered.as_deref());
    }
    if should_load(InfoField::Rating, fields, show) {
        show.rating = data.rating.as_ref().and_then(|r| r.average);
    }
    if should_load(InfoField::Genres, fields, show) && !data.genres.is_empty() {
        show.genres = Some(data.genres.clone());
    }
    if should_load(InfoField::Network, fields, show) {
        show.network = data
            .network
            .as_ref()
            .or(data.web_channel.as_ref())
            .map(|n| n.name.clone());
    }
    if should_load(InfoField::Runtime, fields, show) {
        show.runtime = data.runtime.or(data.average_runtime);
    }
    if should_load(InfoField::Thumbnail, fields, show) {
        show.thumbnail = data.image.as_ref().and_then(TvMazeImage::best);
    }

    show.tvmaze_id = Some(data.id);
    if let Some(imdb) = data.externals.as_ref().and_then(|e| e.imdb.clone()) {
        show.imdb_id.get_or_insert(imdb);
    }
}

/// Write the requested parts of a TVMaze episode into `episode`
pub fn apply_to_episode(data: &TvMazeEpisode, episode: &mut Episode, fields: &InfoFields) {
    if should_load(InfoField::Title, fields, episode) {
        episode.title = data.name.clone();
    }
    if should_load(InfoField::Overview, fields, episode) {
        episode.overview = clean_optional(data.summary.as_deref());
    }
    if should_load(InfoField::FirstAired, fields, episode) {
        episode.first_aired = parse_date(data.airdate.as_deref());
    }
    if should_load(InfoField::Rating, fields, episode) {
        episode.rating = data.rating.as_ref().and_then(|r| r.average);
    }
    if should_load(InfoField::Thumbnail, fields, episode) {
        episode.thumbnail = data.image.as_ref().and_then(TvMazeImage::best);
    }

    episode.tvmaze_id = Some(data.id);
    episode.season = data.season.or(episode.season);
    episode.episode = data.number.or(episode.episode);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW: &str = r#"{
        "id": 17861, "name": "Dark", "genres": ["Drama", "Mystery"],
        "runtime": null, "averageRuntime": 56, "premiered": "2017-12-01",
        "network": null, "webChannel": {"id": 1, "name": "Netflix"},
        "image": {"medium": "m.jpg", "original": "o.jpg"},
        "summary": "<p>A family saga with a <b>supernatural</b> twist.</p>",
        "rating": {"average": 8.7},
        "externals": {"thetvdb": 334824, "imdb": "tt5753856"}
    }"#;

    #[test]
    fn test_show_maps_all_fields() {
        let data = parse_show(SHOW).unwrap();
        let mut show = TvShow::new();
        apply_to_show(&data, &mut show, &InfoField::all());

        assert_eq!(show.title.as_deref(), Some("Dark"));
        assert_eq!(
            show.overview.as_deref(),
            Some("A family saga with a supernatural twist.")
        );
        assert_eq!(show.first_aired, NaiveDate::from_ymd_opt(2017, 12, 1));
        assert_eq!(show.network.as_deref(), Some("Netflix"));
        assert_eq!(show.runtime, Some(56));
        assert_eq!(show.thumbnail.as_deref(), Some("o.jpg"));
        assert_eq!(show.tvmaze_id, Some(17861));
        assert_eq!(show.imdb_id.as_deref(), Some("tt5753856"));
    }

    #[test]
    fn test_missing_optional_fields_are_tolerated() {
        let data = parse_episode(r#"{"id": 1, "season": 1, "number": 1}"#).unwrap();
        let mut episode = Episode::new(1, 1);
        apply_to_episode(&data, &mut episode, &InfoField::all());
        assert!(episode.title.is_none());
        assert!(episode.first_aired.is_none());
        assert_eq!(episode.tvmaze_id, Some(1));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_show("<html>").unwrap_err();
        assert_eq!(err.kind, crate::scrapers::ScraperErrorKind::ParseError);
    }
}
