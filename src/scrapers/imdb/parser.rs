//! IMDb HTML parsing
//!
//! Title pages embed a JSON-LD document (`<script type="application/ld+json">`)
//! which carries everything we need. Season pages are only used to discover
//! the id of an episode.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use super::ImdbId;
use crate::media::{Episode, TvShow};
use crate::scrapers::{InfoField, InfoFields, ScraperError, should_load};
use crate::services::text_utils::html_unescape;

static LD_JSON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static TITLE_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/title/tt"]"#).unwrap());
static EPISODE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"S(\d+)\.E(\d+)").unwrap());
static TITLE_HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/title/(tt\d+)").unwrap());
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?").unwrap());

/// Data extracted from a title page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImdbTitle {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_published: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub directors: Vec<String>,
    pub creators: Vec<String>,
    pub image: Option<String>,
    pub content_rating: Option<String>,
    pub genres: Vec<String>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
}

/// Find the id of episode `season`x`episode` on a season page
pub fn parse_episode_id_from_season(html: &str, season: u32, episode: u32) -> Option<ImdbId> {
    let document = Html::parse_document(html);

    document.select(&TITLE_LINK_SELECTOR).find_map(|link| {
        let text: String = link.text().collect();
        let caps = EPISODE_NUMBER_RE.captures(&text)?;
        let found_season: u32 = caps[1].parse().ok()?;
        let found_episode: u32 = caps[2].parse().ok()?;
        if found_season != season || found_episode != episode {
            return None;
        }

        let href = link.value().attr("href")?;
        let id = TITLE_HREF_RE.captures(href)?;
        ImdbId::parse(&id[1])
    })
}

/// Parse a title reference page
pub fn parse_title(html: &str) -> Result<ImdbTitle, ScraperError> {
    let document = Html::parse_document(html);

    let json = document
        .select(&LD_JSON_SELECTOR)
        .find_map(|script| {
            let text: String = script.text().collect();
            serde_json::from_str::<Value>(&text).ok()
        })
        .ok_or_else(|| ScraperError::parse("IMDb page contains no structured title data"))?;

    Ok(ImdbTitle {
        name: string_field(&json, "name"),
        description: string_field(&json, "description"),
        date_published: string_field(&json, "datePublished")
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        rating: json
            .get("aggregateRating")
            .and_then(|r| r.get("ratingValue"))
            .and_then(number_value),
        directors: person_names(json.get("director")),
        creators: person_names(json.get("creator")),
        image: string_field(&json, "image"),
        content_rating: string_field(&json, "contentRating"),
        genres: string_list(json.get("genre")),
        runtime: string_field(&json, "duration").and_then(|d| parse_duration(&d)),
    })
}

/// Write the requested parts of `title` into an episode
pub fn apply_to_episode(title: &ImdbTitle, episode: &mut Episode, fields: &InfoFields) {
    if should_load(InfoField::Title, fields, episode) {
        episode.title = title.name.clone();
    }
    if should_load(InfoField::Overview, fields, episode) {
        episode.overview = title.description.clone();
    }
    if should_load(InfoField::FirstAired, fields, episode) {
        episode.first_aired = title.date_published;
    }
    if should_load(InfoField::Rating, fields, episode) {
        episode.rating = title.rating;
    }
    if should_load(InfoField::Director, fields, episode) {
        episode.directors = non_empty(&title.directors);
    }
    if should_load(InfoField::Writer, fields, episode) {
        episode.writers = non_empty(&title.creators);
    }
    if should_load(InfoField::Thumbnail, fields, episode) {
        episode.thumbnail = title.image.clone();
    }
    if should_load(InfoField::Certification, fields, episode) {
        episode.certification = title.content_rating.clone();
    }
}

/// Write the requested parts of `title` into a show
pub fn apply_to_show(title: &ImdbTitle, show: &mut TvShow, fields: &InfoFields) {
    if should_load(InfoField::Title, fields, show) {
        show.title = title.name.clone();
    }
    if should_load(InfoField::Overview, fields, show) {
        show.overview = title.description.clone();
    }
    if should_load(InfoField::FirstAired, fields, show) {
        show.first_aired = title.date_published;
    }
    if should_load(InfoField::Rating, fields, show) {
        show.rating = title.rating;
    }
    if should_load(InfoField::Genres, fields, show) {
        show.genres = non_empty(&title.genres);
    }
    if should_load(InfoField::Runtime, fields, show) {
        show.runtime = title.runtime;
    }
    if should_load(InfoField::Certification, fields, show) {
        show.certification = title.content_rating.clone();
    }
    if should_load(InfoField::Thumbnail, fields, show) {
        show.thumbnail = title.image.clone();
    }
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(Value::as_str)
        .map(|s| html_unescape(s.trim()))
        .filter(|s| !s.is_empty())
}

fn number_value(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// `director` / `creator` may be a single object or a list; organisations
/// are skipped
fn person_names(value: Option<&Value>) -> Vec<String> {
    let people: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    };

    people
        .into_iter()
        .filter(|p| p.get("@type").and_then(Value::as_str) != Some("Organization"))
        .filter_map(|p| p.get("name").and_then(Value::as_str))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// ISO 8601 duration such as `PT1H2M` to minutes
fn parse_duration(duration: &str) -> Option<u32> {
    let caps = DURATION_RE.captures(duration)?;
    let hours: u32 = caps.get(1).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let minutes: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    (total > 0).then_some(total)
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASON_PAGE: &str = r#"
        <html><body>
          <article><a href="/title/tt1480055/?ref_=ttep_ep1"><div>S1.E1 ∙ Winter Is Coming</div></a></article>
          <article><a href="/title/tt1668746/?ref_=ttep_ep2"><div>S1.E2 ∙ The Kingsroad</div></a></article>
        </body></html>
    "#;

    const TITLE_PAGE: &str = r#"
        <html><head>
          <script type="application/ld+json">
            {"@type":"TVEpisode","name":"The Kingsroad",
             "description":"While Bran recovers, Catelyn &amp; Ned travel.",
             "datePublished":"2011-04-24",
             "aggregateRating":{"ratingValue":8.6},
             "director":{"@type":"Person","name":"Tim Van Patten"},
             "creator":[{"@type":"Organization","name":"HBO"},{"@type":"Person","name":"David Benioff"}],
             "image":"https://m.media-amazon.com/images/kingsroad.jpg",
             "contentRating":"TV-MA",
             "genre":["Action","Drama"],
             "duration":"PT56M"}
          </script>
        </head><body></body></html>
    "#;

    #[test]
    fn test_parse_episode_id_from_season() {
        let id = parse_episode_id_from_season(SEASON_PAGE, 1, 2).unwrap();
        assert_eq!(id.as_str(), "tt1668746");
        assert!(parse_episode_id_from_season(SEASON_PAGE, 1, 9).is_none());
        assert!(parse_episode_id_from_season("<html></html>", 1, 1).is_none());
    }

    #[test]
    fn test_parse_title() {
        let title = parse_title(TITLE_PAGE).unwrap();
        assert_eq!(title.name.as_deref(), Some("The Kingsroad"));
        assert_eq!(
            title.description.as_deref(),
            Some("While Bran recovers, Catelyn & Ned travel.")
        );
        assert_eq!(title.date_published, NaiveDate::from_ymd_opt(2011, 4, 24));
        assert_eq!(title.rating, Some(8.6));
        assert_eq!(title.directors, vec!["Tim Van Patten"]);
        assert_eq!(title.creators, vec!["David Benioff"]);
        assert_eq!(title.genres, vec!["Action", "Drama"]);
        assert_eq!(title.runtime, Some(56));
    }

    #[test]
    fn test_missing_structured_data_is_parse_error() {
        let err = parse_title("<html><body>nothing here</body></html>").unwrap_err();
        assert_eq!(err.kind, crate::scrapers::ScraperErrorKind::ParseError);
    }

    #[test]
    fn test_apply_only_requested_fields() {
        let title = parse_title(TITLE_PAGE).unwrap();
        let mut episode = Episode::new(1, 2);
        let fields: InfoFields = [InfoField::Title, InfoField::Director].into_iter().collect();
        apply_to_episode(&title, &mut episode, &fields);

        assert_eq!(episode.title.as_deref(), Some("The Kingsroad"));
        assert_eq!(episode.directors, Some(vec!["Tim Van Patten".to_string()]));
        assert!(episode.overview.is_none());
        assert!(episode.rating.is_none());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("PT1H2M"), Some(62));
        assert_eq!(parse_duration("PT45M"), Some(45));
        assert_eq!(parse_duration("P1D"), None);
        assert_eq!(parse_duration("PT71583000H"), None);
    }

    #[test]
    fn test_absurd_runtime_is_ignored() {
        let html = r#"<script type="application/ld+json">{"name": "Epic", "duration": "PT71583000H"}</script>"#;
        let title = parse_title(html).unwrap();
        assert_eq!(title.name.as_deref(), Some("Epic"));
        assert_eq!(title.runtime, None);
    }
}
