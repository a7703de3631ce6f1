//! TV show and episode records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Mergeable;
use crate::scrapers::info::{fill, merge_fields};
use crate::scrapers::InfoFields;

/// A TV show in the library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TvShow {
    pub id: Uuid,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub first_aired: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub network: Option<String>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
    pub certification: Option<String>,
    pub thumbnail: Option<String>,
    pub imdb_id: Option<String>,
    pub tvmaze_id: Option<u32>,
    pub changed: bool,
}

impl TvShow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            ..Default::default()
        }
    }

    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    pub fn with_tvmaze_id(mut self, tvmaze_id: u32) -> Self {
        self.tvmaze_id = Some(tvmaze_id);
        self
    }

    /// Fresh record with the same identity and identifiers, used as the
    /// target a scrape job parses into
    pub fn scratch(&self) -> Self {
        Self {
            id: self.id,
            imdb_id: self.imdb_id.clone(),
            tvmaze_id: self.tvmaze_id,
            ..Default::default()
        }
    }
}

impl Mergeable for TvShow {
    fn merge_from(&mut self, other: &Self, requested: &InfoFields) -> bool {
        let mut changed = merge_fields!(self, other, requested, {
            Title => title,
            Overview => overview,
            FirstAired => first_aired,
            Rating => rating,
            Genres => genres,
            Network => network,
            Runtime => runtime,
            Certification => certification,
            Thumbnail => thumbnail,
        });
        changed |= fill(&mut self.imdb_id, &other.imdb_id);
        changed |= fill(&mut self.tvmaze_id, &other.tvmaze_id);
        self.changed |= changed;
        changed
    }
}

/// A single episode. `show_id` points into the owning store, it is not an
/// ownership edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub show_id: Option<Uuid>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub first_aired: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub directors: Option<Vec<String>>,
    pub writers: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub certification: Option<String>,
    pub imdb_id: Option<String>,
    pub tvmaze_id: Option<u32>,
    pub changed: bool,
}

impl Episode {
    pub fn new(season: u32, episode: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            season: Some(season),
            episode: Some(episode),
            ..Default::default()
        }
    }

    pub fn scratch(&self) -> Self {
        Self {
            id: self.id,
            show_id: self.show_id,
            season: self.season,
            episode: self.episode,
            imdb_id: self.imdb_id.clone(),
            tvmaze_id: self.tvmaze_id,
            ..Default::default()
        }
    }
}

impl Mergeable for Episode {
    fn merge_from(&mut self, other: &Self, requested: &InfoFields) -> bool {
        let mut changed = merge_fields!(self, other, requested, {
            Title => title,
            Overview => overview,
            FirstAired => first_aired,
            Rating => rating,
            Director => directors,
            Writer => writers,
            Thumbnail => thumbnail,
            Certification => certification,
        });
        changed |= fill(&mut self.imdb_id, &other.imdb_id);
        changed |= fill(&mut self.tvmaze_id, &other.tvmaze_id);
        self.changed |= changed;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::InfoField;

    #[test]
    fn test_merge_respects_requested_fields() {
        let mut target = Episode::new(1, 2);
        target.title = Some("Old".to_string());

        let mut scraped = target.scratch();
        scraped.title = Some("New".to_string());
        scraped.overview = Some("Plot".to_string());

        let requested: InfoFields = [InfoField::Overview].into_iter().collect();
        assert!(target.merge_from(&scraped, &requested));
        assert_eq!(target.title.as_deref(), Some("Old"));
        assert_eq!(target.overview.as_deref(), Some("Plot"));
        assert!(target.changed);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut target = TvShow::new();
        let mut scraped = target.scratch();
        scraped.title = Some("Dark".to_string());
        scraped.tvmaze_id = Some(17861);

        let all = InfoField::all();
        assert!(target.merge_from(&scraped, &all));
        let once = target.clone();
        assert!(!target.merge_from(&scraped, &all));
        assert_eq!(target, once);
    }

    #[test]
    fn test_absent_values_never_clear() {
        let mut target = TvShow::new();
        target.network = Some("HBO".to_string());
        let scraped = target.scratch();
        assert!(!target.merge_from(&scraped, &InfoField::all()));
        assert_eq!(target.network.as_deref(), Some("HBO"));
        assert!(!target.changed);
    }
}
