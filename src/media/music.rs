//! Album and artist records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Mergeable;
use crate::scrapers::info::{fill, merge_fields};
use crate::scrapers::InfoFields;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: Uuid,
    /// Owning artist in the store, if known
    pub artist_id: Option<Uuid>,
    pub title: Option<String>,
    /// Credited artist(s) as displayed, e.g. "Simon & Garfunkel"
    pub artist: Option<String>,
    pub label: Option<String>,
    /// Release date as delivered by the source (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
    pub release_date: Option<String>,
    pub genres: Option<Vec<String>>,
    pub musicbrainz_release_id: Option<String>,
    pub musicbrainz_release_group_id: Option<String>,
    /// AllMusic album id, e.g. `mw0000189383`
    pub allmusic_id: Option<String>,
    pub discogs_url: Option<String>,
    pub changed: bool,
}

impl Album {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            ..Default::default()
        }
    }

    pub fn scratch(&self) -> Self {
        Self {
            id: self.id,
            artist_id: self.artist_id,
            musicbrainz_release_id: self.musicbrainz_release_id.clone(),
            musicbrainz_release_group_id: self.musicbrainz_release_group_id.clone(),
            allmusic_id: self.allmusic_id.clone(),
            discogs_url: self.discogs_url.clone(),
            ..Default::default()
        }
    }
}

impl Mergeable for Album {
    fn merge_from(&mut self, other: &Self, requested: &InfoFields) -> bool {
        let mut changed = merge_fields!(self, other, requested, {
            Title => title,
            Artist => artist,
            Label => label,
            ReleaseDate => release_date,
            Genres => genres,
        });
        changed |= fill(&mut self.musicbrainz_release_id, &other.musicbrainz_release_id);
        changed |= fill(
            &mut self.musicbrainz_release_group_id,
            &other.musicbrainz_release_group_id,
        );
        changed |= fill(&mut self.allmusic_id, &other.allmusic_id);
        changed |= fill(&mut self.discogs_url, &other.discogs_url);
        self.changed |= changed;
        changed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: Uuid,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub genres: Option<Vec<String>>,
    pub musicbrainz_id: Option<String>,
    pub changed: bool,
}

impl Artist {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            ..Default::default()
        }
    }

    pub fn scratch(&self) -> Self {
        Self {
            id: self.id,
            musicbrainz_id: self.musicbrainz_id.clone(),
            ..Default::default()
        }
    }
}

impl Mergeable for Artist {
    fn merge_from(&mut self, other: &Self, requested: &InfoFields) -> bool {
        let mut changed = merge_fields!(self, other, requested, {
            Name => name,
            Biography => biography,
            Genres => genres,
        });
        changed |= fill(&mut self.musicbrainz_id, &other.musicbrainz_id);
        self.changed |= changed;
        changed
    }
}
