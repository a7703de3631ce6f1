//! Owning collection of all library entities
//!
//! Parent links (episode -> show, album -> artist) are ids looked up here,
//! so removing a parent removes its children instead of leaving dangling
//! references.

use std::collections::HashMap;

use uuid::Uuid;

use super::{Album, Artist, Episode, Movie, TvShow};

#[derive(Debug, Default)]
pub struct MediaStore {
    shows: HashMap<Uuid, TvShow>,
    episodes: HashMap<Uuid, Episode>,
    artists: HashMap<Uuid, Artist>,
    albums: HashMap<Uuid, Album>,
    movies: Vec<Movie>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- TV shows ---

    pub fn add_show(&mut self, show: TvShow) -> Uuid {
        let id = show.id;
        self.shows.insert(id, show);
        id
    }

    pub fn show(&self, id: Uuid) -> Option<&TvShow> {
        self.shows.get(&id)
    }

    pub fn show_mut(&mut self, id: Uuid) -> Option<&mut TvShow> {
        self.shows.get_mut(&id)
    }

    /// Add an episode below `show_id`. Returns `None` if the show is unknown.
    pub fn add_episode(&mut self, show_id: Uuid, mut episode: Episode) -> Option<Uuid> {
        if !self.shows.contains_key(&show_id) {
            return None;
        }
        episode.show_id = Some(show_id);
        let id = episode.id;
        self.episodes.insert(id, episode);
        Some(id)
    }

    pub fn episode(&self, id: Uuid) -> Option<&Episode> {
        self.episodes.get(&id)
    }

    pub fn episode_mut(&mut self, id: Uuid) -> Option<&mut Episode> {
        self.episodes.get_mut(&id)
    }

    /// Parent show of an episode
    pub fn show_of(&self, episode: &Episode) -> Option<&TvShow> {
        episode.show_id.and_then(|id| self.shows.get(&id))
    }

    /// Episodes of a show ordered by season and episode number
    pub fn episodes_of(&self, show_id: Uuid) -> Vec<&Episode> {
        let mut episodes: Vec<&Episode> = self
            .episodes
            .values()
            .filter(|e| e.show_id == Some(show_id))
            .collect();
        episodes.sort_by_key(|e| (e.season, e.episode));
        episodes
    }

    /// Remove a show together with its episodes
    pub fn remove_show(&mut self, show_id: Uuid) -> Option<TvShow> {
        let show = self.shows.remove(&show_id)?;
        self.episodes.retain(|_, e| e.show_id != Some(show_id));
        Some(show)
    }

    /// A show counts as changed if it or any of its episodes changed
    pub fn show_has_changes(&self, show_id: Uuid) -> bool {
        self.shows.get(&show_id).is_some_and(|s| s.changed)
            || self
                .episodes
                .values()
                .any(|e| e.show_id == Some(show_id) && e.changed)
    }

    pub fn changed_shows(&self) -> Vec<&TvShow> {
        self.shows
            .values()
            .filter(|s| self.show_has_changes(s.id))
            .collect()
    }

    pub fn changed_episodes(&self) -> Vec<&Episode> {
        self.episodes.values().filter(|e| e.changed).collect()
    }

    // --- Music ---

    pub fn add_artist(&mut self, artist: Artist) -> Uuid {
        let id = artist.id;
        self.artists.insert(id, artist);
        id
    }

    pub fn artist(&self, id: Uuid) -> Option<&Artist> {
        self.artists.get(&id)
    }

    pub fn artist_mut(&mut self, id: Uuid) -> Option<&mut Artist> {
        self.artists.get_mut(&id)
    }

    /// Add an album, optionally below an artist
    pub fn add_album(&mut self, artist_id: Option<Uuid>, mut album: Album) -> Option<Uuid> {
        if let Some(artist_id) = artist_id {
            if !self.artists.contains_key(&artist_id) {
                return None;
            }
        }
        album.artist_id = artist_id;
        let id = album.id;
        self.albums.insert(id, album);
        Some(id)
    }

    pub fn album(&self, id: Uuid) -> Option<&Album> {
        self.albums.get(&id)
    }

    pub fn album_mut(&mut self, id: Uuid) -> Option<&mut Album> {
        self.albums.get_mut(&id)
    }

    pub fn albums_of(&self, artist_id: Uuid) -> Vec<&Album> {
        self.albums
            .values()
            .filter(|a| a.artist_id == Some(artist_id))
            .collect()
    }

    pub fn remove_artist(&mut self, artist_id: Uuid) -> Option<Artist> {
        let artist = self.artists.remove(&artist_id)?;
        self.albums.retain(|_, a| a.artist_id != Some(artist_id));
        Some(artist)
    }

    pub fn changed_albums(&self) -> Vec<&Album> {
        self.albums.values().filter(|a| a.changed).collect()
    }

    pub fn changed_artists(&self) -> Vec<&Artist> {
        self.artists.values().filter(|a| a.changed).collect()
    }

    // --- Movies ---

    pub fn add_movies(&mut self, movies: impl IntoIterator<Item = Movie>) {
        self.movies.extend(movies);
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn clear_movies(&mut self) {
        self.movies.clear();
    }

    /// Reset all `changed` flags after the persistence collaborator saved
    pub fn mark_saved(&mut self) {
        self.shows.values_mut().for_each(|s| s.changed = false);
        self.episodes.values_mut().for_each(|e| e.changed = false);
        self.artists.values_mut().for_each(|a| a.changed = false);
        self.albums.values_mut().for_each(|a| a.changed = false);
        self.movies.iter_mut().for_each(|m| m.changed = false);
    }
}
