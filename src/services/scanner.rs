//! Movie directory scanner and load queue
//!
//! [`MovieFileSearcher`] walks the configured movie directories one at a time,
//! merges the discovered movies into the [`MediaStore`] and reports progress
//! over a broadcast channel. The actual per-directory work is done by a
//! [`DirectoryLoader`]; [`DiskMovieLoader`] is the filesystem implementation.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::filename_parser::{is_sample, parse_movie_name, strip_stacking_marker};
use crate::media::{DiscType, MediaStore, Movie};

/// Video file extensions we recognize
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "ts", "m2ts", "iso",
];

/// A configured movie directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDir {
    pub path: PathBuf,
    /// Every movie lives in its own folder
    pub separate_folders: bool,
    /// Always rescan this directory, even when a cached scan exists
    pub auto_reload: bool,
    pub disabled: bool,
}

impl SettingsDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separate_folders: false,
            auto_reload: false,
            disabled: false,
        }
    }

    pub fn with_separate_folders(mut self, separate_folders: bool) -> Self {
        self.separate_folders = separate_folders;
        self
    }
}

/// Load queue progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearcherEvent {
    Started,
    /// Directory about to be loaded
    ProgressText(String),
    /// `current` of `max` directories loaded
    Progress { current: usize, max: usize },
    Finished,
}

/// Loads the movies of a single directory
#[async_trait]
pub trait DirectoryLoader: Send + Sync {
    async fn load(&self, dir: &SettingsDir, reload_from_disk: bool) -> Result<Vec<Movie>>;
}

#[derive(Debug, Default)]
struct QueueState {
    /// Bumped by every `reload`; a drain whose generation is outdated stops
    generation: u64,
    queue: VecDeque<SettingsDir>,
    running: bool,
    aborted: bool,
    quiet: bool,
}

/// Sequential movie directory load queue
pub struct MovieFileSearcher {
    store: Arc<RwLock<MediaStore>>,
    loader: Arc<dyn DirectoryLoader>,
    directories: Mutex<Vec<SettingsDir>>,
    state: Mutex<QueueState>,
    events_tx: broadcast::Sender<SearcherEvent>,
}

impl MovieFileSearcher {
    pub fn new(store: Arc<RwLock<MediaStore>>, loader: Arc<dyn DirectoryLoader>) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        Self {
            store,
            loader,
            directories: Mutex::new(Vec::new()),
            state: Mutex::new(QueueState::default()),
            events_tx,
        }
    }

    /// Subscribe to load progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<SearcherEvent> {
        self.events_tx.subscribe()
    }

    /// Replace the configured movie directories
    pub fn set_movie_directories(&self, directories: Vec<SettingsDir>) {
        *self.directories.lock() = directories;
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn emit(&self, event: SearcherEvent) {
        // Nobody listening is fine
        let _ = self.events_tx.send(event);
    }

    /// Reload all enabled directories, one at a time.
    ///
    /// A running reload is superseded: it stops dequeuing and its in-flight
    /// result is discarded. Every call emits exactly one `Finished` unless
    /// it is aborted quietly.
    pub async fn reload(&self, reload_from_disk: bool) {
        let directories: VecDeque<SettingsDir> = self
            .directories
            .lock()
            .iter()
            .filter(|dir| {
                if dir.disabled {
                    return false;
                }
                let readable = dir.path.is_dir();
                if !readable {
                    warn!(path = %dir.path.display(), "Movie directory is not readable, skipping");
                }
                readable
            })
            .cloned()
            .collect();
        let max = directories.len();

        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.queue = directories;
            state.running = true;
            state.aborted = false;
            state.quiet = false;
            state.generation
        };

        info!(directories = max, reload_from_disk, "Loading movie directories");
        self.store.write().clear_movies();
        self.emit(SearcherEvent::Started);

        let mut current = 0;
        loop {
            let next = {
                let mut state = self.state.lock();
                if state.generation != generation || state.aborted {
                    break;
                }
                state.queue.pop_front()
            };
            let Some(dir) = next else {
                break;
            };

            self.emit(SearcherEvent::ProgressText(dir.path.display().to_string()));
            let result = self.loader.load(&dir, reload_from_disk).await;

            {
                let state = self.state.lock();
                if state.generation != generation || state.aborted {
                    debug!(path = %dir.path.display(), "Discarding result of aborted directory load");
                    break;
                }
            }

            match result {
                Ok(movies) => {
                    debug!(path = %dir.path.display(), movies = movies.len(), "Directory loaded");
                    self.store.write().add_movies(movies);
                }
                Err(e) => {
                    warn!(path = %dir.path.display(), error = %e, "Failed to load movie directory");
                }
            }

            current += 1;
            self.emit(SearcherEvent::Progress { current, max });
        }

        let quiet_abort = {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.running = false;
                state.queue.clear();
                state.aborted && state.quiet
            } else {
                false
            }
        };

        info!(loaded = current, "Movie directory load finished");
        if !quiet_abort {
            self.emit(SearcherEvent::Finished);
        }
    }

    /// Stop loading after the directory currently in flight.
    ///
    /// Does nothing when idle or when no directory is left in the queue.
    /// Returns whether an abort was requested.
    pub fn abort(&self, quiet: bool) -> bool {
        let mut state = self.state.lock();
        if !state.running || state.queue.is_empty() {
            return false;
        }
        info!(quiet, remaining = state.queue.len(), "Aborting movie directory load");
        state.aborted = true;
        state.quiet = quiet;
        state.queue.clear();
        true
    }
}

/// Scans movie directories on disk.
///
/// Results are remembered per directory so a reload that doesn't go to
/// disk can reuse them.
#[derive(Default)]
pub struct DiskMovieLoader {
    last_scan: Mutex<HashMap<PathBuf, Vec<Movie>>>,
}

impl DiskMovieLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryLoader for DiskMovieLoader {
    async fn load(&self, dir: &SettingsDir, reload_from_disk: bool) -> Result<Vec<Movie>> {
        if !reload_from_disk && !dir.auto_reload {
            let cached = self.last_scan.lock().get(&dir.path).cloned();
            if let Some(movies) = cached {
                debug!(path = %dir.path.display(), "Reusing previous scan");
                return Ok(movies);
            }
        }

        let scan_dir = dir.clone();
        let movies = tokio::task::spawn_blocking(move || scan_directory(&scan_dir))
            .await
            .context("Directory scan task failed")??;

        self.last_scan
            .lock()
            .insert(dir.path.clone(), movies.clone());
        Ok(movies)
    }
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn disc_type(name: &OsStr) -> Option<DiscType> {
    let name = name.to_str()?;
    if name.eq_ignore_ascii_case("VIDEO_TS") {
        Some(DiscType::Dvd)
    } else if name.eq_ignore_ascii_case("BDMV") {
        Some(DiscType::BluRay)
    } else {
        None
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string()
}

fn movie_from_name(name: &str, root: &Path, files: Vec<PathBuf>) -> Movie {
    let parsed = parse_movie_name(name);
    let mut movie = Movie::new(parsed.title, root, files);
    movie.year = parsed.year;
    movie
}

/// Walk one movie directory and group its video files into movies
pub fn scan_directory(dir: &SettingsDir) -> Result<Vec<Movie>> {
    let root = dir.path.as_path();
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let mut movies = Vec::new();
    // BTreeMap keeps the resulting movie order stable across scans
    let mut by_folder: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    let mut by_stack: BTreeMap<(PathBuf, String), (String, Vec<PathBuf>)> = BTreeMap::new();
    let mut disc_folders: HashSet<PathBuf> = HashSet::new();

    let mut entries = WalkDir::new(root).follow_links(true).into_iter();
    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            if let Some(disc) = disc_type(entry.file_name()) {
                entries.skip_current_dir();
                let folder = path.parent().unwrap_or(root);
                if folder == root {
                    debug!(path = %path.display(), "Disc structure at directory root, naming it after the root");
                }
                let mut movie = movie_from_name(&name_of(folder), root, vec![path.to_path_buf()]);
                movie.disc_type = Some(disc);
                movie.in_separate_folder = true;
                movies.push(movie);
                disc_folders.insert(folder.to_path_buf());
            }
            continue;
        }

        if !is_video_file(path) || is_sample(path) {
            continue;
        }

        let Some(parent) = path.parent() else {
            continue;
        };

        if dir.separate_folders && parent != root {
            by_folder
                .entry(parent.to_path_buf())
                .or_default()
                .push(path.to_path_buf());
        } else {
            let stem = path
                .file_stem()
                .and_then(OsStr::to_str)
                .unwrap_or_default();
            let (base, _part) = strip_stacking_marker(stem);
            by_stack
                .entry((parent.to_path_buf(), base.to_lowercase()))
                .or_insert_with(|| (base.clone(), Vec::new()))
                .1
                .push(path.to_path_buf());
        }
    }

    for (folder, mut files) in by_folder {
        // The disc structure already represents this folder
        if disc_folders.contains(&folder) {
            debug!(path = %folder.display(), files = files.len(), "Ignoring loose files next to a disc structure");
            continue;
        }
        files.sort();
        let mut movie = movie_from_name(&name_of(&folder), root, files);
        movie.in_separate_folder = true;
        movies.push(movie);
    }

    for ((_, _), (base, mut files)) in by_stack {
        files.sort();
        movies.push(movie_from_name(&base, root, files));
    }

    info!(path = %root.display(), movies = movies.len(), "Scanned movie directory");
    Ok(movies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_stacked_files_form_one_movie() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("Heat.1995.cd1.avi"));
        touch(&tmp.path().join("Heat.1995.cd2.avi"));
        touch(&tmp.path().join("Alien.1979.mkv"));
        touch(&tmp.path().join("Alien.1979-sample.mkv"));
        touch(&tmp.path().join("notes.txt"));

        let mut movies = scan_directory(&SettingsDir::new(tmp.path())).unwrap();
        movies.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Alien");
        assert_eq!(movies[0].files.len(), 1);
        assert_eq!(movies[1].title, "Heat");
        assert_eq!(movies[1].year, Some(1995));
        assert_eq!(movies[1].files.len(), 2);
        assert!(movies[1].files[0].ends_with("Heat.1995.cd1.avi"));
    }

    #[test]
    fn test_separate_folders_one_movie_per_folder() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("Blade Runner (1982)/br.part1.mkv"));
        touch(&tmp.path().join("Blade Runner (1982)/br.part2.mkv"));
        touch(&tmp.path().join("Arrival (2016)/arrival.mkv"));

        let dir = SettingsDir::new(tmp.path()).with_separate_folders(true);
        let mut movies = scan_directory(&dir).unwrap();
        movies.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Arrival");
        assert_eq!(movies[1].title, "Blade Runner");
        assert_eq!(movies[1].year, Some(1982));
        assert_eq!(movies[1].files.len(), 2);
        assert!(movies.iter().all(|m| m.in_separate_folder));
    }

    #[test]
    fn test_disc_structure_maps_to_parent_folder() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("Alien (1979)/VIDEO_TS/VTS_01_1.VOB"));
        touch(&tmp.path().join("Alien (1979)/VIDEO_TS/VIDEO_TS.IFO"));
        touch(&tmp.path().join("Dune (2021)/BDMV/STREAM/00001.m2ts"));

        let mut movies = scan_directory(&SettingsDir::new(tmp.path())).unwrap();
        movies.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Alien");
        assert_eq!(movies[0].disc_type, Some(DiscType::Dvd));
        assert_eq!(movies[1].title, "Dune");
        assert_eq!(movies[1].disc_type, Some(DiscType::BluRay));
    }

    #[test]
    fn test_disc_structure_at_root_is_named_after_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("Heat (1995)");
        touch(&root.join("BDMV/STREAM/00001.m2ts"));

        let movies = scan_directory(&SettingsDir::new(&root)).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Heat");
        assert_eq!(movies[0].disc_type, Some(DiscType::BluRay));
    }

    #[test]
    fn test_loose_files_next_to_disc_do_not_add_a_movie() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("Alien (1979)/VIDEO_TS/VTS_01_1.VOB"));
        touch(&tmp.path().join("Alien (1979)/trailer.mkv"));

        let dir = SettingsDir::new(tmp.path()).with_separate_folders(true);
        let movies = scan_directory(&dir).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].disc_type, Some(DiscType::Dvd));
    }

    #[tokio::test]
    async fn test_cached_scan_is_reused_unless_auto_reload() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("Alien.1979.mkv"));
        let loader = DiskMovieLoader::new();
        let mut dir = SettingsDir::new(tmp.path());

        assert_eq!(loader.load(&dir, true).await.unwrap().len(), 1);
        touch(&tmp.path().join("Heat.1995.mkv"));

        assert_eq!(loader.load(&dir, false).await.unwrap().len(), 1);
        dir.auto_reload = true;
        assert_eq!(loader.load(&dir, false).await.unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = SettingsDir::new("/definitely/not/here");
        assert!(scan_directory(&dir).is_err());
    }
}
