//! Integration tests for the scrape pipeline and the movie load queue
//!
//! All network traffic goes through an in-memory transport that serves
//! canned bodies by URL and records every request it sees.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Notify, broadcast};

use scrapeline::media::{Album, Artist, Episode, MediaStore, Mergeable, Movie, TvShow};
use scrapeline::scrapers::imdb::{ImdbApi, ImdbId};
use scrapeline::scrapers::musicbrainz::{MusicBrainzApi, MusicBrainzId};
use scrapeline::scrapers::tvmaze::TvMazeApi;
use scrapeline::scrapers::{
    BoxedScrapeJob, InfoField, InfoFields, JobId, Locale, ScrapeJob, ScraperError,
    ScraperErrorKind, ScraperSource, Scrapers, start,
};
use scrapeline::services::{
    DirectoryLoader, MovieFileSearcher, NetworkRequest, NetworkResponse, ResponseCache,
    ScrapeDispatcher, ScrapeEvent, SearcherEvent, SettingsDir, Transport,
};
use scrapeline::services::network::TransportError;

// ============================================================================
// Fake transport
// ============================================================================

#[derive(Clone)]
enum Route {
    Body(String),
    Status(u16),
}

#[derive(Default)]
struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<NetworkRequest>>,
}

impl FakeTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn serve(&self, url: url::Url, body: &str) {
        self.routes
            .lock()
            .insert(url.to_string(), Route::Body(body.to_string()));
    }

    fn fail(&self, url: url::Url, status: u16) {
        self.routes.lock().insert(url.to_string(), Route::Status(status));
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn requested(&self, url: &url::Url) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.as_str() == url.as_str())
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, request: NetworkRequest) -> NetworkResponse {
        self.requests.lock().push(request.clone());
        tokio::task::yield_now().await;

        let route = self.routes.lock().get(request.url.as_str()).cloned();
        match route {
            Some(Route::Body(body)) => NetworkResponse::ok(request.url, body),
            Some(Route::Status(status)) => NetworkResponse::failed(
                request.url,
                TransportError::with_status(status, format!("HTTP {}", status)),
            ),
            None => NetworkResponse::failed(request.url, TransportError::new("connection refused")),
        }
    }
}

struct Harness {
    transport: Arc<FakeTransport>,
    cache: Arc<ResponseCache>,
    imdb: ImdbApi,
    tvmaze: TvMazeApi,
    musicbrainz: MusicBrainzApi,
}

impl Harness {
    fn new() -> Self {
        let transport = FakeTransport::new();
        let cache = Arc::new(ResponseCache::new());
        let dyn_transport: Arc<dyn Transport> = transport.clone();
        Self {
            imdb: ImdbApi::new(dyn_transport.clone(), cache.clone()),
            tvmaze: TvMazeApi::new(dyn_transport.clone(), cache.clone()),
            musicbrainz: MusicBrainzApi::new(dyn_transport, cache.clone()),
            transport,
            cache,
        }
    }

    fn scrapers(&self, locale: Locale) -> Scrapers {
        let transport: Arc<dyn Transport> = self.transport.clone();
        Scrapers::new(transport, self.cache.clone(), locale)
    }
}

fn fields(list: &[InfoField]) -> InfoFields {
    list.iter().copied().collect()
}

const TVMAZE_SHOW: &str = r#"{
    "id": 82, "name": "Game of Thrones", "genres": ["Drama", "Fantasy"],
    "runtime": 60, "premiered": "2011-04-17",
    "network": {"id": 8, "name": "HBO"},
    "summary": "<p>Seven noble families fight for control.</p>",
    "rating": {"average": 8.9},
    "externals": {"imdb": "tt0944947"}
}"#;

const TVMAZE_EPISODE: &str = r#"{
    "id": 4952, "name": "The Kingsroad", "season": 1, "number": 2,
    "airdate": "2011-04-24", "summary": "<p>The Lannisters plot.</p>",
    "rating": {"average": 8.1}
}"#;

const IMDB_SEASON: &str = r#"<html><body>
    <a href="/title/tt1480055/?ref_=ttep_ep1">S1.E1 ∙ Winter Is Coming</a>
    <a href="/title/tt1668746/?ref_=ttep_ep2">S1.E2 ∙ The Kingsroad</a>
</body></html>"#;

const IMDB_TITLE: &str = r#"<html><head>
    <script type="application/ld+json">{
        "name": "The Kingsroad",
        "description": "While Bran recovers, Catelyn guards him.",
        "datePublished": "2011-04-24",
        "aggregateRating": {"ratingValue": 8.5},
        "director": [{"name": "Tim Van Patten"}],
        "duration": "PT56M"
    }</script>
</head><body></body></html>"#;

// ============================================================================
// Response cache and jobs
// ============================================================================

#[tokio::test]
async fn test_cache_is_partitioned_by_locale() {
    let harness = Harness::new();
    let url = harness.tvmaze.show_url(82).unwrap();
    harness.transport.serve(url.clone(), TVMAZE_SHOW);

    let show = TvShow::new().with_tvmaze_id(82);
    let all = InfoField::all();

    let english = harness.scrapers(Locale::new("en", Some("US")));
    for _ in 0..2 {
        let job = english.show_job(ScraperSource::TvMaze, &show, &all).unwrap();
        let finished = start(job).await;
        assert!(finished.is_success());
        assert_eq!(finished.entity.title.as_deref(), Some("Game of Thrones"));
    }
    assert_eq!(harness.transport.requested(&url), 1);

    let german = harness.scrapers(Locale::new("de", Some("DE")));
    let job = german.show_job(ScraperSource::TvMaze, &show, &all).unwrap();
    assert!(start(job).await.is_success());
    assert_eq!(harness.transport.requested(&url), 2);

    let requests = harness.transport.requests.lock();
    assert_eq!(requests[1].locale, Some(Locale::new("de", Some("DE"))));
}

#[tokio::test]
async fn test_direct_episode_id_needs_a_single_fetch() {
    let harness = Harness::new();
    let url = harness.tvmaze.episode_url(4952).unwrap();
    harness.transport.serve(url.clone(), TVMAZE_EPISODE);

    let episode = Episode {
        tvmaze_id: Some(4952),
        ..Episode::new(1, 2)
    };
    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .episode_job(ScraperSource::TvMaze, &episode, None, &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert!(finished.is_success());
    assert_eq!(finished.entity.title.as_deref(), Some("The Kingsroad"));
    assert_eq!(finished.entity.overview.as_deref(), Some("The Lannisters plot."));
    assert_eq!(harness.transport.request_count(), 1);
}

#[tokio::test]
async fn test_imdb_episode_discovery_through_season_page() {
    let harness = Harness::new();
    let show_id = ImdbId::new("tt0944947");
    let episode_id = ImdbId::new("tt1668746");
    harness
        .transport
        .serve(harness.imdb.season_url(&show_id, 1).unwrap(), IMDB_SEASON);
    harness
        .transport
        .serve(harness.imdb.title_url(&episode_id).unwrap(), IMDB_TITLE);

    let show = TvShow::new().with_imdb_id("tt0944947");
    let episode = Episode::new(1, 2);
    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .episode_job(ScraperSource::Imdb, &episode, Some(&show), &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert!(finished.is_success(), "{:?}", finished.error);
    assert_eq!(finished.entity.title.as_deref(), Some("The Kingsroad"));
    assert_eq!(finished.entity.directors, Some(vec!["Tim Van Patten".to_string()]));
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test]
async fn test_imdb_discovery_without_episode_number_fails_before_fetching() {
    let harness = Harness::new();
    let show = TvShow::new().with_imdb_id("tt0944947");
    let episode = Episode {
        episode: None,
        ..Episode::new(1, 0)
    };

    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .episode_job(ScraperSource::Imdb, &episode, Some(&show), &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert_matches!(
        finished.error,
        Some(ScraperError { kind: ScraperErrorKind::ConfigError, .. })
    );
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn test_imdb_discovery_of_unknown_episode_skips_detail_fetch() {
    let harness = Harness::new();
    let show_id = ImdbId::new("tt0944947");
    harness
        .transport
        .serve(harness.imdb.season_url(&show_id, 1).unwrap(), IMDB_SEASON);

    let show = TvShow::new().with_imdb_id("tt0944947");
    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .episode_job(ScraperSource::Imdb, &Episode::new(1, 9), Some(&show), &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert_eq!(finished.error.map(|e| e.kind), Some(ScraperErrorKind::ConfigError));
    assert_eq!(harness.transport.request_count(), 1);
}

#[tokio::test]
async fn test_empty_body_is_network_error() {
    let harness = Harness::new();
    harness
        .transport
        .serve(harness.tvmaze.show_url(82).unwrap(), "");

    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .show_job(ScraperSource::TvMaze, &TvShow::new().with_tvmaze_id(82), &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert_eq!(finished.error.map(|e| e.kind), Some(ScraperErrorKind::NetworkError));
    assert!(harness.cache.is_empty());
}

#[tokio::test]
async fn test_missing_title_maps_to_not_found() {
    let harness = Harness::new();
    harness
        .transport
        .fail(harness.tvmaze.show_url(99999).unwrap(), 404);

    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .show_job(ScraperSource::TvMaze, &TvShow::new().with_tvmaze_id(99999), &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert_eq!(finished.error.map(|e| e.kind), Some(ScraperErrorKind::NotFound));
}

#[tokio::test]
async fn test_album_discovered_through_release_group() {
    let harness = Harness::new();
    let group_id = MusicBrainzId::parse("3c4c1b2f-0000-4000-8000-000000000001").unwrap();
    let release_id = MusicBrainzId::parse("0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d").unwrap();

    harness.transport.serve(
        harness.musicbrainz.release_group_url(&group_id).unwrap(),
        r#"{"id": "3c4c1b2f-0000-4000-8000-000000000001",
            "releases": [{"id": "0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d"}]}"#,
    );
    harness.transport.serve(
        harness.musicbrainz.release_url(&release_id).unwrap(),
        r#"{"id": "0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d",
            "title": "Bridge over Troubled Water",
            "artist-credit": [{"name": "Simon & Garfunkel", "joinphrase": ""}],
            "label-info": [{"label": {"name": "Columbia"}}],
            "date": "1970-01-26"}"#,
    );

    let album = Album {
        musicbrainz_release_group_id: Some(group_id.to_string()),
        ..Album::new()
    };
    let scrapers = harness.scrapers(Locale::default());
    let job = scrapers
        .album_job(ScraperSource::MusicBrainz, &album, &InfoField::all())
        .unwrap();

    let finished = start(job).await;
    assert!(finished.is_success(), "{:?}", finished.error);
    assert_eq!(finished.entity.title.as_deref(), Some("Bridge over Troubled Water"));
    assert_eq!(finished.entity.label.as_deref(), Some("Columbia"));
    assert_eq!(
        finished.entity.musicbrainz_release_id.as_deref(),
        Some("0e4d9a6d-6b0a-4ee0-9d1b-2b3bfb2f7a9d")
    );
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test]
async fn test_artist_biography_is_fetched_only_when_requested() {
    let harness = Harness::new();
    let artist_id = MusicBrainzId::parse("5b11f4ce-a62d-471e-81fc-a69a8278c7da").unwrap();
    harness.transport.serve(
        harness.musicbrainz.artist_url(&artist_id).unwrap(),
        r#"{"id": "5b11f4ce-a62d-471e-81fc-a69a8278c7da", "name": "Nirvana",
            "genres": [{"name": "grunge"}]}"#,
    );
    harness.transport.serve(
        harness.musicbrainz.wikipedia_extract_url(&artist_id).unwrap(),
        r#"{"wikipediaExtract": {"content": "<p>Nirvana was an American rock band.</p>"}}"#,
    );

    let artist = Artist {
        musicbrainz_id: Some(artist_id.to_string()),
        ..Artist::new()
    };
    let scrapers = harness.scrapers(Locale::default());

    let job = scrapers
        .artist_job(ScraperSource::MusicBrainz, &artist, &fields(&[InfoField::Name]))
        .unwrap();
    let finished = start(job).await;
    assert!(finished.is_success());
    assert_eq!(finished.entity.name.as_deref(), Some("Nirvana"));
    assert_eq!(finished.entity.biography, None);
    assert_eq!(harness.transport.request_count(), 1);

    let job = scrapers
        .artist_job(
            ScraperSource::MusicBrainz,
            &artist,
            &fields(&[InfoField::Name, InfoField::Biography]),
        )
        .unwrap();
    let finished = start(job).await;
    assert!(finished.is_success());
    assert_eq!(
        finished.entity.biography.as_deref(),
        Some("Nirvana was an American rock band.")
    );
}

#[tokio::test]
async fn test_release_search_is_narrowed_by_artist() {
    let harness = Harness::new();
    let url = harness
        .musicbrainz
        .search_release_with_artist_url("Nevermind", "Nirvana")
        .unwrap();
    harness.transport.serve(
        url.clone(),
        r#"{"releases": [{"id": "1b022e01-4da6-387b-8658-8678046e4cef", "title": "Nevermind",
            "artist-credit": [{"name": "Nirvana"}], "date": "1991-09-24"}]}"#,
    );

    let locale = Locale::default();
    let hits = harness
        .musicbrainz
        .search_releases(&locale, "Nevermind", Some("Nirvana"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "1b022e01-4da6-387b-8658-8678046e4cef");
    assert_eq!(hits[0].name, "Nevermind - Nirvana (1991-09-24)");
    assert_eq!(harness.transport.requested(&url), 1);

    let result = harness
        .musicbrainz
        .search_releases(&locale, "Nevermind", None)
        .await;
    assert_eq!(result.map_err(|e| e.kind), Err(ScraperErrorKind::NetworkError));
}

// ============================================================================
// Merge policy
// ============================================================================

#[test]
fn test_merge_is_idempotent() {
    let mut scraped = TvShow::new();
    scraped.title = Some("Dark".to_string());
    scraped.rating = Some(8.7);

    let mut target = TvShow {
        id: scraped.id,
        ..TvShow::default()
    };
    let requested = fields(&[InfoField::Title, InfoField::Rating]);

    assert!(target.merge_from(&scraped, &requested));
    assert!(target.changed);

    target.changed = false;
    assert!(!target.merge_from(&scraped, &requested));
    assert!(!target.changed);
    assert_eq!(target.title.as_deref(), Some("Dark"));
}

#[test]
fn test_merge_ignores_unrequested_and_absent_fields() {
    let mut target = TvShow::new();
    target.title = Some("Dark".to_string());
    target.overview = Some("Kept".to_string());

    let mut scraped = target.scratch();
    scraped.overview = Some("Replaced".to_string());
    scraped.network = Some("Netflix".to_string());

    assert!(!target.merge_from(&scraped, &fields(&[InfoField::Title])));
    assert_eq!(target.title.as_deref(), Some("Dark"));
    assert_eq!(target.overview.as_deref(), Some("Kept"));
    assert_eq!(target.network, None);
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Job that finishes after a number of scheduler yields
struct StaticJob {
    id: JobId,
    source: ScraperSource,
    yields: usize,
    result: Result<Option<String>, ScraperError>,
    show: TvShow,
}

impl StaticJob {
    fn boxed(
        source: ScraperSource,
        yields: usize,
        result: Result<Option<String>, ScraperError>,
        show: &TvShow,
    ) -> BoxedScrapeJob<TvShow> {
        Box::new(Self {
            id: JobId::new(),
            source,
            yields,
            result,
            show: show.scratch(),
        })
    }
}

#[async_trait]
impl ScrapeJob for StaticJob {
    type Entity = TvShow;

    fn id(&self) -> JobId {
        self.id
    }

    fn source(&self) -> ScraperSource {
        self.source
    }

    async fn run(&mut self) -> Result<(), ScraperError> {
        for _ in 0..self.yields {
            tokio::task::yield_now().await;
        }
        self.show.title = self.result.clone()?;
        Ok(())
    }

    fn into_entity(self: Box<Self>) -> TvShow {
        self.show
    }
}

fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_failing_sources_do_not_cancel_siblings() {
    let harness = Harness::new();
    let store = Arc::new(RwLock::new(MediaStore::new()));
    let dispatcher = ScrapeDispatcher::new(harness.scrapers(Locale::default()), store);
    let mut events = dispatcher.subscribe();

    let target = TvShow::new();
    let jobs = vec![
        StaticJob::boxed(ScraperSource::Imdb, 5, Ok(Some("Dark".to_string())), &target),
        StaticJob::boxed(ScraperSource::TvMaze, 0, Err(ScraperError::network("timed out")), &target),
        StaticJob::boxed(
            ScraperSource::MusicBrainz,
            1,
            Err(ScraperError::parse("garbage")),
            &target,
        ),
    ];

    let report = dispatcher.scrape(target, jobs, &InfoField::all()).await;
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.errors.len(), 2);
    assert!(!report.is_failure());
    assert_eq!(report.entity.title.as_deref(), Some("Dark"));
    assert_eq!(
        report.error_for(ScraperSource::TvMaze).map(|e| e.kind),
        Some(ScraperErrorKind::NetworkError)
    );

    let events = drain(&mut events);
    let finished: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, ScrapeEvent::Finished { .. }))
        .collect();
    assert_eq!(finished.len(), 1);
    assert_matches!(events.last(), Some(ScrapeEvent::Finished { succeeded: 1, .. }));
    assert_eq!(events.len(), 4);
}

#[tokio::test]
async fn test_scrape_show_writes_back_and_reports_unusable_sources() {
    let harness = Harness::new();
    harness
        .transport
        .serve(harness.tvmaze.show_url(82).unwrap(), TVMAZE_SHOW);
    harness
        .transport
        .fail(harness.imdb.title_url(&ImdbId::new("tt0944947")).unwrap(), 500);

    let store = Arc::new(RwLock::new(MediaStore::new()));
    let show_id = store
        .write()
        .add_show(TvShow::new().with_tvmaze_id(82).with_imdb_id("tt0944947"));
    let dispatcher = ScrapeDispatcher::new(harness.scrapers(Locale::default()), store.clone());
    let mut events = dispatcher.subscribe();

    let sources = [
        ScraperSource::TvMaze,
        ScraperSource::Imdb,
        ScraperSource::MusicBrainz,
        ScraperSource::TvMaze,
    ];
    let report = dispatcher
        .scrape_show(show_id, &sources, &InfoField::all())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(
        report.error_for(ScraperSource::Imdb).map(|e| e.kind),
        Some(ScraperErrorKind::NetworkError)
    );
    assert_eq!(
        report.error_for(ScraperSource::MusicBrainz).map(|e| e.kind),
        Some(ScraperErrorKind::ConfigError)
    );
    assert_eq!(harness.transport.request_count(), 2);

    let stored = store.read().show(show_id).cloned().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Game of Thrones"));
    assert_eq!(stored.network.as_deref(), Some("HBO"));
    assert!(stored.changed);

    let events = drain(&mut events);
    let job_events = events
        .iter()
        .filter(|e| matches!(e, ScrapeEvent::JobFinished { .. }))
        .count();
    assert_eq!(job_events, 2);
    assert_matches!(events.last(), Some(ScrapeEvent::Finished { succeeded: 1, errors }) if errors.len() == 2);
}

#[tokio::test]
async fn test_concurrent_show_scrapes_keep_each_others_fields() {
    let harness = Harness::new();
    harness
        .transport
        .serve(harness.tvmaze.show_url(82).unwrap(), TVMAZE_SHOW);
    harness.transport.serve(
        harness.imdb.title_url(&ImdbId::new("tt0944947")).unwrap(),
        r#"<script type="application/ld+json">{"name": "Thrones on IMDb"}</script>"#,
    );

    let store = Arc::new(RwLock::new(MediaStore::new()));
    let show_id = store
        .write()
        .add_show(TvShow::new().with_tvmaze_id(82).with_imdb_id("tt0944947"));
    let dispatcher = ScrapeDispatcher::new(harness.scrapers(Locale::default()), store.clone());

    let network_fields = fields(&[InfoField::Network]);
    let title_fields = fields(&[InfoField::Title]);
    let (network, title) = tokio::join!(
        dispatcher.scrape_show(show_id, &[ScraperSource::TvMaze], &network_fields),
        dispatcher.scrape_show(show_id, &[ScraperSource::Imdb], &title_fields),
    );
    let (network, title) = (network.unwrap(), title.unwrap());
    assert_eq!(network.succeeded, 1);
    assert_eq!(title.succeeded, 1);

    let stored = store.read().show(show_id).cloned().unwrap();
    assert_eq!(stored.network.as_deref(), Some("HBO"));
    assert_eq!(stored.title.as_deref(), Some("Thrones on IMDb"));
    assert!(stored.changed);

    // Whichever scrape finished last reports the fully merged show
    assert!(
        network.entity.title.is_some() && network.entity.network.is_some()
            || title.entity.title.is_some() && title.entity.network.is_some()
    );
}

#[tokio::test]
async fn test_all_sources_failing_is_a_failure() {
    let harness = Harness::new();
    let store = Arc::new(RwLock::new(MediaStore::new()));
    let show_id = store.write().add_show(TvShow::new().with_tvmaze_id(82));
    let dispatcher = ScrapeDispatcher::new(harness.scrapers(Locale::default()), store.clone());

    let report = dispatcher
        .scrape_show(show_id, &[ScraperSource::TvMaze], &InfoField::all())
        .await
        .unwrap();

    assert!(report.is_failure());
    assert!(!store.read().show(show_id).unwrap().changed);
}

#[tokio::test]
async fn test_scrape_unknown_entity_is_config_error() {
    let harness = Harness::new();
    let store = Arc::new(RwLock::new(MediaStore::new()));
    let dispatcher = ScrapeDispatcher::new(harness.scrapers(Locale::default()), store);

    let result = dispatcher
        .scrape_artist(uuid::Uuid::new_v4(), &[ScraperSource::MusicBrainz], &InfoField::all())
        .await;
    assert_matches!(result, Err(ScraperError { kind: ScraperErrorKind::ConfigError, .. }));
}

// ============================================================================
// Movie load queue
// ============================================================================

/// Loader serving a fixed number of movies per directory. The first load of
/// `gate` signals `entered` and waits for `release`.
#[derive(Default)]
struct FakeLoader {
    movies: HashMap<PathBuf, usize>,
    gate: Mutex<Option<PathBuf>>,
    entered: Notify,
    release: Notify,
    loaded: Mutex<Vec<PathBuf>>,
}

impl FakeLoader {
    fn loaded(&self) -> Vec<PathBuf> {
        self.loaded.lock().clone()
    }
}

#[async_trait]
impl DirectoryLoader for FakeLoader {
    async fn load(&self, dir: &SettingsDir, _reload_from_disk: bool) -> anyhow::Result<Vec<Movie>> {
        self.loaded.lock().push(dir.path.clone());
        let gated = {
            let mut gate = self.gate.lock();
            let hit = gate.as_deref() == Some(dir.path.as_path());
            if hit {
                gate.take();
            }
            hit
        };
        if gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        tokio::task::yield_now().await;

        let count = self.movies.get(&dir.path).copied().unwrap_or(0);
        Ok((0..count)
            .map(|i| {
                let file = dir.path.join(format!("movie{}.mkv", i));
                Movie::new(format!("Movie {}", i), &dir.path, vec![file])
            })
            .collect())
    }
}

struct QueueFixture {
    _tmp: tempfile::TempDir,
    dirs: Vec<PathBuf>,
}

impl QueueFixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let dirs: Vec<PathBuf> = ["d1", "d2", "d3"]
            .iter()
            .map(|name| {
                let path = tmp.path().join(name);
                std::fs::create_dir_all(&path).unwrap();
                path
            })
            .collect();
        Self { _tmp: tmp, dirs }
    }

    fn loader(&self, gate: Option<&Path>) -> Arc<FakeLoader> {
        Arc::new(FakeLoader {
            movies: HashMap::from([
                (self.dirs[0].clone(), 2),
                (self.dirs[1].clone(), 0),
                (self.dirs[2].clone(), 1),
            ]),
            gate: Mutex::new(gate.map(Path::to_path_buf)),
            ..Default::default()
        })
    }

    fn searcher(&self, loader: Arc<FakeLoader>) -> (MovieFileSearcher, Arc<RwLock<MediaStore>>) {
        let store = Arc::new(RwLock::new(MediaStore::new()));
        let searcher = MovieFileSearcher::new(store.clone(), loader);
        searcher.set_movie_directories(self.dirs.iter().map(SettingsDir::new).collect());
        (searcher, store)
    }
}

fn count_finished(events: &[SearcherEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SearcherEvent::Finished))
        .count()
}

#[tokio::test]
async fn test_reload_loads_directories_in_order() {
    let fixture = QueueFixture::new();
    let loader = fixture.loader(None);
    let (searcher, store) = fixture.searcher(loader.clone());
    let mut rx = searcher.subscribe();

    searcher.reload(true).await;

    assert_eq!(loader.loaded(), fixture.dirs);
    assert_eq!(store.read().movies().len(), 3);
    assert!(!searcher.is_running());

    let events = drain(&mut rx);
    assert_eq!(events.first(), Some(&SearcherEvent::Started));
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SearcherEvent::Progress { current, max } => Some((*current, *max)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(count_finished(&events), 1);
    assert_eq!(events.last(), Some(&SearcherEvent::Finished));
}

#[tokio::test]
async fn test_abort_discards_in_flight_directory() {
    let fixture = QueueFixture::new();
    let loader = fixture.loader(Some(&fixture.dirs[1]));
    let (searcher, store) = fixture.searcher(loader.clone());
    let mut rx = searcher.subscribe();

    let control = async {
        loader.entered.notified().await;
        assert!(searcher.abort(false));
        loader.release.notify_one();
    };
    tokio::join!(searcher.reload(true), control);

    assert_eq!(loader.loaded(), fixture.dirs[..2].to_vec());
    assert_eq!(store.read().movies().len(), 2);

    let events = drain(&mut rx);
    let progress = events
        .iter()
        .filter(|e| matches!(e, SearcherEvent::Progress { .. }))
        .count();
    assert_eq!(progress, 1);
    assert_eq!(count_finished(&events), 1);
}

#[tokio::test]
async fn test_quiet_abort_emits_no_finished() {
    let fixture = QueueFixture::new();
    let loader = fixture.loader(Some(&fixture.dirs[0]));
    let (searcher, _store) = fixture.searcher(loader.clone());
    let mut rx = searcher.subscribe();

    let control = async {
        loader.entered.notified().await;
        assert!(searcher.abort(true));
        loader.release.notify_one();
    };
    tokio::join!(searcher.reload(true), control);

    assert_eq!(loader.loaded().len(), 1);
    assert_eq!(count_finished(&drain(&mut rx)), 0);
}

#[tokio::test]
async fn test_abort_with_empty_queue_is_ignored() {
    let fixture = QueueFixture::new();
    let loader = fixture.loader(Some(&fixture.dirs[2]));
    let (searcher, store) = fixture.searcher(loader.clone());

    assert!(!searcher.abort(false));

    let control = async {
        loader.entered.notified().await;
        assert!(!searcher.abort(false));
        loader.release.notify_one();
    };
    tokio::join!(searcher.reload(true), control);

    assert_eq!(loader.loaded().len(), 3);
    assert_eq!(store.read().movies().len(), 3);
}

#[tokio::test]
async fn test_reload_supersedes_running_reload() {
    let fixture = QueueFixture::new();
    let loader = fixture.loader(Some(&fixture.dirs[0]));
    let (searcher, store) = fixture.searcher(loader.clone());
    let mut rx = searcher.subscribe();

    let control = async {
        loader.entered.notified().await;
        let release = async { loader.release.notify_one() };
        tokio::join!(searcher.reload(true), release);
    };
    tokio::join!(searcher.reload(true), control);

    let d = &fixture.dirs;
    assert_eq!(
        loader.loaded(),
        vec![d[0].clone(), d[0].clone(), d[1].clone(), d[2].clone()]
    );
    assert_eq!(store.read().movies().len(), 3);
    assert!(!searcher.is_running());

    let events = drain(&mut rx);
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SearcherEvent::Progress { current, max } => Some((*current, *max)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(count_finished(&events), 2);
}
