//! Scrapeline command line entry point

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use scrapeline::cli::{
    AlbumArgs, ArtistArgs, Cli, Command, EpisodeArgs, ScanArgs, SearchCommand, ShowArgs,
    TemplatesArgs,
};
use scrapeline::config::Config;
use scrapeline::media::{Album, Artist, Episode, MediaStore, TvShow};
use scrapeline::scrapers::musicbrainz::MusicBrainzApi;
use scrapeline::scrapers::{ScraperSource, Scrapers};
use scrapeline::services::{
    DiskMovieLoader, ExportTemplateLoader, HttpTransport, MovieFileSearcher, ResponseCache,
    ScrapeDispatcher, SearcherEvent, SettingsDir, Transport, init_tracing,
};

/// Shared services for one invocation
struct App {
    config: Config,
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
    store: Arc<RwLock<MediaStore>>,
    dispatcher: ScrapeDispatcher,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.http_config())?);
        let cache = Arc::new(ResponseCache::new());
        let scrapers = Scrapers::new(transport.clone(), cache.clone(), config.locale.clone());
        let store = Arc::new(RwLock::new(MediaStore::new()));
        let dispatcher = ScrapeDispatcher::new(scrapers, store.clone());

        Ok(Self {
            config,
            transport,
            cache,
            store,
            dispatcher,
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let cli = Cli::parse();
    let app = App::new(config)?;
    info!(locale = %app.config.locale, "Starting scrapeline");

    match cli.command {
        Command::Scan(args) => scan(&app, args).await,
        Command::Show(args) => scrape_show(&app, args).await,
        Command::Episode(args) => scrape_episode(&app, args).await,
        Command::Album(args) => scrape_album(&app, args).await,
        Command::Artist(args) => scrape_artist(&app, args).await,
        Command::Search(command) => search(&app, command).await,
        Command::Templates(args) => templates(&app, args).await,
    }
}

async fn scan(app: &App, args: ScanArgs) -> Result<()> {
    let directories = if args.directories.is_empty() {
        app.config.movie_settings_dirs()
    } else {
        args.directories
            .iter()
            .map(|path| SettingsDir::new(path).with_separate_folders(args.separate_folders))
            .collect()
    };
    if directories.is_empty() {
        bail!("No movie directories given and MOVIE_DIRECTORIES is not set");
    }

    let searcher = MovieFileSearcher::new(app.store.clone(), Arc::new(DiskMovieLoader::new()));
    searcher.set_movie_directories(directories);

    let mut events = searcher.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SearcherEvent::ProgressText(text) => info!("{}", text),
                SearcherEvent::Progress { current, max } => info!(current, max, "Directory loaded"),
                SearcherEvent::Finished => break,
                SearcherEvent::Started => {}
            }
        }
    });

    let reload = searcher.reload(true);
    tokio::pin!(reload);
    let interrupted = tokio::select! {
        _ = &mut reload => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        info!("Aborting scan");
        searcher.abort(false);
        reload.await;
    }
    progress.await.context("Progress task failed")?;

    let movies = app.store.read().movies().to_vec();
    info!(movies = movies.len(), "Scan finished");
    print_json(&movies)
}

async fn scrape_show(app: &App, args: ShowArgs) -> Result<()> {
    let mut show = TvShow::new();
    show.imdb_id = args.imdb;
    show.tvmaze_id = args.tvmaze;
    if show.imdb_id.is_none() && show.tvmaze_id.is_none() {
        bail!("Pass --imdb or --tvmaze");
    }
    let show_id = app.store.write().add_show(show);

    let sources = args.options.sources_or(&Scrapers::tv_sources());
    let report = app
        .dispatcher
        .scrape_show(show_id, &sources, &args.options.info_fields())
        .await?;
    print_json(&report)
}

async fn scrape_episode(app: &App, args: EpisodeArgs) -> Result<()> {
    let mut show = TvShow::new();
    show.imdb_id = args.show_imdb;
    show.tvmaze_id = args.show_tvmaze;

    let episode = Episode {
        id: Uuid::new_v4(),
        season: args.season,
        episode: args.episode,
        imdb_id: args.imdb,
        tvmaze_id: args.tvmaze,
        ..Default::default()
    };

    let episode_id = {
        let mut store = app.store.write();
        let show_id = store.add_show(show);
        store
            .add_episode(show_id, episode)
            .context("Parent show was not stored")?
    };

    let sources = args.options.sources_or(&Scrapers::tv_sources());
    let report = app
        .dispatcher
        .scrape_episode(episode_id, &sources, &args.options.info_fields())
        .await?;
    print_json(&report)
}

async fn scrape_album(app: &App, args: AlbumArgs) -> Result<()> {
    let mut album = Album::new();
    album.musicbrainz_release_id = args.release;
    album.musicbrainz_release_group_id = args.release_group;
    let album_id = app
        .store
        .write()
        .add_album(None, album)
        .context("Album was not stored")?;

    let sources = args.options.sources_or(&Scrapers::music_sources());
    let report = app
        .dispatcher
        .scrape_album(album_id, &sources, &args.options.info_fields())
        .await?;
    print_json(&report)
}

async fn scrape_artist(app: &App, args: ArtistArgs) -> Result<()> {
    let mut artist = Artist::new();
    artist.musicbrainz_id = Some(args.musicbrainz_id);
    let artist_id = app.store.write().add_artist(artist);

    let sources = args.options.sources_or(&[ScraperSource::MusicBrainz]);
    let report = app
        .dispatcher
        .scrape_artist(artist_id, &sources, &args.options.info_fields())
        .await?;
    print_json(&report)
}

async fn search(app: &App, command: SearchCommand) -> Result<()> {
    let api = MusicBrainzApi::new(app.transport.clone(), app.cache.clone());
    let results = match command {
        SearchCommand::Artist { query } => api.search_artists(&app.config.locale, &query).await?,
        SearchCommand::Album { query, artist } => {
            api.search_releases(&app.config.locale, &query, artist.as_deref())
                .await?
        }
    };
    info!(results = results.len(), "MusicBrainz search finished");
    print_json(&results)
}

async fn templates(app: &App, args: TemplatesArgs) -> Result<()> {
    let path = args
        .path
        .unwrap_or_else(|| app.config.export_templates_path.clone());
    let loader = ExportTemplateLoader::new(app.transport.clone(), path)?;

    let templates = if args.offline {
        loader.installed_templates().await?
    } else {
        loader.remote_templates().await?
    };
    print_json(&templates)
}
