//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::scrapers::{InfoField, InfoFields, ScraperSource};

#[derive(Debug, Parser)]
#[command(name = "scrapeline")]
#[command(about = "Scrape TV, music and movie metadata and scan movie directories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan movie directories and list the movies found
    Scan(ScanArgs),
    /// Scrape a TV show
    Show(ShowArgs),
    /// Scrape a single episode
    Episode(EpisodeArgs),
    /// Scrape an album
    Album(AlbumArgs),
    /// Scrape an artist
    Artist(ArtistArgs),
    /// Search MusicBrainz for artists or albums
    #[command(subcommand)]
    Search(SearchCommand),
    /// List installed and available export templates
    Templates(TemplatesArgs),
}

/// Which sources to ask and which fields to take from them
#[derive(Debug, Clone, Args)]
pub struct ScrapeOptions {
    /// Source to scrape from, may be repeated (default: every source for the entity)
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<ScraperSource>,

    /// Field to load, may be repeated (default: all fields)
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<InfoField>,
}

impl ScrapeOptions {
    /// Requested sources, falling back to `defaults` when none were given
    pub fn sources_or(&self, defaults: &[ScraperSource]) -> Vec<ScraperSource> {
        if self.sources.is_empty() {
            defaults.to_vec()
        } else {
            self.sources.clone()
        }
    }

    pub fn info_fields(&self) -> InfoFields {
        if self.fields.is_empty() {
            InfoField::all()
        } else {
            self.fields.iter().copied().collect()
        }
    }
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Movie directories (default: MOVIE_DIRECTORIES)
    pub directories: Vec<PathBuf>,

    /// Every movie lives in its own folder
    #[arg(long)]
    pub separate_folders: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// IMDb id of the show (tt...)
    #[arg(long)]
    pub imdb: Option<String>,

    /// TVMaze id of the show
    #[arg(long)]
    pub tvmaze: Option<u32>,

    #[command(flatten)]
    pub options: ScrapeOptions,
}

#[derive(Debug, Args)]
pub struct EpisodeArgs {
    /// IMDb id of the parent show, used to discover the episode
    #[arg(long)]
    pub show_imdb: Option<String>,

    /// TVMaze id of the parent show, used to discover the episode
    #[arg(long)]
    pub show_tvmaze: Option<u32>,

    #[arg(long)]
    pub season: Option<u32>,

    #[arg(long)]
    pub episode: Option<u32>,

    /// IMDb id of the episode itself
    #[arg(long)]
    pub imdb: Option<String>,

    /// TVMaze id of the episode itself
    #[arg(long)]
    pub tvmaze: Option<u32>,

    #[command(flatten)]
    pub options: ScrapeOptions,
}

#[derive(Debug, Args)]
pub struct AlbumArgs {
    /// MusicBrainz release id
    #[arg(long)]
    pub release: Option<String>,

    /// MusicBrainz release group id, used when no release id is given
    #[arg(long)]
    pub release_group: Option<String>,

    #[command(flatten)]
    pub options: ScrapeOptions,
}

#[derive(Debug, Args)]
pub struct ArtistArgs {
    /// MusicBrainz artist id
    pub musicbrainz_id: String,

    #[command(flatten)]
    pub options: ScrapeOptions,
}

#[derive(Debug, Subcommand)]
pub enum SearchCommand {
    /// Search artists by name
    Artist { query: String },
    /// Search albums by title
    Album {
        query: String,

        /// Only albums credited to this artist
        #[arg(long)]
        artist: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    /// Template directory (default: EXPORT_TEMPLATES_PATH)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Only list installed templates
    #[arg(long)]
    pub offline: bool,
}
