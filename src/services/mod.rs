//! Shared services: transport, caching, dispatch and the library load queue

pub mod cache;
pub mod dispatcher;
pub mod export_templates;
pub mod filename_parser;
pub mod logging;
pub mod network;
pub mod scanner;
pub mod text_utils;

pub use cache::{ResponseCache, SharedResponseCache};
pub use dispatcher::{ScrapeDispatcher, ScrapeEvent, ScrapeReport, SourceError};
pub use export_templates::{ExportTemplate, ExportTemplateLoader};
pub use logging::{LogFormat, init_tracing};
pub use network::{HttpConfig, HttpTransport, NetworkRequest, NetworkResponse, Transport};
pub use scanner::{DirectoryLoader, DiskMovieLoader, MovieFileSearcher, SearcherEvent, SettingsDir};
