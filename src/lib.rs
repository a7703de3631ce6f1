//! Scrapeline - scraper orchestration and library loading for a media manager

pub mod cli;
pub mod config;
pub mod media;
pub mod scrapers;
pub mod services;
