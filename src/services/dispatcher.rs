//! Coordinating scrape dispatcher
//!
//! Fans one "scrape this entity" request out to one job per source, runs the
//! jobs concurrently on the calling task and merges every successful result
//! into the target as it arrives. A failing source never cancels its
//! siblings; its error is collected and reported with the aggregate result.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::media::{Album, Artist, Episode, MediaStore, Mergeable, TvShow};
use crate::scrapers::{
    self, BoxedScrapeJob, InfoFields, JobId, ScraperError, ScraperSource, Scrapers,
};

/// An error attributed to the source it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceError {
    pub source: ScraperSource,
    pub error: ScraperError,
}

/// Dispatcher progress event
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    /// One job reached its terminal state
    JobFinished {
        job_id: JobId,
        source: ScraperSource,
        error: Option<ScraperError>,
    },
    /// All jobs of a scrape request terminated
    Finished {
        succeeded: usize,
        errors: Vec<SourceError>,
    },
}

/// Aggregate result of one scrape request
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport<E> {
    /// Target with all successful results merged in
    pub entity: E,
    pub succeeded: usize,
    pub errors: Vec<SourceError>,
}

impl<E> ScrapeReport<E> {
    /// At least one source was tried and none succeeded
    pub fn is_failure(&self) -> bool {
        self.succeeded == 0 && !self.errors.is_empty()
    }

    pub fn error_for(&self, source: ScraperSource) -> Option<&ScraperError> {
        self.errors
            .iter()
            .find(|e| e.source == source)
            .map(|e| &e.error)
    }
}

pub struct ScrapeDispatcher {
    scrapers: Scrapers,
    store: Arc<RwLock<MediaStore>>,
    events_tx: broadcast::Sender<ScrapeEvent>,
}

impl ScrapeDispatcher {
    pub fn new(scrapers: Scrapers, store: Arc<RwLock<MediaStore>>) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        Self {
            scrapers,
            store,
            events_tx,
        }
    }

    /// Subscribe to job and aggregate completion events
    pub fn subscribe(&self) -> broadcast::Receiver<ScrapeEvent> {
        self.events_tx.subscribe()
    }

    pub fn scrapers(&self) -> &Scrapers {
        &self.scrapers
    }

    fn emit(&self, event: ScrapeEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Run `jobs` concurrently and merge their results into `target`.
    ///
    /// Results are merged in arrival order, so with overlapping fields the
    /// last source to answer wins. Returns once every job has terminated.
    pub async fn scrape<E>(
        &self,
        target: E,
        jobs: Vec<BoxedScrapeJob<E>>,
        fields: &InfoFields,
    ) -> ScrapeReport<E>
    where
        E: Mergeable + Send + 'static,
    {
        self.scrape_with_errors(target, jobs, Vec::new(), fields, |_| {})
            .await
    }

    async fn scrape_with_errors<E>(
        &self,
        mut target: E,
        jobs: Vec<BoxedScrapeJob<E>>,
        mut errors: Vec<SourceError>,
        fields: &InfoFields,
        mut on_success: impl FnMut(&E),
    ) -> ScrapeReport<E>
    where
        E: Mergeable + Send + 'static,
    {
        let mut outstanding = jobs.len();
        let mut succeeded = 0;
        info!(jobs = outstanding, "Starting scrape");

        let mut running: FuturesUnordered<_> = jobs.into_iter().map(scrapers::start).collect();
        while let Some(finished) = running.next().await {
            outstanding -= 1;
            debug!(job_id = %finished.job_id, source = %finished.source, outstanding, "Job finished");

            self.emit(ScrapeEvent::JobFinished {
                job_id: finished.job_id,
                source: finished.source,
                error: finished.error.clone(),
            });

            match finished.error {
                None => {
                    target.merge_from(&finished.entity, fields);
                    on_success(&finished.entity);
                    succeeded += 1;
                }
                Some(error) => errors.push(SourceError {
                    source: finished.source,
                    error,
                }),
            }
        }

        if succeeded == 0 && !errors.is_empty() {
            warn!(errors = errors.len(), "Scrape failed for all sources");
        } else {
            info!(succeeded, errors = errors.len(), "Scrape finished");
        }

        self.emit(ScrapeEvent::Finished {
            succeeded,
            errors: errors.clone(),
        });

        ScrapeReport {
            entity: target,
            succeeded,
            errors,
        }
    }

    /// Scrape an entity held by the store.
    ///
    /// Every successful job is merged into the live stored entity as it
    /// arrives, so concurrent scrapes of the same entity from different
    /// sources all keep their fields. The report carries the stored entity
    /// after the last merge.
    async fn scrape_stored<E>(
        &self,
        id: Uuid,
        target: E,
        jobs: Vec<BoxedScrapeJob<E>>,
        errors: Vec<SourceError>,
        fields: &InfoFields,
        slot: fn(&mut MediaStore, Uuid) -> Option<&mut E>,
    ) -> ScrapeReport<E>
    where
        E: Mergeable + Clone + Send + 'static,
    {
        let store = &self.store;
        let mut report = self
            .scrape_with_errors(target, jobs, errors, fields, |scraped| {
                let mut store = store.write();
                match slot(&mut store, id) {
                    Some(stored) => {
                        stored.merge_from(scraped, fields);
                    }
                    None => warn!(entity_id = %id, "Scraped entity was removed from the store"),
                }
            })
            .await;

        let mut store = self.store.write();
        if let Some(stored) = slot(&mut store, id) {
            report.entity = stored.clone();
        }
        report
    }

    /// Build one job per source. Sources that cannot build a job are
    /// reported as errors without running anything.
    fn build_jobs<E>(
        sources: &[ScraperSource],
        mut build: impl FnMut(ScraperSource) -> Result<BoxedScrapeJob<E>, ScraperError>,
    ) -> (Vec<BoxedScrapeJob<E>>, Vec<SourceError>) {
        let mut jobs = Vec::new();
        let mut errors = Vec::new();
        let mut seen = Vec::new();

        for &source in sources {
            // At most one job per (entity, source)
            if seen.contains(&source) {
                continue;
            }
            seen.push(source);

            match build(source) {
                Ok(job) => jobs.push(job),
                Err(error) => {
                    warn!(source = %source, error = %error, "Could not create scrape job");
                    errors.push(SourceError { source, error });
                }
            }
        }
        (jobs, errors)
    }

    /// Scrape a stored show and merge the results into the store
    pub async fn scrape_show(
        &self,
        show_id: Uuid,
        sources: &[ScraperSource],
        fields: &InfoFields,
    ) -> Result<ScrapeReport<TvShow>, ScraperError> {
        let show = self
            .store
            .read()
            .show(show_id)
            .cloned()
            .ok_or_else(|| ScraperError::config(format!("Unknown TV show: {}", show_id)))?;

        let (jobs, errors) =
            Self::build_jobs(sources, |source| self.scrapers.show_job(source, &show, fields));
        let target = show.scratch();
        Ok(self
            .scrape_stored(show_id, target, jobs, errors, fields, MediaStore::show_mut)
            .await)
    }

    /// Scrape a stored episode and merge the results into the store
    pub async fn scrape_episode(
        &self,
        episode_id: Uuid,
        sources: &[ScraperSource],
        fields: &InfoFields,
    ) -> Result<ScrapeReport<Episode>, ScraperError> {
        let (episode, show) = {
            let store = self.store.read();
            let episode = store
                .episode(episode_id)
                .cloned()
                .ok_or_else(|| ScraperError::config(format!("Unknown episode: {}", episode_id)))?;
            let show = store.show_of(&episode).cloned();
            (episode, show)
        };

        let (jobs, errors) = Self::build_jobs(sources, |source| {
            self.scrapers
                .episode_job(source, &episode, show.as_ref(), fields)
        });
        let target = episode.scratch();
        Ok(self
            .scrape_stored(episode_id, target, jobs, errors, fields, MediaStore::episode_mut)
            .await)
    }

    /// Scrape a stored album and merge the results into the store
    pub async fn scrape_album(
        &self,
        album_id: Uuid,
        sources: &[ScraperSource],
        fields: &InfoFields,
    ) -> Result<ScrapeReport<Album>, ScraperError> {
        let album = self
            .store
            .read()
            .album(album_id)
            .cloned()
            .ok_or_else(|| ScraperError::config(format!("Unknown album: {}", album_id)))?;

        let (jobs, errors) =
            Self::build_jobs(sources, |source| self.scrapers.album_job(source, &album, fields));
        let target = album.scratch();
        Ok(self
            .scrape_stored(album_id, target, jobs, errors, fields, MediaStore::album_mut)
            .await)
    }

    /// Scrape a stored artist and merge the results into the store
    pub async fn scrape_artist(
        &self,
        artist_id: Uuid,
        sources: &[ScraperSource],
        fields: &InfoFields,
    ) -> Result<ScrapeReport<Artist>, ScraperError> {
        let artist = self
            .store
            .read()
            .artist(artist_id)
            .cloned()
            .ok_or_else(|| ScraperError::config(format!("Unknown artist: {}", artist_id)))?;

        let (jobs, errors) =
            Self::build_jobs(sources, |source| self.scrapers.artist_job(source, &artist, fields));
        let target = artist.scratch();
        Ok(self
            .scrape_stored(artist_id, target, jobs, errors, fields, MediaStore::artist_mut)
            .await)
    }
}
