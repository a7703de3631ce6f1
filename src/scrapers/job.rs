//! Scrape job abstraction
//!
//! A scrape job fetches and parses one entity from one source. Running a job
//! consumes it, so every job reaches exactly one terminal state and reports
//! it exactly once through [`JobFinished`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ScraperError, ScraperSource};

/// Identifies a job among many concurrent ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a started scrape job. A job that has not been passed to
/// [`start`] yet is simply a [`BoxedScrapeJob`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

/// Terminal report of a scrape job
#[derive(Debug, Clone)]
pub struct JobFinished<E> {
    pub job_id: JobId,
    pub source: ScraperSource,
    /// The entity as populated by the job. Only fields the job was asked for
    /// and could parse are set.
    pub entity: E,
    pub error: Option<ScraperError>,
}

impl<E> JobFinished<E> {
    pub fn state(&self) -> JobState {
        if self.error.is_some() {
            JobState::Failed
        } else {
            JobState::Succeeded
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One concrete fetch-and-parse sequence.
///
/// Implementors only describe their fetch sequence in [`ScrapeJob::run`];
/// [`start`] drives the state machine and produces the terminal report.
#[async_trait]
pub trait ScrapeJob: Send {
    type Entity: Send + 'static;

    fn id(&self) -> JobId;

    fn source(&self) -> ScraperSource;

    /// Perform all fetches and parse into the job's entity
    async fn run(&mut self) -> Result<(), ScraperError>;

    /// Hand out the populated entity once the job has terminated
    fn into_entity(self: Box<Self>) -> Self::Entity;
}

/// Boxed job producing entities of type `E`
pub type BoxedScrapeJob<E> = Box<dyn ScrapeJob<Entity = E>>;

/// Run a job to completion and report its terminal state
pub async fn start<E: Send + 'static>(mut job: BoxedScrapeJob<E>) -> JobFinished<E> {
    let job_id = job.id();
    let source = job.source();
    debug!(job_id = %job_id, source = %source, state = ?JobState::Running, "Scrape job started");

    let error = match job.run().await {
        Ok(()) => {
            info!(job_id = %job_id, source = %source, "Scrape job succeeded");
            None
        }
        Err(e) => {
            warn!(job_id = %job_id, source = %source, error = %e, "Scrape job failed");
            Some(e)
        }
    };

    JobFinished {
        job_id,
        source,
        entity: job.into_entity(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingJob {
        id: JobId,
        fail: bool,
        runs: u32,
    }

    #[async_trait]
    impl ScrapeJob for CountingJob {
        type Entity = u32;

        fn id(&self) -> JobId {
            self.id
        }

        fn source(&self) -> ScraperSource {
            ScraperSource::TvMaze
        }

        async fn run(&mut self) -> Result<(), ScraperError> {
            self.runs += 1;
            if self.fail {
                return Err(ScraperError::parse("broken document"));
            }
            Ok(())
        }

        fn into_entity(self: Box<Self>) -> u32 {
            self.runs
        }
    }

    #[tokio::test]
    async fn test_start_reports_terminal_state_once() {
        let id = JobId::new();
        let finished = start(Box::new(CountingJob { id, fail: false, runs: 0 })).await;
        assert_eq!(finished.job_id, id);
        assert_eq!(finished.state(), JobState::Succeeded);
        assert_eq!(finished.entity, 1);

        let finished = start(Box::new(CountingJob { id: JobId::new(), fail: true, runs: 0 })).await;
        assert_eq!(finished.state(), JobState::Failed);
        assert!(!finished.is_success());
        assert_eq!(finished.entity, 1);
    }
}
