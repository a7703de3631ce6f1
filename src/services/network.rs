//! Network transport for scraper APIs
//!
//! The pipeline only depends on the [`Transport`] trait: issue a GET, await
//! the response. [`HttpTransport`] is the production implementation backed by
//! reqwest, with a per-host rate limiter so slow APIs like MusicBrainz are
//! not hammered by concurrent jobs.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::Client;
use reqwest::header::ACCEPT_LANGUAGE;
use tracing::{debug, warn};
use url::Url;

use crate::scrapers::Locale;

/// A GET request issued by a scraper API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub url: Url,
    pub locale: Option<Locale>,
}

impl NetworkRequest {
    pub fn new(url: Url) -> Self {
        Self { url, locale: None }
    }

    pub fn with_locale(mut self, locale: &Locale) -> Self {
        self.locale = Some(locale.clone());
        self
    }
}

/// Transport-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
    /// HTTP status, if the server answered at all
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Response delivered to the scraper API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResponse {
    /// Effective URL after redirects
    pub url: Url,
    pub body: String,
    pub error: Option<TransportError>,
}

impl NetworkResponse {
    pub fn ok(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
            error: None,
        }
    }

    pub fn failed(url: Url, error: TransportError) -> Self {
        Self {
            url,
            body: String::new(),
            error: Some(error),
        }
    }
}

/// Asynchronous request/response capability used by all scrapers
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: NetworkRequest) -> NetworkResponse;
}

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst capacity (allows short bursts above the rate)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            burst_size: 5,
        }
    }
}

/// HTTP settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Limits for specific hosts, everything else uses `default_rate`
    pub host_rates: HashMap<String, RateLimitConfig>,
    pub default_rate: RateLimitConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let mut host_rates = HashMap::new();
        // MusicBrainz requires max 1 request per second
        host_rates.insert(
            "musicbrainz.org".to_string(),
            RateLimitConfig {
                requests_per_second: 1,
                burst_size: 1,
            },
        );
        // TVMaze allows ~20 requests per 10 seconds, so ~2/sec with burst of 5
        host_rates.insert("api.tvmaze.com".to_string(), RateLimitConfig::default());

        Self {
            user_agent: format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            timeout: Duration::from_secs(30),
            host_rates,
            default_rate: RateLimitConfig::default(),
        }
    }
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

fn build_limiter(config: &RateLimitConfig) -> Arc<DirectLimiter> {
    let quota = Quota::per_second(
        NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
    )
    .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

    Arc::new(RateLimiter::direct(quota))
}

/// reqwest-backed transport with per-host rate limiting
pub struct HttpTransport {
    client: Client,
    host_limiters: HashMap<String, Arc<DirectLimiter>>,
    default_limiter: Arc<DirectLimiter>,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let host_limiters = config
            .host_rates
            .iter()
            .map(|(host, rate)| (host.clone(), build_limiter(rate)))
            .collect();

        Ok(Self {
            client,
            host_limiters,
            default_limiter: build_limiter(&config.default_rate),
        })
    }

    fn limiter_for(&self, url: &Url) -> &Arc<DirectLimiter> {
        url.host_str()
            .and_then(|host| {
                self.host_limiters.get(host).or_else(|| {
                    // www.imdb.com -> imdb.com
                    host.split_once('.')
                        .and_then(|(_, parent)| self.host_limiters.get(parent))
                })
            })
            .unwrap_or(&self.default_limiter)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: NetworkRequest) -> NetworkResponse {
        self.limiter_for(&request.url).until_ready().await;
        debug!(url = %request.url, "Making rate-limited GET request");

        let mut builder = self.client.get(request.url.clone());
        if let Some(locale) = &request.locale {
            builder = builder.header(ACCEPT_LANGUAGE, locale.accept_language());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "HTTP request failed");
                return NetworkResponse::failed(request.url, TransportError::new(e.to_string()));
            }
        };

        let url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "HTTP request returned error status");
            return NetworkResponse::failed(
                url,
                TransportError::with_status(
                    status.as_u16(),
                    format!("Request failed with status: {}", status),
                ),
            );
        }

        match response.text().await {
            Ok(body) => NetworkResponse::ok(url, body),
            Err(e) => NetworkResponse::failed(
                url,
                TransportError::new(format!("Failed to read response body: {}", e)),
            ),
        }
    }
}
