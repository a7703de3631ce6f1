//! Cached GET requests shared by all scraper APIs

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use super::{Locale, ScraperError};
use crate::services::cache::ResponseCache;
use crate::services::network::{NetworkRequest, Transport, TransportError};

/// Issues GET requests through the response cache.
///
/// Check the cache, otherwise fetch through the transport and store any
/// non-empty body under the requested URL and locale.
#[derive(Clone)]
pub struct ApiClient {
    name: &'static str,
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
}

impl ApiClient {
    pub fn new(name: &'static str, transport: Arc<dyn Transport>, cache: Arc<ResponseCache>) -> Self {
        Self {
            name,
            transport,
            cache,
        }
    }

    /// Fetch `url` for `locale`. An empty body is returned as-is; whether
    /// that is an error is up to the caller.
    pub async fn get(&self, locale: &Locale, url: Url) -> Result<String, ScraperError> {
        if self.cache.has_valid_element(&url, locale) {
            if let Some(body) = self.cache.get_element(&url, locale) {
                debug!(api = self.name, url = %url, locale = %locale, "Serving response from cache");
                // Never complete before the caller had a chance to start waiting
                tokio::task::yield_now().await;
                return Ok(body);
            }
        }

        let response = self
            .transport
            .get(NetworkRequest::new(url.clone()).with_locale(locale))
            .await;

        if let Some(error) = response.error {
            warn!(api = self.name, url = %response.url, error = %error.message, "Network error");
            return Err(map_transport_error(self.name, error));
        }

        if !response.body.is_empty() {
            self.cache
                .add_element(url, locale.clone(), response.body.clone());
        }

        Ok(response.body)
    }
}

/// Parse a URL assembled from a validated identifier
pub fn build_url(url: &str) -> Result<Url, ScraperError> {
    Url::parse(url).map_err(|e| ScraperError::config(format!("Invalid URL '{}': {}", url, e)))
}

fn map_transport_error(api: &str, error: TransportError) -> ScraperError {
    match error.status {
        Some(404) => ScraperError::not_found(format!("{}: {}", api, error.message)),
        _ => ScraperError::network(error.message),
    }
}
