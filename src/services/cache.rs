//! In-memory cache for raw scraper responses
//!
//! Entries are keyed by the exact (URL, locale) pair. There is no expiry and
//! no size bound: a body fetched once is served for as long as the cache
//! lives, or until [`ResponseCache::clear`] is called.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::scrapers::Locale;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: Url,
    locale: Locale,
}

/// Response cache shared by all scraper APIs
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a non-empty body is stored for this exact pair
    pub fn has_valid_element(&self, url: &Url, locale: &Locale) -> bool {
        self.get_element(url, locale).is_some()
    }

    /// Get the stored body, if any
    pub fn get_element(&self, url: &Url, locale: &Locale) -> Option<String> {
        let key = CacheKey {
            url: url.clone(),
            locale: locale.clone(),
        };
        let entries = self.entries.read();
        entries.get(&key).filter(|body| !body.is_empty()).cloned()
    }

    /// Store a body, replacing any previous one for the same pair
    pub fn add_element(&self, url: Url, locale: Locale, body: String) {
        let mut entries = self.entries.write();
        entries.insert(CacheKey { url, locale }, body);
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared cache instance type
pub type SharedResponseCache = Arc<ResponseCache>;
