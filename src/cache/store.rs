//! Content cache over the option store.

use std::sync::Arc;

use super::{entry_key, purge, resolve_remote_url, CacheEntry};
use crate::error::{PagemirrorError, Result};
use crate::http::HttpFetch;
use crate::persist::{self, keys, OptionStore};

/// TTL applied when no duration has been configured.
pub const DEFAULT_CACHE_DURATION: u64 = 3600;

/// Fetches and caches remote page bodies.
///
/// Fetch errors are returned for the failing call only and never cached, so
/// a flaky remote does not poison the cache.
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn OptionStore>,
    http: Arc<dyn HttpFetch>,
}

impl ContentCache {
    /// Create a cache over the given capabilities.
    pub fn new(store: Arc<dyn OptionStore>, http: Arc<dyn HttpFetch>) -> Self {
        Self { store, http }
    }

    /// TTL in seconds applied to future writes. Zero means never expire.
    pub fn duration(&self) -> u64 {
        persist::get_as(self.store.as_ref(), keys::CACHE_DURATION)
            .unwrap_or(DEFAULT_CACHE_DURATION)
    }

    /// Change the TTL for future writes. Existing entries keep their stamps.
    pub fn set_duration(&self, seconds: u64) -> Result<()> {
        persist::set_as(self.store.as_ref(), keys::CACHE_DURATION, &seconds)
    }

    fn load(&self, url: &str) -> Option<CacheEntry> {
        persist::get_as(self.store.as_ref(), &entry_key(url))
    }

    fn save(&self, entry: &CacheEntry) -> Result<()> {
        let key = entry_key(&entry.url);
        persist::set_as(self.store.as_ref(), &key, entry)?;

        let mut index: Vec<String> =
            persist::get_as(self.store.as_ref(), keys::CACHE_INDEX).unwrap_or_default();
        if !index.contains(&key) {
            index.push(key);
            persist::set_as(self.store.as_ref(), keys::CACHE_INDEX, &index)?;
        }
        Ok(())
    }

    /// Serve `url` from cache, fetching on a miss or lapsed entry.
    pub fn get(&self, url: &str) -> Result<CacheEntry> {
        if let Some(entry) = self.load(url) {
            if !entry.is_expired() {
                tracing::debug!("Cache hit for {}", url);
                return Ok(entry);
            }
            tracing::debug!("Cache entry for {} lapsed; refetching", url);
        }

        self.refresh(url)
    }

    /// Fetch `url` unconditionally and store the result.
    pub fn refresh(&self, url: &str) -> Result<CacheEntry> {
        let response = self.http.get(url, &[])?;

        if !response.is_success() {
            return Err(PagemirrorError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", response.status),
            });
        }

        let entry = CacheEntry::new(url, response.body, response.content_type, self.duration());
        self.save(&entry)?;
        Ok(entry)
    }

    /// Drop every entry and the site snapshot.
    pub fn invalidate_all(&self) -> Result<()> {
        tracing::debug!("Invalidating content cache");
        purge(self.store.as_ref())
    }

    /// Force-fetch every static rule target against `domain`.
    ///
    /// Fail-fast: the first fetch error aborts the run and is returned; the
    /// count reflects pages fetched before it.
    pub fn preload_all(&self, domain: &str, static_rules: &[(String, String)]) -> Result<usize> {
        if domain.is_empty() {
            return Err(PagemirrorError::Validation {
                message: "Cannot preload cache with an unresolved site domain".to_string(),
            });
        }

        let mut cached = 0;
        for (_, target) in static_rules {
            let url = resolve_remote_url(domain, target);
            self.refresh(&url)?;
            cached += 1;
        }

        Ok(cached)
    }
}
