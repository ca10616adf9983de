//! Content cache entry type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached remote page body.
///
/// Keyed by the fully resolved remote URL, so local rules sharing a remote
/// target share one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The resolved remote URL this entry was fetched from.
    pub url: String,
    /// Response body.
    pub body: String,
    /// Content-Type reported by the remote, if any.
    pub content_type: Option<String>,
    /// When this entry was written.
    pub cached_at: DateTime<Utc>,
    /// When it lapses; `None` never expires (duration 0).
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Create an entry stamped `now + ttl_seconds`. A zero TTL means the
    /// entry never expires.
    pub fn new(url: impl Into<String>, body: impl Into<String>, content_type: Option<String>, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        let expires_at = if ttl_seconds == 0 {
            None
        } else {
            Some(now + chrono::Duration::seconds(ttl_seconds as i64))
        };

        Self {
            url: url.into(),
            body: body.into(),
            content_type,
            cached_at: now,
            expires_at,
        }
    }

    /// Lazily detected expiry: entries are only ever found expired at read
    /// time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Remaining TTL in seconds; `None` for never-expiring entries.
    pub fn remaining_ttl(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| {
            expires_at
                .signed_duration_since(Utc::now())
                .num_seconds()
                .max(0)
        })
    }
}
