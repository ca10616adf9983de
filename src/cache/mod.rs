//! Remote content caching.
//!
//! Fetched page bodies live in the option store under hashed keys, with an
//! index option so bulk invalidation can enumerate them. Expiry is stamped
//! per entry at write time and detected lazily at read time.

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::ContentCache;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::persist::{self, keys, OptionStore};
use crate::platform::origin_for;

/// Option key for a cache entry.
pub(crate) fn entry_key(url: &str) -> String {
    let hash = Sha256::digest(url.as_bytes());
    format!("{}{}", keys::CACHE_ENTRY_PREFIX, hex::encode(&hash[..16]))
}

/// Drop every cache entry and the site snapshot.
///
/// Free-standing so the credential lifecycle can invalidate without holding
/// a [`ContentCache`].
pub fn purge(store: &dyn OptionStore) -> Result<()> {
    let index: Vec<String> =
        persist::get_as(store, keys::CACHE_INDEX).unwrap_or_default();

    for key in index {
        store.delete(&key)?;
    }
    store.delete(keys::CACHE_INDEX)?;
    store.delete(keys::SITE_SNAPSHOT)
}

/// Resolve a rule's remote target against the site domain.
///
/// Targets are normally site-relative paths; an absolute `http(s)` target is
/// used verbatim.
pub fn resolve_remote_url(domain: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }

    let origin = origin_for(domain);
    if target.starts_with('/') {
        format!("{}{}", origin, target)
    } else {
        format!("{}/{}", origin, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use serde_json::json;

    #[test]
    fn entry_keys_are_deterministic_and_distinct() {
        let a1 = entry_key("https://x.webflow.io/about");
        let a2 = entry_key("https://x.webflow.io/about");
        let b = entry_key("https://x.webflow.io/contact");

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(a1.starts_with(keys::CACHE_ENTRY_PREFIX));
    }

    #[test]
    fn purge_deletes_indexed_entries_and_snapshot() {
        let store = MemoryStore::new();
        let key = entry_key("https://x.webflow.io/about");
        store.set(&key, json!({"body": "x"})).unwrap();
        store.set(keys::CACHE_INDEX, json!([key.clone()])).unwrap();
        store.set(keys::SITE_SNAPSHOT, json!({"site": {}})).unwrap();
        store.set(keys::STATIC_RULES, json!([["a", "/a"]])).unwrap();

        purge(&store).unwrap();

        assert!(store.get(&key).is_none());
        assert!(store.get(keys::CACHE_INDEX).is_none());
        assert!(store.get(keys::SITE_SNAPSHOT).is_none());
        // rules are not cache state
        assert!(store.get(keys::STATIC_RULES).is_some());
    }

    #[test]
    fn relative_targets_resolve_against_the_domain() {
        assert_eq!(
            resolve_remote_url("x.webflow.io", "/about"),
            "https://x.webflow.io/about"
        );
        assert_eq!(
            resolve_remote_url("x.webflow.io/", "about"),
            "https://x.webflow.io/about"
        );
    }

    #[test]
    fn absolute_targets_are_used_verbatim() {
        assert_eq!(
            resolve_remote_url("x.webflow.io", "https://elsewhere.example/about"),
            "https://elsewhere.example/about"
        );
    }

    #[test]
    fn scheme_carrying_domains_are_respected() {
        assert_eq!(
            resolve_remote_url("http://127.0.0.1:9000", "/about"),
            "http://127.0.0.1:9000/about"
        );
    }
}
