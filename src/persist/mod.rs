//! Key-value persistence capability.
//!
//! The engine does not own a storage technology. Hosts supply an
//! [`OptionStore`]: a flat namespace of JSON values with get/set/delete and no
//! transactional guarantees. Two adapters ship with the crate:
//!
//! - [`MemoryStore`] - in-process map, used by tests and embedders
//! - [`FileStore`] - single JSON document under a state directory, used by the
//!   CLI binary

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde_json::Value;

use crate::error::Result;

/// Option keys owned by the engine.
///
/// Everything the engine persists lives under these names; hosts must treat
/// the namespace as opaque.
pub mod keys {
    /// The saved platform API token (v2 only).
    pub const API_TOKEN: &str = "api_token";
    /// The resolved protocol version for the saved token.
    pub const API_TOKEN_VERSION: &str = "api_token_version";
    /// Static (exact-path) rules in stored form.
    pub const STATIC_RULES: &str = "static_rules";
    /// Dynamic (prefix) rules in stored form.
    pub const DYNAMIC_RULES: &str = "dynamic_rules";
    /// Cache TTL in seconds applied to future writes.
    pub const CACHE_DURATION: &str = "cache_duration";
    /// The combined site/pages/collections snapshot.
    pub const SITE_SNAPSHOT: &str = "site_snapshot";
    /// Index of live cache entry keys, for bulk invalidation.
    pub const CACHE_INDEX: &str = "cache_index";
    /// Prefix for individual content cache entries.
    pub const CACHE_ENTRY_PREFIX: &str = "cache_entry.";
}

/// Key-value persistence supplied by the host.
///
/// Reads are infallible: a missing or unreadable value is `None`, mirroring
/// how option APIs in host environments behave. Writes may fail with IO
/// errors and are propagated.
pub trait OptionStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete the value stored under `key`. Deleting a missing key is a no-op.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a typed value from the store.
///
/// Values that fail to deserialize are treated as absent.
pub fn get_as<T: serde::de::DeserializeOwned>(store: &dyn OptionStore, key: &str) -> Option<T> {
    store
        .get(key)
        .and_then(|value| serde_json::from_value(value).ok())
}

/// Serialize and store a typed value.
pub fn set_as<T: serde::Serialize>(store: &dyn OptionStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|e| anyhow::anyhow!("failed to serialize option {}: {}", key, e))?;
    store.set(key, value)
}
