//! In-memory option store.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::OptionStore;
use crate::error::Result;

/// Process-local option store backed by a map.
///
/// The store of choice for tests and for embedders that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored options.
    pub fn len(&self) -> usize {
        self.values.lock().expect("option store poisoned").len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently stored, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.values
            .lock()
            .expect("option store poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl OptionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .expect("option store poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values
            .lock()
            .expect("option store poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .expect("option store poisoned")
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get() {
        let store = MemoryStore::new();
        store.set("token", json!("abc")).unwrap();

        assert_eq!(store.get("token"), Some(json!("abc")));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn set_replaces_previous_value() {
        let store = MemoryStore::new();
        store.set("k", json!(1)).unwrap();
        store.set("k", json!(2)).unwrap();

        assert_eq!(store.get("k"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_removes_value() {
        let store = MemoryStore::new();
        store.set("k", json!("v")).unwrap();
        store.delete("k").unwrap();

        assert!(store.get("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn delete_missing_is_noop() {
        let store = MemoryStore::new();
        store.delete("never-set").unwrap();
    }
}
