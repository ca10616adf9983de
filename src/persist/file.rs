//! File-backed option store.
//!
//! Persists the full option namespace as one JSON document under a state
//! directory, so the CLI keeps its token, rules and cache across invocations.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use super::OptionStore;
use crate::error::Result;

/// Option store persisted to a single `state.json` file.
///
/// Every write rewrites the whole document; last write wins, which matches
/// the engine's replace-wholesale mutation discipline.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, Value>>,
}

impl FileStore {
    /// Open (or create) the store at `path`.
    ///
    /// An unreadable or corrupt document starts the store empty rather than
    /// failing; the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Discarding corrupt state file {:?}: {}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// The default state file location: `~/.pagemirror/state.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pagemirror")
            .join("state.json")
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &HashMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| anyhow::anyhow!("failed to serialize state: {}", e))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl OptionStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .expect("option store poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().expect("option store poisoned");
        values.insert(key.to_string(), value);
        self.flush(&values)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().expect("option store poisoned");
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}
