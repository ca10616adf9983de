//! Local-path to remote-target rules.
//!
//! Two buckets: static rules map an exact local path to a remote target,
//! dynamic rules map a path prefix (stored with a trailing `/`, rendered with
//! a trailing `*`). Saves replace a bucket wholesale; the admin frontend
//! always sends the complete set. Stored keys carry no leading slash; the
//! outward form is re-prefixed on the way out.

use std::sync::Arc;

use crate::error::Result;
use crate::persist::{self, keys, OptionStore};

/// Which rule bucket an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Exact-path match.
    Static,
    /// Prefix match.
    Dynamic,
}

impl RuleKind {
    fn option_key(self) -> &'static str {
        match self {
            RuleKind::Static => keys::STATIC_RULES,
            RuleKind::Dynamic => keys::DYNAMIC_RULES,
        }
    }
}

/// Normalize a static local path to its stored key: no leading or trailing
/// slash. The home page stores as the empty key.
pub fn normalize_static(local: &str) -> String {
    local
        .trim_start_matches('/')
        .trim_end_matches('/')
        .to_string()
}

/// Normalize a dynamic local path to its stored key: strip leading `/`,
/// trailing `*`, trailing `/`, then terminate with a single `/` to mark
/// prefix semantics.
pub fn normalize_dynamic(local: &str) -> String {
    let stripped = local
        .trim_start_matches('/')
        .trim_end_matches('*')
        .trim_end_matches('/');
    format!("{}/", stripped)
}

fn render_static(key: &str) -> String {
    // keys persisted before normalization existed may already carry a slash
    if key.starts_with('/') {
        key.to_string()
    } else {
        format!("/{}", key)
    }
}

fn render_dynamic(key: &str) -> String {
    if key.starts_with('/') {
        key.to_string()
    } else {
        format!("/{}*", key)
    }
}

/// A working copy of rules in outward form, for incremental edits between a
/// list and the save that persists them.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rows: Vec<(String, String)>,
}

impl RuleSet {
    /// Wrap an outward-form rule list.
    pub fn from_rows(rows: Vec<(String, String)>) -> Self {
        Self { rows }
    }

    /// Append a rule. Does not persist.
    pub fn add(&mut self, local: &str, remote: &str) {
        self.rows.push((local.to_string(), remote.to_string()));
    }

    /// Remove the rule at `index`. Does not persist.
    pub fn remove(&mut self, index: usize) -> Option<(String, String)> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    /// Current rows.
    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    /// Convert into the row payload `RuleStore::save` accepts.
    pub fn into_payload(self) -> Vec<Vec<String>> {
        self.rows
            .into_iter()
            .map(|(local, remote)| vec![local, remote])
            .collect()
    }
}

/// Persistent store for both rule buckets.
#[derive(Clone)]
pub struct RuleStore {
    store: Arc<dyn OptionStore>,
}

impl RuleStore {
    /// Create a store over the persistence capability.
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    /// Rules of `kind` in stored form (normalized keys).
    pub fn stored(&self, kind: RuleKind) -> Vec<(String, String)> {
        persist::get_as(self.store.as_ref(), kind.option_key()).unwrap_or_default()
    }

    /// Rules of `kind` in outward form (leading `/`, trailing `*` for
    /// dynamic).
    pub fn list(&self, kind: RuleKind) -> Vec<(String, String)> {
        self.stored(kind)
            .iter()
            .map(|(key, remote)| {
                let local = match kind {
                    RuleKind::Static => render_static(key),
                    RuleKind::Dynamic => render_dynamic(key),
                };
                (local, remote.clone())
            })
            .collect()
    }

    /// Replace the whole `kind` bucket with `rows` and return the canonical
    /// outward form.
    ///
    /// Rows that are not exactly `[local, remote]` are skipped, not rejected:
    /// the admin frontend sends what it has and a single malformed entry must
    /// not abort the save. Duplicate locals collapse, last value wins.
    pub fn save(&self, kind: RuleKind, rows: &[Vec<String>]) -> Result<Vec<(String, String)>> {
        let mut to_store: Vec<(String, String)> = Vec::new();

        for row in rows {
            if row.len() != 2 {
                tracing::debug!("Skipping malformed rule row with {} fields", row.len());
                continue;
            }

            let key = match kind {
                RuleKind::Static => normalize_static(&row[0]),
                RuleKind::Dynamic => normalize_dynamic(&row[0]),
            };
            let remote = row[1].clone();

            if let Some(existing) = to_store.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = remote;
            } else {
                to_store.push((key, remote));
            }
        }

        persist::set_as(self.store.as_ref(), kind.option_key(), &to_store)?;

        Ok(to_store
            .iter()
            .map(|(key, remote)| {
                let local = match kind {
                    RuleKind::Static => format!("/{}", key),
                    RuleKind::Dynamic => format!("/{}*", key),
                };
                (local, remote.clone())
            })
            .collect())
    }

    /// Delete both buckets.
    pub fn clear(&self) -> Result<()> {
        self.store.delete(keys::STATIC_RULES)?;
        self.store.delete(keys::DYNAMIC_RULES)
    }
}
