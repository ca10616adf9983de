//! Request path matching.
//!
//! Static rules are consulted first and an exact hit always wins, so a
//! hand-placed override beats any pattern rule. Dynamic rules match by
//! stored prefix; when several match, the longest (most specific) prefix
//! wins. Anything else is a miss and the host serves its own content.

use crate::rules::{RuleKind, RuleStore};

/// A matched rule for an incoming request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHit {
    /// The remote target stored on the rule.
    pub remote: String,
    /// Which bucket matched.
    pub kind: RuleKind,
}

/// Matches request paths against the rule store.
#[derive(Clone)]
pub struct Router {
    rules: RuleStore,
}

impl Router {
    /// Create a router over the rule store.
    pub fn new(rules: RuleStore) -> Self {
        Self { rules }
    }

    /// Match `request` against the rules, static bucket first.
    pub fn match_path(&self, request: &str) -> Option<RouteHit> {
        let trimmed = request.trim_start_matches('/');
        // static keys store no trailing slash either
        let exact = trimmed.trim_end_matches('/');

        for (key, remote) in self.rules.stored(RuleKind::Static) {
            if key == exact {
                return Some(RouteHit {
                    remote,
                    kind: RuleKind::Static,
                });
            }
        }

        let mut best: Option<(String, String)> = None;
        for (key, remote) in self.rules.stored(RuleKind::Dynamic) {
            if trimmed.starts_with(&key) {
                let longer = best.as_ref().is_none_or(|(k, _)| key.len() > k.len());
                if longer {
                    best = Some((key, remote));
                }
            }
        }

        best.map(|(_, remote)| RouteHit {
            remote,
            kind: RuleKind::Dynamic,
        })
    }
}
