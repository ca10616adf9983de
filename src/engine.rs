//! The engine facade.
//!
//! Everything the host environment calls goes through [`Engine`]: token
//! lifecycle, rule management, cache control, aggregated site data, and
//! request routing. The engine is an explicitly constructed context object
//! over two injected capabilities - an option store and an HTTP fetcher -
//! with no process-wide state of its own.

use std::sync::Arc;

use crate::cache::{resolve_remote_url, ContentCache};
use crate::error::{PagemirrorError, Result};
use crate::http::HttpFetch;
use crate::persist::{self, keys, OptionStore};
use crate::router::Router;
use crate::rules::{RuleKind, RuleStore};
use crate::sitedata::{SiteDataAggregator, SiteDataRecord};
use crate::token::{Credential, TokenManager, TokenVersion};

/// Host-side effect fired once per saved top-level static rule, so the host
/// can create a matching local page for its permalink machinery.
///
/// Failures are the host's problem; the engine ignores them.
pub trait LocalPageHook: Send + Sync {
    fn ensure_page(&self, slug: &str);
}

/// Hook that does nothing; the default for hosts without local pages.
pub struct NoopPageHook;

impl LocalPageHook for NoopPageHook {
    fn ensure_page(&self, _slug: &str) {}
}

/// Result of routing an incoming request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A rule matched and the remote content is available.
    Hit {
        body: String,
        content_type: String,
    },
    /// No rule matched; the host serves its own content.
    Miss,
}

/// The narrow interface between the core and its host.
pub struct Engine {
    store: Arc<dyn OptionStore>,
    http: Arc<dyn HttpFetch>,
    tokens: TokenManager,
    rules: RuleStore,
    router: Router,
    cache: ContentCache,
    aggregator: SiteDataAggregator,
    page_hook: Box<dyn LocalPageHook>,
}

impl Engine {
    /// Build an engine over the injected capabilities.
    pub fn new(store: Arc<dyn OptionStore>, http: Arc<dyn HttpFetch>) -> Self {
        let rules = RuleStore::new(store.clone());

        Self {
            tokens: TokenManager::new(store.clone(), http.clone()),
            router: Router::new(rules.clone()),
            cache: ContentCache::new(store.clone(), http.clone()),
            aggregator: SiteDataAggregator::new(store.clone(), http.clone()),
            page_hook: Box::new(NoopPageHook),
            rules,
            store,
            http,
        }
    }

    /// Override the platform API origin (tests, staging).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.tokens =
            TokenManager::new(self.store.clone(), self.http.clone()).with_api_base(api_base);
        self.aggregator =
            SiteDataAggregator::new(self.store.clone(), self.http.clone()).with_api_base(api_base);
        self
    }

    /// Install the host's page-creation hook.
    pub fn with_page_hook(mut self, hook: Box<dyn LocalPageHook>) -> Self {
        self.page_hook = hook;
        self
    }

    // --- token lifecycle ---

    /// Save a token, probing its version; only v2 tokens persist.
    ///
    /// A token change always drops cached content and the snapshot, even
    /// when the new token is rejected.
    pub fn save_token(&mut self, raw: &str) -> Result<Credential> {
        self.cache.invalidate_all()?;
        self.tokens.set_token(raw)
    }

    /// Probe a token's version without the save policy.
    pub fn check_token(&mut self, raw: &str) -> Result<TokenVersion> {
        self.tokens.check_token(raw)
    }

    /// Remove the credential; with `drop_data`, the rules go too.
    pub fn remove_token(&mut self, drop_data: bool) -> Result<()> {
        self.tokens.remove_token(drop_data)
    }

    /// True when a non-empty token is saved.
    pub fn has_token(&mut self) -> bool {
        self.tokens.has_token()
    }

    /// The persisted version determination, if one exists. Never probes.
    pub fn saved_token_version(&self) -> Option<TokenVersion> {
        persist::get_as(self.store.as_ref(), keys::API_TOKEN_VERSION)
    }

    // --- rules ---

    /// Static rules in outward form.
    pub fn list_static_rules(&self) -> Vec<(String, String)> {
        self.rules.list(RuleKind::Static)
    }

    /// Dynamic rules in outward form.
    pub fn list_dynamic_rules(&self) -> Vec<(String, String)> {
        self.rules.list(RuleKind::Dynamic)
    }

    /// Replace the static rule set; returns the canonical outward form.
    ///
    /// Fires the page hook for each stored top-level path (nested paths
    /// cannot become host permalinks and are stored without a page), then
    /// invalidates the cache: a rule change redraws the whole routing map.
    pub fn save_static_rules(&mut self, rows: &[Vec<String>]) -> Result<Vec<(String, String)>> {
        let saved = self.rules.save(RuleKind::Static, rows)?;

        for (key, _) in self.rules.stored(RuleKind::Static) {
            if !key.is_empty() && !key.contains('/') {
                self.page_hook.ensure_page(&key);
            }
        }

        self.cache.invalidate_all()?;
        Ok(saved)
    }

    /// Replace the dynamic rule set; returns the canonical outward form.
    pub fn save_dynamic_rules(&mut self, rows: &[Vec<String>]) -> Result<Vec<(String, String)>> {
        let saved = self.rules.save(RuleKind::Dynamic, rows)?;
        self.cache.invalidate_all()?;
        Ok(saved)
    }

    // --- cache control ---

    /// Drop every cached page and the site snapshot.
    pub fn invalidate_cache(&self) -> Result<()> {
        self.cache.invalidate_all()
    }

    /// TTL in seconds for future cache writes.
    pub fn cache_duration(&self) -> u64 {
        self.cache.duration()
    }

    /// Change the TTL for future cache writes.
    pub fn set_cache_duration(&self, seconds: u64) -> Result<()> {
        self.cache.set_duration(seconds)
    }

    /// Eagerly fetch every static rule target. Fail-fast on the first error.
    pub fn preload_cache(&mut self) -> Result<usize> {
        let domain = self.site_domain()?;
        let static_rules = self.rules.stored(RuleKind::Static);
        self.cache.preload_all(&domain, &static_rules)
    }

    // --- aggregated data & routing ---

    /// The stable record the admin frontend consumes.
    pub fn aggregated_site_data(&mut self) -> SiteDataRecord {
        self.aggregator
            .aggregated(&mut self.tokens, &self.rules, &self.cache)
    }

    /// Route an incoming local path.
    ///
    /// A rule miss is `Ok(Miss)`; a matched rule whose content cannot be
    /// fetched is an error, for the host to handle (typically by serving its
    /// own content this once).
    pub fn route_request(&mut self, path: &str) -> Result<RouteOutcome> {
        let Some(hit) = self.router.match_path(path) else {
            return Ok(RouteOutcome::Miss);
        };

        let domain = self.site_domain()?;
        let url = resolve_remote_url(&domain, &hit.remote);
        let entry = self.cache.get(&url)?;

        Ok(RouteOutcome::Hit {
            body: entry.body,
            content_type: entry
                .content_type
                .unwrap_or_else(|| "text/html".to_string()),
        })
    }

    /// The site's canonical origin, via the cached snapshot.
    fn site_domain(&mut self) -> Result<String> {
        let snapshot = self.aggregator.site_data(&mut self.tokens)?;
        snapshot
            .site
            .domain
            .ok_or_else(|| PagemirrorError::Validation {
                message: "Site domain is not resolved".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ReqwestFetcher;
    use crate::persist::MemoryStore;
    use std::sync::Mutex;

    struct RecordingHook {
        created: Mutex<Vec<String>>,
    }

    impl LocalPageHook for RecordingHook {
        fn ensure_page(&self, slug: &str) {
            self.created.lock().unwrap().push(slug.to_string());
        }
    }

    fn engine_with_hook() -> (Engine, Arc<MemoryStore>, Arc<RecordingHook>) {
        let store = Arc::new(MemoryStore::new());
        let hook = Arc::new(RecordingHook {
            created: Mutex::new(Vec::new()),
        });

        struct SharedHook(Arc<RecordingHook>);
        impl LocalPageHook for SharedHook {
            fn ensure_page(&self, slug: &str) {
                self.0.ensure_page(slug);
            }
        }

        let engine = Engine::new(store.clone(), Arc::new(ReqwestFetcher::new()))
            .with_page_hook(Box::new(SharedHook(hook.clone())));

        (engine, store, hook)
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<Vec<String>> {
        pairs
            .iter()
            .map(|(l, r)| vec![l.to_string(), r.to_string()])
            .collect()
    }

    #[test]
    fn page_hook_fires_for_top_level_statics_only() {
        let (mut engine, _, hook) = engine_with_hook();

        engine
            .save_static_rules(&rows(&[
                ("/about", "/about"),
                ("/blog/nested", "/blog/nested"),
                ("/", "/"),
            ]))
            .unwrap();

        let created = hook.created.lock().unwrap();
        assert_eq!(created.as_slice(), ["about"]);
    }

    #[test]
    fn rule_save_drops_the_snapshot() {
        let (mut engine, store, _) = engine_with_hook();
        store
            .set(keys::SITE_SNAPSHOT, serde_json::json!({"stale": true}))
            .unwrap();

        engine
            .save_dynamic_rules(&rows(&[("/blog/*", "/blog/")]))
            .unwrap();

        assert!(store.get(keys::SITE_SNAPSHOT).is_none());
    }

    #[test]
    fn route_miss_needs_no_token() {
        let (mut engine, _, _) = engine_with_hook();

        let outcome = engine.route_request("/unmapped").unwrap();
        assert_eq!(outcome, RouteOutcome::Miss);
    }

    #[test]
    fn saved_version_reads_without_probing() {
        let (engine, store, _) = engine_with_hook();
        assert!(engine.saved_token_version().is_none());

        store
            .set(keys::API_TOKEN_VERSION, serde_json::json!("v2"))
            .unwrap();
        assert_eq!(engine.saved_token_version(), Some(TokenVersion::V2));
    }
}
