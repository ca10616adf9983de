//! Aggregated site data for the admin frontend.
//!
//! Combines the platform client's outputs into one [`SiteSnapshot`] cached as
//! a unit with zero expiry, and folds it with rules and cache settings into
//! the stable record the frontend consumes. The record always carries
//! `hasToken`; failures become an `error` field on the same shape, so callers
//! never branch between success payloads and exceptions.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::ContentCache;
use crate::error::{PagemirrorError, Result};
use crate::http::HttpFetch;
use crate::persist::{self, keys, OptionStore};
use crate::platform::{CollectionMeta, PageMeta, RemoteClient, SiteMeta, SiteSnapshot, DEFAULT_API_BASE};
use crate::rules::{RuleKind, RuleStore};
use crate::token::TokenManager;

/// The record handed to the administrative frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDataRecord {
    pub has_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageMeta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<CollectionMeta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_rules: Option<Vec<(String, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_rules: Option<Vec<(String, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-through cache over [`RemoteClient`] for the combined snapshot.
pub struct SiteDataAggregator {
    store: Arc<dyn OptionStore>,
    http: Arc<dyn HttpFetch>,
    api_base: String,
}

impl SiteDataAggregator {
    /// Create an aggregator over the given capabilities.
    pub fn new(store: Arc<dyn OptionStore>, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            store,
            http,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override the API origin (tests, staging).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// The snapshot, from the store when present, composed remotely otherwise.
    ///
    /// A failing sub-call invalidates the snapshot cache and propagates; no
    /// partial snapshot is ever stored.
    pub fn site_data(&self, tokens: &mut TokenManager) -> Result<SiteSnapshot> {
        if let Some(snapshot) = persist::get_as(self.store.as_ref(), keys::SITE_SNAPSHOT) {
            return Ok(snapshot);
        }

        let token = tokens.get_token().unwrap_or_default();
        let version = tokens.resolve_version(&token);
        let mut client = RemoteClient::new(
            version,
            &token,
            self.store.clone(),
            self.http.clone(),
            &self.api_base,
        )
        .ok_or(PagemirrorError::InvalidToken { version })?;

        match client.get_site_data() {
            Ok(snapshot) => {
                persist::set_as(self.store.as_ref(), keys::SITE_SNAPSHOT, &snapshot)?;
                Ok(snapshot)
            }
            Err(e) => {
                if let Err(delete_err) = self.store.delete(keys::SITE_SNAPSHOT) {
                    tracing::warn!("Failed to invalidate snapshot: {}", delete_err);
                }
                Err(e)
            }
        }
    }

    /// Drop the cached snapshot.
    pub fn invalidate(&self) -> Result<()> {
        self.store.delete(keys::SITE_SNAPSHOT)
    }

    /// Build the frontend record, folding any failure into its `error` field.
    pub fn aggregated(
        &self,
        tokens: &mut TokenManager,
        rules: &RuleStore,
        cache: &ContentCache,
    ) -> SiteDataRecord {
        let has_token = tokens.has_token();

        match self.site_data(tokens) {
            Ok(snapshot) => SiteDataRecord {
                has_token,
                site: Some(snapshot.site),
                pages: Some(snapshot.pages),
                collections: Some(snapshot.collections),
                static_rules: Some(rules.list(RuleKind::Static)),
                dynamic_rules: Some(rules.list(RuleKind::Dynamic)),
                cache_duration: Some(cache.duration()),
                error: None,
            },
            Err(e) => {
                if e.platform_code() == Some(401) {
                    // the response layer already dropped the credential
                    tokens.forget();
                }

                SiteDataRecord {
                    has_token: tokens.has_token(),
                    site: None,
                    pages: None,
                    collections: None,
                    static_rules: None,
                    dynamic_rules: None,
                    cache_duration: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
