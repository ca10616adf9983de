//! API credential management.
//!
//! One credential exists at a time. Its protocol version is never
//! user-supplied: it is derived by probing the platform's authorization
//! endpoints (v2 first, v1 as fallback) and cached - in memory for the
//! process, and in the option store across processes - until explicitly
//! invalidated. Only v2 tokens are ever persisted; a legacy token is
//! detected by the probe but rejected at save time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PagemirrorError, Result};
use crate::http::HttpFetch;
use crate::persist::{self, keys, OptionStore};
use crate::platform::{PlatformApi, V1Backend, V2Backend, DEFAULT_API_BASE};

/// Which protocol generation a credential authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenVersion {
    V1,
    V2,
    Unknown,
}

impl fmt::Display for TokenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenVersion::V1 => "v1",
            TokenVersion::V2 => "v2",
            TokenVersion::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A token together with its resolved version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub version: TokenVersion,
}

/// Remove the persisted credential and everything derived from it.
///
/// Shared by [`TokenManager::remove_token`] and the platform layer's 401
/// self-heal; does not touch the rule sets.
pub(crate) fn drop_credential(store: &dyn OptionStore) -> Result<()> {
    store.delete(keys::API_TOKEN)?;
    store.delete(keys::API_TOKEN_VERSION)?;
    crate::cache::purge(store)
}

/// Owns the process-wide credential and its version cache.
pub struct TokenManager {
    store: Arc<dyn OptionStore>,
    http: Arc<dyn HttpFetch>,
    api_base: String,
    token: Option<String>,
    version: Option<TokenVersion>,
}

impl TokenManager {
    /// Create a manager over the given capabilities.
    pub fn new(store: Arc<dyn OptionStore>, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            store,
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            version: None,
        }
    }

    /// Override the API origin (tests, staging).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// The current token: in-memory first, then the persisted option.
    ///
    /// Never probes the version as a side effect.
    pub fn get_token(&mut self) -> Option<String> {
        if let Some(token) = &self.token {
            return Some(token.clone());
        }

        let token: Option<String> = persist::get_as(self.store.as_ref(), keys::API_TOKEN);
        if let Some(token) = token {
            self.token = Some(token.clone());
            Some(token)
        } else {
            None
        }
    }

    /// True when a non-empty token is available.
    pub fn has_token(&mut self) -> bool {
        self.get_token().is_some_and(|t| !t.is_empty())
    }

    /// Resolve which protocol `token` authenticates against.
    ///
    /// Memoized in-process and persisted; a re-probe happens only when no
    /// cached determination exists. `Unknown` is never cached, so transient
    /// network failures do not stick.
    pub fn resolve_version(&mut self, token: &str) -> TokenVersion {
        if let Some(version) = self.version {
            return version;
        }

        if token.is_empty() {
            return TokenVersion::Unknown;
        }

        if let Some(version) =
            persist::get_as::<TokenVersion>(self.store.as_ref(), keys::API_TOKEN_VERSION)
        {
            self.version = Some(version);
            return version;
        }

        let version = self.probe(token);
        if version != TokenVersion::Unknown {
            self.version = Some(version);
            if let Err(e) =
                persist::set_as(self.store.as_ref(), keys::API_TOKEN_VERSION, &version)
            {
                tracing::warn!("Failed to persist token version: {}", e);
            }
        }
        version
    }

    /// Probe the authorization endpoints, newest protocol first.
    ///
    /// Probe failures never escape; both failing folds to `Unknown`.
    fn probe(&self, token: &str) -> TokenVersion {
        let v2 = V2Backend::new(token, self.store.clone(), self.http.clone(), &self.api_base);
        if v2.authorization_info().is_ok() {
            tracing::debug!("Token authenticates against the v2 API");
            return TokenVersion::V2;
        }

        let v1 = V1Backend::new(token, self.store.clone(), self.http.clone(), &self.api_base);
        if v1.authorization_info().is_ok() {
            tracing::debug!("Token authenticates against the legacy v1 API");
            return TokenVersion::V1;
        }

        TokenVersion::Unknown
    }

    /// Save `raw` as the credential.
    ///
    /// Clears the cached version, re-probes, and persists only when the token
    /// resolves to v2. For v1/unknown, any previously persisted token is
    /// dropped and the in-memory credential cleared; the version bookkeeping
    /// from the probe may remain.
    pub fn set_token(&mut self, raw: &str) -> Result<Credential> {
        self.version = None;
        self.store.delete(keys::API_TOKEN_VERSION)?;

        let version = self.resolve_version(raw);

        if version == TokenVersion::V2 {
            persist::set_as(self.store.as_ref(), keys::API_TOKEN, &raw)?;
            self.token = Some(raw.to_string());
            Ok(Credential {
                token: raw.to_string(),
                version,
            })
        } else {
            self.store.delete(keys::API_TOKEN)?;
            self.token = None;
            Err(PagemirrorError::InvalidToken { version })
        }
    }

    /// Probe `raw` fresh and report its version, without the save policy.
    pub fn check_token(&mut self, raw: &str) -> Result<TokenVersion> {
        self.version = None;
        self.store.delete(keys::API_TOKEN_VERSION)?;
        Ok(self.resolve_version(raw))
    }

    /// Drop the in-memory memos so the next read reflects the store.
    ///
    /// Used after the platform layer's 401 self-heal, which deletes the
    /// persisted credential behind this manager's back.
    pub(crate) fn forget(&mut self) {
        self.token = None;
        self.version = None;
    }

    /// Remove the credential, its version cache, and all cached content.
    ///
    /// With `drop_data`, the rule sets go too.
    pub fn remove_token(&mut self, drop_data: bool) -> Result<()> {
        self.token = None;
        self.version = None;
        drop_credential(self.store.as_ref())?;

        if drop_data {
            self.store.delete(keys::STATIC_RULES)?;
            self.store.delete(keys::DYNAMIC_RULES)?;
        }
        Ok(())
    }
}
