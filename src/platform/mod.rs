//! Remote platform client.
//!
//! Webflow exposes two incompatible API generations. [`PlatformApi`] is the
//! shared capability set; [`V1Backend`] and [`V2Backend`] implement it and are
//! selected by the credential's resolved [`TokenVersion`](crate::token::TokenVersion)
//! - strategy dispatch over a value, no hierarchy.
//!
//! Response decoding is centralized here: non-200 statuses try to parse the
//! platform's structured `{code, msg}` error body, falling back to a generic
//! platform error. A parsed `code == 401` removes the stored credential before
//! the error propagates (documented self-heal contract for revoked tokens).

pub mod types;
pub mod v1;
pub mod v2;

pub use types::{CollectionMeta, DomainMeta, PageMeta, SiteMeta, SiteSnapshot};
pub use v1::V1Backend;
pub use v2::V2Backend;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{PagemirrorError, Result};
use crate::http::{HttpFetch, HttpResponse};
use crate::persist::OptionStore;
use crate::token::{self, TokenVersion};

/// Default API origin for both protocol generations.
pub const DEFAULT_API_BASE: &str = "https://api.webflow.com";

/// Suffix of the platform's default subdomain for unpublished custom domains.
pub const DEFAULT_SUBDOMAIN_SUFFIX: &str = ".webflow.io";

/// Canonical `scheme://host` origin for a site domain.
///
/// Domains resolved from the platform are bare hostnames; a domain that
/// already carries a scheme is kept as-is.
pub fn origin_for(domain: &str) -> String {
    let trimmed = domain.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Capability set shared by the two protocol backends.
pub trait PlatformApi {
    /// Probe whether the token authenticates against this protocol.
    fn authorization_info(&self) -> Result<serde_json::Value>;

    /// Sites reachable with the credential (a site token yields exactly one).
    fn list_sites(&self) -> Result<Vec<SiteMeta>>;

    /// Custom domains attached to a site.
    fn site_domains(&self, site_id: &str) -> Result<Vec<DomainMeta>>;

    /// CMS collections of a site.
    fn list_collections(&self, site_id: &str) -> Result<Vec<CollectionMeta>>;

    /// Published static pages. v1 reads the published site's manifest and
    /// needs the resolved `domain`; v2 has a pages endpoint.
    fn static_pages(&self, site: &SiteMeta, domain: &str) -> Result<Vec<PageMeta>>;
}

/// Structured error body the platform returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: serde_json::Value,
    #[serde(alias = "message")]
    msg: String,
}

fn parse_error_body(body: &str) -> Option<(i64, String)> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let code = match &parsed.code {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    Some((code, parsed.msg))
}

/// Decode a non-2xx platform response into a typed error, applying the 401
/// credential self-heal as a side effect.
pub(crate) fn decode_error(
    store: &dyn OptionStore,
    response: &HttpResponse,
    context: &str,
) -> PagemirrorError {
    match parse_error_body(&response.body) {
        Some((code, message)) => {
            if code == 401 {
                tracing::warn!("Platform rejected the credential; removing stored token");
                if let Err(e) = token::drop_credential(store) {
                    tracing::warn!("Failed to drop stale credential: {}", e);
                }
            }
            PagemirrorError::Platform { code, message }
        }
        None => PagemirrorError::Platform {
            code: i64::from(response.status),
            message: context.to_string(),
        },
    }
}

/// GET `url` and decode a JSON payload of type `T`.
///
/// `context` is the human-readable failure description used when the platform
/// does not provide a structured error body.
pub(crate) fn request<T: DeserializeOwned>(
    http: &dyn HttpFetch,
    store: &dyn OptionStore,
    url: &str,
    headers: &[(String, String)],
    context: &str,
) -> Result<T> {
    let response = http.get(url, headers)?;

    if !response.is_success() {
        return Err(decode_error(store, &response, context));
    }

    serde_json::from_str(&response.body).map_err(|_| PagemirrorError::Platform {
        code: i64::from(response.status),
        message: context.to_string(),
    })
}

/// Client over the backend matching a resolved token version.
///
/// Memoizes the site and domain for its own lifetime; snapshot persistence is
/// the aggregator's concern.
pub struct RemoteClient {
    backend: Box<dyn PlatformApi>,
    site: Option<SiteMeta>,
    domain: Option<String>,
}

impl RemoteClient {
    /// Build a client for `version`. `Unknown` has no backend.
    pub fn new(
        version: TokenVersion,
        token: &str,
        store: Arc<dyn OptionStore>,
        http: Arc<dyn HttpFetch>,
        api_base: &str,
    ) -> Option<Self> {
        let backend: Box<dyn PlatformApi> = match version {
            TokenVersion::V1 => Box::new(V1Backend::new(token, store, http, api_base)),
            TokenVersion::V2 => Box::new(V2Backend::new(token, store, http, api_base)),
            TokenVersion::Unknown => return None,
        };

        Some(Self {
            backend,
            site: None,
            domain: None,
        })
    }

    /// The sole site reachable by the credential.
    pub fn get_site(&mut self) -> Result<SiteMeta> {
        if let Some(site) = &self.site {
            return Ok(site.clone());
        }

        let site = self
            .backend
            .list_sites()?
            .into_iter()
            .next()
            .ok_or_else(|| PagemirrorError::Platform {
                code: 0,
                message: "Site data seems not valid".to_string(),
            })?;

        self.site = Some(site.clone());
        Ok(site)
    }

    /// First custom domain, else the default platform subdomain. Bare host.
    pub fn get_site_domain(&mut self) -> Result<String> {
        if let Some(domain) = &self.domain {
            return Ok(domain.clone());
        }

        let site = self.get_site()?;
        let domain = self
            .backend
            .site_domains(&site.id)?
            .into_iter()
            .next()
            .map(|d| d.name)
            .unwrap_or_else(|| format!("{}{}", site.short_name, DEFAULT_SUBDOMAIN_SUFFIX));

        self.domain = Some(domain.clone());
        Ok(domain)
    }

    /// Compose pages + collections + domain into a snapshot.
    ///
    /// Sub-calls run in sequence; the first failure propagates and no partial
    /// snapshot is ever produced.
    pub fn get_site_data(&mut self) -> Result<SiteSnapshot> {
        let mut site = self.get_site()?;
        let domain = self.get_site_domain()?;
        let pages = self.backend.static_pages(&site, &domain)?;
        let collections = self.backend.list_collections(&site.id)?;

        site.domain = Some(origin_for(&domain));
        self.site = Some(site.clone());

        Ok(SiteSnapshot {
            site,
            pages,
            collections,
        })
    }
}
