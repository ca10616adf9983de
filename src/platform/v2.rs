//! Current (v2) protocol backend.
//!
//! Enveloped responses (`{sites: [...]}`), plain `id` identifiers, and a
//! first-class pages endpoint, so no manifest fetch is needed.

use std::sync::Arc;

use serde::Deserialize;

use super::{request, types::*, PlatformApi};
use crate::error::Result;
use crate::http::HttpFetch;
use crate::persist::OptionStore;

/// Backend speaking the current API.
pub struct V2Backend {
    token: String,
    store: Arc<dyn OptionStore>,
    http: Arc<dyn HttpFetch>,
    base: String,
}

#[derive(Debug, Deserialize)]
struct SitesEnvelope {
    sites: Vec<RawSite>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    id: String,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(rename = "shortName")]
    short_name: String,
    #[serde(rename = "lastPublished")]
    last_published: Option<String>,
    #[serde(rename = "previewUrl")]
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DomainsEnvelope {
    #[serde(rename = "customDomains")]
    custom_domains: Vec<RawDomain>,
}

#[derive(Debug, Deserialize)]
struct RawDomain {
    id: Option<String>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CollectionsEnvelope {
    collections: Vec<RawCollection>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    slug: Option<String>,
    #[serde(rename = "singularName")]
    singular_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PagesEnvelope {
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    id: Option<String>,
    title: Option<String>,
    slug: Option<String>,
}

impl V2Backend {
    /// Create a backend for `token` against `api_base`.
    ///
    /// `api_base` is the API origin shared with v1; the `/v2` segment is
    /// appended here.
    pub fn new(
        token: &str,
        store: Arc<dyn OptionStore>,
        http: Arc<dyn HttpFetch>,
        api_base: &str,
    ) -> Self {
        Self {
            token: token.to_string(),
            store,
            http,
            base: format!("{}/v2", api_base.trim_end_matches('/')),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.token),
        )]
    }

    fn get<T: serde::de::DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        request(
            self.http.as_ref(),
            self.store.as_ref(),
            &format!("{}{}", self.base, path),
            &self.headers(),
            context,
        )
    }
}

impl PlatformApi for V2Backend {
    fn authorization_info(&self) -> Result<serde_json::Value> {
        self.get(
            "/token/authorized_by",
            "The API key you used is invalid: failed to get token info",
        )
    }

    fn list_sites(&self) -> Result<Vec<SiteMeta>> {
        let envelope: SitesEnvelope =
            self.get("/sites", "The API key you used is invalid: failed to list sites")?;

        Ok(envelope
            .sites
            .into_iter()
            .map(|s| SiteMeta {
                id: s.id,
                name: s.display_name,
                short_name: s.short_name,
                last_published: s.last_published,
                preview_url: s.preview_url,
                domain: None,
            })
            .collect())
    }

    fn site_domains(&self, site_id: &str) -> Result<Vec<DomainMeta>> {
        let envelope: DomainsEnvelope = self.get(
            &format!("/sites/{}/custom_domains", site_id),
            "The API key you used is invalid: failed to list your site domains",
        )?;

        Ok(envelope
            .custom_domains
            .into_iter()
            .map(|d| DomainMeta {
                id: d.id,
                name: d.url,
            })
            .collect())
    }

    fn list_collections(&self, site_id: &str) -> Result<Vec<CollectionMeta>> {
        let envelope: CollectionsEnvelope = self.get(
            &format!("/sites/{}/collections", site_id),
            "The API key you used is invalid: failed to list your CMS Collections",
        )?;

        Ok(envelope
            .collections
            .into_iter()
            .map(|c| CollectionMeta {
                id: c.id,
                name: c.display_name,
                slug: c.slug,
                singular_name: c.singular_name,
            })
            .collect())
    }

    fn static_pages(&self, site: &SiteMeta, _domain: &str) -> Result<Vec<PageMeta>> {
        let envelope: PagesEnvelope = self.get(
            &format!("/sites/{}/pages", site.id),
            "The API key failed. Try publishing your site first",
        )?;

        Ok(envelope
            .pages
            .into_iter()
            .map(|p| PageMeta {
                id: p.id,
                title: p.title,
                slug: p.slug,
            })
            .collect())
    }
}
