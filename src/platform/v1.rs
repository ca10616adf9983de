//! Legacy (v1) protocol backend.
//!
//! Bare-array responses, `_id` identifiers, and an `accept-version` header.
//! Static pages are not an API resource in this generation: they come from
//! the `static-manifest.json` the platform publishes alongside the site.

use std::sync::Arc;

use serde::Deserialize;

use super::{origin_for, request, types::*, PlatformApi};
use crate::error::Result;
use crate::http::HttpFetch;
use crate::persist::OptionStore;

/// Backend speaking the legacy API.
pub struct V1Backend {
    token: String,
    store: Arc<dyn OptionStore>,
    http: Arc<dyn HttpFetch>,
    base: String,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(rename = "shortName")]
    short_name: String,
    #[serde(rename = "lastPublished")]
    last_published: Option<String>,
    #[serde(rename = "previewUrl")]
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDomain {
    #[serde(rename = "_id")]
    id: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "_id")]
    id: String,
    name: Option<String>,
    slug: Option<String>,
    #[serde(rename = "singularName")]
    singular_name: Option<String>,
}

/// Entry in the published static manifest.
#[derive(Debug, Deserialize)]
struct RawManifestPage {
    title: Option<String>,
    slug: Option<String>,
    url: Option<String>,
}

/// The manifest is either a bare page array or wrapped in `{pages: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Manifest {
    Pages(Vec<RawManifestPage>),
    Enveloped { pages: Vec<RawManifestPage> },
}

impl V1Backend {
    /// Create a backend for `token` against `api_base`.
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
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Authorization".to_string(), format!("Bearer {}", self.token)),
            ("accept-version".to_string(), "1.0.0".to_string()),
            (
                "Content-Type".to_string(),
                "application/json; charset=utf-8".to_string(),
            ),
        ]
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

impl PlatformApi for V1Backend {
    fn authorization_info(&self) -> Result<serde_json::Value> {
        self.get("/info", "The API key you used is invalid: failed to get token info")
    }

    fn list_sites(&self) -> Result<Vec<SiteMeta>> {
        let raw: Vec<RawSite> =
            self.get("/sites", "The API key you used is invalid: failed to list sites")?;

        Ok(raw
            .into_iter()
            .map(|s| SiteMeta {
                id: s.id,
                name: s.name,
                short_name: s.short_name,
                last_published: s.last_published,
                preview_url: s.preview_url,
                domain: None,
            })
            .collect())
    }

    fn site_domains(&self, site_id: &str) -> Result<Vec<DomainMeta>> {
        let raw: Vec<RawDomain> = self.get(
            &format!("/sites/{}/domains", site_id),
            "The API key you used is invalid: failed to list your site domains",
        )?;

        Ok(raw
            .into_iter()
            .map(|d| DomainMeta {
                id: d.id,
                name: d.name,
            })
            .collect())
    }

    fn list_collections(&self, site_id: &str) -> Result<Vec<CollectionMeta>> {
        let raw: Vec<RawCollection> = self.get(
            &format!("/sites/{}/collections", site_id),
            "The API key you used is invalid: failed to list your CMS Collections",
        )?;

        Ok(raw
            .into_iter()
            .map(|c| CollectionMeta {
                id: c.id,
                name: c.name,
                slug: c.slug,
                singular_name: c.singular_name,
            })
            .collect())
    }

    fn static_pages(&self, _site: &SiteMeta, domain: &str) -> Result<Vec<PageMeta>> {
        let url = format!("{}/static-manifest.json", origin_for(domain));
        let manifest: Manifest = request(
            self.http.as_ref(),
            self.store.as_ref(),
            &url,
            &self.headers(),
            "The API key failed. Try publishing your site first",
        )?;

        let pages = match manifest {
            Manifest::Pages(pages) => pages,
            Manifest::Enveloped { pages } => pages,
        };

        Ok(pages
            .into_iter()
            .map(|p| PageMeta {
                id: None,
                title: p.title,
                // older manifests carry `url` instead of `slug`
                slug: p.slug.or(p.url),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ReqwestFetcher;
    use crate::persist::MemoryStore;
    use httpmock::prelude::*;
    use serde_json::json;

    fn backend(server: &MockServer) -> V1Backend {
        V1Backend::new(
            "token-1",
            Arc::new(MemoryStore::new()),
            Arc::new(ReqwestFetcher::new()),
            &server.base_url(),
        )
    }

    #[test]
    fn sends_v1_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/info")
                .header("Authorization", "Bearer token-1")
                .header("accept-version", "1.0.0");
            then.status(200).json_body(json!({"authorization": {}}));
        });

        backend(&server).authorization_info().unwrap();
        mock.assert();
    }

    #[test]
    fn list_sites_normalizes_underscore_ids() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/sites");
            then.status(200).json_body(json!([{
                "_id": "580e63e98c9a982ac9b8b741",
                "name": "Example",
                "shortName": "example",
                "lastPublished": "2024-03-01T00:00:00Z",
                "previewUrl": "https://screenshots.webflow.com/sites/x.png"
            }]));
        });

        let sites = backend(&server).list_sites().unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, "580e63e98c9a982ac9b8b741");
        assert_eq!(sites[0].short_name, "example");
        assert!(sites[0].last_published.is_some());
    }

    #[test]
    fn collections_normalize_singular_name() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/sites/s1/collections");
            then.status(200).json_body(json!([{
                "_id": "c1",
                "name": "Blog Posts",
                "slug": "posts",
                "singularName": "Blog Post"
            }]));
        });

        let collections = backend(&server).list_collections("s1").unwrap();
        assert_eq!(collections[0].singular_name.as_deref(), Some("Blog Post"));
    }

    #[test]
    fn manifest_accepts_bare_array() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/static-manifest.json");
            then.status(200).json_body(json!([
                {"title": "Home", "slug": ""},
                {"title": "About", "url": "/about"}
            ]));
        });

        let site = SiteMeta {
            id: "s1".into(),
            name: "One".into(),
            short_name: "one".into(),
            last_published: None,
            preview_url: None,
            domain: None,
        };

        let pages = backend(&server)
            .static_pages(&site, &server.base_url())
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].slug.as_deref(), Some("/about"));
    }

    #[test]
    fn manifest_accepts_enveloped_pages() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/static-manifest.json");
            then.status(200)
                .json_body(json!({"pages": [{"title": "Home", "slug": ""}]}));
        });

        let site = SiteMeta {
            id: "s1".into(),
            name: "One".into(),
            short_name: "one".into(),
            last_published: None,
            preview_url: None,
            domain: None,
        };

        let pages = backend(&server)
            .static_pages(&site, &server.base_url())
            .unwrap();

        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn unpublished_site_manifest_failure_has_publish_hint() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/static-manifest.json");
            then.status(404).body("<html>not found</html>");
        });

        let site = SiteMeta {
            id: "s1".into(),
            name: "One".into(),
            short_name: "one".into(),
            last_published: None,
            preview_url: None,
            domain: None,
        };

        let err = backend(&server)
            .static_pages(&site, &server.base_url())
            .unwrap_err();

        assert!(err.to_string().contains("publishing"));
    }
}
