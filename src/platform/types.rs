//! Normalized metadata returned by the platform APIs.
//!
//! The v1 and v2 protocols disagree on field names and envelopes; backends
//! decode their raw shapes and normalize into these types. Serialized form is
//! camelCase because the snapshot is handed verbatim to the admin frontend.

use serde::{Deserialize, Serialize};

/// The one site reachable with a site-scoped token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMeta {
    /// Platform identifier for the site.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short name, also the default subdomain label.
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Canonical `https://` origin, filled in once the domain is resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A published static page.
///
/// v1 derives these from the published site's manifest, which omits ids;
/// every field is optional so both protocols normalize losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// A CMS collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_name: Option<String>,
}

/// A domain attached to a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Bare hostname, no scheme.
    pub name: String,
}

/// The combined site/pages/collections payload, cached as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSnapshot {
    pub site: SiteMeta,
    pub pages: Vec<PageMeta>,
    pub collections: Vec<CollectionMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_meta_serializes_camel_case() {
        let site = SiteMeta {
            id: "5f0".into(),
            name: "Example".into(),
            short_name: "example".into(),
            last_published: None,
            preview_url: None,
            domain: Some("https://example.webflow.io".into()),
        };

        let json = serde_json::to_value(&site).unwrap();
        assert_eq!(json["shortName"], "example");
        assert_eq!(json["domain"], "https://example.webflow.io");
        assert!(json.get("lastPublished").is_none());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = SiteSnapshot {
            site: SiteMeta {
                id: "s1".into(),
                name: "Site".into(),
                short_name: "site".into(),
                last_published: Some("2024-01-01".into()),
                preview_url: None,
                domain: None,
            },
            pages: vec![PageMeta {
                id: None,
                title: Some("Home".into()),
                slug: Some("".into()),
            }],
            collections: vec![CollectionMeta {
                id: "c1".into(),
                name: Some("Posts".into()),
                slug: Some("posts".into()),
                singular_name: Some("Post".into()),
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SiteSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
