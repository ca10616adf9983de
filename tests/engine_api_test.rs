//! Integration tests for the engine public API.
//!
//! Drives the full flow a host goes through: connect a token, configure
//! rules, read aggregated site data, route requests, preload and invalidate
//! the cache - against a mock platform.

use std::sync::Arc;

use httpmock::prelude::*;
use pagemirror::engine::{Engine, RouteOutcome};
use pagemirror::http::ReqwestFetcher;
use pagemirror::persist::MemoryStore;
use pagemirror::{PagemirrorError, TokenVersion};
use serde_json::json;

fn engine(server: &MockServer) -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), Arc::new(ReqwestFetcher::new()))
        .with_api_base(&server.base_url());
    (engine, store)
}

fn rows(pairs: &[(&str, &str)]) -> Vec<Vec<String>> {
    pairs
        .iter()
        .map(|(l, r)| vec![l.to_string(), r.to_string()])
        .collect()
}

/// Mock a connected v2 site whose published pages are served by the same
/// mock server (the custom domain carries the mock's origin).
fn mock_site(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/v2/token/authorized_by");
        then.status(200).json_body(json!({"id": "user-1"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/sites");
        then.status(200).json_body(json!({"sites": [{
            "id": "s1", "displayName": "Example", "shortName": "example"
        }]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/sites/s1/custom_domains");
        then.status(200).json_body(json!({"customDomains": [
            {"id": "d1", "url": server.base_url()}
        ]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/sites/s1/pages");
        then.status(200).json_body(json!({"pages": [
            {"id": "p1", "title": "Home", "slug": ""},
            {"id": "p2", "title": "About", "slug": "about"}
        ]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/sites/s1/collections");
        then.status(200).json_body(json!({"collections": [
            {"id": "c1", "displayName": "Posts", "slug": "posts", "singularName": "Post"}
        ]}));
    });
}

#[test]
fn connect_configure_and_route() {
    let server = MockServer::start();
    mock_site(&server);

    let about = server.mock(|when, then| {
        when.method(GET).path("/about");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html>about page</html>");
    });

    let (mut engine, _) = engine(&server);

    // connect
    let credential = engine.save_token("site-token").unwrap();
    assert_eq!(credential.version, TokenVersion::V2);
    assert!(engine.has_token());

    // configure
    let saved = engine
        .save_static_rules(&rows(&[("/about/", "/about")]))
        .unwrap();
    assert_eq!(saved, vec![("/about".to_string(), "/about".to_string())]);

    // aggregated data for the admin frontend
    let record = engine.aggregated_site_data();
    assert!(record.has_token);
    assert_eq!(record.pages.as_ref().unwrap().len(), 2);
    assert_eq!(record.site.unwrap().name, "Example");

    // route
    match engine.route_request("/about").unwrap() {
        RouteOutcome::Hit { body, content_type } => {
            assert_eq!(body, "<html>about page</html>");
            assert_eq!(content_type, "text/html");
        }
        RouteOutcome::Miss => panic!("expected a hit"),
    }

    // a second request is cache-served
    engine.route_request("/about").unwrap();
    about.assert_calls(1);

    // paths without a rule fall through
    assert_eq!(
        engine.route_request("/not-mapped").unwrap(),
        RouteOutcome::Miss
    );
}

#[test]
fn static_rules_shadow_dynamic_rules_when_routing() {
    let server = MockServer::start();
    mock_site(&server);

    let pinned = server.mock(|when, then| {
        when.method(GET).path("/pinned");
        then.status(200).body("pinned");
    });
    let listing = server.mock(|when, then| {
        when.method(GET).path("/blog/");
        then.status(200).body("listing");
    });

    let (mut engine, _) = engine(&server);
    engine.save_token("site-token").unwrap();
    engine
        .save_static_rules(&rows(&[("/blog/post", "/pinned")]))
        .unwrap();
    engine
        .save_dynamic_rules(&rows(&[("/blog/*", "/blog/")]))
        .unwrap();

    match engine.route_request("/blog/post").unwrap() {
        RouteOutcome::Hit { body, .. } => assert_eq!(body, "pinned"),
        RouteOutcome::Miss => panic!("expected a hit"),
    }
    match engine.route_request("/blog/other").unwrap() {
        RouteOutcome::Hit { body, .. } => assert_eq!(body, "listing"),
        RouteOutcome::Miss => panic!("expected a hit"),
    }

    pinned.assert_calls(1);
    listing.assert_calls(1);
}

#[test]
fn invalidation_forces_fresh_remote_reads() {
    let server = MockServer::start();
    mock_site(&server);

    let page = server.mock(|when, then| {
        when.method(GET).path("/about");
        then.status(200).body("body");
    });

    let (mut engine, _) = engine(&server);
    engine.save_token("site-token").unwrap();
    engine
        .save_static_rules(&rows(&[("/about", "/about")]))
        .unwrap();

    engine.route_request("/about").unwrap();
    engine.route_request("/about").unwrap();
    page.assert_calls(1);

    engine.invalidate_cache().unwrap();

    engine.route_request("/about").unwrap();
    page.assert_calls(2);
}

#[test]
fn preload_fetches_all_static_targets_and_fails_fast() {
    let server = MockServer::start();
    mock_site(&server);

    server.mock(|when, then| {
        when.method(GET).path("/one");
        then.status(200).body("1");
    });
    server.mock(|when, then| {
        when.method(GET).path("/two");
        then.status(200).body("2");
    });

    let (mut engine, _) = engine(&server);
    engine.save_token("site-token").unwrap();
    engine
        .save_static_rules(&rows(&[("/one", "/one"), ("/two", "/two")]))
        .unwrap();

    let count = engine.preload_cache().unwrap();
    assert_eq!(count, 2);

    // now a bucket where the middle target is broken
    server.mock(|when, then| {
        when.method(GET).path("/broken");
        then.status(500).body("boom");
    });
    let third = server.mock(|when, then| {
        when.method(GET).path("/three");
        then.status(200).body("3");
    });

    engine
        .save_static_rules(&rows(&[
            ("/one", "/one"),
            ("/broken", "/broken"),
            ("/three", "/three"),
        ]))
        .unwrap();

    let err = engine.preload_cache().unwrap_err();
    assert!(matches!(err, PagemirrorError::Fetch { .. }));
    third.assert_calls(0);
}

#[test]
fn rejected_token_leaves_nothing_persisted() {
    let server = MockServer::start();
    // v2 probe fails, v1 probe succeeds: a legacy token
    server.mock(|when, then| {
        when.method(GET).path("/v2/token/authorized_by");
        then.status(500).body("no");
    });
    server.mock(|when, then| {
        when.method(GET).path("/info");
        then.status(200).json_body(json!({"authorization": {}}));
    });

    let (mut engine, _) = engine(&server);

    let err = engine.save_token("legacy-token").unwrap_err();
    assert!(matches!(
        err,
        PagemirrorError::InvalidToken {
            version: TokenVersion::V1
        }
    ));
    assert!(!engine.has_token());
    // the probe's bookkeeping is all that remains
    assert_eq!(engine.saved_token_version(), Some(TokenVersion::V1));
}

#[test]
fn aggregated_data_without_a_token_reports_the_error() {
    let server = MockServer::start();
    let (mut engine, _) = engine(&server);

    let record = engine.aggregated_site_data();

    assert!(!record.has_token);
    assert!(record.error.is_some());
    assert!(record.pages.is_none());
}

#[test]
fn remove_token_with_drop_data_resets_the_engine() {
    let server = MockServer::start();
    mock_site(&server);

    let (mut engine, store) = engine(&server);
    engine.save_token("site-token").unwrap();
    engine
        .save_static_rules(&rows(&[("/about", "/about")]))
        .unwrap();

    engine.remove_token(true).unwrap();

    assert!(!engine.has_token());
    assert!(engine.list_static_rules().is_empty());
    assert!(store.is_empty());
}
