//! Pagemirror - serve pages published on a hosted site builder behind local paths.
//!
//! A host site maps local URL paths to pages published on an external
//! site-building platform. Pagemirror decides, per incoming path, whether a
//! rule maps it to a remote page, fetches and caches the remote HTML, and
//! hands the body back to the host's request pipeline.
//!
//! # Modules
//!
//! - [`engine`] - the facade hosts call: tokens, rules, cache, routing
//! - [`token`] - credential ownership and protocol version probing
//! - [`platform`] - v1/v2 API backends and the remote client
//! - [`rules`] - static and dynamic rule storage and normalization
//! - [`router`] - request path matching with static-first precedence
//! - [`cache`] - TTL-stamped remote content cache with preload
//! - [`sitedata`] - the aggregated snapshot the admin frontend consumes
//! - [`persist`] - the option-store capability and its adapters
//! - [`http`] - the fetch capability and its reqwest implementation
//! - [`error`] - error types and result alias
//! - [`cli`] - command-line interface over a file-backed engine
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pagemirror::engine::{Engine, RouteOutcome};
//! use pagemirror::http::ReqwestFetcher;
//! use pagemirror::persist::MemoryStore;
//!
//! let mut engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(ReqwestFetcher::new()));
//! engine.save_token("a-v2-site-token").unwrap();
//! engine.save_static_rules(&[vec!["/about".into(), "/about".into()]]).unwrap();
//!
//! match engine.route_request("/about").unwrap() {
//!     RouteOutcome::Hit { body, .. } => println!("{}", body),
//!     RouteOutcome::Miss => println!("not mirrored"),
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod engine;
pub mod error;
pub mod http;
pub mod persist;
pub mod platform;
pub mod router;
pub mod rules;
pub mod sitedata;
pub mod token;

pub use engine::{Engine, LocalPageHook, NoopPageHook, RouteOutcome};
pub use error::{PagemirrorError, Result};
pub use token::{Credential, TokenVersion};
