//! Error types for pagemirror operations.
//!
//! This module defines [`PagemirrorError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `PagemirrorError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `PagemirrorError::Other`) for unexpected errors
//! - Components return typed errors across boundaries; nothing is retried
//!   internally

use thiserror::Error;

use crate::token::TokenVersion;

/// Core error type for pagemirror operations.
#[derive(Debug, Error)]
pub enum PagemirrorError {
    /// Credential failed both protocol probes or resolved to an unsupported
    /// version.
    #[error("Invalid token: resolved as {version}, only v2 tokens can be saved")]
    InvalidToken { version: TokenVersion },

    /// The remote platform answered with an error, structured or not.
    #[error("Platform error {code}: {message}")]
    Platform { code: i64, message: String },

    /// Network or transport failure fetching a remote resource.
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Malformed rule input or invalid engine state for the operation.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PagemirrorError {
    /// The platform error code, when this is a [`PagemirrorError::Platform`].
    pub fn platform_code(&self) -> Option<i64> {
        match self {
            PagemirrorError::Platform { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type alias for pagemirror operations.
pub type Result<T> = std::result::Result<T, PagemirrorError>;
