//! Error types for the DigiBuddy domain.
//!
//! Each bounded context has its own `thiserror` enum.

use std::path::PathBuf;
use thiserror::Error;

/// Any failure of the external language-model capability.
///
/// The resolver treats every variant the same way (fallback reply); the
/// variants exist so the failure can be logged precisely.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse knowledge file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid knowledge entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}
