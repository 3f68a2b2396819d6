use thiserror::Error;

/// Top-level error type for the `airdeploy-api` crate.
///
/// Covers every failure mode of the control-plane REST surface:
/// authentication, transport, structured API errors, and payload decoding.
/// `airdeploy-core` maps these into deployment-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key rejected by the controller (HTTP 401).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The API key could not be turned into a request header.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An id that cannot be sent as a single path segment.
    #[error("Invalid identifier {id:?}: must be non-empty and not '.' or '..'")]
    InvalidId { id: String },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the controller. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Control-plane API ───────────────────────────────────────────
    /// Structured error returned by the controller.
    #[error("Control-plane API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
