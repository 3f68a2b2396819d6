// ── Core error types ──
//
// Deployment-level errors from airdeploy-core. Consumers never see HTTP
// status codes or JSON parse failures directly. The
// `From<airdeploy_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.
//
// Only `Validation` and `EntityCreation` ever escape a deployment run;
// every other variant is captured per item in the run summary.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fatal pipeline errors ────────────────────────────────────────
    #[error("Validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Network entity creation failed: {message}")]
    EntityCreation { message: String },

    // ── Per-item errors (captured, never thrown by a run) ────────────
    #[error("Profile discovery failed for site {site}: {message}")]
    Discovery { site: String, message: String },

    #[error("Assignment to profile {profile} failed: {message}")]
    Assignment { profile: String, message: String },

    #[error("Profile sync failed: {message}")]
    Sync { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Assignment store error: {message}")]
    Store { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// The API-specific error code (e.g., "profile.locked").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<airdeploy_api::Error> for CoreError {
    fn from(err: airdeploy_api::Error) -> Self {
        match err {
            airdeploy_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            airdeploy_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            airdeploy_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            airdeploy_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            airdeploy_api::Error::InvalidId { .. } => CoreError::Config {
                message: err.to_string(),
            },
            airdeploy_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            airdeploy_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                code: Some("rate_limited".into()),
                status: Some(429),
            },
            airdeploy_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            airdeploy_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Store {
            message: format!("invalid store snapshot: {err}"),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Store {
            message: err.to_string(),
        }
    }
}
