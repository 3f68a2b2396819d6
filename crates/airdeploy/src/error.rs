//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use airdeploy_config::ConfigError;
use airdeploy_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// The run completed but some profiles were not assigned or synced.
    pub const PARTIAL_FAILURE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(airdeploy::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(airdeploy::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(airdeploy::auth_failed),
        help(
            "Verify the API key for this controller.\n\
             Store a new one with: airdeploy config set-api-key"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(airdeploy::no_credentials),
        help(
            "Store a key with: airdeploy config set-api-key --profile {profile}\n\
             Or set the AIRDEPLOY_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(airdeploy::not_found),
        help("Run: airdeploy {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Deployment ───────────────────────────────────────────────────
    #[error("Deployment rejected: {}", .errors.join("; "))]
    #[diagnostic(
        code(airdeploy::invalid_deployment),
        help("Fix the manifest and run again. Nothing was sent to the controller.")
    )]
    InvalidDeployment { errors: Vec<String> },

    #[error("Network entity could not be created: {message}")]
    #[diagnostic(
        code(airdeploy::entity_creation),
        help("No profiles were touched. Check the network definition and controller logs.")
    )]
    EntityCreation { message: String },

    #[error("{failed} of {total} profile assignments did not succeed")]
    #[diagnostic(
        code(airdeploy::partial_failure),
        help(
            "Successful assignments were recorded. Inspect drift with:\n\
             airdeploy reconcile {network_id}"
        )
    )]
    PartialFailure {
        failed: usize,
        total: usize,
        network_id: String,
    },

    #[error("Assignment state file error: {message}")]
    #[diagnostic(
        code(airdeploy::store),
        help("Point --state-file at a writable location, or remove a corrupt file.")
    )]
    Store { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(airdeploy::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(airdeploy::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(airdeploy::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(airdeploy::no_config),
        help(
            "Pass --controller and --api-key, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(airdeploy::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(airdeploy::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(airdeploy::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    #[diagnostic(code(airdeploy::yaml), help("Check the file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::PartialFailure { .. } => exit_code::PARTIAL_FAILURE,
            Self::Validation { .. }
            | Self::InvalidDeployment { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Json(_)
            | Self::Yaml(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { errors } => CliError::InvalidDeployment { errors },

            CoreError::EntityCreation { message } => CliError::EntityCreation { message },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,


            CoreError::Store { message } => CliError::Store { message },

            CoreError::Api { message, code, .. } => CliError::ApiError {
                code: code.unwrap_or_else(|| "api".into()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "controller".into(),
                reason: message,
            },

            CoreError::Discovery { site, message } => CliError::ApiError {
                code: "discovery".into(),
                message: format!("site {site}: {message}"),
            },

            CoreError::Assignment { profile, message } => CliError::ApiError {
                code: "assignment".into(),
                message: format!("profile {profile}: {message}"),
            },

            CoreError::Sync { message } => CliError::ApiError {
                code: "sync".into(),
                message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
