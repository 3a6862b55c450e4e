//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vendra_config::ConfigError;
use vendra_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(vendra::connection_failed),
        help(
            "Check the project URL and your network.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vendra::auth_failed),
        help(
            "Verify the API key and session token.\n\
             Run: vendra config set-key"
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(vendra::no_credentials),
        help(
            "Configure one with: vendra config init\n\
             Or set the VENDRA_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Records ──────────────────────────────────────────────────────
    #[error("{kind} '{identifier}' not found")]
    #[diagnostic(
        code(vendra::not_found),
        help("Run: vendra list {kind} to see available records")
    )]
    NotFound { kind: String, identifier: String },

    #[error("{kind} '{identifier}' has not been confirmed by the backend yet")]
    #[diagnostic(code(vendra::pending_creation))]
    PendingCreation { kind: String, identifier: String },

    #[error("The backend holds no clients, projects or packages")]
    #[diagnostic(
        code(vendra::empty_backend),
        help("Import or create initial data, then run: vendra sync")
    )]
    EmptyBackend,

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend error ({code}): {message}")]
    #[diagnostic(code(vendra::backend_error), help("{hint}"))]
    Backend {
        code: String,
        message: String,
        hint: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vendra::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vendra::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vendra config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(vendra::no_config),
        help(
            "Create a profile with: vendra config init\n\
             Expected at: {path}\n\
             Or pass --url and --key."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(vendra::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(vendra::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(vendra::json), help("Check the JSON data and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PendingCreation { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "backend connection was lost".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound { kind, identifier } => CliError::NotFound { kind, identifier },

            CoreError::PendingCreation { kind, identifier } => CliError::PendingCreation {
                kind: kind.to_string(),
                identifier,
            },

            CoreError::EmptyBackend => CliError::EmptyBackend,

            CoreError::InvalidRecord { message } => CliError::Backend {
                code: "invalid_record".into(),
                message,
                hint: "The backend returned a row this version cannot read.".into(),
            },

            CoreError::Backend {
                message,
                code,
                details,
                hint,
                status,
            } => CliError::Backend {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
                hint: hint.or(details).unwrap_or_default(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
