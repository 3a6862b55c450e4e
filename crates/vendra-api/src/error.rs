use thiserror::Error;

/// Top-level error type for the `vendra-api` crate.
///
/// Covers every failure mode of the backend surfaces: authentication,
/// transport, the table REST API, and the realtime change feed.
/// `vendra-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the API key or access token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── REST API ────────────────────────────────────────────────────
    /// Structured error from the table API (`{code, message, details, hint}`).
    #[error("Backend error (HTTP {status}): {message}")]
    Backend {
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
        status: u16,
    },

    /// A single-row request matched no rows.
    #[error("No rows matched in '{table}'")]
    NoRows { table: String },

    // ── Realtime ────────────────────────────────────────────────────
    /// Realtime websocket connection failed.
    #[error("Realtime connection failed: {0}")]
    RealtimeConnect(String),

    /// Realtime websocket closed unexpectedly.
    #[error("Realtime socket closed (code {code}): {reason}")]
    RealtimeClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RealtimeConnect(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the target row or resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NoRows { .. } | Self::Backend { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` for the single-row "no rows matched" answer.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows { .. })
    }

    /// Extract the backend error code (e.g. `"PGRST116"`, `"23505"`), if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Backend { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
