// ── Core error types ──
//
// User-facing errors from vendra-core. Consumers never see raw HTTP or
// socket errors; the `From<vendra_api::Error>` impl translates them into
// domain-appropriate variants.

use thiserror::Error;

use crate::model::EntityKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Not connected to a backend")]
    Disconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {kind} with id {identifier}")]
    NotFound { kind: String, identifier: String },

    #[error("{kind} {identifier} is still being created")]
    PendingCreation { kind: EntityKind, identifier: String },

    #[error("Backend holds no clients, projects or packages yet")]
    EmptyBackend,

    #[error("Invalid record from backend: {message}")]
    InvalidRecord { message: String },

    // ── Backend errors (wrapped, not exposed raw) ────────────────────
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        /// Backend error code (e.g. `"23505"` for a unique violation).
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
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

impl CoreError {
    pub(crate) fn not_found(kind: EntityKind, identifier: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            identifier: identifier.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vendra_api::Error> for CoreError {
    fn from(err: vendra_api::Error) -> Self {
        match err {
            vendra_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vendra_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        kind: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Backend {
                        message: e.to_string(),
                        code: None,
                        details: None,
                        hint: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vendra_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vendra_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            vendra_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vendra_api::Error::Backend {
                message,
                code,
                details,
                hint,
                status,
            } => CoreError::Backend {
                message,
                code,
                details,
                hint,
                status: Some(status),
            },
            vendra_api::Error::NoRows { table } => CoreError::NotFound {
                kind: table,
                identifier: String::new(),
            },
            vendra_api::Error::RealtimeConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Realtime connection failed: {reason}"),
            },
            vendra_api::Error::RealtimeClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Realtime socket closed (code {code}): {reason}"),
            },
            vendra_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidRecord { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_keeps_structure() {
        let err = CoreError::from(vendra_api::Error::Backend {
            message: "duplicate key".into(),
            code: Some("23505".into()),
            details: None,
            hint: None,
            status: 409,
        });
        match err {
            CoreError::Backend { code, status, .. } => {
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(status, Some(409));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn no_rows_becomes_not_found() {
        let err = CoreError::from(vendra_api::Error::NoRows {
            table: "clients".into(),
        });
        assert!(err.is_not_found());
    }

    #[test]
    fn timeout_keeps_duration() {
        let err = CoreError::from(vendra_api::Error::Timeout { timeout_secs: 30 });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 30 }));
    }
}
