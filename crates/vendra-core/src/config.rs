// ── Runtime sync configuration ──
//
// Describes *where* the backend lives and *who* is signed in. Carries
// credentials and tuning but never touches disk: the CLI (via
// vendra-config) builds a `SyncConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vendra_api::ReconnectConfig;

use crate::model::EntityKind;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file, for self-hosted backends.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// The signed-in principal, as supplied by the identity provider.
#[derive(Debug, Clone)]
pub struct Session {
    /// Scopes the profile lookup.
    pub user_id: String,
    /// Resolves the application user record.
    pub email: String,
    /// Bearer token sent instead of the public key.
    pub access_token: Option<SecretString>,
}

/// Configuration for syncing against one backend.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Project URL (e.g. `https://abcd.supabase.co`).
    pub url: Url,
    /// Public (anon) API key.
    pub api_key: SecretString,
    /// Current session; without one no profile is loaded.
    pub session: Option<Session>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Subscribe to the realtime change feed on connect.
    pub realtime_enabled: bool,
    /// Kinds whose remote changes trigger a reload.
    pub watched_kinds: Vec<EntityKind>,
    /// Periodic full refresh interval (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    pub reconnect: ReconnectConfig,
}

impl SyncConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            session: None,
            tls: TlsVerification::default(),
            timeout: vendra_api::transport::DEFAULT_TIMEOUT,
            realtime_enabled: true,
            watched_kinds: EntityKind::DEFAULT_WATCHED.to_vec(),
            refresh_interval_secs: 0,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.email.as_str())
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.session.as_ref().and_then(|s| s.access_token.as_ref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_watch_the_busy_tables() {
        let config = SyncConfig::new(
            "https://demo.supabase.co".parse().unwrap(),
            SecretString::from("anon".to_owned()),
        );
        assert_eq!(config.watched_kinds.len(), 5);
        assert!(config.watched_kinds.contains(&EntityKind::Transactions));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_id().is_none());
    }
}
