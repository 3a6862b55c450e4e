// ── Controller abstraction ──
//
// Full lifecycle for one backend connection: REST client, initial bulk
// load, change listener, resync worker, optional periodic refresh, and
// the optimistic mutation surface consumers write through.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vendra_api::transport::{TlsMode, TransportConfig};
use vendra_api::{RealtimeConfig, RestClient};

use crate::config::{SyncConfig, TlsVerification};
use crate::error::CoreError;
use crate::listener::ChangeListener;
use crate::loader::{LoadOutcome, LoadState, Loader};
use crate::model::{Client, Entity, EntityId, Profile, ProfilePatch, TeamMember, User};
use crate::mutation::{MutationEngine, PendingMutation};
use crate::remote::RemoteStore;
use crate::resync::Resync;
use crate::store::{CacheSnapshot, DataStore, EntityCollection};
use crate::stream::EntityStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Reads go through the
/// cache; writes go through [`create`](Self::create),
/// [`update`](Self::update) and [`delete`](Self::delete).
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: SyncConfig,
    store: Arc<DataStore>,
    remote: Arc<ArcSwapOption<RemoteStore>>,
    resync: Arc<Resync>,
    loader: Arc<Loader>,
    engine: MutationEngine,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    /// Child token for the current connection: cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    listener: Mutex<Option<ChangeListener>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to load data and start background tasks.
    pub fn new(config: SyncConfig) -> Self {
        let store = Arc::new(DataStore::new());
        let remote = Arc::new(ArcSwapOption::empty());
        let resync = Arc::new(Resync::new());
        let loader = Arc::new(Loader::new(
            Arc::clone(&store),
            config.user_id().map(str::to_owned),
        ));
        let engine = MutationEngine::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&resync),
            Arc::clone(&loader),
        );
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                remote,
                resync,
                loader,
                engine,
                connection_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                listener: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Builds the REST client, runs the initial bulk load, then spawns the
    /// resync worker, the change listener and the periodic refresh task.
    /// An unseeded backend is not an error: the outcome says so and the
    /// consumer may import data and call [`full_refresh`](Self::full_refresh).
    pub async fn connect(&self) -> Result<LoadOutcome, CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let transport = build_transport(config);
        let rest = match RestClient::new(
            config.url.as_str(),
            &config.api_key,
            config.access_token(),
            &transport,
        ) {
            Ok(rest) => rest,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        debug!(base = %rest.base_url(), "REST client ready");
        self.inner.remote.store(Some(Arc::new(RemoteStore::new(rest))));

        let outcome = match self.full_refresh().await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.inner.remote.store(None);
                child.cancel();
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e);
            }
        };

        let mut handles = self.inner.task_handles.lock().await;

        {
            let ctrl = self.clone();
            let cancel = child.clone();
            let requests = self.inner.resync.attach();
            handles.push(tokio::spawn(async move {
                let resync = Arc::clone(&ctrl.inner.resync);
                resync.run(requests, || ctrl.full_refresh(), cancel).await;
            }));
        }

        if config.realtime_enabled && !config.watched_kinds.is_empty() {
            self.spawn_listener(&child).await;
        }

        let interval_secs = config.refresh_interval_secs;
        if interval_secs > 0 {
            let ctrl = self.clone();
            handles.push(tokio::spawn(refresh_task(ctrl, interval_secs, child.clone())));
        }

        self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!(url = %config.url, ?outcome, "connected to backend");
        Ok(outcome)
    }

    /// Start the realtime change listener. Non-fatal on failure: periodic
    /// refresh (if configured) remains as a fallback.
    async fn spawn_listener(&self, cancel: &CancellationToken) {
        let config = &self.inner.config;
        let realtime = RealtimeConfig::new(config.url.clone(), config.api_key.clone())
            .with_access_token(config.access_token().cloned());
        let watched: HashSet<_> = config.watched_kinds.iter().copied().collect();

        match ChangeListener::start(
            realtime,
            config.reconnect.clone(),
            watched,
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.resync),
            cancel,
        ) {
            Ok(listener) => *self.inner.listener.lock().await = Some(listener),
            Err(e) => warn!(error = %e, "change listener unavailable (non-fatal)"),
        }
    }

    /// Disconnect from the backend.
    ///
    /// Releases the change listener, cancels background tasks and drops
    /// the REST client. Cached data stays readable.
    pub async fn disconnect(&self) {
        if let Some(listener) = self.inner.listener.lock().await.take() {
            listener.stop().await;
        }

        // Cancel the child token (not the parent -- allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.remote.store(None);
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Re-fetch every collection and replace the cache atomically.
    pub async fn full_refresh(&self) -> Result<LoadOutcome, CoreError> {
        let remote = self.remote()?;
        self.inner.loader.reload(&remote).await
    }

    /// Wait until every reload triggered so far (by change notices or
    /// failed updates) has completed. Returns at once when no resync
    /// worker is running.
    pub async fn resync_settled(&self) {
        self.inner.resync.settled().await;
    }

    fn remote(&self) -> Result<Arc<RemoteStore>, CoreError> {
        self.inner.remote.load_full().ok_or(CoreError::Disconnected)
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Optimistically create a record.
    ///
    /// A record with a temporary id is visible in the cache as soon as
    /// this returns, before the future is awaited.
    pub fn create<T: Entity>(
        &self,
        draft: T::Draft,
    ) -> impl Future<Output = Result<Arc<T>, CoreError>> + Send + 'static + use<T> {
        self.inner.engine.create::<T>(draft)
    }

    /// Optimistically merge `patch` into the record with `id`.
    pub fn update<T: Entity>(
        &self,
        id: EntityId,
        patch: T::Patch,
    ) -> impl Future<Output = Result<Arc<T>, CoreError>> + Send + 'static + use<T> {
        self.inner.engine.update::<T>(id, patch)
    }

    /// Optimistically delete the record with `id`.
    pub fn delete<T: Entity>(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send + 'static + use<T> {
        self.inner.engine.delete::<T>(id)
    }

    /// Mutations whose backend call has not resolved, oldest first.
    pub fn pending_mutations(&self) -> Vec<PendingMutation> {
        self.inner.engine.pending().list()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.engine.pending().len()
    }

    pub fn is_pending<T: Entity>(&self, id: &EntityId) -> bool {
        self.inner.engine.pending().is_pending(T::KIND, id)
    }

    /// Optimistically store `profile` as the signed-in user's profile.
    /// `user_id` is taken from the session.
    pub fn create_profile(
        &self,
        profile: Profile,
    ) -> impl Future<Output = Result<Arc<Profile>, CoreError>> + Send + 'static {
        self.inner.engine.create_profile(profile)
    }

    /// Optimistically merge `patch` into the signed-in user's profile.
    pub fn update_profile(
        &self,
        patch: ProfilePatch,
    ) -> impl Future<Output = Result<Arc<Profile>, CoreError>> + Send + 'static {
        self.inner.engine.update_profile(patch)
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the change listener and periodic refresh since a single
    /// CLI invocation only needs one load.
    pub async fn oneshot<F, Fut, T>(config: SyncConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.realtime_enabled = false;
        cfg.refresh_interval_secs = 0;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.inner.store.subscribe_load_state()
    }

    // ── Reads (delegate to DataStore) ────────────────────────────

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.inner.store.snapshot()
    }

    pub fn collection<T: Entity>(&self) -> EntityCollection<T> {
        self.inner.store.collection::<T>()
    }

    pub fn get<T: Entity>(&self, id: &EntityId) -> Option<Arc<T>> {
        self.inner.store.get::<T>(id)
    }

    pub fn subscribe<T: Entity>(&self) -> EntityStream<T> {
        self.inner.store.subscribe::<T>()
    }

    pub fn subscribe_all(&self) -> watch::Receiver<Arc<CacheSnapshot>> {
        self.inner.store.subscribe_all()
    }

    pub fn profile(&self) -> Option<Arc<Profile>> {
        self.inner.store.profile()
    }

    /// The application user matching the session e-mail.
    pub fn current_user(&self) -> Option<Arc<User>> {
        let email = self.inner.config.email()?;
        self.inner
            .store
            .snapshot()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    // ── Portal lookups (direct backend reads) ────────────────────

    pub async fn client_by_portal_id(&self, portal_id: &str) -> Result<Option<Client>, CoreError> {
        self.remote()?.client_by_portal_id(portal_id).await
    }

    pub async fn team_member_by_portal_id(
        &self,
        portal_id: &str,
    ) -> Result<Option<TeamMember>, CoreError> {
        self.remote()?.team_member_by_portal_id(portal_id).await
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically reload everything, as a fallback for missed notices.
async fn refresh_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the sync configuration.
fn build_transport(config: &SyncConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
