// ── Change notification listener ──
//
// Owns the realtime subscription for the watched kinds and a bridge task
// that turns every relevant row change into a resync request. A re-join
// after a dropped socket also requests one, since changes made while
// disconnected were never delivered. Dropping the listener tears both down.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};
use vendra_api::{RealtimeConfig, RealtimeEvent, RealtimeHandle, ReconnectConfig};

use crate::error::CoreError;
use crate::model::EntityKind;
use crate::resync::Resync;
use crate::store::DataStore;

/// A live subscription to remote changes.
///
/// Acquired explicitly, released on [`stop`](Self::stop) or drop.
pub struct ChangeListener {
    watched: HashSet<EntityKind>,
    bridge: Option<JoinHandle<()>>,
    _guard: DropGuard,
}

impl ChangeListener {
    /// Open the realtime socket for `watched` and start bridging.
    ///
    /// The socket task shares the listener's cancellation token, so it
    /// stops together with the bridge.
    pub(crate) fn start(
        config: RealtimeConfig,
        reconnect: ReconnectConfig,
        watched: HashSet<EntityKind>,
        store: Arc<DataStore>,
        resync: Arc<Resync>,
        parent: &CancellationToken,
    ) -> Result<Self, CoreError> {
        let cancel = parent.child_token();
        let config = config.with_tables(watched.iter().map(|k| k.table()));
        let realtime = RealtimeHandle::connect(config, reconnect, cancel.clone())?;

        let listener = Self::from_receiver(realtime.subscribe(), watched, store, resync, cancel);
        info!(tables = listener.watched.len(), "change listener started");
        Ok(listener)
    }

    /// Bridge an existing change stream.
    pub(crate) fn from_receiver(
        events: broadcast::Receiver<Arc<RealtimeEvent>>,
        watched: HashSet<EntityKind>,
        store: Arc<DataStore>,
        resync: Arc<Resync>,
        cancel: CancellationToken,
    ) -> Self {
        let bridge = tokio::spawn(bridge_task(
            events,
            watched.clone(),
            store,
            resync,
            cancel.clone(),
        ));

        Self {
            watched,
            bridge: Some(bridge),
            _guard: cancel.drop_guard(),
        }
    }

    pub fn watched(&self) -> &HashSet<EntityKind> {
        &self.watched
    }

    /// Cancel the subscription and wait for the bridge task to finish.
    pub async fn stop(mut self) {
        let bridge = self.bridge.take();
        drop(self);
        if let Some(bridge) = bridge {
            let _ = bridge.await;
        }
    }
}

async fn bridge_task(
    mut events: broadcast::Receiver<Arc<RealtimeEvent>>,
    watched: HashSet<EntityKind>,
    store: Arc<DataStore>,
    resync: Arc<Resync>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = events.recv() => {
                match result {
                    Ok(event) => match event.as_ref() {
                        RealtimeEvent::Change(change) => {
                            let Some(kind) = EntityKind::from_table(&change.table)
                                .filter(|k| watched.contains(k))
                            else {
                                debug!(table = %change.table, "ignoring change outside watched set");
                                continue;
                            };
                            debug!(%kind, change = ?change.kind, "remote change");
                            store.note_change();
                            resync.request(kind.table());
                        }
                        RealtimeEvent::Resubscribed => {
                            info!("realtime resubscribed; reloading");
                            store.note_change();
                            resync.request("realtime reconnected");
                        }
                    },
                    Err(RecvError::Lagged(n)) => {
                        // Missed notifications may have been relevant.
                        warn!(skipped = n, "change listener lagged");
                        resync.request("listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("change listener bridge stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use serde_json::json;
    use strum::IntoEnumIterator;
    use vendra_api::{ChangeEvent, ChangeKind, RestClient, TransportConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::loader::Loader;
    use crate::remote::RemoteStore;

    fn event(table: &str) -> Arc<RealtimeEvent> {
        Arc::new(RealtimeEvent::Change(ChangeEvent {
            table: table.into(),
            schema: "public".into(),
            kind: ChangeKind::Update,
            commit_timestamp: None,
        }))
    }

    fn listener(
        rx: broadcast::Receiver<Arc<RealtimeEvent>>,
    ) -> (ChangeListener, Arc<DataStore>, Arc<Resync>) {
        let store = Arc::new(DataStore::new());
        let resync = Arc::new(Resync::new());
        let l = ChangeListener::from_receiver(
            rx,
            EntityKind::DEFAULT_WATCHED.into_iter().collect(),
            Arc::clone(&store),
            Arc::clone(&resync),
            CancellationToken::new(),
        );
        (l, store, resync)
    }

    #[tokio::test]
    async fn watched_table_is_noted() {
        let (tx, rx) = broadcast::channel(16);
        let (l, store, _resync) = listener(rx);

        tx.send(event("transactions")).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.last_change_notice().is_some());
        l.stop().await;
    }

    #[tokio::test]
    async fn unwatched_table_is_ignored() {
        let (tx, rx) = broadcast::channel(16);
        let (l, store, _resync) = listener(rx);

        tx.send(event("sops")).unwrap();
        tx.send(event("audit_log")).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.last_change_notice().is_none());
        l.stop().await;
    }

    #[tokio::test]
    async fn resubscribe_is_noted() {
        let (tx, rx) = broadcast::channel(16);
        let (l, store, _resync) = listener(rx);

        tx.send(Arc::new(RealtimeEvent::Resubscribed)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.last_change_notice().is_some());
        l.stop().await;
    }

    /// Listener, resync worker and loader wired together over a mock
    /// backend serving one client.
    struct Wired {
        server: MockServer,
        store: Arc<DataStore>,
        tx: broadcast::Sender<Arc<RealtimeEvent>>,
        listener: ChangeListener,
        cancel: CancellationToken,
        worker: JoinHandle<()>,
    }

    async fn wired() -> Wired {
        let server = MockServer::start().await;
        for kind in EntityKind::iter() {
            let rows = if kind == EntityKind::Clients {
                json!([{ "id": "c1", "name": "Budi" }])
            } else {
                json!([])
            };
            Mock::given(method("GET"))
                .and(path(format!("/rest/v1/{}", kind.table())))
                .respond_with(ResponseTemplate::new(200).set_body_json(rows))
                .mount(&server)
                .await;
        }

        let rest = RestClient::new(
            &server.uri(),
            &SecretString::from("anon".to_owned()),
            None,
            &TransportConfig::default(),
        )
        .unwrap();
        let remote = Arc::new(RemoteStore::new(rest));
        let store = Arc::new(DataStore::new());
        let resync = Arc::new(Resync::new());
        let loader = Arc::new(Loader::new(Arc::clone(&store), None));
        let cancel = CancellationToken::new();

        let requests = resync.attach();
        let worker = {
            let resync = Arc::clone(&resync);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                resync
                    .run(requests, || loader.reload(&remote), cancel)
                    .await;
            })
        };

        let (tx, rx) = broadcast::channel(16);
        let listener = ChangeListener::from_receiver(
            rx,
            EntityKind::DEFAULT_WATCHED.into_iter().collect(),
            Arc::clone(&store),
            resync,
            cancel.child_token(),
        );

        Wired {
            server,
            store,
            tx,
            listener,
            cancel,
            worker,
        }
    }

    #[tokio::test]
    async fn watched_change_reloads_the_cache() {
        let w = wired().await;
        let mut snapshots = w.store.subscribe_all();

        w.tx.send(event("clients")).unwrap();
        tokio::time::timeout(
            Duration::from_secs(2),
            snapshots.wait_for(|s| s.clients.len() == 1),
        )
        .await
        .unwrap()
        .unwrap();

        w.listener.stop().await;
        w.cancel.cancel();
        w.worker.await.unwrap();
    }

    #[tokio::test]
    async fn unwatched_change_fetches_nothing() {
        let w = wired().await;

        w.tx.send(event("sops")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        w.listener.stop().await;
        w.cancel.cancel();
        w.worker.await.unwrap();

        assert!(w.server.received_requests().await.unwrap().is_empty());
        assert!(w.store.snapshot().clients.is_empty());
    }

    #[tokio::test]
    async fn stop_ends_bridge_even_with_sender_alive() {
        let (_tx, rx) = broadcast::channel(16);
        let (l, _store, _resync) = listener(rx);
        tokio::time::timeout(Duration::from_millis(200), l.stop())
            .await
            .unwrap();
    }
}
