// ── Coalesced full reloads ──
//
// Requests bump a counter; a single worker reloads whenever the counter
// moves. Any number of requests that arrive during a reload collapse into
// exactly one follow-up reload. Requests are only accepted while a worker
// is attached; callers reload inline otherwise.

use std::future::Future;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::loader::LoadOutcome;

/// Request counter plus whether a worker is around to serve it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Requests {
    count: u64,
    worker: bool,
}

/// Shared request/completion counters for the resync worker.
pub(crate) struct Resync {
    requested: watch::Sender<Requests>,
    completed: watch::Sender<u64>,
}

impl Resync {
    pub(crate) fn new() -> Self {
        let (requested, _) = watch::channel(Requests::default());
        let (completed, _) = watch::channel(0);
        Self {
            requested,
            completed,
        }
    }

    /// Ask for a full reload.
    ///
    /// Returns `false` when no worker is attached; the request is dropped
    /// and the caller must reload on its own.
    pub(crate) fn request(&self, reason: &str) -> bool {
        let accepted = self.requested.send_if_modified(|r| {
            if r.worker {
                r.count += 1;
            }
            r.worker
        });
        if accepted {
            debug!(reason, "resync requested");
        } else {
            debug!(reason, "no resync worker attached");
        }
        accepted
    }

    #[cfg(test)]
    fn has_worker(&self) -> bool {
        self.requested.borrow().worker
    }

    /// Wait until every reload requested so far has run. Returns at once
    /// when nothing is outstanding, including when no worker is attached.
    pub(crate) async fn settled(&self) {
        let target = self.requested.borrow().count;
        let mut completed = self.completed.subscribe();
        let _ = completed.wait_for(|done| *done >= target).await;
    }

    /// Attach a worker. Anything requested before this call is stale;
    /// anything after is seen by [`run`](Self::run).
    pub(crate) fn attach(&self) -> watch::Receiver<Requests> {
        self.requested.send_modify(|r| r.worker = true);
        let requests = self.requested.subscribe();
        self.completed.send_replace(requests.borrow().count);
        requests
    }

    /// Worker loop: one reload per observed batch of requests.
    ///
    /// On cancellation the worker detaches first, then serves whatever was
    /// accepted but not yet reloaded, so no accepted request is lost.
    pub(crate) async fn run<F, Fut>(
        &self,
        mut requests: watch::Receiver<Requests>,
        reload: F,
        cancel: CancellationToken,
    ) where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<LoadOutcome, CoreError>>,
    {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = requests.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let target = requests.borrow_and_update().count;
            if target > *self.completed.borrow() {
                run_reload(&reload, "resync reload failed").await;
            }
            self.completed.send_replace(target);
        }

        self.requested.send_modify(|r| r.worker = false);
        let target = self.requested.borrow().count;
        if target > *self.completed.borrow() {
            run_reload(&reload, "final resync reload failed").await;
        }
        self.completed.send_replace(target);
        debug!("resync worker detached");
    }
}

async fn run_reload<F, Fut>(reload: &F, failure: &str)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<LoadOutcome, CoreError>>,
{
    if let Err(e) = reload().await {
        warn!(error = %e, "{failure}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn spawn_worker(
        resync: &Arc<Resync>,
        runs: &Arc<AtomicUsize>,
        cancel: &CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let requests = resync.attach();
        let resync = Arc::clone(resync);
        let runs = Arc::clone(runs);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            resync
                .run(
                    requests,
                    || {
                        let runs = Arc::clone(&runs);
                        async move {
                            runs.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(LoadOutcome::Applied)
                        }
                    },
                    cancel,
                )
                .await;
        })
    }

    #[tokio::test]
    async fn burst_during_reload_runs_one_follow_up() {
        let resync = Arc::new(Resync::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let worker = spawn_worker(&resync, &runs, &cancel);

        assert!(resync.request("first"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        for _ in 0..5 {
            resync.request("burst");
        }
        resync.settled().await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);

        cancel.cancel();
        let _ = worker.await;
    }

    #[tokio::test]
    async fn settled_returns_immediately_when_idle() {
        let resync = Resync::new();
        tokio::time::timeout(Duration::from_millis(50), resync.settled())
            .await
            .unwrap_or_else(|_| panic!("settled blocked with nothing requested"));
    }

    #[tokio::test]
    async fn requests_without_worker_are_refused() {
        let resync = Resync::new();
        assert!(!resync.has_worker());
        assert!(!resync.request("orphan"));
        tokio::time::timeout(Duration::from_millis(50), resync.settled())
            .await
            .unwrap_or_else(|_| panic!("settled waited on a refused request"));
    }

    #[tokio::test]
    async fn cancelled_worker_serves_accepted_request_then_detaches() {
        let resync = Arc::new(Resync::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let worker = spawn_worker(&resync, &runs, &cancel);

        // Accepted, then cancelled before the worker is polled.
        assert!(resync.request("just before shutdown"));
        cancel.cancel();
        worker.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!resync.has_worker());
        assert!(!resync.request("after shutdown"));
        tokio::time::timeout(Duration::from_millis(50), resync.settled())
            .await
            .unwrap_or_else(|_| panic!("settled blocked after the worker detached"));
    }
}
