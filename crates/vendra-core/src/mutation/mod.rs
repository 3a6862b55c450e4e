// ── Optimistic mutation engine ──
//
// Create / update / delete for any kind, plus the signed-in user's
// profile. The local cache write happens synchronously inside the call,
// before the returned future is polled; the future then performs the
// backend call and reconciles or reverts.

mod pending;

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::loader::Loader;
use crate::model::{Entity, EntityId, Profile, ProfilePatch};
use crate::remote::RemoteStore;
use crate::resync::Resync;
use crate::store::DataStore;

pub use pending::{MutationOp, PendingMutation};
pub(crate) use pending::PendingRegistry;

use pending::PendingGuard;

/// Applies optimistic writes and reconciles them against the backend.
///
/// Cheap to clone; every clone shares the same store and registry.
#[derive(Clone)]
pub(crate) struct MutationEngine {
    store: Arc<DataStore>,
    remote: Arc<ArcSwapOption<RemoteStore>>,
    resync: Arc<Resync>,
    loader: Arc<Loader>,
    pending: Arc<PendingRegistry>,
}

/// What a failed delete needs to put the collection back.
struct Removal<T> {
    before: Arc<Vec<Arc<T>>>,
    index: usize,
    record: Arc<T>,
    version_after: u64,
}

impl MutationEngine {
    pub(crate) fn new(
        store: Arc<DataStore>,
        remote: Arc<ArcSwapOption<RemoteStore>>,
        resync: Arc<Resync>,
        loader: Arc<Loader>,
    ) -> Self {
        Self {
            store,
            remote,
            resync,
            loader,
            pending: Arc::new(PendingRegistry::default()),
        }
    }

    pub(crate) fn pending(&self) -> &PendingRegistry {
        &self.pending
    }

    fn remote(&self) -> Result<Arc<RemoteStore>, CoreError> {
        self.remote.load_full().ok_or(CoreError::Disconnected)
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Insert a temporary record now; resolve to the backend record.
    pub(crate) fn create<T: Entity>(
        &self,
        draft: T::Draft,
    ) -> impl Future<Output = Result<Arc<T>, CoreError>> + Send + 'static + use<T> {
        let started = self.begin_create::<T>(&draft);
        let store = Arc::clone(&self.store);

        async move {
            let (remote, temp_id, _guard) = started?;

            match remote.create::<T>(&draft).await {
                Ok(record) => {
                    let record = Arc::new(record);
                    let confirmed = Arc::clone(&record);
                    store.modify::<T, _, _>(|c| {
                        let changed = if c.contains(&temp_id) {
                            c.replace(&temp_id, record)
                        } else {
                            c.prepend(record)
                        };
                        changed.then_some(())
                    });
                    debug!(kind = %T::KIND, %temp_id, id = %confirmed.id(), "create confirmed");
                    Ok(confirmed)
                }
                Err(e) => {
                    store.modify::<T, _, _>(|c| c.remove(&temp_id).map(|_| ()));
                    warn!(kind = %T::KIND, %temp_id, error = %e, "create failed; temporary record removed");
                    Err(e)
                }
            }
        }
    }

    fn begin_create<T: Entity>(
        &self,
        draft: &T::Draft,
    ) -> Result<(Arc<RemoteStore>, EntityId, PendingGuard), CoreError> {
        let remote = self.remote()?;
        let temp_id = EntityId::temporary();
        let record = Arc::new(T::from_draft(temp_id.clone(), draft));

        self.store.modify::<T, _, _>(|c| c.prepend(record).then_some(()));
        debug!(kind = %T::KIND, %temp_id, "optimistic create");

        let guard = self
            .pending
            .register(T::KIND, MutationOp::Create, temp_id.clone());
        Ok((remote, temp_id, guard))
    }

    // ── Update ───────────────────────────────────────────────────────

    /// Merge `patch` into the cached record now; resolve to the backend
    /// record. A failure schedules a full reload instead of rolling back.
    pub(crate) fn update<T: Entity>(
        &self,
        id: EntityId,
        patch: T::Patch,
    ) -> impl Future<Output = Result<Arc<T>, CoreError>> + Send + 'static + use<T> {
        let started = self.begin_update::<T>(&id, &patch);
        let store = Arc::clone(&self.store);
        let resync = Arc::clone(&self.resync);
        let loader = Arc::clone(&self.loader);

        async move {
            let (remote, _guard) = started?;

            match remote.update::<T>(&id, &patch).await {
                Ok(record) => {
                    let record = Arc::new(record);
                    let confirmed = Arc::clone(&record);
                    store.modify::<T, _, _>(|c| c.replace(&id, record).then_some(()));
                    debug!(kind = %T::KIND, %id, "update confirmed");
                    Ok(confirmed)
                }
                Err(e) => {
                    warn!(kind = %T::KIND, %id, error = %e, "update failed; reloading");
                    reload_after_failure(&resync, &loader, &remote, "update failed").await;
                    Err(e)
                }
            }
        }
    }

    fn begin_update<T: Entity>(
        &self,
        id: &EntityId,
        patch: &T::Patch,
    ) -> Result<(Arc<RemoteStore>, PendingGuard), CoreError> {
        let remote = self.remote()?;
        reject_temporary::<T>(id)?;

        self.store
            .modify::<T, _, _>(|c| c.modify(id, |record| record.apply_patch(patch)))
            .ok_or_else(|| CoreError::not_found(T::KIND, id))?;
        debug!(kind = %T::KIND, %id, "optimistic update");

        let guard = self.pending.register(T::KIND, MutationOp::Update, id.clone());
        Ok((remote, guard))
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// Remove the record now; put it back if the backend refuses.
    pub(crate) fn delete<T: Entity>(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send + 'static + use<T> {
        let started = self.begin_delete::<T>(&id);
        let store = Arc::clone(&self.store);

        async move {
            let (remote, removal, _guard) = started?;

            match remote.delete::<T>(&id).await {
                Ok(()) => {
                    debug!(kind = %T::KIND, %id, "delete confirmed");
                    Ok(())
                }
                Err(e) => {
                    store.modify::<T, _, _>(|c| {
                        if c.version() == removal.version_after {
                            c.restore(removal.before);
                            Some(())
                        } else {
                            c.insert_at(removal.index, removal.record).then_some(())
                        }
                    });
                    warn!(kind = %T::KIND, %id, error = %e, "delete failed; record restored");
                    Err(e)
                }
            }
        }
    }

    fn begin_delete<T: Entity>(
        &self,
        id: &EntityId,
    ) -> Result<(Arc<RemoteStore>, Removal<T>, PendingGuard), CoreError> {
        let remote = self.remote()?;
        reject_temporary::<T>(id)?;

        let removal = self
            .store
            .modify::<T, _, _>(|c| {
                let before = Arc::clone(c.items());
                let (index, record) = c.remove(id)?;
                Some(Removal {
                    before,
                    index,
                    record,
                    version_after: c.version(),
                })
            })
            .ok_or_else(|| CoreError::not_found(T::KIND, id))?;
        debug!(kind = %T::KIND, %id, "optimistic delete");

        let guard = self.pending.register(T::KIND, MutationOp::Delete, id.clone());
        Ok((remote, removal, guard))
    }

    // ── Profile ──────────────────────────────────────────────────────

    /// Show `profile` as the signed-in user's profile now; resolve to the
    /// stored row. A failure puts the previous profile back.
    pub(crate) fn create_profile(
        &self,
        profile: Profile,
    ) -> impl Future<Output = Result<Arc<Profile>, CoreError>> + Send + 'static {
        let started = self.begin_create_profile(profile);
        let store = Arc::clone(&self.store);

        async move {
            let (remote, draft, previous) = started?;

            match remote.create_profile(&draft).await {
                Ok(stored) => {
                    let stored = Arc::new(stored);
                    let confirmed = Arc::clone(&stored);
                    store.modify_profile(|p| {
                        *p = Some(stored);
                        Some(())
                    });
                    debug!(user_id = %confirmed.user_id, "profile create confirmed");
                    Ok(confirmed)
                }
                Err(e) => {
                    store.modify_profile(|p| {
                        *p = previous;
                        Some(())
                    });
                    warn!(error = %e, "profile create failed; previous profile restored");
                    Err(e)
                }
            }
        }
    }

    fn begin_create_profile(
        &self,
        mut profile: Profile,
    ) -> Result<(Arc<RemoteStore>, Profile, Option<Arc<Profile>>), CoreError> {
        let remote = self.remote()?;
        profile.user_id = signed_in(&self.loader)?;

        let optimistic = Arc::new(profile.clone());
        let previous = self
            .store
            .modify_profile(|p| Some(p.replace(optimistic)))
            .flatten();
        debug!(user_id = %profile.user_id, "optimistic profile create");
        Ok((remote, profile, previous))
    }

    /// Merge `patch` into the cached profile now; resolve to the stored
    /// row. A failure schedules a full reload instead of rolling back.
    pub(crate) fn update_profile(
        &self,
        patch: ProfilePatch,
    ) -> impl Future<Output = Result<Arc<Profile>, CoreError>> + Send + 'static {
        let started = self.begin_update_profile(&patch);
        let store = Arc::clone(&self.store);
        let resync = Arc::clone(&self.resync);
        let loader = Arc::clone(&self.loader);

        async move {
            let (remote, user_id) = started?;

            match remote.update_profile(&user_id, &patch).await {
                Ok(stored) => {
                    let stored = Arc::new(stored);
                    let confirmed = Arc::clone(&stored);
                    store.modify_profile(|p| {
                        *p = Some(stored);
                        Some(())
                    });
                    debug!(%user_id, "profile update confirmed");
                    Ok(confirmed)
                }
                Err(e) => {
                    warn!(%user_id, error = %e, "profile update failed; reloading");
                    reload_after_failure(&resync, &loader, &remote, "profile update failed").await;
                    Err(e)
                }
            }
        }
    }

    fn begin_update_profile(
        &self,
        patch: &ProfilePatch,
    ) -> Result<(Arc<RemoteStore>, String), CoreError> {
        let remote = self.remote()?;
        let user_id = signed_in(&self.loader)?;

        self.store
            .modify_profile(|p| {
                let profile = p.as_mut()?;
                patch.apply_to(Arc::make_mut(profile));
                Some(())
            })
            .ok_or_else(|| CoreError::NotFound {
                kind: "profiles".into(),
                identifier: user_id.clone(),
            })?;
        debug!(%user_id, "optimistic profile update");
        Ok((remote, user_id))
    }
}

/// Hand the reload to the resync worker, or run it here when no worker
/// is attached (after `disconnect`, or once a one-shot has finished).
async fn reload_after_failure(
    resync: &Resync,
    loader: &Loader,
    remote: &RemoteStore,
    reason: &str,
) {
    if resync.request(reason) {
        return;
    }
    if let Err(e) = loader.reload(remote).await {
        warn!(error = %e, "reload after failed update also failed");
    }
}

fn signed_in(loader: &Loader) -> Result<String, CoreError> {
    loader.user_id().map(str::to_owned).ok_or_else(|| CoreError::Config {
        message: "profile writes need a signed-in user (session user_id)".into(),
    })
}

fn reject_temporary<T: Entity>(id: &EntityId) -> Result<(), CoreError> {
    if id.is_temporary() {
        return Err(CoreError::PendingCreation {
            kind: T::KIND,
            identifier: id.to_string(),
        });
    }
    Ok(())
}
