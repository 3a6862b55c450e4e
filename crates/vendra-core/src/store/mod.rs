// ── Reactive entity cache ──
//
// The whole cache is one immutable `CacheSnapshot` published through a
// `watch` channel. Writers rebuild only the collection they touch; every
// reader sees all twenty kinds from the same instant.

mod collection;
mod snapshot;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::loader::LoadState;
use crate::model::{Entity, EntityId, Profile};
use crate::stream::EntityStream;

pub use collection::EntityCollection;
pub use snapshot::CacheSnapshot;

/// Single source of truth for consumers.
///
/// Only the mutation engine and the bulk loader write; everything else
/// reads snapshots or subscribes.
pub struct DataStore {
    cache: watch::Sender<Arc<CacheSnapshot>>,
    load_state: watch::Sender<LoadState>,
    last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
    last_change_notice: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (cache, _) = watch::channel(Arc::new(CacheSnapshot::default()));
        let (load_state, _) = watch::channel(LoadState::Idle);
        let (last_full_refresh, _) = watch::channel(None);
        let (last_change_notice, _) = watch::channel(None);

        Self {
            cache,
            load_state,
            last_full_refresh,
            last_change_notice,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The whole cache as of now.
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.cache.borrow())
    }

    /// The current collection of `T`.
    pub fn collection<T: Entity>(&self) -> EntityCollection<T> {
        T::collection(&self.cache.borrow()).clone()
    }

    pub fn get<T: Entity>(&self, id: &EntityId) -> Option<Arc<T>> {
        T::collection(&self.cache.borrow()).get(id)
    }

    pub fn contains<T: Entity>(&self, id: &EntityId) -> bool {
        T::collection(&self.cache.borrow()).contains(id)
    }

    pub fn count<T: Entity>(&self) -> usize {
        T::collection(&self.cache.borrow()).len()
    }

    /// Business profile of the signed-in user, if one was loaded.
    pub fn profile(&self) -> Option<Arc<Profile>> {
        self.cache.borrow().profile.clone()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Follow one kind; wakes only when that kind's collection changes.
    pub fn subscribe<T: Entity>(&self) -> EntityStream<T> {
        EntityStream::new(self.cache.subscribe())
    }

    /// Follow every change to any kind.
    pub fn subscribe_all(&self) -> watch::Receiver<Arc<CacheSnapshot>> {
        self.cache.subscribe()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state.borrow().clone()
    }

    pub fn subscribe_load_state(&self) -> watch::Receiver<LoadState> {
        self.load_state.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    /// When the change listener last reported a remote change.
    pub fn last_change_notice(&self) -> Option<DateTime<Utc>> {
        *self.last_change_notice.borrow()
    }

    /// How long ago the last full refresh happened, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_refresh().map(|t| Utc::now() - t)
    }

    // ── Writes (crate-internal) ──────────────────────────────────────

    /// Run `f` against the collection of `T` and publish the result.
    ///
    /// `f` returns `None` when it changed nothing; subscribers are only
    /// woken for `Some`. Writers are serialized by the channel's lock, so
    /// `f` must not read the store.
    pub(crate) fn modify<T, R, F>(&self, f: F) -> Option<R>
    where
        T: Entity,
        F: FnOnce(&mut EntityCollection<T>) -> Option<R>,
    {
        let mut outcome = None;
        self.cache.send_if_modified(|cache| {
            let snapshot = Arc::make_mut(cache);
            outcome = f(T::collection_mut(snapshot));
            outcome.is_some()
        });
        outcome
    }

    /// Run `f` against the cached profile and publish the result; `None`
    /// from `f` means nothing changed.
    pub(crate) fn modify_profile<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Option<Arc<Profile>>) -> Option<R>,
    {
        let mut outcome = None;
        self.cache.send_if_modified(|cache| {
            outcome = f(&mut Arc::make_mut(cache).profile);
            outcome.is_some()
        });
        outcome
    }

    /// Atomically replace every collection and the profile.
    pub(crate) fn apply_snapshot(&self, next: CacheSnapshot) {
        self.cache.send_modify(|cache| {
            Arc::make_mut(cache).adopt(next);
        });
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    pub(crate) fn set_load_state(&self, state: LoadState) {
        self.load_state.send_replace(state);
    }

    pub(crate) fn note_change(&self) {
        self.last_change_notice.send_replace(Some(Utc::now()));
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
