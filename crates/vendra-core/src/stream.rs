// ── Reactive entity streams ──
//
// Per-kind subscriptions over the cache snapshot channel.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;

use crate::model::Entity;
use crate::store::{CacheSnapshot, EntityCollection};

/// A subscription to one kind's collection.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`. Changes to
/// other kinds do not wake it.
pub struct EntityStream<T: Entity> {
    current: EntityCollection<T>,
    receiver: watch::Receiver<Arc<CacheSnapshot>>,
}

impl<T: Entity> EntityStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<CacheSnapshot>>) -> Self {
        let current = T::collection(&receiver.borrow_and_update()).clone();
        Self { current, receiver }
    }

    /// The collection as of creation or the last `changed()`.
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        self.current.items()
    }

    /// The latest collection (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        Arc::clone(T::collection(&self.receiver.borrow()).items())
    }

    /// Wait until this kind's collection changes, returning the new list.
    /// Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        loop {
            self.receiver.changed().await.ok()?;
            let next = T::collection(&self.receiver.borrow_and_update()).clone();
            if next.version() != self.current.version() {
                self.current = next;
                return Some(Arc::clone(self.current.items()));
            }
        }
    }

    /// Convert into a `Stream` that yields the current list first, then
    /// every subsequent change.
    pub fn into_stream(mut self) -> impl Stream<Item = Arc<Vec<Arc<T>>>> + Send {
        async_stream::stream! {
            yield Arc::clone(self.current.items());
            while let Some(items) = self.changed().await {
                yield items;
            }
        }
    }
}
