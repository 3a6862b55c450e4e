// ── Ordered entity collection ──
//
// Immutable-by-default list of records for a single kind. Cloning is an
// `Arc` bump; mutation goes through `Arc::make_mut`, so a reader holding
// an older snapshot never observes a write.

use std::fmt;
use std::sync::Arc;

use crate::model::{Entity, EntityId};

/// The records of one kind, in backend order, with no duplicate ids.
///
/// `version` increases on every mutation and is never reset, so two
/// observations with equal versions saw the same contents.
pub struct EntityCollection<T> {
    items: Arc<Vec<Arc<T>>>,
    version: u64,
}

impl<T> Clone for EntityCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            version: self.version,
        }
    }
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            version: 0,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for EntityCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("version", &self.version)
            .field("items", &self.items)
            .finish()
    }
}

impl<T: Entity> EntityCollection<T> {
    /// Build from backend rows. The first occurrence of a repeated id wins.
    pub(crate) fn from_records(records: Vec<T>) -> Self {
        let mut collection = Self::default();
        collection.reset(records);
        collection
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Cheap handle to the current record list.
    pub fn items(&self) -> &Arc<Vec<Arc<T>>> {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.items.iter().find(|r| r.id() == id).cloned()
    }

    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.position(id).is_some()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace every record.
    pub(crate) fn reset(&mut self, records: Vec<T>) {
        let mut items: Vec<Arc<T>> = Vec::with_capacity(records.len());
        for record in records {
            if items.iter().any(|r| r.id() == record.id()) {
                continue;
            }
            items.push(Arc::new(record));
        }
        self.items = Arc::new(items);
        self.bump();
    }

    /// Insert at the head. Returns `false` (and does nothing) if the id is
    /// already present.
    pub(crate) fn prepend(&mut self, record: Arc<T>) -> bool {
        if self.contains(record.id()) {
            return false;
        }
        Arc::make_mut(&mut self.items).insert(0, record);
        self.bump();
        true
    }

    /// Insert at `index` (clamped to the end). Returns `false` if the id is
    /// already present.
    pub(crate) fn insert_at(&mut self, index: usize, record: Arc<T>) -> bool {
        if self.contains(record.id()) {
            return false;
        }
        let items = Arc::make_mut(&mut self.items);
        let index = index.min(items.len());
        items.insert(index, record);
        self.bump();
        true
    }

    /// Swap the record with id `target` for `record`, in place.
    ///
    /// If `record` carries a different id that is already present
    /// elsewhere, the record at `target` is dropped instead so ids stay
    /// unique. Returns `false` when `target` is absent.
    pub(crate) fn replace(&mut self, target: &EntityId, record: Arc<T>) -> bool {
        let Some(index) = self.position(target) else {
            return false;
        };
        let clash = record.id() != target && self.contains(record.id());
        let items = Arc::make_mut(&mut self.items);
        if clash {
            items.remove(index);
        } else {
            items[index] = record;
        }
        self.bump();
        true
    }

    /// Apply `f` to a copy of the record with `id` and store the result.
    pub(crate) fn modify<F>(&mut self, id: &EntityId, f: F) -> Option<Arc<T>>
    where
        F: FnOnce(&mut T),
    {
        let index = self.position(id)?;
        let items = Arc::make_mut(&mut self.items);
        let mut record = T::clone(&items[index]);
        f(&mut record);
        let record = Arc::new(record);
        items[index] = Arc::clone(&record);
        self.bump();
        Some(record)
    }

    /// Remove the record with `id`, returning where it was.
    pub(crate) fn remove(&mut self, id: &EntityId) -> Option<(usize, Arc<T>)> {
        let index = self.position(id)?;
        let record = Arc::make_mut(&mut self.items).remove(index);
        self.bump();
        Some((index, record))
    }

    /// Take over the records of a freshly loaded collection, continuing
    /// this collection's version sequence.
    pub(crate) fn adopt(&mut self, loaded: Self) {
        self.items = loaded.items;
        self.bump();
    }

    /// Put back a previously captured list verbatim.
    pub(crate) fn restore(&mut self, items: Arc<Vec<Arc<T>>>) {
        self.items = items;
        self.bump();
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
