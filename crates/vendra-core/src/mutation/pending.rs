// ── In-flight mutation registry ──
//
// One entry per optimistic mutation whose backend call has not resolved.
// Entries are owned by a guard that lives inside the mutation future, so
// they disappear on completion and on cancellation alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use strum::Display;

use crate::model::{EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

/// Snapshot of one in-flight mutation, for pending indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMutation {
    pub kind: EntityKind,
    pub op: MutationOp,
    /// Temporary id for creates, the record id otherwise.
    pub target: EntityId,
    pub started_at: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct PendingRegistry {
    next_seq: AtomicU64,
    entries: DashMap<u64, PendingMutation>,
}

impl PendingRegistry {
    pub(crate) fn register(
        self: &Arc<Self>,
        kind: EntityKind,
        op: MutationOp,
        target: EntityId,
    ) -> PendingGuard {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            seq,
            PendingMutation {
                kind,
                op,
                target,
                started_at: Utc::now(),
            },
        );
        PendingGuard {
            registry: Arc::clone(self),
            seq,
        }
    }

    /// In-flight mutations, oldest first.
    pub(crate) fn list(&self) -> Vec<PendingMutation> {
        let mut entries: Vec<(u64, PendingMutation)> = self
            .entries
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, m)| m).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_pending(&self, kind: EntityKind, target: &EntityId) -> bool {
        self.entries
            .iter()
            .any(|e| e.kind == kind && &e.target == target)
    }
}

/// Removes its registry entry when dropped.
pub(crate) struct PendingGuard {
    registry: Arc<PendingRegistry>,
    seq: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.entries.remove(&self.seq);
    }
}
