//! Read-only view of the anchor table for other threads

use crate::table::{AnchorEntry, AnchorTable};
use parking_lot::RwLock;
use stage_core::AnchorHandle;
use std::sync::Arc;

/// Immutable copy of the table at one point in time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnchorSnapshot {
    /// Table generation the snapshot was taken at
    pub generation: u64,
    /// Entries in placement order
    pub entries: Vec<AnchorEntry>,
}

impl AnchorSnapshot {
    pub fn of(table: &AnchorTable) -> Self {
        Self {
            generation: table.generation(),
            entries: table.entries().to_vec(),
        }
    }

    pub fn handles(&self) -> Vec<AnchorHandle> {
        self.entries.iter().map(|e| e.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared, cloneable view. The owner publishes; everyone else reads.
#[derive(Clone, Debug, Default)]
pub struct AnchorView {
    inner: Arc<RwLock<Arc<AnchorSnapshot>>>,
}

impl AnchorView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot if the table changed
    pub fn publish(&self, table: &AnchorTable) {
        if self.inner.read().generation == table.generation() {
            return;
        }
        let snapshot = Arc::new(AnchorSnapshot::of(table));
        *self.inner.write() = snapshot;
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<AnchorSnapshot> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
