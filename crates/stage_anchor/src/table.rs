//! Anchor table

use core::fmt;
use stage_core::{AnchorHandle, Color, PlacementPolicy, SceneGraphHandle, SceneId, Shape};
use std::collections::HashSet;
use thiserror::Error;

/// Anchor table errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("Anchor already in table: {0}")]
    Duplicate(AnchorHandle),
}

/// What hangs off an anchor
#[derive(Clone, Debug, PartialEq)]
pub enum AnchorContent {
    /// Synthesized primitive
    Primitive { shape: Shape, color: Color },
    /// Loaded scene
    Scene {
        scene_id: SceneId,
        graph: SceneGraphHandle,
    },
}

impl fmt::Display for AnchorContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { shape, color } => write!(f, "{} {}", color, shape),
            Self::Scene { scene_id, .. } => write!(f, "scene '{}'", scene_id),
        }
    }
}

/// One placed anchor
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorEntry {
    /// Runtime-issued handle
    pub handle: AnchorHandle,
    /// Attached content
    pub content: AnchorContent,
    /// Placement it was created with
    pub policy: PlacementPolicy,
    /// Sequence number of the command that placed it
    pub sequence: u64,
}

/// Ordered anchor table. Insertion order is placement order.
#[derive(Clone, Debug, Default)]
pub struct AnchorTable {
    entries: Vec<AnchorEntry>,
    handles: HashSet<AnchorHandle>,
    generation: u64,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Fails without change if the handle is already present.
    pub fn insert(&mut self, entry: AnchorEntry) -> Result<(), AnchorError> {
        if !self.handles.insert(entry.handle) {
            return Err(AnchorError::Duplicate(entry.handle));
        }
        self.entries.push(entry);
        self.generation += 1;
        Ok(())
    }

    /// Remove and return every entry, in placement order
    pub fn clear(&mut self) -> Vec<AnchorEntry> {
        self.handles.clear();
        if !self.entries.is_empty() {
            self.generation += 1;
        }
        std::mem::take(&mut self.entries)
    }

    pub fn get(&self, handle: &AnchorHandle) -> Option<&AnchorEntry> {
        if !self.handles.contains(handle) {
            return None;
        }
        self.entries.iter().find(|e| e.handle == *handle)
    }

    pub fn contains(&self, handle: &AnchorHandle) -> bool {
        self.handles.contains(handle)
    }

    /// Entries in placement order
    pub fn entries(&self) -> &[AnchorEntry] {
        &self.entries
    }

    /// Handles in placement order
    pub fn handles(&self) -> impl Iterator<Item = AnchorHandle> + '_ {
        self.entries.iter().map(|e| e.handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every change
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
