//! Command applicator - applies stream commands to the scene
//!
//! The applicator is the bridge between the command stream and the runtime.
//! It resolves scenes, asks the runtime to attach them, and records the
//! resulting anchors. Each command either fully succeeds or changes nothing.

use core::fmt;
use stage_anchor::{AnchorContent, AnchorEntry, AnchorError, AnchorTable};
use stage_command::{Command, CommandEnvelope, ProducerId};
use stage_core::{AnchorHandle, Color, PlacementPolicy, SceneId, Shape};
use stage_scene::{ResolveError, RuntimeError, SceneRegistry, SceneRuntime};
use std::time::{Duration, Instant};

/// Default placement for new anchors
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementConfig {
    /// Where synthesized primitives go
    pub primitive: PlacementPolicy,
    /// Where scenes go unless the scene overrides it
    pub scene: PlacementPolicy,
}

/// Why a command was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Scene id not registered
    NotFound,
    /// Runtime failed to load the scene's asset
    LoadFailed { reason: String },
    /// Primitive could not be built
    InvalidShape { reason: String },
    /// Runtime refused to create the anchor
    AttachFailed { reason: String },
    /// Runtime returned a handle the table already holds
    DuplicateAnchor(AnchorHandle),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::LoadFailed { reason } => write!(f, "load failed: {}", reason),
            Self::InvalidShape { reason } => write!(f, "invalid shape: {}", reason),
            Self::AttachFailed { reason } => write!(f, "attach failed: {}", reason),
            Self::DuplicateAnchor(handle) => write!(f, "duplicate {}", handle),
        }
    }
}

impl From<ResolveError> for RejectReason {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound(_) => Self::NotFound,
            ResolveError::LoadFailed { reason, .. } => Self::LoadFailed { reason },
        }
    }
}

impl From<RuntimeError> for RejectReason {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Load(reason) => Self::LoadFailed { reason },
            RuntimeError::Synthesize(reason) => Self::InvalidShape { reason },
            RuntimeError::Attach(reason) => Self::AttachFailed { reason },
        }
    }
}

impl From<AnchorError> for RejectReason {
    fn from(e: AnchorError) -> Self {
        match e {
            AnchorError::Duplicate(handle) => Self::DuplicateAnchor(handle),
        }
    }
}

/// Result of one command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A new anchor was placed
    Placed { handle: AnchorHandle },
    /// Every anchor was removed
    Cleared { count: usize },
    /// Nothing changed. `scene_id` is set for `LoadScene`.
    Rejected {
        scene_id: Option<SceneId>,
        reason: RejectReason,
    },
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placed { handle } => write!(f, "placed {}", handle),
            Self::Cleared { count } => write!(f, "cleared {} anchor(s)", count),
            Self::Rejected { scene_id: Some(id), reason } => {
                write!(f, "rejected scene '{}': {}", id, reason)
            }
            Self::Rejected { scene_id: None, reason } => write!(f, "rejected: {}", reason),
        }
    }
}

/// Report for one applied command
#[derive(Clone, Debug, PartialEq)]
pub struct CommandReport {
    /// Delivery sequence number
    pub sequence: u64,
    /// Who published the command
    pub producer: ProducerId,
    /// The command
    pub command: Command,
    /// What happened
    pub outcome: Outcome,
    /// Time spent applying
    pub elapsed: Duration,
}

/// Applicator counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Commands applied, successful or not
    pub applied: u64,
    /// Anchors placed
    pub placed: u64,
    /// `ClearAll` commands applied
    pub clears: u64,
    /// Anchors removed by `ClearAll`
    pub anchors_cleared: u64,
    /// Commands rejected
    pub rejected: u64,
}

/// Applies commands to the scene. Owned by the consumer thread.
pub struct CommandApplier<R: SceneRuntime> {
    runtime: R,
    registry: SceneRegistry,
    anchors: AnchorTable,
    placement: PlacementConfig,
    stats: ApplyStats,
}

impl<R: SceneRuntime> CommandApplier<R> {
    /// Create a new applicator
    pub fn new(runtime: R, registry: SceneRegistry) -> Self {
        Self {
            runtime,
            registry,
            anchors: AnchorTable::new(),
            placement: PlacementConfig::default(),
            stats: ApplyStats::default(),
        }
    }

    /// Override default placement
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Apply one delivered command
    pub fn apply(&mut self, envelope: CommandEnvelope) -> CommandReport {
        let started = Instant::now();
        let sequence = envelope.sequence;

        let outcome = match &envelope.command {
            Command::PlaceObject { shape, color } => self.place_object(shape, *color, sequence),
            Command::LoadScene { scene_id } => self.load_scene(scene_id, sequence),
            Command::ClearAll => self.clear_all(),
        };

        self.stats.applied += 1;
        match &outcome {
            Outcome::Placed { .. } => self.stats.placed += 1,
            Outcome::Cleared { count } => {
                self.stats.clears += 1;
                self.stats.anchors_cleared += *count as u64;
            }
            Outcome::Rejected { .. } => self.stats.rejected += 1,
        }

        CommandReport {
            sequence,
            producer: envelope.producer,
            command: envelope.command,
            outcome,
            elapsed: started.elapsed(),
        }
    }

    fn place_object(&mut self, shape: &Shape, color: Color, sequence: u64) -> Outcome {
        let placed = shape
            .validate()
            .map_err(|e| RejectReason::InvalidShape { reason: e.to_string() })
            .and_then(|()| self.runtime.synthesize(shape, color).map_err(RejectReason::from))
            .and_then(|graph| {
                let policy = self.placement.primitive.clone();
                let content = AnchorContent::Primitive { shape: *shape, color };
                self.attach(&graph, policy, content, sequence)
            });

        match placed {
            Ok(handle) => Outcome::Placed { handle },
            Err(reason) => Outcome::Rejected { scene_id: None, reason },
        }
    }

    fn load_scene(&mut self, scene_id: &SceneId, sequence: u64) -> Outcome {
        let placed = self
            .registry
            .resolve(&mut self.runtime, scene_id)
            .map_err(RejectReason::from)
            .and_then(|graph| {
                let policy = self
                    .registry
                    .placement(scene_id)
                    .unwrap_or(&self.placement.scene)
                    .clone();
                let content = AnchorContent::Scene {
                    scene_id: scene_id.clone(),
                    graph: graph.clone(),
                };
                self.attach(&graph, policy, content, sequence)
            });

        match placed {
            Ok(handle) => Outcome::Placed { handle },
            Err(reason) => Outcome::Rejected {
                scene_id: Some(scene_id.clone()),
                reason,
            },
        }
    }

    fn clear_all(&mut self) -> Outcome {
        let removed = self.anchors.clear();
        if !removed.is_empty() {
            let handles: Vec<AnchorHandle> = removed.iter().map(|e| e.handle).collect();
            self.runtime.detach(&handles);
        }
        Outcome::Cleared {
            count: removed.len(),
        }
    }

    fn attach(
        &mut self,
        graph: &stage_core::SceneGraphHandle,
        policy: PlacementPolicy,
        content: AnchorContent,
        sequence: u64,
    ) -> Result<AnchorHandle, RejectReason> {
        let handle = self.runtime.attach_to_anchor(graph, &policy)?;

        let entry = AnchorEntry {
            handle,
            content,
            policy,
            sequence,
        };
        if let Err(e) = self.anchors.insert(entry) {
            // Undo this command's attach. The table keeps its existing entry.
            log::error!(
                "Runtime '{}' reissued {}, detaching it",
                self.runtime.name(),
                handle
            );
            self.runtime.detach(&[handle]);
            return Err(e.into());
        }
        Ok(handle)
    }

    /// The anchor table
    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// The scene registry
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// The runtime
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The runtime, mutably
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn placement(&self) -> &PlacementConfig {
        &self.placement
    }

    pub fn stats(&self) -> ApplyStats {
        self.stats
    }
}
