//! The external 3D/AR runtime, seen through the few calls Stagehand needs

use stage_core::{AnchorHandle, Color, PlacementPolicy, SceneGraphHandle, Shape};
use thiserror::Error;

/// Failure reported by the runtime. Reasons are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Asset load failed: {0}")]
    Load(String),

    #[error("Primitive synthesis failed: {0}")]
    Synthesize(String),

    #[error("Anchor attach failed: {0}")]
    Attach(String),
}

impl RuntimeError {
    /// The runtime's reason string
    pub fn reason(&self) -> &str {
        match self {
            Self::Load(r) | Self::Synthesize(r) | Self::Attach(r) => r,
        }
    }
}

/// Rendering/tracking runtime backend
///
/// Only the consumer thread calls into the runtime, so implementations do not
/// need interior synchronization. They must be `Send` so the consumer can be
/// moved onto its own thread.
pub trait SceneRuntime: Send {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Load a named asset into a scene graph. May block on I/O.
    fn load_asset(&mut self, name: &str) -> Result<SceneGraphHandle, RuntimeError>;

    /// Build a renderable primitive
    fn synthesize(&mut self, shape: &Shape, color: Color) -> Result<SceneGraphHandle, RuntimeError>;

    /// Place a graph into the live scene on a new anchor
    fn attach_to_anchor(
        &mut self,
        graph: &SceneGraphHandle,
        policy: &PlacementPolicy,
    ) -> Result<AnchorHandle, RuntimeError>;

    /// Remove anchors (and everything attached to them) from the live scene.
    /// Unknown handles are ignored.
    fn detach(&mut self, anchors: &[AnchorHandle]);
}

impl<R: SceneRuntime + ?Sized> SceneRuntime for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load_asset(&mut self, name: &str) -> Result<SceneGraphHandle, RuntimeError> {
        (**self).load_asset(name)
    }

    fn synthesize(
        &mut self,
        shape: &Shape,
        color: Color,
    ) -> Result<SceneGraphHandle, RuntimeError> {
        (**self).synthesize(shape, color)
    }

    fn attach_to_anchor(
        &mut self,
        graph: &SceneGraphHandle,
        policy: &PlacementPolicy,
    ) -> Result<AnchorHandle, RuntimeError> {
        (**self).attach_to_anchor(graph, policy)
    }

    fn detach(&mut self, anchors: &[AnchorHandle]) {
        (**self).detach(anchors)
    }
}
