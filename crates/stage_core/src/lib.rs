//! # stage_core - Stagehand Core
//!
//! Value types shared by every Stagehand crate:
//! - Unique identifiers and a thread-safe generator
//! - Opaque handles for scene graphs and anchors
//! - Primitive shapes and colors for placed objects
//! - Anchor placement policies
//!
//! Nothing in here talks to a renderer. The types are plain data that can be
//! sent across threads and serialized into command scripts.

pub mod id;
pub mod handle;
pub mod color;
pub mod shape;
pub mod placement;

pub use id::*;
pub use handle::*;
pub use color::*;
pub use shape::*;
pub use placement::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{Id, IdGenerator};
    pub use crate::handle::{AnchorHandle, SceneGraphHandle, SceneId};
    pub use crate::color::{Color, ColorParseError};
    pub use crate::shape::{Shape, ShapeError};
    pub use crate::placement::{PlaneAlignment, PlacementPolicy};
}
