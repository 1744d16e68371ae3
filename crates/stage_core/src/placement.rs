//! Anchor placement policies
//!
//! A policy tells the runtime where a new anchor should live. Resolving the
//! policy to a real pose (plane detection, face or image tracking) is the
//! runtime's job.

use core::fmt;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Orientation of a detected plane
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneAlignment {
    Horizontal,
    Vertical,
}

impl Default for PlaneAlignment {
    fn default() -> Self {
        Self::Horizontal
    }
}

/// Where to create an anchor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Fixed position in the device-centred world space
    World { position: Vec3 },
    /// First detected plane with the given alignment
    Plane {
        #[serde(default)]
        alignment: PlaneAlignment,
    },
    /// Tracked face
    Face,
    /// Tracked reference image
    Image { group: String, name: String },
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self::Plane {
            alignment: PlaneAlignment::Horizontal,
        }
    }
}

impl PlacementPolicy {
    /// World anchor at the origin
    pub fn origin() -> Self {
        Self::World { position: Vec3::ZERO }
    }
}

impl fmt::Display for PlacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::World { position } => {
                write!(f, "world({}, {}, {})", position.x, position.y, position.z)
            }
            Self::Plane { alignment: PlaneAlignment::Horizontal } => write!(f, "horizontal plane"),
            Self::Plane { alignment: PlaneAlignment::Vertical } => write!(f, "vertical plane"),
            Self::Face => write!(f, "face"),
            Self::Image { group, name } => write!(f, "image {}/{}", group, name),
        }
    }
}
