//! Primitive shapes the runtime can synthesize

use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Edge length of the default block, in metres
pub const DEFAULT_BLOCK_SIZE: f32 = 0.1;

/// Shape validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{shape} dimension '{field}' must be finite and positive, got {value}")]
    InvalidDimension {
        shape: &'static str,
        field: &'static str,
        value: f32,
    },
}

/// A renderable primitive. All dimensions are metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Axis-aligned cube
    Box { size: f32 },
    /// Sphere
    Sphere { radius: f32 },
    /// Flat rectangle lying in the anchor's XZ plane
    Plane { width: f32, depth: f32 },
}

impl Default for Shape {
    fn default() -> Self {
        Self::Box {
            size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Shape {
    /// Short name of the shape kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Plane { .. } => "plane",
        }
    }

    /// Check every dimension is finite and positive
    pub fn validate(&self) -> Result<(), ShapeError> {
        let check = |field: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ShapeError::InvalidDimension {
                    shape: self.kind(),
                    field,
                    value,
                })
            }
        };

        match *self {
            Self::Box { size } => check("size", size),
            Self::Sphere { radius } => check("radius", radius),
            Self::Plane { width, depth } => {
                check("width", width)?;
                check("depth", depth)
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Box { size } => write!(f, "box({}m)", size),
            Self::Sphere { radius } => write!(f, "sphere(r={}m)", radius),
            Self::Plane { width, depth } => write!(f, "plane({}m x {}m)", width, depth),
        }
    }
}
