//! # stage_scene - Scene Registry & Runtime Boundary
//!
//! - [`SceneRuntime`]: the narrow interface to the external 3D/AR runtime
//! - [`SceneLoader`]: pluggable per-scene loaders (asset name or custom thunk)
//! - [`SceneRegistry`]: static `scene id -> loader` table with lazy, optional caching
//! - [`HeadlessRuntime`]: in-memory runtime for tools and tests
//!
//! ## Example
//!
//! ```
//! use stage_scene::prelude::*;
//!
//! let mut runtime = HeadlessRuntime::new().with_asset("Experience/Rover");
//!
//! let mut builder = SceneRegistry::builder();
//! builder.register(SceneDescriptor::asset("rover", "Experience/Rover")).unwrap();
//! let mut registry = builder.build();
//!
//! let graph = registry.resolve(&mut runtime, &"rover".into()).unwrap();
//! assert_eq!(graph.source(), "Experience/Rover");
//! assert!(matches!(
//!     registry.resolve(&mut runtime, &"missing".into()),
//!     Err(ResolveError::NotFound(_))
//! ));
//! ```

pub mod runtime;
pub mod loader;
pub mod registry;
pub mod headless;

pub use runtime::{RuntimeError, SceneRuntime};
pub use loader::{AssetLoader, FnLoader, SceneLoader};
pub use registry::{
    RegistryError, RegistryStats, ResolveError, SceneDescriptor, SceneRegistry,
    SceneRegistryBuilder,
};
pub use headless::{HeadlessRuntime, LiveAnchor, RuntimeCalls};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::runtime::{RuntimeError, SceneRuntime};
    pub use crate::loader::{AssetLoader, SceneLoader};
    pub use crate::registry::{ResolveError, SceneDescriptor, SceneRegistry};
    pub use crate::headless::HeadlessRuntime;
}
