//! Scene loaders
//!
//! A loader turns a registry entry into a scene graph using the runtime.
//! Most scenes are a single named asset; custom loaders can compose several
//! runtime calls.

use crate::runtime::{RuntimeError, SceneRuntime};
use core::fmt;
use stage_core::SceneGraphHandle;

/// Trait for scene loaders
pub trait SceneLoader: Send + Sync {
    /// Human-readable description of what gets loaded
    fn describe(&self) -> String;

    /// Produce a scene graph
    fn load(&self, runtime: &mut dyn SceneRuntime) -> Result<SceneGraphHandle, RuntimeError>;
}

/// Loads one named asset through [`SceneRuntime::load_asset`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetLoader {
    asset: String,
}

impl AssetLoader {
    pub fn new(asset: impl Into<String>) -> Self {
        Self { asset: asset.into() }
    }

    /// Asset name handed to the runtime
    pub fn asset(&self) -> &str {
        &self.asset
    }
}

impl SceneLoader for AssetLoader {
    fn describe(&self) -> String {
        format!("asset '{}'", self.asset)
    }

    fn load(&self, runtime: &mut dyn SceneRuntime) -> Result<SceneGraphHandle, RuntimeError> {
        runtime.load_asset(&self.asset)
    }
}

/// Wraps a closure as a loader
pub struct FnLoader<F> {
    label: String,
    func: F,
}

impl<F> FnLoader<F>
where
    F: Fn(&mut dyn SceneRuntime) -> Result<SceneGraphHandle, RuntimeError> + Send + Sync,
{
    pub fn new(label: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            func,
        }
    }
}

impl<F> SceneLoader for FnLoader<F>
where
    F: Fn(&mut dyn SceneRuntime) -> Result<SceneGraphHandle, RuntimeError> + Send + Sync,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load(&self, runtime: &mut dyn SceneRuntime) -> Result<SceneGraphHandle, RuntimeError> {
        (self.func)(runtime)
    }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLoader").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessRuntime;

    #[test]
    fn test_asset_loader_uses_runtime() {
        let mut runtime = HeadlessRuntime::new().with_asset("Experience/Hab");
        let loader = AssetLoader::new("Experience/Hab");

        let graph = loader.load(&mut runtime).unwrap();
        assert_eq!(graph.source(), "Experience/Hab");
        assert_eq!(runtime.calls().load_count("Experience/Hab"), 1);
        assert_eq!(loader.describe(), "asset 'Experience/Hab'");
    }

    #[test]
    fn test_fn_loader() {
        let mut runtime = HeadlessRuntime::new().with_asset("a");
        let loader = FnLoader::new("first of a/b", |rt: &mut dyn SceneRuntime| {
            rt.load_asset("b").or_else(|_| rt.load_asset("a"))
        });

        let graph = loader.load(&mut runtime).unwrap();
        assert_eq!(graph.source(), "a");
        assert_eq!(loader.describe(), "first of a/b");
    }
}
