//! Scene registry - static table of loadable scenes
//!
//! Built once at startup through [`SceneRegistryBuilder`], then sealed: the
//! set of scenes never changes afterwards. Graphs are loaded lazily on the
//! first [`SceneRegistry::resolve`] and cached when caching is enabled.
//!
//! A failed resolve leaves the registry untouched. Nothing is cached and no
//! counters move.

use crate::loader::{AssetLoader, FnLoader, SceneLoader};
use crate::runtime::{RuntimeError, SceneRuntime};
use core::fmt;
use stage_core::{PlacementPolicy, SceneGraphHandle, SceneId};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors from resolving a scene
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Scene not found: {0}")]
    NotFound(SceneId),

    #[error("Scene '{scene_id}' failed to load: {reason}")]
    LoadFailed { scene_id: SceneId, reason: String },
}

/// Errors from building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Scene already registered: {0}")]
    DuplicateScene(SceneId),

    #[error("Scene id must not be empty")]
    EmptySceneId,
}

/// One registered scene
pub struct SceneDescriptor {
    id: SceneId,
    loader: Box<dyn SceneLoader>,
    placement: Option<PlacementPolicy>,
}

impl SceneDescriptor {
    /// Scene backed by a custom loader
    pub fn new(id: impl Into<SceneId>, loader: impl SceneLoader + 'static) -> Self {
        Self {
            id: id.into(),
            loader: Box::new(loader),
            placement: None,
        }
    }

    /// Scene backed by a single runtime asset
    pub fn asset(id: impl Into<SceneId>, asset: impl Into<String>) -> Self {
        Self::new(id, AssetLoader::new(asset))
    }

    /// Scene backed by a closure
    pub fn with_fn<F>(id: impl Into<SceneId>, label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut dyn SceneRuntime) -> Result<SceneGraphHandle, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(id, FnLoader::new(label, func))
    }

    /// Override where this scene's anchor goes
    pub fn placed(mut self, placement: PlacementPolicy) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn id(&self) -> &SceneId {
        &self.id
    }

    /// Scene-specific placement, if any
    pub fn placement(&self) -> Option<&PlacementPolicy> {
        self.placement.as_ref()
    }

    pub fn describe(&self) -> String {
        self.loader.describe()
    }
}

impl fmt::Debug for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneDescriptor")
            .field("id", &self.id)
            .field("loader", &self.loader.describe())
            .field("placement", &self.placement)
            .finish()
    }
}

/// Registry counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Successful loads through the runtime
    pub loads: u64,
    /// Resolves served from the cache
    pub cache_hits: u64,
}

/// Builder for a [`SceneRegistry`]
#[derive(Debug)]
pub struct SceneRegistryBuilder {
    scenes: BTreeMap<SceneId, SceneDescriptor>,
    caching: bool,
}

impl SceneRegistryBuilder {
    /// Enable or disable caching of loaded graphs (enabled by default)
    pub fn caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    /// Register a scene
    pub fn register(&mut self, descriptor: SceneDescriptor) -> Result<(), RegistryError> {
        if descriptor.id.as_str().trim().is_empty() {
            return Err(RegistryError::EmptySceneId);
        }
        if self.scenes.contains_key(&descriptor.id) {
            return Err(RegistryError::DuplicateScene(descriptor.id.clone()));
        }

        log::debug!("Registered scene '{}' -> {}", descriptor.id, descriptor.describe());
        self.scenes.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    /// Seal the registry
    pub fn build(self) -> SceneRegistry {
        SceneRegistry {
            scenes: self.scenes,
            caching: self.caching,
            cache: HashMap::new(),
            stats: RegistryStats::default(),
        }
    }
}

/// Sealed table of loadable scenes
pub struct SceneRegistry {
    scenes: BTreeMap<SceneId, SceneDescriptor>,
    caching: bool,
    cache: HashMap<SceneId, SceneGraphHandle>,
    stats: RegistryStats,
}

impl SceneRegistry {
    /// Start building a registry
    pub fn builder() -> SceneRegistryBuilder {
        SceneRegistryBuilder {
            scenes: BTreeMap::new(),
            caching: true,
        }
    }

    /// Registry with no scenes
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Resolve a scene id to a loaded graph
    pub fn resolve(
        &mut self,
        runtime: &mut dyn SceneRuntime,
        scene_id: &SceneId,
    ) -> Result<SceneGraphHandle, ResolveError> {
        let descriptor = self
            .scenes
            .get(scene_id)
            .ok_or_else(|| ResolveError::NotFound(scene_id.clone()))?;

        if self.caching {
            if let Some(graph) = self.cache.get(scene_id) {
                self.stats.cache_hits += 1;
                log::debug!("Scene '{}' served from cache", scene_id);
                return Ok(graph.clone());
            }
        }

        let graph = descriptor
            .loader
            .load(runtime)
            .map_err(|e| ResolveError::LoadFailed {
                scene_id: scene_id.clone(),
                reason: e.reason().to_string(),
            })?;

        log::debug!("Loaded scene '{}' via {}", scene_id, runtime.name());
        self.stats.loads += 1;
        if self.caching {
            self.cache.insert(scene_id.clone(), graph.clone());
        }
        Ok(graph)
    }

    /// Check if a scene is registered
    pub fn contains(&self, scene_id: &SceneId) -> bool {
        self.scenes.contains_key(scene_id)
    }

    /// Registered descriptor
    pub fn descriptor(&self, scene_id: &SceneId) -> Option<&SceneDescriptor> {
        self.scenes.get(scene_id)
    }

    /// Scene-specific placement, if the scene exists and has one
    pub fn placement(&self, scene_id: &SceneId) -> Option<&PlacementPolicy> {
        self.scenes.get(scene_id).and_then(|d| d.placement())
    }

    /// All registered ids, sorted
    pub fn scene_ids(&self) -> impl Iterator<Item = &SceneId> {
        self.scenes.keys()
    }

    /// Check if a loaded graph is cached for this scene
    pub fn is_cached(&self, scene_id: &SceneId) -> bool {
        self.cache.contains_key(scene_id)
    }

    /// Whether caching is enabled
    pub fn caching(&self) -> bool {
        self.caching
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("scenes", &self.scenes.keys().collect::<Vec<_>>())
            .field("caching", &self.caching)
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessRuntime;
    use stage_core::PlaneAlignment;

    fn registry(caching: bool) -> SceneRegistry {
        let mut builder = SceneRegistry::builder().caching(caching);
        builder.register(SceneDescriptor::asset("rover", "Experience/Rover")).unwrap();
        builder.register(SceneDescriptor::asset("broken", "Experience/Broken")).unwrap();
        builder
            .register(
                SceneDescriptor::asset("tv", "Experience/TV").placed(PlacementPolicy::Plane {
                    alignment: PlaneAlignment::Vertical,
                }),
            )
            .unwrap();
        builder.build()
    }

    fn runtime() -> HeadlessRuntime {
        HeadlessRuntime::new()
            .with_asset("Experience/Rover")
            .with_asset("Experience/TV")
            .with_broken_asset("Experience/Broken", "corrupt archive")
    }

    #[test]
    fn test_resolve_missing_is_not_found_and_pure() {
        let mut registry = registry(true);
        let mut runtime = runtime();

        for _ in 0..3 {
            let err = registry.resolve(&mut runtime, &"missing".into()).unwrap_err();
            assert_eq!(err, ResolveError::NotFound("missing".into()));
        }

        assert_eq!(registry.stats(), RegistryStats::default());
        assert!(!registry.is_cached(&"missing".into()));
        assert_eq!(registry.len(), 3);
        assert_eq!(runtime.calls().total_loads(), 0);
    }

    #[test]
    fn test_resolve_caches_on_success() {
        let mut registry = registry(true);
        let mut runtime = runtime();
        let rover: SceneId = "rover".into();

        let first = registry.resolve(&mut runtime, &rover).unwrap();
        let second = registry.resolve(&mut runtime, &rover).unwrap();

        assert_eq!(first, second);
        assert!(registry.is_cached(&rover));
        assert_eq!(runtime.calls().load_count("Experience/Rover"), 1);
        assert_eq!(registry.stats(), RegistryStats { loads: 1, cache_hits: 1 });
    }

    #[test]
    fn test_resolve_without_cache_reloads() {
        let mut registry = registry(false);
        let mut runtime = runtime();
        let rover: SceneId = "rover".into();

        registry.resolve(&mut runtime, &rover).unwrap();
        registry.resolve(&mut runtime, &rover).unwrap();

        assert!(!registry.is_cached(&rover));
        assert_eq!(runtime.calls().load_count("Experience/Rover"), 2);
    }

    #[test]
    fn test_failed_load_leaves_registry_unchanged() {
        let mut registry = registry(true);
        let mut runtime = runtime();
        let broken: SceneId = "broken".into();

        let err = registry.resolve(&mut runtime, &broken).unwrap_err();
        assert_eq!(
            err,
            ResolveError::LoadFailed {
                scene_id: broken.clone(),
                reason: "corrupt archive".to_string()
            }
        );
        assert!(!registry.is_cached(&broken));
        assert_eq!(registry.stats(), RegistryStats::default());

        // Still registered, still failing the same way
        assert!(registry.contains(&broken));
        assert!(registry.resolve(&mut runtime, &broken).is_err());
    }

    #[test]
    fn test_duplicate_and_empty_ids_rejected() {
        let mut builder = SceneRegistry::builder();
        builder.register(SceneDescriptor::asset("cup", "Experience/Cup")).unwrap();
        assert_eq!(
            builder.register(SceneDescriptor::asset("cup", "Other/Cup")),
            Err(RegistryError::DuplicateScene("cup".into()))
        );
        assert_eq!(
            builder.register(SceneDescriptor::asset("  ", "Nothing")),
            Err(RegistryError::EmptySceneId)
        );

        let registry = builder.build();
        assert_eq!(
            registry.descriptor(&"cup".into()).map(|d| d.describe()),
            Some("asset 'Experience/Cup'".to_string())
        );
    }

    #[test]
    fn test_scene_placement_and_ids() {
        let registry = registry(true);
        assert_eq!(
            registry.placement(&"tv".into()),
            Some(&PlacementPolicy::Plane { alignment: PlaneAlignment::Vertical })
        );
        assert_eq!(registry.placement(&"rover".into()), None);

        let ids: Vec<&str> = registry.scene_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["broken", "rover", "tv"]);
    }
}
