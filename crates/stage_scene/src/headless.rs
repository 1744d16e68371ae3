//! Headless runtime - an in-memory [`SceneRuntime`] with no renderer
//!
//! Assets come from two places, checked in order:
//! 1. names registered with [`HeadlessRuntime::with_asset`] /
//!    [`HeadlessRuntime::with_broken_asset`]
//! 2. files under the asset directory, if one is configured
//!
//! Anchors are tracked in placement order. Face and image placement need
//! tracking hardware, so they fail unless tracking is switched on.

use crate::runtime::{RuntimeError, SceneRuntime};
use stage_core::{AnchorHandle, Color, IdGenerator, PlacementPolicy, SceneGraphHandle, Shape};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

#[derive(Clone, Debug)]
enum AssetSource {
    Ready,
    Broken(String),
}

/// An anchor currently in the headless scene
#[derive(Clone, Debug, PartialEq)]
pub struct LiveAnchor {
    pub graph: SceneGraphHandle,
    pub policy: PlacementPolicy,
}

/// Call counters, for tests and diagnostics
#[derive(Clone, Debug, Default)]
pub struct RuntimeCalls {
    loads: HashMap<String, u32>,
    pub synthesized: u32,
    pub attached: u32,
    pub detached: u32,
}

impl RuntimeCalls {
    /// Load attempts for one asset name, successful or not
    pub fn load_count(&self, asset: &str) -> u32 {
        self.loads.get(asset).copied().unwrap_or(0)
    }

    /// Load attempts across all assets
    pub fn total_loads(&self) -> u32 {
        self.loads.values().sum()
    }
}

/// In-memory runtime
#[derive(Debug)]
pub struct HeadlessRuntime {
    assets: HashMap<String, AssetSource>,
    asset_dir: Option<PathBuf>,
    tracking: bool,
    fail_next_attach: Option<String>,
    graph_ids: IdGenerator,
    anchor_ids: IdGenerator,
    live: BTreeMap<AnchorHandle, LiveAnchor>,
    calls: RuntimeCalls,
}

impl HeadlessRuntime {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            asset_dir: None,
            tracking: false,
            fail_next_attach: None,
            graph_ids: IdGenerator::new(),
            anchor_ids: IdGenerator::new(),
            live: BTreeMap::new(),
            calls: RuntimeCalls::default(),
        }
    }

    /// Make an asset name loadable
    pub fn with_asset(mut self, name: impl Into<String>) -> Self {
        self.assets.insert(name.into(), AssetSource::Ready);
        self
    }

    /// Make an asset name fail to load with the given reason
    pub fn with_broken_asset(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.assets.insert(name.into(), AssetSource::Broken(reason.into()));
        self
    }

    /// Resolve unregistered asset names as files under `dir`
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    /// Pretend face and image tracking are available
    pub fn with_tracking(mut self, enabled: bool) -> Self {
        self.tracking = enabled;
        self
    }

    /// Make the next attach fail with `reason`
    pub fn fail_next_attach(&mut self, reason: impl Into<String>) {
        self.fail_next_attach = Some(reason.into());
    }

    /// Anchors in the live scene, in placement order
    pub fn live_anchors(&self) -> impl Iterator<Item = (&AnchorHandle, &LiveAnchor)> {
        self.live.iter()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: &AnchorHandle) -> bool {
        self.live.contains_key(handle)
    }

    pub fn calls(&self) -> &RuntimeCalls {
        &self.calls
    }

    fn load_from_dir(dir: &Path, name: &str) -> Result<(), RuntimeError> {
        // Asset names are relative paths that stay inside the directory
        let relative = Path::new(name);
        let contained = relative.components().next().is_some()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(RuntimeError::Load(format!("invalid asset name: {}", name)));
        }

        let path = dir.join(relative);
        if !path.is_file() {
            return Err(RuntimeError::Load(format!("asset not found: {}", name)));
        }

        let bytes = std::fs::read(&path)
            .map_err(|e| RuntimeError::Load(format!("{}: {}", path.display(), e)))?;
        if bytes.is_empty() {
            return Err(RuntimeError::Load(format!("{}: empty asset", path.display())));
        }
        Ok(())
    }
}

impl Default for HeadlessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRuntime for HeadlessRuntime {
    fn name(&self) -> &str {
        "headless"
    }

    fn load_asset(&mut self, name: &str) -> Result<SceneGraphHandle, RuntimeError> {
        *self.calls.loads.entry(name.to_string()).or_default() += 1;

        match (self.assets.get(name), &self.asset_dir) {
            (Some(AssetSource::Ready), _) => {}
            (Some(AssetSource::Broken(reason)), _) => {
                return Err(RuntimeError::Load(reason.clone()))
            }
            (None, Some(dir)) => Self::load_from_dir(dir, name)?,
            (None, None) => return Err(RuntimeError::Load(format!("asset not found: {}", name))),
        }

        Ok(SceneGraphHandle::new(self.graph_ids.next(), name))
    }

    fn synthesize(
        &mut self,
        shape: &Shape,
        color: Color,
    ) -> Result<SceneGraphHandle, RuntimeError> {
        shape
            .validate()
            .map_err(|e| RuntimeError::Synthesize(e.to_string()))?;
        self.calls.synthesized += 1;
        Ok(SceneGraphHandle::new(
            self.graph_ids.next(),
            format!("{} {}", color, shape),
        ))
    }

    fn attach_to_anchor(
        &mut self,
        graph: &SceneGraphHandle,
        policy: &PlacementPolicy,
    ) -> Result<AnchorHandle, RuntimeError> {
        if let Some(reason) = self.fail_next_attach.take() {
            return Err(RuntimeError::Attach(reason));
        }

        match policy {
            PlacementPolicy::Face | PlacementPolicy::Image { .. } if !self.tracking => {
                return Err(RuntimeError::Attach(format!(
                    "{} tracking unavailable in headless runtime",
                    policy
                )));
            }
            _ => {}
        }

        let handle = AnchorHandle(self.anchor_ids.next());
        self.live.insert(
            handle,
            LiveAnchor {
                graph: graph.clone(),
                policy: policy.clone(),
            },
        );
        self.calls.attached += 1;
        Ok(handle)
    }

    fn detach(&mut self, anchors: &[AnchorHandle]) {
        for handle in anchors {
            if self.live.remove(handle).is_some() {
                self.calls.detached += 1;
            }
        }
    }
}
