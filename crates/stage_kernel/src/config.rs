//! Kernel configuration - TOML to KernelConfig conversion
//!
//! # Config Format
//!
//! ```toml
//! debug = false
//!
//! [stream]
//! capacity = 256            # omit for unbounded
//! backpressure = "block"    # block | reject
//!
//! [placement]
//! primitive = { kind = "plane", alignment = "horizontal" }
//! scene = { kind = "world", position = [0.0, 0.0, -1.0] }
//!
//! [registry]
//! cache = true
//!
//! [[registry.scenes]]
//! id = "rover"
//! asset = "Experience/Rover"
//! placement = { kind = "plane", alignment = "horizontal" }  # optional
//! ```
//!
//! Leaving out `registry.scenes` registers [`BUILTIN_SCENES`].

use crate::apply::PlacementConfig;
use serde::Deserialize;
use stage_command::{Backpressure, StreamConfig};
use stage_core::{PlacementPolicy, SceneId};
use stage_scene::{RegistryError, SceneDescriptor, SceneRegistry};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Scenes available without any configuration: `(scene id, asset name)`
pub const BUILTIN_SCENES: &[(&str, &str)] = &[
    ("hab", "Experience/Hab"),
    ("rover", "Experience/Rover"),
    ("spacesuit", "Experience/Spacesuit"),
    ("pancake", "Experience/Pancake"),
    ("drummer", "Experience/Drummer"),
    ("tv", "Experience/TV"),
    ("chair", "Experience/Chair"),
    ("plant", "Experience/Plant"),
    ("cup", "Experience/Cup"),
    ("teapot", "Experience/Teapot"),
];

/// Errors from config parsing
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid backpressure mode: {0} (expected \"block\" or \"reject\")")]
    InvalidBackpressure(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// One configured scene
#[derive(Clone, Debug, PartialEq)]
pub struct SceneEntry {
    pub id: SceneId,
    pub asset: String,
    pub placement: Option<PlacementPolicy>,
}

/// Complete kernel configuration
#[derive(Clone, Debug, PartialEq)]
pub struct KernelConfig {
    /// Verbose logging
    pub debug: bool,
    /// Command stream buffering
    pub stream: StreamConfig,
    /// Default anchor placement
    pub placement: PlacementConfig,
    /// Cache loaded scene graphs
    pub cache_scenes: bool,
    /// Registered scenes
    pub scenes: Vec<SceneEntry>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            debug: false,
            stream: StreamConfig::unbounded(),
            placement: PlacementConfig::default(),
            cache_scenes: true,
            scenes: builtin_scenes(),
        }
    }
}

fn builtin_scenes() -> Vec<SceneEntry> {
    BUILTIN_SCENES
        .iter()
        .map(|(id, asset)| SceneEntry {
            id: SceneId::new(id),
            asset: asset.to_string(),
            placement: None,
        })
        .collect()
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StreamToml {
    capacity: Option<usize>,
    backpressure: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PlacementToml {
    primitive: Option<PlacementPolicy>,
    scene: Option<PlacementPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneToml {
    id: String,
    asset: String,
    placement: Option<PlacementPolicy>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RegistryToml {
    cache: Option<bool>,
    scenes: Option<Vec<SceneToml>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    stream: StreamToml,
    #[serde(default)]
    placement: PlacementToml,
    #[serde(default)]
    registry: RegistryToml,
}

fn parse_backpressure(s: &str) -> ConfigResult<Backpressure> {
    match s.to_lowercase().as_str() {
        "block" => Ok(Backpressure::Block),
        "reject" => Ok(Backpressure::Reject),
        _ => Err(ConfigError::InvalidBackpressure(s.to_string())),
    }
}

fn convert_scenes(raw: Vec<SceneToml>) -> ConfigResult<Vec<SceneEntry>> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| {
            let id = s.id.trim();
            if id.is_empty() {
                return Err(ConfigError::Validation("scene id must not be empty".into()));
            }
            if s.asset.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "scene '{}' has an empty asset name",
                    id
                )));
            }
            if !seen.insert(id.to_string()) {
                return Err(ConfigError::Validation(format!("scene '{}' listed twice", id)));
            }
            Ok(SceneEntry {
                id: SceneId::new(id),
                asset: s.asset,
                placement: s.placement,
            })
        })
        .collect()
}

impl KernelConfig {
    /// Parse a config from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let raw: ConfigToml = toml::from_str(content)?;
        let defaults = Self::default();

        let backpressure = raw
            .stream
            .backpressure
            .as_deref()
            .map(parse_backpressure)
            .transpose()?
            .unwrap_or_default();

        let stream = match raw.stream.capacity {
            Some(0) => {
                return Err(ConfigError::Validation(
                    "stream.capacity must be at least 1".into(),
                ))
            }
            Some(capacity) => StreamConfig::bounded(capacity, backpressure),
            None => StreamConfig::unbounded(),
        };

        let placement = PlacementConfig {
            primitive: raw.placement.primitive.unwrap_or(defaults.placement.primitive),
            scene: raw.placement.scene.unwrap_or(defaults.placement.scene),
        };

        let scenes = match raw.registry.scenes {
            Some(list) => convert_scenes(list)?,
            None => defaults.scenes,
        };

        Ok(Self {
            debug: raw.debug,
            stream,
            placement,
            cache_scenes: raw.registry.cache.unwrap_or(defaults.cache_scenes),
            scenes,
        })
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build the scene registry described by this config
    pub fn build_registry(&self) -> ConfigResult<SceneRegistry> {
        let mut builder = SceneRegistry::builder().caching(self.cache_scenes);
        for scene in &self.scenes {
            let mut descriptor = SceneDescriptor::asset(scene.id.clone(), scene.asset.clone());
            if let Some(placement) = &scene.placement {
                descriptor = descriptor.placed(placement.clone());
            }
            builder.register(descriptor)?;
        }
        Ok(builder.build())
    }
}
