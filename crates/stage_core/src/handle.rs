//! Opaque handles exchanged with the 3D runtime

use crate::id::Id;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifier of a registered scene (e.g. `"rover"`)
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(Arc<str>);

impl SceneId {
    /// Create a scene id
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Get the id as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneId({:?})", &*self.0)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for SceneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Handle to a loaded, ready-to-render scene graph owned by the runtime
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SceneGraphHandle {
    id: Id,
    source: Arc<str>,
}

impl SceneGraphHandle {
    /// Create a handle. Only runtimes should need this.
    pub fn new(id: Id, source: impl AsRef<str>) -> Self {
        Self {
            id,
            source: Arc::from(source.as_ref()),
        }
    }

    /// Runtime-assigned id
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// What the graph was built from (asset name or primitive description)
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for SceneGraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneGraph({}:{})", self.id, self.source)
    }
}

/// Handle to one placed anchor in the live scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorHandle(pub Id);

impl AnchorHandle {
    pub fn new(raw: u64) -> Self {
        Self(Id::new(raw))
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.0
    }
}

impl fmt::Display for AnchorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}
