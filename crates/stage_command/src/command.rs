//! Command values

use core::fmt;
use serde::{Deserialize, Serialize};
use stage_core::{Color, SceneId, Shape};

/// One user-intended scene mutation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Synthesize a primitive and place it on a new anchor
    PlaceObject {
        #[serde(default)]
        shape: Shape,
        color: Color,
    },
    /// Remove every placed anchor
    ClearAll,
    /// Load a registered scene and place it on a new anchor
    LoadScene { scene_id: SceneId },
}

impl Command {
    /// Place the default block in the given color
    pub fn place_block(color: Color) -> Self {
        Self::PlaceObject {
            shape: Shape::default(),
            color,
        }
    }

    /// Load a scene by id
    pub fn load_scene(scene_id: impl Into<SceneId>) -> Self {
        Self::LoadScene {
            scene_id: scene_id.into(),
        }
    }

    /// Variant name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaceObject { .. } => "PlaceObject",
            Self::ClearAll => "ClearAll",
            Self::LoadScene { .. } => "LoadScene",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaceObject { shape, color } => write!(f, "PlaceObject({} {})", color, shape),
            Self::ClearAll => write!(f, "ClearAll"),
            Self::LoadScene { scene_id } => write!(f, "LoadScene({})", scene_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_script_lines() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"place_object","shape":{"kind":"box","size":0.2},"color":"red"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::PlaceObject {
                shape: Shape::Box { size: 0.2 },
                color: Color::RED
            }
        );

        let cmd: Command =
            serde_json::from_str(r#"{"type":"place_object","color":"blue"}"#).unwrap();
        assert_eq!(cmd, Command::place_block(Color::BLUE));

        let cmd: Command =
            serde_json::from_str(r#"{"type":"load_scene","scene_id":"rover"}"#).unwrap();
        assert_eq!(cmd, Command::load_scene("rover"));

        let cmd: Command = serde_json::from_str(r#"{"type":"clear_all"}"#).unwrap();
        assert_eq!(cmd, Command::ClearAll);
    }

    #[test]
    fn test_missing_payload_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"type":"load_scene"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"type":"place_object"}"#).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::load_scene("hab").to_string(), "LoadScene(hab)");
        assert_eq!(Command::place_block(Color::RED).to_string(), "PlaceObject(#ff0000 box(0.1m))");
    }
}
