//! Remote control command vocabulary.
//!
//! Wire form is a flat JSON object tagged by `command`; targeted commands
//! carry the item id in `image_name`:
//!
//! ```json
//! { "command": "jump", "image_name": "sunset.jpg" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::ItemId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Next,
    Prev,
    Pause,
    Play,
    Reload,
    Jump {
        #[serde(rename = "image_name", alias = "target")]
        target: ItemId,
    },
    JumpExtra {
        #[serde(rename = "image_name", alias = "target")]
        target: ItemId,
    },
    RefreshCrop {
        #[serde(rename = "image_name", alias = "target")]
        target: ItemId,
    },
}

impl Command {
    /// Validate an untyped request body.
    ///
    /// Rejects unknown kinds and targeted kinds without a non-empty
    /// `image_name`.
    pub fn parse(value: &Value) -> Result<Self, CoreError> {
        let kind = value
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Validation("Invalid command".into()))?;

        let target = || -> Result<ItemId, CoreError> {
            value
                .get("image_name")
                .or_else(|| value.get("target"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CoreError::Validation("Missing image_name parameter".into()))
        };

        match kind {
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "pause" => Ok(Self::Pause),
            "play" => Ok(Self::Play),
            "reload" => Ok(Self::Reload),
            "jump" => Ok(Self::Jump { target: target()? }),
            "jump_extra" => Ok(Self::JumpExtra { target: target()? }),
            "refresh_crop" => Ok(Self::RefreshCrop { target: target()? }),
            _ => Err(CoreError::Validation("Invalid command".into())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Pause => "pause",
            Self::Play => "play",
            Self::Reload => "reload",
            Self::Jump { .. } => "jump",
            Self::JumpExtra { .. } => "jump_extra",
            Self::RefreshCrop { .. } => "refresh_crop",
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Jump { target } | Self::JumpExtra { target } | Self::RefreshCrop { target } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Whether this command ends a playing video before it is delivered.
    pub fn stops_video(&self) -> bool {
        matches!(
            self,
            Self::Next | Self::Prev | Self::Pause | Self::Play | Self::Reload | Self::Jump { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_plain_kinds() {
        for (raw, expected) in [
            ("next", Command::Next),
            ("prev", Command::Prev),
            ("pause", Command::Pause),
            ("play", Command::Play),
            ("reload", Command::Reload),
        ] {
            assert_eq!(Command::parse(&json!({ "command": raw })).unwrap(), expected);
        }
    }

    #[test]
    fn parses_targeted_kinds() {
        let cmd = Command::parse(&json!({ "command": "jump", "image_name": "a.jpg" })).unwrap();
        assert_eq!(cmd, Command::Jump { target: "a.jpg".into() });
        assert_eq!(cmd.target(), Some("a.jpg"));

        let cmd = Command::parse(&json!({ "command": "refresh_crop", "target": "b.png" })).unwrap();
        assert_eq!(cmd.kind(), "refresh_crop");
        assert_eq!(cmd.target(), Some("b.png"));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_matches!(
            Command::parse(&json!({ "command": "explode" })),
            Err(CoreError::Validation(msg)) if msg == "Invalid command"
        );
        assert_matches!(Command::parse(&json!({})), Err(CoreError::Validation(_)));
        assert_matches!(Command::parse(&json!({ "command": 3 })), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_targeted_kind_without_target() {
        assert_matches!(
            Command::parse(&json!({ "command": "jump" })),
            Err(CoreError::Validation(msg)) if msg == "Missing image_name parameter"
        );
        assert_matches!(
            Command::parse(&json!({ "command": "jump_extra", "image_name": "  " })),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn serializes_to_flat_wire_shape() {
        let value = serde_json::to_value(Command::Jump { target: "x.jpg".into() }).unwrap();
        assert_eq!(value, json!({ "command": "jump", "image_name": "x.jpg" }));
        let value = serde_json::to_value(Command::Next).unwrap();
        assert_eq!(value, json!({ "command": "next" }));
    }

    #[test]
    fn only_slideshow_commands_stop_video() {
        assert!(Command::Next.stops_video());
        assert!(Command::Jump { target: "v".into() }.stops_video());
        assert!(!Command::JumpExtra { target: "v".into() }.stops_video());
        assert!(!Command::RefreshCrop { target: "v".into() }.stops_video());
    }
}
