use serde::{Deserialize, Serialize};

use crate::groups::TileId;

/// Input-layer commands, dispatched through `PuzzleEngine::apply_action`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineAction {
    BeginDrag { tile_id: TileId, x: f32, y: f32 },
    DragMove { x: f32, y: f32 },
    DragEnd,
    Rotate { tile_id: TileId, delta_deg: i32 },
    Select { tile_id: TileId },
    ClearSelection,
    Shuffle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_use_tagged_json() {
        let action: EngineAction =
            serde_json::from_str(r#"{"type":"rotate","tile_id":3,"delta_deg":-90}"#).unwrap();
        assert_eq!(
            action,
            EngineAction::Rotate {
                tile_id: 3,
                delta_deg: -90
            }
        );
        let encoded = serde_json::to_string(&EngineAction::DragEnd).unwrap();
        assert_eq!(encoded, r#"{"type":"drag_end"}"#);
    }
}
