use log::trace;

use crate::groups::TileId;
use crate::state::PuzzleState;

#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub primary_id: TileId,
    pub members: Vec<TileId>,
    offsets: Vec<(f32, f32)>,
    pub start: (f32, f32),
    pub cursor: (f32, f32),
}

impl DragSession {
    /// Per-member offset from the pointer, recorded at drag start.
    pub fn offsets(&self) -> &[(f32, f32)] {
        &self.offsets
    }
}

/// Turns pointer input into rigid movement of the dragged tiles.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Picks the drag set and records offsets. With `capture_mode` on and the
    /// tile's group part of the selection, the whole selection is dragged;
    /// otherwise the tile's own group is. Locked tiles never move.
    pub fn begin(
        &mut self,
        state: &PuzzleState,
        tile_id: TileId,
        pointer: (f32, f32),
        capture_mode: bool,
    ) -> bool {
        if !pointer.0.is_finite() || !pointer.1.is_finite() {
            trace!("drag begin ignored: non-finite pointer");
            return false;
        }
        let Some(tile) = state.tile(tile_id) else {
            trace!("drag begin ignored: unknown tile {tile_id}");
            return false;
        };
        if tile.locked() {
            return false;
        }
        let pointer = clamp_pointer(state, pointer);
        let mut members = if capture_mode && tile.selected() {
            state.selected_tiles()
        } else {
            state.movable_group(tile_id)
        };
        if members.is_empty() {
            members.push(tile_id);
        }
        members.sort_unstable();
        let offsets = members
            .iter()
            .map(|id| {
                let (x, y) = state.tiles()[*id].position();
                (x - pointer.0, y - pointer.1)
            })
            .collect();
        self.session = Some(DragSession {
            primary_id: tile_id,
            members,
            offsets,
            start: pointer,
            cursor: pointer,
        });
        true
    }

    /// Moves every dragged tile to `pointer + offset`, then shifts the set as
    /// one body so it stays inside the extended board bounds.
    pub fn update(&mut self, state: &mut PuzzleState, pointer: (f32, f32)) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !pointer.0.is_finite() || !pointer.1.is_finite() {
            trace!("drag move ignored: non-finite pointer");
            return false;
        }
        let pointer = clamp_pointer(state, pointer);
        session.cursor = pointer;
        for (id, offset) in session.members.iter().zip(&session.offsets) {
            if let Some(tile) = state.tiles.get_mut(*id) {
                if !tile.locked {
                    tile.x = pointer.0 + offset.0;
                    tile.y = pointer.1 + offset.1;
                }
            }
        }
        state.clamp_into_stage(&session.members);
        true
    }

    pub fn finish(&mut self) -> Option<DragSession> {
        self.session.take()
    }

    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            trace!("drag abandoned");
        }
    }
}

fn clamp_pointer(state: &PuzzleState, pointer: (f32, f32)) -> (f32, f32) {
    let stage = state.extended_bounds();
    (
        pointer.0.clamp(stage.min_x, stage.max_x),
        pointer.1.clamp(stage.min_y, stage.max_y),
    )
}
