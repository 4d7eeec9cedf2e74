use log::debug;
use serde::Serialize;

use jigsnap_core::geometry::{angles_match, rotate_vec};
use jigsnap_core::{CellEdges, Direction};

use crate::groups::TileId;
use crate::state::PuzzleState;

/// What a release did to the board.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SnapOutcome {
    pub locked: Vec<TileId>,
    /// `(a, b)` pairs in the order they fused; `b`'s group joined `a`'s.
    pub merges: Vec<(TileId, TileId)>,
}

impl SnapOutcome {
    pub fn is_noop(&self) -> bool {
        self.locked.is_empty() && self.merges.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeCandidate {
    pub a: TileId,
    pub b: TileId,
    pub dir: Direction,
    /// Translation that closes the gap when applied to `a`'s group.
    pub shift: (f32, f32),
    pub dist: f32,
}

/// True when `a`'s side facing `dir` interlocks with the touching side of
/// the neighbor `b` (one tab against one blank).
pub fn edges_interlock(a: &CellEdges, b: &CellEdges, dir: Direction) -> bool {
    a.side(dir).interlocks(b.side(dir.opposite()))
}

/// Slot-lock and neighbor-merge rules applied when a drag is released.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapEngine {
    pub snap_tolerance: f32,
    pub merge_tolerance: f32,
}

impl SnapEngine {
    pub fn new(snap_tolerance: f32, merge_tolerance: f32) -> Self {
        Self {
            snap_tolerance,
            merge_tolerance,
        }
    }

    pub fn can_lock(&self, state: &PuzzleState, id: TileId) -> bool {
        let Some(tile) = state.tile(id) else {
            return false;
        };
        if tile.locked() {
            return false;
        }
        let (home_x, home_y) = state.slot_of(id);
        (tile.x() - home_x).abs() <= self.snap_tolerance
            && (tile.y() - home_y).abs() <= self.snap_tolerance
            && tile.angle() % 360 == 0
    }

    pub fn lock_pass(&self, state: &mut PuzzleState, ids: &[TileId]) -> Vec<TileId> {
        let mut locked = Vec::new();
        for &id in ids {
            if self.can_lock(state, id) {
                state.lock(id);
                locked.push(id);
            }
        }
        locked
    }

    /// Checks whether `a` may fuse with its grid neighbor in `dir`.
    pub fn merge_candidate(
        &self,
        state: &PuzzleState,
        a: TileId,
        dir: Direction,
    ) -> Option<MergeCandidate> {
        let b = state.grid().neighbor(a, dir)?;
        let tile_a = state.tile(a)?;
        let tile_b = state.tile(b)?;
        if tile_a.locked() || tile_b.locked() {
            return None;
        }
        if state.group_root(a) == state.group_root(b) {
            return None;
        }
        if !angles_match(tile_a.angle(), tile_b.angle()) {
            return None;
        }
        if !edges_interlock(&state.cell_edges(a), &state.cell_edges(b), dir) {
            return None;
        }
        let (col_step, row_step) = dir.delta();
        let (ex, ey) = rotate_vec(
            col_step as f32 * state.tile_width(),
            row_step as f32 * state.tile_height(),
            tile_a.angle(),
        );
        let center_a = state.tile_center(a);
        let center_b = state.tile_center(b);
        let rx = (center_b.0 - center_a.0) - ex;
        let ry = (center_b.1 - center_a.1) - ey;
        if rx.abs() > self.merge_tolerance || ry.abs() > self.merge_tolerance {
            return None;
        }
        Some(MergeCandidate {
            a,
            b,
            dir,
            shift: (rx, ry),
            dist: (rx * rx + ry * ry).sqrt(),
        })
    }

    fn best_candidate(&self, state: &PuzzleState, active: &[TileId]) -> Option<MergeCandidate> {
        let mut best: Option<MergeCandidate> = None;
        for &a in active {
            for dir in Direction::ALL {
                if let Some(candidate) = self.merge_candidate(state, a, dir) {
                    if best.map_or(true, |current| candidate.dist < current.dist) {
                        best = Some(candidate);
                    }
                }
            }
        }
        best
    }

    /// Fuses `b`'s group into `a`'s, moving `a`'s group by `shift` first so
    /// the two tiles sit exactly one slot apart.
    pub fn apply_merge(&self, state: &mut PuzzleState, candidate: &MergeCandidate) {
        let moving = state.movable_group(candidate.a);
        state.translate(&moving, candidate.shift.0, candidate.shift.1);
        let selected = state.tile(candidate.a).is_some_and(|tile| tile.selected());
        if state.groups.union(candidate.a, candidate.b).is_some() {
            let members = state.movable_group(candidate.a);
            for id in members {
                state.tiles[id].selected = selected;
            }
        }
    }

    /// Resolves a release: slot-locks the dragged tiles, then fuses neighbors
    /// until no qualifying pair is left, then lock-tests the moved tiles once
    /// more.
    pub fn resolve(&self, state: &mut PuzzleState, dragged: &[TileId]) -> SnapOutcome {
        let mut outcome = SnapOutcome {
            locked: self.lock_pass(state, dragged),
            merges: Vec::new(),
        };
        let seeds: Vec<TileId> = dragged
            .iter()
            .copied()
            .filter(|id| state.tile(*id).is_some_and(|tile| !tile.locked()))
            .collect();
        loop {
            let active = active_tiles(state, &seeds);
            let Some(candidate) = self.best_candidate(state, &active) else {
                break;
            };
            debug!(
                "merge {} -> {} ({:?}, residual {:.2})",
                candidate.b, candidate.a, candidate.dir, candidate.dist
            );
            self.apply_merge(state, &candidate);
            outcome.merges.push((candidate.a, candidate.b));
        }
        if !outcome.merges.is_empty() {
            let active = active_tiles(state, &seeds);
            outcome.locked.extend(self.lock_pass(state, &active));
            debug!(
                "release cascade: {} merges, group of {}",
                outcome.merges.len(),
                active.len()
            );
        }
        outcome
    }
}

/// Unlocked members of every group touched by `seeds`, without duplicates.
fn active_tiles(state: &PuzzleState, seeds: &[TileId]) -> Vec<TileId> {
    let mut seen = vec![false; state.len()];
    let mut active = Vec::new();
    for &seed in seeds {
        for id in state.movable_group(seed) {
            if !seen[id] {
                seen[id] = true;
                active.push(id);
            }
        }
    }
    active
}
