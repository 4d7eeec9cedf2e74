use serde::Serialize;

use jigsnap_core::geometry::{normalize_angle, rotate_point, snap_to_quarter, Bounds};
use jigsnap_core::{slot_position, CellEdges, EdgeMatrix, GridSize, SeededRandom};

use crate::groups::{DisjointSet, GroupId, TileId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TileState {
    Floating,
    Locked,
}

/// One puzzle piece. `x`/`y` is the top-left corner of the piece's cell
/// rectangle before rotation; the piece rotates about the rectangle's center.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) home_row: u32,
    pub(crate) home_col: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) angle: u16,
    pub(crate) locked: bool,
    pub(crate) selected: bool,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn home_row(&self) -> u32 {
        self.home_row
    }

    pub fn home_col(&self) -> u32 {
        self.home_col
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn angle(&self) -> u16 {
        self.angle
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn state(&self) -> TileState {
        if self.locked {
            TileState::Locked
        } else {
            TileState::Floating
        }
    }
}

/// Live tile collection, group partition and slot layout.
#[derive(Clone, Debug)]
pub struct PuzzleState {
    grid: GridSize,
    tile_width: f32,
    tile_height: f32,
    stage_margin: f32,
    edges: EdgeMatrix,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) groups: DisjointSet,
}

impl PuzzleState {
    /// Creates tiles sitting in their home slots, unlocked, as singleton
    /// groups. The grid is taken from the edge matrix.
    pub fn new(
        edges: EdgeMatrix,
        tile_width: f32,
        tile_height: f32,
        stage_margin_ratio: f32,
    ) -> Self {
        let grid = edges.grid();
        let total = grid.total();
        let mut tiles = Vec::with_capacity(total);
        for id in 0..total {
            let (row, col) = grid.row_col(id);
            let (x, y) = slot_position(row, col, tile_width, tile_height);
            tiles.push(Tile {
                id,
                home_row: row,
                home_col: col,
                x,
                y,
                angle: 0,
                locked: false,
                selected: false,
            });
        }
        Self {
            grid,
            tile_width,
            tile_height,
            stage_margin: tile_width.max(tile_height) * stage_margin_ratio,
            edges,
            tiles,
            groups: DisjointSet::new(total),
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn edges(&self) -> &EdgeMatrix {
        &self.edges
    }

    pub fn cell_edges(&self, id: TileId) -> CellEdges {
        self.edges.cell(id).copied().unwrap_or(CellEdges::FLAT)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn slot_of(&self, id: TileId) -> (f32, f32) {
        let (row, col) = self.grid.row_col(id);
        slot_position(row, col, self.tile_width, self.tile_height)
    }

    /// Center of the tile's cell rectangle, the pivot for rotation.
    pub fn center_of(&self, id: TileId) -> Option<(f32, f32)> {
        (id < self.tiles.len()).then(|| self.tile_center(id))
    }

    pub(crate) fn tile_center(&self, id: TileId) -> (f32, f32) {
        let tile = &self.tiles[id];
        (
            tile.x + self.tile_width * 0.5,
            tile.y + self.tile_height * 0.5,
        )
    }

    pub fn group_of(&self, id: TileId) -> Option<GroupId> {
        (id < self.tiles.len()).then(|| self.groups.root(id))
    }

    pub(crate) fn group_root(&self, id: TileId) -> GroupId {
        self.groups.root(id)
    }

    /// Members of the group containing `id`; empty for an unknown id.
    pub fn group_members(&self, id: TileId) -> &[TileId] {
        if id >= self.tiles.len() {
            return &[];
        }
        self.groups.members(id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.group_count()
    }

    pub fn board_bounds(&self) -> Bounds {
        Bounds::new(
            0.0,
            0.0,
            self.grid.cols as f32 * self.tile_width,
            self.grid.rows as f32 * self.tile_height,
        )
    }

    /// The board grown by the staging margin on every side. Tile rectangles
    /// are kept inside it.
    pub fn extended_bounds(&self) -> Bounds {
        let board = self.board_bounds();
        Bounds::new(
            board.min_x - self.stage_margin,
            board.min_y - self.stage_margin,
            board.max_x + self.stage_margin,
            board.max_y + self.stage_margin,
        )
    }

    /// Bounding box of the tile rectangles of `ids`.
    pub fn footprint(&self, ids: &[TileId]) -> Bounds {
        let mut bounds = Bounds::empty();
        for &id in ids {
            if let Some(tile) = self.tiles.get(id) {
                bounds.include(tile.x, tile.y);
                bounds.include(tile.x + self.tile_width, tile.y + self.tile_height);
            }
        }
        bounds
    }

    pub fn is_solved(&self) -> bool {
        !self.tiles.is_empty() && self.tiles.iter().all(|tile| tile.locked)
    }

    pub fn locked_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.locked).count()
    }

    /// Unlocked members of the group containing `id`.
    pub fn movable_group(&self, id: TileId) -> Vec<TileId> {
        if id >= self.tiles.len() {
            return Vec::new();
        }
        self.groups
            .members(id)
            .iter()
            .copied()
            .filter(|member| !self.tiles[*member].locked)
            .collect()
    }

    pub fn selected_tiles(&self) -> Vec<TileId> {
        self.tiles
            .iter()
            .filter(|tile| tile.selected && !tile.locked)
            .map(|tile| tile.id)
            .collect()
    }

    /// Resets every tile to a floating singleton with angle 0, dealt to a
    /// random spot in the staging band around one of the four board edges.
    pub fn shuffle(&mut self, rng: &mut SeededRandom) {
        let board = self.board_bounds();
        let margin = self.stage_margin;
        let (tw, th) = (self.tile_width, self.tile_height);
        for tile in &mut self.tiles {
            let (x, y) = match rng.index(4) {
                0 => (
                    rng.range(board.min_x - margin, board.max_x + margin - tw),
                    rng.range(board.min_y - margin, board.min_y - th),
                ),
                1 => (
                    rng.range(board.max_x, board.max_x + margin - tw),
                    rng.range(board.min_y - margin, board.max_y + margin - th),
                ),
                2 => (
                    rng.range(board.min_x - margin, board.max_x + margin - tw),
                    rng.range(board.max_y, board.max_y + margin - th),
                ),
                _ => (
                    rng.range(board.min_x - margin, board.min_x - tw),
                    rng.range(board.min_y - margin, board.max_y + margin - th),
                ),
            };
            tile.x = x;
            tile.y = y;
            tile.angle = 0;
            tile.locked = false;
            tile.selected = false;
        }
        self.groups = DisjointSet::new(self.tiles.len());
    }

    pub(crate) fn translate(&mut self, ids: &[TileId], dx: f32, dy: f32) {
        for &id in ids {
            if let Some(tile) = self.tiles.get_mut(id) {
                if !tile.locked {
                    tile.x += dx;
                    tile.y += dy;
                }
            }
        }
    }

    /// Moves `ids` rigidly so their footprint lies inside the extended bounds.
    pub(crate) fn clamp_into_stage(&mut self, ids: &[TileId]) {
        let footprint = self.footprint(ids);
        if !footprint.is_finite() {
            return;
        }
        let (dx, dy) = self.extended_bounds().containing_shift(&footprint);
        if dx != 0.0 || dy != 0.0 {
            self.translate(ids, dx, dy);
        }
    }

    /// Snaps a tile into its home slot and freezes it.
    pub(crate) fn lock(&mut self, id: TileId) {
        let (x, y) = self.slot_of(id);
        if let Some(tile) = self.tiles.get_mut(id) {
            tile.x = x;
            tile.y = y;
            tile.angle = 0;
            tile.locked = true;
            tile.selected = false;
        }
    }

    /// Rotates the unlocked members of `id`'s group rigidly about the center
    /// of `id` by the nearest quarter turn to `delta_deg`. Locked tiles are
    /// left untouched; returns false when nothing moved.
    pub fn rotate(&mut self, id: TileId, delta_deg: i32) -> bool {
        let Some(tile) = self.tiles.get(id) else {
            return false;
        };
        if tile.locked {
            return false;
        }
        let delta = snap_to_quarter(delta_deg);
        if delta.rem_euclid(360) == 0 {
            return false;
        }
        let quarter = normalize_angle(delta);
        let (pivot_x, pivot_y) = self.tile_center(id);
        let members = self.movable_group(id);
        let (tw, th) = (self.tile_width, self.tile_height);
        for &member in &members {
            let tile = &mut self.tiles[member];
            let center = (tile.x + tw * 0.5, tile.y + th * 0.5);
            let (cx, cy) = rotate_point(center.0, center.1, pivot_x, pivot_y, quarter);
            tile.x = cx - tw * 0.5;
            tile.y = cy - th * 0.5;
            tile.angle = normalize_angle(i32::from(tile.angle) + delta);
        }
        self.clamp_into_stage(&members);
        true
    }

    /// Toggles selection for the whole group containing `id`: if every
    /// unlocked member is selected the group is deselected, otherwise it is
    /// selected.
    pub fn toggle_group_selection(&mut self, id: TileId) -> bool {
        let members = self.movable_group(id);
        if members.is_empty() {
            return false;
        }
        let select = !members.iter().all(|member| self.tiles[*member].selected);
        for member in members {
            self.tiles[member].selected = select;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        for tile in &mut self.tiles {
            tile.selected = false;
        }
    }

    /// Test and tooling hook: places a tile directly. The angle is rounded to
    /// the nearest quarter turn.
    pub fn place(&mut self, id: TileId, x: f32, y: f32, angle: u16) -> bool {
        match self.tiles.get_mut(id) {
            Some(tile) if !tile.locked && x.is_finite() && y.is_finite() => {
                tile.x = x;
                tile.y = y;
                tile.angle = normalize_angle(snap_to_quarter(i32::from(angle)));
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigsnap_core::build_edges_for_seed;

    fn state(cols: u32, rows: u32) -> PuzzleState {
        let edges = build_edges_for_seed("state", GridSize::new(cols, rows));
        PuzzleState::new(edges, 100.0, 80.0, 1.6)
    }

    #[test]
    fn new_tiles_sit_in_their_slots() {
        let state = state(3, 2);
        assert_eq!(state.len(), 6);
        assert_eq!(state.tile(4).unwrap().position(), (100.0, 80.0));
        assert_eq!(state.tile(4).unwrap().home_row(), 1);
        assert_eq!(state.tile(4).unwrap().home_col(), 1);
        assert_eq!(state.group_count(), 6);
    }

    #[test]
    fn shuffle_deals_off_board_inside_stage() {
        let mut state = state(4, 3);
        let mut rng = SeededRandom::new(99);
        state.shuffle(&mut rng);
        let board = state.board_bounds();
        let stage = state.extended_bounds();
        for tile in state.tiles() {
            let left = tile.x;
            let top = tile.y;
            let right = tile.x + state.tile_width();
            let bottom = tile.y + state.tile_height();
            let overlaps = right > board.min_x
                && left < board.max_x
                && bottom > board.min_y
                && top < board.max_y;
            assert!(!overlaps, "tile {} overlaps the board", tile.id());
            assert!(left >= stage.min_x && right <= stage.max_x + 1e-3);
            assert!(top >= stage.min_y && bottom <= stage.max_y + 1e-3);
            assert_eq!(tile.angle(), 0);
            assert_eq!(tile.state(), TileState::Floating);
        }
    }

    #[test]
    fn locked_tiles_ignore_rotation() {
        let mut state = state(2, 2);
        state.lock(0);
        assert!(!state.rotate(0, 90));
        assert_eq!(state.tile(0).unwrap().angle(), 0);
    }

    #[test]
    fn rotation_normalizes_angles() {
        let mut state = state(2, 2);
        assert!(state.rotate(1, -90));
        assert_eq!(state.tile(1).unwrap().angle(), 270);
        assert!(state.rotate(1, 450));
        assert_eq!(state.tile(1).unwrap().angle(), 0);
        assert!(!state.rotate(1, 360));
    }

    #[test]
    fn group_rotation_is_rigid() {
        let mut state = state(2, 1);
        state.groups.union(0, 1);
        assert!(state.rotate(0, 90));
        // tile 1 swings from the right of tile 0 to below it
        let c0 = state.tile_center(0);
        let c1 = state.tile_center(1);
        assert_eq!((c1.0 - c0.0, c1.1 - c0.1), (0.0, 100.0));
        assert_eq!(state.tile(1).unwrap().angle(), 90);
    }

    #[test]
    fn selection_toggles_per_group() {
        let mut state = state(3, 1);
        state.groups.union(0, 1);
        assert!(state.toggle_group_selection(1));
        assert_eq!(state.selected_tiles(), vec![0, 1]);
        assert!(state.toggle_group_selection(0));
        assert!(state.selected_tiles().is_empty());
    }

    #[test]
    fn placed_angles_round_to_quarter_turns() {
        let mut state = state(2, 2);
        assert!(state.place(0, -150.0, -150.0, 45));
        assert_eq!(state.tile(0).unwrap().angle(), 90);
        assert!(state.place(1, -150.0, -150.0, 44));
        assert_eq!(state.tile(1).unwrap().angle(), 0);
        assert!(state.place(2, -150.0, -150.0, 300));
        assert_eq!(state.tile(2).unwrap().angle(), 270);
        assert!(state.place(3, -150.0, -150.0, 359));
        assert_eq!(state.tile(3).unwrap().angle(), 0);
    }

    #[test]
    fn unknown_ids_degrade_to_empty_answers() {
        let state = state(2, 2);
        assert_eq!(state.group_of(99), None);
        assert!(state.group_members(99).is_empty());
        assert_eq!(state.center_of(99), None);
        assert!(state.movable_group(99).is_empty());
        assert_eq!(state.group_of(3), Some(3));
        assert_eq!(state.center_of(0), Some((50.0, 40.0)));
    }
}
