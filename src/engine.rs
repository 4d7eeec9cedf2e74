use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, trace};

use jigsnap_core::geometry::{normalize_angle, rotate_vec};
use jigsnap_core::{
    build_edges_for_seed, hash_seed, scramble_seed, EdgeMatrix, GridSize, PiecePath,
    SeededRandom, ShapeCache,
};

use crate::action::EngineAction;
use crate::config::{sanitize_snap_tolerance, EngineConfig};
use crate::drag::DragController;
use crate::groups::TileId;
use crate::snap::{SnapEngine, SnapOutcome};
use crate::state::{PuzzleState, Tile};
use crate::view::{bring_members_to_front, EngineSnapshot, TileView};

pub type EngineSubscriber = Rc<dyn Fn(&EngineSnapshot)>;

/// Command facade over the puzzle. Every mutating command runs to completion
/// before subscribers see the resulting snapshot.
pub struct PuzzleEngine {
    config: EngineConfig,
    state: PuzzleState,
    drag: DragController,
    shapes: RefCell<ShapeCache>,
    z_order: Vec<TileId>,
    edge_builds: usize,
    subscribers: Rc<RefCell<Vec<EngineSubscriber>>>,
}

impl PuzzleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        let edges = build_edges_for_seed(&config.seed_string(), config.grid());
        debug!("edge matrix built for {}", config.seed_string());
        Self::assemble(config, edges, 1)
    }

    /// Starts from a caller-supplied edge matrix instead of the seeded one.
    /// The grid dimensions are taken from the matrix.
    pub fn with_edges(config: EngineConfig, edges: EdgeMatrix) -> Self {
        let grid = edges.grid();
        let config = EngineConfig {
            cols: grid.cols,
            rows: grid.rows,
            ..config
        }
        .sanitized();
        Self::assemble(config, edges, 0)
    }

    fn assemble(config: EngineConfig, edges: EdgeMatrix, edge_builds: usize) -> Self {
        let state = PuzzleState::new(
            edges,
            config.tile_width(),
            config.tile_height(),
            config.stage_margin_ratio,
        );
        let mut engine = Self {
            z_order: (0..state.len()).collect(),
            config,
            state,
            drag: DragController::new(),
            shapes: RefCell::new(ShapeCache::new()),
            edge_builds,
            subscribers: Rc::new(RefCell::new(Vec::new())),
        };
        engine.deal();
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn grid(&self) -> GridSize {
        self.state.grid()
    }

    pub fn edges(&self) -> &EdgeMatrix {
        self.state.edges()
    }

    /// How many edge matrices have been generated over the engine's life.
    pub fn edge_builds(&self) -> usize {
        self.edge_builds
    }

    pub fn snap_engine(&self) -> SnapEngine {
        SnapEngine::new(self.config.snap_tolerance, self.config.merge_tolerance())
    }

    pub fn subscribe(&self, subscriber: EngineSubscriber) -> Subscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        Subscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    fn notify(&self) {
        let subscribers = self.subscribers.borrow().clone();
        if subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for subscriber in subscribers {
            (subscriber)(&snapshot);
        }
    }

    // Lays the tiles out for the current nonce.
    fn deal(&mut self) {
        let grid = self.state.grid();
        let seed = scramble_seed(
            hash_seed(&self.config.seed_string()),
            self.config.shuffle_nonce,
            grid.cols as usize,
            grid.rows as usize,
        );
        let mut rng = SeededRandom::new(seed);
        self.state.shuffle(&mut rng);
        self.z_order = (0..self.state.len()).collect();
        debug!(
            "dealt {} tiles (nonce {})",
            self.state.len(),
            self.config.shuffle_nonce
        );
    }

    fn rebuild(&mut self, regenerate_edges: bool) {
        self.drag.cancel();
        let edges = if regenerate_edges {
            self.edge_builds += 1;
            debug!("edge matrix rebuilt for {}", self.config.seed_string());
            build_edges_for_seed(&self.config.seed_string(), self.config.grid())
        } else {
            self.state.edges().clone()
        };
        self.shapes.borrow_mut().clear();
        self.state = PuzzleState::new(
            edges,
            self.config.tile_width(),
            self.config.tile_height(),
            self.config.stage_margin_ratio,
        );
        self.deal();
    }

    pub fn set_image(&mut self, image_url: &str) {
        if self.config.image_url == image_url {
            return;
        }
        self.config.image_url = image_url.to_string();
        self.rebuild(true);
        self.notify();
    }

    pub fn set_grid(&mut self, cols: u32, rows: u32) {
        let grid = GridSize::new(cols, rows).clamped();
        if grid == self.state.grid() {
            return;
        }
        self.config.cols = grid.cols;
        self.config.rows = grid.rows;
        self.rebuild(true);
        self.notify();
    }

    /// Changes the pixel size of the assembled image. The interlock pattern
    /// is kept; tiles are rebuilt at the new size and dealt again.
    pub fn set_board_size(&mut self, width: f32, height: f32) {
        let resized = EngineConfig {
            board_width: width,
            board_height: height,
            ..self.config.clone()
        }
        .sanitized();
        if resized.board_width == self.config.board_width
            && resized.board_height == self.config.board_height
        {
            return;
        }
        self.config = resized;
        self.rebuild(false);
        self.notify();
    }

    pub fn set_snap_tolerance(&mut self, tolerance: f32) {
        self.config.snap_tolerance = sanitize_snap_tolerance(tolerance);
    }

    pub fn set_edges_only(&mut self, enabled: bool) {
        if self.config.edges_only != enabled {
            self.config.edges_only = enabled;
            self.notify();
        }
    }

    pub fn set_rotation_mode(&mut self, enabled: bool) {
        self.config.rotation_mode = enabled;
    }

    pub fn set_capture_mode(&mut self, enabled: bool) {
        self.config.capture_mode = enabled;
        if !enabled {
            self.state.clear_selection();
            self.notify();
        }
    }

    /// Deals a fresh layout. Any drag in flight is abandoned.
    pub fn shuffle(&mut self) {
        self.drag.cancel();
        self.config.shuffle_nonce = self.config.shuffle_nonce.wrapping_add(1);
        self.deal();
        self.notify();
    }

    /// Toggles selection of the group containing `tile_id`.
    pub fn select(&mut self, tile_id: TileId) -> bool {
        let changed = self.state.toggle_group_selection(tile_id);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
        self.notify();
    }

    pub fn selected(&self) -> Vec<TileId> {
        self.state.selected_tiles()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn begin_drag(&mut self, tile_id: TileId, x: f32, y: f32) -> bool {
        if self.drag.is_active() {
            trace!("drag begin ignored: drag already active");
            return false;
        }
        if !self
            .drag
            .begin(&self.state, tile_id, (x, y), self.config.capture_mode)
        {
            return false;
        }
        if let Some(session) = self.drag.session() {
            bring_members_to_front(&mut self.z_order, &session.members);
        }
        self.notify();
        true
    }

    pub fn drag_move(&mut self, x: f32, y: f32) -> bool {
        let moved = self.drag.update(&mut self.state, (x, y));
        if moved {
            self.notify();
        }
        moved
    }

    /// Releases the drag: slot-locking, then the neighbor merge cascade.
    pub fn end_drag(&mut self) -> SnapOutcome {
        let Some(session) = self.drag.finish() else {
            return SnapOutcome::default();
        };
        let outcome = self.snap_engine().resolve(&mut self.state, &session.members);
        if !outcome.merges.is_empty() {
            let members = self.state.group_members(session.primary_id).to_vec();
            bring_members_to_front(&mut self.z_order, &members);
        }
        for id in &outcome.locked {
            debug!("tile {id} locked");
        }
        if self.state.is_solved() {
            info!("puzzle solved");
        }
        self.notify();
        outcome
    }

    /// Rotates the group containing `tile_id`. Locked tiles ignore it.
    pub fn rotate(&mut self, tile_id: TileId, delta_deg: i32) -> bool {
        let dragged = self
            .drag
            .session()
            .is_some_and(|session| session.members.contains(&tile_id));
        if dragged {
            trace!("rotate ignored: tile {tile_id} is being dragged");
            return false;
        }
        let rotated = self.state.rotate(tile_id, delta_deg);
        if rotated {
            self.notify();
        }
        rotated
    }

    /// Moves one floating tile directly, for tooling and scripted setups.
    pub fn place(&mut self, tile_id: TileId, x: f32, y: f32, angle: u16) -> bool {
        if self.drag.is_active() {
            return false;
        }
        let placed = self.state.place(tile_id, x, y, angle);
        if placed {
            self.notify();
        }
        placed
    }

    /// Dispatches an input-layer command. Returns the release outcome for
    /// `DragEnd`.
    pub fn apply_action(&mut self, action: EngineAction) -> Option<SnapOutcome> {
        match action {
            EngineAction::BeginDrag { tile_id, x, y } => {
                self.begin_drag(tile_id, x, y);
            }
            EngineAction::DragMove { x, y } => {
                self.drag_move(x, y);
            }
            EngineAction::DragEnd => return Some(self.end_drag()),
            EngineAction::Rotate { tile_id, delta_deg } => {
                if self.config.rotation_mode {
                    self.rotate(tile_id, delta_deg);
                } else {
                    trace!("rotate action ignored: rotation mode is off");
                }
            }
            EngineAction::Select { tile_id } => {
                self.select(tile_id);
            }
            EngineAction::ClearSelection => self.clear_selection(),
            EngineAction::Shuffle => self.shuffle(),
        }
        None
    }

    pub fn tiles(&self) -> &[Tile] {
        self.state.tiles()
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.state.tile(id)
    }

    pub fn solved(&self) -> bool {
        self.state.is_solved()
    }

    /// `(locked, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.state.locked_count(), self.state.len())
    }

    pub fn z_order(&self) -> &[TileId] {
        &self.z_order
    }

    pub fn outline(&self, id: TileId) -> Option<Rc<PiecePath>> {
        self.state.tile(id)?;
        Some(self.shapes.borrow_mut().get_or_build(
            self.state.tile_width(),
            self.state.tile_height(),
            self.state.cell_edges(id),
            self.config.knob_ratio,
        ))
    }

    /// Number of distinct outlines generated since the last rebuild.
    pub fn outline_builds(&self) -> usize {
        self.shapes.borrow().builds()
    }

    pub fn is_visible(&self, id: TileId) -> bool {
        let Some(tile) = self.state.tile(id) else {
            return false;
        };
        !self.config.edges_only
            || tile.locked()
            || self.state.grid().is_border(tile.home_row(), tile.home_col())
    }

    /// Topmost visible tile whose outline contains the point.
    pub fn tile_at(&self, x: f32, y: f32) -> Option<TileId> {
        let (tw, th) = (self.state.tile_width(), self.state.tile_height());
        self.z_order.iter().rev().copied().find(|&id| {
            if !self.is_visible(id) {
                return false;
            }
            let Some(tile) = self.state.tile(id) else {
                return false;
            };
            let Some(outline) = self.outline(id) else {
                return false;
            };
            let (cx, cy) = self.state.tile_center(id);
            let inverse = normalize_angle(-i32::from(tile.angle()));
            let (lx, ly) = rotate_vec(x - cx, y - cy, inverse);
            outline.contains_point(lx + tw * 0.5, ly + th * 0.5)
        })
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let mut tiles = Vec::with_capacity(self.state.len());
        for tile in self.state.tiles() {
            let Some(outline) = self.outline(tile.id()) else {
                continue;
            };
            tiles.push(TileView {
                id: tile.id(),
                home_row: tile.home_row(),
                home_col: tile.home_col(),
                x: tile.x(),
                y: tile.y(),
                angle: tile.angle(),
                locked: tile.locked(),
                group_id: self.state.group_root(tile.id()),
                selected: tile.selected(),
                visible: self.is_visible(tile.id()),
                outline,
            });
        }
        EngineSnapshot {
            tiles,
            z_order: self.z_order.clone(),
            solved: self.solved(),
            progress: self.progress(),
        }
    }
}

/// Keeps a subscriber registered; dropping it unsubscribes.
pub struct Subscription {
    subscriber: EngineSubscriber,
    subscribers: Rc<RefCell<Vec<EngineSubscriber>>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn engine() -> PuzzleEngine {
        PuzzleEngine::new(EngineConfig {
            image_url: "unit".to_string(),
            cols: 3,
            rows: 2,
            board_width: 300.0,
            board_height: 200.0,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let mut engine = engine();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let subscription = engine.subscribe(Rc::new(move |_: &EngineSnapshot| {
            seen.set(seen.get() + 1)
        }));
        engine.shuffle();
        assert_eq!(calls.get(), 1);
        drop(subscription);
        engine.shuffle();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn shuffle_advances_the_nonce_and_cancels_drag() {
        let mut engine = engine();
        let before: Vec<_> = engine.tiles().iter().map(Tile::position).collect();
        let (x, y) = engine.tile(0).unwrap().position();
        assert!(engine.begin_drag(0, x, y));
        engine.shuffle();
        assert!(!engine.is_dragging());
        assert_eq!(engine.config().shuffle_nonce, 1);
        let after: Vec<_> = engine.tiles().iter().map(Tile::position).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn outlines_are_shared_between_equal_shapes() {
        let engine = engine();
        for id in 0..engine.tiles().len() {
            engine.outline(id);
        }
        let first = engine.outline_builds();
        engine.snapshot();
        assert_eq!(engine.outline_builds(), first);
        assert!(first <= engine.tiles().len());
    }

    #[test]
    fn tile_at_respects_paint_order() {
        let mut engine = engine();
        engine.place(0, 0.0, 0.0, 0);
        engine.place(1, 10.0, 0.0, 0);
        assert_eq!(engine.tile_at(55.0, 50.0), Some(1));
        let (x, y) = engine.tile(0).unwrap().position();
        engine.begin_drag(0, x, y);
        assert_eq!(engine.tile_at(55.0, 50.0), Some(0));
    }
}
