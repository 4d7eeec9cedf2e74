use proptest::prelude::*;

use jigsnap::{EngineConfig, PuzzleEngine};

fn engine(cols: u32, rows: u32, nonce: u32) -> PuzzleEngine {
    PuzzleEngine::new(EngineConfig {
        image_url: "props".to_string(),
        cols,
        rows,
        board_width: cols as f32 * 80.0,
        board_height: rows as f32 * 60.0,
        shuffle_nonce: nonce,
        ..EngineConfig::default()
    })
}

proptest! {
    #[test]
    fn dragged_tiles_stay_on_stage(
        cols in 1u32..6,
        rows in 1u32..6,
        nonce in any::<u32>(),
        pick in any::<usize>(),
        moves in prop::collection::vec((-5000.0f32..5000.0, -5000.0f32..5000.0), 1..12),
    ) {
        let mut engine = engine(cols, rows, nonce);
        let id = pick % engine.tiles().len();
        let (x, y) = engine.tile(id).unwrap().position();
        prop_assert!(engine.begin_drag(id, x, y));
        let stage = engine.state().extended_bounds();
        for (mx, my) in moves {
            engine.drag_move(mx, my);
            let tile = engine.tile(id).unwrap();
            prop_assert!(tile.x() >= stage.min_x - 1e-3);
            prop_assert!(tile.y() >= stage.min_y - 1e-3);
            prop_assert!(tile.x() + engine.state().tile_width() <= stage.max_x + 1e-3);
            prop_assert!(tile.y() + engine.state().tile_height() <= stage.max_y + 1e-3);
        }
        engine.end_drag();
        prop_assert!(!engine.is_dragging());
    }

    #[test]
    fn locked_tiles_sit_exactly_in_their_slots(
        cols in 1u32..5,
        rows in 1u32..5,
        nonce in any::<u32>(),
        drops in prop::collection::vec((any::<usize>(), -30.0f32..30.0, -30.0f32..30.0), 1..16),
    ) {
        let mut engine = engine(cols, rows, nonce);
        let total = engine.tiles().len();
        for (pick, dx, dy) in drops {
            let id = pick % total;
            let Some(tile) = engine.tile(id) else { continue };
            let (x, y) = tile.position();
            if !engine.begin_drag(id, x, y) {
                continue;
            }
            let (sx, sy) = engine.state().slot_of(id);
            engine.drag_move(sx + dx, sy + dy);
            engine.end_drag();
        }
        for tile in engine.tiles() {
            if tile.locked() {
                prop_assert_eq!(tile.position(), engine.state().slot_of(tile.id()));
                prop_assert_eq!(tile.angle(), 0);
            }
        }
        let (locked, all) = engine.progress();
        prop_assert_eq!(all, total);
        prop_assert_eq!(engine.solved(), locked == total);
    }

    #[test]
    fn group_members_keep_slot_spacing(
        nonce in any::<u32>(),
        drops in prop::collection::vec((any::<usize>(), -12.0f32..12.0, -12.0f32..12.0), 1..24),
    ) {
        let mut engine = engine(4, 3, nonce);
        let total = engine.tiles().len();
        // park tiles off their slots at a uniform offset so neighbors meet
        for id in 0..total {
            let (sx, sy) = engine.state().slot_of(id);
            engine.place(id, sx + 40.0, sy + 40.0, 0);
        }
        for (pick, dx, dy) in drops {
            let id = pick % total;
            let (x, y) = engine.tile(id).unwrap().position();
            if !engine.begin_drag(id, x, y) {
                continue;
            }
            engine.drag_move(x + dx, y + dy);
            engine.end_drag();
        }
        let state = engine.state();
        for a in 0..total {
            for b in 0..total {
                if a == b || state.group_of(a) != state.group_of(b) {
                    continue;
                }
                let ta = state.tile(a).unwrap();
                let tb = state.tile(b).unwrap();
                if ta.locked() != tb.locked() {
                    continue;
                }
                let (sax, say) = state.slot_of(a);
                let (sbx, sby) = state.slot_of(b);
                prop_assert!(((tb.x() - ta.x()) - (sbx - sax)).abs() < 1e-2);
                prop_assert!(((tb.y() - ta.y()) - (sby - say)).abs() < 1e-2);
            }
        }
    }
}
