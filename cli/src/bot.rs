use std::cell::Cell;
use std::rc::Rc;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use jigsnap::{EngineSnapshot, PuzzleEngine, TileId};

use super::*;

#[derive(clap::Subcommand)]
pub(super) enum BotCommand {
    /// Assemble a dealt puzzle by dragging groups toward their slots.
    Run {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 2000)]
        max_releases: usize,
        #[arg(long, default_value_t = 6)]
        drag_steps: usize,
        #[arg(long, default_value_t = 4.0)]
        jitter_px: f32,
        /// Chance that a drop lands short of the slot.
        #[arg(long, default_value_t = 0.15)]
        miss_rate: f32,
        #[arg(long, default_value_t = 30.0)]
        miss_min_px: f32,
        #[arg(long, default_value_t = 120.0)]
        miss_max_px: f32,
        /// Chance of picking a border group while any is left.
        #[arg(long, default_value_t = 0.7)]
        border_bias: f32,
        /// Print every release as a JSON line.
        #[arg(long)]
        trace: bool,
    },
}

#[derive(Clone, Copy, Debug)]
struct BotConfig {
    max_releases: usize,
    drag_steps: usize,
    jitter_px: f32,
    miss_rate: f32,
    miss_min_px: f32,
    miss_max_px: f32,
    border_bias: f32,
    trace: bool,
}

#[derive(Debug, Default, Serialize)]
struct BotSummary {
    seed: String,
    releases: usize,
    merges: usize,
    locked: usize,
    rotations: usize,
    frames: usize,
    groups: usize,
    solved: bool,
}

pub(super) fn run(command: BotCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        BotCommand::Run {
            puzzle,
            seed,
            max_releases,
            drag_steps,
            jitter_px,
            miss_rate,
            miss_min_px,
            miss_max_px,
            border_bias,
            trace,
        } => {
            let config = BotConfig {
                max_releases,
                drag_steps,
                jitter_px,
                miss_rate,
                miss_min_px,
                miss_max_px,
                border_bias,
                trace,
            };
            validate_bot_config(config)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            let mut engine = PuzzleEngine::new(puzzle.engine_config()?);
            let summary = solve(&mut engine, config, &mut rng)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

fn validate_bot_config(config: BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.drag_steps == 0 {
        return Err("drag-steps must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&config.miss_rate) {
        return Err("miss-rate must be within [0, 1]".into());
    }
    if !(0.0..=1.0).contains(&config.border_bias) {
        return Err("border-bias must be within [0, 1]".into());
    }
    if !config.jitter_px.is_finite() || config.jitter_px < 0.0 {
        return Err("jitter-px must be a non-negative number".into());
    }
    if !(config.miss_min_px.is_finite()
        && config.miss_max_px.is_finite()
        && 0.0 <= config.miss_min_px
        && config.miss_min_px <= config.miss_max_px)
    {
        return Err("miss range must satisfy 0 <= min <= max".into());
    }
    Ok(())
}

fn solve(
    engine: &mut PuzzleEngine,
    config: BotConfig,
    rng: &mut StdRng,
) -> Result<BotSummary, Box<dyn std::error::Error>> {
    let frames = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&frames);
    let _subscription = engine.subscribe(Rc::new(move |_: &EngineSnapshot| {
        counter.set(counter.get() + 1);
    }));

    let mut summary = BotSummary {
        seed: engine.config().seed_string(),
        ..BotSummary::default()
    };
    while summary.releases < config.max_releases && !engine.solved() {
        let anchors = candidate_anchors(engine);
        let Some(anchor) = choose_anchor(engine, &anchors, config.border_bias, rng) else {
            break;
        };
        let angle = engine.tile(anchor).map_or(0, |tile| tile.angle());
        if angle != 0 && engine.rotate(anchor, 360 - i32::from(angle)) {
            summary.rotations += 1;
        }
        let target = drop_target(engine, anchor, config, rng);
        let outcome = drag_to(engine, anchor, target, config.drag_steps);
        summary.releases += 1;
        summary.merges += outcome.merges.len();
        summary.locked += outcome.locked.len();
        if config.trace {
            let report = ReleaseReport {
                step: summary.releases,
                outcome: &outcome,
                progress: engine.progress(),
                groups: engine.state().group_count(),
                solved: engine.solved(),
            };
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    summary.frames = frames.get();
    summary.groups = engine.state().group_count();
    summary.solved = engine.solved();
    debug!(
        "bot finished after {} releases (solved: {})",
        summary.releases, summary.solved
    );
    Ok(summary)
}

/// One representative tile per floating group: the first unlocked member in
/// merge order. Anchors are listed by ascending tile id.
fn candidate_anchors(engine: &PuzzleEngine) -> Vec<TileId> {
    let state = engine.state();
    state
        .tiles()
        .iter()
        .filter(|tile| !tile.locked())
        .map(|tile| tile.id())
        .filter(|id| {
            state
                .movable_group(*id)
                .first()
                .is_some_and(|first| first == id)
        })
        .collect()
}

fn choose_anchor(
    engine: &PuzzleEngine,
    anchors: &[TileId],
    border_bias: f32,
    rng: &mut StdRng,
) -> Option<TileId> {
    if anchors.is_empty() {
        return None;
    }
    let grid = engine.grid();
    let border: Vec<TileId> = anchors
        .iter()
        .copied()
        .filter(|id| {
            engine.state().movable_group(*id).iter().any(|member| {
                let (row, col) = grid.row_col(*member);
                grid.is_border(row, col)
            })
        })
        .collect();
    if !border.is_empty() && rng.random::<f32>() < border_bias {
        return Some(border[rng.random_range(0..border.len())]);
    }
    Some(anchors[rng.random_range(0..anchors.len())])
}

fn drop_target(
    engine: &PuzzleEngine,
    anchor: TileId,
    config: BotConfig,
    rng: &mut StdRng,
) -> (f32, f32) {
    let (sx, sy) = engine.state().slot_of(anchor);
    if config.miss_max_px > 0.0 && rng.random::<f32>() < config.miss_rate {
        let distance = rng.random_range(config.miss_min_px..=config.miss_max_px);
        let theta = rng.random_range(0.0..std::f32::consts::TAU);
        return (sx + distance * theta.cos(), sy + distance * theta.sin());
    }
    let jitter = config.jitter_px;
    if jitter <= 0.0 {
        return (sx, sy);
    }
    (
        sx + rng.random_range(-jitter..=jitter),
        sy + rng.random_range(-jitter..=jitter),
    )
}

/// Grabs `anchor` by its corner and walks it to `target` in `steps` moves.
fn drag_to(
    engine: &mut PuzzleEngine,
    anchor: TileId,
    target: (f32, f32),
    steps: usize,
) -> SnapOutcome {
    let Some(start) = engine.tile(anchor).map(|tile| tile.position()) else {
        return SnapOutcome::default();
    };
    if !engine.begin_drag(anchor, start.0, start.1) {
        return SnapOutcome::default();
    }
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        engine.drag_move(lerp_f32(start.0, target.0, t), lerp_f32(start.1, target.1, t));
    }
    engine.end_drag()
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot_config() -> BotConfig {
        BotConfig {
            max_releases: 400,
            drag_steps: 4,
            jitter_px: 3.0,
            miss_rate: 0.0,
            miss_min_px: 0.0,
            miss_max_px: 0.0,
            border_bias: 0.7,
            trace: false,
        }
    }

    fn engine() -> PuzzleEngine {
        PuzzleEngine::new(EngineConfig {
            image_url: "bot".to_string(),
            cols: 4,
            rows: 3,
            board_width: 400.0,
            board_height: 300.0,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn precise_bot_solves_the_puzzle() {
        let mut engine = engine();
        let mut rng = StdRng::seed_from_u64(42);
        let summary = solve(&mut engine, bot_config(), &mut rng).unwrap();
        assert!(summary.solved);
        assert_eq!(summary.locked, 12);
        assert!(summary.releases <= 12);
        assert!(summary.frames > summary.releases);
    }

    #[test]
    fn anchors_cover_each_floating_group_once() {
        let mut engine = engine();
        let (x, y) = engine.tile(0).unwrap().position();
        engine.begin_drag(0, x, y);
        engine.drag_move(0.0, 0.0);
        engine.end_drag();
        let anchors = candidate_anchors(&engine);
        assert_eq!(anchors.len(), 11);
        assert!(!anchors.contains(&0));
    }

    #[test]
    fn merged_group_is_anchored_by_its_first_member() {
        let mut engine = engine();
        engine.place(3, -150.0, -150.0, 0);
        engine.place(6, 500.0, -150.0, 0);
        engine.place(1, 150.0, 350.0, 0);
        engine.place(2, 250.0, 350.0, 0);
        let (x, y) = engine.tile(2).unwrap().position();
        engine.begin_drag(2, x, y);
        engine.drag_move(250.0, 352.0);
        let outcome = engine.end_drag();
        assert_eq!(outcome.merges, vec![(2, 1)]);

        let anchors = candidate_anchors(&engine);
        assert_eq!(engine.state().movable_group(1), vec![2, 1]);
        assert!(anchors.contains(&2));
        assert!(!anchors.contains(&1));
        assert_eq!(anchors.len(), 11);
        assert!(anchors.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn rejects_inverted_miss_range() {
        let config = BotConfig {
            miss_min_px: 50.0,
            miss_max_px: 10.0,
            ..bot_config()
        };
        assert!(validate_bot_config(config).is_err());
    }
}
