use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use jigsnap::{EngineAction, EngineConfig, PuzzleEngine, SnapOutcome};
use jigsnap_core::{Direction, EdgeMatrix, EdgeSign, GridSize};

mod bot;

#[derive(Parser)]
#[command(name = "jigsnap-cli", version, about = "Headless tools for the jigsnap puzzle engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the interlock pattern for an image and grid.
    Edges {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[arg(long)]
        json: bool,
    },
    /// Emit piece outlines as an SVG document.
    Svg {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[arg(long)]
        tile: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        gap: f32,
    },
    /// Replay a JSON array of engine actions and report every release.
    Simulate {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[arg(long)]
        script: PathBuf,
    },
    Bot {
        #[command(subcommand)]
        command: bot::BotCommand,
    },
}

#[derive(Args, Clone, Debug)]
pub(crate) struct PuzzleArgs {
    /// TOML engine configuration; flags below override it.
    #[arg(long, env = "JIGSNAP_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "JIGSNAP_IMAGE")]
    image: Option<String>,
    /// Grid as `<cols>x<rows>`.
    #[arg(long, env = "JIGSNAP_GRID")]
    grid: Option<GridSize>,
    #[arg(long)]
    board_width: Option<f32>,
    #[arg(long)]
    board_height: Option<f32>,
    #[arg(long, env = "JIGSNAP_SNAP_TOLERANCE")]
    snap_tolerance: Option<f32>,
    #[arg(long)]
    rotation_mode: bool,
    #[arg(long)]
    nonce: Option<u32>,
    #[arg(long, conflicts_with = "nonce")]
    random_nonce: bool,
}

impl PuzzleArgs {
    pub(crate) fn engine_config(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml_str(&fs::read_to_string(path)?)?,
            None => EngineConfig::default(),
        };
        if let Some(image) = &self.image {
            config.image_url = image.clone();
        }
        if let Some(grid) = self.grid {
            config.cols = grid.cols;
            config.rows = grid.rows;
        }
        if let Some(width) = self.board_width {
            config.board_width = width;
        }
        if let Some(height) = self.board_height {
            config.board_height = height;
        }
        if let Some(tolerance) = self.snap_tolerance {
            config.snap_tolerance = tolerance;
        }
        if self.rotation_mode {
            config.rotation_mode = true;
        }
        if let Some(nonce) = self.nonce {
            config.shuffle_nonce = nonce;
        } else if self.random_nonce {
            config.shuffle_nonce = rand::rng().random();
        }
        let sanitized = config.clone().sanitized();
        if sanitized != config {
            warn!("configuration clamped to supported ranges");
        }
        Ok(sanitized)
    }
}

#[derive(Serialize)]
struct ReleaseReport<'a> {
    step: usize,
    #[serde(flatten)]
    outcome: &'a SnapOutcome,
    progress: (usize, usize),
    groups: usize,
    solved: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Edges { puzzle, json } => {
            let engine = PuzzleEngine::new(puzzle.engine_config()?);
            if json {
                println!("{}", serde_json::to_string_pretty(engine.edges())?);
            } else {
                println!("seed: {}", engine.config().seed_string());
                print!("{}", render_edges(engine.edges()));
            }
        }
        Commands::Svg { puzzle, tile, gap } => {
            let engine = PuzzleEngine::new(puzzle.engine_config()?);
            println!("{}", render_svg(&engine, tile, gap)?);
        }
        Commands::Simulate { puzzle, script } => {
            let mut engine = PuzzleEngine::new(puzzle.engine_config()?);
            let actions: Vec<EngineAction> = serde_json::from_str(&fs::read_to_string(&script)?)?;
            info!(
                "replaying {} actions on {}",
                actions.len(),
                engine.config().seed_string()
            );
            for (step, action) in actions.into_iter().enumerate() {
                if let Some(outcome) = engine.apply_action(action) {
                    let report = ReleaseReport {
                        step,
                        outcome: &outcome,
                        progress: engine.progress(),
                        groups: engine.state().group_count(),
                        solved: engine.solved(),
                    };
                    println!("{}", serde_json::to_string(&report)?);
                }
            }
        }
        Commands::Bot { command } => bot::run(command)?,
    }

    Ok(())
}

fn sign_char(sign: EdgeSign) -> char {
    match sign {
        EdgeSign::Tab => '+',
        EdgeSign::Blank => '-',
        EdgeSign::Flat => '.',
    }
}

/// One line per grid row; each cell reads top, right, bottom, left.
fn render_edges(edges: &EdgeMatrix) -> String {
    let mut out = String::new();
    for row in 0..edges.rows() {
        let cells: Vec<String> = (0..edges.cols())
            .filter_map(|col| edges.get(row, col))
            .map(|cell| {
                [Direction::Up, Direction::Right, Direction::Down, Direction::Left]
                    .iter()
                    .map(|dir| sign_char(cell.side(*dir)))
                    .collect()
            })
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

fn render_svg(
    engine: &PuzzleEngine,
    only: Option<usize>,
    gap: f32,
) -> Result<String, Box<dyn std::error::Error>> {
    let state = engine.state();
    let ids: Vec<usize> = match only {
        Some(id) if id < state.len() => vec![id],
        Some(id) => return Err(format!("tile {id} is outside the {} grid", state.grid()).into()),
        None => (0..state.len()).collect(),
    };
    let gap = if gap.is_finite() { gap.max(0.0) } else { 0.0 };
    let mut body = String::new();
    let mut extent = jigsnap_core::Bounds::empty();
    for id in &ids {
        let Some(outline) = engine.outline(*id) else {
            continue;
        };
        let (row, col) = state.grid().row_col(*id);
        let (x, y) = if only.is_some() {
            (0.0, 0.0)
        } else {
            let (sx, sy) = state.slot_of(*id);
            (sx + col as f32 * gap, sy + row as f32 * gap)
        };
        let local = outline.bounds();
        extent.include(x + local.min_x, y + local.min_y);
        extent.include(x + local.max_x, y + local.max_y);
        body.push_str(&format!(
            "  <path data-tile=\"{id}\" transform=\"translate({x} {y})\" d=\"{}\" fill=\"none\" stroke=\"black\"/>\n",
            outline.to_svg_path()
        ));
    }
    Ok(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\">\n{body}</svg>",
        extent.min_x,
        extent.min_y,
        extent.width(),
        extent.height()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigsnap_core::build_edges_for_seed;

    #[test]
    fn edges_render_one_line_per_row() {
        let edges = build_edges_for_seed("img1|3x2", GridSize::new(3, 2));
        let text = render_edges(&edges);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(' ').count(), 3);
        // top-left corner: flat top and left
        assert!(lines[0].starts_with('.'));
        assert_eq!(lines[0].chars().nth(3), Some('.'));
    }

    #[test]
    fn svg_contains_every_tile() {
        let engine = PuzzleEngine::new(EngineConfig {
            image_url: "svg".to_string(),
            cols: 2,
            rows: 2,
            ..EngineConfig::default()
        });
        let svg = render_svg(&engine, None, 4.0).unwrap();
        assert_eq!(svg.matches("<path").count(), 4);
        assert!(render_svg(&engine, Some(9), 0.0).is_err());
    }
}
