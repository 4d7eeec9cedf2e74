//! Jigsaw puzzle engine: tile state, drag handling, slot locking and the
//! neighbor merge cascade, on top of the seeded geometry in `jigsnap-core`.

pub mod action;
pub mod config;
pub mod drag;
pub mod engine;
pub mod groups;
pub mod snap;
pub mod state;
pub mod view;

pub use action::EngineAction;
pub use config::{ConfigError, EngineConfig};
pub use drag::{DragController, DragSession};
pub use engine::{EngineSubscriber, PuzzleEngine, Subscription};
pub use groups::{DisjointSet, GroupId, TileId};
pub use snap::{SnapEngine, SnapOutcome};
pub use state::{PuzzleState, Tile, TileState};
pub use view::{EngineSnapshot, TileView};

pub use jigsnap_core;
