pub mod edges;
pub mod geometry;
pub mod grid;
pub mod random;
pub mod shape;

pub use edges::{build_edges, build_edges_for_seed, CellEdges, EdgeMatrix, EdgeSign};
pub use geometry::{angles_match, normalize_angle, rotate_vec, Bounds, ROTATION_STEP_DEG};
pub use grid::{slot_position, Direction, GridSize, GridSpecError, FALLBACK_GRID};
pub use random::{hash_seed, scramble_seed, splitmix32, SeededRandom};
pub use shape::{build_piece_path, PiecePath, ShapeCache, KNOB_RATIO_DEFAULT};
