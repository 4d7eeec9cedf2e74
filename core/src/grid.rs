use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const GRID_DIM_MIN: u32 = 1;
pub const GRID_DIM_MAX: u32 = 64;

pub const FALLBACK_GRID: GridSize = GridSize { cols: 4, rows: 3 };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Unit step in (col, row) grid space.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Clamps both dimensions into `[GRID_DIM_MIN, GRID_DIM_MAX]`.
    pub fn clamped(self) -> Self {
        Self {
            cols: self.cols.clamp(GRID_DIM_MIN, GRID_DIM_MAX),
            rows: self.rows.clamp(GRID_DIM_MIN, GRID_DIM_MAX),
        }
    }

    pub fn total(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    pub fn row_col(&self, id: usize) -> (u32, u32) {
        let cols = self.cols.max(1) as usize;
        ((id / cols) as u32, (id % cols) as u32)
    }

    pub fn neighbor(&self, id: usize, dir: Direction) -> Option<usize> {
        if id >= self.total() {
            return None;
        }
        let (row, col) = self.row_col(id);
        match dir {
            Direction::Up if row > 0 => Some(id - self.cols as usize),
            Direction::Right if col + 1 < self.cols => Some(id + 1),
            Direction::Down if row + 1 < self.rows => Some(id + self.cols as usize),
            Direction::Left if col > 0 => Some(id - 1),
            _ => None,
        }
    }

    pub fn is_border(&self, row: u32, col: u32) -> bool {
        row == 0 || row + 1 == self.rows || col == 0 || col + 1 == self.cols
    }

    /// Seed string for an image on this grid, e.g. `"img1|3x2"`.
    pub fn seed_string(&self, image: &str) -> String {
        format!("{image}|{self}")
    }
}

impl Default for GridSize {
    fn default() -> Self {
        FALLBACK_GRID
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridSpecError {
    #[error("grid must look like <cols>x<rows>, got {0:?}")]
    Format(String),
    #[error("invalid grid dimension {0:?}")]
    Dimension(String),
    #[error("grid dimensions must be at least 1")]
    Zero,
}

impl FromStr for GridSize {
    type Err = GridSpecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (cols, rows) = trimmed
            .split_once(['x', 'X'])
            .ok_or_else(|| GridSpecError::Format(trimmed.to_string()))?;
        let parse = |raw: &str| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| GridSpecError::Dimension(raw.trim().to_string()))
        };
        let grid = GridSize::new(parse(cols)?, parse(rows)?);
        if grid.cols == 0 || grid.rows == 0 {
            return Err(GridSpecError::Zero);
        }
        Ok(grid)
    }
}

/// Top-left corner of the home slot of `(row, col)`.
pub fn slot_position(row: u32, col: u32, tile_width: f32, tile_height: f32) -> (f32, f32) {
    (col as f32 * tile_width, row as f32 * tile_height)
}
