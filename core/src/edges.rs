use serde::{Deserialize, Serialize};

use crate::grid::{Direction, GridSize};
use crate::random::SeededRandom;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum EdgeSign {
    Flat = 0,
    Tab = 1,
    Blank = -1,
}

impl EdgeSign {
    pub fn value(self) -> i8 {
        self as i8
    }

    /// The sign a touching neighbor must carry on the shared side.
    pub fn complement(self) -> EdgeSign {
        match self {
            EdgeSign::Flat => EdgeSign::Flat,
            EdgeSign::Tab => EdgeSign::Blank,
            EdgeSign::Blank => EdgeSign::Tab,
        }
    }

    /// True when the two sides interlock: one tab against one blank.
    pub fn interlocks(self, other: EdgeSign) -> bool {
        self != EdgeSign::Flat && other == self.complement()
    }
}

impl std::ops::Neg for EdgeSign {
    type Output = EdgeSign;

    fn neg(self) -> EdgeSign {
        self.complement()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellEdges {
    pub top: EdgeSign,
    pub right: EdgeSign,
    pub bottom: EdgeSign,
    pub left: EdgeSign,
}

impl CellEdges {
    pub const FLAT: CellEdges = CellEdges {
        top: EdgeSign::Flat,
        right: EdgeSign::Flat,
        bottom: EdgeSign::Flat,
        left: EdgeSign::Flat,
    };

    pub fn side(&self, dir: Direction) -> EdgeSign {
        match dir {
            Direction::Up => self.top,
            Direction::Right => self.right,
            Direction::Down => self.bottom,
            Direction::Left => self.left,
        }
    }

    pub fn set_side(&mut self, dir: Direction, sign: EdgeSign) {
        match dir {
            Direction::Up => self.top = sign,
            Direction::Right => self.right = sign,
            Direction::Down => self.bottom = sign,
            Direction::Left => self.left = sign,
        }
    }
}

/// Rows x cols table of cell edge signs. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMatrix {
    grid: GridSize,
    cells: Vec<CellEdges>,
}

impl EdgeMatrix {
    /// Builds a matrix from explicit cells in row-major order. Returns `None`
    /// when the cell count does not match the grid.
    pub fn from_cells(grid: GridSize, cells: Vec<CellEdges>) -> Option<Self> {
        if cells.len() != grid.total() {
            return None;
        }
        Some(Self { grid, cells })
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn rows(&self) -> u32 {
        self.grid.rows
    }

    pub fn cols(&self) -> u32 {
        self.grid.cols
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellEdges> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        self.cells.get(self.grid.index(row, col))
    }

    pub fn cell(&self, id: usize) -> Option<&CellEdges> {
        self.cells.get(id)
    }

    pub fn cells(&self) -> &[CellEdges] {
        &self.cells
    }

    /// Checks border flatness and complementarity of every shared side.
    pub fn is_consistent(&self) -> bool {
        for row in 0..self.grid.rows {
            for col in 0..self.grid.cols {
                let Some(cell) = self.get(row, col) else {
                    return false;
                };
                if row == 0 && cell.top != EdgeSign::Flat {
                    return false;
                }
                if col == 0 && cell.left != EdgeSign::Flat {
                    return false;
                }
                if row + 1 == self.grid.rows && cell.bottom != EdgeSign::Flat {
                    return false;
                }
                if col + 1 == self.grid.cols && cell.right != EdgeSign::Flat {
                    return false;
                }
                if row > 0 {
                    let above = self.get(row - 1, col).map(|c| c.bottom);
                    if above.map(|sign| -sign) != Some(cell.top) {
                        return false;
                    }
                }
                if col > 0 {
                    let before = self.get(row, col - 1).map(|c| c.right);
                    if before.map(|sign| -sign) != Some(cell.left) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn random_sign(rng: &mut SeededRandom) -> EdgeSign {
    if rng.next_f64() > 0.5 {
        EdgeSign::Tab
    } else {
        EdgeSign::Blank
    }
}

/// Fills the matrix in row-major order. Each cell draws its right side and
/// then its bottom side; top and left are copied (negated) from the cells
/// above and before it, and outer sides stay flat.
pub fn build_edges(grid: GridSize, rng: &mut SeededRandom) -> EdgeMatrix {
    let total = grid.total();
    let mut cells: Vec<CellEdges> = Vec::with_capacity(total);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let top = if row == 0 {
                EdgeSign::Flat
            } else {
                -cells[grid.index(row - 1, col)].bottom
            };
            let left = if col == 0 {
                EdgeSign::Flat
            } else {
                -cells[grid.index(row, col - 1)].right
            };
            let right = if col + 1 == grid.cols {
                EdgeSign::Flat
            } else {
                random_sign(rng)
            };
            let bottom = if row + 1 == grid.rows {
                EdgeSign::Flat
            } else {
                random_sign(rng)
            };
            cells.push(CellEdges {
                top,
                right,
                bottom,
                left,
            });
        }
    }
    EdgeMatrix { grid, cells }
}

pub fn build_edges_for_seed(seed: &str, grid: GridSize) -> EdgeMatrix {
    let mut rng = SeededRandom::from_seed_str(seed);
    build_edges(grid, &mut rng)
}
