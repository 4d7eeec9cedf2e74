use jigsnap_core::{build_edges, build_edges_for_seed, EdgeSign, GridSize, SeededRandom};
use proptest::prelude::*;

fn assert_interlocked(grid: GridSize, seed: &str) {
    let matrix = build_edges_for_seed(seed, grid);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let cell = matrix.get(row, col).unwrap();
            if row > 0 {
                let above = matrix.get(row - 1, col).unwrap();
                assert_eq!(cell.top, -above.bottom, "row {row} col {col}");
                assert_ne!(cell.top, EdgeSign::Flat);
            }
            if col > 0 {
                let before = matrix.get(row, col - 1).unwrap();
                assert_eq!(cell.left, -before.right, "row {row} col {col}");
                assert_ne!(cell.left, EdgeSign::Flat);
            }
        }
    }
}

#[test]
fn same_seed_builds_identical_matrices() {
    let grid = GridSize::new(3, 2);
    let first = build_edges_for_seed("img1|3x2", grid);
    let second = build_edges_for_seed("img1|3x2", grid);
    assert_eq!(first, second);
}

#[test]
fn explicit_rng_matches_seed_helper() {
    let grid = GridSize::new(5, 4);
    let mut rng = SeededRandom::from_seed_str("cat.png|5x4");
    assert_eq!(build_edges(grid, &mut rng), build_edges_for_seed("cat.png|5x4", grid));
}

#[test]
fn shared_sides_are_complementary() {
    assert_interlocked(GridSize::new(3, 2), "img1|3x2");
    assert_interlocked(GridSize::new(10, 8), "landscape|10x8");
}

#[test]
fn border_sides_are_flat() {
    let grid = GridSize::new(6, 5);
    let matrix = build_edges_for_seed("borders", grid);
    for col in 0..grid.cols {
        assert_eq!(matrix.get(0, col).unwrap().top, EdgeSign::Flat);
        assert_eq!(matrix.get(grid.rows - 1, col).unwrap().bottom, EdgeSign::Flat);
    }
    for row in 0..grid.rows {
        assert_eq!(matrix.get(row, 0).unwrap().left, EdgeSign::Flat);
        assert_eq!(matrix.get(row, grid.cols - 1).unwrap().right, EdgeSign::Flat);
    }
    assert!(matrix.is_consistent());
}

#[test]
fn different_seeds_usually_differ() {
    let grid = GridSize::new(8, 8);
    let a = build_edges_for_seed("a|8x8", grid);
    let b = build_edges_for_seed("b|8x8", grid);
    assert_ne!(a, b);
}

#[test]
fn both_signs_appear_on_larger_grids() {
    let matrix = build_edges_for_seed("mix|12x12", GridSize::new(12, 12));
    let tabs = matrix.cells().iter().filter(|c| c.right == EdgeSign::Tab).count();
    let blanks = matrix.cells().iter().filter(|c| c.right == EdgeSign::Blank).count();
    assert!(tabs > 20);
    assert!(blanks > 20);
}

proptest! {
    #[test]
    fn any_seed_and_grid_is_consistent(seed in ".{0,24}", cols in 1u32..12, rows in 1u32..12) {
        let grid = GridSize::new(cols, rows);
        let matrix = build_edges_for_seed(&seed, grid);
        prop_assert_eq!(matrix.cells().len(), grid.total());
        prop_assert!(matrix.is_consistent());
        prop_assert_eq!(matrix, build_edges_for_seed(&seed, grid));
    }
}
