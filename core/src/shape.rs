use std::collections::HashMap;
use std::fmt::Write;
use std::rc::Rc;

use crate::edges::{CellEdges, EdgeSign};
use crate::geometry::Bounds;
use crate::grid::Direction;

pub const KNOB_RATIO_DEFAULT: f32 = 0.22;
pub const KNOB_RATIO_MIN: f32 = 0.05;
pub const KNOB_RATIO_MAX: f32 = 0.45;
pub const ARC_STEPS: usize = 16;

const SIDE_ORDER: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

pub(crate) fn fmt_f32(value: f32) -> String {
    let mut text = format!("{:.3}", value);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Start corner, unit direction along the side, and outward normal for a
/// clockwise walk around a `width` x `height` cell.
fn side_frame(dir: Direction, width: f32, height: f32) -> ((f32, f32), (f32, f32), (f32, f32), f32) {
    let (start, along, len) = match dir {
        Direction::Up => ((0.0, 0.0), (1.0, 0.0), width),
        Direction::Right => ((width, 0.0), (0.0, 1.0), height),
        Direction::Down => ((width, height), (-1.0, 0.0), width),
        Direction::Left => ((0.0, height), (0.0, -1.0), height),
    };
    let outward = (along.1, -along.0);
    (start, along, outward, len)
}

fn frame_point(
    start: (f32, f32),
    along: (f32, f32),
    outward: (f32, f32),
    t: f32,
    d: f32,
) -> (f32, f32) {
    (
        start.0 + along.0 * t + outward.0 * d,
        start.1 + along.1 * t + outward.1 * d,
    )
}

/// Unit half-circle samples `(cos, sin)` for `k / ARC_STEPS` of a half turn,
/// mirrored so sample `k` and `ARC_STEPS - k` agree exactly up to the sign of
/// the cosine.
fn arc_unit(k: usize) -> (f32, f32) {
    if k * 2 == ARC_STEPS {
        return (0.0, 1.0);
    }
    let mirrored = k * 2 > ARC_STEPS;
    let base = if mirrored { ARC_STEPS - k } else { k };
    let phi = std::f32::consts::PI * base as f32 / ARC_STEPS as f32;
    let (sin, cos) = phi.sin_cos();
    if mirrored {
        (-cos, sin)
    } else {
        (cos, sin)
    }
}

/// Line-to targets for one side, excluding its start corner.
fn side_points(dir: Direction, sign: EdgeSign, width: f32, height: f32, radius: f32) -> Vec<(f32, f32)> {
    let (start, along, outward, len) = side_frame(dir, width, height);
    let end = frame_point(start, along, outward, len, 0.0);
    if sign == EdgeSign::Flat || radius <= 0.0 {
        return vec![end];
    }
    let bulge = f32::from(sign.value());
    let mid = len * 0.5;
    let mut points = Vec::with_capacity(ARC_STEPS + 2);
    for k in 0..=ARC_STEPS {
        let (cos, sin) = arc_unit(k);
        let t = mid - radius * cos;
        let d = bulge * radius * sin;
        points.push(frame_point(start, along, outward, t, d));
    }
    points.push(end);
    points
}

/// Closed outline of one piece in its own local frame: the cell rectangle is
/// `(0, 0)..(width, height)` and knobs may protrude outside it.
#[derive(Clone, Debug, PartialEq)]
pub struct PiecePath {
    width: f32,
    height: f32,
    radius: f32,
    edges: CellEdges,
    sides: [Vec<(f32, f32)>; 4],
}

impl PiecePath {
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn knob_radius(&self) -> f32 {
        self.radius
    }

    pub fn edges(&self) -> CellEdges {
        self.edges
    }

    fn side_index(dir: Direction) -> usize {
        match dir {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn side_start(&self, dir: Direction) -> (f32, f32) {
        side_frame(dir, self.width, self.height).0
    }

    /// Sampled points of one side, starting at its start corner.
    pub fn side_points(&self, dir: Direction) -> Vec<(f32, f32)> {
        let side = &self.sides[Self::side_index(dir)];
        let mut points = Vec::with_capacity(side.len() + 1);
        points.push(self.side_start(dir));
        points.extend_from_slice(side);
        points
    }

    /// Clockwise polyline of the whole outline, starting at the top-left
    /// corner. The closing point is not repeated.
    pub fn outline_points(&self) -> Vec<(f32, f32)> {
        let total = self.sides.iter().map(Vec::len).sum::<usize>();
        let mut points = Vec::with_capacity(total);
        points.push((0.0, 0.0));
        for side in &self.sides {
            points.extend_from_slice(side);
        }
        points.pop();
        points
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        bounds.include(0.0, 0.0);
        for side in &self.sides {
            for &(x, y) in side {
                bounds.include(x, y);
            }
        }
        bounds
    }

    /// Even-odd hit test against the sampled outline.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let points = self.outline_points();
        let mut inside = false;
        let mut j = points.len().saturating_sub(1);
        for i in 0..points.len() {
            let (xi, yi) = points[i];
            let (xj, yj) = points[j];
            if (yi > y) != (yj > y) {
                let cross_x = xj + (y - yj) * (xi - xj) / (yi - yj);
                if x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn append_side_svg(&self, path: &mut String, dir: Direction) {
        let sign = self.edges.side(dir);
        let side = &self.sides[Self::side_index(dir)];
        if sign == EdgeSign::Flat || self.radius <= 0.0 {
            if let Some(&(x, y)) = side.last() {
                let _ = write!(path, " L {} {}", fmt_f32(x), fmt_f32(y));
            }
            return;
        }
        let sweep = if sign == EdgeSign::Tab { 1 } else { 0 };
        let arc_start = side[0];
        let arc_end = side[ARC_STEPS];
        let end = side[side.len() - 1];
        let r = fmt_f32(self.radius);
        let _ = write!(path, " L {} {}", fmt_f32(arc_start.0), fmt_f32(arc_start.1));
        let _ = write!(
            path,
            " A {r} {r} 0 0 {sweep} {} {}",
            fmt_f32(arc_end.0),
            fmt_f32(arc_end.1)
        );
        let _ = write!(path, " L {} {}", fmt_f32(end.0), fmt_f32(end.1));
    }

    /// SVG path data for the closed outline, using exact circular arcs.
    pub fn to_svg_path(&self) -> String {
        let mut path = String::from("M 0 0");
        for dir in SIDE_ORDER {
            self.append_side_svg(&mut path, dir);
        }
        path.push_str(" Z");
        path
    }

    /// SVG path data for a single side, open at both ends.
    pub fn side_svg_path(&self, dir: Direction) -> String {
        let (x, y) = self.side_start(dir);
        let mut path = String::new();
        let _ = write!(path, "M {} {}", fmt_f32(x), fmt_f32(y));
        self.append_side_svg(&mut path, dir);
        path
    }
}

/// Builds the outline for one cell. `knob_ratio` scales the knob radius
/// against the shorter cell dimension and is clamped to
/// `[KNOB_RATIO_MIN, KNOB_RATIO_MAX]`.
pub fn build_piece_path(width: f32, height: f32, edges: CellEdges, knob_ratio: f32) -> PiecePath {
    let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
    let ratio = if knob_ratio.is_finite() {
        knob_ratio.clamp(KNOB_RATIO_MIN, KNOB_RATIO_MAX)
    } else {
        KNOB_RATIO_DEFAULT
    };
    let radius = width.min(height) * ratio;
    let sides = SIDE_ORDER.map(|dir| side_points(dir, edges.side(dir), width, height, radius));
    PiecePath {
        width,
        height,
        radius,
        edges,
        sides,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    edges: CellEdges,
    width_bits: u32,
    height_bits: u32,
    knob_bits: u32,
}

/// Memoises outlines by edge signs and dimensions. Pieces that share a key
/// share one `Rc<PiecePath>`.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: HashMap<ShapeKey, Rc<PiecePath>>,
    builds: usize,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &mut self,
        width: f32,
        height: f32,
        edges: CellEdges,
        knob_ratio: f32,
    ) -> Rc<PiecePath> {
        let key = ShapeKey {
            edges,
            width_bits: width.to_bits(),
            height_bits: height.to_bits(),
            knob_bits: knob_ratio.to_bits(),
        };
        if let Some(path) = self.shapes.get(&key) {
            return Rc::clone(path);
        }
        self.builds += 1;
        let path = Rc::new(build_piece_path(width, height, edges, knob_ratio));
        self.shapes.insert(key, Rc::clone(&path));
        path
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of outlines actually generated (cache misses).
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_trims_trailing_zeros() {
        assert_eq!(fmt_f32(10.0), "10");
        assert_eq!(fmt_f32(2.5), "2.5");
        assert_eq!(fmt_f32(-0.0001), "0");
        assert_eq!(fmt_f32(1.23456), "1.235");
    }

    #[test]
    fn arc_samples_are_mirrored() {
        for k in 0..=ARC_STEPS {
            let (cos_a, sin_a) = arc_unit(k);
            let (cos_b, sin_b) = arc_unit(ARC_STEPS - k);
            assert_eq!(cos_a, -cos_b);
            assert_eq!(sin_a, sin_b);
        }
        assert_eq!(arc_unit(ARC_STEPS / 2), (0.0, 1.0));
    }

    #[test]
    fn flat_piece_is_a_rectangle() {
        let path = build_piece_path(100.0, 80.0, CellEdges::FLAT, KNOB_RATIO_DEFAULT);
        assert_eq!(
            path.outline_points(),
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)]
        );
        assert_eq!(path.to_svg_path(), "M 0 0 L 100 0 L 100 80 L 0 80 L 0 0 Z");
    }

    #[test]
    fn cache_shares_identical_keys() {
        let mut cache = ShapeCache::new();
        let a = cache.get_or_build(50.0, 50.0, CellEdges::FLAT, 0.22);
        let b = cache.get_or_build(50.0, 50.0, CellEdges::FLAT, 0.22);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.builds(), 1);
        let _ = cache.get_or_build(60.0, 50.0, CellEdges::FLAT, 0.22);
        assert_eq!(cache.builds(), 2);
        assert_eq!(cache.len(), 2);
    }
}
