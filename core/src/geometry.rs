pub const ROTATION_STEP_DEG: u16 = 90;

/// Normalizes any whole-degree angle into `[0, 360)`.
pub fn normalize_angle(angle: i32) -> u16 {
    angle.rem_euclid(360) as u16
}

/// Rounds an arbitrary degree delta to the nearest quarter turn.
pub fn snap_to_quarter(angle: i32) -> i32 {
    let step = i32::from(ROTATION_STEP_DEG);
    let half = step / 2;
    if angle >= 0 {
        (angle + half) / step * step
    } else {
        -((-angle + half) / step * step)
    }
}

pub fn angles_match(a: u16, b: u16) -> bool {
    normalize_angle(i32::from(a)) == normalize_angle(i32::from(b))
}

/// Rotates a vector clockwise (screen space, y down) by a quarter-turn angle.
/// Exact for multiples of 90 degrees; other angles fall back to the nearest
/// quarter turn.
pub fn rotate_vec(x: f32, y: f32, angle_deg: u16) -> (f32, f32) {
    let turns = (snap_to_quarter(i32::from(angle_deg)) / i32::from(ROTATION_STEP_DEG)).rem_euclid(4);
    match turns {
        0 => (x, y),
        1 => (-y, x),
        2 => (-x, -y),
        _ => (y, -x),
    }
}

pub fn rotate_point(x: f32, y: f32, origin_x: f32, origin_y: f32, angle_deg: u16) -> (f32, f32) {
    let (rx, ry) = rotate_vec(x - origin_x, y - origin_y, angle_deg);
    (origin_x + rx, origin_y + ry)
}

/// Axis-aligned rectangle in board space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    pub fn include(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Shift that moves `inner` inside `self` along each axis, or centers it
    /// on an axis where it does not fit.
    pub fn containing_shift(&self, inner: &Bounds) -> (f32, f32) {
        let axis = |lo: f32, hi: f32, min: f32, max: f32| {
            if hi - lo > max - min {
                (min + max) * 0.5 - (lo + hi) * 0.5
            } else if lo < min {
                min - lo
            } else if hi > max {
                max - hi
            } else {
                0.0
            }
        };
        (
            axis(inner.min_x, inner.max_x, self.min_x, self.max_x),
            axis(inner.min_y, inner.max_y, self.min_y, self.max_y),
        )
    }
}
