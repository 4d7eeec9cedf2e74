use serde::{Deserialize, Serialize};

use jigsnap_core::grid::{GridSize, GRID_DIM_MAX, GRID_DIM_MIN};
use jigsnap_core::shape::{KNOB_RATIO_DEFAULT, KNOB_RATIO_MAX, KNOB_RATIO_MIN};

pub const SNAP_TOLERANCE_MIN: f32 = 6.0;
pub const SNAP_TOLERANCE_MAX: f32 = 64.0;
pub const SNAP_TOLERANCE_DEFAULT: f32 = 22.0;

pub const MERGE_TOLERANCE_FLOOR: f32 = 10.0;
pub const MERGE_TOLERANCE_RATIO: f32 = 0.18;

pub const BOARD_WIDTH_DEFAULT: f32 = 960.0;
pub const BOARD_HEIGHT_DEFAULT: f32 = 640.0;

pub const STAGE_MARGIN_RATIO_DEFAULT: f32 = 1.6;
pub const STAGE_MARGIN_RATIO_MIN: f32 = 1.1;
pub const STAGE_MARGIN_RATIO_MAX: f32 = 4.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize engine config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Options recognized from the surrounding UI. Out-of-range values are
/// clamped by [`EngineConfig::sanitized`] rather than rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub image_url: String,
    pub rows: u32,
    pub cols: u32,
    pub snap_tolerance: f32,
    pub edges_only: bool,
    pub rotation_mode: bool,
    pub capture_mode: bool,
    pub board_width: f32,
    pub board_height: f32,
    pub knob_ratio: f32,
    pub stage_margin_ratio: f32,
    pub shuffle_nonce: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            rows: jigsnap_core::FALLBACK_GRID.rows,
            cols: jigsnap_core::FALLBACK_GRID.cols,
            snap_tolerance: SNAP_TOLERANCE_DEFAULT,
            edges_only: false,
            rotation_mode: false,
            capture_mode: false,
            board_width: BOARD_WIDTH_DEFAULT,
            board_height: BOARD_HEIGHT_DEFAULT,
            knob_ratio: KNOB_RATIO_DEFAULT,
            stage_margin_ratio: STAGE_MARGIN_RATIO_DEFAULT,
            shuffle_nonce: 0,
        }
    }
}

pub fn sanitize_snap_tolerance(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(SNAP_TOLERANCE_MIN, SNAP_TOLERANCE_MAX)
    } else {
        SNAP_TOLERANCE_DEFAULT
    }
}

fn sanitize_extent(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        Ok(config.sanitized())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn sanitized(mut self) -> Self {
        let grid = self.grid();
        self.cols = grid.cols;
        self.rows = grid.rows;
        self.snap_tolerance = sanitize_snap_tolerance(self.snap_tolerance);
        self.board_width = sanitize_extent(self.board_width, BOARD_WIDTH_DEFAULT);
        self.board_height = sanitize_extent(self.board_height, BOARD_HEIGHT_DEFAULT);
        self.knob_ratio = if self.knob_ratio.is_finite() {
            self.knob_ratio.clamp(KNOB_RATIO_MIN, KNOB_RATIO_MAX)
        } else {
            KNOB_RATIO_DEFAULT
        };
        self.stage_margin_ratio = if self.stage_margin_ratio.is_finite() {
            self.stage_margin_ratio
                .clamp(STAGE_MARGIN_RATIO_MIN, STAGE_MARGIN_RATIO_MAX)
        } else {
            STAGE_MARGIN_RATIO_DEFAULT
        };
        self
    }

    pub fn grid(&self) -> GridSize {
        GridSize::new(
            self.cols.clamp(GRID_DIM_MIN, GRID_DIM_MAX),
            self.rows.clamp(GRID_DIM_MIN, GRID_DIM_MAX),
        )
    }

    pub fn tile_width(&self) -> f32 {
        sanitize_extent(self.board_width, BOARD_WIDTH_DEFAULT) / self.grid().cols as f32
    }

    pub fn tile_height(&self) -> f32 {
        sanitize_extent(self.board_height, BOARD_HEIGHT_DEFAULT) / self.grid().rows as f32
    }

    /// Positional tolerance for neighbor merging.
    pub fn merge_tolerance(&self) -> f32 {
        (MERGE_TOLERANCE_RATIO * self.tile_width().min(self.tile_height())).max(MERGE_TOLERANCE_FLOOR)
    }

    pub fn seed_string(&self) -> String {
        self.grid().seed_string(&self.image_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        let config = EngineConfig {
            rows: 0,
            cols: 1000,
            snap_tolerance: f32::NAN,
            board_width: -5.0,
            knob_ratio: 3.0,
            ..EngineConfig::default()
        }
        .sanitized();
        assert_eq!(config.rows, 1);
        assert_eq!(config.cols, GRID_DIM_MAX);
        assert_eq!(config.snap_tolerance, SNAP_TOLERANCE_DEFAULT);
        assert_eq!(config.board_width, BOARD_WIDTH_DEFAULT);
        assert_eq!(config.knob_ratio, KNOB_RATIO_MAX);
    }

    #[test]
    fn snap_tolerance_is_bounded() {
        assert_eq!(sanitize_snap_tolerance(1.0), SNAP_TOLERANCE_MIN);
        assert_eq!(sanitize_snap_tolerance(500.0), SNAP_TOLERANCE_MAX);
        assert_eq!(sanitize_snap_tolerance(30.0), 30.0);
    }

    #[test]
    fn merge_tolerance_has_a_floor() {
        let small = EngineConfig {
            board_width: 100.0,
            board_height: 100.0,
            cols: 10,
            rows: 10,
            ..EngineConfig::default()
        };
        assert_eq!(small.merge_tolerance(), MERGE_TOLERANCE_FLOOR);
        let large = EngineConfig {
            board_width: 300.0,
            board_height: 200.0,
            cols: 3,
            rows: 2,
            ..EngineConfig::default()
        };
        assert!((large.merge_tolerance() - 18.0).abs() < 1e-4);
    }

    #[test]
    fn parses_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            image_url = "img1"
            cols = 3
            rows = 2
            snap_tolerance = 200.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed_string(), "img1|3x2");
        assert_eq!(config.snap_tolerance, SNAP_TOLERANCE_MAX);
        assert!(!config.rotation_mode);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("cols = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
