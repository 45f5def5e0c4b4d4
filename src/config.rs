use log::LevelFilter;

use crate::board::MAX_CELLS;
use crate::error::ConfigError;

/// Largest canvas edge in pixels that browsers reliably allocate.
pub const MAX_CANVAS_EDGE: f64 = 16_384.0;

/// Session configuration, loadable from JSON. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Number of distinct tile values.
    pub palette_size: u8,
    /// Minimum group size that triggers removal.
    pub match_goal: usize,
    pub disappear_duration_ms: f64,
    pub fall_duration_ms: f64,
    /// Edge length of one tile in canvas pixels.
    pub tile_size: f64,
    pub particles_per_tile: usize,
    /// Fixed RNG seed; entropy from the host when absent.
    pub seed: Option<u64>,
    pub log_level: LevelFilter,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            rows: 8,
            cols: 8,
            palette_size: 5,
            match_goal: 3,
            disappear_duration_ms: 300.0,
            fall_duration_ms: 300.0,
            tile_size: 64.0,
            particles_per_tile: 10,
            seed: None,
            log_level: LevelFilter::Info,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::Validation(format!(
                "board must have at least one row and column (got {}x{})",
                self.rows, self.cols
            )));
        }
        match self.rows.checked_mul(self.cols) {
            Some(cells) if cells <= MAX_CELLS => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "board of {}x{} exceeds {MAX_CELLS} cells",
                    self.rows, self.cols
                )));
            }
        }
        if self.palette_size == 0 {
            return Err(ConfigError::Validation("palette_size must be > 0".into()));
        }
        if self.match_goal <= 1 {
            return Err(ConfigError::Validation("match_goal must be > 1".into()));
        }
        for (name, value) in [
            ("disappear_duration_ms", self.disappear_duration_ms),
            ("fall_duration_ms", self.fall_duration_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a finite value >= 0"
                )));
            }
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(ConfigError::Validation("tile_size must be > 0".into()));
        }
        let (width, height) = self.canvas_extent();
        if width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(ConfigError::Validation(format!(
                "canvas of {width}x{height} px exceeds {MAX_CANVAS_EDGE} px per edge"
            )));
        }
        Ok(())
    }

    fn canvas_extent(&self) -> (f64, f64) {
        (
            (self.cols as f64 * self.tile_size).ceil(),
            (self.rows as f64 * self.tile_size).ceil(),
        )
    }

    /// Canvas size in pixels for this board, `(width, height)`.
    /// A validated config always fits within `MAX_CANVAS_EDGE`.
    pub fn canvas_size(&self) -> (u32, u32) {
        let (width, height) = self.canvas_extent();
        (
            width.min(MAX_CANVAS_EDGE) as u32,
            height.min(MAX_CANVAS_EDGE) as u32,
        )
    }
}
