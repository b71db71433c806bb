//! Gameplay settings
//!
//! Defaults reproduce `consts` exactly. A JSON file may override any subset
//! of fields; missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::{JumpImpulses, TierBreakpoints};
use crate::consts::*;
use crate::sim::{RunnerParams, TerrainParams, Viewport};

/// Settings file errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunable gameplay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Quieter windows never produce events (dB)
    pub silence_floor_db: f32,
    pub breakpoints: TierBreakpoints,

    // === Motion ===
    pub impulses: JumpImpulses,
    pub step_distance: f32,

    // === Terrain ===
    /// Chance a slot gets a solid tile (0.0 - 1.0)
    pub tile_probability: f64,
    pub wide_gap_period: u32,
    pub wide_gap_multiplier: f32,
    pub gap_margin: f32,

    // === Session ===
    pub target_steps: u32,
    /// Synthetic loudness injected on start so the avatar springs forward
    pub start_kick_db: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            silence_floor_db: SILENCE_FLOOR_DB,
            breakpoints: TierBreakpoints::default(),

            impulses: JumpImpulses::default(),
            step_distance: STEP_DISTANCE,

            tile_probability: TILE_PROBABILITY,
            wide_gap_period: WIDE_GAP_PERIOD,
            wide_gap_multiplier: WIDE_GAP_MULTIPLIER,
            gap_margin: GAP_MARGIN,

            target_steps: TARGET_STEPS,
            start_kick_db: None,
        }
    }
}

impl Settings {
    /// Clamp values that would make the game unplayable or unending
    pub fn validate(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.tile_probability) {
            log::warn!(
                "tile_probability {} out of range, clamping",
                self.tile_probability
            );
            self.tile_probability = if self.tile_probability.is_nan() {
                TILE_PROBABILITY
            } else {
                self.tile_probability.clamp(0.0, 1.0)
            };
        }
        self.wide_gap_period = self.wide_gap_period.max(1);
        self.wide_gap_multiplier = self.wide_gap_multiplier.max(0.0);
        self.gap_margin = self.gap_margin.max(0.0);
        self.target_steps = self.target_steps.max(1);
        self.step_distance = self.step_distance.max(0.0);
        self.breakpoints = self.breakpoints.normalized();
        self
    }

    pub fn terrain_params(&self, viewport: &Viewport) -> TerrainParams {
        TerrainParams {
            tile_width: TILE_WIDTH,
            row_y: viewport.tile_row_y(),
            avatar_width: AVATAR_WIDTH,
            tile_probability: self.tile_probability,
            wide_gap_period: self.wide_gap_period,
            wide_gap_multiplier: self.wide_gap_multiplier,
            gap_margin: self.gap_margin,
        }
    }

    pub fn runner_params(&self) -> RunnerParams {
        RunnerParams {
            step_distance: self.step_distance,
            gravity: GRAVITY,
            avatar_mass: AVATAR_MASS,
            impulses: self.impulses,
        }
    }

    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.validate())
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
