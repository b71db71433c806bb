//! Voice Runner - shout to cross the bridge
//!
//! Core modules:
//! - `audio`: Microphone level monitoring and loudness classification
//! - `sim`: Avatar physics, procedural bridge terrain, frame stepping
//! - `session`: Ready/Running/GameOver state machine and outcome callbacks
//! - `settings`: Data-driven tuning (defaults mirror `consts`)

pub mod audio;
pub mod session;
pub mod settings;
pub mod sim;

pub use audio::{
    AudioLevelMonitor, JumpTier, LoudnessSample, LoudnessSource, ScriptedVoice, classify,
};
pub use session::{SessionController, SessionPhase, SessionSnapshot, SessionState};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Scene dimensions (origin bottom-left, y up)
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Avatar body (axis-aligned box)
    pub const AVATAR_WIDTH: f32 = 40.0;
    pub const AVATAR_HEIGHT: f32 = 40.0;
    /// Horizontal start offset left of the viewport midpoint
    pub const AVATAR_START_OFFSET: f32 = 150.0;
    /// Mass used to turn jump impulses into velocity changes
    pub const AVATAR_MASS: f32 = 0.4;

    /// Bridge tiles
    pub const TILE_WIDTH: f32 = 60.0;
    pub const TILE_HEIGHT: f32 = 20.0;
    /// Tile row sits this far below the viewport midline
    pub const TILE_ROW_DROP: f32 = 100.0;
    /// Tiles seeded with `force` around the start position
    pub const INITIAL_BRIDGE_TILES: i32 = 10;

    /// Downward acceleration (units/s²)
    pub const GRAVITY: f32 = 980.0;
    /// Game over once the avatar drops this far below the viewport bottom
    pub const FALL_MARGIN: f32 = 100.0;

    /// Loudness gate (dB-equivalent); quieter frames never produce events
    pub const SILENCE_FLOOR_DB: f32 = -50.0;
    /// Tier breakpoints (strictly greater-than comparisons)
    pub const LARGE_JUMP_DB: f32 = -10.0;
    pub const MEDIUM_JUMP_DB: f32 = -20.0;
    pub const SMALL_JUMP_DB: f32 = -40.0;

    /// Jump impulses per tier
    pub const SMALL_JUMP_IMPULSE: f32 = 100.0;
    pub const MEDIUM_JUMP_IMPULSE: f32 = 200.0;
    pub const LARGE_JUMP_IMPULSE: f32 = 300.0;

    /// Forward displacement per qualifying loudness event
    pub const STEP_DISTANCE: f32 = 20.0;
    /// Steps needed to win
    pub const TARGET_STEPS: u32 = 100;

    /// Probability that a terrain slot gets a solid tile
    pub const TILE_PROBABILITY: f64 = 0.8;
    /// Every Nth gap decision is wide
    pub const WIDE_GAP_PERIOD: u32 = 30;
    /// Wide gap width as a multiple of avatar width
    pub const WIDE_GAP_MULTIPLIER: f32 = 3.0;
    /// Normal gap = avatar width + this margin
    pub const GAP_MARGIN: f32 = 60.0;
    /// Gap counter value at session start
    pub const INITIAL_GAP_COUNT: u32 = 5;

    /// Running animation falls back to idle after this long without a step
    pub const RUN_ANIMATION_HOLD: f32 = 0.5;

    /// Samples per loudness measurement
    pub const ANALYSIS_WINDOW: usize = 1024;
    /// Bounded hand-off queue between the audio thread and the simulation
    pub const LEVEL_CHANNEL_CAPACITY: usize = 256;
}
