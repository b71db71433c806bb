//! Audio input module
//!
//! Everything between the microphone and a jump decision:
//! - `level`: RMS/dB measurement and the silence gate
//! - `classify`: loudness → jump tier
//! - `monitor`: cpal capture and the bounded hand-off channel
//! - `scripted`: synthetic voice for demos and tests

pub mod classify;
pub mod level;
pub mod monitor;
pub mod scripted;

pub use classify::{JumpImpulses, JumpTier, TierBreakpoints, classify};
pub use level::{LevelMeter, LoudnessSample, amplitude_to_db, frame_loudness_db, rms};
pub use monitor::{
    AudioLevelMonitor, CaptureError, LevelReceiver, LevelSender, LoudnessSource, level_channel,
};
pub use scripted::ScriptedVoice;
