//! Loudness → jump tier mapping

use serde::{Deserialize, Serialize};

use super::level::LoudnessSample;
use crate::consts::*;

/// Discrete action tier for one loudness event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JumpTier {
    /// Too quiet to move
    None,
    Small,
    Medium,
    Large,
}

impl JumpTier {
    /// Default impulse for this tier (0 for `None`)
    pub fn impulse(self) -> f32 {
        match self {
            JumpTier::None => 0.0,
            JumpTier::Small => SMALL_JUMP_IMPULSE,
            JumpTier::Medium => MEDIUM_JUMP_IMPULSE,
            JumpTier::Large => LARGE_JUMP_IMPULSE,
        }
    }

    /// Whether this tier produces a jump and a forward step
    #[inline]
    pub fn qualifies(self) -> bool {
        self != JumpTier::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JumpTier::None => "none",
            JumpTier::Small => "small",
            JumpTier::Medium => "medium",
            JumpTier::Large => "large",
        }
    }
}

/// Tier thresholds in dB, each compared with strict greater-than
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBreakpoints {
    pub large: f32,
    pub medium: f32,
    pub small: f32,
}

impl Default for TierBreakpoints {
    fn default() -> Self {
        Self {
            large: LARGE_JUMP_DB,
            medium: MEDIUM_JUMP_DB,
            small: SMALL_JUMP_DB,
        }
    }
}

impl TierBreakpoints {
    /// Classify a sample against these breakpoints
    ///
    /// Total over every f32: NaN fails every comparison and lands in `None`.
    pub fn classify(&self, sample: LoudnessSample) -> JumpTier {
        let db = sample.db();
        if db > self.large {
            JumpTier::Large
        } else if db > self.medium {
            JumpTier::Medium
        } else if db > self.small {
            JumpTier::Small
        } else {
            JumpTier::None
        }
    }

    /// Sort breakpoints so that large >= medium >= small
    pub fn normalized(self) -> Self {
        let mut v = [self.large, self.medium, self.small];
        v.sort_by(|a, b| b.total_cmp(a));
        Self {
            large: v[0],
            medium: v[1],
            small: v[2],
        }
    }
}

/// Impulse magnitude per qualifying tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpImpulses {
    pub small: f32,
    pub medium: f32,
    pub large: f32,
}

impl Default for JumpImpulses {
    fn default() -> Self {
        Self {
            small: JumpTier::Small.impulse(),
            medium: JumpTier::Medium.impulse(),
            large: JumpTier::Large.impulse(),
        }
    }
}

impl JumpImpulses {
    pub fn for_tier(&self, tier: JumpTier) -> f32 {
        match tier {
            JumpTier::None => 0.0,
            JumpTier::Small => self.small,
            JumpTier::Medium => self.medium,
            JumpTier::Large => self.large,
        }
    }
}

/// Classify with the default breakpoints
pub fn classify(sample: LoudnessSample) -> JumpTier {
    TierBreakpoints::default().classify(sample)
}
