//! Simulation entities
//!
//! Scene coordinates have the origin at the bottom-left of the viewport with
//! y pointing up. The avatar lives in scene space; tiles live in world space
//! and are shifted by the world offset once the view starts scrolling.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::*;

/// Avatar animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimationState {
    #[default]
    Idle,
    Running,
}

/// The player's avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    /// Center position (scene space)
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Inert until the session starts
    pub dynamic: bool,
    pub animation: AnimationState,
    /// Standing on a tile after the last physics step
    pub grounded: bool,
    /// Seconds left before the run animation drops back to idle
    #[serde(skip)]
    run_hold: f32,
}

impl Avatar {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size: Vec2::new(AVATAR_WIDTH, AVATAR_HEIGHT),
            dynamic: false,
            animation: AnimationState::Idle,
            grounded: true,
            run_hold: 0.0,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    /// Scene-space bounding box
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y - self.size.y / 2.0
    }

    /// Zero vertical velocity, then apply an upward impulse
    pub fn jump(&mut self, impulse: f32, mass: f32) {
        self.vel.y = 0.0;
        self.vel.y += impulse / mass;
        self.grounded = false;
    }

    /// Restart the run animation hold
    pub fn mark_running(&mut self) {
        self.animation = AnimationState::Running;
        self.run_hold = RUN_ANIMATION_HOLD;
    }

    /// Count down the run hold; go idle when it expires
    pub fn update_animation(&mut self, dt: f32) {
        if self.animation == AnimationState::Running {
            self.run_hold -= dt;
            if self.run_hold <= 0.0 {
                self.stop_animation();
            }
        }
    }

    pub fn stop_animation(&mut self) {
        self.animation = AnimationState::Idle;
        self.run_hold = 0.0;
    }
}

/// A static bridge tile (world space, immutable once placed)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Center position
    pub pos: Vec2,
    pub size: Vec2,
}

impl Tile {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(TILE_WIDTH, TILE_HEIGHT),
        }
    }

    /// World-space bounding box
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    /// Scene-space bounding box for a given world offset
    pub fn screen_bounds(&self, world_offset: f32) -> Rect {
        self.bounds().translated(Vec2::new(world_offset, 0.0))
    }
}

/// The visible scene area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    #[inline]
    pub fn mid_x(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn mid_y(&self) -> f32 {
        self.height / 2.0
    }

    /// Center line of the bridge row
    pub fn tile_row_y(&self) -> f32 {
        self.mid_y() - TILE_ROW_DROP
    }

    /// Avatar start: left of center, standing on the bridge row
    pub fn avatar_start(&self) -> Vec2 {
        Vec2::new(
            self.mid_x() - AVATAR_START_OFFSET,
            self.tile_row_y() + TILE_HEIGHT / 2.0 + AVATAR_HEIGHT / 2.0,
        )
    }

    /// Below this y the avatar has fallen off the bridge
    pub fn fall_threshold(&self) -> f32 {
        -FALL_MARGIN
    }
}
