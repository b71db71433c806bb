//! Frame stepping for the runner
//!
//! One `advance` per display frame. Jumps and forward steps are applied
//! between frames by `apply_tier`, once per qualifying loudness event.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, find_landing, separation};
use super::state::{Avatar, Tile, Viewport};
use super::terrain::{GapState, TerrainGenerator, TerrainParams};
use crate::audio::{JumpImpulses, JumpTier};
use crate::consts::*;

/// Physics and motion tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerParams {
    pub step_distance: f32,
    pub gravity: f32,
    pub avatar_mass: f32,
    pub impulses: JumpImpulses,
}

impl Default for RunnerParams {
    fn default() -> Self {
        Self {
            step_distance: STEP_DISTANCE,
            gravity: GRAVITY,
            avatar_mass: AVATAR_MASS,
            impulses: JumpImpulses::default(),
        }
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Avatar dropped below the fall threshold
    pub fell: bool,
    /// Avatar touched down on a tile this frame
    pub landed: bool,
    /// Terrain slots decided this frame
    pub slots_generated: usize,
    /// Tiles removed behind the view
    pub tiles_collected: usize,
}

/// Avatar, bridge, and camera for one session
#[derive(Debug, Clone)]
pub struct RunnerSimulation<R = Pcg32> {
    viewport: Viewport,
    params: RunnerParams,
    avatar: Avatar,
    tiles: Vec<Tile>,
    terrain: TerrainGenerator<R>,
    /// Horizontal shift applied to world-space tiles (<= 0)
    world_offset: f32,
    /// Reference frame switched: world scrolls, avatar pinned to mid_x
    scrolling: bool,
}

impl<R: Rng> RunnerSimulation<R> {
    /// Build a fresh scene with the initial bridge under the avatar
    pub fn new(viewport: Viewport, params: RunnerParams, terrain: TerrainGenerator<R>) -> Self {
        let mut sim = Self {
            viewport,
            params,
            avatar: Avatar::new(viewport.avatar_start()),
            tiles: Vec::new(),
            terrain,
            world_offset: 0.0,
            scrolling: false,
        };
        sim.seed_bridge();
        sim
    }

    fn seed_bridge(&mut self) {
        let start_x = self.avatar.pos.x;
        self.terrain
            .seed_bridge(start_x, INITIAL_BRIDGE_TILES, &mut self.tiles);
        self.fill_terrain();
    }

    /// Discard everything and rebuild the starting scene
    pub fn reset(&mut self) {
        self.avatar = Avatar::new(self.viewport.avatar_start());
        self.tiles.clear();
        self.world_offset = 0.0;
        self.scrolling = false;
        self.seed_bridge();
    }

    /// Make the avatar respond to gravity
    pub fn activate(&mut self) {
        self.avatar.dynamic = true;
    }

    /// Stop all motion (terminal states)
    pub fn freeze(&mut self) {
        self.avatar.vel = Vec2::ZERO;
        self.avatar.stop_animation();
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Live tiles in world space
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn world_offset(&self) -> f32 {
        self.world_offset
    }

    /// Whether the reference frame has switched to world scrolling
    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    pub fn frontier(&self) -> f32 {
        self.terrain.frontier()
    }

    pub fn gap_state(&self) -> GapState {
        self.terrain.gap_state()
    }

    pub fn terrain_params(&self) -> &TerrainParams {
        self.terrain.params()
    }

    /// World x of the viewport's right edge
    pub fn visible_right_edge(&self) -> f32 {
        self.viewport.width - self.world_offset
    }

    /// Tiles in scene space
    pub fn visible_tiles(&self) -> impl Iterator<Item = Rect> + '_ {
        self.tiles
            .iter()
            .map(|t| t.screen_bounds(self.world_offset))
    }

    /// React to one loudness event
    ///
    /// A qualifying tier resets vertical velocity, applies the tier's impulse
    /// and steps forward. Returns whether a step was taken.
    pub fn apply_tier(&mut self, tier: JumpTier) -> bool {
        if !tier.qualifies() {
            return false;
        }
        let impulse = self.params.impulses.for_tier(tier);
        self.avatar.jump(impulse, self.params.avatar_mass);
        self.avatar.mark_running();
        self.step_forward(self.params.step_distance);
        true
    }

    /// Move the avatar until it reaches mid_x, then scroll the world instead
    fn step_forward(&mut self, distance: f32) {
        let mid_x = self.viewport.mid_x();
        if self.scrolling {
            self.world_offset -= distance;
            self.avatar.pos.x = mid_x;
            return;
        }

        self.avatar.pos.x += distance;
        if self.avatar.pos.x >= mid_x {
            self.scrolling = true;
            self.avatar.pos.x = mid_x;
            log::debug!("Reference frame switched to world scroll");
        }
    }

    /// Keep the frontier a viewport ahead of the reference point and at
    /// least one tile past the visible edge
    fn fill_terrain(&mut self) -> usize {
        let reference_x = if self.scrolling {
            self.viewport.mid_x() - self.world_offset
        } else {
            self.avatar.pos.x
        };
        let target = (reference_x + self.viewport.width)
            .max(self.visible_right_edge() + self.terrain.params().tile_width);
        self.terrain.extend(target, &mut self.tiles)
    }

    /// Push the avatar out of any tile it ended up inside
    ///
    /// Once scrolling, the avatar is pinned, so horizontal pushes move the
    /// world instead.
    fn resolve_tile_overlaps(&mut self, report: &mut FrameReport) {
        // Two passes settle a body wedged against two tiles
        for _ in 0..2 {
            let body = self.avatar.bounds();
            let Some((tile, push)) = self
                .visible_tiles()
                .find_map(|tile| separation(&body, &tile).map(|push| (tile, push)))
            else {
                return;
            };

            let half = self.avatar.size / 2.0;
            if push.y > 0.0 {
                self.avatar.pos.y = tile.max.y + half.y;
                if self.avatar.vel.y <= 0.0 {
                    report.landed |= !self.avatar.grounded;
                    self.avatar.vel.y = 0.0;
                    self.avatar.grounded = true;
                }
            } else if push.y < 0.0 {
                self.avatar.pos.y = tile.min.y - half.y;
                self.avatar.vel.y = self.avatar.vel.y.min(0.0);
            } else if self.scrolling {
                self.world_offset -= push.x;
            } else {
                self.avatar.pos.x += push.x;
            }
        }
    }

    /// Advance one frame
    pub fn advance(&mut self, dt: f32) -> FrameReport {
        let mut report = FrameReport::default();

        self.avatar.update_animation(dt);
        if self.scrolling {
            self.avatar.pos.x = self.viewport.mid_x();
        }

        if self.avatar.dynamic {
            let prev_bottom = self.avatar.bottom();
            self.avatar.vel.y -= self.params.gravity * dt;
            self.avatar.pos.y += self.avatar.vel.y * dt;

            let body = self.avatar.bounds();
            let landing = if self.avatar.vel.y <= 0.0 {
                find_landing(&body, prev_bottom, self.visible_tiles())
            } else {
                None
            };
            match landing {
                Some(top) => {
                    report.landed = !self.avatar.grounded;
                    self.avatar.pos.y = top + self.avatar.size.y / 2.0;
                    self.avatar.vel.y = 0.0;
                    self.avatar.grounded = true;
                }
                None => self.avatar.grounded = false,
            }
            self.resolve_tile_overlaps(&mut report);
        }

        report.slots_generated = self.fill_terrain();

        // Tiles whose right edge has left the screen
        let before = self.tiles.len();
        let offset = self.world_offset;
        self.tiles.retain(|t| t.screen_bounds(offset).max.x >= 0.0);
        report.tiles_collected = before - self.tiles.len();

        report.fell = self.avatar.pos.y < self.viewport.fall_threshold();
        report
    }
}
