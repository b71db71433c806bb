//! Procedural bridge generation
//!
//! The bridge is a row of slots. Each slot either gets a solid tile or opens
//! a gap; every `wide_gap_period`th gap is wide. The RNG is injected so tests
//! can seed it; live sessions use an OS-seeded generator.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::Tile;
use crate::consts::*;

/// Generation tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    pub tile_width: f32,
    /// Center line of the tile row
    pub row_y: f32,
    pub avatar_width: f32,
    /// Chance a slot gets a solid tile
    pub tile_probability: f64,
    pub wide_gap_period: u32,
    pub wide_gap_multiplier: f32,
    pub gap_margin: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            tile_width: TILE_WIDTH,
            row_y: VIEWPORT_HEIGHT / 2.0 - TILE_ROW_DROP,
            avatar_width: AVATAR_WIDTH,
            tile_probability: TILE_PROBABILITY,
            wide_gap_period: WIDE_GAP_PERIOD,
            wide_gap_multiplier: WIDE_GAP_MULTIPLIER,
            gap_margin: GAP_MARGIN,
        }
    }
}

impl TerrainParams {
    /// Narrowest gap the generator will open
    pub fn normal_gap_width(&self) -> f32 {
        self.avatar_width + self.gap_margin
    }

    /// Periodic wide gap, never narrower than a normal one
    pub fn wide_gap_width(&self) -> f32 {
        (self.avatar_width * self.wide_gap_multiplier).max(self.normal_gap_width())
    }

    /// Clamp values that would panic the RNG or stall the frontier
    pub fn validated(mut self) -> Self {
        self.tile_probability = if self.tile_probability.is_nan() {
            TILE_PROBABILITY
        } else {
            self.tile_probability.clamp(0.0, 1.0)
        };
        if !(self.tile_width.is_finite() && self.tile_width > 0.0) {
            self.tile_width = TILE_WIDTH;
        }
        if !(self.avatar_width.is_finite() && self.avatar_width > 0.0) {
            self.avatar_width = AVATAR_WIDTH;
        }
        if !self.gap_margin.is_finite() {
            self.gap_margin = GAP_MARGIN;
        }
        self.gap_margin = self.gap_margin.max(0.0);
        if !self.wide_gap_multiplier.is_finite() {
            self.wide_gap_multiplier = WIDE_GAP_MULTIPLIER;
        }
        self.wide_gap_multiplier = self.wide_gap_multiplier.max(0.0);
        self.wide_gap_period = self.wide_gap_period.max(1);
        self
    }
}

/// Running generation counters for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapState {
    /// Slots decided so far (tiles and gaps)
    pub slot_count: u64,
    /// Gap decisions so far, starting from `INITIAL_GAP_COUNT`
    pub gap_count: u32,
    /// World x of the next undecided slot
    pub frontier: f32,
}

impl GapState {
    pub fn new(frontier: f32) -> Self {
        Self {
            slot_count: 0,
            gap_count: INITIAL_GAP_COUNT,
            frontier,
        }
    }
}

/// Outcome of one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotDecision {
    Tile(Tile),
    Gap { width: f32, wide: bool },
}

/// Extends the bridge ahead of the camera
#[derive(Debug, Clone)]
pub struct TerrainGenerator<R = Pcg32> {
    params: TerrainParams,
    state: GapState,
    rng: R,
}

impl TerrainGenerator<Pcg32> {
    /// Unseeded: every session gets a different bridge
    pub fn unseeded(params: TerrainParams) -> Self {
        Self::with_rng(params, Pcg32::from_os_rng())
    }

    /// Seeded: reproducible bridge
    pub fn seeded(params: TerrainParams, seed: u64) -> Self {
        Self::with_rng(params, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> TerrainGenerator<R> {
    pub fn with_rng(params: TerrainParams, rng: R) -> Self {
        Self {
            params: params.validated(),
            state: GapState::new(0.0),
            rng,
        }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn gap_state(&self) -> GapState {
        self.state
    }

    #[inline]
    pub fn frontier(&self) -> f32 {
        self.state.frontier
    }

    /// Whether the next gap opened will be wide
    pub fn next_gap_is_wide(&self) -> bool {
        self.state.gap_count % self.params.wide_gap_period.max(1) == 0
    }

    /// Forget all counters and restart generation at `frontier`
    ///
    /// The RNG stream carries on, so a seeded generator stays reproducible
    /// across resets.
    pub fn reset(&mut self, frontier: f32) {
        self.state = GapState::new(frontier);
    }

    /// Decide the slot at the frontier and advance past it
    ///
    /// `force` skips the random draw and always places a tile.
    pub fn place_slot(&mut self, force: bool) -> SlotDecision {
        let x = self.state.frontier;
        self.state.slot_count += 1;

        let solid = force || self.rng.random_bool(self.params.tile_probability);
        if solid {
            self.state.frontier += self.params.tile_width;
            return SlotDecision::Tile(Tile::new(x, self.params.row_y));
        }

        let wide = self.next_gap_is_wide();
        let width = if wide {
            self.params.wide_gap_width()
        } else {
            self.params.normal_gap_width()
        };
        if wide {
            log::debug!("Wide gap ({:.0}) at x={:.0}", width, x);
        }
        self.state.frontier += width;
        self.state.gap_count += 1;
        SlotDecision::Gap { width, wide }
    }

    /// Generate until the frontier reaches `target`, pushing new tiles
    ///
    /// A target at or behind the frontier is a no-op. Returns the number of
    /// slots decided.
    pub fn extend(&mut self, target: f32, out: &mut Vec<Tile>) -> usize {
        let mut slots = 0;
        while self.state.frontier < target {
            if let SlotDecision::Tile(tile) = self.place_slot(false) {
                out.push(tile);
            }
            slots += 1;
        }
        slots
    }

    /// Lay `count` guaranteed tiles starting one tile behind `start_x`
    pub fn seed_bridge(&mut self, start_x: f32, count: i32, out: &mut Vec<Tile>) {
        self.reset(start_x - self.params.tile_width);
        for _ in 0..count {
            if let SlotDecision::Tile(tile) = self.place_slot(true) {
                out.push(tile);
            }
        }
    }
}
