//! Runner simulation module
//!
//! All gameplay physics lives here:
//! - Fixed timestep only
//! - Injected RNG only (terrain)
//! - Single mutator: the frame loop that owns the `RunnerSimulation`
//! - No audio or rendering dependencies

pub mod collision;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{Rect, find_landing, separation};
pub use state::{AnimationState, Avatar, Tile, Viewport};
pub use terrain::{GapState, SlotDecision, TerrainGenerator, TerrainParams};
pub use tick::{FrameReport, RunnerParams, RunnerSimulation};
