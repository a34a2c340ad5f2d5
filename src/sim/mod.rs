//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only; the world clock advances `TICK_MS` per call
//! - Seeded RNG only, drawn in a fixed order
//! - Stable, index-ordered iteration (pairwise black hole resolution is
//!   order-sensitive by design)
//! - No rendering or platform dependencies
//!
//! One tick is one call to [`advance`]; the world is exclusively owned by
//! that call for its duration. The presentation layer drains the event
//! queue between ticks and must not mutate the world.

pub mod black_hole;
pub mod food;
pub mod npc;
pub mod state;
pub mod tick;
pub mod torus;

pub use state::{BlackHole, Food, GameEvent, GreenFruit, NpcSnake, RareFood, TickResult, World};
pub use tick::advance;
pub use torus::{Crossing, manhattan, nearest_delta, toroidal_distance, wrap};
