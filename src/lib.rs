//! Toro Snake - a 3D snake survival simulation on a toroidal grid
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, food, black holes, NPC snakes)
//! - `highscores`: Thin leaderboard collaborator for the driving loop
//!
//! The crate exposes exactly one operation to its driver: [`sim::advance`],
//! which moves the world one fixed timestep forward and reports whether the
//! run is still alive. Everything visual (rendering, particles, camera,
//! input mapping) lives outside this crate and only consumes the mutated
//! [`sim::World`] plus its drained event queue.

pub mod highscores;
pub mod sim;

pub use highscores::HighScores;

/// Game configuration constants
///
/// These are fixed policy, not tunables: the balance of the game depends on
/// the exact ratios below (magnet ranges vs. eat radii, escalation rewards
/// vs. supernova threshold).
pub mod consts {
    /// Grid cells per axis; coordinate space is `[0, GRID_SIZE)` per axis,
    /// wrapping at both ends
    pub const GRID_SIZE: f32 = 250.0;
    /// Logical duration of one tick in milliseconds. Timed entities expire
    /// against the world clock advanced by this amount, never wall time.
    pub const TICK_MS: u64 = 100;

    /// Player snake seed length at session start
    pub const INITIAL_SNAKE_LENGTH: usize = 20;
    /// At or below this length a black hole impact is fatal instead of
    /// merely costing tail segments
    pub const MIN_SURVIVABLE_LENGTH: usize = 12;

    /// Food population target
    pub const MAX_FOOD: usize = 1500;
    pub const FOOD_MAGNET_RANGE: f32 = 10.0;
    pub const FOOD_EAT_RADIUS: f32 = 1.0;
    pub const FOOD_SCORE: u64 = 100;

    /// Rare (gold) food
    pub const RARE_FRUIT_CHANCE: f64 = 0.01;
    pub const RARE_FOOD_LIFETIME_MS: u64 = 45_000;
    pub const RARE_MAGNET_RANGE: f32 = 8.0;
    pub const RARE_EAT_RADIUS: f32 = 1.5;
    pub const RARE_SCORE: u64 = 500;

    /// Green fruit
    pub const GREEN_FRUIT_CHANCE: f64 = 0.003;
    pub const GREEN_FRUIT_LIFETIME_MS: u64 = 120_000;
    pub const GREEN_FRUIT_EAT_RADIUS: f32 = 1.5;
    pub const GREEN_FRUIT_SCORE: u64 = 2000;
    pub const GREEN_FRUIT_GROWTH: u32 = 20;

    /// Black holes
    pub const MAX_BLACK_HOLES: usize = 100;
    pub const BLACK_HOLE_BASE_SPEED: f32 = 0.4;
    pub const BLACK_HOLE_EAT_RADIUS: f32 = 1.5;
    pub const BLACK_HOLE_MAGNET_RANGE: f32 = 10.0;
    /// Minimum toroidal distance from the player head for a fresh spawn
    pub const BLACK_HOLE_SPAWN_SAFE_RADIUS: f32 = 15.0;
    pub const BLACK_HOLE_MIN_LIFETIME_MS: u64 = 120_000;
    pub const BLACK_HOLE_MAX_LIFETIME_MS: u64 = 180_000;
    /// A cannibal hole past this size detonates on its next update
    pub const SUPERNOVA_SIZE: f32 = 2.5;
    /// Squared cutoff radius for the supernova radial impulse (~70 units)
    pub const SUPERNOVA_RANGE_SQ: f32 = 4900.0;

    /// NPC snakes
    pub const MAX_NPC_SNAKES: usize = 8;
    pub const NPC_INITIAL_LENGTH: usize = 8;
    /// Toroidal clearance required between a fresh NPC and any snake segment
    pub const NPC_SPAWN_MARGIN: f32 = 5.0;
    pub const NPC_KILL_SCORE: u64 = 500;
    /// Per-axis adjacency threshold for snake collision checks
    pub const COLLISION_EPSILON: f32 = 0.8;

    /// Cap on rejection-sampling attempts for any spawn. On exhaustion the
    /// spawn is deferred to the next tick instead of looping forever.
    pub const SPAWN_MAX_TRIES: usize = 64;

    /// Event colors (0xRRGGBB)
    pub const COLOR_FOOD: u32 = 0xff0055;
    pub const COLOR_GOLD: u32 = 0xffd700;
    pub const COLOR_YELLOW: u32 = 0xffff00;
    pub const COLOR_GREEN: u32 = 0x00ff00;
    pub const COLOR_PINK: u32 = 0xff00b3;
    pub const COLOR_BLACK: u32 = 0x000000;
    pub const COLOR_WHITE: u32 = 0xffffff;

    /// Body colors handed out to NPC snakes at spawn
    pub const NPC_COLORS: [u32; 5] = [0xffffff, 0x00ffff, 0xff00ff, 0xffaa00, 0x00ffaa];
}

/// Wrap a coordinate into `[0, n)`.
///
/// Handles arbitrary displacements (a supernova impulse can push an entity
/// well past the boundary), not just single steps.
#[inline]
pub fn wrap_coord(c: f32, n: f32) -> f32 {
    let w = c.rem_euclid(n);
    // rem_euclid of a tiny negative can round up to exactly n
    if w >= n { 0.0 } else { w }
}

/// Nearest-image signed delta from `a` to `b` on a wrapping axis.
///
/// If the direct difference spans more than half the grid, the shorter path
/// goes through the boundary.
#[inline]
pub fn axis_delta(a: f32, b: f32, n: f32) -> f32 {
    let d = b - a;
    if d > n / 2.0 {
        d - n
    } else if d < -n / 2.0 {
        d + n
    } else {
        d
    }
}
