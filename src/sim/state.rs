//! World state and core simulation types
//!
//! The [`World`] is the single mutable aggregate for one game session. It is
//! created once at session start and owned by the tick driver; only
//! [`super::advance`] mutates it. Mid-game save/load is deliberately
//! unsupported, so the aggregate carries its RNG directly instead of a
//! serializable seed wrapper.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::torus::{self, Crossing};
use crate::consts::*;

/// Outcome of one simulation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickResult {
    /// The run continues
    Alive,
    /// The run ended this tick; `crash_pos` is where the fatal contact happened
    GameOver { crash_pos: Vec3 },
}

/// A discrete occurrence within one tick, drained by the presentation layer.
///
/// Closed sum type: consumers match exhaustively, nothing is stringly typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Something was destroyed or consumed at `pos`
    Explosion {
        pos: Vec3,
        color: u32,
        /// Set when a cannibal black hole was involved
        cannibal: bool,
    },
    /// Terminal detonation of an oversized cannibal black hole
    Supernova { pos: Vec3, color: u32 },
    /// An entity crossed a grid boundary; emitted in entry/exit pairs so the
    /// visual layer can place a portal on each face
    PortalSpawn {
        pos: Vec3,
        dir: Vec3,
        color: u32,
        cannibal: bool,
        size: f32,
    },
    /// The player head wrapped around the grid (camera/flash feedback)
    Warp,
}

/// A common food pickup
#[derive(Debug, Clone)]
pub struct Food {
    pub id: u32,
    pub pos: Vec3,
    /// Marked during a pass, filtered at the next pass boundary
    pub eaten: bool,
}

/// The single rare (gold) food; at most one live at a time
#[derive(Debug, Clone)]
pub struct RareFood {
    pub pos: Vec3,
    pub expires_at_ms: u64,
}

/// The single green fruit; wanders on its own, at most one live at a time
#[derive(Debug, Clone)]
pub struct GreenFruit {
    pub pos: Vec3,
    pub expires_at_ms: u64,
    pub move_dir: Vec3,
}

/// A wandering hazard. `size` and `is_cannibal` only ever escalate; the hole
/// leaves play by expiry, merge destruction, or supernova.
#[derive(Debug, Clone)]
pub struct BlackHole {
    pub id: u32,
    pub pos: Vec3,
    pub expires_at_ms: u64,
    pub size: f32,
    pub speed_multiplier: f32,
    pub move_dir: Vec3,
    pub is_cannibal: bool,
    /// Logically removed; filtered at the next tick boundary
    pub expired: bool,
}

/// An autonomous snake
#[derive(Debug, Clone)]
pub struct NpcSnake {
    pub id: u32,
    /// Head-first segment list
    pub segments: Vec<Vec3>,
    /// One tick behind `segments`, for render interpolation
    pub previous_segments: Vec<Vec3>,
    pub dir: Vec3,
    pub dead: bool,
    pub pending_growth: u32,
    pub color: u32,
}

impl NpcSnake {
    #[inline]
    pub fn head(&self) -> Vec3 {
        self.segments[0]
    }
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed, kept for logging/reproduction
    pub seed: u64,
    /// Grid cells per axis; coordinates live in `[0, grid_size)`
    pub grid_size: f32,
    /// Ticks advanced since session start
    pub time_ticks: u64,
    /// Logical clock in milliseconds (advances TICK_MS per tick)
    pub time_ms: u64,

    /// Player segments, head first
    pub player: Vec<Vec3>,
    /// Player segments one tick behind, for render interpolation
    pub previous_player: Vec<Vec3>,
    pub heading: Vec3,
    /// Heading intent written by the input collaborator before each tick
    pub next_heading: Vec3,
    pub pending_growth: u32,

    pub foods: Vec<Food>,
    pub rare_food: Option<RareFood>,
    pub green_fruit: Option<GreenFruit>,
    pub black_holes: Vec<BlackHole>,
    pub npc_snakes: Vec<NpcSnake>,

    /// Per-tick event log, drained by the presentation layer
    pub events: Vec<GameEvent>,

    pub score: u64,
    /// Permanent tick-cadence multiplier, grown by rare food captures.
    /// Consumed by the driving loop, not by the simulation itself.
    pub speed_multiplier: f32,
    /// True while any magnet pull toward the player is active this tick
    pub is_attracting: bool,
    /// Camera shake magnitude requested by the simulation; the presentation
    /// layer reads and decays it
    pub camera_shake: f32,
    pub game_over: bool,
    pub crash_pos: Option<Vec3>,

    /// Population targets; fixed policy, held as fields so tests can build
    /// small scenarios
    pub max_food: usize,
    pub max_black_holes: usize,
    pub max_npcs: usize,

    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl World {
    /// Create a fresh session: player seeded at grid center with the fixed
    /// initial length, heading +z, all entity collections empty. Populations
    /// fill to their targets on the first tick.
    pub fn new(seed: u64) -> Self {
        let n = GRID_SIZE;
        let center = (n / 2.0).floor();
        let player: Vec<Vec3> = (0..INITIAL_SNAKE_LENGTH)
            .map(|i| Vec3::new(center, center, center - i as f32))
            .collect();
        let previous_player = player.clone();

        Self {
            seed,
            grid_size: n,
            time_ticks: 0,
            time_ms: 0,
            player,
            previous_player,
            heading: Vec3::Z,
            next_heading: Vec3::Z,
            pending_growth: 0,
            foods: Vec::new(),
            rare_food: None,
            green_fruit: None,
            black_holes: Vec::new(),
            npc_snakes: Vec::new(),
            events: Vec::new(),
            score: 0,
            speed_multiplier: 1.0,
            is_attracting: false,
            camera_shake: 0.0,
            game_over: false,
            crash_pos: None,
            max_food: MAX_FOOD,
            max_black_holes: MAX_BLACK_HOLES,
            max_npcs: MAX_NPC_SNAKES,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current player head position
    #[inline]
    pub fn player_head(&self) -> Vec3 {
        self.player[0]
    }

    /// Hand the accumulated events to the presentation layer
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// All live snake segments in the world: player plus living NPCs
    pub fn snake_segments(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.player.iter().copied().chain(
            self.npc_snakes
                .iter()
                .filter(|s| !s.dead)
                .flat_map(|s| s.segments.iter().copied()),
        )
    }

    /// Uniformly random grid cell (integral coordinates)
    pub(crate) fn rand_cell(&mut self) -> Vec3 {
        let n = self.grid_size;
        Vec3::new(
            (self.rng.random::<f32>() * n).floor(),
            (self.rng.random::<f32>() * n).floor(),
            (self.rng.random::<f32>() * n).floor(),
        )
    }

    /// Random unit direction for wandering entities
    pub(crate) fn rand_unit_dir(&mut self) -> Vec3 {
        for _ in 0..16 {
            let v = Vec3::new(
                self.rng.random::<f32>() - 0.5,
                self.rng.random::<f32>() - 0.5,
                self.rng.random::<f32>() - 0.5,
            );
            if v.length_squared() > 1e-6 {
                return v.normalize();
            }
        }
        Vec3::X
    }

    /// Random axis-aligned unit direction
    pub(crate) fn rand_axis_dir(&mut self) -> Vec3 {
        torus::AXIS_DIRS[self.rng.random_range(0..torus::AXIS_DIRS.len())]
    }

    /// Emit the entry/exit portal pair for a boundary crossing.
    ///
    /// `pos` is the already-wrapped position; the entry portal sits on the
    /// face the entity left through, the exit portal on the opposite face.
    pub(crate) fn push_portal_pair(
        &mut self,
        pos: Vec3,
        crossing: Crossing,
        dir: Vec3,
        color: u32,
        cannibal: bool,
        size: f32,
    ) {
        let n = self.grid_size;
        let mut entry = pos;
        let mut exit = pos;
        if crossing.low {
            entry[crossing.axis] = 0.0;
            exit[crossing.axis] = n;
        } else {
            entry[crossing.axis] = n;
            exit[crossing.axis] = 0.0;
        }
        self.events.push(GameEvent::PortalSpawn {
            pos: entry,
            dir,
            color,
            cannibal,
            size,
        });
        self.events.push(GameEvent::PortalSpawn {
            pos: exit,
            dir,
            color,
            cannibal,
            size,
        });
    }
}
