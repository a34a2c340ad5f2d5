//! Fixed timestep simulation tick
//!
//! [`advance`] is the single entry point the driver calls. One call moves
//! every entity category one step: player motion, food and rare entities,
//! black holes, NPC snakes — in that order, because later stages read the
//! positions earlier stages committed.

use glam::Vec3;

use super::state::{GameEvent, TickResult, World};
use super::{black_hole, food, npc, torus};
use crate::consts::*;

/// Advance the world by one fixed timestep.
///
/// The heading intent (`world.next_heading`) must be written before the
/// call. Returns whether the run survived the tick; on `GameOver` the world
/// is left in its terminal state for the presentation layer to render.
pub fn advance(world: &mut World) -> TickResult {
    if world.game_over {
        let crash_pos = world.crash_pos.unwrap_or_else(|| world.player_head());
        return TickResult::GameOver { crash_pos };
    }

    // Snapshot for render interpolation before anything moves
    world.previous_player.clear();
    world.previous_player.extend_from_slice(&world.player);

    // Latch the heading intent, rejecting an exact reversal into the neck
    if world.next_heading != -world.heading {
        world.heading = world.next_heading;
    }

    // The snake has never moved; nothing else runs until it does
    if world.heading == Vec3::ZERO {
        return TickResult::Alive;
    }

    world.time_ticks += 1;
    world.time_ms += TICK_MS;

    if let Some(crash_pos) = step_player(world) {
        world.game_over = true;
        world.crash_pos = Some(crash_pos);
        log::info!(
            "game over at tick {}: self collision at {:?}, score {}",
            world.time_ticks,
            crash_pos,
            world.score
        );
        return TickResult::GameOver { crash_pos };
    }

    food::update(world);
    food::update_rare(world);
    food::update_green_fruit(world);

    black_hole::update(world);
    if world.game_over {
        let crash_pos = world.crash_pos.unwrap_or_else(|| world.player_head());
        return TickResult::GameOver { crash_pos };
    }

    npc::update(world);
    if world.game_over {
        let crash_pos = world.crash_pos.unwrap_or_else(|| world.player_head());
        return TickResult::GameOver { crash_pos };
    }

    TickResult::Alive
}

/// Move the player head one cell along the current heading.
///
/// Returns the crash position on a fatal self-collision; otherwise commits
/// the new head and applies the growth policy.
fn step_player(world: &mut World) -> Option<Vec3> {
    let old_head = world.player_head();
    let raw = old_head + world.heading;
    let (new_head, crossings) = torus::wrap_crossings(raw, world.grid_size);

    // A wrap teleports the head across the grid; purely visual feedback
    if !crossings.is_empty() {
        world.events.push(GameEvent::Warp);
        let heading = world.heading;
        for crossing in crossings {
            world.push_portal_pair(new_head, crossing, heading, COLOR_WHITE, false, 1.0);
        }
    }

    // Fatal before the head is committed: any existing segment counts,
    // including the tail cell about to be vacated
    if world.player.iter().any(|s| *s == new_head) {
        return Some(new_head);
    }

    world.player.insert(0, new_head);
    if world.pending_growth > 0 {
        world.pending_growth -= 1;
    } else {
        world.player.pop();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// World with every population target zeroed, so only what the test
    /// places exists
    fn bare_world(seed: u64) -> World {
        let mut world = World::new(seed);
        world.max_food = 0;
        world.max_black_holes = 0;
        world.max_npcs = 0;
        world
    }

    #[test]
    fn test_no_reversal_into_own_neck() {
        let mut world = bare_world(1);
        assert_eq!(world.heading, Vec3::Z);
        world.next_heading = Vec3::NEG_Z;
        let result = advance(&mut world);
        assert_eq!(result, TickResult::Alive);
        assert_eq!(world.heading, Vec3::Z);
        // and the head kept moving forward
        assert_eq!(world.player_head(), Vec3::new(125.0, 125.0, 126.0));
    }

    #[test]
    fn test_zero_heading_is_a_noop() {
        let mut world = bare_world(1);
        world.heading = Vec3::ZERO;
        world.next_heading = Vec3::ZERO;
        let before = world.player.clone();
        let result = advance(&mut world);
        assert_eq!(result, TickResult::Alive);
        assert_eq!(world.player, before);
        assert_eq!(world.time_ticks, 0);
    }

    #[test]
    fn test_single_step_wrap_emits_one_portal_pair() {
        let mut world = bare_world(1);
        world.player = (0..5)
            .map(|i| Vec3::new(10.0, 10.0, 249.0 - i as f32))
            .collect();
        world.previous_player = world.player.clone();

        let result = advance(&mut world);
        assert_eq!(result, TickResult::Alive);
        assert_eq!(world.player_head(), Vec3::new(10.0, 10.0, 0.0));

        let portals: Vec<_> = world
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PortalSpawn { .. }))
            .collect();
        assert_eq!(portals.len(), 2);
        assert!(world.events.iter().any(|e| matches!(e, GameEvent::Warp)));
    }

    #[test]
    fn test_self_collision_is_fatal() {
        let mut world = bare_world(1);
        // a hook shape: moving +z runs the head straight into a body cell
        world.player = vec![
            Vec3::new(10.0, 10.0, 10.0),
            Vec3::new(11.0, 10.0, 10.0),
            Vec3::new(11.0, 10.0, 11.0),
            Vec3::new(10.0, 10.0, 11.0),
            Vec3::new(9.0, 10.0, 11.0),
        ];
        world.previous_player = world.player.clone();
        world.heading = Vec3::Z;
        world.next_heading = Vec3::Z;

        let result = advance(&mut world);
        let crash = Vec3::new(10.0, 10.0, 11.0);
        assert_eq!(result, TickResult::GameOver { crash_pos: crash });
        assert!(world.game_over);
        assert_eq!(world.crash_pos, Some(crash));
    }

    #[test]
    fn test_growth_conservation_after_food_capture() {
        let mut world = bare_world(42);
        world.max_food = 1;
        let id = world.next_entity_id();
        // directly ahead at distance 2
        world.foods.push(super::super::state::Food {
            id,
            pos: Vec3::new(125.0, 125.0, 127.0),
            eaten: false,
        });

        // Tick 1: head moves to z=126, magnet pull drags the food in, capture
        assert_eq!(advance(&mut world), TickResult::Alive);
        assert_eq!(world.score, FOOD_SCORE);
        assert_eq!(world.pending_growth, 1);
        assert_eq!(world.player.len(), INITIAL_SNAKE_LENGTH);

        // Tick 2: growth is consumed, tail kept, length +1
        assert_eq!(advance(&mut world), TickResult::Alive);
        assert_eq!(world.player.len(), INITIAL_SNAKE_LENGTH + 1);
        assert_eq!(world.pending_growth, 0);
        assert_eq!(world.score, FOOD_SCORE);
    }

    #[test]
    fn test_advance_after_game_over_stays_terminal() {
        let mut world = bare_world(1);
        world.game_over = true;
        world.crash_pos = Some(Vec3::new(1.0, 2.0, 3.0));
        let result = advance(&mut world);
        assert_eq!(
            result,
            TickResult::GameOver {
                crash_pos: Vec3::new(1.0, 2.0, 3.0)
            }
        );
    }

    #[test]
    fn test_determinism_same_seed_same_run() {
        let mut a = World::new(99);
        let mut b = World::new(99);
        for _ in 0..25 {
            advance(&mut a);
            advance(&mut b);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.player, b.player);
        assert_eq!(a.foods.len(), b.foods.len());
        assert_eq!(a.black_holes.len(), b.black_holes.len());
        assert_eq!(a.events.len(), b.events.len());
    }
}
