//! Food population and rare collectibles
//!
//! Common food is kept at a fixed population and magnetically drawn toward
//! whichever consumer is hunting it (player here, NPC heads in the NPC
//! stage, black holes in theirs). The rare gold food and the wandering
//! green fruit are single-instance timed entities with larger rewards.

use glam::Vec3;
use rand::Rng;

use super::state::{Food, GameEvent, GreenFruit, RareFood, World};
use super::torus;
use crate::consts::*;

/// Apply the tiered magnet pull of `consumer` on a food position.
///
/// The gate only pulls prey the consumer is actually moving toward (or that
/// is already at point-blank range), so food never flees backward through a
/// snake. Returns the toroidal distance recomputed AFTER the pull — capture
/// checks must never reuse a pre-pull distance — and whether any pull was
/// applied.
pub(crate) fn magnet_pull(pos: &mut Vec3, consumer: Vec3, consumer_dir: Vec3, n: f32) -> (f32, bool) {
    let delta = torus::nearest_delta(consumer, *pos, n);
    let mut dist = delta.length();
    let mut attracted = false;

    if dist < FOOD_MAGNET_RANGE {
        let dot = delta.dot(consumer_dir);
        if dot > -2.0 || dist < 2.5 {
            attracted = true;
            let mut pull = 0.2;
            if dist < 5.0 {
                pull = 0.4;
            }
            if dist < 2.5 {
                pull = 0.9;
            }
            *pos = torus::wrap(*pos - delta * pull, n);
            dist = torus::toroidal_distance(consumer, *pos, n);
        }
    }

    (dist, attracted)
}

/// One FoodField pass: cull strays, attract, consume, repopulate.
pub(crate) fn update(world: &mut World) {
    world.is_attracting = false;
    let n = world.grid_size;
    let head = world.player_head();
    let heading = world.heading;

    for f in &mut world.foods {
        if f.eaten {
            continue;
        }

        // Defensive despawn: attraction math should never push food this far
        // out, but if it does, clean up instead of diverging
        if outside_defensive_bounds(f.pos, n) {
            f.eaten = true;
            world.events.push(GameEvent::Explosion {
                pos: f.pos,
                color: COLOR_FOOD,
                cannibal: false,
            });
            continue;
        }

        let (dist, attracted) = magnet_pull(&mut f.pos, head, heading, n);
        if attracted {
            world.is_attracting = true;
        }

        if dist < FOOD_EAT_RADIUS {
            f.eaten = true;
            world.score += FOOD_SCORE;
            world.pending_growth += 1;
            world.events.push(GameEvent::Explosion {
                pos: f.pos,
                color: COLOR_FOOD,
                cannibal: false,
            });
        }
    }

    world.foods.retain(|f| !f.eaten);
    respawn(world);
}

/// True when a position drifted far outside the playfield on any axis
fn outside_defensive_bounds(pos: Vec3, n: f32) -> bool {
    for axis in 0..3 {
        if pos[axis] < -n || pos[axis] > n * 2.0 {
            return true;
        }
    }
    false
}

fn respawn(world: &mut World) {
    let deficit = world.max_food.saturating_sub(world.foods.len());
    for _ in 0..deficit {
        match sample_food_cell(world) {
            Some(pos) => {
                let id = world.next_entity_id();
                world.foods.push(Food {
                    id,
                    pos,
                    eaten: false,
                });
            }
            // grid too crowded right now; the deficit check retries next tick
            None => break,
        }
    }
}

/// Rejection-sample a free cell for food, avoiding snake bodies and
/// existing food
fn sample_food_cell(world: &mut World) -> Option<Vec3> {
    for _ in 0..SPAWN_MAX_TRIES {
        let pos = world.rand_cell();
        let occupied = world.snake_segments().any(|s| s == pos)
            || world.foods.iter().any(|f| f.pos == pos);
        if !occupied {
            return Some(pos);
        }
    }
    None
}

/// Rare gold food: spawn timer, expiry, stronger single-tier magnetism,
/// permanent speed reward on capture.
pub(crate) fn update_rare(world: &mut World) {
    let n = world.grid_size;
    let head = world.player_head();
    let heading = world.heading;
    let now = world.time_ms;

    if world.rare_food.is_none() {
        if world.rng.random::<f64>() < RARE_FRUIT_CHANCE {
            let pos = world.rand_cell();
            world.rare_food = Some(RareFood {
                pos,
                expires_at_ms: now + RARE_FOOD_LIFETIME_MS,
            });
            log::debug!("rare food spawned at {pos:?}");
        }
        return;
    }

    let mut remove = false;
    let mut captured_at = None;

    if let Some(rf) = world.rare_food.as_mut() {
        if now > rf.expires_at_ms {
            remove = true;
        } else {
            let delta = torus::nearest_delta(head, rf.pos, n);
            let mut dist = delta.length();
            if dist < RARE_MAGNET_RANGE {
                let dot = delta.dot(heading);
                if dot > -2.0 {
                    rf.pos = torus::wrap(rf.pos - delta * 0.3, n);
                    dist = torus::toroidal_distance(head, rf.pos, n);
                }
            }
            if dist < RARE_EAT_RADIUS {
                captured_at = Some(rf.pos);
                remove = true;
            }
        }
    }

    if let Some(pos) = captured_at {
        world.score += RARE_SCORE;
        world.speed_multiplier += 0.01;
        world.pending_growth += 2;
        world.events.push(GameEvent::Explosion {
            pos,
            color: COLOR_GOLD,
            cannibal: false,
        });
    }
    if remove {
        world.rare_food = None;
    }
}

/// Green fruit: autonomous wanderer with an irregular cadence and a large
/// payout. Boundary crossings are the one place a pickup emits portals.
pub(crate) fn update_green_fruit(world: &mut World) {
    let n = world.grid_size;
    let head = world.player_head();
    let now = world.time_ms;

    let Some(mut gf) = world.green_fruit.take() else {
        if world.rng.random::<f64>() < GREEN_FRUIT_CHANCE {
            let pos = world.rand_cell();
            let move_dir = world.rand_axis_dir();
            world.green_fruit = Some(GreenFruit {
                pos,
                expires_at_ms: now + GREEN_FRUIT_LIFETIME_MS,
                move_dir,
            });
            log::debug!("green fruit spawned at {pos:?}");
        }
        return;
    };

    if now > gf.expires_at_ms {
        world.events.push(GameEvent::Explosion {
            pos: gf.pos,
            color: COLOR_PINK,
            cannibal: false,
        });
        return;
    }

    // Irregular wander: new axis 5% of ticks, actual step only 50% of ticks
    if world.rng.random::<f64>() < 0.05 {
        gf.move_dir = world.rand_axis_dir();
    }
    if world.rng.random::<f64>() < 0.5 {
        let (pos, crossings) = torus::wrap_crossings(gf.pos + gf.move_dir, n);
        gf.pos = pos;
        for crossing in crossings {
            world.push_portal_pair(pos, crossing, gf.move_dir, COLOR_GREEN, false, 1.0);
        }
    }

    if torus::manhattan(gf.pos, head, n) < GREEN_FRUIT_EAT_RADIUS {
        world.score += GREEN_FRUIT_SCORE;
        world.pending_growth += GREEN_FRUIT_GROWTH;
        world.events.push(GameEvent::Explosion {
            pos: gf.pos,
            color: COLOR_GREEN,
            cannibal: false,
        });
    } else {
        world.green_fruit = Some(gf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_world(seed: u64) -> World {
        let mut world = World::new(seed);
        world.max_food = 0;
        world.max_black_holes = 0;
        world.max_npcs = 0;
        world
    }

    fn place_food(world: &mut World, pos: Vec3) {
        let id = world.next_entity_id();
        world.foods.push(Food {
            id,
            pos,
            eaten: false,
        });
    }

    #[test]
    fn test_stray_food_is_culled_with_explosion() {
        let mut world = bare_world(3);
        place_food(&mut world, Vec3::new(-300.0, 10.0, 10.0));
        update(&mut world);
        assert!(world.foods.is_empty());
        assert_eq!(world.score, 0);
        assert!(matches!(
            world.events[0],
            GameEvent::Explosion {
                color: COLOR_FOOD,
                ..
            }
        ));
    }

    #[test]
    fn test_food_behind_moving_head_is_not_pulled() {
        let mut world = bare_world(3);
        // head at center moving +z, food 5 behind: dot = -5, outside the
        // close-range exemption
        let pos = Vec3::new(125.0, 125.0, 120.0);
        place_food(&mut world, pos);
        update(&mut world);
        assert_eq!(world.foods[0].pos, pos);
        assert!(!world.is_attracting);
    }

    #[test]
    fn test_mid_range_pull_tier() {
        let mut world = bare_world(3);
        place_food(&mut world, Vec3::new(125.0, 125.0, 128.0));
        update(&mut world);
        // distance 3 ahead: 0.4 tier moves it 1.2 closer, not yet captured
        let z = world.foods[0].pos.z;
        assert!((z - 126.8).abs() < 1e-4);
        assert!(world.is_attracting);
        assert_eq!(world.score, 0);
    }

    #[test]
    fn test_point_blank_capture() {
        let mut world = bare_world(3);
        place_food(&mut world, Vec3::new(125.0, 125.0, 127.0));
        update(&mut world);
        // distance 2: 0.9 tier pulls it within the eat radius
        assert!(world.foods.is_empty());
        assert_eq!(world.score, FOOD_SCORE);
        assert_eq!(world.pending_growth, 1);
    }

    #[test]
    fn test_respawn_avoids_snakes_and_duplicates() {
        let mut world = bare_world(9);
        world.max_food = 50;
        update(&mut world);
        assert_eq!(world.foods.len(), 50);
        for f in &world.foods {
            assert!(!world.player.contains(&f.pos));
            for axis in 0..3 {
                assert!(f.pos[axis] >= 0.0 && f.pos[axis] < world.grid_size);
            }
        }
        for (i, a) in world.foods.iter().enumerate() {
            for b in &world.foods[i + 1..] {
                assert_ne!(a.pos, b.pos);
            }
        }
    }

    #[test]
    fn test_rare_food_capture_rewards() {
        let mut world = bare_world(3);
        world.rare_food = Some(RareFood {
            pos: Vec3::new(125.0, 125.0, 126.0),
            expires_at_ms: 60_000,
        });
        update_rare(&mut world);
        assert!(world.rare_food.is_none());
        assert_eq!(world.score, RARE_SCORE);
        assert_eq!(world.pending_growth, 2);
        assert!((world.speed_multiplier - 1.01).abs() < 1e-6);
        assert!(matches!(
            world.events[0],
            GameEvent::Explosion {
                color: COLOR_GOLD,
                ..
            }
        ));
    }

    #[test]
    fn test_rare_food_expires_silently() {
        let mut world = bare_world(3);
        world.time_ms = 50_000;
        world.rare_food = Some(RareFood {
            pos: Vec3::new(10.0, 10.0, 10.0),
            expires_at_ms: 45_000,
        });
        update_rare(&mut world);
        assert!(world.rare_food.is_none());
        assert!(world.events.is_empty());
        assert_eq!(world.score, 0);
    }

    #[test]
    fn test_green_fruit_capture() {
        let mut world = bare_world(3);
        // sitting on the head: even if it steps this tick it stays within
        // the Manhattan capture radius
        world.green_fruit = Some(GreenFruit {
            pos: world.player_head(),
            expires_at_ms: 60_000,
            move_dir: Vec3::X,
        });
        update_green_fruit(&mut world);
        assert!(world.green_fruit.is_none());
        assert_eq!(world.score, GREEN_FRUIT_SCORE);
        assert_eq!(world.pending_growth, GREEN_FRUIT_GROWTH);
        assert!(world.events.iter().any(|e| matches!(
            e,
            GameEvent::Explosion {
                color: COLOR_GREEN,
                ..
            }
        )));
    }

    #[test]
    fn test_green_fruit_expiry_explodes_pink() {
        let mut world = bare_world(3);
        world.time_ms = 200_000;
        world.green_fruit = Some(GreenFruit {
            pos: Vec3::new(10.0, 10.0, 10.0),
            expires_at_ms: 120_000,
            move_dir: Vec3::X,
        });
        update_green_fruit(&mut world);
        assert!(world.green_fruit.is_none());
        assert!(matches!(
            world.events[0],
            GameEvent::Explosion {
                color: COLOR_PINK,
                ..
            }
        ));
    }
}
