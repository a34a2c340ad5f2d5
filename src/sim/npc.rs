//! Autonomous NPC snakes
//!
//! NPCs move like the player does (head unshift, conditional tail pop,
//! wrap portals) but steer themselves with a greedy one-step lookahead:
//! score each candidate move, hard-reject occupied cells, favor nearby
//! food and straight runs, and add a little jitter so two snakes chasing
//! the same food do not mirror each other forever.

use glam::Vec3;
use rand::Rng;

use super::state::{GameEvent, NpcSnake, World};
use super::{food, torus};
use crate::consts::*;

pub(crate) fn update(world: &mut World) {
    world.npc_snakes.retain(|s| !s.dead);
    spawn_deficit(world);
    steer_and_move(world);
    forage(world);
    resolve_collisions(world);
}

fn spawn_deficit(world: &mut World) {
    let deficit = world.max_npcs.saturating_sub(world.npc_snakes.len());
    for _ in 0..deficit {
        try_spawn(world);
    }
}

/// Lay a body backward from a random head cell along a random axis heading,
/// clearing every segment individually. One unsafe cell rejects the whole
/// placement; after bounded retries the spawn defers to next tick's
/// deficit check.
fn try_spawn(world: &mut World) {
    let n = world.grid_size;

    'tries: for _ in 0..SPAWN_MAX_TRIES {
        let head = world.rand_cell();
        let dir = world.rand_axis_dir();

        let mut segments = Vec::with_capacity(NPC_INITIAL_LENGTH);
        for k in 0..NPC_INITIAL_LENGTH {
            segments.push(torus::wrap(head - dir * k as f32, n));
        }

        for seg in &segments {
            let near_snake = world
                .snake_segments()
                .any(|s| torus::toroidal_distance(s, *seg, n) < NPC_SPAWN_MARGIN);
            let near_hole = world
                .black_holes
                .iter()
                .filter(|bh| !bh.expired)
                .any(|bh| torus::toroidal_distance(bh.pos, *seg, n) < NPC_SPAWN_MARGIN * bh.size);
            if near_snake || near_hole {
                continue 'tries;
            }
        }

        let id = world.next_entity_id();
        let color = NPC_COLORS[id as usize % NPC_COLORS.len()];
        let previous_segments = segments.clone();
        world.npc_snakes.push(NpcSnake {
            id,
            segments,
            previous_segments,
            dir,
            dead: false,
            pending_growth: 0,
            color,
        });
        log::debug!("npc snake {id} spawned at {head:?}");
        return;
    }
}

fn steer_and_move(world: &mut World) {
    let n = world.grid_size;
    for i in 0..world.npc_snakes.len() {
        if world.npc_snakes[i].dead {
            continue;
        }
        let (head, dir, color) = {
            let s = &world.npc_snakes[i];
            (s.head(), s.dir, s.color)
        };

        let new_dir = pick_direction(world, head, dir);
        let (new_head, crossings) = torus::wrap_crossings(head + new_dir, n);
        for crossing in crossings {
            world.push_portal_pair(new_head, crossing, new_dir, color, false, 1.0);
        }

        let s = &mut world.npc_snakes[i];
        s.previous_segments.clear();
        s.previous_segments.extend_from_slice(&s.segments);
        s.dir = new_dir;
        s.segments.insert(0, new_head);
        if s.pending_growth > 0 {
            s.pending_growth -= 1;
        } else {
            s.segments.pop();
        }
    }
}

/// Score the five non-reversing axis moves and pick the best, pooling
/// near-ties for a uniform pick. When every candidate is occupied, keep
/// going straight; there is no better option.
fn pick_direction(world: &mut World, head: Vec3, dir: Vec3) -> Vec3 {
    let n = world.grid_size;
    let mut scored: Vec<(Vec3, f32)> = Vec::with_capacity(5);

    for cand in torus::AXIS_DIRS {
        if cand == -dir {
            continue;
        }
        let target = torus::wrap(head + cand, n);
        let occupied = world
            .snake_segments()
            .any(|s| torus::same_cell(s, target, n, COLLISION_EPSILON));
        let score = if occupied {
            -10_000.0
        } else {
            let mut score = food_bonus(world, target);
            if cand == dir {
                score += 2.0;
            }
            score + world.rng.random::<f32>() * 4.0
        };
        scored.push((cand, score));
    }

    let best = scored.iter().map(|(_, s)| *s).fold(f32::MIN, f32::max);
    if best <= -9_999.0 {
        return dir;
    }
    let pool: Vec<Vec3> = scored
        .iter()
        .filter(|(_, s)| best - *s < 0.1)
        .map(|(d, _)| *d)
        .collect();
    pool[world.rng.random_range(0..pool.len())]
}

/// Proximity bonus toward the nearest food reachable from `target`
fn food_bonus(world: &World, target: Vec3) -> f32 {
    let n = world.grid_size;
    let mut best_sq = f32::MAX;
    for f in &world.foods {
        if f.eaten {
            continue;
        }
        if torus::manhattan(target, f.pos, n) >= 60.0 {
            continue;
        }
        let d = torus::toroidal_distance_sq(target, f.pos, n);
        if d < best_sq {
            best_sq = d;
        }
    }
    if best_sq < 2500.0 {
        5000.0 / (best_sq + 100.0)
    } else {
        0.0
    }
}

/// NPCs hunt food with the same magnet-and-capture rules as the player,
/// growing their own bodies. No score is awarded; only the player scores.
fn forage(world: &mut World) {
    let n = world.grid_size;
    for i in 0..world.npc_snakes.len() {
        if world.npc_snakes[i].dead {
            continue;
        }
        let (head, dir) = {
            let s = &world.npc_snakes[i];
            (s.head(), s.dir)
        };
        let mut captured = 0_u32;
        for f in &mut world.foods {
            if f.eaten {
                continue;
            }
            let (dist, _) = food::magnet_pull(&mut f.pos, head, dir, n);
            if dist < FOOD_EAT_RADIUS {
                f.eaten = true;
                captured += 1;
                world.events.push(GameEvent::Explosion {
                    pos: f.pos,
                    color: COLOR_FOOD,
                    cannibal: false,
                });
            }
        }
        world.npc_snakes[i].pending_growth += captured;
    }
    world.foods.retain(|f| !f.eaten);
}

/// Full collision matrix, evaluated after every snake has moved this tick.
/// Checks use per-axis adjacency so a cell is shared even after a fractional
/// shove (supernova impulse) perturbed a segment.
fn resolve_collisions(world: &mut World) {
    let n = world.grid_size;
    let eps = COLLISION_EPSILON;
    let player_head = world.player_head();

    // Player head inside any NPC body is fatal, checked before NPC outcomes
    let fatal = world
        .npc_snakes
        .iter()
        .filter(|s| !s.dead)
        .flat_map(|s| s.segments.iter())
        .any(|seg| torus::same_cell(*seg, player_head, n, eps));
    if fatal {
        world.game_over = true;
        world.crash_pos = Some(player_head);
        log::info!(
            "game over at tick {}: ran into an npc snake at {player_head:?}, score {}",
            world.time_ticks,
            world.score
        );
        return;
    }

    // NPC head into the player's body: the NPC dies and the player scores
    for i in 0..world.npc_snakes.len() {
        if world.npc_snakes[i].dead {
            continue;
        }
        let head = world.npc_snakes[i].head();
        if world
            .player
            .iter()
            .any(|seg| torus::same_cell(*seg, head, n, eps))
        {
            let color = world.npc_snakes[i].color;
            world.npc_snakes[i].dead = true;
            world.score += NPC_KILL_SCORE;
            world.events.push(GameEvent::Explosion {
                pos: head,
                color,
                cannibal: false,
            });
        }
    }

    // Self-collision; the first few segments trail too close to the neck to
    // count as hits
    for i in 0..world.npc_snakes.len() {
        if world.npc_snakes[i].dead {
            continue;
        }
        let head = world.npc_snakes[i].head();
        let hit_self = world.npc_snakes[i]
            .segments
            .iter()
            .skip(4)
            .any(|seg| torus::same_cell(*seg, head, n, eps));
        if hit_self {
            let color = world.npc_snakes[i].color;
            world.npc_snakes[i].dead = true;
            world.events.push(GameEvent::Explosion {
                pos: head,
                color,
                cannibal: false,
            });
        }
    }

    // NPC vs NPC: head-on kills both; head into body kills the attacker
    for i in 0..world.npc_snakes.len() {
        for j in (i + 1)..world.npc_snakes.len() {
            if world.npc_snakes[i].dead || world.npc_snakes[j].dead {
                continue;
            }
            let head_i = world.npc_snakes[i].head();
            let head_j = world.npc_snakes[j].head();

            if torus::same_cell(head_i, head_j, n, eps) {
                world.npc_snakes[i].dead = true;
                world.npc_snakes[j].dead = true;
                world.events.push(GameEvent::Explosion {
                    pos: head_i,
                    color: COLOR_WHITE,
                    cannibal: false,
                });
                continue;
            }

            if world.npc_snakes[j]
                .segments
                .iter()
                .skip(1)
                .any(|seg| torus::same_cell(*seg, head_i, n, eps))
            {
                let color = world.npc_snakes[i].color;
                world.npc_snakes[i].dead = true;
                world.events.push(GameEvent::Explosion {
                    pos: head_i,
                    color,
                    cannibal: false,
                });
            }
            if world.npc_snakes[i].dead {
                continue;
            }
            if world.npc_snakes[i]
                .segments
                .iter()
                .skip(1)
                .any(|seg| torus::same_cell(*seg, head_j, n, eps))
            {
                let color = world.npc_snakes[j].color;
                world.npc_snakes[j].dead = true;
                world.events.push(GameEvent::Explosion {
                    pos: head_j,
                    color,
                    cannibal: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::state::Food;

    fn bare_world(seed: u64) -> World {
        let mut world = World::new(seed);
        world.max_food = 0;
        world.max_black_holes = 0;
        world.max_npcs = 0;
        world
    }

    fn place_npc(world: &mut World, segments: Vec<Vec3>, dir: Vec3) -> usize {
        let id = world.next_entity_id();
        let previous_segments = segments.clone();
        world.npc_snakes.push(NpcSnake {
            id,
            segments,
            previous_segments,
            dir,
            dead: false,
            pending_growth: 0,
            color: NPC_COLORS[0],
        });
        world.npc_snakes.len() - 1
    }

    #[test]
    fn test_population_fills_to_target() {
        let mut world = bare_world(11);
        world.max_npcs = 3;
        update(&mut world);
        assert_eq!(world.npc_snakes.len(), 3);
        for s in &world.npc_snakes {
            assert!(!s.dead);
            assert_eq!(s.segments.len(), NPC_INITIAL_LENGTH);
            assert!(NPC_COLORS.contains(&s.color));
            for seg in &s.segments {
                for axis in 0..3 {
                    assert!(seg[axis] >= 0.0 && seg[axis] < world.grid_size);
                }
            }
        }
    }

    #[test]
    fn test_steering_rejects_occupied_cells() {
        let mut world = bare_world(11);
        // wall off four of the five candidate moves; only +z stays open
        world.player = vec![
            Vec3::new(11.0, 10.0, 10.0),
            Vec3::new(9.0, 10.0, 10.0),
            Vec3::new(10.0, 11.0, 10.0),
            Vec3::new(10.0, 9.0, 10.0),
        ];
        world.previous_player = world.player.clone();
        place_npc(
            &mut world,
            vec![
                Vec3::new(10.0, 10.0, 10.0),
                Vec3::new(10.0, 10.0, 9.0),
                Vec3::new(10.0, 10.0, 8.0),
            ],
            Vec3::Z,
        );
        update(&mut world);
        assert!(!world.npc_snakes[0].dead);
        assert_eq!(world.npc_snakes[0].head(), Vec3::new(10.0, 10.0, 11.0));
    }

    #[test]
    fn test_boxed_in_npc_runs_straight_and_dies() {
        let mut world = bare_world(11);
        // every candidate cell occupied, including straight ahead
        world.player = vec![
            Vec3::new(11.0, 10.0, 10.0),
            Vec3::new(9.0, 10.0, 10.0),
            Vec3::new(10.0, 11.0, 10.0),
            Vec3::new(10.0, 9.0, 10.0),
            Vec3::new(10.0, 10.0, 11.0),
        ];
        world.previous_player = world.player.clone();
        place_npc(
            &mut world,
            vec![
                Vec3::new(10.0, 10.0, 10.0),
                Vec3::new(10.0, 10.0, 9.0),
                Vec3::new(10.0, 10.0, 8.0),
            ],
            Vec3::Z,
        );
        update(&mut world);
        assert!(world.npc_snakes[0].dead);
        assert_eq!(world.npc_snakes[0].head(), Vec3::new(10.0, 10.0, 11.0));
        assert_eq!(world.score, NPC_KILL_SCORE);
    }

    #[test]
    fn test_npc_steers_toward_food_and_captures() {
        let mut world = bare_world(11);
        let id = world.next_entity_id();
        world.foods.push(Food {
            id,
            pos: Vec3::new(10.0, 10.0, 13.0),
            eaten: false,
        });
        place_npc(
            &mut world,
            vec![
                Vec3::new(10.0, 10.0, 10.0),
                Vec3::new(10.0, 10.0, 9.0),
                Vec3::new(10.0, 10.0, 8.0),
            ],
            Vec3::Z,
        );
        update(&mut world);
        // the food bonus plus continuation outweighs any jitter elsewhere,
        // and the magnet pull closes the remaining gap on the same tick
        assert_eq!(world.npc_snakes[0].head(), Vec3::new(10.0, 10.0, 11.0));
        assert!(world.foods.is_empty());
        assert_eq!(world.npc_snakes[0].pending_growth, 1);
        assert_eq!(world.score, 0);
    }

    #[test]
    fn test_player_head_in_npc_body_is_fatal() {
        let mut world = bare_world(11);
        let head = world.player_head();
        place_npc(
            &mut world,
            vec![head + Vec3::X, head, head - Vec3::X],
            Vec3::Z,
        );
        resolve_collisions(&mut world);
        assert!(world.game_over);
        assert_eq!(world.crash_pos, Some(head));
    }

    #[test]
    fn test_head_on_collision_kills_both() {
        let mut world = bare_world(11);
        let pos = Vec3::new(40.0, 40.0, 40.0);
        place_npc(
            &mut world,
            vec![pos, pos - Vec3::Z, pos - Vec3::Z * 2.0],
            Vec3::Z,
        );
        place_npc(
            &mut world,
            vec![pos, pos + Vec3::Z, pos + Vec3::Z * 2.0],
            Vec3::NEG_Z,
        );
        resolve_collisions(&mut world);
        assert!(world.npc_snakes[0].dead);
        assert!(world.npc_snakes[1].dead);
        assert!(world.events.iter().any(|e| matches!(
            e,
            GameEvent::Explosion {
                color: COLOR_WHITE,
                ..
            }
        )));
    }

    #[test]
    fn test_self_collision_skips_neck_segments() {
        let mut world = bare_world(11);
        let head = Vec3::new(40.0, 40.0, 40.0);
        // head coincides with segment 2: too close to the neck, not a hit
        place_npc(
            &mut world,
            vec![head, head - Vec3::Z, head, head - Vec3::X],
            Vec3::Z,
        );
        resolve_collisions(&mut world);
        assert!(!world.npc_snakes[0].dead);

        // head coinciding with segment 5 is a real self-collision
        let idx = place_npc(
            &mut world,
            vec![
                head,
                head - Vec3::Z,
                head - Vec3::Z * 2.0,
                head - Vec3::Z * 3.0,
                head - Vec3::X,
                head,
            ],
            Vec3::Z,
        );
        resolve_collisions(&mut world);
        assert!(world.npc_snakes[idx].dead);
    }
}
