//! Black hole hazards
//!
//! Each hole is a small state machine: `active` until it either expires,
//! merges away, or escalates to `cannibal` by consuming the rare food.
//! A cannibal hole that grows past [`SUPERNOVA_SIZE`] detonates, throwing a
//! radial impulse at everything nearby.
//!
//! The pairwise merge loop runs in index order and earlier resolutions are
//! visible to later pair checks in the same tick. That ordering is part of
//! the behavior, not an accident; do not reorder or batch it.

use glam::Vec3;
use rand::Rng;

use super::state::{BlackHole, GameEvent, World};
use super::torus;
use crate::consts::*;

/// One BlackHoleField pass: filter, respawn, step every hole, then resolve
/// supernovas. Player death aborts the pass immediately.
pub(crate) fn update(world: &mut World) {
    world.black_holes.retain(|bh| !bh.expired);
    spawn_deficit(world);
    if step_holes(world) {
        return;
    }
    supernova_pass(world);
}

fn spawn_deficit(world: &mut World) {
    let deficit = world.max_black_holes.saturating_sub(world.black_holes.len());
    for _ in 0..deficit {
        if !try_spawn(world) {
            // grid too crowded; the deficit check retries next tick
            break;
        }
    }
}

/// Rejection-sample a spawn cell clear of snakes, food, other holes, and a
/// safety radius around the player head.
fn try_spawn(world: &mut World) -> bool {
    let n = world.grid_size;
    let head = world.player_head();

    for _ in 0..SPAWN_MAX_TRIES {
        let pos = world.rand_cell();
        let occupied = world.snake_segments().any(|s| s == pos)
            || world.foods.iter().any(|f| f.pos == pos)
            || world.black_holes.iter().any(|bh| bh.pos == pos);
        if occupied || torus::toroidal_distance(head, pos, n) < BLACK_HOLE_SPAWN_SAFE_RADIUS {
            continue;
        }

        let id = world.next_entity_id();
        let lifetime = world
            .rng
            .random_range(BLACK_HOLE_MIN_LIFETIME_MS..BLACK_HOLE_MAX_LIFETIME_MS);
        let move_dir = world.rand_unit_dir();
        world.black_holes.push(BlackHole {
            id,
            pos,
            expires_at_ms: world.time_ms + lifetime,
            size: 1.0,
            speed_multiplier: 1.0,
            move_dir,
            is_cannibal: false,
            expired: false,
        });
        return true;
    }
    false
}

/// Advance every live hole: expiry, wander, feeding, pairwise resolution,
/// player magnetism and contact. Returns true if the player died.
fn step_holes(world: &mut World) -> bool {
    let n = world.grid_size;

    for i in 0..world.black_holes.len() {
        if world.black_holes[i].expired {
            continue;
        }

        // Expiry
        {
            let now = world.time_ms;
            let bh = &mut world.black_holes[i];
            if now > bh.expires_at_ms {
                bh.expired = true;
                let (pos, cannibal) = (bh.pos, bh.is_cannibal);
                world.events.push(GameEvent::Explosion {
                    pos,
                    color: if cannibal { COLOR_GOLD } else { COLOR_BLACK },
                    cannibal,
                });
                continue;
            }
        }

        // Wander: occasional re-roll, then drift along the current direction
        if world.rng.random::<f64>() < 0.01 {
            let dir = world.rand_unit_dir();
            world.black_holes[i].move_dir = dir;
        }
        {
            let bh = &world.black_holes[i];
            let speed = BLACK_HOLE_BASE_SPEED * bh.speed_multiplier;
            let (dir, cannibal, size) = (bh.move_dir, bh.is_cannibal, bh.size);
            let (pos, crossings) = torus::wrap_crossings(bh.pos + dir * speed, n);
            world.black_holes[i].pos = pos;
            let color = if cannibal { COLOR_GOLD } else { COLOR_WHITE };
            for crossing in crossings {
                world.push_portal_pair(pos, crossing, dir, color, cannibal, size);
            }
        }

        // Feed on common food. No directional gate here: a hole swallows
        // whatever falls in. Growth lands immediately, so later food in the
        // same pass sees the enlarged radius and pull tiers.
        {
            let pos = world.black_holes[i].pos;
            for f in &mut world.foods {
                if f.eaten {
                    continue;
                }
                let size = world.black_holes[i].size;
                let delta = torus::nearest_delta(pos, f.pos, n);
                let dist = delta.length();
                if dist < BLACK_HOLE_EAT_RADIUS * size {
                    f.eaten = true;
                    world.black_holes[i].size += 0.05;
                    world.events.push(GameEvent::Explosion {
                        pos: f.pos,
                        color: COLOR_FOOD,
                        cannibal: false,
                    });
                } else if dist < 5.0 * size {
                    let mut pull = 0.2;
                    if dist < 2.5 * size {
                        pull = 0.5;
                    }
                    if dist < 1.5 * size {
                        pull = 0.9;
                    }
                    f.pos = torus::wrap(f.pos - delta * pull, n);
                }
            }
        }

        // Rare food: the only path to cannibal mode
        {
            let (pos, size) = {
                let bh = &world.black_holes[i];
                (bh.pos, bh.size)
            };
            let eat_radius = BLACK_HOLE_EAT_RADIUS * size;
            let mut consumed_at = None;
            if let Some(rf) = world.rare_food.as_mut() {
                let delta = torus::nearest_delta(pos, rf.pos, n);
                let dist = delta.length();
                if dist < eat_radius {
                    consumed_at = Some(rf.pos);
                } else if dist < 10.0 * size {
                    let mut pull = 0.3;
                    if dist < 5.0 * size {
                        pull = 0.6;
                    }
                    if dist < 2.5 * size {
                        pull = 0.95;
                    }
                    rf.pos = torus::wrap(rf.pos - delta * pull, n);
                }
            }
            if let Some(rpos) = consumed_at {
                world.rare_food = None;
                let bh = &mut world.black_holes[i];
                bh.speed_multiplier += 0.5;
                bh.size += 0.2;
                bh.expires_at_ms += 300_000;
                bh.is_cannibal = true;
                let id = bh.id;
                world.events.push(GameEvent::Explosion {
                    pos: rpos,
                    color: COLOR_YELLOW,
                    cannibal: false,
                });
                log::debug!("black hole {id} went cannibal");
            }
        }

        // Pairwise resolution against every later hole
        for j in (i + 1)..world.black_holes.len() {
            let (pos_i, size_i, can_i, exp_i) = {
                let b = &world.black_holes[i];
                (b.pos, b.size, b.is_cannibal, b.expired)
            };
            if exp_i {
                break;
            }
            let (pos_j, size_j, can_j, exp_j) = {
                let b = &world.black_holes[j];
                (b.pos, b.size, b.is_cannibal, b.expired)
            };
            if exp_j {
                continue;
            }

            let delta = torus::nearest_delta(pos_i, pos_j, n);
            let dist = delta.length();

            if dist < (size_i + size_j) * 1.1 {
                if can_i && !can_j {
                    // cannibal devours the plain hole and grows
                    world.black_holes[j].expired = true;
                    let bh = &mut world.black_holes[i];
                    bh.size *= 1.15;
                    bh.expires_at_ms = bh.expires_at_ms.saturating_sub(5_000);
                    world.events.push(GameEvent::Explosion {
                        pos: pos_j,
                        color: COLOR_BLACK,
                        cannibal: false,
                    });
                } else if !can_i && can_j {
                    world.black_holes[i].expired = true;
                    let bh = &mut world.black_holes[j];
                    bh.size *= 1.15;
                    bh.expires_at_ms = bh.expires_at_ms.saturating_sub(5_000);
                    world.events.push(GameEvent::Explosion {
                        pos: pos_i,
                        color: COLOR_BLACK,
                        cannibal: false,
                    });
                } else {
                    // like annihilates like
                    world.black_holes[i].expired = true;
                    world.black_holes[j].expired = true;
                    let both_cannibal = can_i && can_j;
                    let mid = torus::wrap(pos_i + delta * 0.5, n);
                    world.events.push(GameEvent::Explosion {
                        pos: mid,
                        color: if both_cannibal { COLOR_GOLD } else { COLOR_WHITE },
                        cannibal: both_cannibal,
                    });
                }
                if world.black_holes[i].expired {
                    break;
                }
            } else if dist < 15.0 {
                // soft mutual draw, inverse-distance tiers
                let mut force = 0.05;
                if dist < 5.0 {
                    force = 0.2;
                }
                if dist < 3.0 {
                    force = 0.5;
                }
                world.black_holes[i].pos = torus::wrap(pos_i + delta * force, n);
                world.black_holes[j].pos = torus::wrap(pos_j - delta * force, n);
            }
        }
        if world.black_holes[i].expired {
            continue;
        }

        // Player magnetism and contact
        let head = world.player_head();
        let heading = world.heading;
        {
            let (mut pos, size) = {
                let bh = &world.black_holes[i];
                (bh.pos, bh.size)
            };
            let delta = torus::nearest_delta(head, pos, n);
            let mut dist = delta.length();

            if dist < BLACK_HOLE_MAGNET_RANGE * size {
                let dot = delta.dot(heading);
                if dot > -2.0 || dist < 2.5 {
                    world.is_attracting = true;
                    let mut pull = 0.1 + size * 0.05;
                    if dist < 5.0 {
                        pull *= 2.0;
                    }
                    if dist < 2.5 {
                        pull *= 2.0;
                    }
                    pos = torus::wrap(pos - delta * pull, n);
                    world.black_holes[i].pos = pos;
                    dist = torus::toroidal_distance(head, pos, n);
                }
            }

            if dist < size {
                world.black_holes[i].expired = true;
                world.events.push(GameEvent::Explosion {
                    pos,
                    color: COLOR_BLACK,
                    cannibal: false,
                });

                if world.player.len() <= MIN_SURVIVABLE_LENGTH {
                    world.game_over = true;
                    world.crash_pos = Some(pos);
                    log::info!(
                        "game over at tick {}: black hole impact at {pos:?}, score {}",
                        world.time_ticks,
                        world.score
                    );
                    return true;
                }

                let damage = (10.0 * size).floor() as usize;
                for _ in 0..damage {
                    if world.player.len() > 1 {
                        world.player.pop();
                    }
                }
                world.camera_shake = 20.0;
                log::debug!("black hole impact cost {damage} segments");
            }
        }
        if world.black_holes[i].expired {
            continue;
        }

        // NPC snakes lack the player's bulk: head contact swallows the snake
        // whole and collapses the hole with it
        {
            let (pos, size) = {
                let bh = &world.black_holes[i];
                (bh.pos, bh.size)
            };
            for s in 0..world.npc_snakes.len() {
                if world.npc_snakes[s].dead {
                    continue;
                }
                let npc_head = world.npc_snakes[s].head();
                if torus::toroidal_distance(pos, npc_head, n) < size {
                    world.npc_snakes[s].dead = true;
                    world.black_holes[i].expired = true;
                    world.events.push(GameEvent::Explosion {
                        pos: npc_head,
                        color: COLOR_BLACK,
                        cannibal: false,
                    });
                    break;
                }
            }
        }
    }

    false
}

/// Detonate every oversized cannibal hole, pushing food, holes, and snake
/// segments radially outward. Player segments inside the lethal core end
/// the run; shrapnel range rolls per-segment tail loss instead.
fn supernova_pass(world: &mut World) {
    let n = world.grid_size;

    for i in 0..world.black_holes.len() {
        let (center, detonates) = {
            let b = &world.black_holes[i];
            (b.pos, !b.expired && b.is_cannibal && b.size > SUPERNOVA_SIZE)
        };
        if !detonates {
            continue;
        }

        world.black_holes[i].expired = true;
        world.events.push(GameEvent::Supernova {
            pos: center,
            color: COLOR_GOLD,
        });
        log::info!("supernova at {center:?}");

        for f in &mut world.foods {
            if f.eaten {
                continue;
            }
            let d = torus::nearest_delta(center, f.pos, n);
            let dist_sq = d.length_squared();
            if dist_sq < SUPERNOVA_RANGE_SQ && dist_sq > 1e-6 {
                let dist = dist_sq.sqrt();
                let force = 100.0 / (dist + 5.0);
                f.pos = torus::wrap(f.pos + (d / dist) * force * 5.0, n);
            }
        }

        for j in 0..world.black_holes.len() {
            if j == i || world.black_holes[j].expired {
                continue;
            }
            let pos = world.black_holes[j].pos;
            let d = torus::nearest_delta(center, pos, n);
            let dist_sq = d.length_squared();
            if dist_sq < SUPERNOVA_RANGE_SQ && dist_sq > 1e-6 {
                let dist = dist_sq.sqrt();
                let force = 50.0 / (dist + 5.0);
                world.black_holes[j].pos = torus::wrap(pos + (d / dist) * force * 5.0, n);
            }
        }

        // Player: lethal core, then per-segment shrapnel rolls, then impulse
        let mut severed = 0_usize;
        for k in 0..world.player.len() {
            let seg = world.player[k];
            let d = torus::nearest_delta(center, seg, n);
            let dist_sq = d.length_squared();
            if dist_sq >= SUPERNOVA_RANGE_SQ {
                continue;
            }
            let dist = dist_sq.sqrt();
            if dist < 15.0 {
                world.game_over = true;
                world.crash_pos = Some(center);
                log::info!(
                    "game over at tick {}: caught in supernova at {center:?}, score {}",
                    world.time_ticks,
                    world.score
                );
                return;
            }
            if dist < 40.0 && world.rng.random::<f64>() < 0.3 {
                severed += 1;
            }
            if dist > 1e-3 {
                let force = 40.0 / (dist + 5.0);
                world.player[k] = torus::wrap(seg + (d / dist) * force * 2.0, n);
            }
        }
        for _ in 0..severed {
            if world.player.len() > 1 {
                world.player.pop();
            }
        }

        // NPC snakes: heads in the lethal core die outright, the rest of the
        // body just takes the shove
        for s in 0..world.npc_snakes.len() {
            if world.npc_snakes[s].dead {
                continue;
            }
            let npc_head = world.npc_snakes[s].head();
            if torus::toroidal_distance(center, npc_head, n) < 15.0 {
                world.npc_snakes[s].dead = true;
                world.events.push(GameEvent::Explosion {
                    pos: npc_head,
                    color: COLOR_BLACK,
                    cannibal: true,
                });
                continue;
            }
            for k in 0..world.npc_snakes[s].segments.len() {
                let seg = world.npc_snakes[s].segments[k];
                let d = torus::nearest_delta(center, seg, n);
                let dist_sq = d.length_squared();
                if dist_sq < SUPERNOVA_RANGE_SQ && dist_sq > 1e-6 {
                    let dist = dist_sq.sqrt();
                    let force = 40.0 / (dist + 5.0);
                    world.npc_snakes[s].segments[k] =
                        torus::wrap(seg + (d / dist) * force * 2.0, n);
                }
            }
        }
    }
}
