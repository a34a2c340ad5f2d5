//! Toro Snake entry point
//!
//! Headless driver: runs the simulation at the logical tick rate with a
//! simple survival pilot, reports what happened, and records the score.
//! Usage: `toro-snake [seed] [max-ticks]`.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use toro_snake::HighScores;
use toro_snake::sim::{GameEvent, TickResult, World, advance, torus, wrap};

/// Steers the player like a cautious NPC: keep going straight while the
/// next cell is clear, otherwise (or occasionally, to stay unpredictable)
/// turn onto a clear perpendicular axis.
struct Pilot {
    rng: Pcg32,
}

impl Pilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn next_heading(&mut self, world: &World) -> Vec3 {
        let heading = world.heading;
        let head = world.player_head();
        let n = world.grid_size;

        let ahead = wrap(head + heading, n);
        let blocked = world.player.iter().any(|s| *s == ahead);
        if !blocked && self.rng.random::<f32>() < 0.95 {
            return heading;
        }

        let mut clear: Vec<Vec3> = Vec::new();
        for cand in torus::AXIS_DIRS {
            if cand == heading || cand == -heading {
                continue;
            }
            let target = wrap(head + cand, n);
            if !world.player.iter().any(|s| *s == target) {
                clear.push(cand);
            }
        }
        match clear.len() {
            0 => heading,
            len => clear[self.rng.random_range(0..len)],
        }
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or_else(unix_ms);
    let max_ticks: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(3_000);

    log::info!("Toro Snake starting: seed {seed}, up to {max_ticks} ticks");

    let mut world = World::new(seed);
    let mut pilot = Pilot::new(seed ^ 0x70f0_5eed);

    let mut explosions = 0_u64;
    let mut portals = 0_u64;
    let mut warps = 0_u64;
    let mut supernovas = 0_u64;

    let crash = loop {
        world.next_heading = pilot.next_heading(&world);
        let result = advance(&mut world);

        for event in world.drain_events() {
            match event {
                GameEvent::Explosion { .. } => explosions += 1,
                GameEvent::PortalSpawn { .. } => portals += 1,
                GameEvent::Warp => warps += 1,
                GameEvent::Supernova { pos, .. } => {
                    supernovas += 1;
                    log::info!("supernova observed at {pos:?}");
                }
            }
        }

        match result {
            TickResult::GameOver { crash_pos } => break Some(crash_pos),
            TickResult::Alive => {}
        }
        if world.time_ticks >= max_ticks {
            break None;
        }
    };

    println!("seed:       {seed}");
    println!("ticks:      {}", world.time_ticks);
    println!("score:      {}", world.score);
    println!("length:     {}", world.player.len());
    match crash {
        Some(pos) => println!("outcome:    crashed at {pos:?}"),
        None => println!("outcome:    survived"),
    }
    println!(
        "events:     {explosions} explosions, {portals} portals, {warps} warps, {supernovas} supernovas"
    );

    let path = PathBuf::from("highscores.json");
    let mut scores = HighScores::load(&path);
    if let Some(rank) = scores.add_score(world.score, world.time_ticks, unix_ms()) {
        println!("high score: rank {rank}");
        scores.save(&path);
    }
}
