//! Eject and split actions
//!
//! One keystroke acts on every eligible cell: the player and each split.

use rand::Rng;

use crate::config::GameConfig;

use super::entities::{Ejected, Player, SplitBlob};

pub struct ActionSystem;

impl ActionSystem {
    /// Eject one projectile from each cell at or above the eject threshold.
    /// Returns the number of projectiles spawned.
    pub fn eject<R: Rng>(
        player: &mut Player,
        splits: &mut [SplitBlob],
        ejected: &mut Vec<Ejected>,
        pointer: (f64, f64),
        config: &GameConfig,
        rng: &mut R,
    ) -> usize {
        let before = ejected.len();

        let origin = (player.x, player.y);
        let radius = player.radius;
        if let Some(shot) = eject_from(&mut player.mass, origin, radius, pointer, config, rng) {
            ejected.push(shot);
        }
        for split in splits.iter_mut() {
            let origin = (split.x, split.y);
            if let Some(shot) =
                eject_from(&mut split.mass, origin, split.radius, pointer, config, rng)
            {
                ejected.push(shot);
            }
        }

        ejected.len() - before
    }

    /// Halve each cell at or above the split threshold, launching the other
    /// half toward the pointer. Never exceeds `max_cells`.
    pub fn split<R: Rng>(
        player: &mut Player,
        splits: &mut Vec<SplitBlob>,
        pointer: (f64, f64),
        now_ms: u64,
        config: &GameConfig,
        rng: &mut R,
    ) -> usize {
        let mut cell_count = splits.len() + 1;
        let mut spawned = Vec::new();

        if cell_count < config.max_cells {
            let origin = (player.x, player.y);
            if let Some(piece) =
                split_from(&mut player.mass, origin, pointer, now_ms, config, rng)
            {
                spawned.push(piece);
                cell_count += 1;
            }
        }
        for split in splits.iter_mut() {
            if cell_count >= config.max_cells {
                break;
            }
            let origin = (split.x, split.y);
            if let Some(piece) = split_from(&mut split.mass, origin, pointer, now_ms, config, rng) {
                spawned.push(piece);
                cell_count += 1;
            }
        }

        let count = spawned.len();
        splits.extend(spawned);
        count
    }
}

fn aim(from: (f64, f64), pointer: (f64, f64)) -> f64 {
    (pointer.1 - from.1).atan2(pointer.0 - from.0)
}

fn eject_from<R: Rng>(
    mass: &mut f64,
    origin: (f64, f64),
    radius: f64,
    pointer: (f64, f64),
    config: &GameConfig,
    rng: &mut R,
) -> Option<Ejected> {
    if *mass < config.eject_threshold {
        return None;
    }
    // Actual mass only; visual mass catches up through smoothing
    *mass -= config.eject_loss;

    let spread = config.eject_spread.abs();
    let angle = aim(origin, pointer) + rng.gen_range(-spread..=spread);
    let offset = radius + config.pellet_radius;

    Some(Ejected {
        x: origin.0 + angle.cos() * offset,
        y: origin.1 + angle.sin() * offset,
        vx: angle.cos() * config.eject_speed,
        vy: angle.sin() * config.eject_speed,
        mass: config.eject_mass_gain,
        radius: config.radius_for_mass(config.eject_mass_gain),
        travelled: 0.0,
    })
}

fn split_from<R: Rng>(
    mass: &mut f64,
    origin: (f64, f64),
    pointer: (f64, f64),
    now_ms: u64,
    config: &GameConfig,
    rng: &mut R,
) -> Option<SplitBlob> {
    if *mass < config.split_threshold {
        return None;
    }
    let half = *mass / 2.0;
    *mass = half;

    let angle = aim(origin, pointer);
    let velocity = (angle.cos() * config.split_speed, angle.sin() * config.split_speed);
    Some(SplitBlob::new(origin.0, origin.1, velocity, half, now_ms, config, rng))
}
