//! Kinematics and mass decay for locally predicted entities

use crate::config::GameConfig;

use super::entities::{Ejected, Player, SplitBlob};

/// Gap below which visual mass snaps to actual mass
pub const VISUAL_SNAP_EPSILON: f64 = 0.1;

pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}

/// Normalize a direction vector; zero stays zero
pub fn normalize(x: f64, y: f64) -> (f64, f64) {
    let len = x.hypot(y);
    if len < 1e-4 {
        (0.0, 0.0)
    } else {
        (x / len, y / len)
    }
}

/// Clamp position to `[radius, world_size - radius]` on both axes
pub fn clamp_to_world(x: f64, y: f64, radius: f64, world_size: f64) -> (f64, f64) {
    let hi = (world_size - radius).max(radius);
    (x.clamp(radius, hi), y.clamp(radius, hi))
}

/// One exponential smoothing step of visual mass toward actual mass
pub fn smooth_visual_mass(visual: f64, actual: f64, factor: f64) -> f64 {
    if (actual - visual).abs() < VISUAL_SNAP_EPSILON {
        actual
    } else {
        visual + (actual - visual) * factor
    }
}

/// Proportional decay over `dt` seconds, never below `floor`
pub fn decay_mass(mass: f64, rate: f64, dt: f64, floor: f64) -> f64 {
    if mass <= floor {
        return mass;
    }
    (mass - mass * rate * dt).max(floor)
}

/// Movement speed; heavier cells are slower
pub fn speed_for_mass(config: &GameConfig, mass: f64) -> f64 {
    config.speed_constant * mass.max(1.0).powf(config.speed_exponent)
}

/// Per-frame integration for the local player, its splits and ejected mass
pub struct KinematicsSystem;

impl KinematicsSystem {
    /// Move the player toward the pointer target, then smooth, clamp and decay
    pub fn update_player(player: &mut Player, target: (f64, f64), config: &GameConfig, dt: f64) {
        let (start_x, start_y) = (player.x, player.y);
        let dx = target.0 - player.x;
        let dy = target.1 - player.y;
        let dist = dx.hypot(dy);

        if dist > 1e-3 {
            let theta = dy.atan2(dx);
            // Do not overshoot the pointer
            let step = (speed_for_mass(config, player.mass) * dt).min(dist);
            player.x += theta.cos() * step;
            player.y += theta.sin() * step;
        }

        player.visual_mass =
            smooth_visual_mass(player.visual_mass, player.mass, config.visual_smoothing);
        player.radius = config.radius_for_mass(player.visual_mass);

        let (x, y) = clamp_to_world(player.x, player.y, player.radius, config.world_size);
        player.x = x;
        player.y = y;

        if dt > 0.0 {
            player.vx = (player.x - start_x) / dt;
            player.vy = (player.y - start_y) / dt;
        }

        player.mass = decay_mass(player.mass, config.decay_rate, dt, config.min_mass);
    }

    /// Ballistic flight, then trail-and-home toward the player
    pub fn update_split(
        split: &mut SplitBlob,
        player: &Player,
        now_ms: u64,
        config: &GameConfig,
        dt: f64,
    ) {
        if split.age(now_ms) >= config.split_flight_duration {
            let m = config.split_follow_weight.clamp(0.0, 1.0);
            let (hx, hy) = normalize(player.x - split.x, player.y - split.y);
            split.vx = player.vx * m + hx * config.merge_speed * (1.0 - m);
            split.vy = player.vy * m + hy * config.merge_speed * (1.0 - m);
        }

        split.x += split.vx * dt;
        split.y += split.vy * dt;

        split.visual_mass =
            smooth_visual_mass(split.visual_mass, split.mass, config.visual_smoothing);
        split.radius = config.radius_for_mass(split.visual_mass);

        let (x, y) = clamp_to_world(split.x, split.y, split.radius, config.world_size);
        split.x = x;
        split.y = y;

        split.mass = decay_mass(split.mass, config.decay_rate, dt, config.min_mass);
    }

    /// Constant velocity until the eject range is covered, then damped
    pub fn update_ejected(ejected: &mut Ejected, config: &GameConfig, dt: f64) {
        if ejected.travelled >= config.eject_range {
            ejected.vx *= config.eject_damping;
            ejected.vy *= config.eject_damping;
            if ejected.vx.hypot(ejected.vy) < 1e-3 {
                ejected.vx = 0.0;
                ejected.vy = 0.0;
            }
        }

        let mx = ejected.vx * dt;
        let my = ejected.vy * dt;
        ejected.x += mx;
        ejected.y += my;
        ejected.travelled += mx.hypot(my);

        ejected.radius = config.radius_for_mass(ejected.mass);
        let (x, y) = clamp_to_world(ejected.x, ejected.y, ejected.radius, config.world_size);
        ejected.x = x;
        ejected.y = y;
    }
}
