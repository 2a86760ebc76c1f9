//! Server-issued game configuration
//!
//! Sent once per session by the authority. Components receive it by reference;
//! reconfiguration replaces the whole value.

use serde::{Deserialize, Serialize};

/// World size, economy constants and client tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub world_size: f64,
    pub grid_size: f64,

    /// Also the radius constant `k` in `radius = k * sqrt(mass)`
    pub pellet_radius: f64,

    pub virus_mass: f64,
    pub virus_explode_threshold: f64,
    pub virus_explode_speed: f64,
    pub virus_feed_mass: f64,
    pub virus_feeds_to_split: u32,
    pub virus_projectile_speed: f64,
    pub virus_projectile_range: f64,

    pub eject_threshold: f64,
    /// Mass removed from the ejecting cell
    pub eject_loss: f64,
    /// Mass carried by the projectile (not equal to the loss)
    pub eject_mass_gain: f64,
    pub eject_range: f64,
    pub eject_speed: f64,

    pub split_threshold: f64,
    pub split_speed: f64,
    /// Ballistic flight time of a fresh split, in ms
    pub split_flight_duration: f64,
    pub merge_speed: f64,

    pub start_mass: f64,
    /// Fraction of mass lost per second
    pub decay_rate: f64,

    // Client-side tuning
    /// `C` in `v = C * mass^exponent`
    pub speed_constant: f64,
    pub speed_exponent: f64,
    /// Exponential smoothing factor `g` for visual mass
    pub visual_smoothing: f64,
    /// Weight of player-velocity mimicry in split follow motion
    pub split_follow_weight: f64,
    /// Half-width of the random eject angle, in radians
    pub eject_spread: f64,
    /// Per-frame velocity damping for ejected mass past its range
    pub eject_damping: f64,
    pub max_cells: usize,
    /// Decay floor
    pub min_mass: f64,
    pub merge_delay_base_ms: f64,
    pub merge_delay_per_mass: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_size: 11000.0,
            grid_size: 50.0,
            pellet_radius: 5.0,
            virus_mass: 100.0,
            virus_explode_threshold: 133.0,
            virus_explode_speed: 250.0,
            virus_feed_mass: 15.0,
            virus_feeds_to_split: 7,
            virus_projectile_speed: 350.0,
            virus_projectile_range: 350.0,
            eject_threshold: 35.0,
            eject_loss: 18.0,
            eject_mass_gain: 13.0,
            eject_range: 320.0,
            eject_speed: 350.0,
            split_threshold: 32.0,
            split_speed: 400.0,
            split_flight_duration: 1000.0,
            merge_speed: 100.0,
            start_mass: 25.0,
            decay_rate: 0.002,
            speed_constant: 900.0,
            speed_exponent: -0.35,
            visual_smoothing: 0.15,
            split_follow_weight: 0.5,
            eject_spread: 0.1,
            eject_damping: 0.92,
            max_cells: 16,
            min_mass: 10.0,
            merge_delay_base_ms: 30000.0,
            merge_delay_per_mass: 0.02333,
        }
    }
}

impl GameConfig {
    /// Radius derived from mass
    pub fn radius_for_mass(&self, mass: f64) -> f64 {
        self.pellet_radius * mass.max(0.0).sqrt()
    }

    /// Minimum age in ms before a split piece of `mass` may merge back
    pub fn merge_delay_for(&self, mass: f64) -> f64 {
        self.merge_delay_base_ms + self.merge_delay_per_mass * mass * 1000.0
    }
}
