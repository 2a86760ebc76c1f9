//! Local and mirrored entity types

use rand::Rng;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{RemotePlayerState, RemoteSplitState};

/// Anything round that takes part in overlap tests
pub trait Circle {
    fn position(&self) -> (f64, f64);
    fn radius(&self) -> f64;
    /// Actual (consumption-authoritative) mass
    fn mass(&self) -> f64;
}

/// The local player's main cell
#[derive(Debug, Clone)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    /// Observed velocity over the last frame, followed by trailing splits
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub visual_mass: f64,
    /// Derived from visual mass
    pub radius: f64,
    pub color: String,
}

impl Player {
    pub fn new(x: f64, y: f64, mass: f64, color: String, config: &GameConfig) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            mass,
            visual_mass: mass,
            radius: config.radius_for_mass(mass),
            color,
        }
    }

    /// Fresh player at a random position with the starting mass
    pub fn spawn<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let margin = 100.0_f64.min(config.world_size / 2.0);
        let x = rng.gen_range(margin..=config.world_size - margin);
        let y = rng.gen_range(margin..=config.world_size - margin);
        let color = format!("hsl({},70%,60%)", rng.gen_range(0..=360));
        Self::new(x, y, config.start_mass, color, config)
    }
}

impl Circle for Player {
    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
    fn radius(&self) -> f64 {
        self.radius
    }
    fn mass(&self) -> f64 {
        self.mass
    }
}

/// A locally owned split piece
#[derive(Debug, Clone)]
pub struct SplitBlob {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub visual_mass: f64,
    pub radius: f64,
    /// Birth timestamp in ms
    pub born: u64,
    /// Minimum age in ms before merging back
    pub merge_delay: f64,
}

impl SplitBlob {
    pub fn new<R: Rng>(
        x: f64,
        y: f64,
        (vx, vy): (f64, f64),
        mass: f64,
        now_ms: u64,
        config: &GameConfig,
        rng: &mut R,
    ) -> Self {
        Self {
            id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
            x,
            y,
            vx,
            vy,
            mass,
            visual_mass: mass,
            radius: config.radius_for_mass(mass),
            born: now_ms,
            merge_delay: config.merge_delay_for(mass),
        }
    }

    /// Age in ms
    pub fn age(&self, now_ms: u64) -> f64 {
        now_ms.saturating_sub(self.born) as f64
    }

    pub fn can_merge(&self, now_ms: u64) -> bool {
        self.age(now_ms) >= self.merge_delay
    }
}

impl Circle for SplitBlob {
    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
    fn radius(&self) -> f64 {
        self.radius
    }
    fn mass(&self) -> f64 {
        self.mass
    }
}

/// Locally ejected mass in flight. Has no durable id.
#[derive(Debug, Clone)]
pub struct Ejected {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub radius: f64,
    pub travelled: f64,
}

/// Interpolation bookkeeping for a remote entity
///
/// Physics reads the target; rendering reads `position_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interp {
    pub from_x: f64,
    pub from_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    /// Timestamp of the last authoritative update, ms
    pub last_update: u64,
    /// Observed gap between the last two updates, ms
    pub update_interval: u64,
}

impl Interp {
    /// First observation: no history, so snap
    pub fn snap(x: f64, y: f64, now_ms: u64) -> Self {
        Self {
            from_x: x,
            from_y: y,
            target_x: x,
            target_y: y,
            last_update: now_ms,
            update_interval: 0,
        }
    }

    /// Record a new authoritative position as the interpolation target
    pub fn retarget(&mut self, x: f64, y: f64, now_ms: u64) {
        let (cx, cy) = self.position_at(now_ms);
        self.from_x = cx;
        self.from_y = cy;
        self.target_x = x;
        self.target_y = y;
        self.update_interval = now_ms.saturating_sub(self.last_update);
        self.last_update = now_ms;
    }

    /// Rendered position at `now_ms`
    pub fn position_at(&self, now_ms: u64) -> (f64, f64) {
        if self.update_interval == 0 {
            return (self.target_x, self.target_y);
        }
        let t = (now_ms.saturating_sub(self.last_update) as f64 / self.update_interval as f64)
            .clamp(0.0, 1.0);
        (
            self.from_x + (self.target_x - self.from_x) * t,
            self.from_y + (self.target_y - self.from_y) * t,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub id: String,
    pub mass: f64,
    pub radius: f64,
    pub color: String,
    pub interp: Interp,
}

impl RemotePlayer {
    pub fn observe(state: RemotePlayerState, now_ms: u64) -> Self {
        Self {
            interp: Interp::snap(state.x, state.y, now_ms),
            id: state.id,
            mass: state.mass,
            radius: state.radius,
            color: state.color,
        }
    }

    pub fn update(&mut self, x: f64, y: f64, mass: f64, radius: f64, now_ms: u64) {
        self.interp.retarget(x, y, now_ms);
        self.mass = mass;
        self.radius = radius;
    }
}

impl Circle for RemotePlayer {
    fn position(&self) -> (f64, f64) {
        (self.interp.target_x, self.interp.target_y)
    }
    fn radius(&self) -> f64 {
        self.radius
    }
    fn mass(&self) -> f64 {
        self.mass
    }
}

#[derive(Debug, Clone)]
pub struct RemoteSplit {
    pub id: String,
    pub player_id: String,
    pub mass: f64,
    pub radius: f64,
    pub interp: Interp,
}

impl RemoteSplit {
    pub fn observe(state: RemoteSplitState, now_ms: u64, config: &GameConfig) -> Self {
        Self {
            interp: Interp::snap(state.x, state.y, now_ms),
            radius: config.radius_for_mass(state.mass),
            id: state.id,
            player_id: state.player_id,
            mass: state.mass,
        }
    }

    pub fn update(&mut self, state: &RemoteSplitState, now_ms: u64, config: &GameConfig) {
        self.interp.retarget(state.x, state.y, now_ms);
        self.mass = state.mass;
        self.radius = config.radius_for_mass(state.mass);
    }
}

impl Circle for RemoteSplit {
    fn position(&self) -> (f64, f64) {
        (self.interp.target_x, self.interp.target_y)
    }
    fn radius(&self) -> f64 {
        self.radius
    }
    fn mass(&self) -> f64 {
        self.mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn spawn_stays_inside_margin() {
        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let p = Player::spawn(&config, &mut rng);
            assert!(p.x >= 100.0 && p.x <= config.world_size - 100.0);
            assert!(p.y >= 100.0 && p.y <= config.world_size - 100.0);
            assert_eq!(p.mass, config.start_mass);
            assert_eq!(p.visual_mass, p.mass);
        }
    }

    #[test]
    fn split_ids_are_unique_and_seeded() {
        let config = GameConfig::default();
        let mut a = ChaCha8Rng::seed_from_u64(1);
        let mut b = ChaCha8Rng::seed_from_u64(1);
        let s1 = SplitBlob::new(0.0, 0.0, (0.0, 0.0), 20.0, 0, &config, &mut a);
        let s2 = SplitBlob::new(0.0, 0.0, (0.0, 0.0), 20.0, 0, &config, &mut a);
        let s3 = SplitBlob::new(0.0, 0.0, (0.0, 0.0), 20.0, 0, &config, &mut b);
        assert_ne!(s1.id, s2.id);
        assert_eq!(s1.id, s3.id);
    }

    #[test]
    fn interp_first_observation_snaps_then_blends() {
        let mut interp = Interp::snap(0.0, 0.0, 1000);
        assert_eq!(interp.position_at(1000), (0.0, 0.0));

        interp.retarget(100.0, 0.0, 1100);
        assert_eq!(interp.update_interval, 100);
        assert_eq!(interp.position_at(1100), (0.0, 0.0));
        assert_eq!(interp.position_at(1150), (50.0, 0.0));
        assert_eq!(interp.position_at(5000), (100.0, 0.0));
    }

    #[test]
    fn split_merge_eligibility_follows_age() {
        let config = GameConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let split = SplitBlob::new(0.0, 0.0, (0.0, 0.0), 50.0, 1_000, &config, &mut rng);
        let ready_at = 1_000 + split.merge_delay.ceil() as u64;
        assert!(!split.can_merge(ready_at - 1));
        assert!(split.can_merge(ready_at));
    }
}
