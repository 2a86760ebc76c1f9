//! Collision detection and consumption rules
//!
//! Runs after kinematics each frame. Local-only outcomes (pellets, own ejected
//! mass, viruses) mutate state optimistically and emit a notification;
//! outcomes against remote players are emitted as requests only and left for
//! the authority to adjudicate.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use rand::Rng;

use crate::config::GameConfig;
use crate::ws::protocol::{
    CellKind, CellSnapshot, ClientMsg, PelletState, RemoteEjectedState, VirusState,
};

use super::entities::{Circle, Ejected, Player, RemotePlayer, RemoteSplit, SplitBlob};
use super::physics::distance;
use super::session::PendingRequests;

/// Relaxation passes for split separation
pub const SEPARATION_PASSES: usize = 3;

/// Remote prey must be this much lighter than the predator
pub const EAT_MASS_RATIO: f64 = 1.1;

/// Mass per explosion piece used to size the explosion
const EXPLOSION_MASS_PER_PIECE: f64 = 12.5;
const EXPLOSION_MIN_PIECES: usize = 4;
/// Max angular jitter of an explosion piece, radians
const EXPLOSION_JITTER: f64 = 0.2;
const EXPLOSION_EXTRA_SPEED: f64 = 50.0;

/// Wire id of the local main cell when it acts as consumer
pub const MAIN_CELL_ID: &str = "main";

/// Which local cell something refers to within a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eater {
    Main,
    Split(usize),
}

/// Result of a virus explosion
#[derive(Debug)]
pub struct Explosion {
    /// Mass left in the cell that hit the virus
    pub survivor_mass: f64,
    pub pieces: Vec<SplitBlob>,
}

/// `true` when the centre of `(x, y)` lies inside `eater`
fn covers<C: Circle + ?Sized>(eater: &C, x: f64, y: f64) -> bool {
    let (ex, ey) = eater.position();
    distance(ex, ey, x, y) < eater.radius()
}

fn first_eater(player: &Player, splits: &[SplitBlob], x: f64, y: f64) -> Option<Eater> {
    if covers(player, x, y) {
        return Some(Eater::Main);
    }
    splits.iter().position(|s| covers(s, x, y)).map(Eater::Split)
}

fn snapshot_of<C: Circle + ?Sized>(cell: &C) -> CellSnapshot {
    let (x, y) = cell.position();
    CellSnapshot {
        x,
        y,
        mass: cell.mass(),
        radius: cell.radius(),
    }
}

pub struct CollisionSystem;

impl CollisionSystem {
    /// Push splits still inside their merge delay out of the player and out of
    /// each other. Not consumption.
    pub fn separate_splits<R: Rng>(
        player: &Player,
        splits: &mut [SplitBlob],
        now_ms: u64,
        rng: &mut R,
    ) {
        for _ in 0..SEPARATION_PASSES {
            Self::separation_pass(player, splits, now_ms, rng);
        }
    }

    /// A single relaxation pass
    pub fn separation_pass<R: Rng>(
        player: &Player,
        splits: &mut [SplitBlob],
        now_ms: u64,
        rng: &mut R,
    ) {
        for split in splits.iter_mut() {
            if split.can_merge(now_ms) {
                continue;
            }
            let min_dist = player.radius + split.radius;
            let dist = distance(player.x, player.y, split.x, split.y);
            if dist >= min_dist {
                continue;
            }
            let (nx, ny) = push_normal(player.x, player.y, split.x, split.y, dist, rng);
            split.x = player.x + nx * min_dist;
            split.y = player.y + ny * min_dist;
        }

        for i in 0..splits.len() {
            for j in (i + 1)..splits.len() {
                if splits[i].can_merge(now_ms) && splits[j].can_merge(now_ms) {
                    continue;
                }
                let (a, b) = (&splits[i], &splits[j]);
                let min_dist = a.radius + b.radius;
                let dist = distance(a.x, a.y, b.x, b.y);
                if dist >= min_dist {
                    continue;
                }
                let (nx, ny) = push_normal(a.x, a.y, b.x, b.y, dist, rng);
                let push = (min_dist - dist) * 0.5;

                let (left, right) = splits.split_at_mut(j);
                left[i].x -= nx * push;
                left[i].y -= ny * push;
                right[0].x += nx * push;
                right[0].y += ny * push;
            }
        }
    }

    /// Fold splits whose merge delay has elapsed and whose centre lies inside
    /// the player back into the player. Returns how many merged.
    pub fn merge_ready_splits(
        player: &mut Player,
        splits: &mut Vec<SplitBlob>,
        now_ms: u64,
    ) -> usize {
        let before = splits.len();
        splits.retain(|split| {
            if split.can_merge(now_ms) && covers(&*player, split.x, split.y) {
                player.mass += split.mass;
                false
            } else {
                true
            }
        });
        before - splits.len()
    }

    /// Eat every covered pellet, player first then splits
    pub fn consume_pellets(
        player: &mut Player,
        splits: &mut [SplitBlob],
        pellets: &mut BTreeMap<u64, PelletState>,
        out: &mut Vec<ClientMsg>,
    ) {
        let mut eaten = Vec::new();
        for pellet in pellets.values() {
            match first_eater(player, splits, pellet.x, pellet.y) {
                Some(Eater::Main) => player.mass += pellet.mass,
                Some(Eater::Split(i)) => splits[i].mass += pellet.mass,
                None => continue,
            }
            eaten.push(pellet.id);
        }
        for id in eaten {
            pellets.remove(&id);
            out.push(ClientMsg::ConsumePellet { pellet_id: id });
        }
    }

    /// Resolve each local projectile: a virus hit feeds the virus, otherwise
    /// the first covering cell absorbs it
    pub fn consume_ejected(
        player: &mut Player,
        splits: &mut [SplitBlob],
        ejected: &mut Vec<Ejected>,
        viruses: &BTreeMap<u64, VirusState>,
        config: &GameConfig,
        out: &mut Vec<ClientMsg>,
    ) {
        ejected.retain(|shot| {
            let fed = viruses.values().find(|v| {
                distance(shot.x, shot.y, v.x, v.y) < config.radius_for_mass(v.mass)
            });
            if let Some(virus) = fed {
                out.push(ClientMsg::FeedVirus {
                    virus_id: virus.id,
                    angle: (virus.y - shot.y).atan2(virus.x - shot.x),
                });
                return false;
            }

            match first_eater(player, splits, shot.x, shot.y) {
                Some(Eater::Main) => player.mass += shot.mass,
                Some(Eater::Split(i)) => splits[i].mass += shot.mass,
                None => return true,
            }
            false
        });
    }

    /// Explode cells heavy enough to pop a virus they cover. At most one
    /// explosion per virus per frame.
    pub fn collide_viruses<R: Rng>(
        player: &mut Player,
        splits: &mut Vec<SplitBlob>,
        viruses: &mut BTreeMap<u64, VirusState>,
        now_ms: u64,
        config: &GameConfig,
        rng: &mut R,
        out: &mut Vec<ClientMsg>,
    ) {
        let ids: Vec<u64> = viruses.keys().copied().collect();
        for id in ids {
            let Some(virus) = viruses.get(&id) else {
                continue;
            };

            let threshold = config.virus_explode_threshold;
            let hit = if player.mass >= threshold && covers(&*player, virus.x, virus.y) {
                Some(Eater::Main)
            } else {
                splits
                    .iter()
                    .position(|s| s.mass >= threshold && covers(s, virus.x, virus.y))
                    .map(Eater::Split)
            };
            let Some(hit) = hit else {
                continue;
            };

            let blob_mass = match hit {
                Eater::Main => player.mass,
                Eater::Split(i) => splits[i].mass,
            };
            let explosion = Self::explode(blob_mass, virus, splits.len(), now_ms, config, rng);
            match hit {
                Eater::Main => player.mass = explosion.survivor_mass,
                Eater::Split(i) => splits[i].mass = explosion.survivor_mass,
            }
            splits.extend(explosion.pieces);

            viruses.remove(&id);
            out.push(ClientMsg::ConsumeVirus { virus_id: id });
        }
    }

    /// Distribute `blob_mass + virus.mass` over the surviving cell and new
    /// pieces, keeping the player at or under `max_cells` cells
    pub fn explode<R: Rng>(
        blob_mass: f64,
        virus: &VirusState,
        split_count: usize,
        now_ms: u64,
        config: &GameConfig,
        rng: &mut R,
    ) -> Explosion {
        let total = blob_mass + virus.mass;
        let budget = config.max_cells.saturating_sub(split_count + 1);
        if budget == 0 {
            return Explosion {
                survivor_mass: total,
                pieces: Vec::new(),
            };
        }

        let by_mass = (blob_mass / EXPLOSION_MASS_PER_PIECE).floor() as usize;
        let pieces = by_mass.min(budget).max(EXPLOSION_MIN_PIECES).min(budget);
        let share = total / (pieces + 1) as f64;

        let slot = TAU / pieces as f64;
        let pieces: Vec<SplitBlob> = (0..pieces)
            .map(|i| {
                let angle = slot * i as f64 + rng.gen_range(-EXPLOSION_JITTER..=EXPLOSION_JITTER);
                let speed = config.virus_explode_speed + rng.gen_range(0.0..EXPLOSION_EXTRA_SPEED);
                SplitBlob::new(
                    virus.x,
                    virus.y,
                    (angle.cos() * speed, angle.sin() * speed),
                    share,
                    now_ms,
                    config,
                    &mut *rng,
                )
            })
            .collect();

        // Remainder goes to the survivor so the total is conserved
        let survivor_mass = total - share * pieces.len() as f64;
        Explosion {
            survivor_mass,
            pieces,
        }
    }

    /// First eligible consumption of a remote player or split, as a request.
    /// Order: main vs players, main vs splits, splits vs players, splits vs splits.
    pub fn request_player_consumption(
        player: &Player,
        splits: &[SplitBlob],
        remote_players: &BTreeMap<String, RemotePlayer>,
        remote_splits: &BTreeMap<String, RemoteSplit>,
        pending: &PendingRequests,
    ) -> Option<ClientMsg> {
        let main = [(CellKind::Player, MAIN_CELL_ID.to_string(), snapshot_of(player))];
        let local: Vec<_> = splits
            .iter()
            .map(|s| (CellKind::Split, s.id.to_string(), snapshot_of(s)))
            .collect();
        let players: Vec<_> = remote_players
            .values()
            .map(|p| (CellKind::Player, p.id.as_str(), snapshot_of(p)))
            .collect();
        let others: Vec<_> = remote_splits
            .values()
            .map(|s| (CellKind::Split, s.id.as_str(), snapshot_of(s)))
            .collect();

        let phases = [
            (&main[..], &players[..]),
            (&main[..], &others[..]),
            (&local[..], &players[..]),
            (&local[..], &others[..]),
        ];
        for (eaters, prey) in phases {
            for (kind, id, eater) in eaters {
                for (target_type, target_id, target) in prey {
                    if pending.is_player_pending(*target_type, target_id) {
                        continue;
                    }
                    if can_eat(eater, target) {
                        return Some(ClientMsg::ConsumePlayer {
                            target_id: target_id.to_string(),
                            target_type: *target_type,
                            consuming_entity_type: *kind,
                            consuming_entity_id: id.clone(),
                            consuming_entity: *eater,
                        });
                    }
                }
            }
        }
        None
    }

    /// First remote ejected mass covered by a local cell, as a request
    pub fn request_ejected_consumption(
        player: &Player,
        splits: &[SplitBlob],
        remote_ejected: &BTreeMap<u64, RemoteEjectedState>,
        pending: &PendingRequests,
    ) -> Option<ClientMsg> {
        for shot in remote_ejected.values() {
            if pending.is_ejected_pending(shot.id) {
                continue;
            }
            let Some(eater) = first_eater(player, splits, shot.x, shot.y) else {
                continue;
            };
            let request = match eater {
                Eater::Main => (CellKind::Player, MAIN_CELL_ID.to_string(), snapshot_of(player)),
                Eater::Split(i) => (
                    CellKind::Split,
                    splits[i].id.to_string(),
                    snapshot_of(&splits[i]),
                ),
            };
            return Some(ClientMsg::ConsumeOtherEjected {
                ejected_id: shot.id,
                consuming_entity_type: request.0,
                consuming_entity_id: request.1,
                consuming_entity: request.2,
            });
        }
        None
    }
}

/// Mass ratio plus centre-inside-radius, as the authority validates it
fn can_eat(eater: &CellSnapshot, prey: &CellSnapshot) -> bool {
    eater.mass >= prey.mass * EAT_MASS_RATIO
        && distance(eater.x, eater.y, prey.x, prey.y) < eater.radius
}

/// Unit vector from `a` to `b`; a random direction if the centres coincide
fn push_normal<R: Rng>(ax: f64, ay: f64, bx: f64, by: f64, dist: f64, rng: &mut R) -> (f64, f64) {
    if dist < 1e-6 {
        let angle = rng.gen_range(0.0..TAU);
        (angle.cos(), angle.sin())
    } else {
        ((bx - ax) / dist, (by - ay) / dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Interp;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn player(x: f64, y: f64, mass: f64, config: &GameConfig) -> Player {
        Player::new(x, y, mass, "hsl(1,70%,60%)".into(), config)
    }

    fn virus(id: u64, x: f64, y: f64) -> VirusState {
        VirusState {
            id,
            x,
            y,
            mass: 100.0,
            feed_count: 0,
            last_feed_angle: None,
        }
    }

    fn remote(id: &str, x: f64, y: f64, mass: f64, config: &GameConfig) -> RemotePlayer {
        RemotePlayer {
            id: id.into(),
            mass,
            radius: config.radius_for_mass(mass),
            color: String::new(),
            interp: Interp::snap(x, y, 0),
        }
    }

    #[test]
    fn pellet_under_player_is_eaten_once() {
        let mut config = GameConfig::default();
        config.pellet_radius = 4.0;
        // radius 20 at mass 25
        let mut p = player(500.0, 500.0, 25.0, &config);
        assert_eq!(p.radius, 20.0);

        let mut pellets = BTreeMap::new();
        pellets.insert(
            7,
            PelletState {
                id: 7,
                x: 500.0,
                y: 500.0,
                mass: 5.0,
                color: String::new(),
            },
        );
        let mut out = Vec::new();
        CollisionSystem::consume_pellets(&mut p, &mut [], &mut pellets, &mut out);

        assert_eq!(p.mass, 30.0);
        assert_eq!(out, vec![ClientMsg::ConsumePellet { pellet_id: 7 }]);
        assert!(pellets.is_empty());
    }

    #[test]
    fn pellet_goes_to_split_when_player_misses() {
        let config = GameConfig::default();
        let mut r = rng();
        let mut p = player(500.0, 500.0, 25.0, &config);
        let mut splits = vec![SplitBlob::new(900.0, 900.0, (0.0, 0.0), 40.0, 0, &config, &mut r)];
        let mut pellets = BTreeMap::new();
        pellets.insert(
            1,
            PelletState {
                id: 1,
                x: 905.0,
                y: 900.0,
                mass: 3.0,
                color: String::new(),
            },
        );
        let mut out = Vec::new();
        CollisionSystem::consume_pellets(&mut p, &mut splits, &mut pellets, &mut out);
        assert_eq!(p.mass, 25.0);
        assert_eq!(splits[0].mass, 43.0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn ejected_feeds_virus_before_player() {
        let config = GameConfig::default();
        let mut p = player(500.0, 500.0, 400.0, &config);
        let mut viruses = BTreeMap::new();
        viruses.insert(3, virus(3, 520.0, 500.0));
        let mut ejected = vec![Ejected {
            x: 500.0,
            y: 500.0,
            vx: 0.0,
            vy: 0.0,
            mass: 13.0,
            radius: 18.0,
            travelled: 0.0,
        }];
        let mut out = Vec::new();
        CollisionSystem::consume_ejected(
            &mut p,
            &mut [],
            &mut ejected,
            &viruses,
            &config,
            &mut out,
        );

        assert!(ejected.is_empty());
        assert_eq!(p.mass, 400.0);
        match &out[..] {
            [ClientMsg::FeedVirus { virus_id: 3, angle }] => assert!(angle.abs() < 1e-9),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn ejected_absorbed_by_covering_cell() {
        let config = GameConfig::default();
        let mut p = player(500.0, 500.0, 100.0, &config);
        let mut ejected = vec![Ejected {
            x: 510.0,
            y: 500.0,
            vx: 0.0,
            vy: 0.0,
            mass: 13.0,
            radius: 18.0,
            travelled: 400.0,
        }];
        let mut out = Vec::new();
        CollisionSystem::consume_ejected(
            &mut p,
            &mut [],
            &mut ejected,
            &BTreeMap::new(),
            &config,
            &mut out,
        );
        assert!(ejected.is_empty());
        assert_eq!(p.mass, 113.0);
        assert!(out.is_empty());
    }

    #[test]
    fn explosion_conserves_mass_and_caps_cells() {
        let config = GameConfig::default();
        let mut r = rng();
        let v = virus(1, 100.0, 100.0);
        let cases = [
            (150.0, 0usize),
            (400.0, 3),
            (1000.0, 10),
            (140.0, 13),
            (500.0, 15),
        ];
        for &(blob, existing) in &cases {
            let explosion = CollisionSystem::explode(blob, &v, existing, 0, &config, &mut r);
            let total: f64 =
                explosion.survivor_mass + explosion.pieces.iter().map(|p| p.mass).sum::<f64>();
            assert!((total - (blob + v.mass)).abs() < 1e-9, "blob {blob} existing {existing}");
            assert!(existing + 1 + explosion.pieces.len() <= config.max_cells);
        }
    }

    #[test]
    fn explosion_piece_count_and_layout() {
        let config = GameConfig::default();
        let mut r = rng();
        let v = virus(1, 100.0, 100.0);

        // floor(150 / 12.5) = 12 pieces, budget 15
        let explosion = CollisionSystem::explode(150.0, &v, 0, 1_000, &config, &mut r);
        assert_eq!(explosion.pieces.len(), 12);
        let share = 250.0 / 13.0;
        for piece in &explosion.pieces {
            assert!((piece.mass - share).abs() < 1e-9);
            assert_eq!((piece.x, piece.y), (100.0, 100.0));
            assert_eq!(piece.born, 1_000);
            assert_eq!(piece.merge_delay, config.merge_delay_for(piece.mass));
            let speed = piece.vx.hypot(piece.vy);
            assert!(
                speed >= config.virus_explode_speed && speed < config.virus_explode_speed + 50.0
            );
        }

        // Small blob still gets the 4-piece minimum
        let explosion = CollisionSystem::explode(20.0, &v, 0, 0, &config, &mut r);
        assert_eq!(explosion.pieces.len(), 4);

        // No budget: virus mass simply absorbed
        let explosion = CollisionSystem::explode(200.0, &v, 15, 0, &config, &mut r);
        assert!(explosion.pieces.is_empty());
        assert_eq!(explosion.survivor_mass, 300.0);
    }

    #[test]
    fn virus_collision_explodes_heavy_player() {
        let config = GameConfig::default();
        let mut r = rng();
        let mut p = player(1000.0, 1000.0, 200.0, &config);
        let mut splits = Vec::new();
        let mut viruses = BTreeMap::new();
        viruses.insert(9, virus(9, 1010.0, 1000.0));
        let mut out = Vec::new();

        CollisionSystem::collide_viruses(
            &mut p,
            &mut splits,
            &mut viruses,
            0,
            &config,
            &mut r,
            &mut out,
        );

        assert!(viruses.is_empty());
        assert_eq!(out, vec![ClientMsg::ConsumeVirus { virus_id: 9 }]);
        assert_eq!(splits.len(), 15);
        let total: f64 = p.mass + splits.iter().map(|s| s.mass).sum::<f64>();
        assert!((total - 300.0).abs() < 1e-9);
    }

    #[test]
    fn light_player_passes_over_virus() {
        let config = GameConfig::default();
        let mut r = rng();
        let mut p = player(1000.0, 1000.0, 120.0, &config);
        let mut viruses = BTreeMap::new();
        viruses.insert(9, virus(9, 1000.0, 1000.0));
        let mut out = Vec::new();
        CollisionSystem::collide_viruses(
            &mut p,
            &mut Vec::new(),
            &mut viruses,
            0,
            &config,
            &mut r,
            &mut out,
        );
        assert_eq!(viruses.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn young_split_never_merges_even_at_zero_distance() {
        let config = GameConfig::default();
        let mut r = rng();
        let mut p = player(1000.0, 1000.0, 100.0, &config);
        let mut splits = vec![SplitBlob::new(1000.0, 1000.0, (0.0, 0.0), 50.0, 0, &config, &mut r)];
        let young = splits[0].merge_delay as u64 - 1;

        assert_eq!(CollisionSystem::merge_ready_splits(&mut p, &mut splits, young), 0);
        assert_eq!(splits.len(), 1);

        let ready = splits[0].merge_delay.ceil() as u64;
        assert_eq!(CollisionSystem::merge_ready_splits(&mut p, &mut splits, ready), 1);
        assert!(splits.is_empty());
        assert_eq!(p.mass, 150.0);
    }

    #[test]
    fn separation_pass_reduces_overlap() {
        let config = GameConfig::default();
        let mut r = rng();
        let p = player(5000.0, 5000.0, 10.0, &config);
        let mut splits = vec![
            SplitBlob::new(1000.0, 1000.0, (0.0, 0.0), 100.0, 0, &config, &mut r),
            SplitBlob::new(1030.0, 1000.0, (0.0, 0.0), 100.0, 0, &config, &mut r),
        ];
        let min_dist = splits[0].radius + splits[1].radius;
        let overlap_before =
            min_dist - distance(splits[0].x, splits[0].y, splits[1].x, splits[1].y);

        CollisionSystem::separation_pass(&p, &mut splits, 10, &mut r);

        let overlap_after = min_dist - distance(splits[0].x, splits[0].y, splits[1].x, splits[1].y);
        assert!(overlap_after < overlap_before);
        // Symmetric push
        assert!((1000.0 - splits[0].x - (splits[1].x - 1030.0)).abs() < 1e-9);
    }

    #[test]
    fn separation_handles_coincident_centres() {
        let config = GameConfig::default();
        let mut r = rng();
        let p = player(1000.0, 1000.0, 100.0, &config);
        let mut splits = vec![SplitBlob::new(1000.0, 1000.0, (0.0, 0.0), 50.0, 0, &config, &mut r)];
        CollisionSystem::separate_splits(&p, &mut splits, 10, &mut r);
        let d = distance(p.x, p.y, splits[0].x, splits[0].y);
        assert!((d - (p.radius + splits[0].radius)).abs() < 1e-6);
    }

    #[test]
    fn player_request_respects_ratio_and_pending() {
        let config = GameConfig::default();
        let p = player(1000.0, 1000.0, 111.0, &config);
        let mut remotes = BTreeMap::new();
        remotes.insert("a".to_string(), remote("a", 1010.0, 1000.0, 100.0, &config));
        let mut pending = PendingRequests::default();

        let no_splits = BTreeMap::new();
        let request =
            CollisionSystem::request_player_consumption(&p, &[], &remotes, &no_splits, &pending);
        let Some(ClientMsg::ConsumePlayer { target_id, consuming_entity_id, .. }) = request else {
            panic!("expected a consume request");
        };
        assert_eq!(target_id, "a");
        assert_eq!(consuming_entity_id, MAIN_CELL_ID);

        pending.mark_player(CellKind::Player, "a");
        let again =
            CollisionSystem::request_player_consumption(&p, &[], &remotes, &no_splits, &pending);
        assert!(again.is_none());

        let light = player(1000.0, 1000.0, 109.0, &config);
        let pending = PendingRequests::default();
        let too_light = CollisionSystem::request_player_consumption(
            &light,
            &[],
            &remotes,
            &no_splits,
            &pending,
        );
        assert!(too_light.is_none());
    }

    #[test]
    fn splits_try_remote_players_before_remote_splits() {
        let config = GameConfig::default();
        let mut r = rng();
        let p = player(100.0, 100.0, 10.0, &config);
        let first = SplitBlob::new(1000.0, 1000.0, (0.0, 0.0), 100.0, 0, &config, &mut r);
        let second = SplitBlob::new(3000.0, 3000.0, (0.0, 0.0), 100.0, 0, &config, &mut r);
        let second_id = second.id.to_string();
        let splits = vec![first, second];

        let mut remote_players = BTreeMap::new();
        remote_players.insert("rp".to_string(), remote("rp", 3005.0, 3000.0, 50.0, &config));
        let mut remote_splits = BTreeMap::new();
        remote_splits.insert(
            "rs".to_string(),
            RemoteSplit {
                id: "rs".into(),
                player_id: "owner".into(),
                mass: 50.0,
                radius: config.radius_for_mass(50.0),
                interp: Interp::snap(1005.0, 1000.0, 0),
            },
        );

        let pending = PendingRequests::default();
        let request = CollisionSystem::request_player_consumption(
            &p,
            &splits,
            &remote_players,
            &remote_splits,
            &pending,
        );
        match request {
            Some(ClientMsg::ConsumePlayer {
                target_id,
                target_type: CellKind::Player,
                consuming_entity_type: CellKind::Split,
                consuming_entity_id,
                ..
            }) => {
                assert_eq!(target_id, "rp");
                assert_eq!(consuming_entity_id, second_id);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn ejected_request_names_consuming_split() {
        let config = GameConfig::default();
        let mut r = rng();
        let p = player(100.0, 100.0, 30.0, &config);
        let splits = vec![SplitBlob::new(2000.0, 2000.0, (0.0, 0.0), 60.0, 0, &config, &mut r)];
        let mut remote_ejected = BTreeMap::new();
        remote_ejected.insert(
            4,
            RemoteEjectedState {
                id: 4,
                player_id: "other".into(),
                x: 2001.0,
                y: 2000.0,
                vx: 0.0,
                vy: 0.0,
                travelled: 0.0,
                mass: 13.0,
            },
        );
        let pending = PendingRequests::default();
        match CollisionSystem::request_ejected_consumption(&p, &splits, &remote_ejected, &pending) {
            Some(ClientMsg::ConsumeOtherEjected {
                ejected_id: 4,
                consuming_entity_type: CellKind::Split,
                consuming_entity_id,
                ..
            }) => assert_eq!(consuming_entity_id, splits[0].id.to_string()),
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
