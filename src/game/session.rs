//! Session state and reconciliation with the authority
//!
//! `GameSession` owns the canonical per-session state. It is the only place
//! authoritative messages are applied, and it runs the per-frame pipeline:
//! actions, kinematics, collision, then outbound intents.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{
    CellKind, ClientMsg, EjectedConsumedOutcome, InitPayload, PelletState, PlayerConsumedOutcome,
    PlayerUpdatePayload, ProjectileUpdate, RemoteEjectedState, RemotePlayerState,
    RemoteSplitState, ServerMsg, ServerMsgHandler, VirusProjectileState, VirusState,
};

use super::actions::ActionSystem;
use super::collision::CollisionSystem;
use super::entities::{Ejected, Player, RemotePlayer, RemoteSplit, SplitBlob};
use super::physics::KinematicsSystem;
use super::snapshot::SnapshotBuilder;
use super::{FrameInput, PlayerIntent};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for the authority's init
    AwaitingInit,
    /// Player alive and predicted every frame
    Playing,
    /// Local player was consumed; waiting for reconnect
    Dead,
}

/// Consumption requests sent and not yet resolved
///
/// Scoped to a single session: cleared on reset, and entries are dropped as
/// soon as their target disappears from the mirrored world.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    players: HashSet<(CellKind, String)>,
    ejected: HashSet<u64>,
}

impl PendingRequests {
    pub fn is_player_pending(&self, kind: CellKind, target_id: &str) -> bool {
        self.players.contains(&(kind, target_id.to_string()))
    }

    /// Returns false if the request was already pending
    pub fn mark_player(&mut self, kind: CellKind, target_id: &str) -> bool {
        self.players.insert((kind, target_id.to_string()))
    }

    pub fn resolve_player(&mut self, kind: CellKind, target_id: &str) -> bool {
        self.players.remove(&(kind, target_id.to_string()))
    }

    pub fn is_ejected_pending(&self, ejected_id: u64) -> bool {
        self.ejected.contains(&ejected_id)
    }

    /// Returns false if the request was already pending
    pub fn mark_ejected(&mut self, ejected_id: u64) -> bool {
        self.ejected.insert(ejected_id)
    }

    pub fn resolve_ejected(&mut self, ejected_id: u64) -> bool {
        self.ejected.remove(&ejected_id)
    }

    pub fn len(&self) -> usize {
        self.players.len() + self.ejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.ejected.clear();
    }
}

/// Canonical entity state for one session
#[derive(Debug, Default)]
pub struct World {
    pub player: Option<Player>,
    pub splits: Vec<SplitBlob>,
    pub ejected: Vec<Ejected>,
    pub pellets: BTreeMap<u64, PelletState>,
    pub viruses: BTreeMap<u64, VirusState>,
    pub projectiles: BTreeMap<u64, VirusProjectileState>,
    pub remote_players: BTreeMap<String, RemotePlayer>,
    pub remote_splits: BTreeMap<String, RemoteSplit>,
    pub remote_ejected: BTreeMap<u64, RemoteEjectedState>,
}

/// The local game session
pub struct GameSession {
    config: Arc<GameConfig>,
    player_id: Option<String>,
    status: SessionStatus,
    world: World,
    pending: PendingRequests,
    rng: ChaCha8Rng,
    snapshots: SnapshotBuilder,
    outbox: Vec<ClientMsg>,
    connected: bool,
    frame: u64,
}

impl GameSession {
    pub fn new(seed: u64, state_send_interval_ms: u64) -> Self {
        Self {
            config: Arc::new(GameConfig::default()),
            player_id: None,
            status: SessionStatus::AwaitingInit,
            world: World::default(),
            pending: PendingRequests::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            snapshots: SnapshotBuilder::new(state_send_interval_ms),
            outbox: Vec::new(),
            connected: true,
            frame: 0,
        }
    }

    pub fn config(&self) -> &Arc<GameConfig> {
        &self.config
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// While disconnected, intents are dropped and prediction continues
    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            info!(connected, "Transport connection state changed");
        }
        self.connected = connected;
    }

    /// Apply one authoritative message. Only call between frames.
    pub fn handle(&mut self, msg: ServerMsg, now_ms: u64) {
        msg.dispatch(self, now_ms);
    }

    /// Take everything queued for the transport
    pub fn drain_outbox(&mut self) -> Vec<ClientMsg> {
        std::mem::take(&mut self.outbox)
    }

    /// Drop all locally owned entities and pending requests, so late messages
    /// about the old session are harmless
    pub fn reset(&mut self) {
        self.world.player = None;
        self.world.splits.clear();
        self.world.ejected.clear();
        self.pending.clear();
        self.outbox.clear();
    }

    /// Called once the transport has been asked to reconnect
    pub fn await_init(&mut self) {
        self.status = SessionStatus::AwaitingInit;
    }

    /// Run one frame: actions, kinematics, collision, outbound intents
    pub fn frame(&mut self, input: &mut FrameInput, now_ms: u64, dt: f64) {
        let intents: Vec<PlayerIntent> = input.intents.drain(..).collect();
        if self.status != SessionStatus::Playing {
            return;
        }

        let config = Arc::clone(&self.config);
        let world = &mut self.world;
        let Some(player) = world.player.as_mut() else {
            return;
        };
        let pointer = input.pointer.unwrap_or((player.x, player.y));

        for intent in intents {
            match intent {
                PlayerIntent::Eject => {
                    let shots = ActionSystem::eject(
                        player,
                        &mut world.splits,
                        &mut world.ejected,
                        pointer,
                        &config,
                        &mut self.rng,
                    );
                    trace!(shots, "Eject");
                }
                PlayerIntent::Split => {
                    let pieces = ActionSystem::split(
                        player,
                        &mut world.splits,
                        pointer,
                        now_ms,
                        &config,
                        &mut self.rng,
                    );
                    trace!(pieces, "Split");
                }
            }
        }

        KinematicsSystem::update_player(player, pointer, &config, dt);
        for split in world.splits.iter_mut() {
            KinematicsSystem::update_split(split, player, now_ms, &config, dt);
        }
        for shot in world.ejected.iter_mut() {
            KinematicsSystem::update_ejected(shot, &config, dt);
        }

        let mut out = Vec::new();
        CollisionSystem::separate_splits(player, &mut world.splits, now_ms, &mut self.rng);
        let merged = CollisionSystem::merge_ready_splits(player, &mut world.splits, now_ms);
        if merged > 0 {
            debug!(merged, "Splits merged back into player");
        }
        CollisionSystem::consume_pellets(player, &mut world.splits, &mut world.pellets, &mut out);
        CollisionSystem::consume_ejected(
            player,
            &mut world.splits,
            &mut world.ejected,
            &world.viruses,
            &config,
            &mut out,
        );
        CollisionSystem::collide_viruses(
            player,
            &mut world.splits,
            &mut world.viruses,
            now_ms,
            &config,
            &mut self.rng,
            &mut out,
        );
        // At most one cross-player request per frame
        let request = CollisionSystem::request_player_consumption(
            player,
            &world.splits,
            &world.remote_players,
            &world.remote_splits,
            &self.pending,
        )
        .or_else(|| {
            CollisionSystem::request_ejected_consumption(
                player,
                &world.splits,
                &world.remote_ejected,
                &self.pending,
            )
        });
        out.extend(request);

        let snapshot = if self.connected && self.snapshots.should_send() {
            Some(self.snapshots.build(player, &world.splits, &world.ejected))
        } else {
            None
        };

        for msg in out {
            self.emit(msg);
        }
        self.outbox.extend(snapshot);
        self.frame += 1;
    }

    /// Queue an intent, recording remote consumption requests as pending
    fn emit(&mut self, msg: ClientMsg) {
        if !self.connected {
            trace!(kind = msg.kind(), "Dropping intent while disconnected");
            return;
        }
        match &msg {
            ClientMsg::ConsumePlayer {
                target_id,
                target_type,
                consuming_entity_id,
                ..
            } => {
                if !self.pending.mark_player(*target_type, target_id) {
                    return;
                }
                debug!(
                    target_id = %target_id,
                    target_type = ?target_type,
                    consumer = %consuming_entity_id,
                    "Requesting player consumption"
                );
            }
            ClientMsg::ConsumeOtherEjected { ejected_id, .. } => {
                if !self.pending.mark_ejected(*ejected_id) {
                    return;
                }
                debug!(ejected_id, "Requesting ejected consumption");
            }
            _ => {}
        }
        self.outbox.push(msg);
    }

    fn is_me(&self, id: &str) -> bool {
        self.player_id.as_deref() == Some(id)
    }

    fn die(&mut self) {
        info!(
            player_id = ?self.player_id,
            snapshots_sent = self.snapshots.sent(),
            "Local player consumed"
        );
        self.reset();
        self.status = SessionStatus::Dead;
    }

    /// Set the authoritative mass on the consuming cell, found by id
    fn apply_consumer_mass(&mut self, kind: CellKind, cell_id: &str, new_mass: f64) {
        match kind {
            CellKind::Player => {
                if let Some(player) = self.world.player.as_mut() {
                    player.mass = new_mass;
                }
            }
            CellKind::Split => {
                let split = Uuid::parse_str(cell_id)
                    .ok()
                    .and_then(|id| self.world.splits.iter_mut().find(|s| s.id == id));
                match split {
                    Some(split) => split.mass = new_mass,
                    None => warn!(split_id = %cell_id, "Consumption outcome for unknown split"),
                }
            }
        }
    }

    fn upsert_remote_player(&mut self, state: RemotePlayerState, now_ms: u64) {
        if self.is_me(&state.id) {
            return;
        }
        match self.world.remote_players.get_mut(&state.id) {
            Some(existing) => {
                existing.update(state.x, state.y, state.mass, state.radius, now_ms);
                if !state.color.is_empty() {
                    existing.color = state.color;
                }
            }
            None => {
                let remote = RemotePlayer::observe(state, now_ms);
                self.world.remote_players.insert(remote.id.clone(), remote);
            }
        }
    }

    fn remove_remote_player(&mut self, player_id: &str) {
        self.world.remote_players.remove(player_id);
        self.world.remote_splits.retain(|_, s| s.player_id != player_id);
        self.world.remote_ejected.retain(|_, e| e.player_id != player_id);
        self.prune_pending();
    }

    /// Replace the mirrored splits of every other player
    fn replace_remote_splits(&mut self, splits: Vec<RemoteSplitState>, now_ms: u64) {
        let mut seen = HashSet::with_capacity(splits.len());
        for state in splits {
            if self.is_me(&state.player_id) {
                continue;
            }
            seen.insert(state.id.clone());
            match self.world.remote_splits.get_mut(&state.id) {
                Some(existing) => existing.update(&state, now_ms, &self.config),
                None => {
                    let split = RemoteSplit::observe(state, now_ms, &self.config);
                    self.world.remote_splits.insert(split.id.clone(), split);
                }
            }
        }
        self.world.remote_splits.retain(|id, _| seen.contains(id));
        self.prune_pending();
    }

    /// Replace the mirrored ejected mass of every other player
    fn replace_remote_ejected(&mut self, ejected: Vec<RemoteEjectedState>) {
        let mine = self.player_id.clone();
        self.world.remote_ejected = ejected
            .into_iter()
            .filter(|e| mine.as_deref() != Some(e.player_id.as_str()))
            .map(|e| (e.id, e))
            .collect();
        self.prune_pending();
    }

    /// Forget pending requests whose target no longer exists
    fn prune_pending(&mut self) {
        let world = &self.world;
        self.pending.players.retain(|(kind, id)| match kind {
            CellKind::Player => world.remote_players.contains_key(id),
            CellKind::Split => world.remote_splits.contains_key(id),
        });
        self.pending
            .ejected
            .retain(|id| world.remote_ejected.contains_key(id));
    }
}

impl ServerMsgHandler for GameSession {
    fn on_init(&mut self, init: InitPayload, now_ms: u64) {
        info!(
            player_id = %init.player_id,
            pellets = init.pellets.len(),
            viruses = init.viruses.len(),
            players = init.players.len(),
            "Session initialised"
        );
        self.reset();
        self.config = Arc::new(init.config);
        self.player_id = Some(init.player_id);

        self.world.pellets = init.pellets.into_iter().map(|p| (p.id, p)).collect();
        self.world.viruses = init.viruses.into_iter().map(|v| (v.id, v)).collect();
        self.world.projectiles = init
            .virus_projectiles
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        self.world.remote_players.clear();
        for player in init.players {
            self.upsert_remote_player(player, now_ms);
        }
        self.world.remote_splits.clear();
        self.replace_remote_splits(init.player_splits, now_ms);
        self.replace_remote_ejected(init.player_ejected);

        self.world.player = Some(Player::spawn(&self.config, &mut self.rng));
        self.status = SessionStatus::Playing;
    }

    fn on_config(&mut self, config: GameConfig) {
        info!(world_size = config.world_size, "Game configuration replaced");
        self.config = Arc::new(config);
    }

    fn on_player_id(&mut self, player_id: String) {
        info!(player_id = %player_id, "Player id assigned");
        self.player_id = Some(player_id);
    }

    fn on_player_joined(&mut self, player: RemotePlayerState, now_ms: u64) {
        debug!(player_id = %player.id, "Player joined");
        self.upsert_remote_player(player, now_ms);
    }

    fn on_player_left(&mut self, player_id: String) {
        debug!(player_id = %player_id, "Player left");
        self.remove_remote_player(&player_id);
    }

    fn on_player_update(&mut self, update: PlayerUpdatePayload, now_ms: u64) {
        let PlayerUpdatePayload {
            player_id,
            x,
            y,
            mass,
            radius,
            color,
            splits,
            ejected,
        } = update;

        self.upsert_remote_player(
            RemotePlayerState {
                id: player_id,
                x,
                y,
                mass,
                radius,
                color: color.unwrap_or_default(),
            },
            now_ms,
        );
        if let Some(splits) = splits {
            self.replace_remote_splits(splits, now_ms);
        }
        if let Some(ejected) = ejected {
            self.replace_remote_ejected(ejected);
        }
    }

    fn on_pellet_update(&mut self, consumed: u64, spawned: Option<PelletState>) {
        self.world.pellets.remove(&consumed);
        if let Some(pellet) = spawned {
            self.world.pellets.insert(pellet.id, pellet);
        }
    }

    fn on_virus_update(&mut self, consumed: u64, spawned: Option<VirusState>) {
        self.world.viruses.remove(&consumed);
        if let Some(virus) = spawned {
            self.world.viruses.insert(virus.id, virus);
        }
    }

    fn on_virus_feed(
        &mut self,
        virus_id: u64,
        new_mass: f64,
        projectile: Option<VirusProjectileState>,
    ) {
        if let Some(virus) = self.world.viruses.get_mut(&virus_id) {
            if projectile.is_some() {
                // The authority resets a virus after it shoots
                virus.mass = self.config.virus_mass;
                virus.feed_count = 0;
                virus.last_feed_angle = None;
            } else {
                virus.mass = new_mass;
                virus.feed_count += 1;
            }
        }
        if let Some(projectile) = projectile {
            debug!(virus_id, projectile_id = projectile.id, "Virus shot a projectile");
            self.world.projectiles.insert(projectile.id, projectile);
        }
    }

    fn on_projectile_updates(&mut self, updates: Vec<ProjectileUpdate>) {
        for update in updates {
            match update {
                ProjectileUpdate::ProjectileUpdate { projectile } => {
                    self.world.projectiles.insert(projectile.id, projectile);
                }
                ProjectileUpdate::ProjectileToVirus {
                    projectile_id,
                    virus,
                } => {
                    self.world.projectiles.remove(&projectile_id);
                    self.world.viruses.insert(virus.id, virus);
                }
            }
        }
    }

    fn on_player_consumed(&mut self, outcome: PlayerConsumedOutcome) {
        debug!(
            target_id = %outcome.target_id,
            target_type = ?outcome.target_type,
            consumer_id = %outcome.consumer_id,
            new_mass = outcome.new_mass,
            "Player consumption outcome"
        );
        self.pending
            .resolve_player(outcome.target_type, &outcome.target_id);

        match outcome.target_type {
            CellKind::Player if self.is_me(&outcome.target_id) => {
                self.die();
                return;
            }
            CellKind::Player => self.remove_remote_player(&outcome.target_id),
            CellKind::Split => {
                let lost = self
                    .world
                    .splits
                    .iter()
                    .position(|s| s.id.to_string() == outcome.target_id);
                if let Some(index) = lost {
                    self.world.splits.remove(index);
                    info!(split_id = %outcome.target_id, "Local split consumed");
                }
                self.world.remote_splits.remove(&outcome.target_id);
                self.prune_pending();
            }
        }

        if self.is_me(&outcome.consumer_id) {
            self.apply_consumer_mass(
                outcome.consuming_entity_type,
                &outcome.consuming_entity_id,
                outcome.new_mass,
            );
        }
    }

    fn on_ejected_consumed(&mut self, outcome: EjectedConsumedOutcome) {
        debug!(
            ejected_id = outcome.ejected_id,
            consumer_id = %outcome.consumer_id,
            owner_id = %outcome.original_owner_id,
            "Ejected consumption outcome"
        );
        self.pending.resolve_ejected(outcome.ejected_id);

        if self.is_me(&outcome.original_owner_id) && !self.is_me(&outcome.consumer_id) {
            // Local ejected mass has no durable id; drop all of it
            self.world.ejected.clear();
        }
        if self.is_me(&outcome.consumer_id) {
            self.apply_consumer_mass(
                outcome.consuming_entity_type,
                &outcome.consuming_entity_id,
                outcome.new_mass,
            );
        }
        self.world.remote_ejected.remove(&outcome.ejected_id);
    }
}
