//! Wire types exchanged with the authority
//! and the local input stream

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::GameConfig;

/// Kind of player-owned cell, used both for consumption targets and consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// A player's main cell
    Player,
    /// One of a player's split pieces
    Split,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Full world state sent on connect
    Init(InitPayload),

    /// Wholesale reconfiguration
    Config { config: GameConfig },

    /// Player id assignment
    #[serde(rename_all = "camelCase")]
    PlayerId { player_id: String },

    /// Another player connected
    PlayerJoined { player: RemotePlayerState },

    /// Another player disconnected
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },

    /// Another player's state broadcast
    PlayerUpdate(PlayerUpdatePayload),

    /// A pellet was eaten and replaced
    PelletUpdate {
        consumed: u64,
        #[serde(default)]
        spawned: Option<PelletState>,
    },

    /// A virus was eaten and replaced
    VirusUpdate {
        consumed: u64,
        #[serde(default)]
        spawned: Option<VirusState>,
    },

    /// A virus was fed; it may have shot a projectile
    #[serde(rename_all = "camelCase")]
    VirusFeed {
        virus_id: u64,
        new_mass: f64,
        #[serde(default)]
        projectile_spawned: Option<VirusProjectileState>,
    },

    /// Batched virus projectile movement and promotions
    ProjectileUpdates { updates: Vec<ProjectileUpdate> },

    /// Authoritative outcome of a consume_player request
    PlayerConsumed(PlayerConsumedOutcome),

    /// Authoritative outcome of a consume_other_ejected request
    OtherEjectedConsumed(EjectedConsumedOutcome),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub player_id: String,
    pub config: GameConfig,
    #[serde(default)]
    pub pellets: Vec<PelletState>,
    #[serde(default)]
    pub viruses: Vec<VirusState>,
    #[serde(default)]
    pub virus_projectiles: Vec<VirusProjectileState>,
    #[serde(default)]
    pub players: Vec<RemotePlayerState>,
    #[serde(default)]
    pub player_splits: Vec<RemoteSplitState>,
    #[serde(default)]
    pub player_ejected: Vec<RemoteEjectedState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdatePayload {
    pub player_id: String,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub radius: f64,
    #[serde(default)]
    pub color: Option<String>,
    /// Every player's splits; absent means unchanged
    #[serde(default)]
    pub splits: Option<Vec<RemoteSplitState>>,
    /// Every player's ejected mass; absent means unchanged
    #[serde(default)]
    pub ejected: Option<Vec<RemoteEjectedState>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PelletState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirusState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    #[serde(default)]
    pub feed_count: u32,
    #[serde(default)]
    pub last_feed_angle: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirusProjectileState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    #[serde(default)]
    pub travelled: f64,
    pub mass: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePlayerState {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub radius: f64,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSplitState {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub player_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    pub mass: f64,
    #[serde(default)]
    pub born: f64,
    #[serde(default)]
    pub merge_delay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEjectedState {
    pub id: u64,
    pub player_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub travelled: f64,
    pub mass: f64,
}

/// One entry of a projectile update batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectileUpdate {
    /// Projectile moved
    ProjectileUpdate { projectile: VirusProjectileState },
    /// Projectile came to rest and became a virus
    #[serde(rename_all = "camelCase")]
    ProjectileToVirus { projectile_id: u64, virus: VirusState },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConsumedOutcome {
    #[serde(deserialize_with = "string_or_number")]
    pub target_id: String,
    pub target_type: CellKind,
    pub gained_mass: f64,
    pub consumer_id: String,
    pub new_mass: f64,
    pub consuming_entity_type: CellKind,
    #[serde(deserialize_with = "string_or_number")]
    pub consuming_entity_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EjectedConsumedOutcome {
    pub ejected_id: u64,
    pub gained_mass: f64,
    pub consumer_id: String,
    pub new_mass: f64,
    pub consuming_entity_type: CellKind,
    #[serde(deserialize_with = "string_or_number")]
    pub consuming_entity_id: String,
    pub original_owner_id: String,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Local player state, rate limited
    PlayerUpdate {
        x: f64,
        y: f64,
        mass: f64,
        radius: f64,
        color: String,
        splits: Vec<SplitSnapshot>,
        ejected: Vec<EjectedSnapshot>,
    },

    #[serde(rename_all = "camelCase")]
    ConsumePellet { pellet_id: u64 },

    /// Angle points from the projectile to the virus centre
    #[serde(rename_all = "camelCase")]
    FeedVirus { virus_id: u64, angle: f64 },

    #[serde(rename_all = "camelCase")]
    ConsumeVirus { virus_id: u64 },

    #[serde(rename_all = "camelCase")]
    ConsumePlayer {
        target_id: String,
        target_type: CellKind,
        consuming_entity_type: CellKind,
        consuming_entity_id: String,
        consuming_entity: CellSnapshot,
    },

    #[serde(rename_all = "camelCase")]
    ConsumeOtherEjected {
        ejected_id: u64,
        consuming_entity_type: CellKind,
        consuming_entity_id: String,
        consuming_entity: CellSnapshot,
    },
}

impl ClientMsg {
    /// Wire name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerUpdate { .. } => "player_update",
            Self::ConsumePellet { .. } => "consume_pellet",
            Self::FeedVirus { .. } => "feed_virus",
            Self::ConsumeVirus { .. } => "consume_virus",
            Self::ConsumePlayer { .. } => "consume_player",
            Self::ConsumeOtherEjected { .. } => "consume_other_ejected",
        }
    }
}

/// Position and mass of the acting cell, for server-side validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub born: u64,
    pub merge_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EjectedSnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub travelled: f64,
    pub mass: f64,
}

/// Local input line accepted by the headless client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum InputLine {
    /// Pointer target in world coordinates
    Pointer { x: f64, y: f64 },
    Eject,
    Split,
}

/// Anything that can arrive on the client's inbound stream
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Server(ServerMsg),
    Input(InputLine),
}

/// Typed dispatch target for inbound server events
///
/// One method per event kind, so transport framing stays out of reconciliation.
pub trait ServerMsgHandler {
    fn on_init(&mut self, init: InitPayload, now_ms: u64);
    fn on_config(&mut self, config: GameConfig);
    fn on_player_id(&mut self, player_id: String);
    fn on_player_joined(&mut self, player: RemotePlayerState, now_ms: u64);
    fn on_player_left(&mut self, player_id: String);
    fn on_player_update(&mut self, update: PlayerUpdatePayload, now_ms: u64);
    fn on_pellet_update(&mut self, consumed: u64, spawned: Option<PelletState>);
    fn on_virus_update(&mut self, consumed: u64, spawned: Option<VirusState>);
    fn on_virus_feed(
        &mut self,
        virus_id: u64,
        new_mass: f64,
        projectile: Option<VirusProjectileState>,
    );
    fn on_projectile_updates(&mut self, updates: Vec<ProjectileUpdate>);
    fn on_player_consumed(&mut self, outcome: PlayerConsumedOutcome);
    fn on_ejected_consumed(&mut self, outcome: EjectedConsumedOutcome);
}

impl ServerMsg {
    /// Route this message to the matching handler method
    pub fn dispatch<H: ServerMsgHandler + ?Sized>(self, handler: &mut H, now_ms: u64) {
        match self {
            Self::Init(init) => handler.on_init(init, now_ms),
            Self::Config { config } => handler.on_config(config),
            Self::PlayerId { player_id } => handler.on_player_id(player_id),
            Self::PlayerJoined { player } => handler.on_player_joined(player, now_ms),
            Self::PlayerLeft { player_id } => handler.on_player_left(player_id),
            Self::PlayerUpdate(update) => handler.on_player_update(update, now_ms),
            Self::PelletUpdate { consumed, spawned } => handler.on_pellet_update(consumed, spawned),
            Self::VirusUpdate { consumed, spawned } => handler.on_virus_update(consumed, spawned),
            Self::VirusFeed {
                virus_id,
                new_mass,
                projectile_spawned,
            } => handler.on_virus_feed(virus_id, new_mass, projectile_spawned),
            Self::ProjectileUpdates { updates } => handler.on_projectile_updates(updates),
            Self::PlayerConsumed(outcome) => handler.on_player_consumed(outcome),
            Self::OtherEjectedConsumed(outcome) => handler.on_ejected_consumed(outcome),
        }
    }
}

/// Inbound decoding errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Empty line")]
    Empty,
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode one newline-delimited JSON frame
pub fn decode_line(line: &str) -> Result<Inbound, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}

/// Split ids are client-chosen strings but older peers send numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) if f.fract() == 0.0 => (f as i64).to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_player_consumed_with_numeric_ids() {
        let json = r#"{
            "type": "player_consumed",
            "targetId": 42,
            "targetType": "split",
            "gainedMass": 30.5,
            "consumerId": "abc",
            "newMass": 120.0,
            "consumingEntityType": "player",
            "consumingEntityId": "main"
        }"#;
        match serde_json::from_str::<ServerMsg>(json).unwrap() {
            ServerMsg::PlayerConsumed(outcome) => {
                assert_eq!(outcome.target_id, "42");
                assert_eq!(outcome.target_type, CellKind::Split);
                assert_eq!(outcome.consuming_entity_id, "main");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn decodes_projectile_batch() {
        let json = r#"{"type": "projectile_updates", "updates": [
            {"type": "projectile_update",
             "projectile": {"id": 1, "x": 1, "y": 2, "vx": 3, "vy": 4,
                            "travelled": 5, "mass": 100}},
            {"type": "projectile_to_virus", "projectileId": 2,
             "virus": {"id": 9, "x": 5, "y": 6, "mass": 100, "feedCount": 0, "lastFeedAngle": null}}
        ]}"#;
        let ServerMsg::ProjectileUpdates { updates } = serde_json::from_str(json).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(updates.len(), 2);
        assert!(matches!(
            updates[1],
            ProjectileUpdate::ProjectileToVirus { projectile_id: 2, .. }
        ));
    }

    #[test]
    fn encodes_consume_player_in_camel_case() {
        let msg = ClientMsg::ConsumePlayer {
            target_id: "p2".into(),
            target_type: CellKind::Player,
            consuming_entity_type: CellKind::Split,
            consuming_entity_id: "s1".into(),
            consuming_entity: CellSnapshot {
                x: 1.0,
                y: 2.0,
                mass: 50.0,
                radius: 35.0,
            },
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "consume_player");
        assert_eq!(value["targetType"], "player");
        assert_eq!(value["consumingEntityType"], "split");
        assert_eq!(value["consumingEntity"]["mass"], 50.0);
    }

    #[test]
    fn inbound_distinguishes_server_and_input_lines() {
        let server: Inbound =
            serde_json::from_str(r#"{"type":"player_left","playerId":"x"}"#).unwrap();
        assert!(matches!(server, Inbound::Server(ServerMsg::PlayerLeft { .. })));

        let input: Inbound = serde_json::from_str(r#"{"input":"pointer","x":1,"y":2}"#).unwrap();
        assert!(matches!(
            input,
            Inbound::Input(InputLine::Pointer { x, y }) if x == 1.0 && y == 2.0
        ));
    }

    #[test]
    fn decode_line_rejects_blank_and_garbage() {
        assert!(matches!(decode_line("   "), Err(ProtocolError::Empty)));
        assert!(matches!(decode_line("{\"type\":\"nope\"}"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            decode_line(" {\"input\":\"split\"}\n"),
            Ok(Inbound::Input(InputLine::Split))
        ));
    }
}
