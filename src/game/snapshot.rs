//! Outbound player-state snapshot building

use crate::util::rate_limit::StateSendLimiter;
use crate::ws::protocol::{ClientMsg, EjectedSnapshot, SplitSnapshot};

use super::entities::{Ejected, Player, SplitBlob};

/// Builds rate-limited player-state snapshots for the authority
#[derive(Debug)]
pub struct SnapshotBuilder {
    limiter: StateSendLimiter,
    /// Snapshots built so far, for diagnostics
    sent: u64,
}

impl SnapshotBuilder {
    pub fn new(send_interval_ms: u64) -> Self {
        Self {
            limiter: StateSendLimiter::new(send_interval_ms),
            sent: 0,
        }
    }

    /// Check if the minimum send interval has elapsed
    pub fn should_send(&self) -> bool {
        self.limiter.check()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Build a snapshot message: actual mass, visual radius
    pub fn build(
        &mut self,
        player: &Player,
        splits: &[SplitBlob],
        ejected: &[Ejected],
    ) -> ClientMsg {
        self.sent += 1;
        ClientMsg::PlayerUpdate {
            x: player.x,
            y: player.y,
            mass: player.mass,
            radius: player.radius,
            color: player.color.clone(),
            splits: splits
                .iter()
                .map(|s| SplitSnapshot {
                    id: s.id.to_string(),
                    x: s.x,
                    y: s.y,
                    vx: s.vx,
                    vy: s.vy,
                    mass: s.mass,
                    born: s.born,
                    merge_delay: s.merge_delay,
                })
                .collect(),
            ejected: ejected
                .iter()
                .map(|e| EjectedSnapshot {
                    x: e.x,
                    y: e.y,
                    vx: e.vx,
                    vy: e.vy,
                    travelled: e.travelled,
                    mass: e.mass,
                })
                .collect(),
        }
    }
}
