//! Client-side simulation modules

pub mod actions;
pub mod collision;
pub mod entities;
pub mod physics;
pub mod session;
pub mod snapshot;

pub use session::{GameSession, PendingRequests, SessionStatus};

/// Discrete player intent from a key press edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerIntent {
    Eject,
    Split,
}

/// Input state consumed by a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pointer target in world coordinates; `None` holds position
    pub pointer: Option<(f64, f64)>,
    /// Edge events queued since the previous frame
    pub intents: Vec<PlayerIntent>,
}
