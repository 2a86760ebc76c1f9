//! Blob Arena client core
//!
//! Predictive physics and reconciliation for a multiplayer blob arena. The
//! client simulates its own cells every frame and only asks the authority to
//! adjudicate outcomes involving other players.

pub mod config;
pub mod game;
pub mod util;
pub mod ws;
