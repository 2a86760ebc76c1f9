//! Wire contract, transports and the frame loop

pub mod handler;
pub mod protocol;
pub mod transport;

pub use handler::run_session;
pub use transport::{ChannelTransport, StdioTransport, Transport, TransportError};
