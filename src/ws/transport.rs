//! Outbound transports
//!
//! The session only ever sees `Transport`; framing and connection handling
//! live behind it.

use std::io::Write;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::ws::protocol::ClientMsg;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered, fire-and-forget delivery to the authority
pub trait Transport {
    fn send(&mut self, msg: &ClientMsg) -> Result<(), TransportError>;
    fn is_connected(&self) -> bool;
    /// Ask for a fresh session; the authority answers with `init`
    fn reconnect(&mut self) -> Result<(), TransportError>;
}

/// Control frames understood by whatever sits on the other end of stdout
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlFrame {
    Reconnect,
}

/// Newline-delimited JSON over any writer
pub struct StdioTransport<W: Write> {
    writer: W,
    connected: bool,
}

impl<W: Write> StdioTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            connected: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_frame<T: Serialize>(&mut self, frame: &T) -> Result<(), TransportError> {
        let result = serde_json::to_writer(&mut self.writer, frame)
            .map_err(TransportError::from)
            .and_then(|_| {
                self.writer.write_all(b"\n")?;
                self.writer.flush()?;
                Ok(())
            });
        if let Err(TransportError::Io(_)) = &result {
            self.connected = false;
        }
        result
    }
}

impl<W: Write> Transport for StdioTransport<W> {
    fn send(&mut self, msg: &ClientMsg) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Closed);
        }
        self.write_frame(msg)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        self.write_frame(&ControlFrame::Reconnect)?;
        info!("Requested reconnect");
        Ok(())
    }
}

/// In-process transport backed by an unbounded channel
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<ClientMsg>,
    reconnects: u32,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<ClientMsg>) -> Self {
        Self { tx, reconnects: 0 }
    }

    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, msg: &ClientMsg) -> Result<(), TransportError> {
        self.tx.send(msg.clone()).map_err(|_| TransportError::Closed)
    }

    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        if self.tx.is_closed() {
            return Err(TransportError::Closed);
        }
        self.reconnects += 1;
        debug!(reconnects = self.reconnects, "Channel reconnect");
        Ok(())
    }
}
