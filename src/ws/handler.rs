//! Frame loop: inbound drain, simulation frame, outbound flush

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::{FrameInput, GameSession, PlayerIntent, SessionStatus};
use crate::util::time::{unix_millis, FrameTimer};
use crate::ws::protocol::{Inbound, InputLine};
use crate::ws::transport::Transport;

/// Longest simulated step after a stall, seconds
const MAX_FRAME_STEP: f64 = 0.1;

/// Drive `session` until the inbound stream closes
///
/// Authoritative messages are applied only between frames, never during one.
pub async fn run_session<T: Transport>(
    config: &Config,
    mut session: GameSession,
    mut inbound_rx: mpsc::Receiver<Inbound>,
    transport: &mut T,
) -> GameSession {
    info!(frame_rate = config.frame_rate, "Session loop started");

    let frame_duration = Duration::from_secs_f64(config.frame_delta());
    let mut frame_interval = interval(frame_duration);
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let backoff = Duration::from_millis(config.reconnect_backoff_ms);
    let mut timer = FrameTimer::new(MAX_FRAME_STEP);
    let mut input = FrameInput::default();
    let mut died_at: Option<Instant> = None;

    loop {
        frame_interval.tick().await;

        let open = drain_inbound(&mut inbound_rx, &mut session, &mut input);

        session.set_connected(transport.is_connected());
        session.frame(&mut input, unix_millis(), timer.step());
        flush_outbox(&mut session, transport);

        if session.status() == SessionStatus::Dead {
            let since = *died_at.get_or_insert_with(Instant::now);
            if since.elapsed() >= backoff {
                match transport.reconnect() {
                    Ok(()) => {
                        session.await_init();
                        timer.reset();
                        died_at = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "Reconnect failed, backing off");
                        died_at = Some(Instant::now());
                    }
                }
            }
        } else {
            died_at = None;
        }

        if !open {
            info!(frames = session.frame_count(), "Inbound stream closed");
            break;
        }
    }

    session
}

/// Apply everything queued since the previous frame. Returns false once the
/// sender side is gone.
fn drain_inbound(
    inbound_rx: &mut mpsc::Receiver<Inbound>,
    session: &mut GameSession,
    input: &mut FrameInput,
) -> bool {
    loop {
        match inbound_rx.try_recv() {
            Ok(Inbound::Server(msg)) => session.handle(msg, unix_millis()),
            Ok(Inbound::Input(line)) => apply_input(input, line),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

fn apply_input(input: &mut FrameInput, line: InputLine) {
    match line {
        InputLine::Pointer { x, y } => input.pointer = Some((x, y)),
        InputLine::Eject => input.intents.push(PlayerIntent::Eject),
        InputLine::Split => input.intents.push(PlayerIntent::Split),
    }
}

/// Send queued messages in order; stop at the first failure
fn flush_outbox<T: Transport>(session: &mut GameSession, transport: &mut T) {
    for msg in session.drain_outbox() {
        if let Err(e) = transport.send(&msg) {
            warn!(error = %e, kind = msg.kind(), "Failed to send message");
            session.set_connected(false);
            return;
        }
        debug!(kind = msg.kind(), "Sent");
    }
}
