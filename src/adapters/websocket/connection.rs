//! Per-connection echo engine.
//!
//! Three pieces run for every connection:
//!
//! ```text
//!  socket read half ──► read task ──(handoff: Frame)──► dispatch loop
//!                                                          │
//!  socket write half ◄── writer task ◄──(outbound: Frame)──┘
//! ```
//!
//! - The read task owns the read half. It tags text and binary frames and
//!   returns a [`CloseReason`] on the first read error or close frame.
//!   Ping and pong are answered by the transport and skipped. Any other
//!   frame type is rejected by the transport and surfaces as a read error.
//! - The dispatch loop waits on the handoff channel, the read task, and the
//!   process shutdown signal. Each frame is queued for echo; while the
//!   outbound queue is full it holds one frame and keeps watching the close
//!   triggers.
//! - The writer task owns the write half. A failed write is logged and the
//!   next frame is written normally.
//!
//! Reads never wait on a write in progress, only on a full outbound queue.
//! On close, pending echoes are discarded and both halves are dropped.

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::foundation::{ConnectionId, ErrorCode, StateMachine};
use crate::domain::relay::{CloseReason, ConnectionState, Frame};
use crate::shutdown::{self, ShutdownReceiver};

/// Channel sizes for one connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub handoff_capacity: usize,
    pub outbound_capacity: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            handoff_capacity: 64,
            outbound_capacity: 256,
        }
    }
}

/// What a single read produced.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Frame(Frame),
    Control(&'static str),
    Close,
}

fn classify(message: Message) -> Inbound {
    match message {
        Message::Text(text) => Inbound::Frame(Frame::Text(text)),
        Message::Binary(bytes) => Inbound::Frame(Frame::Binary(bytes)),
        Message::Close(_) => Inbound::Close,
        Message::Ping(_) => Inbound::Control("ping"),
        Message::Pong(_) => Inbound::Control("pong"),
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(bytes) => Message::Binary(bytes),
    }
}

/// Lifecycle tracker for one connection.
struct Connection {
    id: ConnectionId,
    state: ConnectionState,
}

impl Connection {
    fn advance(&mut self, next: ConnectionState) {
        match self.state.transition_to(next) {
            Ok(state) => self.state = state,
            Err(e) => warn!(connection_id = %self.id, error = %e, "Ignoring connection transition"),
        }
    }
}

/// Run the echo relay on one connection until it closes.
///
/// `reader` and `writer` are the two halves of the connection. Returns the
/// reason the connection left the `Open` state; by then both halves have
/// been dropped.
pub async fn run_connection<R, W, E>(
    id: ConnectionId,
    reader: R,
    writer: W,
    limits: ConnectionLimits,
    mut shutdown: ShutdownReceiver,
) -> CloseReason
where
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: fmt::Display + Send + 'static,
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: fmt::Display,
{
    let mut connection = Connection {
        id,
        state: ConnectionState::Open,
    };
    info!(connection_id = %id, "Connection open");

    let (handoff_tx, mut handoff_rx) = mpsc::channel::<Frame>(limits.handoff_capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel::<Frame>(limits.outbound_capacity);

    let mut read_task = tokio::spawn(read_loop(id, reader, handoff_tx));
    let write_task = tokio::spawn(write_loop(id, writer, outbound_rx));
    let mut read_finished = false;
    // Frame waiting for outbound capacity.
    let mut pending: Option<Frame> = None;

    let reason = loop {
        tokio::select! {
            _ = shutdown::requested(&mut shutdown) => break CloseReason::Shutdown,
            finished = &mut read_task => {
                read_finished = true;
                break match finished {
                    Ok(reason) => reason,
                    Err(e) => CloseReason::ReadError(format!("read task failed: {}", e)),
                };
            }
            permit = outbound_tx.reserve(), if pending.is_some() => match permit {
                Ok(permit) => {
                    if let Some(frame) = pending.take() {
                        permit.send(frame);
                    }
                }
                Err(_) => break CloseReason::ReadError("writer stopped".to_string()),
            },
            Some(frame) = handoff_rx.recv(), if pending.is_none() => {
                debug!(
                    connection_id = %id,
                    kind = %frame.kind(),
                    len = frame.payload().len(),
                    "Dispatching echo"
                );
                pending = Some(frame);
            }
        }
    };

    connection.advance(ConnectionState::Closing);
    info!(connection_id = %id, %reason, "Connection closing");

    drop(outbound_tx);
    write_task.abort();
    // Both halves drop when their tasks finish unwinding.
    let _ = write_task.await;
    if !read_finished {
        read_task.abort();
        let _ = read_task.await;
    }

    connection.advance(ConnectionState::Closed);
    info!(connection_id = %id, "Connection closed");
    reason
}

async fn read_loop<R, E>(id: ConnectionId, mut reader: R, handoff: mpsc::Sender<Frame>) -> CloseReason
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    loop {
        let message = match reader.next().await {
            None => return CloseReason::ClientClosed,
            Some(Err(e)) => {
                warn!(
                    connection_id = %id,
                    code = %ErrorCode::TransportError,
                    error = %e,
                    "Error reading message"
                );
                return CloseReason::ReadError(e.to_string());
            }
            Some(Ok(message)) => message,
        };

        match classify(message) {
            Inbound::Frame(frame) => {
                debug!(connection_id = %id, kind = %frame.kind(), "Frame received");
                if handoff.send(frame).await.is_err() {
                    // Dispatch loop is gone; the connection is closing.
                    return CloseReason::Shutdown;
                }
            }
            Inbound::Control(kind) => debug!(connection_id = %id, kind, "Control frame skipped"),
            Inbound::Close => return CloseReason::ClientClosed,
        }
    }
}

async fn write_loop<W>(id: ConnectionId, mut writer: W, mut outbound: mpsc::Receiver<Frame>)
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    while let Some(frame) = outbound.recv().await {
        let kind = frame.kind();
        match writer.send(into_message(frame)).await {
            Ok(()) => debug!(connection_id = %id, %kind, "Echo sent"),
            Err(e) => warn!(
                connection_id = %id,
                %kind,
                code = %ErrorCode::TransportError,
                error = %e,
                "Error writing message"
            ),
        }
    }
}
