//! WebSocket transport for the client.
//!
//! Provides [`ConnectedClient`] which handles WebSocket I/O for frame
//! transport. This is a thin layer that only moves frames; session logic
//! remains in the Sans-IO [`crate::Client`].

use futures_util::{SinkExt, StreamExt};
use parley_proto::{ClientFrame, ServerFrame};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, protocol::CloseFrame},
};

/// Channel depth in each direction.
const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Connection task is gone.
    #[error("transport closed")]
    Closed,

    /// Outbound queue is full.
    #[error("outbound queue full")]
    Full,
}

/// Inbound traffic from the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Decoded frame from the relay.
    Frame(ServerFrame),
    /// The connection ended or never opened. Always the last event.
    Closed {
        /// Why.
        reason: String,
    },
}

/// Handle to a WebSocket connection.
///
/// Frames are sent/received via the channels, and an internal task handles
/// the handshake and socket I/O. Frames queued before the handshake completes
/// are written once it does.
pub struct ConnectedClient {
    /// Send frames to the relay.
    pub to_server: mpsc::Sender<ClientFrame>,
    /// Receive frames from the relay.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedClient {
    /// Queue a frame for sending without waiting.
    ///
    /// # Errors
    ///
    /// - `TransportError::Closed` if the connection task has exited
    /// - `TransportError::Full` if the outbound queue is full
    pub fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        self.to_server.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Start connecting to a Parley relay at `url` (`ws://` or `wss://`).
///
/// Returns at once. The WebSocket handshake runs on a spawned task, and a
/// failure arrives as [`TransportEvent::Closed`]. Bounding the handshake is
/// left to the session's own deadline.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn connect(url: impl Into<String>) -> ConnectedClient {
    let url = url.into();
    let (to_server_tx, to_server_rx) = mpsc::channel::<ClientFrame>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(async move {
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                let reason = TransportError::Connection(e.to_string()).to_string();
                tracing::warn!(%url, %reason, "websocket failed to open");
                let _ = from_server_tx.send(TransportEvent::Closed { reason }).await;
                return;
            },
        };

        tracing::debug!(%url, "websocket connected");
        run_connection(stream, to_server_rx, from_server_tx).await;
    });

    ConnectedClient {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    }
}

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Run the connection, bridging between channels and the socket.
async fn run_connection(
    stream: Socket,
    mut to_server: mpsc::Receiver<ClientFrame>,
    from_server: mpsc::Sender<TransportEvent>,
) {
    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            outbound = to_server.recv() => {
                let Some(frame) = outbound else {
                    // Owner hung up; close politely and report nothing.
                    let _ = write.send(Message::Close(None)).await;
                    return;
                };
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping unencodable frame");
                        continue;
                    },
                };
                if let Err(e) = write.send(Message::text(text)).await {
                    break format!("write failed: {e}");
                }
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => match ServerFrame::decode(text.as_str()) {
                    Ok(frame) => {
                        if from_server.send(TransportEvent::Frame(frame)).await.is_err() {
                            return;
                        }
                    },
                    Err(e) => tracing::warn!(error = %e, "dropping malformed frame"),
                },
                Some(Ok(Message::Close(frame))) => break close_reason(frame.as_ref()),
                Some(Ok(_)) => {},
                Some(Err(e)) => break format!("read failed: {e}"),
                None => break "connection closed".to_owned(),
            },
        }
    };

    tracing::warn!(%reason, "websocket closed");
    let _ = from_server.send(TransportEvent::Closed { reason }).await;
}

fn close_reason(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if !frame.reason.is_empty() => format!("closed by server: {}", frame.reason),
        _ => "closed by server".to_owned(),
    }
}
