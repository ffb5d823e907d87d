//! Per-connection lifecycle: register, receive loop, deregister.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, Stream, StreamExt};
use relay_core::{ChannelError, ConnectionId};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::broadcast::broadcast;
use crate::registry::ClientRegistry;

/// Outbound half of a client connection.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send one text message. Any error is terminal for the connection.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;

    /// Close the underlying channel. Safe to call more than once.
    async fn close(&self);

    /// Resolves once `close` has been called, by anyone.
    async fn closed(&self);
}

/// `MessageSink` over the write half of an axum `WebSocket`.
pub struct WsSink {
    inner: Mutex<SplitSink<WebSocket, WsMessage>>,
    closed: CancellationToken,
}

impl WsSink {
    pub fn new(inner: SplitSink<WebSocket, WsMessage>) -> Self {
        Self {
            inner: Mutex::new(inner),
            closed: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        self.inner
            .lock()
            .await
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Write(e.to_string()))
    }

    async fn close(&self) {
        self.closed.cancel();
        let _ = self.inner.lock().await.close().await;
    }

    async fn closed(&self) {
        self.closed.cancelled().await;
    }
}

/// One inbound WebSocket frame, as the relay sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// Payload to broadcast. Binary frames arrive here as lossy UTF-8.
    Text(String),
    /// Ping/pong; answered by the transport, never relayed.
    Control,
    /// Peer sent a close frame.
    Close,
}

impl From<WsMessage> for Frame {
    fn from(msg: WsMessage) -> Self {
        match msg {
            WsMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            WsMessage::Binary(bytes) => Frame::Text(String::from_utf8_lossy(&bytes).into_owned()),
            WsMessage::Ping(_) | WsMessage::Pong(_) => Frame::Control,
            WsMessage::Close(_) => Frame::Close,
        }
    }
}

/// Drive an upgraded socket until it fails or closes. Runs on its own task.
pub async fn handle_socket(socket: WebSocket, registry: Arc<ClientRegistry>) {
    let (ws_tx, ws_rx) = socket.split();
    let sink: Arc<dyn MessageSink> = Arc::new(WsSink::new(ws_tx));
    let inbound = ws_rx.map(|msg| {
        msg.map(Frame::from)
            .map_err(|e| ChannelError::Read(e.to_string()))
    });

    run_connection(&registry, ConnectionId::new(), sink, inbound).await;
}

/// Connection lifecycle.
///
/// Registers the connection, broadcasts each inbound text before reading the
/// next frame, and on the first read failure, close frame or end of stream
/// deregisters and closes the sink. A sink closed elsewhere (a broadcast
/// pruned it after a failed send) ends the loop too, before any further frame
/// is relayed. Disconnection is terminal; clients must reconnect to rejoin.
pub async fn run_connection<St>(
    registry: &ClientRegistry,
    id: ConnectionId,
    sink: Arc<dyn MessageSink>,
    mut inbound: St,
) where
    St: Stream<Item = Result<Frame, ChannelError>> + Unpin,
{
    registry.register(id.clone(), Arc::clone(&sink)).await;
    info!(conn_id = %id, "WebSocket client connected");

    let failure = loop {
        let next = tokio::select! {
            biased;
            _ = sink.closed() => {
                break Some(ChannelError::Write("connection closed after failed send".into()));
            }
            next = inbound.next() => next,
        };
        match next {
            Some(Ok(Frame::Text(text))) => {
                info!(conn_id = %id, text = %text, "received message");
                broadcast(registry, &text).await;
            }
            Some(Ok(Frame::Control)) => {}
            Some(Ok(Frame::Close)) => break None,
            Some(Err(e)) => break Some(e),
            None => break Some(ChannelError::Read("stream ended without close frame".into())),
        }
    };

    match &failure {
        Some(e) => warn!(
            conn_id = %id,
            error = %e,
            error_kind = e.error_kind(),
            "connection failed, closing"
        ),
        None => info!(conn_id = %id, "client closed connection"),
    }

    let _ = registry.deregister(&id).await;
    sink.close().await;
}
