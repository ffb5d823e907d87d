//! In-memory `MessageSink` doubles for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::ChannelError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::MessageSink;

/// Forwards every sent message to a channel the test can read.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<String>,
    closed: CancellationToken,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(Self {
            tx,
            closed: CancellationToken::new(),
        });
        (sink, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Write("sink closed".into()));
        }
        self.tx
            .send(text.to_owned())
            .map_err(|e| ChannelError::Write(e.to_string()))
    }

    async fn close(&self) {
        self.closed.cancel();
    }

    async fn closed(&self) {
        self.closed.cancelled().await;
    }
}

/// Rejects every send, like a peer that vanished without a close frame.
#[derive(Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
    closed: CancellationToken,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[async_trait]
impl MessageSink for FailingSink {
    async fn send(&self, _text: &str) -> Result<(), ChannelError> {
        let _ = self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ChannelError::Write("connection reset by peer".into()))
    }

    async fn close(&self) {
        self.closed.cancel();
    }

    async fn closed(&self) {
        self.closed.cancelled().await;
    }
}

/// Drain everything currently buffered on a recording channel.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}
