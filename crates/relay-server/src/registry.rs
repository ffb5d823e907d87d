//! Registry of live WebSocket connections.

use std::collections::HashMap;
use std::sync::Arc;

use relay_core::ConnectionId;
use tokio::sync::{Mutex, MutexGuard};

use crate::connection::MessageSink;

/// Registry members, keyed by connection identity.
pub type Members = HashMap<ConnectionId, Arc<dyn MessageSink>>;

/// Set of connections currently assumed live.
///
/// Every read and write goes through one async mutex. Broadcasts hold it for
/// the whole fan-out, so membership cannot change mid-broadcast.
pub struct ClientRegistry {
    members: Mutex<Members>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Add a connection. Visible to every broadcast that starts afterwards.
    pub async fn register(&self, id: ConnectionId, sink: Arc<dyn MessageSink>) {
        let mut members = self.members.lock().await;
        if members.insert(id.clone(), sink).is_some() {
            tracing::warn!(conn_id = %id, "connection registered twice, replaced handle");
        }
    }

    /// Remove a connection if present. Returns whether it was a member.
    pub async fn deregister(&self, id: &ConnectionId) -> bool {
        self.members.lock().await.remove(id).is_some()
    }

    /// Exclusive access to the member set for the duration of a broadcast.
    pub async fn lock_members(&self) -> MutexGuard<'_, Members> {
        self.members.lock().await
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.members.lock().await.contains_key(id)
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
