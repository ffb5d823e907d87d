//! Fan-out of inbound messages to every registered connection.

use tracing::{debug, warn};

use crate::registry::ClientRegistry;

/// Deliver `text` to every connection in the registry, the sender included.
///
/// The registry guard is held for the whole fan-out. A member whose send
/// fails is closed and removed; delivery to the remaining members continues.
/// Nothing is reported back to the originating connection.
pub async fn broadcast(registry: &ClientRegistry, text: &str) {
    let mut members = registry.lock_members().await;
    let mut failed = Vec::new();

    for (id, sink) in members.iter() {
        if let Err(e) = sink.send(text).await {
            warn!(
                conn_id = %id,
                error = %e,
                error_kind = e.error_kind(),
                "failed to send message, dropping client"
            );
            sink.close().await;
            failed.push(id.clone());
        }
    }

    for id in &failed {
        let _ = members.remove(id);
    }

    debug!(
        recipients = members.len(),
        pruned = failed.len(),
        msg_len = text.len(),
        "broadcast message"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{drain, FailingSink, RecordingSink};
    use relay_core::ConnectionId;

    #[tokio::test]
    async fn delivers_to_every_member() {
        let registry = ClientRegistry::new();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (sink, rx) = RecordingSink::new();
            registry.register(ConnectionId::new(), sink).await;
            receivers.push(rx);
        }

        broadcast(&registry, "hello").await;

        for rx in &mut receivers {
            assert_eq!(drain(rx), vec!["hello".to_string()]);
        }
        assert_eq!(registry.len().await, 5);
    }

    #[tokio::test]
    async fn empty_registry_is_noop() {
        let registry = ClientRegistry::new();
        broadcast(&registry, "nobody home").await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn failed_member_pruned_others_still_delivered() {
        let registry = ClientRegistry::new();
        let bad_id = ConnectionId::new();
        let bad = FailingSink::new();
        let (d, mut rx_d) = RecordingSink::new();
        let (e, mut rx_e) = RecordingSink::new();
        registry.register(bad_id.clone(), bad.clone()).await;
        registry.register(ConnectionId::new(), d).await;
        registry.register(ConnectionId::new(), e).await;

        broadcast(&registry, "msg").await;

        assert_eq!(drain(&mut rx_d), vec!["msg".to_string()]);
        assert_eq!(drain(&mut rx_e), vec!["msg".to_string()]);
        assert!(!registry.contains(&bad_id).await);
        assert_eq!(registry.len().await, 2);
        assert!(bad.is_closed());
        assert_eq!(bad.attempts(), 1);
    }

    #[tokio::test]
    async fn pruned_member_not_retried_on_next_broadcast() {
        let registry = ClientRegistry::new();
        let bad = FailingSink::new();
        let (good, mut rx) = RecordingSink::new();
        registry.register(ConnectionId::new(), bad.clone()).await;
        registry.register(ConnectionId::new(), good).await;

        broadcast(&registry, "first").await;
        broadcast(&registry, "second").await;

        assert_eq!(bad.attempts(), 1);
        assert_eq!(drain(&mut rx), vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn deregistered_member_receives_nothing() {
        let registry = ClientRegistry::new();
        let gone_id = ConnectionId::new();
        let (gone, mut rx_gone) = RecordingSink::new();
        let (live, mut rx_live) = RecordingSink::new();
        registry.register(gone_id.clone(), gone).await;
        registry.register(ConnectionId::new(), live).await;

        assert!(registry.deregister(&gone_id).await);
        broadcast(&registry, "after").await;

        assert!(drain(&mut rx_gone).is_empty());
        assert_eq!(drain(&mut rx_live), vec!["after".to_string()]);
    }

    #[tokio::test]
    async fn all_members_failing_empties_registry() {
        let registry = ClientRegistry::new();
        let sinks: Vec<_> = (0..3).map(|_| FailingSink::new()).collect();
        for sink in &sinks {
            registry.register(ConnectionId::new(), sink.clone()).await;
        }

        broadcast(&registry, "x").await;

        assert!(registry.is_empty().await);
        assert!(sinks.iter().all(|s| s.is_closed()));
    }

    #[tokio::test]
    async fn text_is_relayed_verbatim() {
        let registry = ClientRegistry::new();
        let (sink, mut rx) = RecordingSink::new();
        registry.register(ConnectionId::new(), sink).await;

        let payload = r#"{"not":"parsed"} ünïcødé"#;
        broadcast(&registry, payload).await;

        assert_eq!(drain(&mut rx), vec![payload.to_string()]);
    }
}
