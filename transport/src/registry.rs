//! Per-client output registry: maps a `user_id` to the unicast sink for the
//! connection currently representing it, so `Ack`/`CancelAck`/`Trade`
//! messages can be routed to the originating client (and, for trades, to
//! the counterparty).
//!
//! Backed by a `DashMap` for lock-free concurrent access from every
//! connection task, keyed by `user_id` rather than symbol since routing
//! here is per-client, not per-book.

use dashmap::DashMap;
use engine_core::OutputMessage;
use tokio::sync::mpsc::UnboundedSender;

/// A later connection registering the same `user_id` silently takes over
/// routing for it; a disconnecting connection's `unregister` is a no-op if
/// a newer connection has already replaced its entry. This is accepted
/// glue-level behavior, not an engine invariant.
pub struct ClientRegistry {
    senders: DashMap<u32, UnboundedSender<OutputMessage>>,
}

impl ClientRegistry {
    pub fn new() -> ClientRegistry {
        ClientRegistry {
            senders: DashMap::new(),
        }
    }

    pub fn register(&self, user_id: u32, sender: UnboundedSender<OutputMessage>) {
        self.senders.insert(user_id, sender);
    }

    /// Best-effort unicast delivery. Silently drops if `user_id` has never
    /// registered a connection or its connection has since closed.
    pub fn send_to(&self, user_id: u32, msg: OutputMessage) {
        if let Some(sender) = self.senders.get(&user_id) {
            let _ = sender.send(msg);
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> ClientRegistry {
        ClientRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Symbol;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn routes_to_registered_client() {
        let registry = ClientRegistry::new();
        let (tx, mut rx) = unbounded_channel();
        registry.register(1, tx);

        let ack = OutputMessage::ack(1, 1, Symbol::pack("IBM"));
        registry.send_to(1, ack.clone());

        assert_eq!(rx.recv().await.unwrap(), ack);
    }

    #[test]
    fn send_to_unregistered_user_is_a_silent_noop() {
        let registry = ClientRegistry::new();
        registry.send_to(42, OutputMessage::ack(42, 1, Symbol::pack("IBM")));
    }
}
