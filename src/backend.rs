//! Collaborator interfaces the connection core calls into.
//!
//! The upstream IRC session manager, the history store and the account
//! registry all live outside this crate. Each is reached through a trait
//! object so that every piece of cross-connection state is mutated by its
//! owner, never by a connection directly. Implementations must be safe to
//! call from many connection tasks at once.

use crate::client::{ClientHandle, ClientId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tkellem_proto::Message;
use tracing::debug;

/// Resolves backend names and validates credentials.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Look up a backend by its (already case-folded) name.
    fn resolve(&self, name: &str) -> Option<Arc<dyn BackendSession>>;

    /// Check `nick`/`password` for access to `backend`.
    async fn authenticate(
        &self,
        nick: &str,
        password: Option<&str>,
        backend: &dyn BackendSession,
    ) -> bool;
}

/// The shared, authenticated upstream session for one IRC network.
#[async_trait]
pub trait BackendSession: Send + Sync {
    /// Registered name of this backend (e.g. `net1`).
    fn name(&self) -> &str;

    /// Whether the upstream connection is live.
    fn is_connected(&self) -> bool;

    /// Add a client. Returns the backlog for this client identity, or `None`
    /// to refuse it.
    async fn attach(&self, client: ClientHandle) -> Option<Arc<dyn Backlog>>;

    /// Drop a client from the fan-out set. Must not block.
    fn detach(&self, client: &ClientHandle);

    /// Nick currently held upstream.
    fn current_nick(&self) -> String;

    /// Rooms currently joined upstream, in join order.
    fn joined_rooms(&self) -> Vec<String>;

    /// Send a line upstream.
    async fn forward(&self, msg: Message);

    /// Change the shared upstream nick on behalf of `client`.
    async fn change_nick(&self, client: &ClientHandle, nick: &str);

    /// Send the registration burst (001..MOTD) to a freshly attached client.
    async fn send_welcome(&self, client: &ClientHandle);
}

/// Message history for one client identity.
#[async_trait]
pub trait Backlog: Send + Sync {
    /// Replay stored history to `client`, for one room or for everything.
    async fn replay(&self, client: &ClientHandle, room: Option<&str>);
}

/// Concurrent set of attached clients, for backend implementations.
///
/// Attach and detach from different connection tasks serialize on the map's
/// shard locks.
#[derive(Debug, Default)]
pub struct ClientSet {
    clients: DashMap<ClientId, ClientHandle>,
}

impl ClientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client. Returns `false` if it was already present.
    pub fn insert(&self, client: ClientHandle) -> bool {
        self.clients.insert(client.id(), client).is_none()
    }

    /// Remove a client. Returns `false` if it was not present.
    pub fn remove(&self, client: &ClientHandle) -> bool {
        self.clients.remove(&client.id()).is_some()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<ClientHandle> {
        self.clients.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Snapshot of the attached clients.
    pub fn handles(&self) -> Vec<ClientHandle> {
        self.clients.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Send a line to every attached client, pruning those that are gone or
    /// have exceeded their SendQ.
    ///
    /// Returns the number of clients the line was queued for.
    pub fn broadcast(&self, msg: &Message) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.clients.iter() {
            if entry.value().send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*entry.key());
            }
        }

        for id in dead {
            debug!(client = %id, "Pruning unreachable client");
            self.clients.remove(&id);
        }

        delivered
    }

    /// Route a reply to one client through its transient path.
    pub fn route_transient(&self, id: ClientId, msg: Message) -> bool {
        self.get(id)
            .is_some_and(|client| client.transient_response(msg).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Outbound, OutboundReceiver, send_queue};
    use uuid::Uuid;

    fn handle(name: &str) -> (ClientHandle, OutboundReceiver) {
        handle_with_sendq(name, 16)
    }

    fn handle_with_sendq(name: &str, sendq: usize) -> (ClientHandle, OutboundReceiver) {
        let (queue, rx) = send_queue(sendq);
        (ClientHandle::new(Uuid::new_v4(), "net1", name, false, queue), rx)
    }

    #[test]
    fn test_insert_and_remove() {
        let set = ClientSet::new();
        let (a, _rx) = handle("laptop");

        assert!(set.insert(a.clone()));
        assert!(!set.insert(a.clone()));
        assert_eq!(set.len(), 1);
        assert!(set.remove(&a));
        assert!(!set.remove(&a));
        assert!(set.is_empty());
    }

    #[test]
    fn test_broadcast_prunes_closed_clients() {
        let set = ClientSet::new();
        let (a, mut rx_a) = handle("laptop");
        let (b, rx_b) = handle("phone");
        set.insert(a);
        set.insert(b.clone());
        drop(rx_b);

        let delivered = set.broadcast(&Message::new("PRIVMSG", ["#chat", "hi"]));

        assert_eq!(delivered, 1);
        assert!(!set.contains(b.id()));
        assert!(matches!(rx_a.try_recv(), Ok(Outbound::Line(_))));
    }

    #[test]
    fn test_broadcast_prunes_clients_over_sendq() {
        let set = ClientSet::new();
        let (slow, _rx_slow) = handle_with_sendq("slow", 2);
        let (fast, mut rx_fast) = handle_with_sendq("fast", 16);
        set.insert(slow.clone());
        set.insert(fast.clone());

        let line = Message::new("PRIVMSG", ["#chat", "hi"]);
        assert_eq!(set.broadcast(&line), 2);
        assert_eq!(set.broadcast(&line), 2);
        assert_eq!(set.broadcast(&line), 1);

        assert!(!set.contains(slow.id()));
        assert!(set.contains(fast.id()));
        assert_eq!(set.broadcast(&line), 1);

        let mut received = 0;
        while rx_fast.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[test]
    fn test_route_transient_targets_one_client() {
        let set = ClientSet::new();
        let (a, mut rx_a) = handle("laptop");
        let (b, mut rx_b) = handle("phone");
        set.insert(a.clone());
        set.insert(b);

        assert!(set.route_transient(a.id(), Message::new("366", ["n", "#chat"])));
        assert!(matches!(rx_a.try_recv(), Ok(Outbound::Transient(_))));
        assert!(rx_b.try_recv().is_err());
        assert!(!set.route_transient(Uuid::new_v4(), Message::new("366", ["n", "#x"])));
    }
}
