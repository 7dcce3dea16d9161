use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use tribune_api::Notifier;
use tribune_types::events::PushEvent;

/// A live connection's outbound queue. Its writer task is the only thing
/// that touches the socket's write half.
struct Peer {
    address: SocketAddr,
    tx: mpsc::Sender<String>,
}

/// Tracks every live connection and fans pushes out to them.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// conn_id -> outbound queue
    peers: RwLock<HashMap<Uuid, Peer>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the fanout set.
    pub fn register(&self, conn_id: Uuid, address: SocketAddr, tx: mpsc::Sender<String>) {
        self.inner
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conn_id, Peer { address, tx });
    }

    pub fn unregister(&self, conn_id: Uuid) {
        self.inner
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&conn_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Enqueues `line` on every connection except `origin` without waiting.
    /// A full queue drops the line for that peer; a closed one drops the peer.
    /// Returns how many peers accepted it.
    pub fn broadcast_except(&self, origin: Uuid, line: &str) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let peers = self.inner.peers.read().unwrap_or_else(PoisonError::into_inner);
            for (conn_id, peer) in peers.iter().filter(|(id, _)| **id != origin) {
                match peer.tx.try_send(line.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Outbound queue full for {} ({}), dropping push", peer.address, conn_id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*conn_id),
                }
            }
        }

        if !closed.is_empty() {
            let mut peers = self.inner.peers.write().unwrap_or_else(PoisonError::into_inner);
            for conn_id in closed {
                if let Some(peer) = peers.remove(&conn_id) {
                    debug!("Dropped closed connection {} ({}) from fanout", peer.address, conn_id);
                }
            }
        }
        delivered
    }
}

impl Notifier for Dispatcher {
    fn broadcast(&self, origin: Uuid, event: PushEvent) {
        let line = event.to_response().encode();
        let delivered = self.broadcast_except(origin, &line);
        debug!("Push delivered to {} connections", delivered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn broadcast_skips_origin() {
        let dispatcher = Dispatcher::new();
        let (origin, other) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        dispatcher.register(origin, addr(1), tx_a);
        dispatcher.register(other, addr(2), tx_b);

        assert_eq!(dispatcher.broadcast_except(origin, "hello"), 1);
        assert_eq!(rx_b.recv().await.as_deref(), Some("hello"));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_peers_leave_the_fanout_set() {
        let dispatcher = Dispatcher::new();
        let (tx, rx) = mpsc::channel(4);
        dispatcher.register(Uuid::new_v4(), addr(1), tx);
        drop(rx);

        assert_eq!(dispatcher.connection_count(), 1);
        assert_eq!(dispatcher.broadcast_except(Uuid::new_v4(), "hello"), 0);
        assert_eq!(dispatcher.connection_count(), 0);
    }

    #[tokio::test]
    async fn full_queue_drops_but_keeps_peer() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::channel(1);
        dispatcher.register(Uuid::new_v4(), addr(1), tx);

        assert_eq!(dispatcher.broadcast_except(Uuid::new_v4(), "first"), 1);
        assert_eq!(dispatcher.broadcast_except(Uuid::new_v4(), "second"), 0);
        assert_eq!(dispatcher.connection_count(), 1);
        assert_eq!(rx.recv().await.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn notifier_encodes_topic_push() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::channel(4);
        dispatcher.register(Uuid::new_v4(), addr(1), tx);

        dispatcher.broadcast(
            Uuid::new_v4(),
            PushEvent::TopicCreated {
                topic: tribune_types::models::Topic {
                    id: 1,
                    title: "Hello there".into(),
                    subject: "General".into(),
                    content: "Hi everyone!!".into(),
                    author_id: 1,
                    created_at: chrono::Utc::now(),
                },
                author: "alicenick".into(),
            },
        );
        let line = rx.recv().await.unwrap();
        let push = tribune_types::wire::Response::decode(&line).unwrap();
        assert_eq!(push.op, "055");
        assert_eq!(push.topic_author.as_deref(), Some("alicenick"));
    }
}
