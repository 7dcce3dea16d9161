use uuid::Uuid;

use tribune_types::events::PushEvent;

/// Delivers unsolicited events to live connections.
///
/// Implementations must not block: fanout runs on the requesting
/// connection's task, in the middle of handling its request.
pub trait Notifier: Send + Sync {
    /// Pushes `event` to every live connection except `origin`.
    fn broadcast(&self, origin: Uuid, event: PushEvent);
}

/// Discards every event. Used when no connections are being served.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn broadcast(&self, _origin: Uuid, _event: PushEvent) {}
}
