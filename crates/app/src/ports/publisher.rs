//! Outbound messages to the broker.

use warema_bridge_domain::error::BridgeError;

/// Hands messages to the messaging transport.
pub trait MessagePublisher {
    /// Queue `payload` on `topic`. Delivery, QoS and reconnection are the
    /// transport's concern.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] when the transport refuses the
    /// message (e.g. its outgoing queue is full).
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BridgeError>;
}

impl<T: MessagePublisher> MessagePublisher for std::sync::Arc<T> {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BridgeError> {
        (**self).publish(topic, payload, retain)
    }
}
