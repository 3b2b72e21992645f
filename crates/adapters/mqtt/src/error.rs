//! MQTT adapter error types.

use warema_bridge_domain::error::BridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configured server URL cannot be used.
    #[error("invalid MQTT server {0:?}")]
    InvalidServer(String),

    /// Topics we publish on must be non-empty and free of wildcards.
    #[error("invalid publish topic {0:?}")]
    InvalidTopic(String),

    /// The connection was shut down and accepts no more messages.
    #[error("MQTT connection closed")]
    Closed,
}

impl MqttError {
    /// Convert into a [`BridgeError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> BridgeError {
        BridgeError::Transport(Box::new(self))
    }
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
