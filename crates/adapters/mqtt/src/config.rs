//! MQTT connection configuration.

use std::time::Duration;

use rumqttc::{LastWill, MqttOptions, QoS};
use serde::Deserialize;

use warema_bridge_domain::topic;

use crate::error::MqttError;

/// Port used when the server URL does not name one.
pub const DEFAULT_PORT: u16 = 1883;

/// Configuration for the broker connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker URL, `mqtt://host[:port]`. The scheme is optional.
    pub server: String,
    /// Username, if the broker requires authentication.
    pub username: Option<String>,
    /// Password sent along with `username`.
    pub password: Option<String>,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Capacity of the outgoing request queue.
    pub queue_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            server: "mqtt://localhost".to_string(),
            username: None,
            password: None,
            client_id: "warema-bridge".to_string(),
            keep_alive_secs: 30,
            queue_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Host and port from [`server`](Self::server).
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidServer`] for an unsupported scheme, an
    /// empty host or a port that is not a non-zero integer.
    pub fn broker(&self) -> Result<(String, u16), MqttError> {
        let invalid = || MqttError::InvalidServer(self.server.clone());

        let address = match self.server.split_once("://") {
            Some(("mqtt" | "tcp", rest)) => rest,
            Some(_) => return Err(invalid()),
            None => self.server.as_str(),
        };
        let address = address.trim_end_matches('/');

        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (address, DEFAULT_PORT),
        };
        if host.is_empty() || port == 0 {
            return Err(invalid());
        }
        Ok((host.to_string(), port))
    }

    /// Client options, with the bridge's `offline` last will.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidServer`] when the server URL is invalid.
    pub fn options(&self) -> Result<MqttOptions, MqttError> {
        let (host, port) = self.broker()?;
        let mut options = MqttOptions::new(&self.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        options.set_last_will(LastWill::new(
            topic::BRIDGE_STATE,
            topic::OFFLINE.as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
        ));
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.clone().unwrap_or_default());
        }
        Ok(options)
    }
}
