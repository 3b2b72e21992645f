//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `warema-bridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use warema_bridge_adapter_mqtt::MqttConfig;
use warema_bridge_adapter_virtual::VirtualStickConfig;
use warema_bridge_app::config::{BridgeConfig, ForcedDevice};
use warema_bridge_domain::id::SerialNumber;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "warema-bridge.toml";

/// PAN id of a stick that has not joined a network yet.
const UNPAIRED_PAN_ID: &str = "FFFF";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Broker connection.
    pub mqtt: MqttConfig,
    /// Radio stick parameters.
    pub stick: StickConfig,
    /// Device handling and timers.
    pub bridge: BridgeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated network served by the virtual stick.
    #[serde(rename = "virtual")]
    pub network: VirtualStickConfig,
}

/// WMS stick parameters.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StickConfig {
    /// Serial device the stick is attached to.
    pub serial_port: String,
    /// Radio channel, 11 to 26.
    pub channel: u8,
    /// Network key, 32 hex digits.
    pub key: String,
    /// Network PAN id, 4 hex digits. `FFFF` runs network discovery.
    pub pan_id: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl StickConfig {
    /// Whether the stick still has to discover its network.
    #[must_use]
    pub fn is_discovery_mode(&self) -> bool {
        self.pan_id.eq_ignore_ascii_case(UNPAIRED_PAN_ID)
    }
}

impl Config {
    /// Load configuration from `warema-bridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// environment variable holds an unusable value, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("MQTT_SERVER") {
            self.mqtt.server = val;
        }
        if let Some(val) = var("MQTT_USER") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = var("MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }

        if let Some(val) = var("IGNORED_DEVICES") {
            self.bridge.ignored_devices = parse_list::<SerialNumber>("IGNORED_DEVICES", &val)?;
        }
        if let Some(val) = var("FORCE_DEVICES") {
            self.bridge.forced_devices = parse_list::<ForcedDevice>("FORCE_DEVICES", &val)?;
        }

        let intervals = [
            ("POLLING_INTERVAL", &mut self.bridge.polling_interval_ms),
            ("MOVING_INTERVAL", &mut self.bridge.moving_interval_ms),
            ("AVAILABILITY_TIMEOUT", &mut self.bridge.availability_timeout_ms),
            ("WAKE_UP_INTERVAL", &mut self.bridge.wake_up_interval_ms),
            ("RESCAN_INTERVAL", &mut self.bridge.rescan_interval_ms),
        ];
        for (name, field) in intervals {
            if let Some(val) = var(name) {
                *field = parse_value(name, &val)?;
            }
        }

        if let Some(val) = var("WMS_CHANNEL") {
            self.stick.channel = parse_value("WMS_CHANNEL", &val)?;
        }
        if let Some(val) = var("WMS_KEY") {
            self.stick.key = val;
        }
        if let Some(val) = var("WMS_PAN_ID") {
            self.stick.pan_id = val;
        }
        if let Some(val) = var("WMS_SERIAL_PORT") {
            self.stick.serial_port = val;
        }

        if let Some(val) = var("WAREMA_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bridge
            .validate()
            .map_err(|field| ConfigError::Validation(format!("{field} must be non-zero")))?;

        self.mqtt
            .broker()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.mqtt.keep_alive_secs < 5 {
            return Err(ConfigError::Validation(
                "keep_alive_secs must be at least 5".to_string(),
            ));
        }

        if !(11..=26).contains(&self.stick.channel) {
            return Err(ConfigError::Validation(format!(
                "channel {} is outside 11..=26",
                self.stick.channel
            )));
        }
        if !is_hex(&self.stick.key, 32) {
            return Err(ConfigError::Validation(
                "key must be 32 hex digits".to_string(),
            ));
        }
        if !is_hex(&self.stick.pan_id, 4) {
            return Err(ConfigError::Validation(
                "pan_id must be 4 hex digits".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_value<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Comma-separated list, blank entries skipped.
fn parse_list<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<Vec<T>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_value(var, entry))
        .collect()
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            channel: 17,
            key: "00112233445566778899AABBCCDDEEFF".to_string(),
            pan_id: UNPAIRED_PAN_ID.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warema_bridged=info,warema_bridge_app=info,warema_bridge_adapter_mqtt=info,warema_bridge_adapter_virtual=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment variable holds a value that does not parse.
    #[error("invalid value {value:?} in {var}")]
    InvalidEnv { var: &'static str, value: String },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn paired() -> Config {
        let mut config = Config::default();
        config.stick.pan_id = "1A2B".to_string();
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.mqtt.server, "mqtt://localhost");
        assert_eq!(config.stick.serial_port, "/dev/ttyUSB0");
        assert_eq!(config.stick.channel, 17);
        assert_eq!(config.stick.key, "00112233445566778899AABBCCDDEEFF");
        assert!(config.stick.is_discovery_mode());
        assert_eq!(config.bridge.availability_timeout_ms, 300_000);
        assert!(config.network.devices.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.stick.channel, 17);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [mqtt]
            server = "mqtt://broker.lan:1884"
            username = "bridge"

            [stick]
            serial_port = "/dev/ttyACM0"
            channel = 20
            pan_id = "1A2B"

            [bridge]
            ignored_devices = ["111"]
            forced_devices = ["123:21"]
            wake_up_interval_ms = 30000

            [logging]
            filter = "debug"

            [[virtual.devices]]
            snr = "123"
            device_type = 21
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt.username.as_deref(), Some("bridge"));
        assert_eq!(config.stick.serial_port, "/dev/ttyACM0");
        assert_eq!(config.stick.channel, 20);
        assert!(!config.stick.is_discovery_mode());
        assert_eq!(config.bridge.ignored_devices.len(), 1);
        assert_eq!(config.bridge.forced_devices[0].type_code, 21);
        assert_eq!(config.bridge.wake_up_interval_ms, 30_000);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.network.devices[0].device_type, 21);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.stick.channel, 17);
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("MQTT_SERVER", "mqtt://10.0.0.5:1884"),
                ("MQTT_USER", "user"),
                ("MQTT_PASSWORD", "pass"),
                ("IGNORED_DEVICES", "111, 222,"),
                ("FORCE_DEVICES", "123:21,456"),
                ("AVAILABILITY_TIMEOUT", "60000"),
                ("RESCAN_INTERVAL", "600000"),
                ("WMS_CHANNEL", "11"),
                ("WMS_PAN_ID", "1A2B"),
                ("WMS_SERIAL_PORT", "/dev/ttyACM1"),
            ]))
            .unwrap();

        assert_eq!(config.mqtt.broker().unwrap(), ("10.0.0.5".to_string(), 1884));
        assert_eq!(config.mqtt.username.as_deref(), Some("user"));
        assert_eq!(config.mqtt.password.as_deref(), Some("pass"));
        assert_eq!(
            config.bridge.ignored_devices,
            vec![
                SerialNumber::new("111").unwrap(),
                SerialNumber::new("222").unwrap()
            ]
        );
        assert_eq!(config.bridge.forced_devices.len(), 2);
        assert_eq!(config.bridge.forced_devices[1].type_code, 25);
        assert_eq!(config.bridge.availability_timeout(), Duration::from_secs(60));
        assert_eq!(config.bridge.schedule().rescan, Duration::from_secs(600));
        assert_eq!(config.stick.channel, 11);
        assert!(!config.stick.is_discovery_mode());
        assert_eq!(config.stick.serial_port, "/dev/ttyACM1");
    }

    #[test]
    fn should_prefer_rust_log_over_warema_log() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("WAREMA_LOG", "debug"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_unparsable_interval() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("POLLING_INTERVAL", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "POLLING_INTERVAL",
                ..
            }
        ));
    }

    #[test]
    fn should_reject_malformed_forced_device() {
        let mut config = Config::default();
        assert!(
            config
                .apply_overrides(env(&[("FORCE_DEVICES", "123:blind")]))
                .is_err()
        );
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = paired();
        config.bridge.wake_up_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("wake_up_interval_ms")
        ));
    }

    #[test]
    fn should_reject_invalid_radio_parameters() {
        let mut config = paired();
        config.stick.channel = 27;
        assert!(config.validate().is_err());

        let mut config = paired();
        config.stick.key = "0011".to_string();
        assert!(config.validate().is_err());

        let mut config = paired();
        config.stick.pan_id = "XYZ1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_invalid_broker() {
        let mut config = paired();
        config.mqtt.server = "mqtt://broker:0".to_string();
        assert!(config.validate().is_err());

        let mut config = paired();
        config.mqtt.keep_alive_secs = 1;
        assert!(config.validate().is_err());
    }
}
