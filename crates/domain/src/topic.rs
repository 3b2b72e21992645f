//! MQTT topic names.
//!
//! These strings are the contract with Home Assistant and existing
//! dashboards and must not change.

use crate::id::SerialNumber;

/// Prefix of every bridge-owned topic.
pub const PREFIX: &str = "warema";

/// Bridge heartbeat and last-will topic.
pub const BRIDGE_STATE: &str = "warema/bridge/state";

/// Home Assistant birth/last-will topic.
pub const HOMEASSISTANT_STATUS: &str = "homeassistant/status";

/// Payload for a reachable device or bridge.
pub const ONLINE: &str = "online";

/// Payload for an unreachable device or bridge.
pub const OFFLINE: &str = "offline";

/// Topic filters the bridge subscribes to.
pub const SUBSCRIPTIONS: [&str; 4] = [
    "warema/+/set",
    "warema/+/set_position",
    "warema/+/set_tilt",
    HOMEASSISTANT_STATUS,
];

/// Telemetry channels of a weather station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherChannel {
    Illuminance,
    Temperature,
    Wind,
    Rain,
}

impl WeatherChannel {
    /// Every channel, in publish order.
    pub const ALL: [Self; 4] = [Self::Illuminance, Self::Temperature, Self::Wind, Self::Rain];

    /// Topic segment.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Illuminance => "illuminance",
            Self::Temperature => "temperature",
            Self::Wind => "wind",
            Self::Rain => "rain",
        }
    }
}

/// `warema/<id>/availability`
#[must_use]
pub fn availability(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/availability")
}

/// `warema/<id>/position`
#[must_use]
pub fn position(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/position")
}

/// `warema/<id>/tilt`
#[must_use]
pub fn tilt(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/tilt")
}

/// `warema/<id>/state`
#[must_use]
pub fn state(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/state")
}

/// `warema/<id>/set`
#[must_use]
pub fn set(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/set")
}

/// `warema/<id>/set_position`
#[must_use]
pub fn set_position(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/set_position")
}

/// `warema/<id>/set_tilt`
#[must_use]
pub fn set_tilt(snr: &SerialNumber) -> String {
    format!("{PREFIX}/{snr}/set_tilt")
}

/// `warema/<id>/<channel>/state`
#[must_use]
pub fn weather(snr: &SerialNumber, channel: WeatherChannel) -> String {
    format!("{PREFIX}/{snr}/{}/state", channel.as_str())
}

/// `homeassistant/<component>/<id>/<object>/config`
#[must_use]
pub fn discovery(component: &str, snr: &SerialNumber, object: &str) -> String {
    format!("homeassistant/{component}/{snr}/{object}/config")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snr() -> SerialNumber {
        SerialNumber::new("123").unwrap()
    }

    #[test]
    fn should_build_device_topics() {
        assert_eq!(availability(&snr()), "warema/123/availability");
        assert_eq!(position(&snr()), "warema/123/position");
        assert_eq!(tilt(&snr()), "warema/123/tilt");
        assert_eq!(state(&snr()), "warema/123/state");
        assert_eq!(set(&snr()), "warema/123/set");
        assert_eq!(set_position(&snr()), "warema/123/set_position");
        assert_eq!(set_tilt(&snr()), "warema/123/set_tilt");
    }

    #[test]
    fn should_build_weather_topics() {
        assert_eq!(
            weather(&snr(), WeatherChannel::Illuminance),
            "warema/123/illuminance/state"
        );
        assert_eq!(weather(&snr(), WeatherChannel::Rain), "warema/123/rain/state");
    }

    #[test]
    fn should_build_discovery_topic() {
        assert_eq!(
            discovery("cover", &snr(), "123"),
            "homeassistant/cover/123/123/config"
        );
        assert_eq!(
            discovery("binary_sensor", &snr(), "rain"),
            "homeassistant/binary_sensor/123/rain/config"
        );
    }
}
