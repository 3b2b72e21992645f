//! Home Assistant MQTT discovery payloads.
//!
//! The payload layout is Home Assistant's contract; field names and values
//! here must stay as they are for existing installations to keep their
//! entities.

use serde_json::{Value, json};

use warema_bridge_domain::device::{DeviceClass, DeviceType};
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::topic::{self, WeatherChannel};

/// One retained discovery config.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub payload: Value,
}

/// Discovery configs announcing `snr` to Home Assistant.
///
/// Covers get one config; weather stations get one per telemetry channel.
/// Ignored types get none.
#[must_use]
pub fn messages(snr: &SerialNumber, device_type: DeviceType) -> Vec<DiscoveryMessage> {
    match device_type.class() {
        DeviceClass::Cover => vec![cover(snr, device_type)],
        DeviceClass::WeatherStation => WeatherChannel::ALL
            .into_iter()
            .map(|channel| weather_sensor(snr, device_type, channel))
            .collect(),
        DeviceClass::Ignored => Vec::new(),
    }
}

fn base(snr: &SerialNumber, device_type: DeviceType) -> serde_json::Map<String, Value> {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "availability".into(),
        json!([
            {"topic": topic::BRIDGE_STATE},
            {"topic": topic::availability(snr)},
        ]),
    );
    payload.insert("unique_id".into(), json!(snr));
    payload.insert("name".into(), Value::Null);
    payload.insert(
        "device".into(),
        json!({
            "identifiers": snr,
            "manufacturer": "Warema",
            "name": snr,
            "model": device_type.model(),
        }),
    );
    payload
}

fn cover(snr: &SerialNumber, device_type: DeviceType) -> DiscoveryMessage {
    let mut payload = base(snr, device_type);
    let mut put = |key: &str, value: Value| {
        payload.insert(key.to_string(), value);
    };

    put("command_topic", json!(topic::set(snr)));

    let has_state = !matches!(device_type, DeviceType::ActuatorUp);
    if has_state {
        put("state_topic", json!(topic::state(snr)));
    }

    let positionable = !matches!(device_type, DeviceType::SmartSocket);
    if positionable {
        put("position_open", json!(0));
        put("position_closed", json!(100));
        put("position_topic", json!(topic::position(snr)));
        put("set_position_topic", json!(topic::set_position(snr)));
        put("tilt_status_topic", json!(topic::tilt(snr)));
        put("tilt_command_topic", json!(topic::set_tilt(snr)));
        put("tilt_closed_value", json!(-75));
        put("tilt_opened_value", json!(75));
        put("tilt_min", json!(-75));
        put("tilt_max", json!(75));
    }

    DiscoveryMessage {
        topic: topic::discovery("cover", snr, snr.as_str()),
        payload: Value::Object(payload),
    }
}

fn weather_sensor(
    snr: &SerialNumber,
    device_type: DeviceType,
    channel: WeatherChannel,
) -> DiscoveryMessage {
    let mut payload = base(snr, device_type);
    let object_id = format!("{snr}_{}", channel.as_str());

    payload.insert("state_topic".into(), json!(topic::weather(snr, channel)));
    payload.insert("unique_id".into(), json!(object_id));
    payload.insert("object_id".into(), json!(object_id));

    let (component, device_class, unit) = match channel {
        WeatherChannel::Illuminance => ("sensor", "illuminance", Some("lx")),
        WeatherChannel::Temperature => ("sensor", "temperature", Some("\u{b0}C")),
        WeatherChannel::Wind => ("sensor", "wind_speed", Some("m/s")),
        WeatherChannel::Rain => ("binary_sensor", "moisture", None),
    };
    payload.insert("device_class".into(), json!(device_class));
    if let Some(unit) = unit {
        payload.insert("unit_of_measurement".into(), json!(unit));
    }

    DiscoveryMessage {
        topic: topic::discovery(component, snr, channel.as_str()),
        payload: Value::Object(payload),
    }
}
