//! Stick events as reported by the radio driver, decoded at the boundary.
//!
//! The driver delivers each event as a topic name plus a JSON payload
//! ([`StickMessage`]). [`ProtocolEvent::decode`] turns that into a typed
//! event, fixing canonical types on the way: serial numbers become
//! [`SerialNumber`], positions and tilts are range-checked. Anything that does
//! not fit is a [`PayloadError`] and must not reach the registry.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PayloadError;
use crate::id::SerialNumber;
use crate::position::{Position, Tilt};

/// Event topics emitted by the stick driver.
pub mod wire {
    pub const INIT_COMPLETION: &str = "wms-vb-init-completion";
    pub const SCANNED_DEVICES: &str = "wms-vb-scanned-devices";
    pub const WEATHER_BROADCAST: &str = "wms-vb-rcv-weather-broadcast";
    pub const POSITION_UPDATE: &str = "wms-vb-blind-position-update";
    pub const CMD_RESULT_SET_POSITION: &str = "wms-vb-cmd-result-set-position";
    pub const CMD_RESULT_GET_POSITION: &str = "wms-vb-cmd-result-get-position";
    pub const CMD_RESULT_STOP: &str = "wms-vb-cmd-result-stop";
}

/// Raw event as delivered by the stick driver.
#[derive(Debug, Clone, PartialEq)]
pub struct StickMessage {
    pub topic: String,
    pub payload: Value,
}

impl StickMessage {
    /// Build a message from a topic and payload.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// A device found by a network scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDevice {
    pub snr: SerialNumber,
    /// Raw WMS type code; resolution happens at registration so unknown codes
    /// can be reported there.
    pub type_code: u16,
}

/// Scan outcome, read entry by entry.
///
/// Entries that cannot be read are kept as descriptions in `rejected` so one
/// bad entry does not hide the rest of the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub devices: Vec<ScannedDevice>,
    /// Why an entry (or the whole device list) was unreadable.
    pub rejected: Vec<String>,
}

/// Weather station broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub snr: SerialNumber,
    /// Illuminance in lux.
    pub lumen: f64,
    /// Temperature in °C.
    pub temp: f64,
    /// Wind speed in m/s.
    pub wind: f64,
    pub rain: bool,
}

/// Position and/or tilt reported by a blind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionReport {
    pub position: Option<Position>,
    pub tilt: Option<Tilt>,
    pub moving: bool,
}

/// Stick command whose outcome is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SetPosition,
    GetPosition,
    Stop,
}

impl CommandKind {
    /// Short name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetPosition => "set-position",
            Self::GetPosition => "get-position",
            Self::Stop => "stop",
        }
    }
}

/// Typed stick event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// The stick finished joining the network.
    InitCompleted,
    /// A scan finished.
    ScanResults(ScanReport),
    /// A weather station broadcast its readings.
    WeatherBroadcast(WeatherReport),
    /// A blind reported where it is.
    PositionUpdate {
        snr: SerialNumber,
        report: PositionReport,
    },
    /// A command was acknowledged, successfully or not.
    CommandResult {
        kind: CommandKind,
        snr: SerialNumber,
        /// Driver-reported error, `None` on success.
        error: Option<String>,
    },
}

impl ProtocolEvent {
    /// Decode a raw driver message.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] for unknown topics, missing fields or values
    /// outside their domain.
    pub fn decode(message: &StickMessage) -> Result<Self, PayloadError> {
        let payload = &message.payload;
        match message.topic.as_str() {
            wire::INIT_COMPLETION => Ok(Self::InitCompleted),
            wire::SCANNED_DEVICES => Ok(Self::ScanResults(decode_scan(payload))),
            wire::WEATHER_BROADCAST => decode_weather(payload),
            wire::POSITION_UPDATE => decode_position(payload),
            wire::CMD_RESULT_SET_POSITION => decode_result(CommandKind::SetPosition, payload),
            wire::CMD_RESULT_GET_POSITION => decode_result(CommandKind::GetPosition, payload),
            wire::CMD_RESULT_STOP => decode_result(CommandKind::Stop, payload),
            other => Err(PayloadError::UnknownEvent(other.to_string())),
        }
    }

    /// Serial number the event is about, if it concerns a single device.
    #[must_use]
    pub fn snr(&self) -> Option<&SerialNumber> {
        match self {
            Self::InitCompleted | Self::ScanResults(_) => None,
            Self::WeatherBroadcast(report) => Some(&report.snr),
            Self::PositionUpdate { snr, .. } | Self::CommandResult { snr, .. } => Some(snr),
        }
    }
}

fn decode_scan(payload: &Value) -> ScanReport {
    let Some(entries) = payload.get("devices").and_then(Value::as_array) else {
        return ScanReport {
            devices: Vec::new(),
            rejected: vec![PayloadError::MissingField("devices").to_string()],
        };
    };

    let mut report = ScanReport::default();
    for entry in entries {
        let device = snr_field(entry).and_then(|snr| {
            Ok(ScannedDevice {
                snr,
                type_code: required(entry, "type")?,
            })
        });
        match device {
            Ok(device) => report.devices.push(device),
            Err(err) => report.rejected.push(format!("{entry}: {err}")),
        }
    }
    report
}

fn decode_weather(payload: &Value) -> Result<ProtocolEvent, PayloadError> {
    let weather = payload
        .get("weather")
        .ok_or(PayloadError::MissingField("weather"))?;

    Ok(ProtocolEvent::WeatherBroadcast(WeatherReport {
        snr: snr_field(weather)?,
        lumen: required(weather, "lumen")?,
        temp: required(weather, "temp")?,
        wind: required(weather, "wind")?,
        rain: optional(weather, "rain")?.unwrap_or(false),
    }))
}

fn decode_position(payload: &Value) -> Result<ProtocolEvent, PayloadError> {
    let snr = snr_field(payload)?;

    let position = optional::<i64>(payload, "position")?
        .map(Position::new)
        .transpose()
        .map_err(|source| PayloadError::OutOfRange {
            field: "position",
            source,
        })?;
    let tilt = optional::<i64>(payload, "angle")?
        .map(Tilt::new)
        .transpose()
        .map_err(|source| PayloadError::OutOfRange {
            field: "angle",
            source,
        })?;
    let moving = optional(payload, "moving")?.unwrap_or(false);

    Ok(ProtocolEvent::PositionUpdate {
        snr,
        report: PositionReport {
            position,
            tilt,
            moving,
        },
    })
}

fn decode_result(kind: CommandKind, payload: &Value) -> Result<ProtocolEvent, PayloadError> {
    // Falsy values (empty text, zero) mean success.
    let error = match payload.get("error") {
        None | Some(Value::Null | Value::Bool(false)) => None,
        Some(Value::String(text)) if text.is_empty() => None,
        Some(Value::Number(number)) if number.as_f64().is_some_and(|n| n.abs() < f64::EPSILON) => {
            None
        }
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(ProtocolEvent::CommandResult {
        kind,
        snr: snr_field(payload)?,
        error,
    })
}

/// Serial numbers arrive as integers or strings.
fn snr_field(object: &Value) -> Result<SerialNumber, PayloadError> {
    let text = match object.get("snr") {
        None | Some(Value::Null) => return Err(PayloadError::MissingField("snr")),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => {
            return Err(PayloadError::InvalidField {
                field: "snr",
                source: serde::de::Error::custom(format!("expected string or integer, got {other}")),
            });
        }
    };

    SerialNumber::new(text).map_err(|source| PayloadError::OutOfRange {
        field: "snr",
        source,
    })
}

fn required<T: DeserializeOwned>(object: &Value, field: &'static str) -> Result<T, PayloadError> {
    optional(object, field)?.ok_or(PayloadError::MissingField(field))
}

fn optional<T: DeserializeOwned>(
    object: &Value,
    field: &'static str,
) -> Result<Option<T>, PayloadError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| PayloadError::InvalidField { field, source }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snr(value: &str) -> SerialNumber {
        SerialNumber::new(value).unwrap()
    }

    #[test]
    fn should_decode_init_completion() {
        let message = StickMessage::new(wire::INIT_COMPLETION, json!({"status": "ready"}));
        assert_eq!(
            ProtocolEvent::decode(&message).unwrap(),
            ProtocolEvent::InitCompleted
        );
    }

    #[test]
    fn should_decode_scan_results_with_numeric_serials() {
        let message = StickMessage::new(
            wire::SCANNED_DEVICES,
            json!({"devices": [
                {"snr": 123, "type": 25, "typeStr": "Radio motor"},
                {"snr": "456", "type": 6},
            ]}),
        );

        let ProtocolEvent::ScanResults(report) = ProtocolEvent::decode(&message).unwrap() else {
            panic!("expected scan results");
        };
        assert_eq!(
            report.devices,
            vec![
                ScannedDevice {
                    snr: snr("123"),
                    type_code: 25
                },
                ScannedDevice {
                    snr: snr("456"),
                    type_code: 6
                },
            ]
        );
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn should_skip_unreadable_scan_entries() {
        let message = StickMessage::new(
            wire::SCANNED_DEVICES,
            json!({"devices": [
                {"snr": 123, "type": 25},
                {"snr": 456, "type": 21},
                {"snr": 789},
                {"snr": 790, "type": "motor"},
                {"type": 25},
            ]}),
        );

        let ProtocolEvent::ScanResults(report) = ProtocolEvent::decode(&message).unwrap() else {
            panic!("expected scan results");
        };
        let found: Vec<_> = report.devices.iter().map(|d| d.snr.as_str()).collect();
        assert_eq!(found, vec!["123", "456"]);
        assert_eq!(report.rejected.len(), 3);
        assert!(report.rejected[0].contains("789"));
    }

    #[test]
    fn should_decode_scan_without_device_list_as_empty() {
        let message = StickMessage::new(wire::SCANNED_DEVICES, json!({"status": "done"}));

        let ProtocolEvent::ScanResults(report) = ProtocolEvent::decode(&message).unwrap() else {
            panic!("expected scan results");
        };
        assert!(report.devices.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn should_decode_position_update() {
        let message = StickMessage::new(
            wire::POSITION_UPDATE,
            json!({"snr": 123, "position": 50, "angle": -20, "moving": true}),
        );

        let event = ProtocolEvent::decode(&message).unwrap();
        assert_eq!(
            event,
            ProtocolEvent::PositionUpdate {
                snr: snr("123"),
                report: PositionReport {
                    position: Some(Position::new(50).unwrap()),
                    tilt: Some(Tilt::new(-20).unwrap()),
                    moving: true,
                },
            }
        );
    }

    #[test]
    fn should_treat_missing_moving_flag_as_at_rest() {
        let message = StickMessage::new(wire::POSITION_UPDATE, json!({"snr": "9", "angle": 5}));
        let ProtocolEvent::PositionUpdate { report, .. } = ProtocolEvent::decode(&message).unwrap()
        else {
            panic!("expected position update");
        };
        assert!(!report.moving);
        assert_eq!(report.position, None);
    }

    #[test]
    fn should_reject_position_update_without_serial() {
        let message = StickMessage::new(wire::POSITION_UPDATE, json!({"position": 10}));
        assert!(matches!(
            ProtocolEvent::decode(&message),
            Err(PayloadError::MissingField("snr"))
        ));
    }

    #[test]
    fn should_reject_out_of_range_position() {
        let message = StickMessage::new(wire::POSITION_UPDATE, json!({"snr": 1, "position": 140}));
        assert!(matches!(
            ProtocolEvent::decode(&message),
            Err(PayloadError::OutOfRange {
                field: "position",
                ..
            })
        ));
    }

    #[test]
    fn should_reject_non_numeric_angle() {
        let message = StickMessage::new(wire::POSITION_UPDATE, json!({"snr": 1, "angle": "up"}));
        assert!(matches!(
            ProtocolEvent::decode(&message),
            Err(PayloadError::InvalidField { field: "angle", .. })
        ));
    }

    #[test]
    fn should_decode_weather_broadcast() {
        let message = StickMessage::new(
            wire::WEATHER_BROADCAST,
            json!({"weather": {"snr": 777, "lumen": 1200, "temp": 21.5, "wind": 3, "rain": true}}),
        );

        let ProtocolEvent::WeatherBroadcast(report) = ProtocolEvent::decode(&message).unwrap()
        else {
            panic!("expected weather broadcast");
        };
        assert_eq!(report.snr, snr("777"));
        assert!((report.lumen - 1200.0).abs() < f64::EPSILON);
        assert!((report.temp - 21.5).abs() < f64::EPSILON);
        assert!(report.rain);
    }

    #[test]
    fn should_decode_command_result_error() {
        let message = StickMessage::new(
            wire::CMD_RESULT_STOP,
            json!({"snr": 5, "error": "no response"}),
        );
        assert_eq!(
            ProtocolEvent::decode(&message).unwrap(),
            ProtocolEvent::CommandResult {
                kind: CommandKind::Stop,
                snr: snr("5"),
                error: Some("no response".to_string()),
            }
        );
    }

    #[test]
    fn should_decode_successful_command_result() {
        let message = StickMessage::new(wire::CMD_RESULT_GET_POSITION, json!({"snr": 5}));
        let event = ProtocolEvent::decode(&message).unwrap();
        assert!(matches!(
            event,
            ProtocolEvent::CommandResult {
                kind: CommandKind::GetPosition,
                error: None,
                ..
            }
        ));
        assert_eq!(event.snr(), Some(&snr("5")));
    }

    #[test]
    fn should_treat_falsy_command_errors_as_success() {
        for error in [json!(""), json!(0), json!(0.0), json!(false), json!(null)] {
            let message =
                StickMessage::new(wire::CMD_RESULT_SET_POSITION, json!({"snr": 5, "error": error}));
            assert!(
                matches!(
                    ProtocolEvent::decode(&message).unwrap(),
                    ProtocolEvent::CommandResult { error: None, .. }
                ),
                "error value {error} should mean success"
            );
        }
    }

    #[test]
    fn should_keep_numeric_command_error() {
        let message = StickMessage::new(wire::CMD_RESULT_STOP, json!({"snr": 5, "error": 3}));
        assert!(matches!(
            ProtocolEvent::decode(&message).unwrap(),
            ProtocolEvent::CommandResult { error: Some(code), .. } if code == "3"
        ));
    }

    #[test]
    fn should_reject_unknown_topic() {
        let message = StickMessage::new("wms-vb-something-else", json!({}));
        assert!(matches!(
            ProtocolEvent::decode(&message),
            Err(PayloadError::UnknownEvent(_))
        ));
    }
}
