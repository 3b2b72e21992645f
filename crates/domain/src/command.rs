//! Commands received from Home Assistant over MQTT.

use crate::error::CommandError;
use crate::id::SerialNumber;
use crate::position::{Position, Tilt};
use crate::topic;

/// Action carried by a `warema/<id>/set` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetAction {
    Open,
    Close,
    Stop,
    On,
    Off,
}

impl SetAction {
    /// Parse the `set` payload.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownAction`] for anything but the five
    /// supported keywords.
    pub fn parse(payload: &str) -> Result<Self, CommandError> {
        match payload.trim() {
            "OPEN" => Ok(Self::Open),
            "CLOSE" => Ok(Self::Close),
            "STOP" => Ok(Self::Stop),
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

/// Command aimed at one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Set(SetAction),
    SetPosition(Position),
    SetTilt(Tilt),
}

/// Any message the bridge subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Home Assistant's birth/last-will message on `homeassistant/status`.
    HomeAssistantStatus { online: bool },
    /// A command for a device. The serial number is taken from the topic
    /// as-is; whether the device exists is for the stick to decide.
    Device {
        snr: SerialNumber,
        command: Command,
    },
}

impl InboundMessage {
    /// Parse a topic and its UTF-8 payload.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the topic is not one the bridge handles or
    /// the payload does not fit the command.
    pub fn parse(topic_name: &str, payload: &str) -> Result<Self, CommandError> {
        if topic_name == topic::HOMEASSISTANT_STATUS {
            return Ok(Self::HomeAssistantStatus {
                online: payload.trim() == "online",
            });
        }

        let unknown = || CommandError::UnknownTopic(topic_name.to_string());

        let mut parts = topic_name.split('/');
        let (Some(topic::PREFIX), Some(device), Some(verb), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(unknown());
        };
        let snr = SerialNumber::new(device).map_err(|_| unknown())?;

        let command = match verb {
            "set" => Command::Set(SetAction::parse(payload)?),
            "set_position" => Command::SetPosition(
                Position::new(parse_integer(payload)?).map_err(CommandError::OutOfRange)?,
            ),
            "set_tilt" => {
                Command::SetTilt(Tilt::new(parse_integer(payload)?).map_err(CommandError::OutOfRange)?)
            }
            _ => return Err(unknown()),
        };

        Ok(Self::Device { snr, command })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_integer(payload: &str) -> Result<i64, CommandError> {
    let trimmed = payload.trim();
    trimmed
        .parse::<i64>()
        .or_else(|_| {
            // Home Assistant may send sliders as floats ("42.0").
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
                .ok_or(())
        })
        .map_err(|()| CommandError::NotANumber(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn snr(value: &str) -> SerialNumber {
        SerialNumber::new(value).unwrap()
    }

    #[test]
    fn should_parse_set_actions() {
        for (payload, action) in [
            ("OPEN", SetAction::Open),
            ("CLOSE", SetAction::Close),
            ("STOP", SetAction::Stop),
            ("ON", SetAction::On),
            ("OFF", SetAction::Off),
        ] {
            assert_eq!(
                InboundMessage::parse("warema/123/set", payload).unwrap(),
                InboundMessage::Device {
                    snr: snr("123"),
                    command: Command::Set(action),
                }
            );
        }
    }

    #[test]
    fn should_reject_unknown_set_action() {
        assert_eq!(
            InboundMessage::parse("warema/123/set", "TOGGLE"),
            Err(CommandError::UnknownAction("TOGGLE".to_string()))
        );
    }

    #[test]
    fn should_parse_set_position() {
        assert_eq!(
            InboundMessage::parse("warema/123/set_position", "42").unwrap(),
            InboundMessage::Device {
                snr: snr("123"),
                command: Command::SetPosition(Position::new(42).unwrap()),
            }
        );
    }

    #[test]
    fn should_accept_integral_float_position() {
        assert_eq!(
            InboundMessage::parse("warema/123/set_position", "42.0").unwrap(),
            InboundMessage::Device {
                snr: snr("123"),
                command: Command::SetPosition(Position::new(42).unwrap()),
            }
        );
    }

    #[test]
    fn should_parse_negative_tilt() {
        assert_eq!(
            InboundMessage::parse("warema/123/set_tilt", "-75").unwrap(),
            InboundMessage::Device {
                snr: snr("123"),
                command: Command::SetTilt(Tilt::new(-75).unwrap()),
            }
        );
    }

    #[test]
    fn should_reject_out_of_range_position() {
        assert_eq!(
            InboundMessage::parse("warema/123/set_position", "150"),
            Err(CommandError::OutOfRange(ValidationError::PositionOutOfRange(
                150
            )))
        );
    }

    #[test]
    fn should_reject_non_numeric_tilt() {
        assert_eq!(
            InboundMessage::parse("warema/123/set_tilt", "abc"),
            Err(CommandError::NotANumber("abc".to_string()))
        );
    }

    #[test]
    fn should_accept_non_numeric_device_id() {
        assert!(matches!(
            InboundMessage::parse("warema/living-room/set", "STOP"),
            Ok(InboundMessage::Device { .. })
        ));
    }

    #[test]
    fn should_parse_home_assistant_status() {
        assert_eq!(
            InboundMessage::parse("homeassistant/status", "online").unwrap(),
            InboundMessage::HomeAssistantStatus { online: true }
        );
        assert_eq!(
            InboundMessage::parse("homeassistant/status", "offline").unwrap(),
            InboundMessage::HomeAssistantStatus { online: false }
        );
    }

    #[test]
    fn should_reject_unrelated_topics() {
        assert!(matches!(
            InboundMessage::parse("warema/123/position", "10"),
            Err(CommandError::UnknownTopic(_))
        ));
        assert!(matches!(
            InboundMessage::parse("other/123/set", "OPEN"),
            Err(CommandError::UnknownTopic(_))
        ));
        assert!(matches!(
            InboundMessage::parse("warema/123/set/extra", "OPEN"),
            Err(CommandError::UnknownTopic(_))
        ));
    }
}
