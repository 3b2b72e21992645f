//! WMS device types and how each is exposed to Home Assistant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Product class reported by the stick during a scan.
///
/// The numeric codes are the ones used by the WMS protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum DeviceType {
    /// Weather station eco (code 6).
    WeatherStationEco,
    /// WMS Remote pro handheld (code 7).
    RemotePro,
    /// WMS WebControl pro gateway (code 9).
    WebControlPro,
    /// Plug receiver (code 20).
    PlugReceiver,
    /// Actuator UP (code 21).
    ActuatorUp,
    /// Smart socket (code 24).
    SmartSocket,
    /// Radio motor (code 25).
    RadioMotor,
}

/// How the bridge treats a device of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Exposed as a Home Assistant cover driven through the stick.
    Cover,
    /// Exposed as a set of sensors fed by weather broadcasts.
    WeatherStation,
    /// Part of the network but of no interest to the bridge.
    Ignored,
}

/// Type code that does not match any known [`DeviceType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised device type {0}")]
pub struct UnknownDeviceType(pub u16);

impl DeviceType {
    /// Type assumed for devices that show up without a scan result.
    pub const DEFAULT: Self = Self::RadioMotor;

    /// The WMS type code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::WeatherStationEco => 6,
            Self::RemotePro => 7,
            Self::WebControlPro => 9,
            Self::PlugReceiver => 20,
            Self::ActuatorUp => 21,
            Self::SmartSocket => 24,
            Self::RadioMotor => 25,
        }
    }

    /// Look up a type by its WMS code.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownDeviceType`] for codes the bridge does not support.
    pub fn from_code(code: u16) -> Result<Self, UnknownDeviceType> {
        match code {
            6 => Ok(Self::WeatherStationEco),
            7 => Ok(Self::RemotePro),
            9 => Ok(Self::WebControlPro),
            20 => Ok(Self::PlugReceiver),
            21 => Ok(Self::ActuatorUp),
            24 => Ok(Self::SmartSocket),
            25 => Ok(Self::RadioMotor),
            other => Err(UnknownDeviceType(other)),
        }
    }

    /// How the bridge exposes this type.
    #[must_use]
    pub fn class(self) -> DeviceClass {
        match self {
            Self::WeatherStationEco => DeviceClass::WeatherStation,
            Self::RemotePro | Self::WebControlPro => DeviceClass::Ignored,
            Self::PlugReceiver | Self::ActuatorUp | Self::SmartSocket | Self::RadioMotor => {
                DeviceClass::Cover
            }
        }
    }

    /// Model name shown in Home Assistant's device registry.
    #[must_use]
    pub fn model(self) -> &'static str {
        match self {
            Self::WeatherStationEco => "Weather station eco",
            Self::RemotePro => "WMS Remote pro",
            Self::WebControlPro => "WMS WebControl pro",
            Self::PlugReceiver => "Plug receiver",
            Self::ActuatorUp => "Actuator UP",
            Self::SmartSocket => "Smart socket",
            Self::RadioMotor => "Radio motor",
        }
    }
}

impl TryFrom<u16> for DeviceType {
    type Error = UnknownDeviceType;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_code(value)
    }
}

impl From<DeviceType> for u16 {
    fn from(value: DeviceType) -> Self {
        value.code()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (type {})", self.model(), self.code())
    }
}
