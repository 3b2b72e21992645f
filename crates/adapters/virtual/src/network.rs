//! The simulated radio network and the driver messages it produces.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use warema_bridge_domain::device::{DeviceClass, DeviceType};
use warema_bridge_domain::event::{StickMessage, wire};
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::position::{Position, Tilt};

use crate::config::VirtualDeviceConfig;

/// Why a simulated device did not answer.
pub(crate) const NO_RESPONSE: &str = "no response from device";

#[derive(Debug, Clone)]
struct SimulatedDevice {
    type_code: u16,
    position: u8,
    angle: i8,
    unresponsive: bool,
}

impl SimulatedDevice {
    fn class(&self) -> Option<DeviceClass> {
        DeviceType::from_code(self.type_code)
            .ok()
            .map(DeviceType::class)
    }
}

/// Driver-side state: the devices in radio range and those added to the
/// stick.
#[derive(Debug, Default)]
pub(crate) struct Network {
    devices: BTreeMap<SerialNumber, SimulatedDevice>,
    added: BTreeSet<SerialNumber>,
    pub(crate) confirmation: bool,
    pub(crate) closed: bool,
}

impl Network {
    pub(crate) fn new(devices: &[VirtualDeviceConfig]) -> Self {
        let devices = devices
            .iter()
            .map(|device| {
                let simulated = SimulatedDevice {
                    type_code: device.device_type,
                    position: device.position.min(Position::CLOSED.value()),
                    angle: device.angle,
                    unresponsive: device.unresponsive,
                };
                (device.snr.clone(), simulated)
            })
            .collect();
        Self {
            devices,
            ..Self::default()
        }
    }

    pub(crate) fn add(&mut self, snr: &SerialNumber) {
        self.added.insert(snr.clone());
    }

    pub(crate) fn remove(&mut self, snr: &SerialNumber) {
        self.added.remove(snr);
    }

    pub(crate) fn added(&self) -> Vec<SerialNumber> {
        self.added.iter().cloned().collect()
    }

    /// Returns `false` for serial numbers outside the network.
    pub(crate) fn set_unresponsive(&mut self, snr: &SerialNumber, unresponsive: bool) -> bool {
        match self.devices.get_mut(snr) {
            Some(device) => {
                device.unresponsive = unresponsive;
                true
            }
            None => false,
        }
    }

    pub(crate) fn position_of(&self, snr: &SerialNumber) -> Option<(u8, i8)> {
        self.devices
            .get(snr)
            .map(|device| (device.position, device.angle))
    }

    fn responsive(&self, snr: &SerialNumber) -> Option<&SimulatedDevice> {
        self.devices.get(snr).filter(|device| !device.unresponsive)
    }

    /// Every device in range, blinds added to the stick when `auto_assign`.
    pub(crate) fn scan(&mut self, auto_assign: bool) -> StickMessage {
        let devices: Vec<_> = self
            .devices
            .iter()
            .map(|(snr, device)| {
                let type_str = DeviceType::from_code(device.type_code)
                    .map_or("Unknown", DeviceType::model);
                json!({"snr": snr, "type": device.type_code, "typeStr": type_str})
            })
            .collect();

        if auto_assign {
            let blinds: Vec<_> = self
                .devices
                .iter()
                .filter(|(_, device)| device.class() == Some(DeviceClass::Cover))
                .map(|(snr, _)| snr.clone())
                .collect();
            self.added.extend(blinds);
        }

        StickMessage::new(wire::SCANNED_DEVICES, json!({ "devices": devices }))
    }

    /// Move a blind. The simulated motor arrives instantly.
    pub(crate) fn move_blind(
        &mut self,
        snr: &SerialNumber,
        position: Position,
        tilt: Option<Tilt>,
    ) -> Option<StickMessage> {
        let device = self
            .devices
            .get_mut(snr)
            .filter(|device| !device.unresponsive)?;
        device.position = position.value();
        if let Some(tilt) = tilt {
            device.angle = tilt.value();
        }
        Some(position_update(snr, device))
    }

    pub(crate) fn report_position(&self, snr: &SerialNumber) -> Option<StickMessage> {
        self.responsive(snr)
            .map(|device| position_update(snr, device))
    }

    /// Command result for `snr`, or `None` when confirmations are off.
    pub(crate) fn command_result(&self, topic: &str, snr: &SerialNumber) -> Option<StickMessage> {
        if !self.confirmation {
            return None;
        }
        let payload = if self.responsive(snr).is_some() {
            json!({"snr": snr})
        } else {
            json!({"snr": snr, "error": NO_RESPONSE})
        };
        Some(StickMessage::new(topic, payload))
    }

    /// One polling round: position updates for added blinds and weather
    /// broadcasts from every weather station in range.
    pub(crate) fn poll(&self) -> Vec<StickMessage> {
        let positions = self
            .added
            .iter()
            .filter_map(|snr| self.report_position(snr));

        let weather = self
            .devices
            .iter()
            .filter(|(_, device)| {
                !device.unresponsive && device.class() == Some(DeviceClass::WeatherStation)
            })
            .map(|(snr, _)| {
                StickMessage::new(
                    wire::WEATHER_BROADCAST,
                    json!({"weather": {
                        "snr": snr,
                        "lumen": 12_000,
                        "temp": 18.5,
                        "wind": 2.5,
                        "rain": false,
                    }}),
                )
            });

        positions.chain(weather).collect()
    }
}

fn position_update(snr: &SerialNumber, device: &SimulatedDevice) -> StickMessage {
    StickMessage::new(
        wire::POSITION_UPDATE,
        json!({
            "snr": snr,
            "position": device.position,
            "angle": device.angle,
            "moving": false,
        }),
    )
}
