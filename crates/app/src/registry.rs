//! Per-device state, owned in one place.
//!
//! Holds the registered [`Device`]s and one [`AvailabilityRecord`] per serial
//! number. Availability records may exist for serial numbers that are not
//! registered: commands and acknowledgements for unknown devices still count
//! as liveness signals, exactly like for registered ones.

use std::collections::BTreeMap;

use warema_bridge_domain::device::DeviceType;
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::motion::MotionState;
use warema_bridge_domain::position::{Position, Tilt};
use warema_bridge_domain::time::{self, Timestamp};

/// A registered WMS device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub snr: SerialNumber,
    pub device_type: DeviceType,
    /// Unknown until the first position report.
    pub position: Option<Position>,
    /// Unknown until the first report carrying an angle.
    pub tilt: Option<Tilt>,
}

/// Liveness bookkeeping for one serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityRecord {
    pub online: bool,
    /// `None` until the first positive liveness signal.
    pub last_seen_at: Option<Timestamp>,
}

/// Registered devices and their availability.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<SerialNumber, Device>,
    availability: BTreeMap<SerialNumber, AvailabilityRecord>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a device and mark it online as of `now`.
    pub fn register(
        &mut self,
        snr: SerialNumber,
        device_type: DeviceType,
        now: Timestamp,
    ) -> &Device {
        self.availability.insert(
            snr.clone(),
            AvailabilityRecord {
                online: true,
                last_seen_at: Some(now),
            },
        );

        let device = Device {
            snr: snr.clone(),
            device_type,
            position: None,
            tilt: None,
        };
        self.devices.insert(snr.clone(), device);
        &self.devices[&snr]
    }

    /// Look up a registered device.
    #[must_use]
    pub fn get(&self, snr: &SerialNumber) -> Option<&Device> {
        self.devices.get(snr)
    }

    /// Whether `snr` is registered.
    #[must_use]
    pub fn contains(&self, snr: &SerialNumber) -> bool {
        self.devices.contains_key(snr)
    }

    /// Forget a device and its availability.
    pub fn remove(&mut self, snr: &SerialNumber) -> Option<Device> {
        self.availability.remove(snr);
        self.devices.remove(snr)
    }

    /// Forget every device and every availability record.
    ///
    /// Returns how many devices were registered.
    pub fn clear(&mut self) -> usize {
        let count = self.devices.len();
        self.devices.clear();
        self.availability.clear();
        count
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Registered devices, ordered by serial number.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Store a new position and derive the motion state to publish.
    ///
    /// Returns `None` when `snr` is not registered.
    pub fn update_position(
        &mut self,
        snr: &SerialNumber,
        position: Position,
        moving: bool,
    ) -> Option<MotionState> {
        let device = self.devices.get_mut(snr)?;
        let previous = device.position.replace(position);
        Some(MotionState::derive(position, previous, moving))
    }

    /// Store a new slat angle.
    ///
    /// Returns `false` when `snr` is not registered.
    pub fn update_tilt(&mut self, snr: &SerialNumber, tilt: Tilt) -> bool {
        match self.devices.get_mut(snr) {
            Some(device) => {
                device.tilt = Some(tilt);
                true
            }
            None => false,
        }
    }

    /// Availability of `snr`, registered or not.
    #[must_use]
    pub fn availability(&self, snr: &SerialNumber) -> Option<AvailabilityRecord> {
        self.availability.get(snr).copied()
    }

    /// Whether `snr` has a record that says offline.
    #[must_use]
    pub fn is_offline(&self, snr: &SerialNumber) -> bool {
        self.availability.get(snr).is_some_and(|record| !record.online)
    }

    /// Refresh `last_seen_at` and mark online.
    ///
    /// Returns `true` when the record was not online before (including when it
    /// did not exist).
    pub fn mark_online(&mut self, snr: &SerialNumber, now: Timestamp) -> bool {
        let record = self
            .availability
            .entry(snr.clone())
            .or_insert(AvailabilityRecord {
                online: false,
                last_seen_at: None,
            });
        let flipped = !record.online;
        record.online = true;
        record.last_seen_at = Some(now);
        flipped
    }

    /// Mark offline, keeping `last_seen_at`.
    ///
    /// Returns `true` when the record was not offline before (including when
    /// it did not exist).
    pub fn mark_offline(&mut self, snr: &SerialNumber) -> bool {
        match self.availability.get_mut(snr) {
            Some(record) if !record.online => false,
            Some(record) => {
                record.online = false;
                true
            }
            None => {
                self.availability.insert(
                    snr.clone(),
                    AvailabilityRecord {
                        online: false,
                        last_seen_at: None,
                    },
                );
                true
            }
        }
    }

    /// Serial numbers whose last contact is more than `timeout` before `now`,
    /// with how long ago that contact was.
    #[must_use]
    pub fn stale(
        &self,
        now: Timestamp,
        timeout: std::time::Duration,
    ) -> Vec<(SerialNumber, std::time::Duration)> {
        self.availability
            .iter()
            .filter_map(|(snr, record)| {
                let since = time::elapsed(record.last_seen_at?, now);
                (since > timeout).then(|| (snr.clone(), since))
            })
            .collect()
    }

    /// Number of availability records that say offline.
    #[must_use]
    pub fn offline_count(&self) -> usize {
        self.availability
            .values()
            .filter(|record| !record.online)
            .count()
    }

    /// Registered devices whose availability says offline.
    #[must_use]
    pub fn offline_devices(&self) -> Vec<SerialNumber> {
        self.devices
            .keys()
            .filter(|snr| self.is_offline(snr))
            .cloned()
            .collect()
    }
}
