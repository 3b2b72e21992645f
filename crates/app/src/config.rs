//! Bridge behaviour configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use warema_bridge_domain::device::DeviceType;
use warema_bridge_domain::error::ValidationError;
use warema_bridge_domain::id::SerialNumber;

use crate::ports::PollIntervals;
use crate::supervisor::Schedule;

/// Operator-supplied device that replaces scan results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ForcedDevice {
    pub snr: SerialNumber,
    /// Raw type code, [`DeviceType::DEFAULT`] when omitted.
    pub type_code: u16,
}

impl FromStr for ForcedDevice {
    type Err = ValidationError;

    /// Parse `snr` or `snr:type`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::ForcedDevice(s.to_string());
        let (snr, type_code) = match s.split_once(':') {
            Some((snr, code)) => (snr, code.trim().parse().map_err(|_| invalid())?),
            None => (s, DeviceType::DEFAULT.code()),
        };
        Ok(Self {
            snr: SerialNumber::new(snr).map_err(|_| invalid())?,
            type_code,
        })
    }
}

impl TryFrom<String> for ForcedDevice {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How the bridge registers devices and how often its timers fire.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Cover-class devices never registered.
    pub ignored_devices: Vec<SerialNumber>,
    /// When non-empty, registered instead of whatever a scan reports.
    pub forced_devices: Vec<ForcedDevice>,
    /// Stick position polling interval, in milliseconds.
    pub polling_interval_ms: u64,
    /// Stick polling interval for moving blinds, in milliseconds.
    pub moving_interval_ms: u64,
    /// Silence after which a device is offline, in milliseconds.
    pub availability_timeout_ms: u64,
    /// Interval between wake-up rounds, in milliseconds.
    pub wake_up_interval_ms: u64,
    /// Interval between periodic re-scans, in milliseconds.
    pub rescan_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ignored_devices: Vec::new(),
            forced_devices: Vec::new(),
            polling_interval_ms: 30_000,
            moving_interval_ms: 1_000,
            availability_timeout_ms: 300_000,
            wake_up_interval_ms: 60_000,
            rescan_interval_ms: 3_600_000,
        }
    }
}

impl BridgeConfig {
    /// Availability timeout as a [`Duration`].
    #[must_use]
    pub fn availability_timeout(&self) -> Duration {
        Duration::from_millis(self.availability_timeout_ms)
    }

    /// Polling cadence handed to the stick after init.
    #[must_use]
    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            position_update: Duration::from_millis(self.polling_interval_ms),
            watch_moving: Duration::from_millis(self.moving_interval_ms),
        }
    }

    /// Periods of the three supervisor timers.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        Schedule {
            availability_check: self.availability_timeout() / 2,
            wake_up: Duration::from_millis(self.wake_up_interval_ms),
            rescan: Duration::from_millis(self.rescan_interval_ms),
        }
    }

    /// Whether `snr` is on the ignore list.
    #[must_use]
    pub fn is_ignored(&self, snr: &SerialNumber) -> bool {
        self.ignored_devices.contains(snr)
    }

    /// Reject settings that would make a timer spin.
    ///
    /// # Errors
    ///
    /// Returns the name of the first interval that is zero or too short.
    pub fn validate(&self) -> Result<(), &'static str> {
        let checks = [
            ("polling_interval_ms", self.polling_interval_ms),
            ("moving_interval_ms", self.moving_interval_ms),
            ("wake_up_interval_ms", self.wake_up_interval_ms),
            ("rescan_interval_ms", self.rescan_interval_ms),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(name);
            }
        }
        // Halved for the evaluation timer, which must stay non-zero.
        if self.availability_timeout_ms < 2 {
            return Err("availability_timeout_ms");
        }
        Ok(())
    }
}
