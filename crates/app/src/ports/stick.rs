//! The capability set of the WMS radio driver.
//!
//! The driver owns framing, encryption and the radio link. The bridge only
//! needs the primitives below; their results arrive asynchronously as
//! [`StickMessage`](warema_bridge_domain::event::StickMessage)s.

use std::time::Duration;

use warema_bridge_domain::error::BridgeError;
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::position::{Position, Tilt};

/// Options for a network scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Let the driver add every found blind on its own. The bridge always
    /// turns this off and registers devices itself.
    pub auto_assign_blinds: bool,
}

/// Options for a position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    /// Ask the driver to emit a command result for this request.
    pub cmd_confirmation: bool,
    /// Emit a position update even when the position did not change.
    pub callback_on_unchanged_position: bool,
}

/// Polling cadence of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// How often every added blind is asked for its position.
    pub position_update: Duration,
    /// How often a blind known to be moving is polled.
    pub watch_moving: Duration,
}

/// Capability set of the stick driver.
pub trait StickPort {
    /// Start tracking a device.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn add_device(&self, snr: &SerialNumber) -> Result<(), BridgeError>;

    /// Stop tracking a device.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn remove_device(&self, snr: &SerialNumber) -> Result<(), BridgeError>;

    /// Scan the network; results arrive as a scan-results event.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn scan(&self, options: ScanOptions) -> Result<(), BridgeError>;

    /// Move a blind, optionally setting the slat angle.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn set_position(
        &self,
        snr: &SerialNumber,
        position: Position,
        tilt: Option<Tilt>,
    ) -> Result<(), BridgeError>;

    /// Stop a moving blind.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn stop(&self, snr: &SerialNumber) -> Result<(), BridgeError>;

    /// Ask a blind for its position without moving it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn get_position(&self, snr: &SerialNumber, request: PositionRequest)
    -> Result<(), BridgeError>;

    /// Send a wave request, which wakes a sleeping device without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn probe_wave(&self, snr: &SerialNumber) -> Result<(), BridgeError>;

    /// Configure the driver's polling cadence.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn set_poll_intervals(&self, intervals: PollIntervals) -> Result<(), BridgeError>;

    /// Toggle command-result events.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stick`] when the driver refuses the request.
    fn enable_command_confirmation(&self, enabled: bool) -> Result<(), BridgeError>;

    /// Devices currently added on the driver side.
    fn list(&self) -> Vec<SerialNumber>;
}

impl<T: StickPort> StickPort for std::sync::Arc<T> {
    fn add_device(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        (**self).add_device(snr)
    }

    fn remove_device(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        (**self).remove_device(snr)
    }

    fn scan(&self, options: ScanOptions) -> Result<(), BridgeError> {
        (**self).scan(options)
    }

    fn set_position(
        &self,
        snr: &SerialNumber,
        position: Position,
        tilt: Option<Tilt>,
    ) -> Result<(), BridgeError> {
        (**self).set_position(snr, position, tilt)
    }

    fn stop(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        (**self).stop(snr)
    }

    fn get_position(
        &self,
        snr: &SerialNumber,
        request: PositionRequest,
    ) -> Result<(), BridgeError> {
        (**self).get_position(snr, request)
    }

    fn probe_wave(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        (**self).probe_wave(snr)
    }

    fn set_poll_intervals(&self, intervals: PollIntervals) -> Result<(), BridgeError> {
        (**self).set_poll_intervals(intervals)
    }

    fn enable_command_confirmation(&self, enabled: bool) -> Result<(), BridgeError> {
        (**self).enable_command_confirmation(enabled)
    }

    fn list(&self) -> Vec<SerialNumber> {
        (**self).list()
    }
}
