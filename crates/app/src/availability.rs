//! Availability monitor — liveness signals, offline detection and wake-up
//! probing.
//!
//! The monitor keeps no per-device state; everything lives in the
//! [`DeviceRegistry`]. Availability publishes are edge-triggered: a message
//! goes out only when a record actually flips.

use std::time::Duration;

use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::time::Timestamp;

use crate::outbound;
use crate::ports::{MessagePublisher, PositionRequest, StickPort};
use crate::registry::DeviceRegistry;

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Records that flipped to offline during this pass.
    pub went_offline: Vec<SerialNumber>,
    /// Records silent for more than twice the timeout.
    pub long_offline: Vec<SerialNumber>,
}

impl Evaluation {
    /// Whether reconciliation should run now.
    #[must_use]
    pub fn systemic_failure_suspected(&self) -> bool {
        !self.long_offline.is_empty()
    }
}

/// Tracks device liveness against a fixed timeout.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityMonitor {
    timeout: Duration,
}

impl AvailabilityMonitor {
    /// Position request sent after a wave probe: no confirmation, so a silent
    /// device does not also produce a failed command result.
    const FOLLOW_UP_REQUEST: PositionRequest = PositionRequest {
        cmd_confirmation: false,
        callback_on_unchanged_position: false,
    };

    /// Create a monitor that declares a device offline after `timeout` of
    /// silence.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The availability timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How often [`evaluate`](Self::evaluate) should run.
    #[must_use]
    pub fn evaluation_period(&self) -> Duration {
        self.timeout / 2
    }

    /// A positive liveness signal for `snr`.
    ///
    /// Returns `true` (and publishes `online`) when the device was not
    /// online before.
    pub fn record_liveness(
        &self,
        registry: &mut DeviceRegistry,
        publisher: &impl MessagePublisher,
        snr: &SerialNumber,
        now: Timestamp,
    ) -> bool {
        let flipped = registry.mark_online(snr, now);
        if flipped {
            tracing::info!(%snr, "device is now online");
            outbound::availability(publisher, snr, true);
        }
        flipped
    }

    /// The stick reported a failed command for `snr`.
    ///
    /// Returns `true` (and publishes `offline`) when the device was not
    /// offline before.
    pub fn record_failure(
        &self,
        registry: &mut DeviceRegistry,
        publisher: &impl MessagePublisher,
        snr: &SerialNumber,
    ) -> bool {
        let flipped = registry.mark_offline(snr);
        if flipped {
            tracing::warn!(%snr, "device is now offline");
            outbound::availability(publisher, snr, false);
        }
        flipped
    }

    /// Mark every record silent for longer than the timeout as offline.
    pub fn evaluate(
        &self,
        registry: &mut DeviceRegistry,
        publisher: &impl MessagePublisher,
        now: Timestamp,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for (snr, silent_for) in registry.stale(now, self.timeout) {
            if self.record_failure(registry, publisher, &snr) {
                evaluation.went_offline.push(snr.clone());
            }
            if silent_for > self.timeout * 2 {
                tracing::debug!(%snr, silent_secs = silent_for.as_secs(), "device offline for an extended period");
                evaluation.long_offline.push(snr);
            }
        }

        if evaluation.systemic_failure_suspected() {
            tracing::warn!(
                count = evaluation.long_offline.len(),
                "some devices have been offline for an extended period"
            );
        }

        evaluation
    }

    /// Send a wave probe to every registered device that is offline.
    ///
    /// Probe failures are logged and skipped. Returns the probed devices so a
    /// follow-up position request can be scheduled.
    pub fn wake_up(
        &self,
        registry: &DeviceRegistry,
        stick: &impl StickPort,
    ) -> Vec<SerialNumber> {
        let offline = registry.offline_devices();

        for snr in &offline {
            tracing::debug!(%snr, "attempting to wake up device");
            if let Err(err) = stick.probe_wave(snr) {
                tracing::error!(%err, %snr, "failed to wake up device");
            }
        }

        if !offline.is_empty() && offline.len() * 2 >= registry.len() {
            tracing::warn!(
                offline = offline.len(),
                total = registry.len(),
                "at least half of the devices are offline"
            );
        }

        offline
    }

    /// Ask each of `probed` that is still offline for its position.
    pub fn probe_positions(
        &self,
        registry: &DeviceRegistry,
        stick: &impl StickPort,
        probed: &[SerialNumber],
    ) {
        for snr in probed.iter().filter(|snr| registry.is_offline(snr)) {
            tracing::debug!(%snr, "requesting position of sleeping device");
            if let Err(err) = stick.get_position(snr, Self::FOLLOW_UP_REQUEST) {
                tracing::error!(%err, %snr, "failed to request position");
            }
        }
    }
}
