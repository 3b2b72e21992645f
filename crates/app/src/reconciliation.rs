//! Tear everything down and scan again.

use crate::ports::{ScanOptions, StickPort};
use crate::registry::DeviceRegistry;

/// Outcome of [`ReconciliationController::maybe_rescan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanOutcome {
    /// Every device was online; nothing happened.
    Skipped,
    /// The registry was cleared and a scan requested.
    Rescanned {
        /// Devices that were registered before the sweep.
        removed: usize,
    },
}

/// Recovers from systemic staleness with a full rescan.
///
/// The sweep is all-or-nothing: when any device is offline, every tracked
/// device is removed from the stick and the registry, healthy ones included,
/// and must come back through the next scan result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationController;

impl ReconciliationController {
    /// Scan options used for every rescan.
    pub const SCAN: ScanOptions = ScanOptions {
        auto_assign_blinds: false,
    };

    /// Create a controller.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rescan when at least one device is offline.
    pub fn maybe_rescan(
        &self,
        registry: &mut DeviceRegistry,
        stick: &impl StickPort,
    ) -> RescanOutcome {
        let offline = registry.offline_count();
        if offline == 0 {
            tracing::debug!("all devices are online, skipping re-scan");
            return RescanOutcome::Skipped;
        }

        tracing::info!(offline, "offline devices found, performing re-scan");

        for device in registry.devices() {
            tracing::debug!(snr = %device.snr, "clearing registration");
            if let Err(err) = stick.remove_device(&device.snr) {
                tracing::warn!(%err, snr = %device.snr, "failed to remove device from stick");
            }
        }

        let removed = registry.clear();

        if let Err(err) = stick.scan(Self::SCAN) {
            tracing::error!(%err, "failed to request re-scan");
        }

        RescanOutcome::Rescanned { removed }
    }
}
