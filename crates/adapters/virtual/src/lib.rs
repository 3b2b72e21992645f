//! # warema-bridge-adapter-virtual
//!
//! Virtual stick that simulates a WMS radio network for demos and
//! end-to-end tests.
//!
//! ## Behaviour
//!
//! | Request | Simulated answer |
//! |---------|------------------|
//! | `scan` | scan results listing every configured device |
//! | `set_position` | the blind moves instantly and reports its position |
//! | `get_position` | a position update |
//! | `stop`, `set_position`, `get_position` | a command result when confirmations are enabled |
//! | `set_poll_intervals` | starts periodic position updates and weather broadcasts |
//!
//! Devices flagged unresponsive never answer; their command results carry
//! an error, which is how the bridge's availability path gets exercised.
//!
//! ## Dependency rule
//!
//! Depends on `warema-bridge-app` (port traits) and `warema-bridge-domain`
//! only.

pub mod config;
pub mod error;
mod network;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use warema_bridge_app::ports::{PollIntervals, PositionRequest, ScanOptions, StickPort};
use warema_bridge_domain::error::BridgeError;
use warema_bridge_domain::event::{StickMessage, wire};
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::position::{Position, Tilt};

pub use config::{VirtualDeviceConfig, VirtualStickConfig};
pub use error::VirtualStickError;

use network::Network;

struct Shared {
    network: Mutex<Network>,
    tx: mpsc::UnboundedSender<StickMessage>,
}

impl Shared {
    fn network(&self) -> MutexGuard<'_, Network> {
        self.network.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, message: StickMessage) -> Result<(), VirtualStickError> {
        tracing::trace!(event = %message.topic, payload = %message.payload, "virtual stick event");
        self.tx
            .send(message)
            .map_err(|_| VirtualStickError::ReceiverDropped)
    }

    fn emit_all(&self, messages: impl IntoIterator<Item = StickMessage>) -> Result<(), VirtualStickError> {
        messages.into_iter().try_for_each(|message| self.emit(message))
    }

    /// Lock the network unless the stick was torn down.
    fn open(&self) -> Result<MutexGuard<'_, Network>, VirtualStickError> {
        let network = self.network();
        if network.closed {
            return Err(VirtualStickError::Closed);
        }
        Ok(network)
    }
}

/// Simulated stick implementing [`StickPort`].
pub struct VirtualStick {
    shared: Arc<Shared>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl VirtualStick {
    /// Create a stick for the configured network.
    ///
    /// Returns the stick and the receiver its events arrive on.
    #[must_use]
    pub fn new(config: &VirtualStickConfig) -> (Self, mpsc::UnboundedReceiver<StickMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stick = Self {
            shared: Arc::new(Shared {
                network: Mutex::new(Network::new(&config.devices)),
                tx,
            }),
            poller: Mutex::new(None),
        };
        (stick, rx)
    }

    /// Finish "opening the serial port": emits the init-completion event.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualStickError`] when the stick is closed or nobody
    /// listens to its events.
    pub fn init(&self) -> Result<(), VirtualStickError> {
        drop(self.shared.open()?);
        tracing::info!("virtual stick ready");
        self.shared
            .emit(StickMessage::new(wire::INIT_COMPLETION, json!({"status": "ready"})))
    }

    /// Make a simulated device stop (or resume) answering.
    ///
    /// Returns `false` when `snr` is not part of the network.
    pub fn set_unresponsive(&self, snr: &SerialNumber, unresponsive: bool) -> bool {
        self.shared.network().set_unresponsive(snr, unresponsive)
    }

    /// Current position and angle of a simulated device.
    #[must_use]
    pub fn position_of(&self, snr: &SerialNumber) -> Option<(u8, i8)> {
        self.shared.network().position_of(snr)
    }

    /// Stop polling and refuse further requests.
    pub fn teardown(&self) {
        self.shared.network().closed = true;
        if let Some(handle) = self.lock_poller().take() {
            handle.abort();
        }
        tracing::debug!("virtual stick closed");
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_polling(&self, intervals: PollIntervals) {
        let shared = Arc::clone(&self.shared);
        let period = intervals.position_update;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let messages = shared.network().poll();
                if shared.emit_all(messages).is_err() {
                    break;
                }
            }
        });

        if let Some(previous) = self.lock_poller().replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for VirtualStick {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_poller().take() {
            handle.abort();
        }
    }
}

impl StickPort for VirtualStick {
    fn add_device(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        self.shared.open()?.add(snr);
        Ok(())
    }

    fn remove_device(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        self.shared.open()?.remove(snr);
        Ok(())
    }

    fn scan(&self, options: ScanOptions) -> Result<(), BridgeError> {
        let message = self.shared.open()?.scan(options.auto_assign_blinds);
        Ok(self.shared.emit(message)?)
    }

    fn set_position(
        &self,
        snr: &SerialNumber,
        position: Position,
        tilt: Option<Tilt>,
    ) -> Result<(), BridgeError> {
        let messages = {
            let mut network = self.shared.open()?;
            let moved = network.move_blind(snr, position, tilt);
            let result = network.command_result(wire::CMD_RESULT_SET_POSITION, snr);
            moved.into_iter().chain(result).collect::<Vec<_>>()
        };
        Ok(self.shared.emit_all(messages)?)
    }

    fn stop(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        let result = self
            .shared
            .open()?
            .command_result(wire::CMD_RESULT_STOP, snr);
        Ok(self.shared.emit_all(result)?)
    }

    fn get_position(
        &self,
        snr: &SerialNumber,
        request: PositionRequest,
    ) -> Result<(), BridgeError> {
        let messages = {
            let network = self.shared.open()?;
            let report = network.report_position(snr);
            let result = request
                .cmd_confirmation
                .then(|| network.command_result(wire::CMD_RESULT_GET_POSITION, snr))
                .flatten();
            report.into_iter().chain(result).collect::<Vec<_>>()
        };
        Ok(self.shared.emit_all(messages)?)
    }

    fn probe_wave(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        drop(self.shared.open()?);
        tracing::debug!(%snr, "wave request");
        Ok(())
    }

    fn set_poll_intervals(&self, intervals: PollIntervals) -> Result<(), BridgeError> {
        drop(self.shared.open()?);
        tracing::debug!(
            position_update_ms = intervals.position_update.as_millis(),
            watch_moving_ms = intervals.watch_moving.as_millis(),
            "polling configured"
        );
        self.start_polling(intervals);
        Ok(())
    }

    fn enable_command_confirmation(&self, enabled: bool) -> Result<(), BridgeError> {
        self.shared.open()?.confirmation = enabled;
        Ok(())
    }

    fn list(&self) -> Vec<SerialNumber> {
        self.shared.network().added()
    }
}
