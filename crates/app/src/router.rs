//! Event router: the one place stick events and MQTT commands are handled.
//!
//! Owns the registry and wires it to the monitor, the controller, the stick
//! and the publisher. Every handler takes the current time explicitly.

use warema_bridge_domain::command::{Command, InboundMessage, SetAction};
use warema_bridge_domain::device::{DeviceClass, DeviceType};
use warema_bridge_domain::event::{
    PositionReport, ProtocolEvent, ScanReport, StickMessage, WeatherReport,
};
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::motion::MotionState;
use warema_bridge_domain::position::{Position, Tilt};
use warema_bridge_domain::time::Timestamp;
use warema_bridge_domain::topic::{self, WeatherChannel};

use crate::availability::{AvailabilityMonitor, Evaluation};
use crate::config::BridgeConfig;
use crate::discovery;
use crate::outbound;
use crate::ports::{MessagePublisher, StickPort};
use crate::reconciliation::{ReconciliationController, RescanOutcome};
use crate::registry::DeviceRegistry;

/// What the caller should do after a stick message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing further.
    Handled,
    /// The stick finished initialising; the periodic timers should start.
    Initialized,
    /// The message could not be decoded and was dropped.
    Rejected,
}

/// Dispatches stick events and inbound commands.
pub struct EventRouter<S, P> {
    config: BridgeConfig,
    registry: DeviceRegistry,
    monitor: AvailabilityMonitor,
    controller: ReconciliationController,
    stick: S,
    publisher: P,
}

impl<S: StickPort, P: MessagePublisher> EventRouter<S, P> {
    /// Create a router with an empty registry.
    pub fn new(config: BridgeConfig, stick: S, publisher: P) -> Self {
        let monitor = AvailabilityMonitor::new(config.availability_timeout());
        Self {
            config,
            registry: DeviceRegistry::new(),
            monitor,
            controller: ReconciliationController::new(),
            stick,
            publisher,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn stick(&self) -> &S {
        &self.stick
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Decode and dispatch one stick message, then refresh the bridge
    /// heartbeat.
    #[tracing::instrument(skip_all, fields(event = %message.topic))]
    pub fn handle_stick_message(&mut self, message: &StickMessage, now: Timestamp) -> Dispatch {
        let dispatch = match ProtocolEvent::decode(message) {
            Ok(event) => self.dispatch(event, now),
            Err(err) => {
                tracing::warn!(%err, payload = %message.payload, "dropping stick message");
                Dispatch::Rejected
            }
        };
        outbound::emit(&self.publisher, topic::BRIDGE_STATE, topic::ONLINE, true);
        dispatch
    }

    /// Handle one decoded stick event.
    pub fn dispatch(&mut self, event: ProtocolEvent, now: Timestamp) -> Dispatch {
        match event {
            ProtocolEvent::InitCompleted => {
                self.on_init_completed();
                return Dispatch::Initialized;
            }
            ProtocolEvent::ScanResults(report) => self.on_scan_results(report, now),
            ProtocolEvent::WeatherBroadcast(report) => self.on_weather_broadcast(&report, now),
            ProtocolEvent::PositionUpdate { snr, report } => {
                self.on_position_update(&snr, report, now);
            }
            ProtocolEvent::CommandResult { kind, snr, error } => match error {
                Some(error) => {
                    tracing::warn!(%snr, command = kind.as_str(), %error, "command failed");
                    self.monitor
                        .record_failure(&mut self.registry, &self.publisher, &snr);
                }
                None => {
                    tracing::trace!(%snr, command = kind.as_str(), "command confirmed");
                    self.monitor
                        .record_liveness(&mut self.registry, &self.publisher, &snr, now);
                }
            },
        }
        Dispatch::Handled
    }

    /// Parse and handle one message received from the broker.
    #[tracing::instrument(skip_all, fields(topic = topic_name))]
    pub fn handle_mqtt_message(&mut self, topic_name: &str, payload: &str, now: Timestamp) {
        match InboundMessage::parse(topic_name, payload) {
            Ok(message) => self.handle_inbound(message, now),
            Err(err) => tracing::info!(%err, payload, "ignoring message"),
        }
    }

    /// Handle a parsed inbound message.
    pub fn handle_inbound(&mut self, message: InboundMessage, now: Timestamp) {
        match message {
            InboundMessage::HomeAssistantStatus { online: true } => {
                tracing::info!("home assistant is online, announcing devices");
                self.announce_all();
            }
            InboundMessage::HomeAssistantStatus { online: false } => {
                tracing::info!("home assistant went offline");
            }
            InboundMessage::Device { snr, command } => self.on_command(&snr, command, now),
        }
    }

    /// Availability timer fired.
    pub fn on_availability_tick(&mut self, now: Timestamp) -> Evaluation {
        let evaluation = self
            .monitor
            .evaluate(&mut self.registry, &self.publisher, now);
        if evaluation.systemic_failure_suspected() {
            tracing::warn!("forcing re-scan");
            self.controller.maybe_rescan(&mut self.registry, &self.stick);
        }
        evaluation
    }

    /// Wake-up timer fired. Returns the probed devices.
    pub fn on_wake_up_tick(&mut self) -> Vec<SerialNumber> {
        self.monitor.wake_up(&self.registry, &self.stick)
    }

    /// Follow-up to a wake-up round.
    pub fn on_position_probe(&mut self, probed: &[SerialNumber]) {
        self.monitor
            .probe_positions(&self.registry, &self.stick, probed);
    }

    /// Rescan timer fired.
    pub fn on_rescan_tick(&mut self) -> RescanOutcome {
        tracing::info!("performing periodic re-scan");
        self.controller.maybe_rescan(&mut self.registry, &self.stick)
    }

    fn on_init_completed(&mut self) {
        tracing::info!("stick initialised");

        if let Err(err) = self.stick.set_poll_intervals(self.config.poll_intervals()) {
            tracing::error!(%err, "failed to set polling intervals");
        }
        if let Err(err) = self.stick.enable_command_confirmation(true) {
            tracing::error!(%err, "failed to enable command confirmation");
        }

        tracing::info!("scanning");
        if let Err(err) = self.stick.scan(ReconciliationController::SCAN) {
            tracing::error!(%err, "failed to request scan");
        }
    }

    fn on_scan_results(&mut self, report: ScanReport, now: Timestamp) {
        tracing::info!(count = report.devices.len(), "scan finished");

        let devices: Vec<(SerialNumber, u16)> = if self.config.forced_devices.is_empty() {
            for reason in &report.rejected {
                tracing::info!(%reason, "skipping unreadable scan entry");
            }
            report
                .devices
                .into_iter()
                .map(|device| (device.snr, device.type_code))
                .collect()
        } else {
            tracing::info!(
                count = self.config.forced_devices.len(),
                "using forced device list instead of scan results"
            );
            self.config
                .forced_devices
                .iter()
                .map(|forced| (forced.snr.clone(), forced.type_code))
                .collect()
        };

        for (snr, type_code) in devices {
            match DeviceType::from_code(type_code) {
                Ok(device_type) => self.register(snr, device_type, now),
                Err(err) => tracing::info!(%snr, %err, "skipping device"),
            }
        }

        let listed = self.stick.list();
        tracing::info!(devices = ?listed, "registered devices on stick");
    }

    fn on_weather_broadcast(&mut self, report: &WeatherReport, now: Timestamp) {
        let snr = &report.snr;
        tracing::trace!(%snr, lumen = report.lumen, temp = report.temp, wind = report.wind, rain = report.rain, "weather broadcast");

        if !self.registry.contains(snr) {
            self.register(snr.clone(), DeviceType::WeatherStationEco, now);
        }

        let readings = [
            (WeatherChannel::Illuminance, report.lumen.to_string()),
            (WeatherChannel::Temperature, report.temp.to_string()),
            (WeatherChannel::Wind, report.wind.to_string()),
            (
                WeatherChannel::Rain,
                if report.rain { "ON" } else { "OFF" }.to_string(),
            ),
        ];
        for (channel, value) in readings {
            outbound::emit(&self.publisher, &topic::weather(snr, channel), &value, true);
        }
    }

    fn on_position_update(&mut self, snr: &SerialNumber, report: PositionReport, now: Timestamp) {
        tracing::debug!(%snr, ?report, "position update");

        if !self.registry.contains(snr) {
            tracing::info!(%snr, "auto-registering unknown device from position update");
            self.register(snr.clone(), DeviceType::DEFAULT, now);
        }
        if !self.registry.contains(snr) {
            tracing::error!(%snr, "device not registered, dropping position update");
            return;
        }

        self.monitor
            .record_liveness(&mut self.registry, &self.publisher, snr, now);

        if let Some(position) = report.position
            && let Some(state) = self
                .registry
                .update_position(snr, position, report.moving)
        {
            let value = position.value().to_string();
            outbound::emit(&self.publisher, &topic::position(snr), &value, true);
            outbound::emit(&self.publisher, &topic::state(snr), state.as_str(), true);
        }

        if let Some(tilt) = report.tilt
            && self.registry.update_tilt(snr, tilt)
        {
            let value = tilt.value().to_string();
            outbound::emit(&self.publisher, &topic::tilt(snr), &value, true);
        }
    }

    fn on_command(&mut self, snr: &SerialNumber, command: Command, now: Timestamp) {
        let device = self.registry.get(snr);
        let position = device.and_then(|d| d.position).unwrap_or_default();
        let tilt = device.and_then(|d| d.tilt).unwrap_or_default();

        match command {
            Command::Set(SetAction::Close) => {
                tracing::debug!(%snr, "closing");
                self.set_position(snr, Position::CLOSED, None);
                outbound::emit(&self.publisher, &topic::state(snr), MotionState::Closing.as_str(), false);
            }
            Command::Set(SetAction::Open) => {
                tracing::debug!(%snr, "opening");
                self.set_position(snr, Position::OPEN, None);
                outbound::emit(&self.publisher, &topic::state(snr), MotionState::Opening.as_str(), false);
            }
            Command::Set(SetAction::Stop) => {
                tracing::debug!(%snr, "stopping");
                if let Err(err) = self.stick.stop(snr) {
                    tracing::error!(%err, %snr, "failed to stop");
                }
            }
            Command::Set(action @ (SetAction::On | SetAction::Off)) => {
                tracing::info!(%snr, ?action, "switching is not supported by the stick");
                return;
            }
            Command::SetPosition(target) => {
                tracing::debug!(%snr, target = target.value(), tilt = tilt.value(), "setting position");
                self.set_position(snr, target, Some(tilt));
                if let Some(state) = MotionState::towards(target, position) {
                    outbound::emit(&self.publisher, &topic::state(snr), state.as_str(), true);
                }
            }
            Command::SetTilt(angle) => {
                tracing::debug!(%snr, angle = angle.value(), position = position.value(), "setting tilt");
                self.set_position(snr, position, Some(angle));
            }
        }

        self.monitor
            .record_liveness(&mut self.registry, &self.publisher, snr, now);
    }

    fn set_position(&self, snr: &SerialNumber, position: Position, tilt: Option<Tilt>) {
        if let Err(err) = self.stick.set_position(snr, position, tilt) {
            tracing::error!(%err, %snr, "failed to set position");
        }
    }

    fn register(&mut self, snr: SerialNumber, device_type: DeviceType, now: Timestamp) {
        match device_type.class() {
            DeviceClass::Ignored => {
                tracing::debug!(%snr, model = device_type.model(), "not bridging device");
            }
            DeviceClass::WeatherStation => {
                tracing::info!(%snr, model = device_type.model(), "registering weather station");
                self.announce(&snr, device_type);
                self.registry.register(snr.clone(), device_type, now);
                outbound::availability(&self.publisher, &snr, true);
            }
            DeviceClass::Cover if self.config.is_ignored(&snr) => {
                tracing::info!(%snr, model = device_type.model(), "ignoring device");
            }
            DeviceClass::Cover => {
                tracing::info!(%snr, model = device_type.model(), "adding device");
                if let Err(err) = self.stick.add_device(&snr) {
                    tracing::error!(%err, %snr, "failed to add device to stick");
                }
                self.registry.register(snr.clone(), device_type, now);
                outbound::availability(&self.publisher, &snr, true);
                self.announce(&snr, device_type);
            }
        }
    }

    fn announce(&self, snr: &SerialNumber, device_type: DeviceType) {
        for message in discovery::messages(snr, device_type) {
            outbound::emit(&self.publisher, &message.topic, &message.payload.to_string(), true);
        }
    }

    fn announce_all(&self) {
        for device in self.registry.devices() {
            self.announce(&device.snr, device.device_type);
            let online = self
                .registry
                .availability(&device.snr)
                .is_none_or(|record| record.online);
            outbound::availability(&self.publisher, &device.snr, online);
        }
    }
}
