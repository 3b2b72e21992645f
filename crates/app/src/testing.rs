//! In-memory port doubles for unit tests.

use std::sync::Mutex;

use warema_bridge_domain::error::BridgeError;
use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::position::{Position, Tilt};

use crate::ports::{MessagePublisher, PollIntervals, PositionRequest, ScanOptions, StickPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<Published>>,
}

impl RecordingPublisher {
    /// Drain everything published so far.
    pub fn take(&self) -> Vec<Published> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }

    /// Payloads published on `topic`, oldest first, without draining.
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.payload.clone())
            .collect()
    }

    /// Every message published on `topic`, without draining.
    pub fn on(&self, topic: &str) -> Vec<Published> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }
}

impl MessagePublisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BridgeError> {
        self.messages.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retain,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StickCall {
    Add(String),
    Remove(String),
    Scan(ScanOptions),
    SetPosition(String, u8, Option<i8>),
    Stop(String),
    GetPosition(String, PositionRequest),
    Wave(String),
    PollIntervals(PollIntervals),
    CommandConfirmation(bool),
}

#[derive(Default)]
pub struct RecordingStick {
    calls: Mutex<Vec<StickCall>>,
    failing: bool,
}

impl RecordingStick {
    /// A stick that records every call and then rejects it.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn take(&self) -> Vec<StickCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn record(&self, call: StickCall) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            return Err(BridgeError::Stick(Box::new(std::io::Error::other(
                "stick unplugged",
            ))));
        }
        Ok(())
    }
}

impl StickPort for RecordingStick {
    fn add_device(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        self.record(StickCall::Add(snr.to_string()))
    }

    fn remove_device(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        self.record(StickCall::Remove(snr.to_string()))
    }

    fn scan(&self, options: ScanOptions) -> Result<(), BridgeError> {
        self.record(StickCall::Scan(options))
    }

    fn set_position(
        &self,
        snr: &SerialNumber,
        position: Position,
        tilt: Option<Tilt>,
    ) -> Result<(), BridgeError> {
        self.record(StickCall::SetPosition(
            snr.to_string(),
            position.value(),
            tilt.map(Tilt::value),
        ))
    }

    fn stop(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        self.record(StickCall::Stop(snr.to_string()))
    }

    fn get_position(
        &self,
        snr: &SerialNumber,
        request: PositionRequest,
    ) -> Result<(), BridgeError> {
        self.record(StickCall::GetPosition(snr.to_string(), request))
    }

    fn probe_wave(&self, snr: &SerialNumber) -> Result<(), BridgeError> {
        self.record(StickCall::Wave(snr.to_string()))
    }

    fn set_poll_intervals(&self, intervals: PollIntervals) -> Result<(), BridgeError> {
        self.record(StickCall::PollIntervals(intervals))
    }

    fn enable_command_confirmation(&self, enabled: bool) -> Result<(), BridgeError> {
        self.record(StickCall::CommandConfirmation(enabled))
    }

    fn list(&self) -> Vec<SerialNumber> {
        Vec::new()
    }
}
