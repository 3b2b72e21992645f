//! # warema-bridge-app
//!
//! Application layer — the availability and reconciliation core, plus the
//! **port definitions** (traits) it drives.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `StickPort` — the WMS radio driver's capability set
//!   - `MessagePublisher` — outbound MQTT messages
//! - Own all per-device state in the `DeviceRegistry`
//! - Track liveness (`AvailabilityMonitor`) and recover from systemic
//!   failures (`ReconciliationController`)
//! - Dispatch stick events and inbound commands (`EventRouter`)
//! - Drive the periodic timers (`Supervisor`)
//!
//! ## Dependency rule
//! Depends on `warema-bridge-domain` only (plus `tokio` for the timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod availability;
pub mod config;
pub mod discovery;
pub mod ports;
pub mod reconciliation;
pub mod registry;
pub mod router;
pub mod supervisor;

pub(crate) mod outbound;

#[cfg(test)]
mod testing;
