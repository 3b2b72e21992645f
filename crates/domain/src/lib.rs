//! # warema-bridge-domain
//!
//! Pure domain model for the Warema WMS to MQTT bridge.
//!
//! ## Responsibilities
//! - Foundational types: serial numbers, error conventions, timestamps
//! - Define **device types** (the WMS product codes and how each is exposed)
//! - Define bounded **position** and **tilt** values and the motion-state
//!   derivation published on `warema/<id>/state`
//! - Define **stick events** (what the radio driver reports) and decode them
//!   from the driver's wire messages
//! - Define **commands** (what Home Assistant asks for over MQTT)
//! - Build every MQTT **topic** the bridge reads or writes
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod event;
pub mod motion;
pub mod position;
pub mod topic;
