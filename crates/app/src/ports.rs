//! Port definitions — traits that adapters implement.
//!
//! The core talks to the radio stick and to the broker only through these
//! traits. Adapters depend on `app` to implement them; `app` never depends
//! on an adapter.
//!
//! Every port call is fire-and-forget: it only hands a request to the
//! collaborator. Outcomes come back later as stick events.

pub mod publisher;
pub mod stick;

pub use publisher::MessagePublisher;
pub use stick::{PollIntervals, PositionRequest, ScanOptions, StickPort};
