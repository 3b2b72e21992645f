//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! at port boundaries.

/// Top-level error for the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A value violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A stick event could not be decoded.
    #[error("malformed stick event")]
    Payload(#[from] PayloadError),

    /// An MQTT message could not be turned into a command.
    #[error("invalid command")]
    Command(#[from] CommandError),

    /// The stick driver rejected or failed a request.
    #[error("stick error")]
    Stick(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The messaging transport failed to accept a message.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Serial numbers must contain at least one non-blank character.
    #[error("serial number must not be empty")]
    EmptySerialNumber,

    /// Positions are percentages in `0..=100`.
    #[error("position {0} is outside 0..=100")]
    PositionOutOfRange(i64),

    /// Tilt angles are in `-100..=100`.
    #[error("tilt {0} is outside -100..=100")]
    TiltOutOfRange(i64),

    /// A forced device entry (`snr[:type]`) could not be parsed.
    #[error("invalid forced device entry {0:?}")]
    ForcedDevice(String),
}

/// Reasons a stick event payload is rejected.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The driver reported an event topic the bridge does not know.
    #[error("unknown stick event {0:?}")]
    UnknownEvent(String),

    /// A required field is absent.
    #[error("missing field {0:?}")]
    MissingField(&'static str),

    /// A field is present but has the wrong shape.
    #[error("invalid field {field:?}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },

    /// A field decoded but violates a domain invariant.
    #[error("field {field:?} out of range")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// The violated invariant.
        #[source]
        source: ValidationError,
    },
}

/// Reasons an inbound MQTT message is not a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The topic does not match any subscription of the bridge.
    #[error("unrecognised topic {0:?}")]
    UnknownTopic(String),

    /// The `set` payload is not one of the supported actions.
    #[error("unrecognised action {0:?}")]
    UnknownAction(String),

    /// A numeric payload did not parse.
    #[error("payload {0:?} is not an integer")]
    NotANumber(String),

    /// A numeric payload parsed but is out of range.
    #[error("payload out of range")]
    OutOfRange(#[source] ValidationError),
}
