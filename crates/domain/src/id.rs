//! Device identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Serial number of a WMS device, the stable identity used in every topic.
///
/// The stick reports serial numbers as integers or strings depending on the
/// event; both are normalised to their decimal text form here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Build a serial number from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySerialNumber`] when `value` is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySerialNumber);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Borrow the text form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SerialNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SerialNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SerialNumber> for String {
    fn from(value: SerialNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for SerialNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_blank_serial_number() {
        assert_eq!(
            SerialNumber::new("   "),
            Err(ValidationError::EmptySerialNumber)
        );
    }

    #[test]
    fn should_trim_surrounding_whitespace() {
        let snr = SerialNumber::new(" 123456 ").unwrap();
        assert_eq!(snr.as_str(), "123456");
    }

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let snr = SerialNumber::new("2040815").unwrap();
        let parsed: SerialNumber = snr.to_string().parse().unwrap();
        assert_eq!(snr, parsed);
    }

    #[test]
    fn should_serialize_as_plain_string() {
        let snr = SerialNumber::new("123").unwrap();
        assert_eq!(serde_json::to_string(&snr).unwrap(), "\"123\"");
        let parsed: SerialNumber = serde_json::from_str("\"123\"").unwrap();
        assert_eq!(parsed, snr);
    }

    #[test]
    fn should_reject_empty_string_when_deserializing() {
        let result = serde_json::from_str::<SerialNumber>("\"\"");
        assert!(result.is_err());
    }
}
