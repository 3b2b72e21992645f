//! Bounded position and tilt values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Blind position as a percentage: `0` is fully open, `100` fully closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Position(u8);

impl Position {
    /// Fully open.
    pub const OPEN: Self = Self(0);
    /// Fully closed.
    pub const CLOSED: Self = Self(100);

    /// Build a position from any integer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PositionOutOfRange`] outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(ValidationError::PositionOutOfRange(value))
    }

    /// The percentage value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Position {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for i64 {
    fn from(value: Position) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Slat angle of a venetian blind, in `-100..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Tilt(i8);

impl Tilt {
    /// Lowest accepted angle.
    pub const MIN: i64 = -100;
    /// Highest accepted angle.
    pub const MAX: i64 = 100;

    /// Build a tilt from any integer.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TiltOutOfRange`] outside `-100..=100`.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::TiltOutOfRange(value));
        }
        i8::try_from(value)
            .map(Self)
            .map_err(|_| ValidationError::TiltOutOfRange(value))
    }

    /// The angle value.
    #[must_use]
    pub fn value(self) -> i8 {
        self.0
    }
}

impl TryFrom<i64> for Tilt {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tilt> for i64 {
    fn from(value: Tilt) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for Tilt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_bounds() {
        assert_eq!(Position::new(0).unwrap(), Position::OPEN);
        assert_eq!(Position::new(100).unwrap(), Position::CLOSED);
        assert_eq!(Tilt::new(-100).unwrap().value(), -100);
        assert_eq!(Tilt::new(100).unwrap().value(), 100);
    }

    #[test]
    fn should_reject_position_outside_percentage() {
        assert_eq!(
            Position::new(101),
            Err(ValidationError::PositionOutOfRange(101))
        );
        assert_eq!(
            Position::new(-1),
            Err(ValidationError::PositionOutOfRange(-1))
        );
    }

    #[test]
    fn should_reject_tilt_outside_range() {
        assert_eq!(Tilt::new(-101), Err(ValidationError::TiltOutOfRange(-101)));
        assert_eq!(Tilt::new(500), Err(ValidationError::TiltOutOfRange(500)));
    }

    #[test]
    fn should_display_plain_integer() {
        assert_eq!(Position::new(42).unwrap().to_string(), "42");
        assert_eq!(Tilt::new(-75).unwrap().to_string(), "-75");
    }

    #[test]
    fn should_reject_out_of_range_when_deserializing() {
        assert!(serde_json::from_str::<Position>("150").is_err());
        assert_eq!(serde_json::from_str::<Position>("50").unwrap().value(), 50);
    }
}
