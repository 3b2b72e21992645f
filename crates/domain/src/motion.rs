//! Motion state published on `warema/<id>/state`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Cover state as understood by Home Assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    Opening,
    Closing,
    Open,
    Closed,
    Stopped,
}

impl MotionState {
    /// Derive the state from a position report.
    ///
    /// While moving, the direction comes from comparing against the previous
    /// position. Without a usable previous value the end stops decide, and any
    /// intermediate position reports `Closing`.
    // NOTE: the intermediate `Closing` fallback is a tie-break kept for
    // compatibility with existing dashboards; revisit with real direction data.
    #[must_use]
    pub fn derive(position: Position, previous: Option<Position>, moving: bool) -> Self {
        if !moving {
            return match position {
                Position::OPEN => Self::Open,
                Position::CLOSED => Self::Closed,
                _ => Self::Stopped,
            };
        }

        match previous {
            Some(prev) if position > prev => Self::Closing,
            Some(prev) if position < prev => Self::Opening,
            _ if position == Position::OPEN => Self::Opening,
            _ => Self::Closing,
        }
    }

    /// Optimistic state after requesting `target` from `current`.
    ///
    /// Returns `None` when the blind is already there.
    #[must_use]
    pub fn towards(target: Position, current: Position) -> Option<Self> {
        match target.cmp(&current) {
            std::cmp::Ordering::Greater => Some(Self::Closing),
            std::cmp::Ordering::Less => Some(Self::Opening),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Payload text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
