use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a participant. The ordering is meaningful: a participant only
/// ever moves forward, from `Pending` to `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    #[default]
    Pending,
    Active,
}

impl ParticipantStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ParticipantStatus::Active)
    }

    /// Returns the status after attempting to move to `next`. Backward moves are ignored.
    pub fn advance(self, next: ParticipantStatus) -> Self {
        self.max(next)
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantStatus::Pending => f.write_str("PENDING"),
            ParticipantStatus::Active => f.write_str("ACTIVE"),
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ParticipantStatus::Pending),
            "ACTIVE" => Ok(ParticipantStatus::Active),
            other => Err(CoreError::InvalidInput("status".to_string(), other.to_string())),
        }
    }
}
