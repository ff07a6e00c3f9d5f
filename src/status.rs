// Court status data model: the four status values, the mode axis, and weather inputs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Current state of the courts. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtStatus {
    Open,
    Closed,
    /// Emergency variant, only ever set by an authorized caller.
    CriticallyOpen,
    /// Emergency variant, only ever set by an authorized caller.
    CriticallyClosed,
}

impl CourtStatus {
    pub const ALL: [CourtStatus; 4] = [
        CourtStatus::Open,
        CourtStatus::Closed,
        CourtStatus::CriticallyOpen,
        CourtStatus::CriticallyClosed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourtStatus::Open => "open",
            CourtStatus::Closed => "closed",
            CourtStatus::CriticallyOpen => "critically_open",
            CourtStatus::CriticallyClosed => "critically_closed",
        }
    }

    /// Upper-case label used in bot replies, e.g. `CRITICALLY CLOSED`.
    pub fn label(&self) -> String {
        self.as_str().to_uppercase().replace('_', " ")
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CourtStatus::Open => "🟢",
            CourtStatus::Closed => "🔴",
            CourtStatus::CriticallyOpen => "🟡",
            CourtStatus::CriticallyClosed => "⛔",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            CourtStatus::CriticallyOpen | CourtStatus::CriticallyClosed
        )
    }
}

impl std::fmt::Display for CourtStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a court status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown court status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for CourtStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        CourtStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Whether the status is recomputed from time and weather, or held by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    Automatic,
    Manual,
}

/// Weather inputs to the automatic decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Chance of precipitation in percent, 0-100.
    pub precipitation_probability: u8,
    pub temperature_f: i32,
}

impl WeatherSnapshot {
    pub fn new(precipitation_probability: u8, temperature_f: i32) -> Self {
        Self {
            precipitation_probability,
            temperature_f,
        }
    }
}

/// A weather snapshot plus the human-readable conditions shown to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub conditions: String,
}
