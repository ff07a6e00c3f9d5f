// Operating hours: the daily window in which the courts may open automatically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error returned when an hours pair is malformed or out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HoursError {
    #[error("expected OPEN-CLOSE, e.g. 7-19")]
    MissingSeparator,
    #[error("'{0}' is not a whole hour")]
    NotANumber(String),
    #[error("hours must be between 0 and 23, got {0}")]
    OutOfRange(u32),
    #[error("opening hour {open} must be before closing hour {close}")]
    NotBefore { open: u32, close: u32 },
}

/// Daily window `[open, close)` in local hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub open: u32,
    pub close: u32,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self { open: 6, close: 20 }
    }
}

impl OperatingHours {
    pub fn new(open: u32, close: u32) -> Result<Self, HoursError> {
        for hour in [open, close] {
            if hour > 23 {
                return Err(HoursError::OutOfRange(hour));
            }
        }
        if open >= close {
            return Err(HoursError::NotBefore { open, close });
        }
        Ok(Self { open, close })
    }

    /// Parse `OPEN-CLOSE`, e.g. `7-19`.
    pub fn parse(text: &str) -> Result<Self, HoursError> {
        let (open, close) = text
            .trim()
            .split_once('-')
            .ok_or(HoursError::MissingSeparator)?;
        let parse_hour = |s: &str| {
            let s = s.trim();
            s.parse::<u32>()
                .map_err(|_| HoursError::NotANumber(s.to_string()))
        };
        Self::new(parse_hour(open)?, parse_hour(close)?)
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.open <= hour && hour < self.close
    }

    /// Render as `6:00 AM - 8:00 PM`.
    pub fn display_12h(&self) -> String {
        format!(
            "{} - {}",
            format_hour_12h(self.open),
            format_hour_12h(self.close)
        )
    }
}

/// Operating hours that apply to a single calendar date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursOverride {
    pub date: NaiveDate,
    pub hours: OperatingHours,
}

/// Format a 24h hour as `h:00 AM/PM`.
pub fn format_hour_12h(hour: u32) -> String {
    match hour {
        0 => "12:00 AM".to_string(),
        1..=11 => format!("{hour}:00 AM"),
        12 => "12:00 PM".to_string(),
        _ => format!("{}:00 PM", hour - 12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hours() {
        let hours = OperatingHours::default();
        assert!(!hours.contains(5));
        assert!(hours.contains(6));
        assert!(hours.contains(19));
        assert!(!hours.contains(20));
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(
            OperatingHours::parse("7-19").unwrap(),
            OperatingHours { open: 7, close: 19 }
        );
        assert_eq!(
            OperatingHours::parse(" 0 - 23 ").unwrap(),
            OperatingHours { open: 0, close: 23 }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            OperatingHours::parse("719"),
            Err(HoursError::MissingSeparator)
        );
        assert_eq!(
            OperatingHours::parse("seven-19"),
            Err(HoursError::NotANumber("seven".into()))
        );
        assert_eq!(OperatingHours::parse("7-24"), Err(HoursError::OutOfRange(24)));
        assert_eq!(
            OperatingHours::parse("19-7"),
            Err(HoursError::NotBefore { open: 19, close: 7 })
        );
        assert_eq!(
            OperatingHours::parse("8-8"),
            Err(HoursError::NotBefore { open: 8, close: 8 })
        );
    }

    #[test]
    fn test_format_hour_12h() {
        assert_eq!(format_hour_12h(0), "12:00 AM");
        assert_eq!(format_hour_12h(6), "6:00 AM");
        assert_eq!(format_hour_12h(12), "12:00 PM");
        assert_eq!(format_hour_12h(20), "8:00 PM");
        assert_eq!(OperatingHours::default().display_12h(), "6:00 AM - 8:00 PM");
    }
}
