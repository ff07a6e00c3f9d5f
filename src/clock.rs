// Wall-clock source for the automatic refresh.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

/// Time zone the courts keep when none is configured.
pub const DEFAULT_COURT_TZ: Tz = chrono_tz::America::New_York;

/// Exposes the current time in the courts' time zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the system clock and converts it to the courts' time zone,
/// independent of the host's `TZ`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Convert a UTC instant to court-local time.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.tz).fixed_offset()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DEFAULT_COURT_TZ)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.localize(Utc::now())
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
