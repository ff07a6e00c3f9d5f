// Status controller: the single owner of court state.
//
// Every operation takes the state lock once and does no I/O while holding it.
// Time and weather are resolved by the caller before the call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;

use crate::auth::{Authorizer, CallerId};
use crate::error::ControllerError;
use crate::hours::{HoursOverride, OperatingHours};
use crate::metrics;
use crate::status::{CourtStatus, StatusMode, WeatherReport, WeatherSnapshot};

/// Identity recorded for automatic updates.
pub const SYSTEM_ACTOR: &str = "system";

/// Precipitation chance above which the courts close.
pub const MAX_PRECIPITATION_PROBABILITY: u8 = 50;
/// Coldest playable temperature, inclusive.
pub const MIN_TEMPERATURE_F: i32 = 35;
/// Hottest playable temperature, inclusive.
pub const MAX_TEMPERATURE_F: i32 = 95;

/// Automatic decision rule. First matching rule wins:
/// outside hours, then rain, then temperature, otherwise open.
/// Never produces a critical variant.
pub fn decide(hour: u32, weather: &WeatherSnapshot, hours: &OperatingHours) -> CourtStatus {
    if !hours.contains(hour) {
        return CourtStatus::Closed;
    }
    if weather.precipitation_probability > MAX_PRECIPITATION_PROBABILITY {
        return CourtStatus::Closed;
    }
    if weather.temperature_f < MIN_TEMPERATURE_F || weather.temperature_f > MAX_TEMPERATURE_F {
        return CourtStatus::Closed;
    }
    CourtStatus::Open
}

/// Process-wide court state. Only mutated through [`StatusController`].
#[derive(Debug, Clone)]
pub struct SystemState {
    pub current_status: CourtStatus,
    pub mode: StatusMode,
    pub last_updated: DateTime<FixedOffset>,
    pub updated_by: String,
    pub weather: Option<WeatherReport>,
    pub notes: String,
    pub hours: OperatingHours,
    pub hours_override: Option<HoursOverride>,
}

impl SystemState {
    /// Initial state: closed, automatic.
    pub fn new(hours: OperatingHours, now: DateTime<FixedOffset>) -> Self {
        Self {
            current_status: CourtStatus::Closed,
            mode: StatusMode::Automatic,
            last_updated: now,
            updated_by: SYSTEM_ACTOR.to_string(),
            weather: None,
            notes: String::new(),
            hours,
            hours_override: None,
        }
    }

    fn effective_hours(&self, date: NaiveDate) -> OperatingHours {
        match self.hours_override {
            Some(o) if o.date == date => o.hours,
            _ => self.hours,
        }
    }

    fn touch(&mut self, now: DateTime<FixedOffset>, by: String) {
        self.last_updated = now;
        self.updated_by = by;
    }
}

/// Serializable view of the whole state, as served by the API and shown by the bot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub status: CourtStatus,
    pub mode: StatusMode,
    pub manual_override: bool,
    pub last_updated: DateTime<FixedOffset>,
    pub updated_by: String,
    pub temperature: Option<i32>,
    pub precipitation: Option<u8>,
    pub conditions: String,
    pub notes: String,
    pub hours: OperatingHours,
    pub effective_hours: OperatingHours,
    pub hours_override: Option<HoursOverride>,
}

/// Single authority for reading and mutating [`SystemState`].
pub struct StatusController {
    state: Mutex<SystemState>,
    authorizer: Arc<dyn Authorizer>,
}

impl StatusController {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        hours: OperatingHours,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            state: Mutex::new(SystemState::new(hours, now)),
            authorizer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SystemState> {
        // Plain data; a poisoned lock still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails with [`ControllerError::Unauthorized`] unless `caller` may change state.
    /// Mutating operations call this themselves.
    pub fn authorize(&self, caller: &CallerId) -> Result<(), ControllerError> {
        if self.authorizer.is_authorized(caller) {
            Ok(())
        } else {
            tracing::warn!("Rejected state change from {}", caller.display());
            metrics::UNAUTHORIZED_ATTEMPTS_TOTAL.inc();
            Err(ControllerError::Unauthorized)
        }
    }

    // ── Core operations ──────────────────────────────────────────────

    pub fn get_status(&self) -> CourtStatus {
        self.lock().current_status
    }

    pub fn mode(&self) -> StatusMode {
        self.lock().mode
    }

    /// Pure decision for `now` and `weather` using the hours in effect on `now`'s date.
    pub fn compute_automatic_status(
        &self,
        now: DateTime<FixedOffset>,
        weather: &WeatherSnapshot,
    ) -> CourtStatus {
        let hours = self.lock().effective_hours(now.date_naive());
        decide(now.hour(), weather, &hours)
    }

    /// Recompute the status in automatic mode. In manual mode this is a no-op
    /// returning the held status.
    pub fn refresh_automatic(
        &self,
        now: DateTime<FixedOffset>,
        weather: &WeatherSnapshot,
    ) -> CourtStatus {
        let mut state = self.lock();
        if state.mode != StatusMode::Automatic {
            return state.current_status;
        }

        let hours = state.effective_hours(now.date_naive());
        let status = decide(now.hour(), weather, &hours);
        if status != state.current_status {
            tracing::info!(
                "Court status changed automatically: {} -> {}",
                state.current_status,
                status
            );
            metrics::STATUS_CHANGES_TOTAL
                .with_label_values(&["automatic", status.as_str()])
                .inc();
        }
        state.current_status = status;
        state.touch(now, SYSTEM_ACTOR.to_string());
        status
    }

    /// Hold `status` until an authorized caller resumes automatic mode.
    pub fn set_manual_status(
        &self,
        caller: &CallerId,
        status: CourtStatus,
        now: DateTime<FixedOffset>,
    ) -> Result<CourtStatus, ControllerError> {
        self.authorize(caller)?;

        let mut state = self.lock();
        state.current_status = status;
        state.mode = StatusMode::Manual;
        state.touch(now, caller.display());
        metrics::MANUAL_OVERRIDE_ACTIVE.set(1);
        drop(state);

        tracing::info!("Court status set to '{}' by {}", status, caller.display());
        metrics::STATUS_CHANGES_TOTAL
            .with_label_values(&["manual", status.as_str()])
            .inc();
        Ok(status)
    }

    /// Release a manual override. The status itself is recomputed on the next refresh.
    pub fn resume_automatic(&self, caller: &CallerId) -> Result<CourtStatus, ControllerError> {
        self.authorize(caller)?;

        let mut state = self.lock();
        state.mode = StatusMode::Automatic;
        let status = state.current_status;
        metrics::MANUAL_OVERRIDE_ACTIVE.set(0);
        drop(state);

        tracing::info!("Automatic status resumed by {}", caller.display());
        Ok(status)
    }

    // ── Display state ────────────────────────────────────────────────

    /// Keep the latest weather report for display. Status and mode are untouched.
    pub fn record_weather(&self, report: WeatherReport) {
        self.lock().weather = Some(report);
    }

    /// Last weather report seen, if any.
    pub fn last_weather(&self) -> Option<WeatherReport> {
        self.lock().weather.clone()
    }

    pub fn snapshot(&self, today: NaiveDate) -> StatusView {
        let state = self.lock();
        let weather = state.weather.as_ref();
        StatusView {
            status: state.current_status,
            mode: state.mode,
            manual_override: state.mode == StatusMode::Manual,
            last_updated: state.last_updated,
            updated_by: state.updated_by.clone(),
            temperature: weather.map(|w| w.snapshot.temperature_f),
            precipitation: weather.map(|w| w.snapshot.precipitation_probability),
            conditions: weather
                .map(|w| w.conditions.clone())
                .unwrap_or_else(|| "Checking conditions...".to_string()),
            notes: state.notes.clone(),
            hours: state.hours,
            effective_hours: state.effective_hours(today),
            hours_override: state.hours_override.filter(|o| o.date == today),
        }
    }

    // ── Notes and hours ──────────────────────────────────────────────

    pub fn set_notes(
        &self,
        caller: &CallerId,
        notes: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<(), ControllerError> {
        self.authorize(caller)?;
        let mut state = self.lock();
        state.notes = notes.trim().to_string();
        state.touch(now, caller.display());
        Ok(())
    }

    pub fn clear_notes(
        &self,
        caller: &CallerId,
        now: DateTime<FixedOffset>,
    ) -> Result<(), ControllerError> {
        self.set_notes(caller, "", now)
    }

    pub fn effective_hours(&self, date: NaiveDate) -> OperatingHours {
        self.lock().effective_hours(date)
    }

    /// Replace the permanent operating hours. Takes effect on the next refresh.
    pub fn set_hours(
        &self,
        caller: &CallerId,
        hours: OperatingHours,
        now: DateTime<FixedOffset>,
    ) -> Result<OperatingHours, ControllerError> {
        self.authorize(caller)?;
        let mut state = self.lock();
        state.hours = hours;
        state.touch(now, caller.display());
        drop(state);

        tracing::info!(
            "Operating hours changed to {} by {}",
            hours.display_12h(),
            caller.display()
        );
        Ok(hours)
    }

    /// Use `hours` on `date` only.
    pub fn set_hours_for_day(
        &self,
        caller: &CallerId,
        date: NaiveDate,
        hours: OperatingHours,
        now: DateTime<FixedOffset>,
    ) -> Result<OperatingHours, ControllerError> {
        self.authorize(caller)?;
        let mut state = self.lock();
        state.hours_override = Some(HoursOverride { date, hours });
        state.touch(now, caller.display());
        drop(state);

        tracing::info!(
            "Operating hours for {date} changed to {} by {}",
            hours.display_12h(),
            caller.display()
        );
        Ok(hours)
    }
}
