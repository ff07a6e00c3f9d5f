// Background worker that feeds time and weather into the status controller.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::controller::StatusController;
use crate::metrics;
use crate::status::{CourtStatus, WeatherSnapshot};
use crate::weather::WeatherProvider;

/// Outcome of one refresh round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Refreshed with freshly fetched weather.
    Fresh(CourtStatus),
    /// The fetch failed; refreshed with the last known weather.
    Stale(CourtStatus),
    /// The fetch failed and no weather has ever been seen.
    Skipped,
}

impl RefreshOutcome {
    fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Fresh(_) => "fresh",
            RefreshOutcome::Stale(_) => "stale",
            RefreshOutcome::Skipped => "skipped",
        }
    }
}

/// Fetch weather (outside any lock), record it, and run one automatic refresh.
pub async fn refresh_once<W: WeatherProvider>(
    controller: &StatusController,
    provider: &W,
    clock: &dyn Clock,
) -> RefreshOutcome {
    let outcome = match provider.fetch().await {
        Ok(report) => {
            let snapshot = report.snapshot;
            controller.record_weather(report);
            RefreshOutcome::Fresh(controller.refresh_automatic(clock.now(), &snapshot))
        }
        Err(e) => {
            tracing::warn!("Weather fetch failed: {e}");
            metrics::WEATHER_FETCH_FAILURES_TOTAL.inc();
            let last: Option<WeatherSnapshot> = controller.last_weather().map(|r| r.snapshot);
            match last {
                Some(snapshot) => {
                    RefreshOutcome::Stale(controller.refresh_automatic(clock.now(), &snapshot))
                }
                None => RefreshOutcome::Skipped,
            }
        }
    };

    metrics::REFRESH_ROUNDS_TOTAL
        .with_label_values(&[outcome.label()])
        .inc();
    outcome
}

/// Spawn a background task that refreshes the automatic status every `interval`.
/// The first round runs immediately.
pub fn spawn_refresh_worker<W: WeatherProvider>(
    controller: Arc<StatusController>,
    provider: W,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = refresh_once(&controller, &provider, clock.as_ref()).await;
            tracing::debug!("Refresh round finished: {outcome:?}");
        }
    })
}
