// Weather provider: MET Norway location forecast client.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::status::{WeatherReport, WeatherSnapshot};

const MET_NO_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0/complete";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather API returned status {0}")]
    Status(u16),
    #[error("malformed weather payload: {0}")]
    Malformed(String),
}

/// Supplies the current weather for the courts' location.
pub trait WeatherProvider: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<WeatherReport, WeatherError>> + Send;
}

// ── MET Norway payload ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Forecast {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    timeseries: Vec<TimeStep>,
}

#[derive(Debug, Deserialize)]
struct TimeStep {
    data: TimeStepData,
}

#[derive(Debug, Deserialize)]
struct TimeStepData {
    instant: Instant,
    next_1_hours: Option<NextHours>,
}

#[derive(Debug, Deserialize)]
struct Instant {
    details: InstantDetails,
}

#[derive(Debug, Deserialize)]
struct InstantDetails {
    air_temperature: f64,
}

#[derive(Debug, Deserialize)]
struct NextHours {
    summary: Option<Summary>,
    details: Option<NextHoursDetails>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    symbol_code: String,
}

#[derive(Debug, Deserialize)]
struct NextHoursDetails {
    probability_of_precipitation: Option<f64>,
}

pub fn celsius_to_fahrenheit(celsius: f64) -> i32 {
    (celsius * 1.8 + 32.0).floor() as i32
}

/// Map a MET Norway symbol code (e.g. `partlycloudy_day`) to readable text.
pub fn describe_symbol(symbol_code: &str) -> &'static str {
    let base = symbol_code
        .split('_')
        .next()
        .unwrap_or(symbol_code);
    match base {
        "clearsky" => "Clear sky",
        "fair" => "Fair",
        "partlycloudy" => "Partly cloudy",
        "cloudy" => "Cloudy",
        "fog" => "Fog",
        "lightrainshowers" => "Light rain showers",
        "rainshowers" => "Rain showers",
        "heavyrainshowers" => "Heavy rain showers",
        "lightrain" => "Light rain",
        "rain" => "Rain",
        "heavyrain" => "Heavy rain",
        "lightsleetshowers" | "sleetshowers" | "heavysleetshowers" => "Sleet showers",
        "lightsleet" | "sleet" | "heavysleet" => "Sleet",
        "lightsnowshowers" | "snowshowers" | "heavysnowshowers" => "Snow showers",
        "lightsnow" | "snow" | "heavysnow" => "Snow",
        b if b.contains("thunder") => "Thunderstorms",
        _ => "Unknown",
    }
}

/// Parse a MET Norway `locationforecast/2.0` body into a report.
pub fn parse_forecast(body: &str) -> Result<WeatherReport, WeatherError> {
    let forecast: Forecast =
        serde_json::from_str(body).map_err(|e| WeatherError::Malformed(e.to_string()))?;
    let step = forecast
        .properties
        .timeseries
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Malformed("empty timeseries".to_string()))?;

    let next = step.data.next_1_hours;
    let probability = next
        .as_ref()
        .and_then(|n| n.details.as_ref())
        .and_then(|d| d.probability_of_precipitation)
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
        .round() as u8;
    let conditions = next
        .as_ref()
        .and_then(|n| n.summary.as_ref())
        .map(|s| describe_symbol(&s.symbol_code))
        .unwrap_or("Unknown");

    Ok(WeatherReport {
        snapshot: WeatherSnapshot::new(
            probability,
            celsius_to_fahrenheit(step.data.instant.details.air_temperature),
        ),
        conditions: conditions.to_string(),
    })
}

/// Client for `api.met.no`. MET Norway rejects requests without an identifying User-Agent.
#[derive(Debug, Clone)]
pub struct MetNoProvider {
    client: reqwest::Client,
    latitude: f64,
    longitude: f64,
}

impl MetNoProvider {
    pub fn new(latitude: f64, longitude: f64, user_agent: &str) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            latitude,
            longitude,
        })
    }
}

impl WeatherProvider for MetNoProvider {
    async fn fetch(&self) -> Result<WeatherReport, WeatherError> {
        let response = self
            .client
            .get(MET_NO_URL)
            .query(&[
                ("lat", format!("{:.4}", self.latitude)),
                ("lon", format!("{:.4}", self.longitude)),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_forecast(&body)
    }
}

/// Fixed weather, for tests and offline runs.
#[derive(Debug, Clone)]
pub struct StaticWeather(pub WeatherReport);

impl WeatherProvider for StaticWeather {
    async fn fetch(&self) -> Result<WeatherReport, WeatherError> {
        Ok(self.0.clone())
    }
}
