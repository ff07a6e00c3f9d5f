// Integration tests for the HTTP API: public status reads, admin mutations,
// and the automatic refresh flowing through to the status endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::{json, Value};
use tower::ServiceExt;

use court_status::api::{self, AppState};
use court_status::auth::AllowList;
use court_status::clock::FixedClock;
use court_status::controller::StatusController;
use court_status::hours::OperatingHours;
use court_status::refresh::refresh_once;
use court_status::status::{CourtStatus, StatusMode, WeatherReport, WeatherSnapshot};
use court_status::weather::StaticWeather;

const ADMIN_KEY: &str = "frontdesk-secret";

fn noon() -> DateTime<FixedOffset> {
    FixedOffset::west_opt(4 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 8, 18, 12, 0, 0)
        .unwrap()
}

fn setup() -> (Router, Arc<StatusController>) {
    let allow_list = Arc::new(AllowList::new().with_api_key("frontdesk", ADMIN_KEY));
    let controller = Arc::new(StatusController::new(
        allow_list.clone(),
        OperatingHours::default(),
        noon(),
    ));
    let state = AppState {
        controller: controller.clone(),
        clock: Arc::new(FixedClock(noon())),
    };
    let static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static");
    (api::router(state, allow_list, &static_dir), controller)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin(method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "service": "court-status" }));
}

#[tokio::test]
async fn test_initial_status() {
    let (app, _) = setup();
    let (status, body) = send(&app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");
    assert_eq!(body["mode"], "automatic");
    assert_eq!(body["manual_override"], false);
    assert_eq!(body["updated_by"], "system");
    assert_eq!(body["conditions"], "Checking conditions...");
    assert_eq!(body["effective_hours"], json!({ "open": 6, "close": 20 }));
}

#[tokio::test]
async fn test_set_status_requires_credentials() {
    let (app, controller) = setup();

    let (status, _) = send(&app, admin("POST", "/api/status/open", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, admin("POST", "/api/status/open", Some("nope"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid API key");

    assert_eq!(controller.get_status(), CourtStatus::Closed);
    assert_eq!(controller.mode(), StatusMode::Automatic);
}

#[tokio::test]
async fn test_set_status_manual_override() {
    let (app, controller) = setup();

    let (status, body) = send(
        &app,
        admin("POST", "/api/status/critically_closed", Some(ADMIN_KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"]["status"], "critically_closed");
    assert_eq!(body["status"]["mode"], "manual");
    assert_eq!(body["status"]["updated_by"], "api:frontdesk");

    assert_eq!(controller.get_status(), CourtStatus::CriticallyClosed);
}

#[tokio::test]
async fn test_set_status_rejects_unknown_status() {
    let (app, _) = setup();
    let (status, body) = send(
        &app,
        admin("POST", "/api/status/sideways", Some(ADMIN_KEY), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");
}

#[tokio::test]
async fn test_resume_then_refresh_opens() {
    let (app, controller) = setup();
    send(&app, admin("POST", "/api/status/closed", Some(ADMIN_KEY), None)).await;

    let weather = StaticWeather(WeatherReport {
        snapshot: WeatherSnapshot::new(0, 70),
        conditions: "Clear sky".into(),
    });
    let clock = FixedClock(noon());

    // Manual override holds through a refresh
    refresh_once(&controller, &weather, &clock).await;
    assert_eq!(controller.get_status(), CourtStatus::Closed);

    let (status, body) = send(&app, admin("POST", "/api/status/auto", Some(ADMIN_KEY), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["mode"], "automatic");

    refresh_once(&controller, &weather, &clock).await;
    let (_, body) = send(&app, get("/api/status")).await;
    assert_eq!(body["status"], "open");
    assert_eq!(body["temperature"], 70);
    assert_eq!(body["precipitation"], 0);
    assert_eq!(body["conditions"], "Clear sky");
}

#[tokio::test]
async fn test_notes_endpoints() {
    let (app, _) = setup();

    let (status, _) = send(
        &app,
        admin(
            "PUT",
            "/api/notes",
            Some(ADMIN_KEY),
            Some(json!({ "notes": "Court 4 resurfacing" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, get("/api/status")).await;
    assert_eq!(body["notes"], "Court 4 resurfacing");

    let (status, _) = send(&app, admin("DELETE", "/api/notes", Some(ADMIN_KEY), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, get("/api/status")).await;
    assert_eq!(body["notes"], "");
}

#[tokio::test]
async fn test_hours_endpoint() {
    let (app, controller) = setup();

    let (status, body) = send(
        &app,
        admin(
            "PUT",
            "/api/hours",
            Some(ADMIN_KEY),
            Some(json!({ "open": 20, "close": 8 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("must be before closing hour"));

    let (status, body) = send(
        &app,
        admin(
            "PUT",
            "/api/hours",
            Some(ADMIN_KEY),
            Some(json!({ "open": 13, "close": 18, "today_only": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["today_only"], true);

    let (_, body) = send(&app, get("/api/status")).await;
    assert_eq!(body["hours"], json!({ "open": 6, "close": 20 }));
    assert_eq!(body["effective_hours"], json!({ "open": 13, "close": 18 }));

    // Noon is now before today's opening hour
    assert_eq!(
        controller.compute_automatic_status(noon(), &WeatherSnapshot::new(0, 70)),
        CourtStatus::Closed
    );
}

#[tokio::test]
async fn test_metrics_endpoint() {
    court_status::metrics::register_metrics();
    let (app, _) = setup();
    send(&app, get("/api/status")).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("courts_api_requests_total"));
}

#[tokio::test]
async fn test_static_page() {
    let (app, _) = setup();
    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Tennis Courts"));
}
