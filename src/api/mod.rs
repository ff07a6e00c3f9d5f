// HTTP API routes: public status, admin mutations, health and metrics.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::auth::{AdminCaller, AllowList};
use crate::clock::Clock;
use crate::controller::StatusController;
use crate::error::ControllerError;
use crate::hours::OperatingHours;
use crate::metrics;
use crate::status::CourtStatus;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Deserialize)]
pub struct HoursRequest {
    pub open: u32,
    pub close: u32,
    /// Apply to today's date only instead of replacing the permanent hours.
    #[serde(default)]
    pub today_only: bool,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<StatusController>,
    pub clock: Arc<dyn Clock>,
}

// ── Error helper ──────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn controller_error(e: ControllerError) -> Response {
    match e {
        ControllerError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, &e.to_string()).into_response()
        }
        ControllerError::InvalidHours(_) => {
            json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response()
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState, allow_list: Arc<AllowList>, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        // Status
        .route("/api/status", get(get_status))
        .route("/api/status/auto", post(resume_automatic))
        .route("/api/status/{status}", post(set_status))
        // Notes
        .route("/api/notes", put(set_notes).delete(clear_notes))
        // Hours
        .route("/api/hours", put(set_hours))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(Extension(allow_list))
        .layer(middleware::from_fn(track_requests))
        .layer(CorsLayer::permissive())
}

async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let response = next.run(req).await;
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[&method, &endpoint, response.status().as_str()])
        .inc();
    response
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "court-status" }))
}

async fn metrics_text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let today = state.clock.now().date_naive();
    (StatusCode::OK, Json(json!(state.controller.snapshot(today))))
}

async fn set_status(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Path(status): Path<String>,
) -> impl IntoResponse {
    let status: CourtStatus = match status.parse() {
        Ok(s) => s,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "Invalid status").into_response(),
    };

    let now = state.clock.now();
    match state.controller.set_manual_status(&caller, status, now) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": state.controller.snapshot(now.date_naive()),
            })),
        )
            .into_response(),
        Err(e) => controller_error(e),
    }
}

async fn resume_automatic(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
) -> impl IntoResponse {
    match state.controller.resume_automatic(&caller) {
        Ok(_) => {
            let today = state.clock.now().date_naive();
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "status": state.controller.snapshot(today),
                })),
            )
                .into_response()
        }
        Err(e) => controller_error(e),
    }
}

async fn set_notes(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Json(req): Json<NotesRequest>,
) -> impl IntoResponse {
    match state
        .controller
        .set_notes(&caller, &req.notes, state.clock.now())
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => controller_error(e),
    }
}

async fn clear_notes(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
) -> impl IntoResponse {
    match state.controller.clear_notes(&caller, state.clock.now()) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => controller_error(e),
    }
}

async fn set_hours(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Json(req): Json<HoursRequest>,
) -> impl IntoResponse {
    let hours = match OperatingHours::new(req.open, req.close) {
        Ok(h) => h,
        Err(e) => return controller_error(e.into()),
    };

    let now = state.clock.now();
    let result = if req.today_only {
        state
            .controller
            .set_hours_for_day(&caller, now.date_naive(), hours, now)
    } else {
        state.controller.set_hours(&caller, hours, now)
    };

    match result {
        Ok(hours) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "hours": hours,
                "today_only": req.today_only,
            })),
        )
            .into_response(),
        Err(e) => controller_error(e),
    }
}
