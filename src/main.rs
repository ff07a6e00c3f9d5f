use std::sync::Arc;

use court_status::api::{self, AppState};
use court_status::auth::Authorizer;
use court_status::clock::{Clock, SystemClock};
use court_status::config::Config;
use court_status::controller::StatusController;
use court_status::metrics;
use court_status::refresh::spawn_refresh_worker;
use court_status::telegram::{spawn_bot, TelegramClient};
use court_status::weather::MetNoProvider;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    metrics::register_metrics();

    let config = Config::load();

    let allow_list = Arc::new(config.allow_list());
    if allow_list.is_empty() {
        tracing::warn!(
            "No AUTHORIZED_USERS or ADMIN_API_KEYS configured; nobody can change court status"
        );
    }

    tracing::info!("Court time zone: {}", config.court_tz.name());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.court_tz));
    let authorizer: Arc<dyn Authorizer> = allow_list.clone();
    let controller = Arc::new(StatusController::new(authorizer, config.hours, clock.now()));

    let weather = MetNoProvider::new(config.latitude, config.longitude, &config.weather_user_agent)
        .expect("Failed to build weather client");
    spawn_refresh_worker(
        controller.clone(),
        weather,
        clock.clone(),
        config.refresh_interval,
    );

    match &config.telegram_token {
        Some(token) => match TelegramClient::new(token) {
            Ok(client) => {
                spawn_bot(client, controller.clone(), clock.clone());
            }
            Err(e) => tracing::error!("Error setting up Telegram bot: {e}"),
        },
        None => tracing::warn!("Telegram bot token not configured. Bot will not start."),
    }

    let state = AppState { controller, clock };
    let app = api::router(state, allow_list, &config.static_dir);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Court status service listening on {addr}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
