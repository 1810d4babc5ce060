// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BIM-Dash Server - REST gateway for the project dashboard.
//!
//! Fronts the project-data backend, shapes its flat lists into grouped
//! tables, resolves project locations to cities, keeps the ideas notebook and
//! hosts cascading explorer sessions.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/projects/table` - Projects table (project → discipline)
//! - `GET /api/v1/views/tree` - Views table (project → discipline → file → version)
//! - `GET /api/v1/map/points` - Project locations with cities
//! - `GET|POST /api/v1/projects/:project/designers` - Designer directory
//! - `PUT|DELETE /api/v1/projects/:project/designers/:id` - Designer edits
//! - `GET /api/v1/notes`, `PUT /api/v1/notes/:section` - Ideas notebook
//! - `POST /api/v1/chat` - Assistant
//! - `/api/v1/explorer/sessions[/:id[/select|/reset|/refresh]]` - Explorer sessions

use anyhow::Context;
use axum::{
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
    Router,
};
use bim_dash_client::{Backend, Geocoder, HttpBackend};
use bim_dash_core::{JsonFileStore, KeyValueStore};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;

#[cfg(test)]
mod test_support;

use config::Config;
use services::{ExplorerSessions, SessionLimits};

/// Key-value store shared by handlers.
pub type SharedStore = Arc<Mutex<Box<dyn KeyValueStore + Send>>>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub geocoder: Arc<Geocoder>,
    pub notes: SharedStore,
    pub sessions: Arc<ExplorerSessions>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the state from explicit parts.
    pub fn new(
        config: Config,
        backend: Arc<dyn Backend>,
        geocoder: Geocoder,
        notes: Box<dyn KeyValueStore + Send>,
    ) -> Self {
        let sessions = ExplorerSessions::new(
            Arc::clone(&backend),
            SessionLimits {
                settle_timeout: Duration::from_millis(config.settle_timeout_ms),
                idle_ttl: Duration::from_secs(config.session_idle_secs),
                max_sessions: config.max_sessions,
            },
        );
        Self {
            backend,
            geocoder: Arc::new(geocoder),
            notes: Arc::new(Mutex::new(notes)),
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        }
    }

    /// Connects to the configured backend, geocoder and notes file.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let backend = HttpBackend::with_client(&config.backend_url, http.clone())
            .context("Invalid BACKEND_URL")?;
        let geocoder =
            Geocoder::with_client(&config.geocoder_url, &config.geocoder_user_agent, http)
                .context("Invalid GEOCODER_URL")?;
        let notes = JsonFileStore::open(&config.notes_path)
            .with_context(|| format!("Failed to open notes store at {}", config.notes_path))?;

        Ok(Self::new(config, Arc::new(backend), geocoder, Box::new(notes)))
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_any() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Grouped tables
        .route("/api/v1/projects/table", get(routes::projects::table))
        .route("/api/v1/views/tree", get(routes::views::tree))
        .route("/api/v1/map/points", get(routes::map::points))
        // Designers
        .route(
            "/api/v1/projects/:project/designers",
            get(routes::designers::list).post(routes::designers::create),
        )
        .route(
            "/api/v1/projects/:project/designers/:id",
            put(routes::designers::update).delete(routes::designers::remove),
        )
        // Ideas notebook
        .route("/api/v1/notes", get(routes::notes::get_notes))
        .route("/api/v1/notes/export", get(routes::notes::export))
        .route("/api/v1/notes/:section", put(routes::notes::update_section))
        // Assistant
        .route("/api/v1/chat", post(routes::chat::ask))
        // Explorer sessions
        .route("/api/v1/explorer/sessions", post(routes::explorer::create))
        .route(
            "/api/v1/explorer/sessions/:id",
            get(routes::explorer::show).delete(routes::explorer::close),
        )
        .route("/api/v1/explorer/sessions/:id/select", post(routes::explorer::select))
        .route("/api/v1/explorer/sessions/:id/reset", post(routes::explorer::reset))
        .route("/api/v1/explorer/sessions/:id/refresh", post(routes::explorer::refresh))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.request_timeout_secs),
                ))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

fn init_tracing(config: &Config) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tower_http=debug,bim_dash_server=debug".into());
    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    tracing::info!(
        port = config.port,
        backend_url = %config.backend_url,
        geocoder_url = %config.geocoder_url,
        notes_path = %config.notes_path,
        request_timeout_secs = config.request_timeout_secs,
        settle_timeout_ms = config.settle_timeout_ms,
        session_idle_secs = config.session_idle_secs,
        max_sessions = config.max_sessions,
        "Starting BIM-Dash Server"
    );

    let port = config.port;
    let state = AppState::from_config(config)?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
