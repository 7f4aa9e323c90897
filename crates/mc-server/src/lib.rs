pub mod error;
pub mod routes;
pub mod state;

use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    router_with_state(state::AppState::new(root))
}

pub fn router_with_state(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Activity feed
        .route(
            "/api/activity",
            get(routes::activity::list_activities).post(routes::activity::log_activity),
        )
        // Agent config files and dashboard settings
        .route("/api/config", get(routes::config::get_config_files))
        .route("/api/settings", get(routes::config::get_settings))
        // Cron
        .route("/api/cron", get(routes::cron::gateway_jobs))
        .route("/api/cron/overview", get(routes::cron::overview))
        .route("/api/cron/list", get(routes::cron::stored_jobs))
        .route("/api/cron/calendar", get(routes::cron::calendar))
        // Usage
        .route("/api/usage/tokentap", get(routes::usage::tokentap))
        .route(
            "/api/usage/ledger",
            get(routes::usage::ledger_summary).post(routes::usage::record_usage),
        )
        // Search
        .route("/api/search", get(routes::search::search))
        // Docs
        .route(
            "/api/docs",
            put(routes::docs::update_doc).post(routes::docs::create_doc),
        )
        .route("/api/docs/tree", get(routes::docs::get_tree))
        .route("/api/docs/palette", get(routes::docs::get_palette))
        .route("/api/docs/{*path}", get(routes::docs::get_doc))
        // Projects board
        .route(
            "/api/projects",
            get(routes::projects::get_board).post(routes::projects::create_task),
        )
        .route(
            "/api/projects/{id}",
            put(routes::projects::update_task).delete(routes::projects::delete_task),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

/// Start the dashboard API server on `0.0.0.0:<port>`.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener, open_browser).await
}

/// Start the server on a pre-bound listener, so the caller can read the
/// actual port first (useful when `port = 0` and the OS picks one).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root);

    tracing::info!("mission control listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/health");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
