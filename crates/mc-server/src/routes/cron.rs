use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Local, NaiveDate};
use mc_core::cron;
use mc_core::gateway::GatewayClient;

use crate::error::AppError;
use crate::state::AppState;

fn gateway_cron_list(
    app: &AppState,
) -> impl FnOnce() -> mc_core::Result<serde_json::Value> + Send + 'static {
    let gateway = app.config.gateway.clone();
    move || GatewayClient::new(&gateway)?.cron_list()
}

/// GET /api/cron: the gateway's job list, passed through untouched.
/// Never cached, including failures, which are reported as 500.
pub async fn gateway_jobs(State(app): State<AppState>) -> Response {
    let no_store = [(header::CACHE_CONTROL, "no-store")];
    let outcome = tokio::task::spawn_blocking(gateway_cron_list(&app))
        .await
        .map_err(|e| format!("task join error: {e}"))
        .and_then(|r| r.map_err(|e| e.to_string()));

    match outcome {
        Ok(result) => (no_store, Json(result)).into_response(),
        Err(message) => {
            tracing::error!(error = %message, "failed to list cron jobs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                no_store,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response()
        }
    }
}

/// GET /api/cron/overview: gateway jobs grouped into stations.
pub async fn overview(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let list = gateway_cron_list(&app);
    let result = tokio::task::spawn_blocking(move || {
        let jobs = cron::parse_gateway_jobs(&list()?);
        let overview = cron::overview(&jobs);
        Ok::<_, mc_core::McError>(serde_json::to_value(overview)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/cron/list: jobs from the local cron store; empty on any failure.
pub async fn stored_jobs(State(app): State<AppState>) -> Json<serde_json::Value> {
    let root = app.root.clone();
    let config = app.config.clone();
    let jobs = tokio::task::spawn_blocking(move || match config.cron_store_path(&root) {
        Ok(path) => cron::read_cron_store(&path),
        Err(e) => {
            tracing::warn!(error = %e, "cannot resolve cron store path");
            Vec::new()
        }
    })
    .await
    .unwrap_or_default();

    Json(serde_json::json!({ "jobs": jobs }))
}

#[derive(serde::Deserialize)]
pub struct CalendarParams {
    /// Any day in the requested week; defaults to today.
    pub week: Option<String>,
}

/// GET /api/cron/calendar?week=YYYY-MM-DD: stored jobs laid out Sunday to
/// Saturday by next run.
pub async fn calendar(
    State(app): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let anchor = match params.week.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::bad_request(format!("invalid week date: {raw}")))?,
        None => Local::now().date_naive(),
    };
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let jobs = cron::read_cron_store(&config.cron_store_path(&root)?);
        let days = cron::calendar_week(&jobs, anchor)?;
        Ok::<_, mc_core::McError>(serde_json::json!({ "days": days }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
