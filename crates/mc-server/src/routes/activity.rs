use axum::extract::{Query, State};
use axum::Json;
use mc_core::activity::{ActivityLog, ActivityStatus, ActivityType, NewActivity};

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/activity?type=<kind>&limit=<n>: newest activities first.
pub async fn list_activities(
    State(app): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let log = ActivityLog::open(&root);
        let activities = match params.kind.as_deref().filter(|k| !k.is_empty()) {
            Some(kind) => log.list_by_type(kind.parse::<ActivityType>()?, params.limit)?,
            None => log.list(params.limit)?,
        };
        Ok::<_, mc_core::McError>(serde_json::json!({ "activities": activities }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct LogActivityBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub tokens: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// POST /api/activity: append an activity; returns its id.
pub async fn log_activity(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<LogActivityBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.action.trim().is_empty() {
        return Err(AppError::bad_request("action is required"));
    }
    let root = app.root.clone();
    let id = tokio::task::spawn_blocking(move || {
        let status = match body.status.as_deref() {
            Some(s) => s.parse::<ActivityStatus>()?,
            None => ActivityStatus::Success,
        };
        let id = ActivityLog::open(&root).log(NewActivity {
            kind: body.kind.parse::<ActivityType>()?,
            action: body.action,
            details: body.details,
            tokens: body.tokens,
            status,
        })?;
        Ok::<_, mc_core::McError>(id)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(serde_json::json!({ "id": id })))
}
