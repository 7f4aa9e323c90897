use axum::extract::{Query, State};
use axum::Json;
use chrono::Local;
use mc_core::ledger::{Billable, Ledger, MAX_SUMMARY_DAYS};

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

/// GET /api/usage/tokentap: parsed prompt logs with aggregate statistics.
pub async fn tokentap(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let dir = config.prompts_dir(&root)?;
        let history = mc_core::tokentap::history(&dir, config.usage.parse_options());
        Ok::<_, mc_core::McError>(serde_json::to_value(history)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct LedgerParams {
    pub days: Option<u32>,
}

/// GET /api/usage/ledger?days=<n>: per-service API spend over the last
/// `n` days (default 7, at most a year) plus today's entries.
pub async fn ledger_summary(
    State(app): State<AppState>,
    Query(params): Query<LedgerParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let days = params.days.unwrap_or(7).clamp(1, MAX_SUMMARY_DAYS);
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let ledger = Ledger::new(config.ledger_dir(&root)?);
        let today = Local::now().date_naive();
        let services = ledger.service_summary(today, days)?;
        let today_log = ledger.daily_summary(today)?;
        Ok::<_, mc_core::McError>(serde_json::json!({
            "days": days,
            "services": services,
            "today": today_log,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct RecordUsageBody {
    pub service: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub quantity: u64,
}

/// POST /api/usage/ledger: record a billable call at its estimated cost.
pub async fn record_usage(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<RecordUsageBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let billable = Billable::parse(&body.service, body.model.as_deref(), body.quantity)?;
        let entry = Ledger::new(config.ledger_dir(&root)?).record(&billable)?;
        Ok::<_, mc_core::McError>(serde_json::to_value(entry)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
