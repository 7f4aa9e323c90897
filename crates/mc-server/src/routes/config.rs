use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: the agent configuration files with line and word counts.
pub async fn get_config_files(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let dir = config.config_files_dir(&root)?;
        let files = mc_core::config_files::read_all(&dir);
        Ok::<_, mc_core::McError>(serde_json::json!({ "files": files }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/settings: the effective dashboard configuration and any
/// validation warnings.
pub async fn get_settings(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let warnings = config.validate(&root);
        Ok::<_, mc_core::McError>(serde_json::json!({
            "config": config.as_ref(),
            "warnings": warnings,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
