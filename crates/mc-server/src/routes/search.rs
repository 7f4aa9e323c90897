use axum::extract::{Query, State};
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search?q=<query>: memory files and documents containing `q`.
pub async fn search(
    State(app): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    if params.q.is_empty() {
        return Ok(Json(serde_json::json!({ "results": [] })));
    }
    let root = app.root.clone();
    let config = app.config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let memory = config.memory_root(&root)?;
        let docs = config.docs_root(&root)?;
        let results = mc_core::search::search(&memory, &docs, &params.q);
        Ok::<_, mc_core::McError>(serde_json::json!({ "results": results }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
