use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Local;
use mc_core::board::{self, Board, NewTask, Priority, TaskEdit, TaskStatus};

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct BoardParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
}

/// GET /api/projects?q=<text>&category=<name>: filtered board columns.
/// Stats always cover the whole board.
pub async fn get_board(
    State(app): State<AppState>,
    Query(params): Query<BoardParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let board = Board::load(&root)?;
        let filtered = board.filter(&params.q, &params.category);
        Ok::<_, mc_core::McError>(serde_json::json!({
            "columns": board::columns(&filtered),
            "stats": board.stats(Local::now().date_naive()),
            "categories": board.categories(),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct CreateTaskBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /api/projects: add a task to the board.
pub async fn create_task(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<CreateTaskBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut new = NewTask::new(body.title);
        new.description = body.description;
        new.category = body.category;
        new.tags = body.tags;
        if let Some(status) = body.status.as_deref() {
            new.status = status.parse::<TaskStatus>()?;
        }
        if let Some(priority) = body.priority.as_deref() {
            new.priority = priority.parse::<Priority>()?;
        }
        let mut board = Board::load(&root)?;
        let task = board.add(new).clone();
        board.save(&root)?;
        Ok::<_, mc_core::McError>(serde_json::to_value(task)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

#[derive(serde::Deserialize, Default)]
pub struct UpdateTaskBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// PUT /api/projects/{id}: edit fields and/or move to another column.
pub async fn update_task(
    State(app): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateTaskBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let status = body.status.as_deref().map(str::parse::<TaskStatus>).transpose()?;
        let priority = body.priority.as_deref().map(str::parse::<Priority>).transpose()?;
        let mut board = Board::load(&root)?;
        board.edit(
            &id,
            TaskEdit {
                title: body.title,
                description: body.description,
                priority,
                category: body.category,
                tags: body.tags,
            },
        )?;
        if let Some(status) = status {
            board.move_task(&id, status)?;
        }
        let task = board.get(&id)?.clone();
        board.save(&root)?;
        Ok::<_, mc_core::McError>(serde_json::to_value(task)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}

/// DELETE /api/projects/{id}
pub async fn delete_task(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut board = Board::load(&root)?;
        let removed = board.remove(&id)?;
        board.save(&root)?;
        Ok::<_, mc_core::McError>(serde_json::json!({ "id": removed.id, "deleted": true }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    app.notify();
    Ok(Json(result))
}
