use axum::extract::{Path, Query, State};
use axum::Json;
use mc_core::docs::{self, Vault};
use mc_core::frontmatter::DocFrontmatter;
use mc_core::palette;
use serde_json::Value;

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

fn vault(app: &AppState) -> Result<Vault, AppError> {
    Ok(Vault::new(app.config.docs_root(&app.root)?))
}

/// GET /api/docs/tree: the document hierarchy.
pub async fn get_tree(State(app): State<AppState>) -> Result<Json<Value>, AppError> {
    let vault = vault(&app)?;
    let result = tokio::task::spawn_blocking(move || {
        let tree = vault.tree()?;
        Ok::<_, mc_core::McError>(serde_json::json!({ "tree": tree }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct PaletteParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/docs/palette?q=<query>: documents for the command palette.
pub async fn get_palette(
    State(app): State<AppState>,
    Query(params): Query<PaletteParams>,
) -> Result<Json<Value>, AppError> {
    let vault = vault(&app)?;
    let result = tokio::task::spawn_blocking(move || {
        let items = palette::items(&vault.tree()?);
        let matches = palette::filter(&items, &params.q);
        Ok::<_, mc_core::McError>(serde_json::json!({ "items": matches }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/docs/{*path}: one document with its rendered HTML. Any failure
/// to produce the document is reported as 404.
pub async fn get_doc(
    State(app): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<Value>, AppError> {
    let vault = vault(&app)?;
    let outcome = tokio::task::spawn_blocking(move || vault.read(&path))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    let doc = outcome.map_err(|e| AppError::not_found(e.to_string()))?;
    let html = docs::render_html(&doc.content);
    Ok(Json(serde_json::json!({
        "path": doc.path,
        "frontmatter": doc.frontmatter,
        "content": doc.content,
        "html": html,
    })))
}

fn required_path(body: &Value) -> Result<String, AppError> {
    body.get("path")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("Path is required."))
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

/// POST /api/docs: create a document from `{ path, title, date, tags, content }`.
pub async fn create_doc(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    let path = required_path(&body)?;
    let frontmatter = DocFrontmatter {
        title: string_field(&body, "title"),
        date: string_field(&body, "date"),
        tags: body.get("tags").and_then(Value::as_array).map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
        ..DocFrontmatter::default()
    };
    let content = string_field(&body, "content").unwrap_or_default();
    write_doc(app, path, content, frontmatter).await
}

/// PUT /api/docs: replace a document from `{ path, content, frontmatter }`.
pub async fn update_doc(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    let path = required_path(&body)?;
    let frontmatter = body
        .get("frontmatter")
        .map(DocFrontmatter::from_json)
        .unwrap_or_default();
    let content = string_field(&body, "content").unwrap_or_default();
    write_doc(app, path, content, frontmatter).await
}

async fn write_doc(
    app: AppState,
    path: String,
    content: String,
    frontmatter: DocFrontmatter,
) -> Result<Json<Value>, AppError> {
    let vault = vault(&app)?;
    let normalized = tokio::task::spawn_blocking(move || {
        vault.write(&path, Some(&content), Some(&frontmatter))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    tracing::info!(path = %normalized, "document saved");
    app.notify();
    Ok(Json(serde_json::json!({ "path": normalized })))
}
