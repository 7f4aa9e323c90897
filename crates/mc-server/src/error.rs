use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mc_core::error::McError;

// ---------------------------------------------------------------------------
// Internal sentinels for explicit statuses
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. The body is always
/// `{ "error": message }`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        if self.0.downcast_ref::<NotFoundError>().is_some() {
            return StatusCode::NOT_FOUND;
        }
        match self.0.downcast_ref::<McError>() {
            Some(e) => match e {
                McError::DocNotFound(_) | McError::TaskNotFound(_) => StatusCode::NOT_FOUND,
                McError::InvalidDocPath(_)
                | McError::InvalidStatus(_)
                | McError::InvalidPriority(_)
                | McError::InvalidActivityType(_)
                | McError::InvalidActivityStatus(_)
                | McError::InvalidDate(_)
                | McError::UnknownService(_) => StatusCode::BAD_REQUEST,
                McError::InvalidFrontmatter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                McError::Gateway(_) | McError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
                McError::HomeNotFound | McError::Io(_) | McError::Yaml(_) | McError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = status.as_u16(), "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ---------------------------------------------------------------------------
// JsonBody: `Json` whose rejections use the `{ "error": ... }` body
// ---------------------------------------------------------------------------

/// Drop-in for `axum::Json` in handler arguments. A missing content type,
/// malformed JSON or a body that does not fit `T` is a 400 `AppError`.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: McError) -> StatusCode {
        AppError(err.into()).into_response().status()
    }

    #[test]
    fn doc_not_found_maps_to_404() {
        assert_eq!(status_of(McError::DocNotFound("a.md".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn task_not_found_maps_to_404() {
        assert_eq!(status_of(McError::TaskNotFound("7".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_input_maps_to_400() {
        assert_eq!(status_of(McError::InvalidDocPath("../x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(McError::InvalidStatus("doing".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(McError::InvalidActivityType("shell".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(McError::UnknownService("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(McError::InvalidDate("+262142-12-31".into())), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_frontmatter_maps_to_422() {
        let err = McError::InvalidFrontmatter {
            path: "a.md".into(),
            reason: "not a mapping".into(),
        };
        assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn gateway_errors_map_to_502() {
        assert_eq!(status_of(McError::Gateway("down".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(McError::GatewayUnavailable("refused".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        assert_eq!(status_of(McError::Io(io_err)), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn explicit_constructors() {
        assert_eq!(
            AppError::bad_request("Path is required.").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("gone").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn response_is_json() {
        let response = AppError(McError::DocNotFound("x.md".into()).into()).into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
