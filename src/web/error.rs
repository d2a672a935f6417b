use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use log::{debug, error};

use super::render;
use crate::error::TaskError;

/// Map an operation failure onto an HTTP status.
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<TaskError>() {
        Some(TaskError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(TaskError::Invalid(_)) => StatusCode::BAD_REQUEST,
        Some(TaskError::Conflict(_)) => StatusCode::CONFLICT,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_failure(status: StatusCode, err: &anyhow::Error) -> String {
    if status.is_server_error() {
        error!("request failed: {err:#}");
        "internal server error".to_string()
    } else {
        debug!("request rejected ({status}): {err:#}");
        err.to_string()
    }
}

/// Error returned by JSON handlers, rendered as `{"detail": ...}`.
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let detail = log_failure(status, &self.0);
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

/// Error returned by board handlers, rendered as a small HTML page.
pub struct PageError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for PageError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let detail = log_failure(status, &self.0);
        (status, Html(render::error_page(status, &detail))).into_response()
    }
}
