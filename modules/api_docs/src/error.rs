use apidoc::DocError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("OpenAPI document is misconfigured: {0}")]
    Docs(#[from] DocError),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        use AppError::*;
        match self {
            BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
            Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone()),
            NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
            // Configuration errors name what is wrong; they carry no secrets.
            Docs(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                e.to_string(),
            ),
            Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error".to_string(),
            ),
        }
    }

    /// Render with the request id of the failing request, when known.
    pub fn into_response_with(self, request_id: Option<&str>) -> Response {
        let (status, code, message) = self.parts();

        match &self {
            AppError::Internal(err) => tracing::error!(
                request_id = request_id.unwrap_or("n/a"),
                error = %err,
                status = status.as_u16(),
                "request failed"
            ),
            AppError::Docs(err) => tracing::error!(
                request_id = request_id.unwrap_or("n/a"),
                error = %err,
                status = status.as_u16(),
                "OpenAPI document could not be built"
            ),
            other => tracing::warn!(
                request_id = request_id.unwrap_or("n/a"),
                error = %other,
                status = status.as_u16(),
                "request failed"
            ),
        }

        let body = ErrorBody {
            code,
            message: &message,
            request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}
