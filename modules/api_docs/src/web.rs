use std::path::PathBuf;
use std::sync::Arc;

use apidoc::OpenApiDoc;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::assets;
use crate::doc_cache::DocCache;
use crate::error::AppError;
use crate::request_id;

/// Shared state of the documentation endpoints.
#[derive(Clone)]
pub struct DocsState {
    pub doc: Arc<RwLock<OpenApiDoc>>,
    pub cache: Arc<DocCache>,
    pub base_path: String,
    pub docs_dir: Option<PathBuf>,
}

impl DocsState {
    fn json_url(&self) -> String {
        format!("{}/docs/openapi.json", self.base_path)
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn openapi_json(
    State(state): State<DocsState>,
    headers: HeaderMap,
) -> Response {
    match state.cache.get_or_build(&state.doc) {
        Ok(cached) => (
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            cached.json.clone(),
        )
            .into_response(),
        Err(e) => {
            let rid = headers
                .get(request_id::header())
                .and_then(|v| v.to_str().ok());
            AppError::from(e).into_response_with(rid)
        }
    }
}

async fn docs_redirect(State(state): State<DocsState>) -> Redirect {
    Redirect::to(&format!("{}/docs/", state.base_path))
}

async fn docs_index(State(state): State<DocsState>) -> Response {
    if let Some(dir) = &state.docs_dir {
        if let Ok(resp) = assets::serve_file(dir, "index.html").await {
            return resp;
        }
        tracing::debug!(dir = %dir.display(), "No index.html in docs_dir, using built-in page");
    }
    Html(builtin_page(&state.json_url())).into_response()
}

async fn docs_asset(
    State(state): State<DocsState>,
    Path(file): Path<String>,
) -> Result<Response, StatusCode> {
    match &state.docs_dir {
        Some(dir) => assets::serve_file(dir, &file).await,
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Stoplight Elements loaded from the CDN.
fn builtin_page(spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>API Docs</title>
  <script src="https://unpkg.com/@stoplight/elements@latest/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@latest/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="{spec_url}" router="hash" layout="sidebar"></elements-api>
</body>
</html>"#
    )
}

/// `{base}/docs`, `{base}/docs/`, `{base}/docs/openapi.json` and `{base}/docs/{*file}`.
pub fn docs_router(state: DocsState) -> Router {
    let base = state.base_path.clone();
    Router::new()
        .route(&format!("{base}/docs"), get(docs_redirect))
        .route(&format!("{base}/docs/"), get(docs_index))
        .route(&format!("{base}/docs/openapi.json"), get(openapi_json))
        .route(&format!("{base}/docs/{{*file}}"), get(docs_asset))
        .with_state(state)
}
