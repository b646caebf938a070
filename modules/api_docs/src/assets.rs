use std::path::{Component, Path, PathBuf};

use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Resolve `file` inside `dir`. Anything other than plain segments is rejected.
pub fn map_path(dir: &Path, file: &str) -> Option<PathBuf> {
    let mut path = dir.to_path_buf();
    let mut pushed = false;
    for comp in Path::new(file.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(s) => {
                path.push(s);
                pushed = true;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    pushed.then_some(path)
}

pub fn content_type_for(file: &str) -> &'static str {
    let ext = file.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" | "map" => "application/json; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

/// Read `file` from `dir` and respond with it, or 404.
pub async fn serve_file(dir: &Path, file: &str) -> Result<Response, StatusCode> {
    let Some(path) = map_path(dir, file) else {
        tracing::warn!(file, "Rejected docs asset path");
        return Err(StatusCode::NOT_FOUND);
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, content_type_for(file))],
            Bytes::from(bytes),
        )
            .into_response()),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Docs asset not found");
            Err(StatusCode::NOT_FOUND)
        }
    }
}
