use std::path::{Component, Path, PathBuf};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::platform::http::SharedState;

const INDEX_FILE: &str = "index.html";

/// Candidates for a front-end route, in order: the file itself,
/// `<path>.html`, `<path>/index.html`, then the root `index.html`.
pub fn resolve_static(static_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let base = static_dir.join(relative);
    let mut html = base.clone().into_os_string();
    html.push(".html");

    [
        base.clone(),
        PathBuf::from(html),
        base.join(INDEX_FILE),
        static_dir.join(INDEX_FILE),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

pub async fn serve_file(path: PathBuf, req: Request) -> Response {
    match ServeFile::new(path).oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}

pub async fn spa_fallback(State(state): State<SharedState>, req: Request) -> Response {
    let Some(static_dir) = state.static_dir.as_deref().filter(|dir| dir.is_dir()) else {
        return not_found().await;
    };
    match resolve_static(static_dir, req.uri().path()) {
        Some(path) => serve_file(path, req).await,
        None => not_found().await,
    }
}
