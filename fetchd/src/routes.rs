//! HTTP front end: thin glue between the routes and the engine.

use crate::config::Folders;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use fetch_engine::{DownloadError, DownloadSnapshot, FetchRequest, Orchestrator, Registry};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub registry: Arc<Registry>,
    pub folders: Arc<Folders>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/download", get(start_download))
        .route("/download/private", get(start_private))
        .route("/status", get(status))
        .route("/clear", get(clear))
        .route("/retry", get(retry))
        .route("/health", get(health))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!("{} - {}", request.method(), request.uri());
    next.run(request).await
}

#[derive(Deserialize)]
struct StartParams {
    url: String,
    #[serde(alias = "fileName")]
    filename: Option<String>,
    folder: Option<String>,
}

#[derive(Deserialize)]
struct RetryParams {
    id: Uuid,
}

async fn start_download(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> Response {
    let selector = params.folder.clone();
    start_fetch(&state, selector.as_deref(), params)
}

/// Legacy endpoint pinned to the `private` folder entry.
async fn start_private(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> Response {
    start_fetch(&state, Some("private"), params)
}

fn start_fetch(state: &AppState, selector: Option<&str>, params: StartParams) -> Response {
    let Some(dir) = state.folders.resolve(selector) else {
        return (StatusCode::BAD_REQUEST, "unknown folder").into_response();
    };
    let Some(url) = decode_url(&params.url) else {
        return (StatusCode::BAD_REQUEST, "invalid url").into_response();
    };

    let id = state.orchestrator.start(FetchRequest {
        url,
        file_name: params.filename.filter(|name| !name.is_empty()),
        dir: dir.to_path_buf(),
    });
    Json(serde_json::json!({ "id": id })).into_response()
}

async fn status(State(state): State<AppState>) -> Json<Vec<DownloadSnapshot>> {
    Json(
        state
            .registry
            .get_all()
            .iter()
            .map(|download| download.snapshot())
            .collect(),
    )
}

async fn clear(State(state): State<AppState>) -> StatusCode {
    state.registry.clear();
    StatusCode::NO_CONTENT
}

async fn retry(State(state): State<AppState>, Query(params): Query<RetryParams>) -> Response {
    match state.orchestrator.retry(params.id) {
        Ok(()) => "ok".into_response(),
        Err(err @ DownloadError::AlreadyRunning(_)) => {
            (StatusCode::CONFLICT, err.to_string()).into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Accepts the target either as a literal URL or as base64 of one; both
/// request forms are in use by existing clients. A parseable literal wins.
fn decode_url(raw: &str) -> Option<String> {
    if Url::parse(raw).is_ok() {
        return Some(raw.to_string());
    }
    let bytes = BASE64.decode(raw.trim()).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    Url::parse(&decoded).ok()?;
    Some(decoded)
}
