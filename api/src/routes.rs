use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use paper_analyzer::{ErrorResponse, PipelineReport, StudyPipeline, UploadedDocument};
use serde_json::json;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::render::Renderer;
use crate::upload::read_uploads;

pub struct AppState {
    pipeline: StudyPipeline,
    renderer: Renderer,
    // one analysis at a time
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(pipeline: StudyPipeline) -> Result<Self, minijinja::Error> {
        Ok(Self {
            pipeline,
            renderer: Renderer::new()?,
            run_lock: Mutex::new(()),
        })
    }

    async fn analyze(&self, uploads: Vec<UploadedDocument>) -> PipelineReport {
        let _guard = self.run_lock.lock().await;
        self.pipeline.run(uploads).await
    }
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_page))
        .route("/api/analyze", post(analyze_json))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

fn render_failure(e: minijinja::Error) -> Response {
    log::error!("Template rendering failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    match state.renderer.index(state.pipeline.settings()) {
        Ok(page) => Html(page).into_response(),
        Err(e) => render_failure(e),
    }
}

async fn analyze_page(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let uploads = match read_uploads(multipart).await {
        Ok(uploads) => uploads,
        Err(e) => {
            log::warn!("Rejected upload: {}", e);
            return (e.status(), format!("Could not read the uploaded files: {}", e.body_text()))
                .into_response();
        }
    };

    let report = state.analyze(uploads).await;
    match state.renderer.results(&report) {
        Ok(page) => Html(page).into_response(),
        Err(e) => render_failure(e),
    }
}

async fn analyze_json(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let uploads = match read_uploads(multipart).await {
        Ok(uploads) => uploads,
        Err(e) => {
            log::warn!("Rejected upload: {}", e);
            let body = ErrorResponse {
                status: "error".to_string(),
                error: e.body_text(),
            };
            return (e.status(), Json(body)).into_response();
        }
    };

    let report = state.analyze(uploads).await;
    let status = if report.is_rendered() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(report)).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
