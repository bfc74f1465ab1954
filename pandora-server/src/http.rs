//! Pandora HTTP REST API
//!
//! Axum-based HTTP server exposing the story capabilities.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a
//! directly-testable inner function returning `(StatusCode, serde_json::Value)`.
//!
//! Endpoints:
//! - GET  /               — welcome message
//! - GET  /health         — health check with DB status
//! - POST /generate_story — generate a story and persist it
//! - GET  /get_stories    — list every stored story
//! - PUT  /update_story   — overwrite the text of a stored story
//! - POST /enhance_story  — refine text with a storytelling technique
//! - POST /polish_story   — apply polish options to text
//!
//! Every downstream failure (provider or store) returns HTTP 500 with the
//! body `{"detail": <underlying message>}` — the uniform service error.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use pandora_core::generation::GenerationBackend;
use pandora_core::models::story::StoryDraft;
use pandora_core::PandoraConfig;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::capabilities::{generate, refine, stories};

/// Shared state for all HTTP handlers. The pool and the generation client
/// are built once at startup and injected here.
#[derive(Clone)]
pub struct HttpState {
    pub pool: PgPool,
    pub generator: Arc<dyn GenerationBackend>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/generate_story", post(generate_story_handler))
        .route("/get_stories", get(get_stories_handler))
        .route("/update_story", put(update_story_handler))
        .route("/enhance_story", post(enhance_story_handler))
        .route("/polish_story", post(polish_story_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    pool: PgPool,
    generator: Arc<dyn GenerationBackend>,
    config: PandoraConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { pool, generator });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Pandora HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStoryRequest {
    pub story_id: i64,
    pub story_text: String,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceStoryRequest {
    pub story_text: String,
    pub enhancement_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PolishStoryRequest {
    pub story_text: String,
    pub polish_options: Vec<String>,
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Uniform downstream-failure response: 500 with the underlying message.
pub fn error_detail(err: impl std::fmt::Display) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "detail": err.to_string() }),
    )
}

/// Inner root — welcome message (pure, no IO).
pub fn root_inner() -> serde_json::Value {
    serde_json::json!({ "message": "Welcome to Pandora's AI Story Bot API!" })
}

/// Inner health check — queries DB and returns (status_code, json_body).
pub async fn health_inner(pool: &PgPool) -> (StatusCode, serde_json::Value) {
    let pg_ver = match pandora_core::db::health_check(pool).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    let stories = match pandora_core::db::count_stories(pool).await {
        Ok(n) => serde_json::json!(n),
        Err(e) => serde_json::json!(format!("unavailable: {}", e)),
    };

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "postgresql": pg_ver,
            "stories": stories,
        }),
    )
}

/// Inner generate — prompt, provider call, insert, story text back.
pub async fn generate_story_inner(
    pool: &PgPool,
    generator: &dyn GenerationBackend,
    draft: StoryDraft,
) -> (StatusCode, serde_json::Value) {
    match generate::generate_story(pool, generator, draft).await {
        Ok(story) => (StatusCode::OK, serde_json::json!({ "story": story })),
        Err(e) => error_detail(e),
    }
}

/// Inner list — every stored story, unfiltered.
pub async fn get_stories_inner(pool: &PgPool) -> (StatusCode, serde_json::Value) {
    match stories::list_stories(pool).await {
        Ok(records) => (StatusCode::OK, serde_json::json!({ "stories": records })),
        Err(e) => error_detail(e),
    }
}

/// Inner update — overwrite story text by id. Success is reported whether or
/// not the id matched a row.
pub async fn update_story_inner(
    pool: &PgPool,
    req: UpdateStoryRequest,
) -> (StatusCode, serde_json::Value) {
    match stories::update_story_text(pool, req.story_id, &req.story_text).await {
        Ok(_affected) => (
            StatusCode::OK,
            serde_json::json!({ "message": "Story updated successfully" }),
        ),
        Err(e) => error_detail(e),
    }
}

/// Inner enhance — stateless provider round trip.
pub async fn enhance_story_inner(
    generator: &dyn GenerationBackend,
    req: EnhanceStoryRequest,
) -> (StatusCode, serde_json::Value) {
    match refine::enhance_story(generator, &req.story_text, &req.enhancement_type).await {
        Ok(enhanced) => (
            StatusCode::OK,
            serde_json::json!({ "enhanced_story": enhanced }),
        ),
        Err(e) => error_detail(e),
    }
}

/// Inner polish — stateless provider round trip.
pub async fn polish_story_inner(
    generator: &dyn GenerationBackend,
    req: PolishStoryRequest,
) -> (StatusCode, serde_json::Value) {
    match refine::polish_story(generator, &req.story_text, &req.polish_options).await {
        Ok(polished) => (
            StatusCode::OK,
            serde_json::json!({ "polished_story": polished }),
        ),
        Err(e) => error_detail(e),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

pub async fn generate_story_handler(
    State(state): State<Arc<HttpState>>,
    Json(draft): Json<StoryDraft>,
) -> impl IntoResponse {
    let (status, body) = generate_story_inner(&state.pool, state.generator.as_ref(), draft).await;
    (status, Json(body))
}

pub async fn get_stories_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = get_stories_inner(&state.pool).await;
    (status, Json(body))
}

pub async fn update_story_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<UpdateStoryRequest>,
) -> impl IntoResponse {
    let (status, body) = update_story_inner(&state.pool, req).await;
    (status, Json(body))
}

pub async fn enhance_story_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<EnhanceStoryRequest>,
) -> impl IntoResponse {
    let (status, body) = enhance_story_inner(state.generator.as_ref(), req).await;
    (status, Json(body))
}

pub async fn polish_story_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<PolishStoryRequest>,
) -> impl IntoResponse {
    let (status, body) = polish_story_inner(state.generator.as_ref(), req).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
