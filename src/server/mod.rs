//! HTTP server
//!
//! Front-end-facing API over the session manager and retrieval index.
//! Handlers call the same functions the CLI uses; session operations are
//! synchronous and run via `spawn_blocking` so request workers stay free.

use crate::app::AppContext;
use crate::config::TimeoutConfig;
use crate::rag::{RagSystem, Relevance};
use crate::session::{SessionError, SessionManager};
use crate::tool::ToolRegistry;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub rag: Arc<RagSystem>,
    pub tools: Arc<ToolRegistry>,
    pub timeouts: TimeoutConfig,
}

pub async fn serve(ctx: AppContext) -> Result<()> {
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&ctx.provider),
        Arc::clone(&ctx.tools),
        ctx.config.orchestrator.max_iterations,
    )?);

    let state = AppState {
        manager,
        rag: Arc::clone(&ctx.rag),
        tools: Arc::clone(&ctx.tools),
        timeouts: ctx.config.timeouts.clone(),
    };

    let app = Router::new()
        .route("/api/initialize", post(initialize))
        .route("/api/query", post(query))
        .route("/api/tools", get(tools))
        .route("/api/documents", post(documents))
        .route("/api/search", post(search))
        .route("/api/clear", post(clear))
        .route("/api/sessions", get(sessions))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind = ctx.config.server.bind.clone();
    tracing::info!(%bind, "Starting API server");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

type ApiError = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn session_error_response(error: SessionError) -> ApiError {
    let status = match &error {
        SessionError::NotInitialized(_) => StatusCode::BAD_REQUEST,
        SessionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        SessionError::Query(_) => StatusCode::BAD_GATEWAY,
        SessionError::Scheduler(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}

#[derive(Deserialize)]
struct InitializeRequest {
    session_id: Option<String>,
}

#[derive(Serialize)]
struct InitializeResponse {
    session_id: String,
}

async fn initialize(
    State(state): State<AppState>,
    Json(request): Json<InitializeRequest>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let timeout = Duration::from_secs(state.timeouts.create_secs);

    let manager = Arc::clone(&state.manager);
    let id = session_id.clone();
    tokio::task::spawn_blocking(move || manager.create(&id, timeout))
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(session_error_response)?;

    Ok(Json(InitializeResponse { session_id }))
}

#[derive(Deserialize)]
struct QueryRequest {
    session_id: String,
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    response: String,
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "query must not be empty"));
    }

    let timeout = Duration::from_secs(state.timeouts.query_secs);
    let manager = Arc::clone(&state.manager);
    let response = tokio::task::spawn_blocking(move || {
        manager.query(&request.session_id, &request.query, timeout)
    })
    .await
    .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(session_error_response)?;

    Ok(Json(QueryResponse { response }))
}

async fn tools(State(state): State<AppState>) -> Json<Value> {
    let catalog: Vec<Value> = state
        .tools
        .list()
        .iter()
        .map(|t| {
            json!({
                "name": t.name(),
                "description": t.description(),
                "parameters": t.parameters(),
            })
        })
        .collect();
    Json(json!({ "tools": catalog }))
}

#[derive(Deserialize)]
struct DocumentsRequest {
    path: String,
}

async fn documents(
    State(state): State<AppState>,
    Json(request): Json<DocumentsRequest>,
) -> Result<Json<Value>, ApiError> {
    let path = Path::new(&request.path);
    let report = if path.is_dir() {
        let report = state
            .rag
            .index_directory(path, true)
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
        json!({ "chunks_added": report.total_chunks, "files_indexed": report.indexed })
    } else {
        let report = state
            .rag
            .index_document(path)
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
        json!({ "chunks_added": report.chunks_indexed })
    };
    Ok(Json(report))
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    n_results: Option<usize>,
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Json<Value> {
    let hits = state.rag.search(&request.query, request.n_results.unwrap_or(5));
    let results: Vec<Value> = hits
        .into_iter()
        .map(|hit| {
            json!({
                "rank": hit.rank,
                "text": hit.text,
                "score": hit.score,
                "relevance": Relevance::from_score(hit.score).to_string(),
                "source": hit.metadata.file_name,
                "chunk_index": hit.metadata.chunk_index,
            })
        })
        .collect();
    Json(json!({ "results": results }))
}

#[derive(Deserialize)]
struct ClearRequest {
    session_id: String,
}

async fn clear(
    State(state): State<AppState>,
    Json(request): Json<ClearRequest>,
) -> Result<Json<Value>, ApiError> {
    let timeout = Duration::from_secs(state.timeouts.destroy_secs);
    let manager = Arc::clone(&state.manager);
    tokio::task::spawn_blocking(move || manager.destroy(&request.session_id, timeout))
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({ "status": "cleared" })))
}

async fn sessions(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sessions": state.manager.list() }))
}
