//! HTTP endpoints
//!
//! The thin REST surface over the retrieval core. Every `/ask` failure maps
//! to a grounded answer, a Bengali not-found message, or a generic 5xx —
//! never a stack trace.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use bhorti_core::{Error, Reference};
use bhorti_index::load_documents_from_folder;

use crate::state::AppState;

/// Appended to the working query when the client sends none.
const DEFAULT_LANGUAGE_INSTRUCTION: &str = "IMPORTANT: Respond ONLY in the same language as the \
     question. Do NOT mix languages. Give a direct, concise answer only.";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(status))
        .route("/index", post(index_documents))
        .route("/index-folder", post(index_folder))
        .route("/ask", post(ask))
        .route("/debug-retrieval", post(debug_retrieval))
        .route("/graph-stats", get(graph_stats))
        .route("/reload", post(reload));

    if state.settings().server.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Map core errors to HTTP responses.
fn error_response(error: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &error {
        Error::IndexNotLoaded | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = if status == StatusCode::BAD_REQUEST {
        error.to_string()
    } else {
        // Internal details stay in the logs.
        tracing::error!("request failed: {}", error);
        "internal error".to_string()
    };
    (status, Json(serde_json::json!({ "detail": message })))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: String,
    message: String,
    indexed_docs: usize,
}

/// Health check and status.
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    if state.is_ready() {
        Json(StatusResponse {
            status: "ready".to_string(),
            message: "Ready to answer questions.".to_string(),
            indexed_docs: state.indexed_docs(),
        })
    } else {
        Json(StatusResponse {
            status: "not_initialized".to_string(),
            message: "Not initialized. Call /index or /index-folder to load documents."
                .to_string(),
            indexed_docs: 0,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IndexRequest {
    documents: Vec<String>,
}

async fn index_documents(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> impl IntoResponse {
    if request.documents.is_empty() {
        return error_response(Error::InvalidInput("no documents provided".to_string()))
            .into_response();
    }
    match state.index_documents(request.documents).await {
        Ok(indexed_docs) => Json(StatusResponse {
            status: "success".to_string(),
            message: format!("Successfully indexed {} documents.", indexed_docs),
            indexed_docs,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct IndexFolderRequest {
    folder_path: Option<String>,
}

async fn index_folder(
    State(state): State<AppState>,
    Json(request): Json<IndexFolderRequest>,
) -> impl IntoResponse {
    let folder = request
        .folder_path
        .unwrap_or_else(|| state.settings().paths.documents_dir.clone());

    let documents = match load_documents_from_folder(std::path::Path::new(&folder)) {
        Ok(docs) => docs,
        Err(e) => return error_response(e.into()).into_response(),
    };
    if documents.is_empty() {
        return error_response(Error::InvalidInput(format!(
            "no documents found in {}",
            folder
        )))
        .into_response();
    }

    match state.index_documents(documents).await {
        Ok(indexed_docs) => Json(StatusResponse {
            status: "success".to_string(),
            message: format!("Successfully indexed {} chunks from {}", indexed_docs, folder),
            indexed_docs,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct QuestionRequest {
    question: String,
    language_instruction: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnswerResponse {
    question: String,
    answer: String,
    references: Vec<Reference>,
}

/// Ask a question and get a grounded answer with references.
async fn ask(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
    let pipeline = match state.pipeline() {
        Ok(pipeline) => pipeline,
        Err(e) => return error_response(e).into_response(),
    };

    let instruction = request
        .language_instruction
        .unwrap_or_else(|| DEFAULT_LANGUAGE_INSTRUCTION.to_string());

    match pipeline.ask(&request.question, Some(&instruction)).await {
        Ok(outcome) => Json(AnswerResponse {
            question: outcome.question,
            answer: outcome.answer,
            references: outcome.references,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Retrieval diagnostics without synthesis.
async fn debug_retrieval(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
    let pipeline = match state.pipeline() {
        Ok(pipeline) => pipeline,
        Err(e) => return error_response(e).into_response(),
    };
    match pipeline.debug_retrieval(&request.question).await {
        Ok(debug) => Json(debug).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Knowledge graph statistics.
async fn graph_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine() {
        Some(engine) => Json(engine.graph_stats()).into_response(),
        None => error_response(Error::IndexNotLoaded).into_response(),
    }
}

/// Reload indices from disk.
async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload() {
        Ok(indexed_docs) => Json(StatusResponse {
            status: "success".to_string(),
            message: "Reloaded from cache.".to_string(),
            indexed_docs,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
