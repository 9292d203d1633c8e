use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::llm::{ChatError, ChatOrchestrator, Message};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<ChatOrchestrator>,
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
}

/// Create and configure the API router
pub fn create_api(orchestrator: ChatOrchestrator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(conversation): Json<Vec<Message>>,
) -> Response {
    match state.orchestrator.respond(conversation).await {
        Ok(stream) => {
            let body = Body::from_stream(stream.map(|fragment| fragment.map(Bytes::from)));

            match Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(body)
            {
                Ok(response) => response,
                Err(e) => {
                    log::error!("Failed to build streaming response: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        Err(e) => error_response(e),
    }
}

fn error_response(error: ChatError) -> Response {
    let status = match &error {
        ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ChatError::Upstream(_) | ChatError::Stream(_) => StatusCode::BAD_GATEWAY,
    };

    log::error!("Chat request failed: {}", error);

    (
        status,
        Json(ApiResponse {
            status: error.to_string(),
        }),
    )
        .into_response()
}

async fn health_check() -> Response {
    Json(ApiResponse {
        status: "Server is running and healthy".to_string(),
    })
    .into_response()
}
