// HTTP handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::error::ApiError;
use super::types::{ChatRequest, Reply};
use super::AppState;
use crate::config::constants::MAX_REPLY_TOKENS;
use crate::server::session::Role;

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/js/chat.js", get(chat_js))
        .route("/chat", post(chat))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

async fn chat_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        include_str!("../../static/js/chat.js"),
    )
}

/// POST /chat - append the user turn, run one generation over the flattened
/// history, and return either a structured or a plain-text reply.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Reply>, ApiError> {
    let session = state.sessions.get_or_create(&request.session_id);

    // The session lock is held across generation so concurrent requests on
    // the same session cannot interleave their turns.
    let mut session = session.lock().await;
    session.push(Role::User, request.message);

    let prompt = session.prompt();
    tracing::debug!(session_id = %request.session_id, prompt_chars = prompt.len(), "Generating");

    let generator = Arc::clone(&state.generator);
    let raw = tokio::task::spawn_blocking(move || generator.generate(&prompt, MAX_REPLY_TOKENS))
        .await
        .map_err(|_| ApiError::TaskCancelled)??;

    // History always stores the raw text, not the parsed form, so later
    // prompts replay the literal prior output.
    session.push(Role::Assistant, raw.clone());

    Ok(Json(Reply::from_raw(&raw)))
}
