// Chat server
//
// Loads the model once at startup (fine-tuned directory if present,
// otherwise the pretrained checkpoint from the Hub), then serves the chat
// endpoint over axum. The model is shared read-only across requests.

mod error;
mod handlers;
mod session;
mod types;

pub use error::ApiError;
pub use handlers::create_router;
pub use session::{Role, Session, SessionManager, Turn};
pub use types::{ChatRequest, Reply};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::model::{Generate, ModelDownloader, T5Generator};

/// Shared application state: the generator and the session store.
pub struct AppState {
    pub generator: Arc<dyn Generate>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(generator: Arc<dyn Generate>, sessions: SessionManager) -> Self {
        Self {
            generator,
            sessions,
        }
    }
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> Result<()> {
    let addr: SocketAddr = config.bind_address.parse()?;

    let model_dir = if config.model_dir.join("model.safetensors").exists() {
        tracing::info!(dir = %config.model_dir.display(), "Using fine-tuned model");
        config.model_dir.clone()
    } else {
        tracing::info!(model_id = %config.model_id, "Fine-tuned model not found, using pretrained");
        ModelDownloader::new(config.hf_token.clone()).fetch(&config.model_id)?
    };

    // Model loading is the slow part of startup; do it before binding so a
    // bad checkpoint fails fast.
    let generator = T5Generator::load(&model_dir)?;

    let state = Arc::new(AppState::new(
        Arc::new(generator),
        SessionManager::new(config.max_sessions, config.session_timeout_minutes),
    ));

    let app = create_router(state)
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting MedChat server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
