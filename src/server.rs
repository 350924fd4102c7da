use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::{RelayError, Result};
use crate::llm::CompletionProvider;
use crate::relay::ConversationRelay;

/// HTTP front of a [`ConversationRelay`].
pub struct RelayServer<P: CompletionProvider + 'static> {
    relay: Arc<ConversationRelay<P>>,
    strict_status: bool,
}

impl<P: CompletionProvider + 'static> Clone for RelayServer<P> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            strict_status: self.strict_status,
        }
    }
}

impl<P: CompletionProvider + 'static> RelayServer<P> {
    pub fn new(relay: Arc<ConversationRelay<P>>) -> Self {
        Self {
            relay,
            strict_status: false,
        }
    }

    /// With `true`, invalid input answers 400 and provider failures 502.
    /// Otherwise every relay outcome answers 200.
    pub fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/ai-endpoint", post(chat::<P>))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.clone())
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener, shutdown_signal()).await
    }

    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %listener.local_addr()?, "server listening");
        axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    fn error_response(&self, err: RelayError) -> Response {
        let status = match &err {
            _ if !self.strict_status => StatusCode::OK,
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            err if err.is_provider_failure() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &err {
            RelayError::InvalidInput(_) => info!(error = %err, "rejected chat request"),
            // The relay already logged the failure with the user id.
            err if err.is_provider_failure() => debug!(code = err.code(), "relay call failed"),
            _ => error!(error = %err, "relay call failed"),
        }
        (status, Json(ChatResponse::failure(&err))).into_response()
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    error: Option<String>,
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl ChatResponse {
    fn answer(answer: String) -> Self {
        Self {
            error: None,
            answer: Some(answer),
            code: None,
        }
    }

    fn failure(err: &RelayError) -> Self {
        Self {
            error: Some(err.public_message()),
            answer: None,
            code: Some(err.code()),
        }
    }
}

async fn chat<P: CompletionProvider + 'static>(
    State(state): State<RelayServer<P>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let user_id = req.user_id.unwrap_or_default();
    let message = req.message.unwrap_or_default();
    info!(user_id = %user_id, "incoming chat request");

    match state.relay.send(&user_id, &message).await {
        Ok(answer) => Json(ChatResponse::answer(answer)).into_response(),
        Err(err) => state.error_response(err),
    }
}
