use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use relay_core::{SubmitError, UpgradeError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::connection;
use crate::registry::ClientRegistry;
use crate::submission::SubmissionLog;

/// Shared application state passed to Axum handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub registry: Arc<ClientRegistry>,
    pub submissions: Arc<SubmissionLog>,
}

/// Build the Axum router with all routes.
///
/// Origins are not checked; any page may open the socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/send", post(send_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind the listener and serve in the background.
pub async fn start(config: ServerConfig) -> Result<ServerHandle, std::io::Error> {
    let state = AppState::default();
    let router = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "Relay server started");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "server stopped");
        }
    });

    Ok(ServerHandle {
        addr: local_addr,
        state,
        _server: server,
    })
}

/// Handle returned by `start()`; keeps the serve task alive.
pub struct ServerHandle {
    pub addr: SocketAddr,
    state: AppState,
    _server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.state.registry
    }

    pub fn submissions(&self) -> &Arc<SubmissionLog> {
        &self.state.submissions
    }
}

/// GET /ws
async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            let err = UpgradeError(rejection.body_text());
            tracing::warn!(error = %err, "error during connection upgrade");
            return rejection.into_response();
        }
    };

    ws.on_failed_upgrade(|e: axum::Error| {
        let err = UpgradeError(e.to_string());
        tracing::warn!(error = %err, "error during connection upgrade");
    })
    .on_upgrade(move |socket| connection::handle_socket(socket, state.registry))
}

/// POST /send
async fn send_handler(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let total = state.submissions.submit(&body).map_err(|e| {
        tracing::warn!(error = %e, error_kind = e.error_kind(), "error decoding message");
        ApiError(e)
    })?;
    tracing::debug!(total, "message submitted");
    Ok(StatusCode::OK)
}

/// HTTP face of a rejected submission.
#[derive(Debug)]
pub struct ApiError(pub SubmitError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        (status, self.0.to_string()).into_response()
    }
}
