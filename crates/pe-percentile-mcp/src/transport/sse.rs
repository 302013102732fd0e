//! SSE transport — HTTP server with the session handshake stream, the
//! message submission endpoint, and health checks.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json as AxumJson, Response,
    },
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use pe_percentile::PercentileLookup;

use crate::protocol::validator::validate_message;
use crate::session::{SessionBridge, SessionId, SessionRegistry};
use crate::types::{McpError, McpResult};

use super::framing::{self, OutboundFrame};

/// Path of the long-lived event stream.
pub const SSE_PATH: &str = "/mcp";
/// Path clients post their messages to.
pub const MESSAGES_PATH: &str = "/mcp/messages/";

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub lookup: PercentileLookup,
    pub registry: SessionRegistry,
}

/// SSE transport for web-based MCP clients.
pub struct SseTransport {
    state: Arc<ServerState>,
}

impl SseTransport {
    pub fn new(lookup: PercentileLookup) -> Self {
        Self {
            state: Arc::new(ServerState {
                lookup,
                registry: SessionRegistry::new(),
            }),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.state.registry
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route(SSE_PATH, get(handle_sse))
            .route(MESSAGES_PATH, post(handle_post_message))
            .route(MESSAGES_PATH.trim_end_matches('/'), post(handle_post_message))
            .route("/", get(handle_health))
            .route("/health", get(handle_health))
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Run the HTTP server on the given address.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("SSE transport listening on http://{addr}{SSE_PATH}");

        axum::serve(listener, app)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Session handshake: opens a session and streams its outbound frames for
/// as long as the client stays connected.
async fn handle_sse(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (bridge, mut outbound) =
        SessionBridge::open(&state.registry, state.lookup.clone(), MESSAGES_PATH);
    let id = bridge.id();
    tokio::spawn(bridge.run());

    let stream = async_stream::stream! {
        while let Some(frame) = outbound.recv().await {
            match to_event(&frame) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::error!("Session {id}: failed to encode frame: {e}"),
            }
        }
        tracing::debug!("Session {id}: event stream finished");
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_event(frame: &OutboundFrame) -> McpResult<Event> {
    Ok(Event::default().event(frame.event()).data(frame.data()?))
}

#[derive(Debug, Default, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

/// Message submission: routes one JSON-RPC frame into its session.
async fn handle_post_message(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(raw_id) = query.session_id else {
        tracing::warn!("Message received without session_id");
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };

    let id: SessionId = match raw_id.parse() {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Received invalid session ID: {raw_id}");
            return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
        }
    };

    let message = match std::str::from_utf8(&body)
        .map_err(|e| McpError::ParseError(e.to_string()))
        .and_then(framing::parse_message)
    {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Session {id}: unparsable message: {e}");
            return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
        }
    };

    if let Err(e) = validate_message(&message) {
        tracing::warn!("Session {id}: invalid message: {e}");
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    match state.registry.forward(&id, message).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Could not find session").into_response(),
    }
}

/// Liveness check.
async fn handle_health(State(state): State<Arc<ServerState>>) -> AxumJson<serde_json::Value> {
    AxumJson(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.registry.len(),
    }))
}
