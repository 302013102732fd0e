//! Session bridge — one per accepted SSE connection.
//!
//! Pairs the connection's outbound event stream with an inbound message
//! channel fed by the message endpoint, runs the handshake, and dispatches
//! inbound calls in arrival order until the peer goes away.

use serde_json::Value;
use tokio::sync::mpsc;

use pe_percentile::PercentileLookup;

use crate::protocol::handler::{error_value, PRE_INIT_METHODS};
use crate::protocol::ProtocolHandler;
use crate::transport::framing::OutboundFrame;
use crate::types::{JsonRpcMessage, McpError, McpResult};

use super::registry::{SessionId, SessionRegistry};

const INBOUND_CAPACITY: usize = 32;
const OUTBOUND_CAPACITY: usize = 32;

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    HandshakeSent,
    Active,
    Closed,
}

pub struct SessionBridge {
    id: SessionId,
    state: SessionState,
    endpoint: String,
    handler: ProtocolHandler,
    registry: SessionRegistry,
    // Only strong sender; the registry keeps a weak one.
    inbound_tx: Option<mpsc::Sender<JsonRpcMessage>>,
    inbound_rx: mpsc::Receiver<JsonRpcMessage>,
    outbound: mpsc::Sender<OutboundFrame>,
}

impl SessionBridge {
    /// Allocate a session and register it.
    ///
    /// `messages_path` is the message endpoint path; the session id is
    /// appended as the `session_id` query parameter. The returned receiver
    /// is the outbound stream; dropping it is how a disconnect is signalled.
    pub fn open(
        registry: &SessionRegistry,
        lookup: PercentileLookup,
        messages_path: &str,
    ) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let id = SessionId::new();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

        registry.insert(id, &inbound_tx);
        tracing::info!("Session {id} opened ({} active)", registry.len());

        let bridge = Self {
            id,
            state: SessionState::Init,
            endpoint: format!("{messages_path}?session_id={id}"),
            handler: ProtocolHandler::new(lookup),
            registry: registry.clone(),
            inbound_tx: Some(inbound_tx),
            inbound_rx,
            outbound: outbound_tx,
        };

        (bridge, outbound_rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion. Always ends in [`SessionState::Closed`]
    /// with the registry entry removed and both streams released.
    pub async fn run(mut self) -> SessionState {
        if let Err(e) = self.handshake().await {
            tracing::warn!("Session {} handshake failed: {e}", self.id);
            return self.close();
        }

        loop {
            let message = tokio::select! {
                biased;
                _ = self.outbound.closed() => {
                    tracing::info!("Session {} disconnected", self.id);
                    break;
                }
                message = self.inbound_rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            // Abandon an in-flight call if the peer leaves mid-dispatch.
            let response = tokio::select! {
                biased;
                _ = self.outbound.closed() => {
                    tracing::info!("Session {} disconnected during dispatch", self.id);
                    break;
                }
                response = self.dispatch(message) => response,
            };

            if let Some(value) = response {
                if let Err(e) = self.write(OutboundFrame::Message(value)).await {
                    tracing::warn!("Session {} fault: {e}", self.id);
                    break;
                }
            }

            if self.state == SessionState::HandshakeSent && self.handler.is_initialized().await {
                self.state = SessionState::Active;
                tracing::debug!("Session {} active", self.id);
            }
        }

        self.close()
    }

    async fn handshake(&mut self) -> McpResult<()> {
        self.write(OutboundFrame::Endpoint(self.endpoint.clone()))
            .await?;
        self.state = SessionState::HandshakeSent;
        Ok(())
    }

    async fn dispatch(&self, message: JsonRpcMessage) -> Option<Value> {
        if self.state == SessionState::HandshakeSent {
            if let JsonRpcMessage::Request(req) = &message {
                if !PRE_INIT_METHODS.contains(&req.method.as_str()) {
                    tracing::warn!(
                        "Session {} rejected {} before initialization",
                        self.id,
                        req.method
                    );
                    let err = McpError::SessionNotInitialized(req.method.clone());
                    return Some(error_value(&err, req.id.clone()));
                }
            }
        }

        self.handler.handle_message(message).await
    }

    async fn write(&self, frame: OutboundFrame) -> McpResult<()> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| McpError::Transport("outbound stream closed".to_string()))
    }

    /// Consumes the bridge, so nothing can be written after `Closed`.
    fn close(mut self) -> SessionState {
        self.release();
        self.state
    }

    fn release(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.registry.remove(&self.id);
        self.inbound_tx = None;
        self.inbound_rx.close();
        self.state = SessionState::Closed;
        tracing::info!("Session {} closed ({} active)", self.id, self.registry.len());
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        // Covers an aborted `run` task.
        self.release();
    }
}
