//! Process-wide table of live sessions, used to route posted messages.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Opaque session identifier, rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Maps session ids to the inbound side of each session.
///
/// Entries are weak: the owning bridge holds the only strong sender, so an
/// entry stops resolving as soon as its session is gone even before
/// [`SessionRegistry::remove`] runs.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, mpsc::WeakSender<JsonRpcMessage>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: SessionId, inbound: &mpsc::Sender<JsonRpcMessage>) {
        self.sessions.insert(id, inbound.downgrade());
    }

    /// Returns `true` if an entry was removed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Whether `id` resolves to a live session.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.resolve(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Queue `message` on the inbound stream of session `id`.
    ///
    /// Unknown or closed sessions are logged and reported as
    /// [`McpError::SessionNotFound`].
    pub async fn forward(&self, id: &SessionId, message: JsonRpcMessage) -> McpResult<()> {
        let Some(inbound) = self.resolve(id) else {
            tracing::warn!("Dropping message for unknown session {id}");
            return Err(McpError::SessionNotFound(id.to_string()));
        };

        inbound.send(message).await.map_err(|_| {
            tracing::warn!("Dropping message for closed session {id}");
            McpError::SessionNotFound(id.to_string())
        })
    }

    // The map guard is released before returning so callers can await.
    fn resolve(&self, id: &SessionId) -> Option<mpsc::Sender<JsonRpcMessage>> {
        self.sessions.get(id).and_then(|entry| entry.value().upgrade())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonRpcNotification;

    fn initialized() -> JsonRpcMessage {
        JsonRpcMessage::Notification(JsonRpcNotification::new("notifications/initialized", None))
    }

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(text.parse::<SessionId>().unwrap(), id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[tokio::test]
    async fn test_forward_to_live_session() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        let id = SessionId::new();
        registry.insert(id, &tx);

        registry.forward(&id, initialized()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.method(), Some("notifications/initialized"));
    }

    #[tokio::test]
    async fn test_forward_to_unknown_session() {
        let registry = SessionRegistry::new();
        let err = registry.forward(&SessionId::new(), initialized()).await.unwrap_err();
        assert!(matches!(err, McpError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_resolving() {
        let registry = SessionRegistry::new();
        let (tx, rx) = mpsc::channel(4);
        let id = SessionId::new();
        registry.insert(id, &tx);
        assert!(registry.contains(&id));

        drop(tx);
        drop(rx);
        assert!(!registry.contains(&id));
        assert!(registry.forward(&id, initialized()).await.is_err());

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_insert_and_remove() {
        let registry = SessionRegistry::new();
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (tx, _rx) = mpsc::channel::<JsonRpcMessage>(1);
                let id = SessionId::new();
                registry.insert(id, &tx);
                assert!(registry.contains(&id));
                assert!(registry.remove(&id));
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(registry.len(), 0);
    }
}
