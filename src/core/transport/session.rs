//! SSE-bound MCP sessions.
//!
//! Each `GET /sse` connection owns one session: a fresh [`McpServer`] handler
//! served over an in-memory duplex pipe, exactly as the stdio transport
//! serves it over stdin/stdout. Messages posted to `/message?sessionId=...`
//! are written into the pipe; whatever the handler writes back is relayed to
//! the connection as SSE `message` events.
//!
//! The registry only routes posted messages to the right pipe. Sessions share
//! nothing else, and dropping an [`SseSession`] unregisters it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rmcp::ServiceExt;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::McpServer;

/// In-memory pipe capacity per session, in bytes.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Queued messages per direction.
const CHANNEL_CAPACITY: usize = 32;

/// Why a message could not be handed to a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("no open session with id {0}")]
    UnknownSession(String),

    #[error("session {0} is closed")]
    Closed(String),

    #[error("session {0} is not keeping up; retry later")]
    Busy(String),
}

/// Routing table from session id to the session's inbound queue.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, mpsc::Sender<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session served by `server`.
    pub fn open(self: &Arc<Self>, server: McpServer) -> SseSession {
        let id = Uuid::new_v4().to_string();

        let (server_io, client_io) = tokio::io::duplex(PIPE_CAPACITY);
        let (client_read, mut client_write) = tokio::io::split(client_io);
        let (inbound_tx, mut inbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        let session_id = id.clone();
        tokio::spawn(async move {
            let service = match server.serve(server_io).await {
                Ok(service) => service,
                Err(e) => {
                    warn!("Session {} failed to initialize: {}", session_id, e);
                    return;
                }
            };
            info!("Session {} initialized", session_id);
            match service.waiting().await {
                Ok(reason) => info!("Session {} finished: {:?}", session_id, reason),
                Err(e) => warn!("Session {} ended with error: {}", session_id, e),
            }
        });

        tokio::spawn(async move {
            while let Some(message) = inbound_rx.recv().await {
                let written = async {
                    client_write.write_all(message.as_bytes()).await?;
                    client_write.write_all(b"\n").await?;
                    client_write.flush().await
                };
                if let Err(e) = written.await {
                    debug!("Session pipe closed while writing: {}", e);
                    break;
                }
            }
            let _ = client_write.shutdown().await;
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(client_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if outbound_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        self.lock().insert(id.clone(), inbound_tx);
        info!("Opened session {} ({} open)", id, self.len());

        SseSession {
            outbound: outbound_rx,
            guard: SessionGuard {
                id,
                registry: Arc::clone(self),
            },
        }
    }

    /// Whether a session with this id is currently open.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand one JSON-RPC message (a single line) to a session.
    ///
    /// Never waits: when the session's inbound queue is full (its SSE client
    /// stopped reading and the pipe backed up) the message is refused with
    /// [`DeliveryError::Busy`].
    pub fn deliver(&self, id: &str, message: String) -> Result<(), DeliveryError> {
        let sessions = self.lock();
        let sender = sessions
            .get(id)
            .ok_or_else(|| DeliveryError::UnknownSession(id.to_string()))?;

        sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Busy(id.to_string()),
            TrySendError::Closed(_) => DeliveryError::Closed(id.to_string()),
        })
    }

    fn remove(&self, id: &str) {
        if self.lock().remove(id).is_some() {
            info!("Closed session {}", id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::Sender<String>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The streaming side of an open session, owned by its SSE connection.
#[derive(Debug)]
pub struct SseSession {
    outbound: mpsc::Receiver<String>,
    guard: SessionGuard,
}

impl SseSession {
    pub fn id(&self) -> &str {
        &self.guard.id
    }

    /// Path clients post their messages to.
    pub fn endpoint(&self) -> String {
        format!("/message?sessionId={}", self.id())
    }

    /// Next message produced by the session, or `None` once it has ended.
    pub async fn next_message(&mut self) -> Option<String> {
        self.outbound.recv().await
    }
}

#[derive(Debug)]
struct SessionGuard {
    id: String,
    registry: Arc<SessionRegistry>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use serde_json::{Value, json};

    fn initialize() -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "session-test", "version": "0.0.0" }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_sessions_are_registered_and_removed_on_drop() {
        let registry = Arc::new(SessionRegistry::new());
        let server = McpServer::new(Config::default());

        let first = registry.open(server.clone());
        let second = registry.open(server);
        assert_eq!(registry.len(), 2);
        assert_ne!(first.id(), second.id());
        assert!(first.endpoint().starts_with("/message?sessionId="));

        let first_id = first.id().to_string();
        drop(first);
        assert!(!registry.contains(&first_id));
        assert!(registry.contains(second.id()));

        drop(second);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_deliver_to_unknown_session() {
        let registry = SessionRegistry::new();
        let result = registry.deliver("missing", "{}".to_string());
        assert_eq!(
            result,
            Err(DeliveryError::UnknownSession("missing".to_string()))
        );
    }

    #[test]
    fn test_full_inbound_queue_is_busy_not_blocking() {
        let registry = SessionRegistry::new();
        let (sender, receiver) = mpsc::channel(1);
        registry.lock().insert("stalled".to_string(), sender);

        registry.deliver("stalled", "{}".to_string()).unwrap();
        assert_eq!(
            registry.deliver("stalled", "{}".to_string()),
            Err(DeliveryError::Busy("stalled".to_string()))
        );

        drop(receiver);
        assert_eq!(
            registry.deliver("stalled", "{}".to_string()),
            Err(DeliveryError::Closed("stalled".to_string()))
        );
    }

    #[tokio::test]
    async fn test_initialize_round_trip() {
        let registry = Arc::new(SessionRegistry::new());
        let mut session = registry.open(McpServer::new(Config::default()));

        registry.deliver(session.id(), initialize()).unwrap();
        let reply = session.next_message().await.unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();

        assert_eq!(reply["id"], json!(1));
        assert_eq!(
            reply["result"]["serverInfo"]["name"],
            json!("bcb-meios-pagamento-mcp")
        );
    }
}
