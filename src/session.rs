//! Per-client session table.
//!
//! Each open event stream owns exactly one [`SessionStream`], the single
//! consumer of its queue. POST handlers only ever see a cloned
//! [`SessionQueue`] (the producer side) obtained through
//! [`SessionManager::lookup`]. Dropping the stream closes the session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::protocol::SseMessage;

/// Opaque session token (128-bit random, hex encoded).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Producer handle onto a session's outbound queue.
#[derive(Debug, Clone)]
pub struct SessionQueue {
    id: SessionId,
    tx: mpsc::UnboundedSender<SseMessage>,
}

impl SessionQueue {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Enqueue a frame. Returns `false` when the stream is already gone, in
    /// which case the frame is dropped.
    pub fn push(&self, message: SseMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// What a stream consumer gets back from [`SessionStream::next_frame`].
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    Message(SseMessage),
    Heartbeat,
    Closed,
}

/// Consumer side of a session. Removes the session from the table on drop.
pub struct SessionStream {
    id: SessionId,
    rx: mpsc::UnboundedReceiver<SseMessage>,
    manager: Arc<SessionManager>,
}

impl SessionStream {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Wait for the next queued frame, or report a heartbeat once `idle`
    /// elapses without one.
    pub async fn next_frame(&mut self, idle: Duration) -> Frame {
        match tokio::time::timeout(idle, self.rx.recv()).await {
            Ok(Some(message)) => Frame::Message(message),
            Ok(None) => Frame::Closed,
            Err(_) => Frame::Heartbeat,
        }
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.rx.close();
        self.manager.close(&self.id);
    }
}

/// Table of live sessions, safe under concurrent open/lookup/close.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionQueue>>,
}

impl SessionManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new session and hand back its single consumer.
    pub fn open(self: &Arc<Self>) -> SessionStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut id = SessionId::generate();
        while sessions.contains_key(&id) {
            id = SessionId::generate();
        }
        sessions.insert(id.clone(), SessionQueue { id: id.clone(), tx });
        drop(sessions);

        tracing::info!(session_id = %id, "session opened");
        SessionStream {
            id,
            rx,
            manager: Arc::clone(self),
        }
    }

    pub fn lookup(&self, id: &SessionId) -> Option<SessionQueue> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .filter(|queue| queue.is_alive())
            .cloned()
    }

    /// Forget a session. Idempotent.
    pub fn close(&self, id: &SessionId) {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if removed.is_some() {
            tracing::info!(session_id = %id, "session closed");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
