//! Transport seam between the composer and a chat platform.
//!
//! The composer only asks for four things: send, render-in-place, delete,
//! acknowledge. Whether a render edited an existing message or had to send
//! a new one is decided here, not by the caller.

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::types::{ChatId, MessageHandle, MessageId, OutboundRequest, View};

/// Trait for chat transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a new message and return where it landed.
    async fn send(&self, chat: ChatId, view: &View) -> Result<MessageHandle, Self::Error>;

    /// Replace the content of an existing message.
    async fn edit(&self, handle: MessageHandle, view: &View) -> Result<(), Self::Error>;

    /// Delete a message.
    async fn delete(&self, handle: MessageHandle) -> Result<(), Self::Error>;

    /// Acknowledge a button press.
    async fn acknowledge(&self, query: &str, toast: Option<&str>) -> Result<(), Self::Error>;

    /// Show `view`, editing `target` in place when possible.
    ///
    /// Falls back to sending a new message when there is no target or the
    /// edit fails. Returns the handle now showing the view.
    async fn upsert_render(
        &self,
        target: Option<MessageHandle>,
        chat: ChatId,
        view: &View,
    ) -> Result<MessageHandle, Self::Error> {
        if let Some(handle) = target {
            match self.edit(handle, view).await {
                Ok(()) => return Ok(handle),
                Err(e) => {
                    tracing::debug!(handle = %handle, error = %e, "edit failed, sending new message");
                }
            }
        }
        self.send(chat, view).await
    }
}

/// Error type for [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordingError {
    /// The message was never sent or is already deleted.
    #[error("message not found: {0}")]
    UnknownMessage(MessageHandle),
}

/// Live messages remembered by a default recorder.
pub const DEFAULT_LIVE_MESSAGES: usize = 4096;

/// Message ids plus the most recently used live messages.
///
/// Once full, the least recently sent or edited message is forgotten and
/// behaves as if the user had deleted it.
struct Ledger {
    next_id: i64,
    live: LruCache<MessageHandle, ()>,
}

impl Ledger {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            next_id: 0,
            live: LruCache::new(capacity),
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("next_id", &self.next_id)
            .field("live", &self.live.len())
            .field("capacity", &self.live.cap())
            .finish()
    }
}

/// In-process transport that allocates message ids and records requests.
///
/// Edits and deletes of messages that are not live fail, like they would on
/// a real platform. [`RecordingTransport::fork`] gives a recorder with its
/// own request log over the same message ledger. The ledger remembers at
/// most a fixed number of live messages.
#[derive(Debug)]
pub struct RecordingTransport {
    ledger: Arc<Mutex<Ledger>>,
    log: Mutex<Vec<OutboundRequest>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    /// Create a recorder remembering [`DEFAULT_LIVE_MESSAGES`] live messages.
    pub fn new() -> Self {
        Self::with_capacity(
            NonZeroUsize::new(DEFAULT_LIVE_MESSAGES).unwrap_or(NonZeroUsize::MIN),
        )
    }

    /// Create a recorder remembering at most `capacity` live messages.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger::new(capacity))),
            log: Mutex::new(Vec::new()),
        }
    }

    /// A recorder sharing this one's ledger, with an empty log.
    pub fn fork(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Take every request recorded so far.
    pub fn drain(&self) -> Vec<OutboundRequest> {
        std::mem::take(&mut *self.log.lock())
    }

    /// Copy of the requests recorded so far.
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.log.lock().clone()
    }

    /// Whether `handle` refers to a live message.
    pub fn is_live(&self, handle: MessageHandle) -> bool {
        self.ledger.lock().live.contains(&handle)
    }

    /// Number of live messages currently remembered.
    pub fn live_count(&self) -> usize {
        self.ledger.lock().live.len()
    }

    /// Drop a message from the ledger as if the user deleted it.
    pub fn forget(&self, handle: MessageHandle) {
        self.ledger.lock().live.pop(&handle);
    }

    fn record(&self, request: OutboundRequest) {
        self.log.lock().push(request);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    type Error = RecordingError;

    async fn send(&self, chat: ChatId, view: &View) -> Result<MessageHandle, Self::Error> {
        let handle = {
            let mut ledger = self.ledger.lock();
            ledger.next_id += 1;
            let handle = MessageHandle::new(chat, MessageId(ledger.next_id));
            if let Some((evicted, ())) = ledger.live.push(handle, ()) {
                if evicted != handle {
                    tracing::debug!(handle = %evicted, "forgetting oldest live message");
                }
            }
            handle
        };
        self.record(OutboundRequest::SendMessage {
            handle,
            view: view.clone(),
        });
        Ok(handle)
    }

    async fn edit(&self, handle: MessageHandle, view: &View) -> Result<(), Self::Error> {
        if self.ledger.lock().live.get(&handle).is_none() {
            return Err(RecordingError::UnknownMessage(handle));
        }
        self.record(OutboundRequest::EditMessage {
            handle,
            view: view.clone(),
        });
        Ok(())
    }

    async fn delete(&self, handle: MessageHandle) -> Result<(), Self::Error> {
        if self.ledger.lock().live.pop(&handle).is_none() {
            return Err(RecordingError::UnknownMessage(handle));
        }
        self.record(OutboundRequest::DeleteMessage { handle });
        Ok(())
    }

    async fn acknowledge(&self, query: &str, toast: Option<&str>) -> Result<(), Self::Error> {
        self.record(OutboundRequest::AcknowledgeAction {
            query: query.to_string(),
            toast: toast.map(str::to_string),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_edits_live_message() {
        let transport = RecordingTransport::new();
        let handle = transport.send(ChatId(1), &View::text("a")).await.unwrap();

        let shown = transport
            .upsert_render(Some(handle), ChatId(1), &View::text("b"))
            .await
            .unwrap();

        assert_eq!(shown, handle);
        assert!(matches!(
            transport.requests().last(),
            Some(OutboundRequest::EditMessage { .. })
        ));
    }

    #[tokio::test]
    async fn test_upsert_falls_back_to_send() {
        let transport = RecordingTransport::new();
        let handle = transport.send(ChatId(1), &View::text("a")).await.unwrap();
        transport.forget(handle);

        let shown = transport
            .upsert_render(Some(handle), ChatId(1), &View::text("b"))
            .await
            .unwrap();

        assert_ne!(shown, handle);
        assert!(transport.is_live(shown));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_from_ledger() {
        let transport = RecordingTransport::new();
        let handle = transport.send(ChatId(1), &View::text("a")).await.unwrap();

        transport.delete(handle).await.unwrap();
        assert!(!transport.is_live(handle));
        assert!(transport.delete(handle).await.is_err());
    }

    #[tokio::test]
    async fn test_ledger_stays_bounded() {
        let main = RecordingTransport::with_capacity(NonZeroUsize::new(8).unwrap());
        let mut handles = Vec::new();
        for i in 0..1000 {
            let fork = main.fork();
            handles.push(fork.send(ChatId(i % 3), &View::text("a")).await.unwrap());
            fork.drain();
        }

        assert_eq!(main.live_count(), 8);
        assert!(!main.is_live(handles[0]));
        assert!(main.is_live(handles[999]));
    }

    #[tokio::test]
    async fn test_edit_keeps_message_live() {
        let transport = RecordingTransport::with_capacity(NonZeroUsize::new(2).unwrap());
        let composer = transport.send(ChatId(1), &View::text("a")).await.unwrap();
        transport.send(ChatId(1), &View::text("b")).await.unwrap();
        transport.edit(composer, &View::text("a2")).await.unwrap();
        transport.send(ChatId(1), &View::text("c")).await.unwrap();

        assert!(transport.is_live(composer));
        assert_eq!(transport.live_count(), 2);
    }

    #[tokio::test]
    async fn test_fork_shares_ids_not_logs() {
        let main = RecordingTransport::new();
        let first = main.send(ChatId(1), &View::text("a")).await.unwrap();
        let fork = main.fork();
        let second = fork.send(ChatId(1), &View::text("b")).await.unwrap();

        assert_ne!(first, second);
        assert!(main.is_live(second));
        assert_eq!(fork.drain().len(), 1);
        assert_eq!(main.drain().len(), 1);
    }
}
