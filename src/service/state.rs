//! Service state management.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ComposerConfig;
use crate::router::{DispatchError, Router};
use crate::transport::RecordingTransport;
use crate::types::{InboundEvent, OutboundRequest};

/// Shared service state.
///
/// One composer and one message ledger for the whole process. Every request
/// records into its own fork of the ledger, so concurrent requests never see
/// each other's output while message ids stay unique. The ledger only
/// remembers the most recently used live messages.
#[derive(Clone)]
pub struct ServiceState {
    /// The composer.
    pub router: Arc<Router>,
    transport: Arc<RecordingTransport>,
    started: Instant,
}

impl ServiceState {
    /// Create service state around a composer.
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            transport: Arc::new(RecordingTransport::new()),
            started: Instant::now(),
        }
    }

    /// Create service state from environment variables.
    pub fn from_env() -> Self {
        let config = ComposerConfig::from_env();
        if config.admins.is_empty() {
            tracing::warn!("COMPOSER_ADMINS not set, admin commands are disabled");
        }
        Self::new(Router::from_config(config))
    }

    /// Dispatch one event and collect the requests it produced.
    pub async fn deliver(&self, event: InboundEvent) -> Result<Vec<OutboundRequest>, DispatchError> {
        let recorder = self.transport.fork();
        self.router.dispatch(event, &recorder).await?;
        Ok(recorder.drain())
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("router", &self.router)
            .field("uptime_secs", &self.uptime_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatId, Sender};

    fn text(user: i64, body: &str) -> InboundEvent {
        InboundEvent::PlainText {
            sender: Sender::new(user, None),
            chat: ChatId(user),
            text: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_deliver_returns_only_own_requests() {
        let state = ServiceState::new(Router::from_config(ComposerConfig::default()));

        let first = state.deliver(text(1, "hello")).await.unwrap();
        let second = state.deliver(text(2, "world")).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
    }
}
