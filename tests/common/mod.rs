//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use glyph_composer::{
    AdminAllowlist, ChatId, ComposerConfig, GlyphId, InboundEvent, ManualClock, MessageHandle,
    OutboundRequest, Pending, RecordingTransport, Router, Sender, SharedStores, UserId, View,
};

pub const ADMIN: i64 = 1;
pub const ADMIN_HANDLE: &str = "root";

/// A router over a manual clock and a recording transport.
pub struct Harness {
    pub router: Router,
    pub transport: RecordingTransport,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(config: ComposerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let stores = SharedStores::with_clock(clock.clone());
        let authorizer = Arc::new(AdminAllowlist::new([ADMIN_HANDLE]));
        let router = Router::new(config, stores, authorizer, clock.clone());
        Self {
            router,
            transport: RecordingTransport::new(),
            clock,
        }
    }

    /// Catalog of `n` glyphs `g0..` named `glyph 0..`, one second apart.
    pub fn with_glyphs(self, n: usize) -> Self {
        for i in 0..n {
            self.router
                .stores()
                .upsert_glyph(GlyphId::new(format!("g{i}")), &format!("glyph {i}"), "seed");
            self.clock.advance(Duration::seconds(1));
        }
        self
    }

    /// Dispatch and return the requests it produced.
    pub async fn send(&self, event: InboundEvent) -> Vec<OutboundRequest> {
        self.router
            .dispatch(event, &self.transport)
            .await
            .expect("recording transport never fails sends");
        self.transport.drain()
    }

    pub async fn pending(&self, user: i64) -> Pending {
        let session = self.router.sessions().session(UserId::new(user));
        let pending = session.lock().await.pending().clone();
        pending
    }

    pub async fn composer(&self, user: i64) -> Option<MessageHandle> {
        let session = self.router.sessions().session(UserId::new(user));
        let handle = session.lock().await.composer();
        handle
    }
}

fn sender(user: i64, handle: Option<&str>) -> Sender {
    Sender::new(user, handle)
}

pub fn text(user: i64, handle: Option<&str>, body: &str) -> InboundEvent {
    InboundEvent::PlainText {
        sender: sender(user, handle),
        chat: ChatId(user),
        text: body.to_string(),
    }
}

pub fn glyph(user: i64, handle: Option<&str>, id: &str) -> InboundEvent {
    InboundEvent::GlyphBearingText {
        sender: sender(user, handle),
        chat: ChatId(user),
        text: "⭐".to_string(),
        glyphs: vec![GlyphId::new(id)],
    }
}

pub fn press(user: i64, handle: Option<&str>, data: &str) -> InboundEvent {
    InboundEvent::ButtonAction {
        sender: sender(user, handle),
        chat: ChatId(user),
        query: format!("q-{data}"),
        data: data.to_string(),
    }
}

pub fn admin_text(body: &str) -> InboundEvent {
    text(ADMIN, Some(ADMIN_HANDLE), body)
}

pub fn admin_press(data: &str) -> InboundEvent {
    press(ADMIN, Some(ADMIN_HANDLE), data)
}

/// Views of new messages.
pub fn sent(requests: &[OutboundRequest]) -> Vec<&View> {
    requests
        .iter()
        .filter_map(|r| match r {
            OutboundRequest::SendMessage { view, .. } => Some(view),
            _ => None,
        })
        .collect()
}

/// Views of edited messages with their handles.
pub fn edited(requests: &[OutboundRequest]) -> Vec<(MessageHandle, &View)> {
    requests
        .iter()
        .filter_map(|r| match r {
            OutboundRequest::EditMessage { handle, view } => Some((*handle, view)),
            _ => None,
        })
        .collect()
}

pub fn deleted(requests: &[OutboundRequest]) -> Vec<MessageHandle> {
    requests
        .iter()
        .filter_map(|r| match r {
            OutboundRequest::DeleteMessage { handle } => Some(*handle),
            _ => None,
        })
        .collect()
}

/// Toast of the single acknowledgement among `requests`.
pub fn toast(requests: &[OutboundRequest]) -> Option<String> {
    requests.iter().find_map(|r| match r {
        OutboundRequest::AcknowledgeAction { toast, .. } => toast.clone(),
        _ => None,
    })
}

pub fn acknowledged(requests: &[OutboundRequest]) -> bool {
    requests
        .iter()
        .any(|r| matches!(r, OutboundRequest::AcknowledgeAction { .. }))
}
