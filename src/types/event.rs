//! Inbound events and outbound requests exchanged with the chat transport.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entry::UserId;
use super::glyph::GlyphId;
use super::view::View;

/// Chat (conversation) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Message id, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

/// Reference to a message already delivered to a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    /// Chat the message lives in.
    pub chat: ChatId,
    /// Message id within the chat.
    pub message: MessageId,
}

impl MessageHandle {
    /// Create a handle.
    pub fn new(chat: ChatId, message: MessageId) -> Self {
        Self { chat, message }
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat.0, self.message.0)
    }
}

/// Author of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Platform user id.
    pub id: UserId,
    /// Platform handle, if the user has one.
    #[serde(default)]
    pub handle: Option<String>,
}

impl Sender {
    /// Create a sender.
    pub fn new(id: impl Into<UserId>, handle: Option<&str>) -> Self {
        Self {
            id: id.into(),
            handle: handle.map(str::to_string),
        }
    }

    /// Name recorded as curator or grantor: the handle, or the numeric id.
    pub fn attribution(&self) -> String {
        match self.handle.as_deref() {
            Some(handle) if !handle.is_empty() => handle.to_string(),
            _ => self.id.to_string(),
        }
    }
}

/// An event delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A text message without glyphs. Commands arrive this way too.
    PlainText {
        /// Author.
        sender: Sender,
        /// Chat the message was sent in.
        chat: ChatId,
        /// Message text.
        text: String,
    },
    /// A text message carrying one or more custom glyphs.
    GlyphBearingText {
        /// Author.
        sender: Sender,
        /// Chat the message was sent in.
        chat: ChatId,
        /// Message text.
        text: String,
        /// Glyph ids in message order. Only the first one is used.
        glyphs: Vec<GlyphId>,
    },
    /// A press on an interactive control.
    ButtonAction {
        /// Who pressed.
        sender: Sender,
        /// Chat holding the control.
        chat: ChatId,
        /// Query id used to acknowledge the press.
        query: String,
        /// Raw action token.
        data: String,
    },
}

impl InboundEvent {
    /// Author of the event.
    pub fn sender(&self) -> &Sender {
        match self {
            Self::PlainText { sender, .. }
            | Self::GlyphBearingText { sender, .. }
            | Self::ButtonAction { sender, .. } => sender,
        }
    }

    /// Chat the event came from.
    pub fn chat(&self) -> ChatId {
        match self {
            Self::PlainText { chat, .. }
            | Self::GlyphBearingText { chat, .. }
            | Self::ButtonAction { chat, .. } => *chat,
        }
    }

    /// Short event kind for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlainText { .. } => "plain_text",
            Self::GlyphBearingText { .. } => "glyph_text",
            Self::ButtonAction { .. } => "button",
        }
    }
}

/// A request for the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundRequest {
    /// Send a new message. `handle` is the id the message was given.
    SendMessage {
        /// Where the message was delivered.
        handle: MessageHandle,
        /// Content.
        view: View,
    },
    /// Replace the content of an existing message.
    EditMessage {
        /// The message to edit.
        handle: MessageHandle,
        /// New content.
        view: View,
    },
    /// Delete a message.
    DeleteMessage {
        /// The message to delete.
        handle: MessageHandle,
    },
    /// Acknowledge a button press, optionally with a short toast.
    AcknowledgeAction {
        /// Query id of the press.
        query: String,
        /// Toast text.
        #[serde(skip_serializing_if = "Option::is_none")]
        toast: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_prefers_handle() {
        assert_eq!(Sender::new(5, Some("alice")).attribution(), "alice");
        assert_eq!(Sender::new(5, Some("")).attribution(), "5");
        assert_eq!(Sender::new(5, None).attribution(), "5");
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{
            "type": "button_action",
            "sender": {"id": 9, "handle": "bob"},
            "chat": 100,
            "query": "q1",
            "data": "ep_page_2"
        }"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.kind(), "button");
        assert_eq!(event.chat(), ChatId(100));
        assert_eq!(event.sender().id, UserId::new(9));
    }
}
