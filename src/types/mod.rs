//! Core types for the composer.

pub mod glyph;
pub mod entry;
pub mod fragment;
pub mod action;
pub mod view;
pub mod event;

pub use glyph::{GlyphId, MARKER_FALLBACK};
pub use entry::{UserId, CatalogEntry, ApproverEntry};
pub use fragment::Fragment;
pub use action::Action;
pub use view::{escape_html, Button, Controls, View};
pub use event::{ChatId, MessageId, MessageHandle, Sender, InboundEvent, OutboundRequest};
