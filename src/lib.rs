//! # glyph-composer
//!
//! Per-user composition of glyph-decorated chat messages.
//!
//! A user sends text, appends more fragments, decorates each fragment with a
//! glyph from a curated catalog and gets the composed message rendered back.
//! Approvers grow the catalog; admins maintain the approver roster and move
//! the whole state between processes with a backup token.
//!
//! ## Architecture
//!
//! ```text
//! InboundEvent → Router → Session (per user) → View → Transport
//!                  ↓
//!            SharedStores (Catalog + Roster) ⇄ Snapshot token
//! ```
//!
//! ## Guarantees
//!
//! - Events of one user are handled one at a time, in arrival order
//! - A user waits for at most one kind of input at any moment
//! - Picker selections use absolute catalog indices
//! - `decode(encode(s)) == s` for every snapshot

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod clock;
pub mod auth;
pub mod config;
pub mod canonical;
pub mod snapshot;
pub mod store;
pub mod picker;
pub mod session;
pub mod render;
pub mod transport;
pub mod router;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    escape_html, Action, ApproverEntry, Button, CatalogEntry, ChatId, Controls, Fragment, GlyphId,
    InboundEvent, MessageHandle, MessageId, OutboundRequest, Sender, UserId, View,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use auth::{AdminAllowlist, Authorizer};
pub use config::{ComposerConfig, DEFAULT_CATALOG, DEFAULT_GLYPH_ID, MAX_ADDITIONS, SEED_CURATOR};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use snapshot::{decode, encode, DecodeError, Snapshot, BACKUP_PREFIX};
pub use store::{Catalog, Roster, SharedStores, Stores};
pub use picker::{paginate, PickerItem, PickerPage, PICKER_PAGE_SIZE};
pub use session::{
    AdminIntent, EvictionPolicy, Pending, Rejection, Session, SessionHandle, SessionRegistry,
};
pub use render::{compose_text, EMPTY_PLACEHOLDER};
pub use transport::{RecordingError, RecordingTransport, Transport, DEFAULT_LIVE_MESSAGES};
pub use router::{ComposerError, DispatchError, Router};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
