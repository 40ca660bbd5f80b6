//! Catalog and roster storage.
//!
//! Both stores are memory-resident and live behind one lock, so every
//! mutation is observed whole and a backup restore swaps them together.

pub mod catalog;
pub mod roster;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::picker::PickerPage;
use crate::snapshot::{self, DecodeError, Snapshot};
use crate::types::{ApproverEntry, CatalogEntry, GlyphId, UserId};

pub use catalog::Catalog;
pub use roster::Roster;

/// An entry tagged with its write sequence number.
#[derive(Debug, Clone)]
pub(crate) struct Ranked<T> {
    pub(crate) seq: u64,
    pub(crate) entry: T,
}

/// Order entries by timestamp, then by write sequence.
pub(crate) fn ordered<'a, T: Clone + 'a>(
    entries: impl Iterator<Item = &'a Ranked<T>>,
    stamp: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut ranked: Vec<&Ranked<T>> = entries.collect();
    ranked.sort_by(|a, b| {
        stamp(&a.entry)
            .cmp(&stamp(&b.entry))
            .then_with(|| a.seq.cmp(&b.seq))
    });
    ranked.into_iter().map(|r| r.entry.clone()).collect()
}

/// Catalog and roster together.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    /// The glyph catalog.
    pub catalog: Catalog,
    /// The approver roster.
    pub roster: Roster,
}

impl Stores {
    /// Rebuild stores from a decoded snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            catalog: Catalog::from_entries(snapshot.catalog),
            roster: Roster::from_entries(snapshot.approvers),
        }
    }

    /// Capture both stores in listing order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            catalog: self.catalog.list(),
            approvers: self.roster.list(),
        }
    }
}

/// Thread-safe handle to the process-wide stores.
///
/// Cloning shares the same underlying stores.
#[derive(Clone)]
pub struct SharedStores {
    inner: Arc<RwLock<Stores>>,
    clock: Arc<dyn Clock>,
}

impl SharedStores {
    /// Empty stores stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty stores stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Stores::default())),
            clock,
        }
    }

    /// Insert catalog defaults that are not present yet. Returns how many were added.
    pub fn seed_catalog<'a>(
        &self,
        defaults: impl IntoIterator<Item = (&'a str, &'a str)>,
        curator: &str,
    ) -> usize {
        let at = self.clock.now();
        let mut stores = self.inner.write();
        defaults
            .into_iter()
            .filter(|(id, name)| {
                stores
                    .catalog
                    .insert_if_absent(CatalogEntry::new(GlyphId::new(*id), *name, curator, at))
            })
            .count()
    }

    /// Insert or replace a catalog entry.
    pub fn upsert_glyph(&self, id: GlyphId, name: &str, curator: &str) -> CatalogEntry {
        let at = self.clock.now();
        let entry = self.inner.write().catalog.upsert(id, name, curator, at);
        tracing::info!(glyph_id = %entry.id, name = %entry.name, curator = %entry.added_by, "catalog entry written");
        entry
    }

    /// Current catalog listing.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.inner.read().catalog.list()
    }

    /// Catalog entry at an absolute index of the current listing.
    pub fn glyph_at(&self, index: usize) -> Option<CatalogEntry> {
        self.inner.read().catalog.at(index)
    }

    /// Number of catalog entries.
    pub fn catalog_len(&self) -> usize {
        self.inner.read().catalog.len()
    }

    /// One picker page of the current catalog.
    pub fn page(&self, requested: i64, page_size: usize) -> PickerPage {
        self.inner.read().catalog.page(requested, page_size)
    }

    /// Insert or replace an approver.
    pub fn upsert_approver(&self, user_id: UserId, handle: &str, grantor: &str) -> ApproverEntry {
        let at = self.clock.now();
        let entry = self.inner.write().roster.upsert(user_id, handle, grantor, at);
        tracing::info!(user_id = %entry.user_id, handle = %entry.handle, grantor = %entry.added_by, "approver written");
        entry
    }

    /// Remove an approver. Returns `true` iff one existed.
    pub fn remove_approver(&self, user_id: UserId) -> bool {
        let removed = self.inner.write().roster.remove(user_id);
        tracing::info!(user_id = %user_id, removed, "approver removal");
        removed
    }

    /// Whether `user_id` is an approver.
    pub fn is_approver(&self, user_id: UserId) -> bool {
        self.inner.read().roster.contains(user_id)
    }

    /// Current roster listing.
    pub fn approvers(&self) -> Vec<ApproverEntry> {
        self.inner.read().roster.list()
    }

    /// Consistent capture of both stores.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot()
    }

    /// Replace both stores with the content of `snapshot`.
    pub fn restore(&self, snapshot: Snapshot) {
        let fresh = Stores::from_snapshot(snapshot);
        let (glyphs, approvers) = (fresh.catalog.len(), fresh.roster.len());
        *self.inner.write() = fresh;
        tracing::info!(glyphs, approvers, "stores restored");
    }

    /// Encode both stores as a backup token.
    pub fn export(&self) -> String {
        let snapshot = self.snapshot();
        tracing::info!(
            fingerprint = %snapshot.fingerprint(),
            glyphs = snapshot.catalog.len(),
            approvers = snapshot.approvers.len(),
            "backup exported"
        );
        snapshot::encode(&snapshot)
    }

    /// Decode a backup token and restore it. Stores stay untouched on error.
    pub fn import(&self, token: &str) -> Result<Snapshot, DecodeError> {
        let snapshot = snapshot::decode(token)?;
        tracing::info!(fingerprint = %snapshot.fingerprint(), "backup accepted");
        self.restore(snapshot.clone());
        Ok(snapshot)
    }
}

impl Default for SharedStores {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stores = self.inner.read();
        f.debug_struct("SharedStores")
            .field("glyphs", &stores.catalog.len())
            .field("approvers", &stores.roster.len())
            .finish()
    }
}
