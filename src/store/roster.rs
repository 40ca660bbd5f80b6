//! Approver roster.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::{ApproverEntry, UserId};
use super::Ranked;

/// Users granted catalog-curation rights, keyed by user id.
///
/// Same ordering and upsert rules as [`super::Catalog`].
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: BTreeMap<UserId, Ranked<ApproverEntry>>,
    next_seq: u64,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from entries in document order.
    pub fn from_entries(entries: impl IntoIterator<Item = ApproverEntry>) -> Self {
        let mut roster = Self::new();
        for entry in entries {
            roster.write(entry);
        }
        roster
    }

    /// Insert or replace the entry for `user_id`, stamping it with `at`.
    pub fn upsert(
        &mut self,
        user_id: UserId,
        handle: impl Into<String>,
        grantor: impl Into<String>,
        at: DateTime<Utc>,
    ) -> ApproverEntry {
        let entry = ApproverEntry::new(user_id, handle, grantor, at);
        self.write(entry.clone());
        entry
    }

    /// Remove an approver. Returns `true` iff an entry existed.
    pub fn remove(&mut self, user_id: UserId) -> bool {
        self.entries.remove(&user_id).is_some()
    }

    /// Whether `user_id` is on the roster.
    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.contains_key(&user_id)
    }

    /// Look up an entry.
    pub fn get(&self, user_id: UserId) -> Option<&ApproverEntry> {
        self.entries.get(&user_id).map(|ranked| &ranked.entry)
    }

    /// All entries in roster order.
    pub fn list(&self) -> Vec<ApproverEntry> {
        super::ordered(self.entries.values(), |e| e.added_at)
    }

    /// Number of approvers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write(&mut self, entry: ApproverEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(entry.user_id, Ranked { seq, entry });
    }
}
