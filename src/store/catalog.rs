//! Glyph catalog.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::picker::{paginate, PickerPage};
use crate::types::{CatalogEntry, GlyphId};
use super::Ranked;

/// Catalog of curated glyphs keyed by glyph id.
///
/// Listing order is `added_at` ascending, ties broken by write order.
/// Every upsert re-stamps `added_at`, so an updated entry moves to the end.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<GlyphId, Ranked<CatalogEntry>>,
    next_seq: u64,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from entries in document order.
    ///
    /// Timestamps are kept as given. A repeated id replaces the earlier record.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.write(entry);
        }
        catalog
    }

    /// Insert or replace the entry for `id`, stamping it with `at`.
    pub fn upsert(
        &mut self,
        id: GlyphId,
        name: impl Into<String>,
        curator: impl Into<String>,
        at: DateTime<Utc>,
    ) -> CatalogEntry {
        let entry = CatalogEntry::new(id, name, curator, at);
        self.write(entry.clone());
        entry
    }

    /// Insert `entry` only if its id is unknown. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, entry: CatalogEntry) -> bool {
        if self.entries.contains_key(&entry.id) {
            return false;
        }
        self.write(entry);
        true
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &GlyphId) -> Option<&CatalogEntry> {
        self.entries.get(id).map(|ranked| &ranked.entry)
    }

    /// All entries in catalog order.
    pub fn list(&self) -> Vec<CatalogEntry> {
        super::ordered(self.entries.values(), |e| e.added_at)
    }

    /// Entry at an absolute position of the current listing.
    pub fn at(&self, index: usize) -> Option<CatalogEntry> {
        self.list().into_iter().nth(index)
    }

    /// One picker page of the current listing. `requested` is clamped.
    pub fn page(&self, requested: i64, page_size: usize) -> PickerPage {
        paginate(&self.list(), requested, page_size)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write(&mut self, entry: CatalogEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(entry.id.clone(), Ranked { seq, entry });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn ids(catalog: &Catalog) -> Vec<String> {
        catalog.list().into_iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn test_list_in_insertion_order() {
        let mut catalog = Catalog::new();
        catalog.upsert(GlyphId::new("b"), "B", "x", t(1));
        catalog.upsert(GlyphId::new("a"), "A", "x", t(2));
        catalog.upsert(GlyphId::new("c"), "C", "x", t(3));

        assert_eq!(ids(&catalog), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_upsert_replaces_and_moves_to_end() {
        let mut catalog = Catalog::new();
        catalog.upsert(GlyphId::new("a"), "A", "alice", t(1));
        catalog.upsert(GlyphId::new("b"), "B", "alice", t(2));
        catalog.upsert(GlyphId::new("a"), "A renamed", "bob", t(3));

        assert_eq!(catalog.len(), 2);
        assert_eq!(ids(&catalog), vec!["b", "a"]);
        let a = catalog.get(&GlyphId::new("a")).unwrap();
        assert_eq!(a.name, "A renamed");
        assert_eq!(a.added_by, "bob");
        assert_eq!(a.added_at, t(3));
    }

    #[test]
    fn test_repeated_upserts_keep_single_entry() {
        let mut catalog = Catalog::new();
        catalog.upsert(GlyphId::new("a"), "A", "x", t(1));
        catalog.upsert(GlyphId::new("b"), "B", "x", t(2));
        for i in 0..5 {
            catalog.upsert(GlyphId::new("b"), format!("B{i}"), "x", t(3 + i));
            catalog.upsert(GlyphId::new("a"), format!("A{i}"), "x", t(3 + i));
        }

        // Same timestamp each round: write order decides, "a" was written last.
        assert_eq!(ids(&catalog), vec!["b", "a"]);
        assert_eq!(catalog.get(&GlyphId::new("a")).unwrap().name, "A4");
    }

    #[test]
    fn test_equal_timestamps_fall_back_to_write_order() {
        let mut catalog = Catalog::new();
        catalog.upsert(GlyphId::new("z"), "Z", "x", t(0));
        catalog.upsert(GlyphId::new("y"), "Y", "x", t(0));

        assert_eq!(ids(&catalog), vec!["z", "y"]);
    }

    #[test]
    fn test_insert_if_absent_never_overwrites() {
        let mut catalog = Catalog::new();
        catalog.upsert(GlyphId::new("a"), "Custom", "alice", t(5));
        let inserted = catalog.insert_if_absent(CatalogEntry::new(
            GlyphId::new("a"),
            "Default",
            "system",
            t(0),
        ));

        assert!(!inserted);
        assert_eq!(catalog.get(&GlyphId::new("a")).unwrap().name, "Custom");
    }

    #[test]
    fn test_at_uses_absolute_index() {
        let mut catalog = Catalog::new();
        for i in 0..23 {
            catalog.upsert(GlyphId::new(format!("g{i}")), format!("G{i}"), "x", t(i));
        }

        assert_eq!(catalog.at(15).unwrap().id, GlyphId::new("g15"));
        assert!(catalog.at(23).is_none());
    }
}
