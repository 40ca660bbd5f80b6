//! Picker pagination over the catalog listing.
//!
//! Pages are clamped, never rejected. Items carry their absolute catalog
//! index so a selection resolves the same entry whichever page produced it.

use serde::{Deserialize, Serialize};

use crate::types::CatalogEntry;

/// Default number of entries per picker page.
pub const PICKER_PAGE_SIZE: usize = 10;

/// A catalog entry as shown in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerItem {
    /// Position in the full catalog listing.
    pub index: usize,
    /// The entry.
    pub entry: CatalogEntry,
}

/// One page of the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerPage {
    /// Visible entries.
    pub items: Vec<PickerItem>,
    /// Page index after clamping, zero-based.
    pub page: usize,
    /// Number of pages, at least one.
    pub total_pages: usize,
    /// Size of the full listing.
    pub total: usize,
}

impl PickerPage {
    /// Whether a previous page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    /// Whether a next page exists.
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Number of pages needed for `total` entries.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total.div_ceil(page_size).max(1)
}

/// Clamp a requested page into `[0, total_pages - 1]`.
pub fn clamp_page(requested: i64, total: usize, page_size: usize) -> usize {
    let last = total_pages(total, page_size) - 1;
    if requested <= 0 {
        0
    } else {
        usize::try_from(requested).map_or(last, |p| p.min(last))
    }
}

/// Slice `entries` into the page `requested`.
pub fn paginate(entries: &[CatalogEntry], requested: i64, page_size: usize) -> PickerPage {
    let page_size = page_size.max(1);
    let total = entries.len();
    let page = clamp_page(requested, total, page_size);
    let start = page * page_size;
    let end = total.min(start + page_size);

    let items = entries
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(offset, entry)| PickerItem {
            index: start + offset,
            entry: entry.clone(),
        })
        .collect();

    PickerPage {
        items,
        page,
        total_pages: total_pages(total, page_size),
        total,
    }
}
