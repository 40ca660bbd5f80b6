//! Glyph identifiers and the inline marker used to render them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::view::escape_html;

/// Opaque identifier of a platform glyph (a custom emoji id).
///
/// The id is carried verbatim; no normalisation is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlyphId(String);

impl GlyphId {
    /// Wrap a raw glyph id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline marker that makes the chat client draw this glyph.
    pub fn marker(&self) -> String {
        format!(
            "<tg-emoji emoji-id=\"{}\">{}</tg-emoji>",
            escape_html(&self.0),
            MARKER_FALLBACK
        )
    }
}

/// Character shown by clients that cannot draw custom glyphs.
pub const MARKER_FALLBACK: &str = "⭐";

impl fmt::Display for GlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GlyphId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GlyphId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
