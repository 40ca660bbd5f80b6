//! Message fragments.

use serde::{Deserialize, Serialize};

use super::glyph::GlyphId;

/// One text segment of a composed message.
///
/// The text never changes after the fragment is appended; only the glyph
/// reference is reassigned by the picker and the on/off toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    text: String,
    /// Glyph drawn after the text, `None` for plain text.
    pub glyph: Option<GlyphId>,
}

impl Fragment {
    /// Create a fragment decorated with `glyph`.
    pub fn new(text: impl Into<String>, glyph: Option<GlyphId>) -> Self {
        Self {
            text: text.into(),
            glyph,
        }
    }

    /// The fragment text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a glyph is attached.
    pub fn has_glyph(&self) -> bool {
        self.glyph.is_some()
    }
}
