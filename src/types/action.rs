//! Button action tokens.
//!
//! Every interactive control carries one of these tokens as its callback
//! data. The string forms are part of the wire contract with the chat client:
//!
//! | Token | Action |
//! |-------|--------|
//! | `toggle_<i>` | Toggle the glyph of fragment `i` |
//! | `pick_emoji_<i>` | Open the picker for fragment `i` |
//! | `add` | Ask for another fragment |
//! | `cancel` | Cancel the pending fragment input |
//! | `ep_sel_<n>` | Select catalog entry `n` (absolute index) |
//! | `ep_page_<n>` | Show picker page `n` |
//! | `ep_none` | Remove the glyph from the picker target |
//! | `ep_close` | Close the picker |
//! | `ep_noop` | Inert cell |
//! | `adm_add` | Ask for an approver to add |
//! | `adm_remove` | Ask for an approver to remove |

use std::fmt;

/// A decoded button action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Toggle the glyph of a fragment on or off.
    ToggleGlyph(usize),
    /// Open the picker for a fragment.
    OpenPicker(usize),
    /// Request another fragment.
    AddFragment,
    /// Cancel the pending fragment input.
    CancelInput,
    /// Select the catalog entry at an absolute index.
    PickerSelect(usize),
    /// Navigate the picker. Out-of-range pages are clamped when rendered.
    PickerPage(i64),
    /// Strip the glyph from the picker target.
    PickerNone,
    /// Close the picker.
    PickerClose,
    /// Inert control.
    PickerNoop,
    /// Begin the approver-add interaction.
    ApproverAdd,
    /// Begin the approver-remove interaction.
    ApproverRemove,
}

impl Action {
    /// Parse a callback token. Unknown or malformed tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let action = match token {
            "add" => Self::AddFragment,
            "cancel" => Self::CancelInput,
            "ep_none" => Self::PickerNone,
            "ep_close" => Self::PickerClose,
            "ep_noop" => Self::PickerNoop,
            "adm_add" => Self::ApproverAdd,
            "adm_remove" => Self::ApproverRemove,
            _ => {
                if let Some(rest) = token.strip_prefix("toggle_") {
                    Self::ToggleGlyph(rest.parse().ok()?)
                } else if let Some(rest) = token.strip_prefix("pick_emoji_") {
                    Self::OpenPicker(rest.parse().ok()?)
                } else if let Some(rest) = token.strip_prefix("ep_sel_") {
                    Self::PickerSelect(rest.parse().ok()?)
                } else if let Some(rest) = token.strip_prefix("ep_page_") {
                    Self::PickerPage(rest.parse().ok()?)
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }

    /// Encode as a callback token.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleGlyph(i) => write!(f, "toggle_{i}"),
            Self::OpenPicker(i) => write!(f, "pick_emoji_{i}"),
            Self::AddFragment => write!(f, "add"),
            Self::CancelInput => write!(f, "cancel"),
            Self::PickerSelect(n) => write!(f, "ep_sel_{n}"),
            Self::PickerPage(n) => write!(f, "ep_page_{n}"),
            Self::PickerNone => write!(f, "ep_none"),
            Self::PickerClose => write!(f, "ep_close"),
            Self::PickerNoop => write!(f, "ep_noop"),
            Self::ApproverAdd => write!(f, "adm_add"),
            Self::ApproverRemove => write!(f, "adm_remove"),
        }
    }
}
