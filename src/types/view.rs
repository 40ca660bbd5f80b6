//! Rendered message content.

use serde::{Deserialize, Serialize};

use super::action::Action;

/// Escape text for an HTML message body.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// A single interactive control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Callback token delivered back when pressed.
    pub data: String,
}

impl Button {
    /// Create a button bound to `action`.
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            data: action.token(),
        }
    }

    /// Decode the bound action.
    pub fn action(&self) -> Option<Action> {
        Action::parse(&self.data)
    }
}

/// Rows of controls attached below a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Controls {
    rows: Vec<Vec<Button>>,
}

impl Controls {
    /// No controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Empty rows are skipped.
    pub fn push_row(&mut self, row: Vec<Button>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    /// Builder form of [`Controls::push_row`].
    pub fn with_row(mut self, row: Vec<Button>) -> Self {
        self.push_row(row);
        self
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    /// Every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Whether there are no controls.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Message body plus controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// Markup body.
    pub body: String,
    /// Attached controls.
    #[serde(default, skip_serializing_if = "Controls::is_empty")]
    pub controls: Controls,
}

impl View {
    /// A body without controls.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            controls: Controls::new(),
        }
    }

    /// A body with controls.
    pub fn with_controls(body: impl Into<String>, controls: Controls) -> Self {
        Self {
            body: body.into(),
            controls,
        }
    }

    /// Find the first button bound to `action`.
    pub fn button(&self, action: Action) -> Option<&Button> {
        let token = action.token();
        self.controls.buttons().find(|b| b.data == token)
    }
}
