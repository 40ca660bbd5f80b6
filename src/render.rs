//! Views shown to users.
//!
//! Everything here is a pure function of session and store state. Bodies are
//! markup: fragment text is emitted verbatim and glyphs as inline markers.

use crate::picker::PickerPage;
use crate::session::{Pending, Rejection, Session};
use crate::types::{
    escape_html, Action, ApproverEntry, Button, Controls, Fragment, GlyphId, UserId, View,
};

/// Body shown when there are no fragments.
pub const EMPTY_PLACEHOLDER: &str = "...";

/// Selection buttons per picker row.
const PICKER_COLUMNS: usize = 2;

/// Toast confirming an add request.
pub const TOAST_ADD_PROMPT: &str = "✏️ Type the text (or /cancel)";
/// Toast after cancelling input.
pub const TOAST_CANCELLED: &str = "❌ Cancelled";
/// Toast when cancel had nothing to cancel.
pub const TOAST_NOTHING_PENDING: &str = "Nothing to cancel";
/// Toast after switching a glyph on.
pub const TOAST_GLYPH_ON: &str = "✅ Glyph on";
/// Toast after switching a glyph off.
pub const TOAST_GLYPH_OFF: &str = "❌ Glyph off";
/// Toast after removing a glyph through the picker.
pub const TOAST_GLYPH_REMOVED: &str = "❌ Glyph removed";
/// Toast for a selection that no longer exists.
pub const TOAST_NOT_FOUND: &str = "❌ Not found";
/// Toast after closing the picker.
pub const TOAST_CLOSED: &str = "Closed";
/// Reply to privileged actions by other users.
pub const ACCESS_DENIED: &str = "⛔ Access denied.";
/// Reply to `/cancel`.
pub const CANCELLED: &str = "❌ Cancelled.";

/// Join fragments into the composed message body.
///
/// Each fragment contributes its text followed by its glyph marker, if any,
/// all separated by single spaces.
pub fn compose_text(fragments: &[Fragment]) -> String {
    let mut chunks: Vec<String> = Vec::with_capacity(fragments.len() * 2);
    for fragment in fragments {
        chunks.push(escape_html(fragment.text()));
        if let Some(glyph) = &fragment.glyph {
            chunks.push(glyph.marker());
        }
    }
    if chunks.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        chunks.join(" ")
    }
}

/// The composer message: composed body plus per-fragment controls.
pub fn composer_view(session: &Session, max_additions: usize) -> View {
    let awaiting_text = *session.pending() == Pending::FragmentText;

    let mut body = compose_text(session.fragments());
    if awaiting_text {
        body.push_str("\n\n✏️ <i>Type the text of the addition:</i>");
    }

    let mut controls = Controls::new();
    for (i, fragment) in session.fragments().iter().enumerate() {
        let state = if fragment.has_glyph() { "✅" } else { "❌" };
        let label = if i == 0 {
            "Primary".to_string()
        } else {
            format!("Addition {i}")
        };
        controls.push_row(vec![
            Button::new(format!("{state} {label}"), Action::ToggleGlyph(i)),
            Button::new("🎭 Change", Action::OpenPicker(i)),
        ]);
    }

    let extras = session.additions();
    if extras < max_additions && !awaiting_text {
        controls.push_row(vec![Button::new(
            format!("➕ Add ({extras}/{max_additions})"),
            Action::AddFragment,
        )]);
    }
    if awaiting_text {
        controls.push_row(vec![Button::new("❌ Cancel", Action::CancelInput)]);
    }

    View::with_controls(body, controls)
}

/// The picker message for one page.
pub fn picker_view(page: &PickerPage) -> View {
    let mut lines = vec!["🎭 <b>Choose a glyph:</b>\n".to_string()];
    for (offset, item) in page.items.iter().enumerate() {
        lines.push(format!(
            "{}. {} {}",
            offset + 1,
            item.entry.id.marker(),
            escape_html(&item.entry.name)
        ));
    }

    let mut controls = Controls::new();
    controls.push_row(vec![Button::new("❌ No glyph", Action::PickerNone)]);

    let select: Vec<Button> = page
        .items
        .iter()
        .enumerate()
        .map(|(offset, item)| {
            Button::new(format!("Select {}", offset + 1), Action::PickerSelect(item.index))
        })
        .collect();
    for pair in select.chunks(PICKER_COLUMNS) {
        controls.push_row(pair.to_vec());
    }

    let current = page.page as i64;
    let prev = if page.has_prev() {
        Button::new("←", Action::PickerPage(current - 1))
    } else {
        Button::new("·", Action::PickerNoop)
    };
    let next = if page.has_next() {
        Button::new("→", Action::PickerPage(current + 1))
    } else {
        Button::new("·", Action::PickerNoop)
    };
    let position = Button::new(
        format!("{}/{}", page.page + 1, page.total_pages),
        Action::PickerNoop,
    );
    controls.push_row(vec![prev, position, next]);
    controls.push_row(vec![Button::new("❌ Close", Action::PickerClose)]);

    View::with_controls(lines.join("\n"), controls)
}

/// The admin panel listing approvers.
pub fn roster_view(approvers: &[ApproverEntry]) -> View {
    let mut lines = vec![
        "👑 <b>Admin panel</b>\n".to_string(),
        "<b>Approvers:</b>".to_string(),
    ];
    if approvers.is_empty() {
        lines.push("• The list is empty".to_string());
    }
    for approver in approvers {
        let handle = if approver.handle.is_empty() {
            "—".to_string()
        } else {
            format!("@{}", escape_html(&approver.handle))
        };
        lines.push(format!("• {handle} (ID: <code>{}</code>)", approver.user_id));
    }

    let controls = Controls::new()
        .with_row(vec![Button::new("➕ Add approver", Action::ApproverAdd)])
        .with_row(vec![Button::new("➖ Remove approver", Action::ApproverRemove)]);
    View::with_controls(lines.join("\n"), controls)
}

/// Reply to `/start`.
pub fn greeting(max_additions: usize) -> String {
    format!(
        "👋 Hi! Send any text and I will decorate it with premium glyphs.\n\
         You can add up to {max_additions} more parts."
    )
}

/// Notice for a refused transition.
pub fn rejection(rejection: &Rejection) -> String {
    match rejection {
        Rejection::CapReached { max } => format!("⚠️ Limit of {max} additions!"),
        Rejection::Busy { pending } => {
            format!("⏳ Still waiting for {pending}. Send it or /cancel.")
        }
        Rejection::GlyphNamePending => "⏳ Name the previous glyph first.".to_string(),
        Rejection::NoSuchFragment { .. } => TOAST_NOT_FOUND.to_string(),
        Rejection::PickerClosed => "The picker is no longer open".to_string(),
    }
}

/// Toast after a picker selection.
pub fn selected(name: &str) -> String {
    format!("✅ Selected: {name}")
}

/// Prompt after a privileged user submitted a glyph.
pub fn capture_prompt(glyph: &GlyphId) -> String {
    format!(
        "🎭 Glyph received: {}\nID: <code>{}</code>\n\nType a name for the catalog:",
        glyph.marker(),
        escape_html(glyph.as_str())
    )
}

/// Reply to a glyph from an unprivileged user.
pub fn disclosure(glyph: &GlyphId) -> String {
    format!("ID: <code>{}</code>", escape_html(glyph.as_str()))
}

/// Confirmation after a glyph was named.
pub fn glyph_named(glyph: &GlyphId, name: &str) -> String {
    format!(
        "✅ Glyph {} <b>{}</b> added to the catalog!",
        glyph.marker(),
        escape_html(name)
    )
}

/// Reply to `/up`.
pub fn backup(token: &str) -> String {
    format!("📦 <b>Backup:</b>\n<code>{token}</code>")
}

/// Prompt after `/down`.
pub fn restore_prompt(prefix: &str) -> String {
    format!("📥 Send the backup string (starts with <code>{prefix}</code>):")
}

/// Confirmation after a restore.
pub fn restored(glyphs: usize, approvers: usize) -> String {
    format!("✅ Backup restored! Glyphs: {glyphs}, approvers: {approvers}.")
}

/// Reply to an unusable backup token.
pub fn restore_failed(prefix: &str) -> String {
    format!(
        "❌ Invalid format. The backup must start with <code>{prefix}</code>\n\
         Send it again or /cancel."
    )
}

/// Prompt after the approver-add button.
pub const APPROVER_ADD_PROMPT: &str = "👤 Send the approver ID and handle separated by a space:\n\
<code>123456789 username</code>\n\nOr just the ID:\n<code>123456789</code>";

/// Usage hint for malformed approver-add input.
pub const APPROVER_ADD_USAGE: &str = "❌ Invalid format.\n\n\
Send the ID and handle separated by a space:\n<code>123456789 username</code>\n\n\
Or just the ID:\n<code>123456789</code>";

/// Prompt after the approver-remove button.
pub const APPROVER_REMOVE_PROMPT: &str =
    "🗑 Send the numeric <b>user_id</b> of the approver to remove:\nExample: <code>123456789</code>";

/// Usage hint for malformed approver-remove input.
pub const APPROVER_REMOVE_USAGE: &str =
    "❌ A numeric ID is required.\nExample: <code>123456789</code>";

/// Confirmation after adding an approver.
pub fn approver_added(user_id: UserId, handle: &str) -> String {
    let shown = if handle.is_empty() {
        "no handle".to_string()
    } else {
        format!("@{}", escape_html(handle))
    };
    format!("✅ Approver added!\nID: <code>{user_id}</code>\nHandle: {shown}")
}

/// Outcome of an approver removal.
pub fn approver_removed(user_id: UserId, removed: bool) -> String {
    if removed {
        format!("✅ Approver <code>{user_id}</code> removed.")
    } else {
        format!("❌ Approver with ID <code>{user_id}</code> not found.")
    }
}
