//! Interaction router.
//!
//! [`Router::dispatch`] takes one inbound event, locks the sender's session
//! for the whole event and runs exactly one transition. Free text is routed
//! by the session's [`Pending`] state, in this order:
//!
//! 1. commands (`/start`, `/upuser`, `/up`, `/down`, `/cancel`)
//! 2. pending admin input
//! 3. a pending glyph name
//! 4. pending fragment text
//! 5. otherwise a new composition
//!
//! User mistakes are answered through the transport and never surface as
//! errors. Only transport failures do.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::{AdminAllowlist, Authorizer};
use crate::clock::{Clock, SystemClock};
use crate::config::{ComposerConfig, DEFAULT_CATALOG, SEED_CURATOR};
use crate::render;
use crate::session::{AdminIntent, Pending, Rejection, Session, SessionRegistry};
use crate::snapshot::{DecodeError, BACKUP_PREFIX};
use crate::store::SharedStores;
use crate::transport::Transport;
use crate::types::{
    Action, CatalogEntry, ChatId, GlyphId, InboundEvent, MessageHandle, Sender, UserId, View,
};

/// Outcomes reported back to the user instead of applied.
#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    /// A backup token failed validation.
    #[error("invalid backup: {0}")]
    InvalidFormat(#[from] DecodeError),
    /// A picker selection points past the end of the catalog.
    #[error("selection {index} out of range, catalog has {len} entries")]
    SelectionOutOfRange {
        /// Requested absolute index.
        index: usize,
        /// Catalog size at the time of the request.
        len: usize,
    },
    /// The sender may not perform an admin action.
    #[error("privilege denied")]
    PrivilegeDenied,
    /// Admin input did not parse.
    #[error("malformed admin input: {0}")]
    MalformedAdminInput(String),
}

/// Failure to deliver the outcome of an event.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The transport rejected a request.
    #[error("transport error: {0}")]
    Transport(String),
}

impl DispatchError {
    fn transport(err: impl std::error::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

type Outcome = Result<(), DispatchError>;

/// Commands understood in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Roster,
    Export,
    Restore,
    Cancel,
}

impl Command {
    /// Parse `/name` or `/name@bot`, ignoring arguments.
    fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);
        if name.is_empty() {
            return None;
        }
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "upuser" => Some(Self::Roster),
            "up" => Some(Self::Export),
            "down" => Some(Self::Restore),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }

    fn admin_only(self) -> bool {
        matches!(self, Self::Roster | Self::Export | Self::Restore)
    }
}

/// Routes inbound events to session transitions.
pub struct Router {
    stores: SharedStores,
    sessions: SessionRegistry,
    authorizer: Arc<dyn Authorizer>,
    config: ComposerConfig,
}

impl Router {
    /// Create a router over existing collaborators.
    pub fn new(
        config: ComposerConfig,
        stores: SharedStores,
        authorizer: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = SessionRegistry::new(clock, config.eviction);
        Self {
            stores,
            sessions,
            authorizer,
            config,
        }
    }

    /// Build a router from configuration alone: system clock, admin
    /// allowlist from the config, catalog seeded when enabled.
    pub fn from_config(config: ComposerConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let stores = SharedStores::with_clock(Arc::clone(&clock));
        if config.seed_catalog {
            let added = stores.seed_catalog(DEFAULT_CATALOG, SEED_CURATOR);
            tracing::info!(added, "catalog seeded");
        }
        let authorizer = Arc::new(AdminAllowlist::new(&config.admins));
        Self::new(config, stores, authorizer, clock)
    }

    /// Shared catalog and roster.
    pub fn stores(&self) -> &SharedStores {
        &self.stores
    }

    /// Live sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Active configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Handle one inbound event.
    ///
    /// Events of the same user are processed one at a time in arrival
    /// order. State changes made before a transport failure stay applied.
    pub async fn dispatch<T: Transport>(&self, event: InboundEvent, transport: &T) -> Outcome {
        let span = tracing::info_span!(
            "dispatch",
            event_id = %Uuid::new_v4(),
            user_id = %event.sender().id,
            kind = event.kind(),
        );

        async move {
            let handle = self.sessions.session(event.sender().id);
            let mut session = handle.lock().await;
            let session = &mut *session;

            match &event {
                InboundEvent::PlainText { sender, chat, text } => {
                    self.on_text(session, sender, *chat, text, transport).await
                }
                InboundEvent::GlyphBearingText {
                    sender,
                    chat,
                    text,
                    glyphs,
                } => match glyphs.first() {
                    Some(glyph) => self.on_glyph(session, sender, *chat, glyph, transport).await,
                    None => self.on_text(session, sender, *chat, text, transport).await,
                },
                InboundEvent::ButtonAction {
                    sender,
                    chat,
                    query,
                    data,
                } => {
                    self.on_action(session, sender, *chat, query, data, transport)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }

    fn is_admin(&self, sender: &Sender) -> bool {
        self.authorizer.is_admin(sender.handle.as_deref())
    }

    fn require_admin(&self, sender: &Sender) -> Result<(), ComposerError> {
        if self.is_admin(sender) {
            Ok(())
        } else {
            tracing::warn!(handle = ?sender.handle, "admin action refused");
            Err(ComposerError::PrivilegeDenied)
        }
    }

    /// Approvers and admins may add glyphs to the catalog.
    fn is_privileged(&self, sender: &Sender) -> bool {
        self.stores.is_approver(sender.id) || self.is_admin(sender)
    }

    // ── free text ────────────────────────────────────────────────────────

    async fn on_text<T: Transport>(
        &self,
        session: &mut Session,
        sender: &Sender,
        chat: ChatId,
        raw: &str,
        transport: &T,
    ) -> Outcome {
        let text = raw.trim();
        if text.is_empty() {
            tracing::debug!("empty text ignored");
            return Ok(());
        }

        if let Some(command) = Command::parse(text) {
            return self.on_command(session, sender, chat, command, transport).await;
        }

        if let Some(intent) = session.admin_intent() {
            if self.require_admin(sender).is_err() {
                session.finish_admin();
                return reply(transport, chat, render::ACCESS_DENIED).await;
            }
            return self.on_admin_input(session, sender, chat, intent, text, transport).await;
        }

        if let Some(glyph) = session.take_glyph_name() {
            let entry = self.stores.upsert_glyph(glyph, text, &sender.attribution());
            return reply(transport, chat, &render::glyph_named(&entry.id, &entry.name)).await;
        }

        if *session.pending() == Pending::FragmentText {
            match session.append_fragment(text, &self.config.default_glyph) {
                Ok(index) => tracing::debug!(index, "fragment appended"),
                Err(rejection) => return reply(transport, chat, &render::rejection(&rejection)).await,
            }
            return self.render_composer(session, chat, transport).await;
        }

        let stale_picker = session.start_composition(text, &self.config.default_glyph);
        discard(transport, stale_picker).await;
        let view = render::composer_view(session, self.config.max_additions);
        let handle = transport
            .send(chat, &view)
            .await
            .map_err(DispatchError::transport)?;
        session.set_composer(handle);
        tracing::debug!(composer = %handle, "composition started");
        Ok(())
    }

    async fn on_command<T: Transport>(
        &self,
        session: &mut Session,
        sender: &Sender,
        chat: ChatId,
        command: Command,
        transport: &T,
    ) -> Outcome {
        if command.admin_only() && self.require_admin(sender).is_err() {
            return reply(transport, chat, render::ACCESS_DENIED).await;
        }

        match command {
            Command::Start => {
                reply(transport, chat, &render::greeting(self.config.max_additions)).await
            }
            Command::Roster => self.send_roster(chat, transport).await,
            Command::Export => {
                let token = self.stores.export();
                reply(transport, chat, &render::backup(&token)).await
            }
            Command::Restore => match session.begin_admin(AdminIntent::BackupRestore) {
                Ok(()) => reply(transport, chat, &render::restore_prompt(BACKUP_PREFIX)).await,
                Err(rejection) => reply(transport, chat, &render::rejection(&rejection)).await,
            },
            Command::Cancel => {
                let previous = session.cancel_all();
                tracing::debug!(cancelled = previous.describe(), "cancel command");
                match previous {
                    Pending::FragmentText if !session.fragments().is_empty() => {
                        self.render_composer(session, chat, transport).await?;
                    }
                    Pending::GlyphSelection { .. } => {
                        discard(transport, session.take_picker()).await;
                    }
                    _ => {}
                }
                reply(transport, chat, render::CANCELLED).await
            }
        }
    }

    async fn on_admin_input<T: Transport>(
        &self,
        session: &mut Session,
        sender: &Sender,
        chat: ChatId,
        intent: AdminIntent,
        text: &str,
        transport: &T,
    ) -> Outcome {
        match intent {
            AdminIntent::BackupRestore => match self.stores.import(text) {
                Ok(snapshot) => {
                    session.finish_admin();
                    let body = render::restored(snapshot.catalog.len(), snapshot.approvers.len());
                    reply(transport, chat, &body).await
                }
                Err(err) => {
                    let err = ComposerError::from(err);
                    tracing::warn!(error = %err, "backup restore refused");
                    reply(transport, chat, &render::restore_failed(BACKUP_PREFIX)).await
                }
            },
            AdminIntent::ApproverAdd => match parse_approver_add(text) {
                Ok((user_id, handle)) => {
                    session.finish_admin();
                    let entry = self
                        .stores
                        .upsert_approver(user_id, &handle, &sender.attribution());
                    reply(transport, chat, &render::approver_added(entry.user_id, &entry.handle))
                        .await?;
                    self.send_roster(chat, transport).await
                }
                Err(err) => {
                    tracing::warn!(error = %err, "approver add input refused");
                    reply(transport, chat, render::APPROVER_ADD_USAGE).await
                }
            },
            AdminIntent::ApproverRemove => match parse_approver_remove(text) {
                Ok(user_id) => {
                    session.finish_admin();
                    let removed = self.stores.remove_approver(user_id);
                    reply(transport, chat, &render::approver_removed(user_id, removed)).await?;
                    self.send_roster(chat, transport).await
                }
                Err(err) => {
                    tracing::warn!(error = %err, "approver remove input refused");
                    reply(transport, chat, render::APPROVER_REMOVE_USAGE).await
                }
            },
        }
    }

    // ── glyph-bearing text ───────────────────────────────────────────────

    async fn on_glyph<T: Transport>(
        &self,
        session: &mut Session,
        sender: &Sender,
        chat: ChatId,
        glyph: &GlyphId,
        transport: &T,
    ) -> Outcome {
        if !self.is_privileged(sender) {
            return reply(transport, chat, &render::disclosure(glyph)).await;
        }

        match session.capture_glyph(glyph.clone()) {
            Ok(()) => {
                tracing::info!(glyph_id = %glyph, "glyph captured");
                reply(transport, chat, &render::capture_prompt(glyph)).await
            }
            Err(rejection) => reply(transport, chat, &render::rejection(&rejection)).await,
        }
    }

    // ── button actions ───────────────────────────────────────────────────

    async fn on_action<T: Transport>(
        &self,
        session: &mut Session,
        sender: &Sender,
        chat: ChatId,
        query: &str,
        data: &str,
        transport: &T,
    ) -> Outcome {
        let Some(action) = Action::parse(data) else {
            tracing::debug!(data, "unknown action");
            return ack(transport, query, None).await;
        };

        match action {
            Action::ApproverAdd | Action::ApproverRemove => {
                if self.require_admin(sender).is_err() {
                    return ack(transport, query, Some(render::ACCESS_DENIED)).await;
                }
                let (intent, prompt) = match action {
                    Action::ApproverAdd => (AdminIntent::ApproverAdd, render::APPROVER_ADD_PROMPT),
                    _ => (AdminIntent::ApproverRemove, render::APPROVER_REMOVE_PROMPT),
                };
                match session.begin_admin(intent) {
                    Ok(()) => {
                        ack(transport, query, None).await?;
                        reply(transport, chat, prompt).await
                    }
                    Err(rejection) => {
                        refuse(transport, query, &rejection).await
                    }
                }
            }

            Action::PickerNoop => ack(transport, query, None).await,

            Action::PickerPage(requested) => {
                if let Err(rejection) = session.picker_state() {
                    return refuse(transport, query, &rejection).await;
                }
                let page = self.stores.page(requested, self.config.page_size);
                if let Err(rejection) = session.set_picker_page(page.page) {
                    return refuse(transport, query, &rejection).await;
                }
                tracing::debug!(page = page.page, total_pages = page.total_pages, "picker page");
                ack(transport, query, None).await?;
                let handle = transport
                    .upsert_render(session.picker(), chat, &render::picker_view(&page))
                    .await
                    .map_err(DispatchError::transport)?;
                session.set_picker(handle);
                Ok(())
            }

            Action::PickerNone => match session.assign_glyph(None) {
                Ok(index) => {
                    tracing::debug!(index, "glyph removed");
                    ack(transport, query, Some(render::TOAST_GLYPH_REMOVED)).await?;
                    self.finish_picker(session, chat, transport).await
                }
                Err(rejection) => {
                    refuse(transport, query, &rejection).await
                }
            },

            Action::PickerSelect(index) => {
                if let Err(rejection) = session.picker_state() {
                    return refuse(transport, query, &rejection).await;
                }
                let entry = match self.resolve_selection(index) {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!(error = %err, "picker selection refused");
                        return ack(transport, query, Some(render::TOAST_NOT_FOUND)).await;
                    }
                };
                if let Err(rejection) = session.assign_glyph(Some(entry.id.clone())) {
                    return refuse(transport, query, &rejection).await;
                }
                tracing::debug!(index, glyph_id = %entry.id, "glyph selected");
                let toast = render::selected(&entry.name);
                ack(transport, query, Some(toast.as_str())).await?;
                self.finish_picker(session, chat, transport).await
            }

            Action::PickerClose => match session.close_picker() {
                Ok(()) => {
                    ack(transport, query, Some(render::TOAST_CLOSED)).await?;
                    self.finish_picker(session, chat, transport).await
                }
                Err(rejection) => {
                    refuse(transport, query, &rejection).await
                }
            },

            Action::AddFragment => match session.request_fragment(self.config.max_additions) {
                Ok(()) => {
                    ack(transport, query, Some(render::TOAST_ADD_PROMPT)).await?;
                    self.render_composer(session, chat, transport).await
                }
                Err(rejection) => {
                    refuse(transport, query, &rejection).await
                }
            },

            Action::CancelInput => match session.cancel_input() {
                Some(_) => {
                    ack(transport, query, Some(render::TOAST_CANCELLED)).await?;
                    self.render_composer(session, chat, transport).await
                }
                None => ack(transport, query, Some(render::TOAST_NOTHING_PENDING)).await,
            },

            Action::ToggleGlyph(index) => {
                match session.toggle_glyph(index, &self.config.default_glyph) {
                    Ok(on) => {
                        let toast = if on {
                            render::TOAST_GLYPH_ON
                        } else {
                            render::TOAST_GLYPH_OFF
                        };
                        ack(transport, query, Some(toast)).await?;
                        self.render_composer(session, chat, transport).await
                    }
                    Err(rejection) => {
                        refuse(transport, query, &rejection).await
                    }
                }
            }

            Action::OpenPicker(index) => match session.open_picker(index) {
                Ok(()) => {
                    ack(transport, query, None).await?;
                    discard(transport, session.take_picker()).await;
                    let page = self.stores.page(0, self.config.page_size);
                    let handle = transport
                        .send(chat, &render::picker_view(&page))
                        .await
                        .map_err(DispatchError::transport)?;
                    session.set_picker(handle);
                    tracing::debug!(index, picker = %handle, "picker opened");
                    Ok(())
                }
                Err(rejection) => {
                    refuse(transport, query, &rejection).await
                }
            },
        }
    }

    /// Look up an absolute picker index in the current catalog.
    fn resolve_selection(&self, index: usize) -> Result<CatalogEntry, ComposerError> {
        self.stores
            .glyph_at(index)
            .ok_or_else(|| ComposerError::SelectionOutOfRange {
                index,
                len: self.stores.catalog_len(),
            })
    }

    /// Remove the picker message and refresh the composer.
    async fn finish_picker<T: Transport>(
        &self,
        session: &mut Session,
        chat: ChatId,
        transport: &T,
    ) -> Outcome {
        discard(transport, session.take_picker()).await;
        self.render_composer(session, chat, transport).await
    }

    async fn render_composer<T: Transport>(
        &self,
        session: &mut Session,
        chat: ChatId,
        transport: &T,
    ) -> Outcome {
        let view = render::composer_view(session, self.config.max_additions);
        let handle = transport
            .upsert_render(session.composer(), chat, &view)
            .await
            .map_err(DispatchError::transport)?;
        session.set_composer(handle);
        Ok(())
    }

    async fn send_roster<T: Transport>(&self, chat: ChatId, transport: &T) -> Outcome {
        let view = render::roster_view(&self.stores.approvers());
        transport
            .send(chat, &view)
            .await
            .map(|_| ())
            .map_err(DispatchError::transport)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("stores", &self.stores)
            .field("sessions", &self.sessions)
            .field("config", &self.config)
            .finish()
    }
}

async fn reply<T: Transport>(transport: &T, chat: ChatId, body: &str) -> Outcome {
    transport
        .send(chat, &View::text(body))
        .await
        .map(|_| ())
        .map_err(DispatchError::transport)
}

async fn refuse<T: Transport>(transport: &T, query: &str, rejection: &Rejection) -> Outcome {
    let toast = render::rejection(rejection);
    ack(transport, query, Some(toast.as_str())).await
}

async fn ack<T: Transport>(transport: &T, query: &str, toast: Option<&str>) -> Outcome {
    transport
        .acknowledge(query, toast)
        .await
        .map_err(DispatchError::transport)
}

/// Delete a message that is no longer needed. It may already be gone.
async fn discard<T: Transport>(transport: &T, handle: Option<MessageHandle>) {
    if let Some(handle) = handle {
        if let Err(err) = transport.delete(handle).await {
            tracing::debug!(handle = %handle, error = %err, "stale message not deleted");
        }
    }
}

/// Parse `<id> [handle]`.
fn parse_approver_add(text: &str) -> Result<(UserId, String), ComposerError> {
    let mut words = text.split_whitespace();
    let id = words
        .next()
        .and_then(|w| w.parse::<i64>().ok())
        .ok_or_else(|| ComposerError::MalformedAdminInput(format!("expected `<id> [handle]`, got {text:?}")))?;
    let handle = words
        .next()
        .map(|h| h.trim_start_matches('@').to_string())
        .unwrap_or_default();
    Ok((UserId::new(id), handle))
}

/// Parse a numeric user id.
fn parse_approver_remove(text: &str) -> Result<UserId, ComposerError> {
    text.trim()
        .parse::<i64>()
        .map(UserId::new)
        .map_err(|_| ComposerError::MalformedAdminInput(format!("expected a numeric id, got {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/up@composer_bot"), Some(Command::Export));
        assert_eq!(Command::parse("/UPUSER now"), Some(Command::Roster));
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("/"), None);
    }

    #[test]
    fn test_command_name_must_follow_slash() {
        assert_eq!(Command::parse("/ start"), None);
        assert_eq!(Command::parse("/@bot"), None);
        assert_eq!(Command::parse("\t/cancel"), Some(Command::Cancel));
    }

    #[test]
    fn test_parse_approver_add() {
        let (id, handle) = parse_approver_add("123 @Ann").unwrap();
        assert_eq!(id, UserId::new(123));
        assert_eq!(handle, "Ann");

        let (_, handle) = parse_approver_add("  42 ").unwrap();
        assert_eq!(handle, "");

        assert!(matches!(
            parse_approver_add("ann 123"),
            Err(ComposerError::MalformedAdminInput(_))
        ));
    }

    #[test]
    fn test_parse_approver_remove() {
        assert_eq!(parse_approver_remove(" 77 ").unwrap(), UserId::new(77));
        assert!(parse_approver_remove("77 ann").is_err());
    }

    #[test]
    fn test_selection_out_of_range_reports_len() {
        let router = Router::from_config(ComposerConfig::default());
        match router.resolve_selection(99) {
            Err(ComposerError::SelectionOutOfRange { index, len }) => {
                assert_eq!(index, 99);
                assert_eq!(len, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
