//! Per-user composition sessions.
//!
//! A session owns the fragments being composed, the single interaction the
//! user is expected to complete next ([`Pending`]), and the handles of the
//! composer and picker messages it last rendered.
//!
//! ## Exclusivity
//!
//! Exactly one [`Pending`] value exists per user. Transitions that start a
//! waiting interaction succeed only from [`Pending::Idle`]; from any other
//! state they return a [`Rejection`] and leave the session untouched. Free
//! text is therefore always routed to exactly one consumer.

pub mod registry;

use crate::types::{Fragment, GlyphId, MessageHandle};

pub use registry::{EvictionPolicy, SessionHandle, SessionRegistry};

/// Administrative interactions that consume the next free-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminIntent {
    /// Waiting for `<id> [handle]` of an approver to add.
    ApproverAdd,
    /// Waiting for the id of an approver to remove.
    ApproverRemove,
    /// Waiting for a backup token to restore.
    BackupRestore,
}

/// What the session is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pending {
    /// Nothing pending.
    #[default]
    Idle,
    /// Next free text becomes a new fragment.
    FragmentText,
    /// Picker open for `fragment`, showing `page`.
    GlyphSelection {
        /// Fragment that receives the selected glyph.
        fragment: usize,
        /// Page currently shown.
        page: usize,
    },
    /// Next free text names `glyph` in the catalog.
    GlyphName {
        /// Captured glyph awaiting a name.
        glyph: GlyphId,
    },
    /// Next free text is input for an admin action.
    Admin(AdminIntent),
}

impl Pending {
    /// Human description used in "finish this first" notices.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "nothing",
            Self::FragmentText => "the text of the next fragment",
            Self::GlyphSelection { .. } => "a glyph choice in the open picker",
            Self::GlyphName { .. } => "a name for the captured glyph",
            Self::Admin(AdminIntent::ApproverAdd) => "an approver to add",
            Self::Admin(AdminIntent::ApproverRemove) => "an approver to remove",
            Self::Admin(AdminIntent::BackupRestore) => "a backup token",
        }
    }

    /// Whether the next free-text message belongs to this interaction.
    pub fn consumes_text(&self) -> bool {
        !matches!(self, Self::Idle | Self::GlyphSelection { .. })
    }
}

/// Why a transition was refused. The session is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The fragment list already holds the primary plus all additions.
    #[error("fragment limit reached ({max} additions)")]
    CapReached {
        /// Configured addition limit.
        max: usize,
    },
    /// Another interaction is pending.
    #[error("still waiting for {pending}")]
    Busy {
        /// Description of the pending interaction.
        pending: &'static str,
    },
    /// A captured glyph still needs its name.
    #[error("name the previous glyph first")]
    GlyphNamePending,
    /// The fragment index does not exist.
    #[error("fragment {index} does not exist")]
    NoSuchFragment {
        /// Requested index.
        index: usize,
    },
    /// A picker action arrived while no picker is open.
    #[error("the picker is closed")]
    PickerClosed,
}

/// A user's composition state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    fragments: Vec<Fragment>,
    pending: Pending,
    composer: Option<MessageHandle>,
    picker: Option<MessageHandle>,
}

impl Session {
    /// Fresh session with no fragments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragments in display order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Current pending interaction.
    pub fn pending(&self) -> &Pending {
        &self.pending
    }

    /// Number of fragments beyond the primary one.
    pub fn additions(&self) -> usize {
        self.fragments.len().saturating_sub(1)
    }

    /// Last rendered composer message.
    pub fn composer(&self) -> Option<MessageHandle> {
        self.composer
    }

    /// Record the composer message.
    pub fn set_composer(&mut self, handle: MessageHandle) {
        self.composer = Some(handle);
    }

    /// Last rendered picker message.
    pub fn picker(&self) -> Option<MessageHandle> {
        self.picker
    }

    /// Record the picker message.
    pub fn set_picker(&mut self, handle: MessageHandle) {
        self.picker = Some(handle);
    }

    /// Forget the picker message, returning it for cleanup.
    pub fn take_picker(&mut self) -> Option<MessageHandle> {
        self.picker.take()
    }

    /// Replace everything with a single primary fragment.
    ///
    /// Render handles are dropped and an open picker is closed; the old
    /// picker handle is returned so it can be deleted.
    pub fn start_composition(&mut self, text: &str, glyph: &GlyphId) -> Option<MessageHandle> {
        self.fragments = vec![Fragment::new(text, Some(glyph.clone()))];
        self.pending = Pending::Idle;
        self.composer = None;
        self.take_picker()
    }

    /// Start waiting for another fragment.
    pub fn request_fragment(&mut self, max_additions: usize) -> Result<(), Rejection> {
        if self.additions() >= max_additions {
            return Err(Rejection::CapReached { max: max_additions });
        }
        self.enter(Pending::FragmentText)
    }

    /// Append the awaited fragment. Returns its index.
    pub fn append_fragment(&mut self, text: &str, glyph: &GlyphId) -> Result<usize, Rejection> {
        if self.pending != Pending::FragmentText {
            return Err(self.busy());
        }
        self.fragments.push(Fragment::new(text, Some(glyph.clone())));
        self.pending = Pending::Idle;
        Ok(self.fragments.len() - 1)
    }

    /// Cancel awaited fragment text or glyph name. Returns what was cancelled.
    pub fn cancel_input(&mut self) -> Option<Pending> {
        match self.pending {
            Pending::FragmentText | Pending::GlyphName { .. } => {
                Some(std::mem::take(&mut self.pending))
            }
            _ => None,
        }
    }

    /// Cancel whatever is pending. Returns the previous state.
    pub fn cancel_all(&mut self) -> Pending {
        std::mem::take(&mut self.pending)
    }

    /// Open the picker for fragment `index` on page 0.
    pub fn open_picker(&mut self, index: usize) -> Result<(), Rejection> {
        self.fragment_exists(index)?;
        self.enter(Pending::GlyphSelection {
            fragment: index,
            page: 0,
        })
    }

    /// Record the page the picker now shows.
    pub fn set_picker_page(&mut self, page: usize) -> Result<(), Rejection> {
        match &mut self.pending {
            Pending::GlyphSelection { page: current, .. } => {
                *current = page;
                Ok(())
            }
            _ => Err(Rejection::PickerClosed),
        }
    }

    /// Fragment and page of the open picker.
    pub fn picker_state(&self) -> Result<(usize, usize), Rejection> {
        match self.pending {
            Pending::GlyphSelection { fragment, page } => Ok((fragment, page)),
            _ => Err(Rejection::PickerClosed),
        }
    }

    /// Give the picker target `glyph` (or none) and close the picker.
    pub fn assign_glyph(&mut self, glyph: Option<GlyphId>) -> Result<usize, Rejection> {
        let (index, _) = self.picker_state()?;
        if let Some(fragment) = self.fragments.get_mut(index) {
            fragment.glyph = glyph;
        }
        self.pending = Pending::Idle;
        Ok(index)
    }

    /// Close the picker without changing any fragment.
    pub fn close_picker(&mut self) -> Result<(), Rejection> {
        self.picker_state()?;
        self.pending = Pending::Idle;
        Ok(())
    }

    /// Flip fragment `index` between no glyph and `default`.
    ///
    /// Returns whether the fragment now has a glyph. The pending state is
    /// not consulted or changed.
    pub fn toggle_glyph(&mut self, index: usize, default: &GlyphId) -> Result<bool, Rejection> {
        let fragment = self
            .fragments
            .get_mut(index)
            .ok_or(Rejection::NoSuchFragment { index })?;
        fragment.glyph = match fragment.glyph {
            Some(_) => None,
            None => Some(default.clone()),
        };
        Ok(fragment.has_glyph())
    }

    /// Hold a submitted glyph until its catalog name arrives.
    pub fn capture_glyph(&mut self, glyph: GlyphId) -> Result<(), Rejection> {
        if matches!(self.pending, Pending::GlyphName { .. }) {
            return Err(Rejection::GlyphNamePending);
        }
        self.enter(Pending::GlyphName { glyph })
    }

    /// Release the captured glyph once its name arrived.
    pub fn take_glyph_name(&mut self) -> Option<GlyphId> {
        match std::mem::take(&mut self.pending) {
            Pending::GlyphName { glyph } => Some(glyph),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Start waiting for admin input.
    pub fn begin_admin(&mut self, intent: AdminIntent) -> Result<(), Rejection> {
        self.enter(Pending::Admin(intent))
    }

    /// Pending admin intent, if any.
    pub fn admin_intent(&self) -> Option<AdminIntent> {
        match self.pending {
            Pending::Admin(intent) => Some(intent),
            _ => None,
        }
    }

    /// Complete the pending admin intent.
    pub fn finish_admin(&mut self) {
        if self.admin_intent().is_some() {
            self.pending = Pending::Idle;
        }
    }

    fn enter(&mut self, next: Pending) -> Result<(), Rejection> {
        if self.pending != Pending::Idle {
            return Err(self.busy());
        }
        self.pending = next;
        Ok(())
    }

    fn busy(&self) -> Rejection {
        Rejection::Busy {
            pending: self.pending.describe(),
        }
    }

    fn fragment_exists(&self, index: usize) -> Result<(), Rejection> {
        if index < self.fragments.len() {
            Ok(())
        } else {
            Err(Rejection::NoSuchFragment { index })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_glyph() -> GlyphId {
        GlyphId::new("5285430309720966085")
    }

    fn composed(text: &str) -> Session {
        let mut session = Session::new();
        session.start_composition(text, &default_glyph());
        session
    }

    #[test]
    fn test_start_composition_replaces_fragments() {
        let mut session = composed("first");
        session.request_fragment(5).unwrap();
        session.append_fragment("second", &default_glyph()).unwrap();

        session.start_composition("fresh", &default_glyph());

        assert_eq!(session.fragments().len(), 1);
        assert_eq!(session.fragments()[0].text(), "fresh");
        assert_eq!(session.fragments()[0].glyph, Some(default_glyph()));
        assert_eq!(session.pending(), &Pending::Idle);
    }

    #[test]
    fn test_start_composition_closes_picker() {
        let mut session = composed("text");
        session.open_picker(0).unwrap();
        let handle = MessageHandle::new(crate::types::ChatId(1), crate::types::MessageId(2));
        session.set_picker(handle);

        assert_eq!(session.start_composition("new", &default_glyph()), Some(handle));
        assert_eq!(session.pending(), &Pending::Idle);
        assert!(session.picker().is_none());
    }

    #[test]
    fn test_cap_rejects_without_mutation() {
        let mut session = composed("p");
        for i in 0..5 {
            session.request_fragment(5).unwrap();
            session.append_fragment(&format!("a{i}"), &default_glyph()).unwrap();
        }
        assert_eq!(session.fragments().len(), 6);

        assert_eq!(
            session.request_fragment(5),
            Err(Rejection::CapReached { max: 5 })
        );
        assert_eq!(session.fragments().len(), 6);
        assert_eq!(session.pending(), &Pending::Idle);
    }

    #[test]
    fn test_second_capture_keeps_first() {
        let mut session = Session::new();
        session.capture_glyph(GlyphId::new("first")).unwrap();

        assert_eq!(
            session.capture_glyph(GlyphId::new("second")),
            Err(Rejection::GlyphNamePending)
        );
        assert_eq!(
            session.pending(),
            &Pending::GlyphName {
                glyph: GlyphId::new("first")
            }
        );

        session.cancel_input();
        session.capture_glyph(GlyphId::new("second")).unwrap();
        assert_eq!(session.take_glyph_name(), Some(GlyphId::new("second")));
    }

    #[test]
    fn test_waiting_modes_are_exclusive() {
        let mut session = composed("p");
        session.request_fragment(5).unwrap();

        assert!(matches!(
            session.capture_glyph(GlyphId::new("g")),
            Err(Rejection::Busy { .. })
        ));
        assert!(matches!(session.open_picker(0), Err(Rejection::Busy { .. })));
        assert!(matches!(
            session.begin_admin(AdminIntent::BackupRestore),
            Err(Rejection::Busy { .. })
        ));
        assert_eq!(session.pending(), &Pending::FragmentText);
    }

    #[test]
    fn test_cancel_input_ignores_picker_and_admin() {
        let mut session = composed("p");
        session.open_picker(0).unwrap();
        assert_eq!(session.cancel_input(), None);
        assert!(session.picker_state().is_ok());

        session.close_picker().unwrap();
        session.begin_admin(AdminIntent::ApproverAdd).unwrap();
        assert_eq!(session.cancel_input(), None);
        assert_eq!(session.cancel_all(), Pending::Admin(AdminIntent::ApproverAdd));
        assert_eq!(session.pending(), &Pending::Idle);
    }

    #[test]
    fn test_picker_assign_targets_fragment() {
        let mut session = composed("p");
        session.request_fragment(5).unwrap();
        session.append_fragment("second", &default_glyph()).unwrap();

        session.open_picker(1).unwrap();
        session.set_picker_page(2).unwrap();
        assert_eq!(session.picker_state(), Ok((1, 2)));

        assert_eq!(session.assign_glyph(Some(GlyphId::new("x"))), Ok(1));
        assert_eq!(session.fragments()[1].glyph, Some(GlyphId::new("x")));
        assert_eq!(session.fragments()[0].glyph, Some(default_glyph()));
        assert_eq!(session.pending(), &Pending::Idle);
    }

    #[test]
    fn test_picker_actions_need_open_picker() {
        let mut session = composed("p");
        assert_eq!(session.assign_glyph(None), Err(Rejection::PickerClosed));
        assert_eq!(session.set_picker_page(1), Err(Rejection::PickerClosed));
        assert_eq!(session.close_picker(), Err(Rejection::PickerClosed));
    }

    #[test]
    fn test_open_picker_checks_index() {
        let mut session = composed("p");
        assert_eq!(
            session.open_picker(3),
            Err(Rejection::NoSuchFragment { index: 3 })
        );
        assert_eq!(session.pending(), &Pending::Idle);
    }

    #[test]
    fn test_toggle_flips_between_none_and_default() {
        let mut session = composed("p");
        assert_eq!(session.toggle_glyph(0, &default_glyph()), Ok(false));
        assert_eq!(session.fragments()[0].glyph, None);
        assert_eq!(session.toggle_glyph(0, &default_glyph()), Ok(true));
        assert_eq!(session.fragments()[0].glyph, Some(default_glyph()));
        assert_eq!(
            session.toggle_glyph(4, &default_glyph()),
            Err(Rejection::NoSuchFragment { index: 4 })
        );
    }

    #[test]
    fn test_take_glyph_name_only_in_name_mode() {
        let mut session = composed("p");
        session.request_fragment(5).unwrap();
        assert_eq!(session.take_glyph_name(), None);
        assert_eq!(session.pending(), &Pending::FragmentText);
    }
}
