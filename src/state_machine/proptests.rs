//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::transition::*;
use super::*;
use crate::checklist::{render_snapshot, CheckedItems, CHECKLIST_ITEMS, CONFIRM_LABEL};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_index() -> impl Strategy<Value = usize> {
    0..CHECKLIST_ITEMS.len()
}

fn arb_checked() -> impl Strategy<Value = CheckedItems> {
    proptest::collection::btree_set(arb_index(), 0..=CHECKLIST_ITEMS.len()).prop_map(|set| {
        let mut checked = CheckedItems::new();
        for i in set {
            checked.toggle(i);
        }
        checked
    })
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 .]{0,20}",
        Just(CONFIRM_LABEL.to_string()),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => (1i64..100).prop_map(|message_id| Event::Start { message_id }),
        6 => (arb_text(), 1i64..100).prop_map(|(text, message_id)| Event::Text { text, message_id }),
        6 => (0usize..12).prop_map(|i| Event::Button {
            action: ButtonAction::Toggle(i),
            message_id: 7,
        }),
        2 => Just(Event::Button {
            action: ButtonAction::ConfirmChecklist,
            message_id: 7,
        }),
        1 => "[a-z_]{1,10}".prop_map(|raw| Event::Button {
            action: ButtonAction::Unknown(raw),
            message_id: 7,
        }),
    ]
}

fn arb_state() -> impl Strategy<Value = FormState> {
    proptest::sample::select(FormState::ORDER.to_vec())
}

/// A session consistent with its state: fields up to the state are filled,
/// the snapshot exists once the checklist is confirmed
fn arb_session() -> impl Strategy<Value = Session> {
    (arb_state(), arb_checked(), "[a-zA-Z]{1,8}").prop_map(|(state, checked, value)| {
        let mut session = Session::new();
        let fields = [
            FormField::Surname,
            FormField::Room,
            FormField::Studio,
            FormField::Date,
            FormField::Battery,
        ];
        for field in fields.iter().take(state.position()) {
            session.fields.set(*field, value.clone());
        }
        session.state = state;
        if state.position() >= FormState::AwaitingChecklist.position() {
            session.checked = checked;
        }
        if state == FormState::AwaitingConfirmation {
            let mut all = CheckedItems::new();
            for i in 0..CHECKLIST_ITEMS.len() {
                all.toggle(i);
            }
            session.checklist_snapshot = Some(render_snapshot(&all));
            session.checked = all;
        }
        session
    })
}

fn apply(session: &Session, event: Event) -> Option<Session> {
    match transition(session, event) {
        Ok(result) => result.new_session,
        Err(_) => Some(session.clone()),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Non-start events move at most one step forward, never back or skipping
    #[test]
    fn prop_linear_progress(session in arb_session(), event in arb_event()) {
        let is_start = matches!(event, Event::Start { .. });
        let from = session.state.position();
        match transition(&session, event) {
            Ok(TransitionResult { new_session: Some(next), .. }) => {
                let to = next.state.position();
                if is_start {
                    prop_assert_eq!(to, 0);
                } else {
                    prop_assert!(to == from || to == from + 1, "{} -> {}", from, to);
                }
            }
            Ok(TransitionResult { new_session: None, .. }) => {
                prop_assert_eq!(session.state, FormState::AwaitingConfirmation);
            }
            Err(_) => {}
        }
    }

    /// Start wipes any progress and re-asks the first prompt
    #[test]
    fn prop_start_always_resets(session in arb_session(), message_id in 1i64..100) {
        let result = transition(&session, Event::Start { message_id }).unwrap();
        let next = result.new_session.unwrap();
        prop_assert_eq!(next, Session::new());
        prop_assert_eq!(result.effects.len(), 1);
    }

    #[test]
    fn prop_double_toggle_is_identity(checked in arb_checked(), index in arb_index()) {
        let mut session = Session::new();
        session.state = FormState::AwaitingChecklist;
        session.checked = checked;

        let toggle = || Event::Button { action: ButtonAction::Toggle(index), message_id: 7 };
        let once = apply(&session, toggle()).unwrap();
        let twice = apply(&once, toggle()).unwrap();

        prop_assert_ne!(&once.checked, &session.checked);
        prop_assert_eq!(twice, session);
    }

    #[test]
    fn prop_confirm_button_iff_complete(checked in arb_checked()) {
        let buttons = checklist_keyboard(&checked);
        let has_confirm = buttons.iter().any(|b| b.action == ButtonAction::ConfirmChecklist);
        prop_assert_eq!(has_confirm, checked.len() == CHECKLIST_ITEMS.len());
        prop_assert_eq!(
            buttons.len(),
            CHECKLIST_ITEMS.len() + usize::from(has_confirm)
        );
    }

    #[test]
    fn prop_snapshot_matches_checked(checked in arb_checked()) {
        let snapshot = render_snapshot(&checked);
        let lines: Vec<&str> = snapshot.lines().collect();
        prop_assert_eq!(lines.len(), CHECKLIST_ITEMS.len());
        for (i, (line, item)) in lines.iter().zip(CHECKLIST_ITEMS).enumerate() {
            let mark = if checked.contains(i) { "[✅]" } else { "[❌]" };
            prop_assert_eq!(*line, format!("{mark} {item}"));
        }
    }

    /// Checked indices stay in range whatever buttons arrive
    #[test]
    fn prop_checked_stays_in_range(events in proptest::collection::vec(arb_event(), 0..60)) {
        let mut session = Some(Session::new());
        for event in events {
            let current = session.take().unwrap_or_default();
            session = apply(&current, event);
            if let Some(s) = &session {
                prop_assert!(s.checked.len() <= CHECKLIST_ITEMS.len());
                prop_assert!((0..CHECKLIST_ITEMS.len())
                    .filter(|i| s.checked.contains(*i))
                    .count() == s.checked.len());
            }
        }
    }

    /// Toggles outside the checklist never change state
    #[test]
    fn prop_toggle_outside_checklist_rejected(session in arb_session(), index in arb_index()) {
        prop_assume!(session.state != FormState::AwaitingChecklist);
        let event = Event::Button { action: ButtonAction::Toggle(index), message_id: 7 };
        let rejected = matches!(
            transition(&session, event),
            Err(TransitionError::Unhandled { .. })
        );
        prop_assert!(rejected);
    }

    /// A record is produced only from a confirmed checklist
    #[test]
    fn prop_submission_only_after_confirmation(session in arb_session(), event in arb_event()) {
        if let Ok(result) = transition(&session, event) {
            let writes = result
                .effects
                .iter()
                .any(|e| matches!(e, Effect::WriteSubmission { .. }));
            if writes {
                prop_assert_eq!(session.state, FormState::AwaitingConfirmation);
                prop_assert!(result.new_session.is_none());
            }
        }
    }
}
