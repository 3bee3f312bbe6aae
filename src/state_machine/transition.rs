//! Pure state transition function
//!
//! The `match` in [`transition`] is the whole dispatch table: one arm per
//! accepted `(state, event)` pair, everything else falls through to
//! [`TransitionError::Unhandled`].

use super::{
    ButtonAction, Effect, Event, FormField, FormState, InlineButton, Keyboard, MessageId, Session,
};
use crate::checklist::{
    render_snapshot, CheckedItems, CHECKED_GLYPH, CHECKLIST_ITEMS, CONFIRM_LABEL, UNCHECKED_GLYPH,
};
use thiserror::Error;

const PROMPT_SURNAME: &str = "Введите вашу фамилию:";
const PROMPT_ROOM: &str = "Введите номер кабинета:";
const PROMPT_STUDIO: &str = "Введите название студии:";
const PROMPT_DATE: &str = "Введите дату (например, 03.07.2025):";
const PROMPT_BATTERY: &str = "Введите заряд телефона (в процентах):";
const PROMPT_CHECKLIST: &str = "Пройдите чек-лист, нажимая на пункты:";
const PROMPT_CONFIRM: &str = "Нажмите 'Подтвердить' для сохранения результатов.";
const SUBMISSION_SAVED: &str = "✅ Данные сохранены. Спасибо!";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    /// Session to commit, or `None` to clear it
    pub new_session: Option<Session>,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: Some(session),
            effects: vec![],
        }
    }

    /// The session ends and its state is dropped
    pub fn cleared() -> Self {
        Self {
            new_session: None,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events the current state does not accept. The runtime drops these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Event {event} not accepted in state {state}")]
    Unhandled {
        state: FormState,
        event: &'static str,
    },
    #[error("Checklist index {0} out of range")]
    InvalidChecklistIndex(usize),
    #[error("Checklist incomplete: {checked} of {total} items checked")]
    ChecklistIncomplete { checked: usize, total: usize },
    #[error("Session is missing fields required for submission")]
    MissingFields,
}

/// Pure transition function
///
/// Given the same session and event it always produces the same result and
/// performs no I/O.
pub fn transition(session: &Session, event: Event) -> Result<TransitionResult, TransitionError> {
    match (session.state, event) {
        // Start resets from anywhere
        (_, Event::Start { message_id }) => Ok(TransitionResult::new(Session::new())
            .with_effect(Effect::reply(PROMPT_SURNAME, message_id))),

        // Free-text prompts
        (FormState::AwaitingSurname, Event::Text { text, message_id }) => Ok(answer(
            session,
            FormField::Surname,
            text,
            FormState::AwaitingRoom,
            PROMPT_ROOM,
            message_id,
        )),
        (FormState::AwaitingRoom, Event::Text { text, message_id }) => Ok(answer(
            session,
            FormField::Room,
            text,
            FormState::AwaitingStudio,
            PROMPT_STUDIO,
            message_id,
        )),
        (FormState::AwaitingStudio, Event::Text { text, message_id }) => Ok(answer(
            session,
            FormField::Studio,
            text,
            FormState::AwaitingDate,
            PROMPT_DATE,
            message_id,
        )),
        (FormState::AwaitingDate, Event::Text { text, message_id }) => Ok(answer(
            session,
            FormField::Date,
            text,
            FormState::AwaitingBattery,
            PROMPT_BATTERY,
            message_id,
        )),

        // Battery is the last prompt; it opens the checklist
        (FormState::AwaitingBattery, Event::Text { text, .. }) => {
            let mut next = session.clone();
            next.fields.set(FormField::Battery, text);
            next.checked = CheckedItems::new();
            next.state = FormState::AwaitingChecklist;
            let keyboard = Keyboard::Inline(checklist_keyboard(&next.checked));
            Ok(TransitionResult::new(next)
                .with_effect(Effect::send_with_keyboard(PROMPT_CHECKLIST, keyboard)))
        }

        (
            FormState::AwaitingChecklist,
            Event::Button {
                action: ButtonAction::Toggle(index),
                message_id,
            },
        ) => {
            let mut next = session.clone();
            if next.checked.toggle(index).is_none() {
                return Err(TransitionError::InvalidChecklistIndex(index));
            }
            let buttons = checklist_keyboard(&next.checked);
            Ok(TransitionResult::new(next).with_effect(Effect::EditKeyboard {
                message_id,
                buttons,
            }))
        }

        (
            FormState::AwaitingChecklist,
            Event::Button {
                action: ButtonAction::ConfirmChecklist,
                message_id,
            },
        ) => {
            if !session.checked.is_complete() {
                return Err(TransitionError::ChecklistIncomplete {
                    checked: session.checked.len(),
                    total: CHECKLIST_ITEMS.len(),
                });
            }
            let mut next = session.clone();
            next.checklist_snapshot = Some(render_snapshot(&next.checked));
            next.state = FormState::AwaitingConfirmation;
            // Prompt first: if it fails the checklist message keeps its buttons
            Ok(TransitionResult::new(next)
                .with_effect(Effect::send_with_keyboard(
                    PROMPT_CONFIRM,
                    Keyboard::Reply(CONFIRM_LABEL.to_string()),
                ))
                .with_effect(Effect::StripKeyboard { message_id }))
        }

        (FormState::AwaitingConfirmation, Event::Text { text, message_id })
            if text == CONFIRM_LABEL =>
        {
            let record = session
                .submission_record()
                .ok_or(TransitionError::MissingFields)?;
            Ok(TransitionResult::cleared()
                .with_effect(Effect::WriteSubmission { record })
                .with_effect(Effect::SendText {
                    text: SUBMISSION_SAVED.to_string(),
                    reply_to: Some(message_id),
                    keyboard: Some(Keyboard::Remove),
                }))
        }

        (state, event) => Err(TransitionError::Unhandled {
            state,
            event: event.kind(),
        }),
    }
}

/// Store a free-text answer and ask the next question
fn answer(
    session: &Session,
    field: FormField,
    text: String,
    next_state: FormState,
    prompt: &str,
    message_id: MessageId,
) -> TransitionResult {
    let mut next = session.clone();
    next.fields.set(field, text);
    next.state = next_state;
    TransitionResult::new(next).with_effect(Effect::reply(prompt, message_id))
}

/// Inline keyboard for the checklist: one toggle per item, plus the confirm
/// button once every item is checked.
pub fn checklist_keyboard(checked: &CheckedItems) -> Vec<InlineButton> {
    let mut buttons: Vec<InlineButton> = CHECKLIST_ITEMS
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let glyph = if checked.contains(i) {
                CHECKED_GLYPH
            } else {
                UNCHECKED_GLYPH
            };
            InlineButton::new(format!("{glyph} {item}"), ButtonAction::Toggle(i))
        })
        .collect();

    if checked.is_complete() {
        buttons.push(InlineButton::new(CONFIRM_LABEL, ButtonAction::ConfirmChecklist));
    }
    buttons
}
