//! Effects produced by state transitions

use super::event::{ButtonAction, MessageId};
use crate::submission::SubmissionRecord;

/// One inline button; rendered one per row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Keyboard attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Inline buttons under the message
    Inline(Vec<InlineButton>),
    /// Reply keyboard with a single button
    Reply(String),
    /// Remove any active reply keyboard
    Remove,
}

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a new message to the session's chat
    SendText {
        text: String,
        reply_to: Option<MessageId>,
        keyboard: Option<Keyboard>,
    },

    /// Replace the inline keyboard of an existing message
    EditKeyboard {
        message_id: MessageId,
        buttons: Vec<InlineButton>,
    },

    /// Remove the inline keyboard of an existing message. Best effort: a
    /// failure is logged and does not abort the transition.
    StripKeyboard { message_id: MessageId },

    /// Persist the finished report
    WriteSubmission { record: SubmissionRecord },
}

impl Effect {
    /// Plain reply to the message that triggered the transition
    pub fn reply(text: impl Into<String>, message_id: MessageId) -> Self {
        Effect::SendText {
            text: text.into(),
            reply_to: Some(message_id),
            keyboard: None,
        }
    }

    /// New message carrying a keyboard
    pub fn send_with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::SendText {
            text: text.into(),
            reply_to: None,
            keyboard: Some(keyboard),
        }
    }
}
