//! Events that drive a form session

/// Chat identifier assigned by the transport
pub type ChatId = i64;

/// Message identifier within a chat
pub type MessageId = i64;

const TOGGLE_PREFIX: &str = "toggle_";
const CONFIRM_CHECKLIST: &str = "confirm_checklist";

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The start command, accepted in every state
    Start { message_id: MessageId },
    /// Any other text message
    Text { text: String, message_id: MessageId },
    /// An inline button press on the message `message_id`
    Button {
        action: ButtonAction,
        message_id: MessageId,
    },
}

impl Event {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Text { .. } => "text",
            Event::Button {
                action: ButtonAction::Toggle(_),
                ..
            } => "toggle",
            Event::Button {
                action: ButtonAction::ConfirmChecklist,
                ..
            } => "confirm_checklist",
            Event::Button {
                action: ButtonAction::Unknown(_),
                ..
            } => "unknown_button",
        }
    }
}

/// Decoded inline-button callback data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// `toggle_<index>`
    Toggle(usize),
    /// `confirm_checklist`
    ConfirmChecklist,
    /// Anything this bot never renders
    Unknown(String),
}

impl ButtonAction {
    pub fn parse(data: &str) -> Self {
        if data == CONFIRM_CHECKLIST {
            return ButtonAction::ConfirmChecklist;
        }
        data.strip_prefix(TOGGLE_PREFIX)
            .and_then(|index| index.parse().ok())
            .map_or_else(
                || ButtonAction::Unknown(data.to_string()),
                ButtonAction::Toggle,
            )
    }

    pub fn callback_data(&self) -> String {
        match self {
            ButtonAction::Toggle(index) => format!("{TOGGLE_PREFIX}{index}"),
            ButtonAction::ConfirmChecklist => CONFIRM_CHECKLIST.to_string(),
            ButtonAction::Unknown(raw) => raw.clone(),
        }
    }
}
