//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::{ChatId, InlineButton, Keyboard, MessageId};
use crate::telegram::types::{InlineKeyboardMarkup, ReplyMarkup};
use crate::telegram::TelegramClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound side of the chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new message, optionally as a reply and with a keyboard
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), String>;

    /// Replace the inline keyboard of `message_id` in place
    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        buttons: &[InlineButton],
    ) -> Result<(), String>;

    /// Acknowledge a button press so the client stops its spinner
    async fn answer_callback(&self, callback_id: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), String> {
        (**self).send_text(chat_id, text, reply_to, keyboard).await
    }

    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        buttons: &[InlineButton],
    ) -> Result<(), String> {
        (**self).edit_keyboard(chat_id, message_id, buttons).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), String> {
        (**self).answer_callback(callback_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use `TelegramClient` as `ChatTransport`
#[derive(Clone)]
pub struct TelegramTransport {
    client: Arc<TelegramClient>,
}

impl TelegramTransport {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), String> {
        self.client
            .send_message(chat_id, text, reply_to, keyboard.map(ReplyMarkup::from))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        buttons: &[InlineButton],
    ) -> Result<(), String> {
        let markup = InlineKeyboardMarkup::from_buttons(buttons);
        match self
            .client
            .edit_message_reply_markup(chat_id, message_id, markup)
            .await
        {
            Ok(()) => Ok(()),
            // A double tap can race an identical edit; the message already
            // shows what we wanted
            Err(e) if e.message.contains("message is not modified") => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), String> {
        self.client
            .answer_callback_query(callback_id)
            .await
            .map_err(|e| e.to_string())
    }
}
