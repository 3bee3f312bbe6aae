//! Bot API HTTP client

use super::types::{
    AnswerCallbackQuery, ApiResponse, EditMessageReplyMarkup, GetUpdates, InlineKeyboardMarkup,
    Message, ReplyMarkup, SendMessage, Update,
};
use super::TelegramError;
use crate::state_machine::{ChatId, MessageId};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Extra time on top of the long-poll timeout before the HTTP call gives up
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    /// `<api_url>/bot<token>`; never logged
    endpoint: String,
}

impl TelegramClient {
    pub fn new(token: &str, api_url: &str, poll_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        })
    }

    /// POST `params` to `method` and unwrap the response envelope
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.endpoint);
        let response = self.client.post(&url).json(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiResponse<R> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                TelegramError::decode(format!("{method}: {e}"))
            } else {
                TelegramError::from_status(status.as_u16(), body.clone())
            }
        })?;

        if envelope.ok {
            return envelope
                .result
                .ok_or_else(|| TelegramError::decode(format!("{method}: missing result")));
        }

        let code = envelope.error_code.unwrap_or_else(|| status.as_u16());
        let mut error = TelegramError::from_status(
            code,
            envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        );
        if let Some(secs) = envelope.parameters.and_then(|p| p.retry_after) {
            error = error.with_retry_after(Duration::from_secs(secs));
        }
        Err(error)
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdates {
            offset,
            limit: None,
            timeout: timeout.as_secs(),
            allowed_updates: vec!["message", "callback_query"],
        };
        self.call("getUpdates", &params).await
    }

    /// Offset just past the newest queued update, if any.
    ///
    /// Used at startup to skip whatever piled up while the bot was down.
    pub async fn latest_offset(&self) -> Result<Option<i64>, TelegramError> {
        let params = GetUpdates {
            offset: Some(-1),
            limit: Some(1),
            timeout: 0,
            allowed_updates: vec!["message", "callback_query"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &params).await?;
        Ok(updates.last().map(|u| u.update_id + 1))
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let params = SendMessage {
            chat_id,
            text,
            reply_to_message_id: reply_to,
            reply_markup,
        };
        self.call("sendMessage", &params).await
    }

    pub async fn edit_message_reply_markup(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reply_markup: InlineKeyboardMarkup,
    ) -> Result<(), TelegramError> {
        let params = EditMessageReplyMarkup {
            chat_id,
            message_id,
            reply_markup,
        };
        // Result is the edited Message, or `true` for inline messages
        let _: serde_json::Value = self.call("editMessageReplyMarkup", &params).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let params = AnswerCallbackQuery { callback_query_id };
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }
}
