//! Long-polling loop
//!
//! Pulls updates from `getUpdates`, turns them into form events and hands
//! them to the runtime manager.

use super::types::{Message, Update};
use super::{TelegramClient, TelegramError};
use crate::runtime::{ChatTransport, RuntimeManager};
use crate::session::SessionKey;
use crate::state_machine::{ButtonAction, Event};
use crate::submission::SubmissionSink;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const START_COMMAND: &str = "/start";
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// An update the form cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub key: SessionKey,
    pub event: Event,
    /// Set for button presses, which must be acknowledged
    pub callback_id: Option<String>,
}

/// Convert a raw update into a form event.
///
/// Returns `None` for anything the form ignores (non-text messages,
/// callbacks without data or message, other update kinds).
pub fn to_inbound(update: &Update) -> Option<Inbound> {
    if let Some(message) = &update.message {
        let text = message.text.as_deref()?;
        let event = if is_start_command(text) {
            Event::Start {
                message_id: message.message_id,
            }
        } else {
            Event::Text {
                text: text.to_string(),
                message_id: message.message_id,
            }
        };
        return Some(Inbound {
            key: sender_key(message),
            event,
            callback_id: None,
        });
    }

    let callback = update.callback_query.as_ref()?;
    let message = callback.message.as_ref()?;
    let data = callback.data.as_deref()?;
    Some(Inbound {
        key: SessionKey::new(message.chat.id, callback.from.id),
        event: Event::Button {
            action: ButtonAction::parse(data),
            message_id: message.message_id,
        },
        callback_id: Some(callback.id.clone()),
    })
}

/// Messages without a sender (channel posts) share one session per chat
fn sender_key(message: &Message) -> SessionKey {
    let user_id = message.from.as_ref().map_or(message.chat.id, |user| user.id);
    SessionKey::new(message.chat.id, user_id)
}

/// `/start`, `/start@SomeBot` and `/start payload` all count
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    command == START_COMMAND
}

fn backoff_delay(attempt: u32) -> Duration {
    // Exponential backoff: 1s, 2s, 4s ... capped at 64s
    Duration::from_secs(1 << attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT))
}

/// Call the API until it succeeds, retrying transient errors with backoff.
///
/// `Ok(None)` means `cancel` fired first. Non-retryable errors are returned.
async fn retrying<T, F, Fut>(
    method: &str,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<Option<T>, TelegramError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TelegramError>>,
{
    let mut failures: u32 = 0;
    loop {
        let result = tokio::select! {
            biased;

            () = cancel.cancelled() => return Ok(None),

            result = call() => result,
        };

        match result {
            Ok(value) => return Ok(Some(value)),
            Err(e) if e.is_retryable() => {
                failures += 1;
                let delay = e.retry_after.unwrap_or_else(|| backoff_delay(failures));
                tracing::warn!(
                    method,
                    error = %e,
                    attempt = failures,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Telegram call failed, retrying"
                );
                let cancelled = tokio::select! {
                    () = cancel.cancelled() => true,
                    () = tokio::time::sleep(delay) => false,
                };
                if cancelled {
                    return Ok(None);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Poll until `cancel` fires.
///
/// Transient API errors are retried with backoff; a non-retryable error
/// (bad token, malformed response) ends the loop.
pub async fn run_poller<T, S>(
    client: Arc<TelegramClient>,
    manager: Arc<RuntimeManager<T, S>>,
    poll_timeout: Duration,
    cancel: CancellationToken,
) -> Result<(), TelegramError>
where
    T: ChatTransport + 'static,
    S: SubmissionSink + 'static,
{
    // Drop whatever queued up while the bot was offline
    let Some(mut offset) = retrying("getUpdates", &cancel, || client.latest_offset()).await?
    else {
        tracing::info!("Poller stopped");
        return Ok(());
    };
    if let Some(offset) = offset {
        tracing::info!(offset, "Skipping pending updates");
    }

    tracing::info!("Polling for updates");

    loop {
        let updates = retrying("getUpdates", &cancel, || {
            client.get_updates(offset, poll_timeout)
        })
        .await?;
        let Some(updates) = updates else {
            break;
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(inbound) = to_inbound(&update) else {
                tracing::debug!(update_id = update.update_id, "Skipping unsupported update");
                continue;
            };
            dispatch(&manager, inbound).await;
        }
    }

    tracing::info!("Poller stopped");
    Ok(())
}

async fn dispatch<T, S>(manager: &RuntimeManager<T, S>, inbound: Inbound)
where
    T: ChatTransport + 'static,
    S: SubmissionSink + 'static,
{
    let Inbound {
        key,
        event,
        callback_id,
    } = inbound;

    if let Err(e) = manager.send_event(key, event).await {
        tracing::error!(
            chat_id = key.chat_id,
            user_id = key.user_id,
            error = %e,
            "Failed to queue event"
        );
    }

    // Always acknowledge, handled or not
    if let Some(id) = callback_id {
        if let Err(e) = manager.transport().answer_callback(&id).await {
            tracing::warn!(chat_id = key.chat_id, error = %e, "Failed to answer callback query");
        }
    }
}
