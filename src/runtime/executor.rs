//! Session runtime executor

use super::traits::ChatTransport;
use super::RuntimeError;
use crate::session::{SessionKey, SessionStore};
use crate::state_machine::{transition, Effect, Event, Session};
use crate::submission::SubmissionSink;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Single writer for one user's session in one chat
pub struct SessionRuntime<T, S>
where
    T: ChatTransport + 'static,
    S: SubmissionSink + 'static,
{
    key: SessionKey,
    store: Arc<SessionStore>,
    transport: Arc<T>,
    sink: Arc<S>,
    event_rx: mpsc::Receiver<Event>,
}

impl<T, S> SessionRuntime<T, S>
where
    T: ChatTransport + 'static,
    S: SubmissionSink + 'static,
{
    pub fn new(
        key: SessionKey,
        store: Arc<SessionStore>,
        transport: Arc<T>,
        sink: Arc<S>,
        event_rx: mpsc::Receiver<Event>,
    ) -> Self {
        Self {
            key,
            store,
            transport,
            sink,
            event_rx,
        }
    }

    /// Process events until the manager drops the queue
    pub async fn run(mut self) {
        let SessionKey { chat_id, user_id } = self.key;
        tracing::debug!(chat_id, user_id, "Starting session runtime");

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::error!(chat_id, user_id, error = %e, "Error handling event");
            }
        }

        tracing::debug!(chat_id, user_id, "Session runtime stopped");
    }

    /// Apply one event.
    ///
    /// The new session is committed only after every effect succeeded; on
    /// failure the stored session is left as it was before the event.
    pub async fn process_event(&self, event: Event) -> Result<(), RuntimeError> {
        let SessionKey { chat_id, user_id } = self.key;
        let session = self.store.get(self.key).unwrap_or_else(|| {
            tracing::debug!(chat_id, user_id, "No session, starting fresh");
            Session::new()
        });
        let event_kind = event.kind();

        let result = match transition(&session, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(
                    chat_id,
                    user_id,
                    state = %session.state,
                    event = event_kind,
                    reason = %e,
                    "Ignoring event"
                );
                return Ok(());
            }
        };

        for effect in result.effects {
            self.execute_effect(effect).await?;
        }

        match result.new_session {
            Some(next) => {
                tracing::debug!(
                    chat_id,
                    user_id,
                    from = %session.state,
                    to = %next.state,
                    event = event_kind,
                    "Transition"
                );
                self.store.put(self.key, next);
            }
            None => {
                tracing::info!(chat_id, user_id, "Session completed");
                self.store.clear(self.key);
            }
        }
        Ok(())
    }

    async fn execute_effect(&self, effect: Effect) -> Result<(), RuntimeError> {
        match effect {
            Effect::SendText {
                text,
                reply_to,
                keyboard,
            } => self
                .transport
                .send_text(self.key.chat_id, &text, reply_to, keyboard.as_ref())
                .await
                .map_err(RuntimeError::Transport),

            Effect::EditKeyboard {
                message_id,
                buttons,
            } => self
                .transport
                .edit_keyboard(self.key.chat_id, message_id, &buttons)
                .await
                .map_err(RuntimeError::Transport),

            Effect::StripKeyboard { message_id } => {
                if let Err(e) = self
                    .transport
                    .edit_keyboard(self.key.chat_id, message_id, &[])
                    .await
                {
                    tracing::warn!(
                        chat_id = self.key.chat_id,
                        message_id,
                        error = %e,
                        "Failed to strip inline keyboard"
                    );
                }
                Ok(())
            }

            Effect::WriteSubmission { record } => {
                let sink = self.sink.clone();
                let path = tokio::task::spawn_blocking(move || sink.write(&record)).await??;
                tracing::info!(
                    chat_id = self.key.chat_id,
                    user_id = self.key.user_id,
                    path = %path.display(),
                    "Submission saved"
                );
                Ok(())
            }
        }
    }
}
