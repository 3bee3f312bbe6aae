//! Checklist bot - guided room-check form over Telegram
//!
//! Walks a user through a few text prompts and a ten-item checklist, then
//! saves the report as a text file.

mod checklist;
mod config;
mod runtime;
mod session;
mod state_machine;
mod submission;
mod telegram;

use config::BotConfig;
use runtime::{ProductionManager, TelegramTransport};
use session::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use submission::FileSubmissionSink;
use telegram::{run_poller, TelegramClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle workers and expired sessions are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How long queued events may take to finish after polling stops
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checklist_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env()?;
    tracing::info!(config = ?config, "Loaded configuration");

    let client = Arc::new(TelegramClient::new(
        &config.token,
        &config.api_url,
        config.poll_timeout,
    )?);
    let transport = Arc::new(TelegramTransport::new(client.clone()));
    let sink = Arc::new(FileSubmissionSink::new(&config.submissions_dir));
    let store = Arc::new(SessionStore::new(config.session_ttl, config.max_sessions));

    let manager: Arc<ProductionManager> = Arc::new(runtime::RuntimeManager::new(
        store,
        transport,
        sink,
        config.session_ttl,
        config.max_sessions,
    ));

    let cancel = CancellationToken::new();

    // Periodic eviction
    {
        let manager = manager.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        manager.sweep().await;
                    }
                }
            }
        });
    }

    // Ctrl-C stops polling
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
            }
            cancel.cancel();
        });
    }

    tracing::info!(
        submissions_dir = %config.submissions_dir.display(),
        "Checklist bot started"
    );
    let result = run_poller(client, manager.clone(), config.poll_timeout, cancel.clone()).await;
    cancel.cancel();
    manager.shutdown(SHUTDOWN_GRACE).await;
    result?;

    Ok(())
}
