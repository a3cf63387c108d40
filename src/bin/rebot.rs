//! rebot HTTP server binary.
//!
//! Receives Slack events on `/slack/events`, resolves each message to a
//! capability through Mistral, and replies in the user's DM.
//!
//! Settings come from CLI flags or the environment (a `.env` file in the
//! working directory is loaded first); see `rebot --help`. `RUST_LOG`
//! controls the tracing filter (default: `info,rebot=debug`).
//!
//! # Usage
//!
//! ```bash
//! MISTRAL_API_KEY=... SLACK_BOT_TOKEN=xoxb-... SLACK_SIGNING_SECRET=... cargo run --bin rebot
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use rebot::config::Settings;
use rebot::dispatch::Dispatcher;
use rebot::extensions::default_registry;
use rebot::ledger::{self, EventLedger, SqliteEventLedger};
use rebot::llms::providers::MistralCompletion;
use rebot::resolution::Resolver;
use rebot::server::{app_router, AppState};
use rebot::transport::slack::SignatureVerifier;
use rebot::transport::SlackTransport;

const PRUNE_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rebot=debug".into()),
        )
        .init();

    let settings = Settings::parse();

    let registry = Arc::new(default_registry().context("failed to build capability registry")?);
    tracing::info!("Registered {} capabilities", registry.len());

    let gateway = MistralCompletion::new(Some(settings.mistral_api_key.clone()))
        .with_base_url(settings.mistral_base_url.clone())
        .with_model(settings.mistral_model.clone())
        .with_temperature(settings.mistral_temperature)
        .with_max_tokens(settings.mistral_max_tokens)
        .with_timeout(settings.mistral_timeout())
        .with_max_retries(settings.mistral_max_retries);

    let ledger: Arc<dyn EventLedger> = Arc::new(
        SqliteEventLedger::open(&settings.db_path)
            .with_context(|| format!("failed to open ledger at {}", settings.db_path.display()))?,
    );
    tracing::info!(
        "Event ledger at {} ({} records)",
        settings.db_path.display(),
        ledger.len()?
    );

    let transport = SlackTransport::new(settings.slack_bot_token.clone())
        .with_api_base(settings.slack_api_base.clone());
    let identity = transport
        .identity()
        .await
        .context("failed to look up the bot's Slack identity")?;
    tracing::info!(
        "Running as Slack user {} (bot {})",
        identity.user_id,
        identity.bot_id.as_deref().unwrap_or("-")
    );
    let verifier = SignatureVerifier::new(settings.slack_signing_secret.clone())
        .with_replay_window(settings.slack_replay_window());

    let resolver = Resolver::new(registry, Arc::new(gateway));
    let dispatcher = Arc::new(
        Dispatcher::new(resolver, Arc::clone(&ledger), Arc::new(transport))
            .with_error_replies(settings.error_reply_policy()),
    );

    let (events_tx, events_rx) = mpsc::channel(settings.queue_depth());
    let dispatch_loop = tokio::spawn(dispatcher.run(events_rx));

    let retention_task = settings.retention().map(|retention| {
        tracing::info!(
            "Pruning ledger records older than {} days",
            retention.num_days()
        );
        tokio::spawn(ledger::run_retention(
            Arc::clone(&ledger),
            retention,
            PRUNE_PERIOD,
        ))
    });

    let app = app_router(AppState::new(events_tx, verifier, identity));

    tracing::info!("rebot server starting on {}", settings.listen);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       liveness check");
    tracing::info!("  POST /slack/events Slack Events API");

    let listener = tokio::net::TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    // The router (and its queue sender) is gone; let queued events finish.
    tracing::info!("Draining dispatch queue");
    if let Err(e) = dispatch_loop.await {
        tracing::error!("Dispatch loop failed: {}", e);
    }
    if let Some(task) = retention_task {
        task.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
