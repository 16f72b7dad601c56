mod config;
mod forwarder;
mod gate;
mod guard;
mod heartbeat;
mod logging;
mod platform;
mod retry;
mod service;
mod stats;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use teloxide::Bot;
use tracing::{info, warn};

use crate::config::Config;
use crate::forwarder::Forwarder;
use crate::gate::SourceGate;
use crate::guard::ProcessedSet;
use crate::heartbeat::Heartbeat;
use crate::platform::telegram::{self, TelegramRelay};
use crate::retry::RetryPolicy;
use crate::service::RelayService;
use crate::stats::RelayStats;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing token ends the process here, before anything starts
    let config = Config::from_env().context("Failed to load configuration")?;

    logging::init(&config.logging)?;

    let policy = RetryPolicy::default();
    info!("Configuration loaded successfully");
    info!("  Source channel: {}", config.channels.source);
    info!("  Target channels: {:?}", config.channels.targets);
    info!(
        "  Retry: {} attempt(s), {:?} apart",
        policy.max_attempts, policy.delay
    );
    info!("  Log file: {}", config.logging.file_path().display());
    if config.channels.targets.is_empty() {
        warn!("No target channels configured, posts will only be logged");
    }

    let stats = Arc::new(RelayStats::new(Utc::now()));
    let heartbeat = Heartbeat::start(&config.heartbeat.cron, stats.clone()).await?;

    let bot = Bot::new(&config.telegram.bot_token);
    let gate = SourceGate::new(config.channels.source);
    let forwarder = Forwarder::new(
        Arc::new(TelegramRelay::new(bot.clone())),
        config.channels.source,
        config.channels.targets.clone(),
        policy,
    );
    let service = RelayService::new(gate, Box::new(ProcessedSet::new()), forwarder, stats);

    info!("Forwarder is running and listening...");
    let (subscription, posts) = telegram::subscribe(bot, gate);
    let mut relay = tokio::spawn(service.run(posts));

    // The stream also ends on its own when polling dies, e.g. on a rejected token
    let (relayed, polled) = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, stopping Telegram polling");
            let polled = subscription.stop().await;
            // Posts already received are still relayed
            (relay.await, polled)
        }
        relayed = &mut relay => (relayed, subscription.join().await),
    };
    if let Err(e) = relayed {
        warn!("Relay task failed: {}", e);
    }
    if let Err(e) = polled {
        warn!("{:#}", e);
    }
    heartbeat.stop().await?;

    Ok(())
}
