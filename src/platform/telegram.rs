use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::gate::SourceGate;
use crate::platform::{ChannelPost, Relay};

/// Relays posts through the Bot API `forwardMessage` call
#[derive(Clone)]
pub struct TelegramRelay {
    bot: Bot,
}

impl TelegramRelay {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Relay for TelegramRelay {
    async fn forward(&self, target: i64, source: i64, message_id: i32) -> Result<()> {
        self.bot
            .forward_message(ChatId(target), ChatId(source), MessageId(message_id))
            .await
            .with_context(|| format!("forwardMessage {} -> {}", source, target))?;
        Ok(())
    }
}

/// Channel post from the source channel, or `None` for anything else
fn accept(gate: &SourceGate, msg: &Message) -> Option<ChannelPost> {
    let post = ChannelPost::from(msg);
    gate.matches(&post).then_some(post)
}

/// Handle on the polling task started by [`subscribe`]
pub struct Subscription {
    task: JoinHandle<()>,
    shutdown: ShutdownToken,
}

impl Subscription {
    /// Ask the dispatcher to stop polling and wait for it to finish.
    /// The post stream ends once this returns.
    pub async fn stop(self) -> Result<()> {
        match self.shutdown.shutdown() {
            Ok(done) => done.await,
            Err(_) => warn!("Telegram dispatcher was not running when asked to stop"),
        }
        self.join().await
    }

    /// Wait for the dispatcher task without asking it to stop
    pub async fn join(self) -> Result<()> {
        self.task.await.context("Telegram dispatcher task failed")
    }
}

/// Start long polling and expose matching channel posts as a stream.
///
/// The returned receiver yields posts in arrival order and ends once the
/// dispatcher task stops.
pub fn subscribe(bot: Bot, gate: SourceGate) -> (Subscription, UnboundedReceiver<ChannelPost>) {
    let (tx, rx) = mpsc::unbounded::<ChannelPost>();

    let handler = Update::filter_channel_post()
        .filter_map(move |msg: Message| accept(&gate, &msg))
        .endpoint(enqueue);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![tx])
        // Other update kinds and other chats are dropped without a trace
        .default_handler(|_upd| async {})
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .build();
    let shutdown = dispatcher.shutdown_token();

    let task = tokio::spawn(async move {
        info!("Starting Telegram polling...");
        dispatcher.dispatch().await;
        info!("Telegram polling stopped");
    });

    (Subscription { task, shutdown }, rx)
}

async fn enqueue(post: ChannelPost, tx: UnboundedSender<ChannelPost>) -> ResponseResult<()> {
    if let Err(e) = tx.unbounded_send(post) {
        error!(
            "Relay queue closed, dropping message {}: {}",
            post.message_id, e
        );
    }
    Ok(())
}
