pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// A new post observed in a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPost {
    /// Channel the post arrived in
    pub chat_id: i64,
    /// Per-channel sequential id assigned by the platform
    pub message_id: i32,
}

impl From<&teloxide::types::Message> for ChannelPost {
    fn from(msg: &teloxide::types::Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        }
    }
}

/// Outbound side of the messaging platform.
///
/// Any `Err` counts as a failed relay; callers do not inspect the error kind.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Forward `message_id` from the `source` channel into `target`
    async fn forward(&self, target: i64, source: i64, message_id: i32) -> Result<()>;
}
