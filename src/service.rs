use std::sync::Arc;

use chrono::Utc;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::forwarder::{FanOut, Forwarder};
use crate::gate::SourceGate;
use crate::guard::DispatchGuard;
use crate::platform::ChannelPost;
use crate::stats::RelayStats;

/// What happened to one incoming post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not from the source channel
    Ignored,
    /// Already dispatched earlier in this process
    Duplicate,
    Dispatched(FanOut),
}

/// Source gate, dispatch guard and fan-out wired together.
/// Posts are handled strictly one at a time.
pub struct RelayService {
    gate: SourceGate,
    guard: Box<dyn DispatchGuard>,
    forwarder: Forwarder,
    stats: Arc<RelayStats>,
}

impl RelayService {
    pub fn new(
        gate: SourceGate,
        guard: Box<dyn DispatchGuard>,
        forwarder: Forwarder,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            gate,
            guard,
            forwarder,
            stats,
        }
    }

    pub async fn handle(&mut self, post: ChannelPost) -> Disposition {
        if !self.gate.matches(&post) {
            return Disposition::Ignored;
        }

        let msg_id = post.message_id;
        if !self.guard.admit(msg_id) {
            info!("[SKIP] Message {} already processed", msg_id);
            return Disposition::Duplicate;
        }
        self.stats.set_recorded(self.guard.recorded());

        info!("[INFO] New message detected (msg_id={}), forwarding...", msg_id);
        let fan_out = self.forwarder.forward_all(msg_id).await;
        if !fan_out.delivered.is_empty() {
            self.stats.mark_relayed(Utc::now());
        }
        Disposition::Dispatched(fan_out)
    }

    /// Drain the event stream, finishing each post (every target, every
    /// retry) before pulling the next one.
    pub async fn run<S>(mut self, posts: S)
    where
        S: Stream<Item = ChannelPost>,
    {
        futures::pin_mut!(posts);

        info!(
            "Relaying channel {} to {} target(s)",
            self.gate.source(),
            self.forwarder.targets().len()
        );

        while let Some(post) = posts.next().await {
            if let Disposition::Dispatched(fan_out) = self.handle(post).await {
                debug!(
                    "Message {} delivered to {}/{} target(s), failed: {:?}",
                    post.message_id,
                    fan_out.delivered.len(),
                    self.forwarder.targets().len(),
                    fan_out.failed
                );
            }
        }

        warn!("Channel post stream ended");
    }
}
