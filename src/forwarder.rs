use std::sync::Arc;

use tracing::{info, warn};

use crate::platform::Relay;
use crate::retry::RetryPolicy;

/// Per-destination outcome of one fan-out
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: Vec<i64>,
    pub failed: Vec<i64>,
}

/// Relays one source message to every target, one after another
pub struct Forwarder {
    relay: Arc<dyn Relay>,
    source: i64,
    targets: Vec<i64>,
    policy: RetryPolicy,
}

impl Forwarder {
    pub fn new(relay: Arc<dyn Relay>, source: i64, targets: Vec<i64>, policy: RetryPolicy) -> Self {
        Self {
            relay,
            source,
            targets,
            policy,
        }
    }

    pub fn targets(&self) -> &[i64] {
        &self.targets
    }

    /// Forward to a single target, retrying per the policy.
    /// Returns whether the target received the message.
    pub async fn forward_one(&self, target: i64, message_id: i32) -> bool {
        let label = target.to_string();
        let result = self
            .policy
            .run(&label, || self.relay.forward(target, self.source, message_id))
            .await;

        match result {
            Ok(()) => {
                info!("[SUCCESS] Forwarded to {}", target);
                true
            }
            Err(e) => {
                warn!("Dropping message {} for {}: {}", message_id, target, e);
                false
            }
        }
    }

    /// Forward to every target in list order. A failing target never
    /// stops the ones after it.
    pub async fn forward_all(&self, message_id: i32) -> FanOut {
        let mut fan_out = FanOut::default();

        for &target in &self.targets {
            if self.forward_one(target, message_id).await {
                fan_out.delivered.push(target);
            } else {
                fan_out.failed.push(target);
            }
        }

        fan_out
    }
}
