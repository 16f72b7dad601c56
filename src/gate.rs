use crate::platform::ChannelPost;

/// Accepts only posts from the configured source channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceGate {
    source: i64,
}

impl SourceGate {
    pub fn new(source: i64) -> Self {
        Self { source }
    }

    pub fn source(&self) -> i64 {
        self.source
    }

    pub fn matches(&self, post: &ChannelPost) -> bool {
        post.chat_id == self.source
    }
}
