use std::collections::HashSet;

/// Decides whether a source message may be dispatched.
///
/// `admit` returns true exactly once per id; the in-memory implementation
/// only remembers ids for the lifetime of the process.
pub trait DispatchGuard: Send {
    fn admit(&mut self, message_id: i32) -> bool;

    /// Number of distinct ids admitted so far
    fn recorded(&self) -> usize;
}

/// Volatile set of message ids already handled
#[derive(Debug, Default)]
pub struct ProcessedSet {
    seen: HashSet<i32>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchGuard for ProcessedSet {
    fn admit(&mut self, message_id: i32) -> bool {
        self.seen.insert(message_id)
    }

    fn recorded(&self) -> usize {
        self.seen.len()
    }
}
