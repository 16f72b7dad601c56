//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use crate::platform::Relay;

/// One recorded `Relay::forward` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCall {
    pub target: i64,
    pub source: i64,
    pub message_id: i32,
}

/// Relay that records every call and fails on demand per target
#[derive(Default)]
pub struct ScriptedRelay {
    calls: Mutex<Vec<RelayCall>>,
    remaining_failures: Mutex<HashMap<i64, u32>>,
}

impl ScriptedRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_always(self, target: i64) -> Self {
        self.fail_times(target, u32::MAX)
    }

    pub fn fail_times(self, target: i64, times: u32) -> Self {
        self.remaining_failures
            .lock()
            .unwrap()
            .insert(target, times);
        self
    }

    pub fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, target: i64) -> usize {
        self.calls().iter().filter(|c| c.target == target).count()
    }
}

#[async_trait]
impl Relay for ScriptedRelay {
    async fn forward(&self, target: i64, source: i64, message_id: i32) -> Result<()> {
        self.calls.lock().unwrap().push(RelayCall {
            target,
            source,
            message_id,
        });

        let mut failures = self.remaining_failures.lock().unwrap();
        match failures.get_mut(&target) {
            Some(0) | None => Ok(()),
            Some(left) => {
                if *left != u32::MAX {
                    *left -= 1;
                }
                anyhow::bail!("Forbidden: bot is not a member of the channel chat")
            }
        }
    }
}

/// In-memory log sink for asserting on emitted lines
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }

    /// Install as the thread-local subscriber until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
