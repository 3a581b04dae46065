use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::errors::ReportError;
use super::{MessageRef, Messenger};

/// Prints messages to stdout instead of delivering them (`run --dry-run`).
#[derive(Default)]
pub struct ConsoleMessenger {
    sequence: AtomicU64,
}

impl ConsoleMessenger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn post(&self, text: &str, thread: Option<&MessageRef>) -> Result<MessageRef, ReportError> {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        match thread {
            Some(parent) => println!("--- reply to #{} ---\n{}\n", parent.ts, text),
            None => println!("--- message #{} ---\n{}\n", n, text),
        }
        Ok(MessageRef {
            channel: "stdout".to_string(),
            ts: n.to_string(),
        })
    }

    fn name(&self) -> &str {
        "console"
    }
}
