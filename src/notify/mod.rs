pub mod notifier;
pub mod slack;
pub mod console;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

pub use notifier::{Notifier, NotifyResult, ThreadDelivery, ThreadStatus};
pub use slack::SlackMessenger;
pub use console::ConsoleMessenger;

/// Handle to a delivered message, used to thread replies under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post `text`, as a reply to `thread` when given.
    async fn post(&self, text: &str, thread: Option<&MessageRef>) -> Result<MessageRef, ReportError>;

    /// Messenger name for logging
    fn name(&self) -> &str;
}
