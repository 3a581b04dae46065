use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ReportError;
use crate::reporting::ThreadText;
use super::{MessageRef, Messenger};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ThreadStatus {
    Sent,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadDelivery {
    pub project_id: String,
    #[serde(flatten)]
    pub status: ThreadStatus,
}

/// Outcome of a delivery whose summary went out. Thread failures are listed
/// here rather than failing the run.
#[derive(Debug, Clone, Serialize)]
pub struct NotifyResult {
    pub summary: MessageRef,
    pub threads: Vec<ThreadDelivery>,
}

impl NotifyResult {
    pub fn failed_projects(&self) -> Vec<&str> {
        self.threads
            .iter()
            .filter(|t| matches!(t.status, ThreadStatus::Failed { .. }))
            .map(|t| t.project_id.as_str())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.threads.iter().filter(|t| t.status == ThreadStatus::Sent).count()
    }

    pub fn is_partial(&self) -> bool {
        self.threads.iter().any(|t| t.status != ThreadStatus::Sent)
    }
}

pub struct Notifier {
    messenger: Arc<dyn Messenger>,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Send the summary, then each thread as a reply to it.
    ///
    /// A failed summary fails the whole delivery and nothing else is sent.
    /// Thread sends are independent: each failure is recorded and the rest
    /// still go out, in order.
    pub async fn send(&self, summary_text: &str, thread_texts: &[ThreadText]) -> Result<NotifyResult, ReportError> {
        let summary = self.messenger.post(summary_text, None).await.map_err(|e| match e {
            ReportError::Notify(msg) => ReportError::Notify(format!("Summary delivery failed: {}", msg)),
            other => ReportError::Notify(format!("Summary delivery failed: {}", other)),
        })?;
        info!(messenger = self.messenger.name(), channel = %summary.channel, ts = %summary.ts, "Summary sent");

        let mut threads = Vec::with_capacity(thread_texts.len());
        for thread in thread_texts {
            let status = match self.messenger.post(&thread.text, Some(&summary)).await {
                Ok(_) => ThreadStatus::Sent,
                Err(e) => {
                    warn!(project = %thread.project_id, error = %e, "Thread detail delivery failed");
                    ThreadStatus::Failed { reason: e.to_string() }
                }
            };
            threads.push(ThreadDelivery {
                project_id: thread.project_id.clone(),
                status,
            });
        }

        let result = NotifyResult { summary, threads };
        if !thread_texts.is_empty() {
            info!(
                sent = result.sent_count(),
                failed = result.failed_projects().len(),
                "Thread details delivered"
            );
        }
        Ok(result)
    }

    /// Best-effort standalone message, used for failure alerts.
    pub async fn send_alert(&self, text: &str) -> Result<MessageRef, ReportError> {
        self.messenger.post(text, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records posts; fails any post whose text contains a marker.
    struct RecordingMessenger {
        fail_marker: Option<&'static str>,
        posts: Mutex<Vec<(String, Option<String>)>>,
    }

    impl RecordingMessenger {
        fn new(fail_marker: Option<&'static str>) -> Self {
            Self { fail_marker, posts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn post(&self, text: &str, thread: Option<&MessageRef>) -> Result<MessageRef, ReportError> {
            if let Some(marker) = self.fail_marker {
                if text.contains(marker) {
                    return Err(ReportError::Notify("channel_not_found".into()));
                }
            }
            let mut posts = self.posts.lock().unwrap();
            posts.push((text.to_string(), thread.map(|t| t.ts.clone())));
            Ok(MessageRef { channel: "C1".into(), ts: format!("1700000000.{:06}", posts.len()) })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn threads(ids: &[&str]) -> Vec<ThreadText> {
        ids.iter()
            .map(|id| ThreadText { project_id: id.to_string(), text: format!("detail for {}", id) })
            .collect()
    }

    #[tokio::test]
    async fn test_threads_reply_to_summary() {
        let messenger = Arc::new(RecordingMessenger::new(None));
        let notifier = Notifier::new(messenger.clone());

        let result = notifier.send("summary", &threads(&["A", "B"])).await.unwrap();
        assert!(!result.is_partial());
        assert_eq!(result.sent_count(), 2);

        let posts = messenger.posts.lock().unwrap();
        assert_eq!(posts[0], ("summary".to_string(), None));
        assert_eq!(posts[1].1.as_deref(), Some(result.summary.ts.as_str()));
        assert_eq!(posts[2].0, "detail for B");
    }

    #[tokio::test]
    async fn test_one_thread_failure_does_not_stop_others() {
        let messenger = Arc::new(RecordingMessenger::new(Some("detail for B")));
        let notifier = Notifier::new(messenger.clone());

        let result = notifier.send("summary", &threads(&["A", "B", "C"])).await.unwrap();
        assert!(result.is_partial());
        assert_eq!(result.failed_projects(), vec!["B"]);
        assert_eq!(result.sent_count(), 2);
        assert_eq!(result.threads[0].status, ThreadStatus::Sent);
        assert!(matches!(&result.threads[1].status, ThreadStatus::Failed { reason } if reason.contains("channel_not_found")));
        assert_eq!(result.threads[2].status, ThreadStatus::Sent);
        assert_eq!(messenger.posts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_summary_failure_is_fatal() {
        let messenger = Arc::new(RecordingMessenger::new(Some("summary")));
        let notifier = Notifier::new(messenger.clone());

        let err = notifier.send("summary", &threads(&["A"])).await.unwrap_err();
        assert!(matches!(err, ReportError::Notify(_)));
        assert!(messenger.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_thread_delivery_serialization() {
        let delivery = ThreadDelivery {
            project_id: "B".into(),
            status: ThreadStatus::Failed { reason: "rate_limited".into() },
        };
        let json = serde_json::to_value(&delivery).unwrap();
        assert_eq!(json["project_id"], "B");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "rate_limited");
    }
}
