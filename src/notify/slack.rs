use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::ReportError;
use crate::utils::truncation::truncate_chars;
use super::{MessageRef, Messenger};

/// Slack rejects section text longer than this.
pub const MAX_SECTION_CHARS: usize = 3000;
const MAX_FALLBACK_CHARS: usize = 150;

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    ts: Option<String>,
    channel: Option<Value>,
}

impl SlackResponse {
    /// `chat.postMessage` returns the channel id as a string,
    /// `conversations.open` as an object.
    fn channel_id(&self) -> Option<&str> {
        match &self.channel {
            Some(Value::String(id)) => Some(id.as_str()),
            Some(obj) => obj["id"].as_str(),
            None => None,
        }
    }
}

/// Messenger that posts to a Slack channel through the Web API.
pub struct SlackMessenger {
    client: Client,
    base_url: String,
    token: String,
    destination: String,
    dm_channel: OnceCell<String>,
}

impl SlackMessenger {
    pub fn new(client: Client, base_url: &str, token: &str, destination: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            destination: destination.to_string(),
            dm_channel: OnceCell::new(),
        }
    }

    async fn call(&self, method: &str, body: &Value) -> Result<SlackResponse, ReportError> {
        let resp = self.client
            .post(format!("{}/{}", self.base_url, method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| ReportError::Notify(format!("Slack {} request failed: {}", method, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReportError::Notify(format!("Slack {} returned HTTP {}", method, status)));
        }

        let data: SlackResponse = resp
            .json()
            .await
            .map_err(|e| ReportError::Notify(format!("Malformed Slack {} response: {}", method, e)))?;
        if !data.ok {
            return Err(ReportError::Notify(format!(
                "Slack {} failed: {}",
                method,
                data.error.as_deref().unwrap_or("unknown_error")
            )));
        }
        Ok(data)
    }

    async fn open_direct_message(&self) -> Result<String, ReportError> {
        let data = self.call("conversations.open", &json!({ "users": self.destination })).await?;
        data.channel_id()
            .map(str::to_string)
            .ok_or_else(|| ReportError::Notify("conversations.open returned no channel".into()))
    }

    /// Channel to post to. User ids are resolved to a DM channel once; if that
    /// fails the user id is used as-is.
    async fn channel(&self) -> String {
        if !self.destination.starts_with('U') {
            return self.destination.clone();
        }
        match self.dm_channel.get_or_try_init(|| self.open_direct_message()).await {
            Ok(channel) => channel.clone(),
            Err(e) => {
                warn!(error = %e, "Could not open direct message channel, posting to user id");
                self.destination.clone()
            }
        }
    }
}

#[async_trait]
impl Messenger for SlackMessenger {
    async fn post(&self, text: &str, thread: Option<&MessageRef>) -> Result<MessageRef, ReportError> {
        let channel = match thread {
            Some(parent) => parent.channel.clone(),
            None => self.channel().await,
        };

        let mut body = json!({
            "channel": channel,
            "text": fallback_text(text),
            "blocks": section_blocks(text),
        });
        if let Some(parent) = thread {
            body["thread_ts"] = json!(parent.ts);
        }

        let data = self.call("chat.postMessage", &body).await?;
        let ts = data
            .ts
            .clone()
            .ok_or_else(|| ReportError::Notify("chat.postMessage returned no ts".into()))?;
        let channel = data.channel_id().map(str::to_string).unwrap_or(channel);

        debug!(channel = %channel, ts = %ts, threaded = thread.is_some(), "Slack message posted");
        Ok(MessageRef { channel, ts })
    }

    fn name(&self) -> &str {
        "slack"
    }
}

/// Notification text: the first line without mrkdwn emphasis.
pub fn fallback_text(text: &str) -> String {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("Cloud cost report");
    let plain = first.replace(['*', '_', '`'], "");
    truncate_chars(plain.trim(), MAX_FALLBACK_CHARS).to_string()
}

/// One mrkdwn section per paragraph, split further when a paragraph exceeds
/// Slack's section limit.
pub fn section_blocks(text: &str) -> Vec<Value> {
    let mut blocks = Vec::new();
    for paragraph in text.split("\n\n").filter(|p| !p.trim().is_empty()) {
        let mut rest = paragraph;
        while !rest.is_empty() {
            let chunk = truncate_chars(rest, MAX_SECTION_CHARS);
            blocks.push(json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": chunk},
            }));
            rest = &rest[chunk.len()..];
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_text_strips_markup() {
        let text = "*Cloud cost report for 2026-10-14*\nTotal: *35.00 USD*";
        assert_eq!(fallback_text(text), "Cloud cost report for 2026-10-14");
    }

    #[test]
    fn test_fallback_text_empty() {
        assert_eq!(fallback_text(""), "Cloud cost report");
    }

    #[test]
    fn test_section_per_paragraph() {
        let blocks = section_blocks("header\n\n```\ntable\n```\n\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "section");
        assert_eq!(blocks[0]["text"]["type"], "mrkdwn");
        assert_eq!(blocks[1]["text"]["text"], "```\ntable\n```");
    }

    #[test]
    fn test_long_paragraph_split() {
        let long = "é".repeat(MAX_SECTION_CHARS + 10);
        let blocks = section_blocks(&long);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["text"]["text"].as_str().unwrap().chars().count(), MAX_SECTION_CHARS);
        assert_eq!(blocks[1]["text"]["text"].as_str().unwrap().chars().count(), 10);
    }

    #[test]
    fn test_channel_id_shapes() {
        let posted: SlackResponse = serde_json::from_str(r#"{"ok":true,"channel":"C1","ts":"1.2"}"#).unwrap();
        assert_eq!(posted.channel_id(), Some("C1"));
        let opened: SlackResponse = serde_json::from_str(r#"{"ok":true,"channel":{"id":"D9"}}"#).unwrap();
        assert_eq!(opened.channel_id(), Some("D9"));
    }
}
