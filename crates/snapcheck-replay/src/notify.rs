//! Failure notifications
//!
//! Notifiers are informational only: the replay verifier calls them
//! fail-open, so a broken webhook never changes a verdict.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use snapcheck_core::diff::excerpt;
use snapcheck_core::{Result, SnapcheckError, VerificationResult};
use tracing::warn;

/// What gets sent about one failing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub step: usize,
    pub url: String,
    pub reason: String,
    /// First recorded text on the page, for context
    pub recorded_excerpt: Option<String>,
}

impl FailureSummary {
    /// `None` for passing pages
    pub fn from_result(result: &VerificationResult) -> Option<Self> {
        if result.pass {
            return None;
        }

        Some(Self {
            step: result.snapshot.ordinal(),
            url: result.snapshot.url.clone(),
            reason: result
                .failure_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            recorded_excerpt: result.snapshot.items.first().map(|i| excerpt(&i.text)),
        })
    }

    pub fn subject(&self) -> String {
        format!("snapcheck failed on step {}: {}", self.step, self.url)
    }
}

/// Pluggable notification backend
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &FailureSummary) -> Result<()>;
}

/// Does nothing; the default when no webhook is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _summary: &FailureSummary) -> Result<()> {
        Ok(())
    }
}

/// Incoming-webhook backend (Slack-compatible `text` payload)
pub struct WebhookNotifier {
    webhook_url: String,
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    fn payload(summary: &FailureSummary) -> serde_json::Value {
        let mut text = format!(
            ":rotating_light: *{}*\n*Reason:* {}",
            summary.subject(),
            summary.reason
        );
        if let Some(recorded) = &summary.recorded_excerpt {
            text.push_str(&format!("\n*Recorded:* {}", recorded));
        }

        json!({
            "text": text,
            "unfurl_links": false,
            "failure": summary,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, summary: &FailureSummary) -> Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&Self::payload(summary))
            .send()
            .await
            .map_err(|e| SnapcheckError::Other(format!("Webhook request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Webhook returned non-success");
            return Err(SnapcheckError::Other(format!("Webhook returned {}", status)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcheck_core::{BoundingBox, PageSnapshot, VisibleItem};

    fn failed_result() -> VerificationResult {
        let mut page = PageSnapshot::new(2, "https://app.test/reports?a=1&b=2", None);
        page.items.push(VisibleItem {
            tag: "h1".to_string(),
            text: "Quarterly <numbers>".to_string(),
            locator: "#title".to_string(),
            bounding_box: BoundingBox::new(0.0, 0.0, 100.0, 30.0),
            scroll_y: 0.0,
        });
        VerificationResult::failed(page, "Missing element: <h1> \"Quarterly\" (#title)")
    }

    #[test]
    fn test_summary_only_for_failures() {
        let passed = VerificationResult::passed(PageSnapshot::new(0, "/", None));
        assert!(FailureSummary::from_result(&passed).is_none());

        let summary = FailureSummary::from_result(&failed_result()).unwrap();
        assert_eq!(summary.step, 3);
        assert_eq!(summary.recorded_excerpt.as_deref(), Some("Quarterly <numbers>"));
        assert!(summary.subject().contains("step 3"));
    }

    #[test]
    fn test_webhook_payload() {
        let summary = FailureSummary::from_result(&failed_result()).unwrap();
        let payload = WebhookNotifier::payload(&summary);
        assert!(payload["text"].as_str().unwrap().contains("Missing element"));
        assert_eq!(payload["failure"]["step"], 3);
        let mut keys: Vec<&str> = payload.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["failure", "text", "unfurl_links"]);
    }

    #[tokio::test]
    async fn test_noop_notifier() {
        let summary = FailureSummary::from_result(&failed_result()).unwrap();
        assert!(NoopNotifier.notify(&summary).await.is_ok());
    }
}
