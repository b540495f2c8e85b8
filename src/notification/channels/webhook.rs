//! 通用 webhook 渠道
//!
//! 与 Slack 渠道共用同一种传输方式，但 payload 只有一个 `text` 字段，
//! 服务于遗留/自定义端点。

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;
use tracing::info;

use super::templates;
use crate::notification::channel::{NotificationChannel, NotificationError};
use crate::notification::policy::{ChannelKind, WebhookConfig};
use crate::notification::summary::{
    BreakingChangeContext, DisableContext, SchemaUpdateNotification, SyncSummary,
};

/// 纯文本 webhook 渠道
pub struct GenericWebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl GenericWebhookChannel {
    pub fn new(config: WebhookConfig, timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    fn post_text(&self, text: &str) -> Result<bool, NotificationError> {
        if !self.config.is_configured() {
            return Ok(false);
        }

        let response = self
            .client
            .post(&self.config.url)
            .json(&json!({ "text": text }))
            .send()?;
        let status = response.status();
        let response_body = response.text().unwrap_or_default();
        if status.is_success() {
            info!(status = status.as_u16(), "Webhook notification delivered");
            Ok(true)
        } else {
            Err(NotificationError::Delivery {
                status: status.as_u16(),
                body: response_body,
            })
        }
    }
}

impl NotificationChannel for GenericWebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    fn notify_job_failure(&self, summary: &SyncSummary) -> Result<bool, NotificationError> {
        self.post_text(&templates::job_failure(summary))
    }

    fn notify_job_success(&self, summary: &SyncSummary) -> Result<bool, NotificationError> {
        self.post_text(&templates::job_success(summary))
    }

    fn notify_connection_disabled(
        &self,
        context: &DisableContext,
    ) -> Result<bool, NotificationError> {
        self.post_text(&templates::connection_disabled(context))
    }

    fn notify_connection_disable_warning(
        &self,
        context: &DisableContext,
    ) -> Result<bool, NotificationError> {
        self.post_text(&templates::connection_disable_warning(context))
    }

    fn notify_schema_propagated(
        &self,
        notification: &SchemaUpdateNotification,
        diff_summary: &str,
    ) -> Result<bool, NotificationError> {
        let text = format!(
            "The schema of '{}' has changed.\n{}",
            notification.connection.name, diff_summary
        );
        self.post_text(&text)
    }

    fn notify_breaking_change_warning(
        &self,
        _context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError> {
        Err(NotificationError::Unsupported {
            channel: ChannelKind::Webhook,
            operation: "notify_breaking_change_warning",
        })
    }

    fn notify_breaking_change_syncs_disabled(
        &self,
        _context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError> {
        Err(NotificationError::Unsupported {
            channel: ChannelKind::Webhook,
            operation: "notify_breaking_change_syncs_disabled",
        })
    }

    fn notify_test(&self, message: &str) -> Result<bool, NotificationError> {
        self.post_text(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_unconfigured_url_is_noop() {
        let channel =
            GenericWebhookChannel::new(WebhookConfig::default(), Duration::from_secs(1)).unwrap();
        assert_eq!(channel.notify_test("ping").unwrap(), false);
    }

    #[test]
    fn test_disable_text_mentions_connectors_and_ids() {
        let context = DisableContext {
            receiver_email: None,
            source_connector: "Postgres".to_string(),
            destination_connector: "BigQuery".to_string(),
            job_description: "sync started on May 1, running for 5 min 0 sec.".to_string(),
            workspace_id: Uuid::from_u128(1),
            connection_id: Uuid::from_u128(2),
        };
        let text = templates::connection_disabled(&context);
        assert!(text.contains("Postgres"));
        assert!(text.contains("BigQuery"));
        assert!(text.contains(&Uuid::from_u128(1).to_string()));
        assert!(text.contains(&Uuid::from_u128(2).to_string()));
        assert!(text.contains("was automatically disabled"));

        let warning = templates::connection_disable_warning(&context);
        assert!(warning.contains("scheduled to be automatically disabled"));
    }
}
