//! Slack Incoming Webhook 渠道
//!
//! 渲染结构化的 block 消息并对 webhook 地址做一次同步 POST。顶层 `text`
//! 字段是纯文本回退，`blocks` 数组的形状必须与下游接收端保持逐字段兼容：
//! section 要么带 `text` 要么带 `fields`，field 一律是 mrkdwn 对象。

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::templates;
use crate::notification::channel::{NotificationChannel, NotificationError};
use crate::notification::format::{format_duration, format_volume};
use crate::notification::policy::{ChannelKind, SlackConfig};
use crate::notification::summary::{
    BreakingChangeContext, DisableContext, SchemaUpdateNotification, SyncSummary,
};

/// mrkdwn 文本对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mrkdwn {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl Mrkdwn {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "mrkdwn".to_string(),
            text: text.into(),
        }
    }
}

/// 消息块：section 或分隔线
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Mrkdwn>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<Mrkdwn>>,
    },
    Divider,
}

/// Slack 消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    /// 纯文本回退
    pub text: String,
    pub blocks: Vec<Block>,
}

impl SlackMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }

    pub fn add_section_text(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Section {
            text: Some(Mrkdwn::new(text)),
            fields: None,
        });
    }

    pub fn add_section_fields(&mut self, fields: Vec<Mrkdwn>) {
        self.blocks.push(Block::Section {
            text: None,
            fields: Some(fields),
        });
    }

    pub fn add_divider(&mut self) {
        self.blocks.push(Block::Divider);
    }

    /// 可点击链接的 mrkdwn 写法
    pub fn create_link(name: &str, url: &str) -> String {
        format!("<{}|{}>", url, name)
    }
}

/// Slack 渠道
pub struct SlackChannel {
    config: SlackConfig,
    client: Client,
}

impl SlackChannel {
    pub fn new(config: SlackConfig, timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    /// 作业完成（成功或失败）的 block 消息
    pub fn build_job_completed_message(summary: &SyncSummary, text: String) -> SlackMessage {
        let mut message = SlackMessage::new(text);

        let connection_link =
            SlackMessage::create_link(&summary.connection.name, &summary.connection.url);
        let title = if summary.is_success {
            "Sync completed"
        } else {
            "Sync failure occurred"
        };
        message.add_section_text(format!("{}: {}", title, connection_link));

        let has_duration = summary.started_at.is_some() && summary.finished_at.is_some();
        let mut fields = vec![Mrkdwn::new("*Source:*")];
        if has_duration {
            fields.push(Mrkdwn::new("*Duration:*"));
        }
        fields.push(Mrkdwn::new(SlackMessage::create_link(
            &summary.source.name,
            &summary.source.url,
        )));
        if let (Some(started_at), Some(finished_at)) = (summary.started_at, summary.finished_at) {
            fields.push(Mrkdwn::new(format_duration(started_at, finished_at)));
        }
        fields.push(Mrkdwn::new("*Destination:*"));
        fields.push(Mrkdwn::new(" "));
        fields.push(Mrkdwn::new(SlackMessage::create_link(
            &summary.destination.name,
            &summary.destination.url,
        )));
        message.add_section_fields(fields);

        if !summary.is_success {
            if let Some(error_message) = &summary.error_message {
                message.add_section_text(format!(
                    "*Failure reason:*\n\n```\n{}\n```\n",
                    error_message
                ));
            }
        }

        message.add_section_text(format!(
            "*Sync Summary:*\n{} record(s) loaded / {} record(s) extracted\n{} loaded / {} extracted\n",
            summary.records_committed,
            summary.records_emitted,
            format_volume(summary.bytes_committed),
            format_volume(summary.bytes_emitted),
        ));

        message
    }

    /// schema 变更传播的 block 消息
    pub fn build_schema_propagation_message(
        notification: &SchemaUpdateNotification,
        diff_summary: &str,
    ) -> SlackMessage {
        let header = format!(
            "The schema of '{}' has changed.",
            SlackMessage::create_link(&notification.connection.name, &notification.connection.url)
        );

        let mut message = SlackMessage::new(header.clone());
        message.add_section_text(header);
        message.add_section_fields(vec![
            Mrkdwn::new("*Workspace*"),
            Mrkdwn::new("*Source*"),
            Mrkdwn::new(SlackMessage::create_link(
                &notification.workspace.name,
                &notification.workspace.url,
            )),
            Mrkdwn::new(SlackMessage::create_link(
                &notification.source.name,
                &notification.source.url,
            )),
        ]);
        message.add_divider();
        message.add_section_text(diff_summary);
        message
    }

    /// 同步 POST 一个 JSON 消息体；空 webhook 地址是刻意 no-op
    fn post_json(&self, body: &serde_json::Value) -> Result<bool, NotificationError> {
        if !self.config.is_configured() {
            return Ok(false);
        }

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(body)
            .send()?;
        let status = response.status();
        let response_body = response.text().unwrap_or_default();
        if status.is_success() {
            info!(status = status.as_u16(), body = %response_body, "Slack notification delivered");
            Ok(true)
        } else {
            Err(NotificationError::Delivery {
                status: status.as_u16(),
                body: response_body,
            })
        }
    }

    fn post_message(&self, message: &SlackMessage) -> Result<bool, NotificationError> {
        let body = serde_json::to_value(message)
            .map_err(|e| NotificationError::Render(e.to_string()))?;
        self.post_json(&body)
    }

    fn post_text(&self, text: &str) -> Result<bool, NotificationError> {
        self.post_json(&json!({ "text": text }))
    }
}

impl NotificationChannel for SlackChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Slack
    }

    fn notify_job_failure(&self, summary: &SyncSummary) -> Result<bool, NotificationError> {
        let text = templates::job_failure(summary);
        self.post_message(&Self::build_job_completed_message(summary, text))
    }

    fn notify_job_success(&self, summary: &SyncSummary) -> Result<bool, NotificationError> {
        let text = templates::job_success(summary);
        self.post_message(&Self::build_job_completed_message(summary, text))
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
        let message = Self::build_schema_propagation_message(notification, diff_summary);
        self.post_message(&message)
    }

    fn notify_breaking_change_warning(
        &self,
        _context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError> {
        // 单收件人渠道无法可靠批量送达
        Err(NotificationError::Unsupported {
            channel: ChannelKind::Slack,
            operation: "notify_breaking_change_warning",
        })
    }

    fn notify_breaking_change_syncs_disabled(
        &self,
        _context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError> {
        Err(NotificationError::Unsupported {
            channel: ChannelKind::Slack,
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
    use crate::notification::summary::ParticipantInfo;
    use chrono::TimeZone;
    use chrono::Utc;
    use uuid::Uuid;

    fn participant(n: u128, name: &str) -> ParticipantInfo {
        ParticipantInfo::new(
            Uuid::from_u128(n),
            name,
            format!("https://app.example.com/{}", name),
        )
    }

    fn summary(is_success: bool) -> SyncSummary {
        SyncSummary {
            workspace: participant(1, "acme"),
            connection: participant(2, "pg-to-wh"),
            source: participant(3, "postgres"),
            destination: participant(4, "warehouse"),
            started_at: Some(Utc.timestamp_opt(1000, 0).unwrap()),
            finished_at: Some(Utc.timestamp_opt(1090, 0).unwrap()),
            is_success,
            job_id: 7,
            error_message: if is_success {
                None
            } else {
                Some("source crashed".to_string())
            },
            records_emitted: 1000,
            records_committed: 990,
            bytes_emitted: 2048,
            bytes_committed: 1024,
        }
    }

    #[test]
    fn test_create_link() {
        assert_eq!(
            SlackMessage::create_link("pg-to-wh", "https://app.example.com/c/2"),
            "<https://app.example.com/c/2|pg-to-wh>"
        );
    }

    #[test]
    fn test_wire_shape_of_simple_message() {
        let mut message = SlackMessage::new("fallback");
        message.add_section_text("hello");
        message.add_section_fields(vec![Mrkdwn::new("*Source:*")]);
        message.add_divider();

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "text": "fallback",
                "blocks": [
                    { "type": "section", "text": { "type": "mrkdwn", "text": "hello" } },
                    { "type": "section", "fields": [ { "type": "mrkdwn", "text": "*Source:*" } ] },
                    { "type": "divider" }
                ]
            })
        );
    }

    #[test]
    fn test_job_completed_title_success_and_failure() {
        let ok = SlackChannel::build_job_completed_message(&summary(true), "t".to_string());
        match &ok.blocks[0] {
            Block::Section { text: Some(t), .. } => {
                assert!(t.text.starts_with("Sync completed: "));
                assert!(t.text.contains("<https://app.example.com/pg-to-wh|pg-to-wh>"));
            }
            other => panic!("unexpected block {:?}", other),
        }

        let failed = SlackChannel::build_job_completed_message(&summary(false), "t".to_string());
        match &failed.blocks[0] {
            Block::Section { text: Some(t), .. } => {
                assert!(t.text.starts_with("Sync failure occurred: "));
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_job_completed_metadata_fields_with_duration() {
        let message = SlackChannel::build_job_completed_message(&summary(true), "t".to_string());
        match &message.blocks[1] {
            Block::Section {
                fields: Some(fields),
                ..
            } => {
                let texts: Vec<&str> = fields.iter().map(|f| f.text.as_str()).collect();
                assert_eq!(
                    texts,
                    vec![
                        "*Source:*",
                        "*Duration:*",
                        "<https://app.example.com/postgres|postgres>",
                        "1 min 30 sec",
                        "*Destination:*",
                        " ",
                        "<https://app.example.com/warehouse|warehouse>",
                    ]
                );
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_job_completed_omits_duration_without_timestamps() {
        let mut s = summary(true);
        s.started_at = None;
        let message = SlackChannel::build_job_completed_message(&s, "t".to_string());
        match &message.blocks[1] {
            Block::Section {
                fields: Some(fields),
                ..
            } => {
                assert!(!fields.iter().any(|f| f.text == "*Duration:*"));
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_failure_reason_block_only_on_failure() {
        let failed = SlackChannel::build_job_completed_message(&summary(false), "t".to_string());
        let rendered = serde_json::to_string(&failed).unwrap();
        assert!(rendered.contains("*Failure reason:*"));
        assert!(rendered.contains("source crashed"));

        let ok = SlackChannel::build_job_completed_message(&summary(true), "t".to_string());
        let rendered_ok = serde_json::to_string(&ok).unwrap();
        assert!(!rendered_ok.contains("*Failure reason:*"));
    }

    #[test]
    fn test_sync_summary_block_uses_binary_volumes() {
        let message = SlackChannel::build_job_completed_message(&summary(true), "t".to_string());
        let rendered = serde_json::to_string(&message).unwrap();
        assert!(rendered.contains("990 record(s) loaded / 1000 record(s) extracted"));
        assert!(rendered.contains("1 kB loaded / 2 kB extracted"));
    }

    #[test]
    fn test_schema_propagation_message_shape() {
        let notification = SchemaUpdateNotification {
            workspace: participant(1, "acme"),
            connection: participant(2, "pg-to-wh"),
            source: participant(3, "postgres"),
            catalog_diff: Default::default(),
            is_breaking_change: false,
        };
        let message =
            SlackChannel::build_schema_propagation_message(&notification, " • Streams (+1/-0)\n");

        assert!(message.text.starts_with("The schema of '"));
        assert_eq!(message.blocks.len(), 4);
        assert!(matches!(message.blocks[2], Block::Divider));
        match &message.blocks[3] {
            Block::Section { text: Some(t), .. } => {
                assert_eq!(t.text, " • Streams (+1/-0)\n");
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_unconfigured_webhook_is_noop() {
        let channel =
            SlackChannel::new(SlackConfig::default(), Duration::from_secs(1)).unwrap();
        assert_eq!(channel.notify_test("ping").unwrap(), false);
        assert_eq!(channel.notify_job_success(&summary(true)).unwrap(), false);
    }

    #[test]
    fn test_breaking_change_is_unsupported() {
        let channel =
            SlackChannel::new(SlackConfig::default(), Duration::from_secs(1)).unwrap();
        let context = BreakingChangeContext {
            receiver_emails: vec!["ops@example.com".to_string()],
            connector_name: "postgres".to_string(),
            actor_kind: crate::notification::summary::ActorKind::Source,
            breaking_change: crate::notification::summary::BreakingChange {
                connector_version: "2.0.0".to_string(),
                message: "column types changed".to_string(),
                upgrade_deadline: None,
            },
        };
        let err = channel.notify_breaking_change_warning(&context).unwrap_err();
        assert!(matches!(err, NotificationError::Unsupported { .. }));
    }
}
