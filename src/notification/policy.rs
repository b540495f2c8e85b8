//! 通知策略与渠道绑定
//!
//! 每个工作区为每种触发类型配置一个可选的渠道绑定；绑定缺失表示该触发
//! 不发送通知（这是正常的 skip，不是错误）。一个绑定可以引用多个渠道，
//! 各渠道独立投递。

use serde::{Deserialize, Serialize};

/// 触发通知的作业生命周期事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTrigger {
    SyncFailure,
    SyncSuccess,
    SyncDisabled,
    SyncDisabledWarning,
    SchemaChange,
}

impl NotificationTrigger {
    /// 指标与埋点使用的稳定标签
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTrigger::SyncFailure => "sync_failure",
            NotificationTrigger::SyncSuccess => "sync_success",
            NotificationTrigger::SyncDisabled => "sync_disabled",
            NotificationTrigger::SyncDisabledWarning => "sync_disabled_warning",
            NotificationTrigger::SchemaChange => "schema_change",
        }
    }
}

impl std::fmt::Display for NotificationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 渠道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// chat-ops 风格的 webhook（结构化消息）
    Slack,
    /// 模板化事务邮件
    Email,
    /// 纯文本 webhook（遗留/自定义端点）
    Webhook,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Slack => "slack",
            ChannelKind::Email => "email",
            ChannelKind::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Slack 渠道配置
///
/// webhook_url 为空表示渠道未配置，投递时按 no-op 处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
}

impl SlackConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }
}

/// 通用 webhook 渠道配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// 单个触发类型的渠道绑定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelBinding {
    /// 激活的渠道类型，每个独立投递
    pub channel_kinds: Vec<ChannelKind>,
    /// Slack 渠道配置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_configuration: Option<SlackConfig>,
    /// 通用 webhook 渠道配置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_configuration: Option<WebhookConfig>,
}

impl ChannelBinding {
    pub fn slack(config: SlackConfig) -> Self {
        Self {
            channel_kinds: vec![ChannelKind::Slack],
            slack_configuration: Some(config),
            webhook_configuration: None,
        }
    }

    /// 邮件渠道使用工作区邮箱，没有额外配置
    pub fn email() -> Self {
        Self {
            channel_kinds: vec![ChannelKind::Email],
            slack_configuration: None,
            webhook_configuration: None,
        }
    }

    pub fn webhook(config: WebhookConfig) -> Self {
        Self {
            channel_kinds: vec![ChannelKind::Webhook],
            slack_configuration: None,
            webhook_configuration: Some(config),
        }
    }

    /// 追加一个渠道类型
    pub fn with_kind(mut self, kind: ChannelKind) -> Self {
        if !self.channel_kinds.contains(&kind) {
            self.channel_kinds.push(kind);
        }
        self
    }
}

/// 工作区级通知策略：触发类型到渠道绑定的映射
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_on_failure: Option<ChannelBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_on_success: Option<ChannelBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_on_sync_disabled: Option<ChannelBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_on_sync_disabled_warning: Option<ChannelBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_on_schema_change: Option<ChannelBinding>,
}

impl NotificationPolicy {
    /// 查找触发类型对应的绑定
    pub fn binding_for(&self, trigger: NotificationTrigger) -> Option<&ChannelBinding> {
        match trigger {
            NotificationTrigger::SyncFailure => self.send_on_failure.as_ref(),
            NotificationTrigger::SyncSuccess => self.send_on_success.as_ref(),
            NotificationTrigger::SyncDisabled => self.send_on_sync_disabled.as_ref(),
            NotificationTrigger::SyncDisabledWarning => {
                self.send_on_sync_disabled_warning.as_ref()
            }
            NotificationTrigger::SchemaChange => self.send_on_schema_change.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_for_maps_each_trigger() {
        let policy = NotificationPolicy {
            send_on_failure: Some(ChannelBinding::slack(SlackConfig::new("https://hooks.example.com/a"))),
            send_on_success: None,
            send_on_sync_disabled: Some(ChannelBinding::email()),
            send_on_sync_disabled_warning: None,
            send_on_schema_change: None,
        };

        assert!(policy.binding_for(NotificationTrigger::SyncFailure).is_some());
        assert!(policy.binding_for(NotificationTrigger::SyncSuccess).is_none());
        assert!(policy.binding_for(NotificationTrigger::SyncDisabled).is_some());
        assert!(policy
            .binding_for(NotificationTrigger::SyncDisabledWarning)
            .is_none());
        assert!(policy.binding_for(NotificationTrigger::SchemaChange).is_none());
    }

    #[test]
    fn test_slack_config_is_configured() {
        assert!(!SlackConfig::default().is_configured());
        assert!(!SlackConfig::new("   ").is_configured());
        assert!(SlackConfig::new("https://hooks.example.com/x").is_configured());
    }

    #[test]
    fn test_binding_with_kind_deduplicates() {
        let binding = ChannelBinding::slack(SlackConfig::new("https://hooks.example.com/x"))
            .with_kind(ChannelKind::Email)
            .with_kind(ChannelKind::Email);
        assert_eq!(
            binding.channel_kinds,
            vec![ChannelKind::Slack, ChannelKind::Email]
        );
    }

    #[test]
    fn test_trigger_tags_are_stable() {
        assert_eq!(NotificationTrigger::SyncFailure.as_str(), "sync_failure");
        assert_eq!(NotificationTrigger::SchemaChange.as_str(), "schema_change");
        assert_eq!(ChannelKind::Slack.as_str(), "slack");
    }
}
