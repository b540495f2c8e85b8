//! 模板化事务邮件渠道
//!
//! 渲染和投递都委托给外部模板服务，这里只负责挑选模板 id、组装 payload
//! 并把黑盒结果映射到统一的投递语义。收件人是工作区邮箱，缺失时为
//! 刻意 no-op。

use std::sync::Arc;

use serde_json::json;

use crate::notification::channel::{NotificationChannel, NotificationError};
use crate::notification::policy::ChannelKind;
use crate::notification::summary::{
    BreakingChangeContext, DisableContext, SchemaUpdateNotification, SyncSummary,
};

/// 每种触发类型对应的模板 id
pub mod template_ids {
    pub const JOB_FAILURE: &str = "sync_failure_email";
    pub const JOB_SUCCESS: &str = "sync_succeeded_email";
    pub const CONNECTION_DISABLED: &str = "connection_disabled_email";
    pub const CONNECTION_DISABLE_WARNING: &str = "connection_disabled_warning_email";
    pub const SCHEMA_CHANGE: &str = "schema_change_email";
    pub const TEST: &str = "test_email";
}

/// 外部模板投递服务
///
/// 返回 `Ok(true)` 表示已发出，`Ok(false)` 表示服务侧刻意跳过。
pub trait TemplateDelivery: Send + Sync {
    fn deliver(
        &self,
        template_id: &str,
        recipient: &str,
        payload: &serde_json::Value,
    ) -> anyhow::Result<bool>;
}

/// 模板邮件渠道
pub struct TemplatedEmailChannel {
    delivery: Arc<dyn TemplateDelivery>,
    recipient: Option<String>,
}

impl TemplatedEmailChannel {
    pub fn new(delivery: Arc<dyn TemplateDelivery>, recipient: Option<String>) -> Self {
        Self {
            delivery,
            recipient: recipient.filter(|r| !r.trim().is_empty()),
        }
    }

    fn send(
        &self,
        template_id: &str,
        payload: serde_json::Value,
    ) -> Result<bool, NotificationError> {
        let Some(recipient) = &self.recipient else {
            return Ok(false);
        };
        self.delivery
            .deliver(template_id, recipient, &payload)
            .map_err(|e| NotificationError::Service(e.to_string()))
    }

    fn summary_payload(summary: &SyncSummary) -> Result<serde_json::Value, NotificationError> {
        serde_json::to_value(summary).map_err(|e| NotificationError::Render(e.to_string()))
    }
}

impl NotificationChannel for TemplatedEmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn notify_job_failure(&self, summary: &SyncSummary) -> Result<bool, NotificationError> {
        self.send(template_ids::JOB_FAILURE, Self::summary_payload(summary)?)
    }

    fn notify_job_success(&self, summary: &SyncSummary) -> Result<bool, NotificationError> {
        self.send(template_ids::JOB_SUCCESS, Self::summary_payload(summary)?)
    }

    fn notify_connection_disabled(
        &self,
        context: &DisableContext,
    ) -> Result<bool, NotificationError> {
        let payload = serde_json::to_value(context)
            .map_err(|e| NotificationError::Render(e.to_string()))?;
        self.send(template_ids::CONNECTION_DISABLED, payload)
    }

    fn notify_connection_disable_warning(
        &self,
        context: &DisableContext,
    ) -> Result<bool, NotificationError> {
        let payload = serde_json::to_value(context)
            .map_err(|e| NotificationError::Render(e.to_string()))?;
        self.send(template_ids::CONNECTION_DISABLE_WARNING, payload)
    }

    fn notify_schema_propagated(
        &self,
        notification: &SchemaUpdateNotification,
        diff_summary: &str,
    ) -> Result<bool, NotificationError> {
        let payload = json!({
            "workspace": notification.workspace,
            "connection": notification.connection,
            "source": notification.source,
            "is_breaking_change": notification.is_breaking_change,
            "diff_summary": diff_summary,
        });
        self.send(template_ids::SCHEMA_CHANGE, payload)
    }

    fn notify_breaking_change_warning(
        &self,
        _context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError> {
        // 批量送达需要多收件人投递，单收件人渠道不支持
        Err(NotificationError::Unsupported {
            channel: ChannelKind::Email,
            operation: "notify_breaking_change_warning",
        })
    }

    fn notify_breaking_change_syncs_disabled(
        &self,
        _context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError> {
        Err(NotificationError::Unsupported {
            channel: ChannelKind::Email,
            operation: "notify_breaking_change_syncs_disabled",
        })
    }

    fn notify_test(&self, message: &str) -> Result<bool, NotificationError> {
        self.send(template_ids::TEST, json!({ "message": message }))
    }
}
