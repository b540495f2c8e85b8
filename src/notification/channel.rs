//! 通知渠道 trait 定义
//!
//! 每种渠道只实现自己真正支持的操作子集；不支持的操作返回带类型的
//! Unsupported 错误，而不是静默 no-op，也不做尽力而为的部分投递。
//! `Ok(false)` 表示渠道未配置（比如空的 webhook 地址），调用被刻意跳过。

use thiserror::Error;

use crate::notification::policy::ChannelKind;
use crate::notification::summary::{
    BreakingChangeContext, DisableContext, SchemaUpdateNotification, SyncSummary,
};

/// 单次渠道调用的三种结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 消息已送达
    Delivered,
    /// 刻意跳过（渠道未配置等）
    Skipped(String),
    /// 投递失败
    Failed(String),
}

impl DeliveryOutcome {
    /// 指标与埋点使用的稳定标签
    pub fn tag(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Skipped(_) => "skipped",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, DeliveryOutcome::Skipped(_))
    }
}

/// 渠道投递错误
#[derive(Debug, Error)]
pub enum NotificationError {
    /// 渠道不支持该操作
    #[error("{operation} is not supported by the {channel} channel")]
    Unsupported {
        channel: ChannelKind,
        operation: &'static str,
    },
    /// 端点返回非 2xx 响应
    #[error("failed to deliver notification ({status}): {body}")]
    Delivery { status: u16, body: String },
    /// 传输层错误
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 消息渲染/序列化失败
    #[error("failed to render notification payload: {0}")]
    Render(String),
    /// 外部投递服务失败
    #[error("template delivery service failed: {0}")]
    Service(String),
}

/// 把一次渠道调用的结果归一为投递结局
///
/// 所有不得向外抛错的边界统一走这里，吞错策略集中在一处可审计。
pub fn attempt<F>(op: F) -> DeliveryOutcome
where
    F: FnOnce() -> Result<bool, NotificationError>,
{
    match op() {
        Ok(true) => DeliveryOutcome::Delivered,
        Ok(false) => DeliveryOutcome::Skipped("channel not configured".to_string()),
        Err(e) => DeliveryOutcome::Failed(e.to_string()),
    }
}

/// 通知渠道 trait
///
/// 返回值 `Ok(true)` 表示实际发出，`Ok(false)` 表示未配置的刻意 no-op；
/// 渲染或传输失败一律通过 Err 上抛，由调度器捕获。
pub trait NotificationChannel: Send + Sync {
    /// 渠道类型（用于日志与指标）
    fn kind(&self) -> ChannelKind;

    /// 作业失败通知
    fn notify_job_failure(&self, summary: &SyncSummary) -> Result<bool, NotificationError>;

    /// 作业成功通知
    fn notify_job_success(&self, summary: &SyncSummary) -> Result<bool, NotificationError>;

    /// 连接被自动停用
    fn notify_connection_disabled(
        &self,
        context: &DisableContext,
    ) -> Result<bool, NotificationError>;

    /// 连接即将被自动停用的预警
    fn notify_connection_disable_warning(
        &self,
        context: &DisableContext,
    ) -> Result<bool, NotificationError>;

    /// schema 变更已传播
    fn notify_schema_propagated(
        &self,
        notification: &SchemaUpdateNotification,
        diff_summary: &str,
    ) -> Result<bool, NotificationError>;

    /// 连接器不兼容变更预警（需要批量送达）
    fn notify_breaking_change_warning(
        &self,
        context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError>;

    /// 不兼容变更导致同步停用（需要批量送达）
    fn notify_breaking_change_syncs_disabled(
        &self,
        context: &BreakingChangeContext,
    ) -> Result<bool, NotificationError>;

    /// 连通性测试消息
    fn notify_test(&self, message: &str) -> Result<bool, NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_maps_delivered() {
        assert_eq!(attempt(|| Ok(true)), DeliveryOutcome::Delivered);
    }

    #[test]
    fn test_attempt_maps_noop_to_skipped() {
        let outcome = attempt(|| Ok(false));
        assert!(outcome.is_skip());
        assert_eq!(outcome.tag(), "skipped");
    }

    #[test]
    fn test_attempt_maps_error_to_failed() {
        let outcome = attempt(|| {
            Err(NotificationError::Delivery {
                status: 500,
                body: "oops".to_string(),
            })
        });
        match outcome {
            DeliveryOutcome::Failed(reason) => {
                assert!(reason.contains("500"));
                assert!(reason.contains("oops"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_error_names_channel_and_operation() {
        let err = NotificationError::Unsupported {
            channel: ChannelKind::Slack,
            operation: "notify_breaking_change_warning",
        };
        let rendered = err.to_string();
        assert!(rendered.contains("slack"));
        assert!(rendered.contains("notify_breaking_change_warning"));
    }

    #[test]
    fn test_outcome_tags() {
        assert_eq!(DeliveryOutcome::Delivered.tag(), "delivered");
        assert_eq!(DeliveryOutcome::Failed("x".to_string()).tag(), "failed");
    }
}
