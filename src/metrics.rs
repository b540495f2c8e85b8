//! 指标与埋点接口
//!
//! 调度器对每次渠道调用上报一条指标，对每次实际产生投递的 dispatch
//! 上报一条埋点事件。两者都是尽力而为的 sink，失败不影响调度。

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use crate::notification::channel::DeliveryOutcome;
use crate::notification::policy::{ChannelKind, NotificationTrigger};

/// 每次渠道调用的结果上报
pub trait MetricsSink: Send + Sync {
    fn record_attempt(
        &self,
        trigger: NotificationTrigger,
        channel: ChannelKind,
        outcome: &DeliveryOutcome,
    );
}

/// dispatch 级别的分析埋点
pub trait TrackingSink: Send + Sync {
    fn record_event(
        &self,
        workspace_id: Uuid,
        trigger: NotificationTrigger,
        attributes: &serde_json::Value,
    ) -> Result<()>;
}

/// 把指标写进结构化日志的默认实现
#[derive(Debug, Default)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn record_attempt(
        &self,
        trigger: NotificationTrigger,
        channel: ChannelKind,
        outcome: &DeliveryOutcome,
    ) {
        info!(
            trigger = trigger.as_str(),
            channel = channel.as_str(),
            outcome = outcome.tag(),
            "notification_attempt"
        );
    }
}

/// 把埋点写进结构化日志的默认实现
#[derive(Debug, Default)]
pub struct LogTrackingSink;

impl TrackingSink for LogTrackingSink {
    fn record_event(
        &self,
        workspace_id: Uuid,
        trigger: NotificationTrigger,
        attributes: &serde_json::Value,
    ) -> Result<()> {
        info!(
            workspace_id = %workspace_id,
            trigger = trigger.as_str(),
            attributes = %attributes,
            "notification_event"
        );
        Ok(())
    }
}
