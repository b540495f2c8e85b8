//! 通知调度器
//!
//! 一次 dispatch 的生命周期：解析元数据，构建事件摘要，逐渠道投递，
//! 上报结果。每一步的失败都被就地捕获并记录日志，绝不传播到触发通知
//! 的作业工作流，也绝不让一个渠道的失败影响后续渠道。
//!
//! 每次 dispatch 独占自己的摘要、绑定解析和渠道实例，调用之间没有任何
//! 共享可变状态，两个独立的 dispatch 可以并发执行。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metrics::{MetricsSink, TrackingSink};
use crate::model::{AttemptStats, Job, MetadataStore, Workspace};
use crate::notification::channel::{
    attempt, DeliveryOutcome, NotificationChannel, NotificationError,
};
use crate::notification::channels::email::{TemplateDelivery, TemplatedEmailChannel};
use crate::notification::channels::slack::SlackChannel;
use crate::notification::channels::webhook::GenericWebhookChannel;
use crate::notification::diff::{summarize_catalog_diff, CatalogDiff};
use crate::notification::format::format_duration;
use crate::notification::policy::{ChannelBinding, ChannelKind, NotificationTrigger};
use crate::notification::summary::{
    DisableContext, ParticipantInfo, SchemaUpdateNotification, SummaryParticipants, SyncSummary,
};
use crate::web_url::WebUrlHelper;

/// 作业事件通知调度器
pub struct JobNotifier {
    store: Arc<dyn MetadataStore>,
    web_urls: WebUrlHelper,
    template_delivery: Arc<dyn TemplateDelivery>,
    metrics: Arc<dyn MetricsSink>,
    tracking: Arc<dyn TrackingSink>,
    webhook_timeout: Duration,
}

impl JobNotifier {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        web_urls: WebUrlHelper,
        template_delivery: Arc<dyn TemplateDelivery>,
        metrics: Arc<dyn MetricsSink>,
        tracking: Arc<dyn TrackingSink>,
    ) -> Self {
        Self {
            store,
            web_urls,
            template_delivery,
            metrics,
            tracking,
            webhook_timeout: Duration::from_secs(30),
        }
    }

    /// 设置 webhook 投递超时
    pub fn with_webhook_timeout(mut self, timeout: Duration) -> Self {
        self.webhook_timeout = timeout;
        self
    }

    /// 作业失败通知
    pub fn fail_job(&self, reason: &str, job: &Job, attempt_stats: &[AttemptStats]) {
        self.notify_job(
            NotificationTrigger::SyncFailure,
            Some(reason),
            job,
            attempt_stats,
        );
    }

    /// 作业成功通知
    pub fn success_job(&self, job: &Job, attempt_stats: &[AttemptStats]) {
        self.notify_job(NotificationTrigger::SyncSuccess, None, job, attempt_stats);
    }

    /// 连接被自动停用
    pub fn auto_disable_connection(&self, job: &Job, attempt_stats: &[AttemptStats]) {
        self.notify_job(NotificationTrigger::SyncDisabled, None, job, attempt_stats);
    }

    /// 连接即将被自动停用的预警
    pub fn auto_disable_connection_warning(&self, job: &Job, attempt_stats: &[AttemptStats]) {
        self.notify_job(
            NotificationTrigger::SyncDisabledWarning,
            None,
            job,
            attempt_stats,
        );
    }

    fn notify_job(
        &self,
        trigger: NotificationTrigger,
        reason: Option<&str>,
        job: &Job,
        attempt_stats: &[AttemptStats],
    ) {
        match self.store.workspace_for_job(job.id) {
            Ok(workspace) => {
                self.notify_job_with_workspace(trigger, reason, job, attempt_stats, &workspace)
            }
            Err(e) => {
                error!(
                    job_id = job.id,
                    trigger = trigger.as_str(),
                    error = %e,
                    "Unable to resolve workspace for job, skipping notification"
                );
            }
        }
    }

    /// 工作区已解析时的入口，调用方已持有 workspace 时避免一次查询
    pub fn notify_job_with_workspace(
        &self,
        trigger: NotificationTrigger,
        reason: Option<&str>,
        job: &Job,
        attempt_stats: &[AttemptStats],
        workspace: &Workspace,
    ) {
        if trigger == NotificationTrigger::SchemaChange {
            warn!("Schema change dispatch requires a catalog diff, skipping notification");
            return;
        }
        if let Err(e) = self.dispatch_job_event(trigger, reason, job, attempt_stats, workspace) {
            error!(
                job_id = job.id,
                trigger = trigger.as_str(),
                error = %e,
                "Unable to read configuration for notification, not blocking"
            );
        }
    }

    /// schema 变更传播通知
    pub fn notify_schema_propagated(
        &self,
        workspace: &Workspace,
        connection_id: Uuid,
        diff: &CatalogDiff,
        is_breaking_change: bool,
    ) {
        if let Err(e) =
            self.dispatch_schema_change(workspace, connection_id, diff, is_breaking_change)
        {
            error!(
                workspace_id = %workspace.id,
                connection_id = %connection_id,
                error = %e,
                "Unable to read configuration for schema change notification, not blocking"
            );
        }
    }

    fn dispatch_job_event(
        &self,
        trigger: NotificationTrigger,
        reason: Option<&str>,
        job: &Job,
        attempt_stats: &[AttemptStats],
        workspace: &Workspace,
    ) -> Result<()> {
        let connection = self.store.connection(job.connection_id)?;
        let source = self.store.source(connection.source_id)?;
        let destination = self.store.destination(connection.destination_id)?;

        let participants = SummaryParticipants {
            workspace: ParticipantInfo::new(
                workspace.id,
                &workspace.name,
                self.web_urls.workspace_url(workspace.id),
            ),
            connection: ParticipantInfo::new(
                connection.id,
                &connection.name,
                self.web_urls.connection_url(workspace.id, connection.id),
            ),
            source: ParticipantInfo::new(
                source.id,
                &source.name,
                self.web_urls.source_url(workspace.id, source.id),
            ),
            destination: ParticipantInfo::new(
                destination.id,
                &destination.name,
                self.web_urls.destination_url(workspace.id, destination.id),
            ),
        };
        let summary =
            SyncSummary::for_job(job, attempt_stats, participants, reason.map(str::to_string));
        let context = DisableContext {
            receiver_email: workspace.email.clone(),
            source_connector: source.name.clone(),
            destination_connector: destination.name.clone(),
            job_description: job_description(job, &fail_reason_suffix(reason)),
            workspace_id: workspace.id,
            connection_id: connection.id,
        };

        let Some(binding) = binding_for_workspace(workspace, trigger) else {
            return Ok(());
        };

        let channels = self.channels_for(binding, workspace);
        let outcomes = self.send_to_channels(trigger, &channels, |channel| match trigger {
            NotificationTrigger::SyncFailure => channel.notify_job_failure(&summary),
            NotificationTrigger::SyncSuccess => channel.notify_job_success(&summary),
            NotificationTrigger::SyncDisabled => channel.notify_connection_disabled(&context),
            NotificationTrigger::SyncDisabledWarning => {
                channel.notify_connection_disable_warning(&context)
            }
            // 已在入口拦截
            NotificationTrigger::SchemaChange => Err(NotificationError::Unsupported {
                channel: channel.kind(),
                operation: "notify_schema_propagated",
            }),
        });

        self.report(workspace.id, trigger, connection.id, &outcomes);
        Ok(())
    }

    fn dispatch_schema_change(
        &self,
        workspace: &Workspace,
        connection_id: Uuid,
        diff: &CatalogDiff,
        is_breaking_change: bool,
    ) -> Result<()> {
        let connection = self.store.connection(connection_id)?;
        let source = self.store.source(connection.source_id)?;

        let notification = SchemaUpdateNotification {
            workspace: ParticipantInfo::new(
                workspace.id,
                &workspace.name,
                self.web_urls.workspace_url(workspace.id),
            ),
            connection: ParticipantInfo::new(
                connection.id,
                &connection.name,
                self.web_urls.connection_url(workspace.id, connection.id),
            ),
            source: ParticipantInfo::new(
                source.id,
                &source.name,
                self.web_urls.source_url(workspace.id, source.id),
            ),
            catalog_diff: diff.clone(),
            is_breaking_change,
        };
        let diff_summary = summarize_catalog_diff(diff);

        let trigger = NotificationTrigger::SchemaChange;
        let Some(binding) = binding_for_workspace(workspace, trigger) else {
            return Ok(());
        };

        let channels = self.channels_for(binding, workspace);
        let outcomes = self.send_to_channels(trigger, &channels, |channel| {
            channel.notify_schema_propagated(&notification, &diff_summary)
        });

        self.report(workspace.id, trigger, connection.id, &outcomes);
        Ok(())
    }

    /// 按绑定实例化渠道，每次 dispatch 都新建，不做缓存
    fn channels_for(
        &self,
        binding: &ChannelBinding,
        workspace: &Workspace,
    ) -> Vec<Box<dyn NotificationChannel>> {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
        for kind in &binding.channel_kinds {
            match kind {
                ChannelKind::Slack => {
                    let config = binding.slack_configuration.clone().unwrap_or_default();
                    match SlackChannel::new(config, self.webhook_timeout) {
                        Ok(channel) => channels.push(Box::new(channel)),
                        Err(e) => {
                            error!(channel = "slack", error = %e, "Failed to construct channel")
                        }
                    }
                }
                ChannelKind::Email => {
                    channels.push(Box::new(TemplatedEmailChannel::new(
                        self.template_delivery.clone(),
                        workspace.email.clone(),
                    )));
                }
                ChannelKind::Webhook => {
                    let config = binding.webhook_configuration.clone().unwrap_or_default();
                    match GenericWebhookChannel::new(config, self.webhook_timeout) {
                        Ok(channel) => channels.push(Box::new(channel)),
                        Err(e) => {
                            error!(channel = "webhook", error = %e, "Failed to construct channel")
                        }
                    }
                }
            }
        }
        channels
    }

    /// 逐渠道调用并隔离失败
    ///
    /// 每个渠道的结果都单独上报指标；一个渠道出错只记日志，后续渠道
    /// 照常尝试。
    pub fn send_to_channels<F>(
        &self,
        trigger: NotificationTrigger,
        channels: &[Box<dyn NotificationChannel>],
        invoke: F,
    ) -> Vec<(ChannelKind, DeliveryOutcome)>
    where
        F: Fn(&dyn NotificationChannel) -> Result<bool, NotificationError>,
    {
        let mut outcomes = Vec::with_capacity(channels.len());
        for channel in channels {
            let kind = channel.kind();
            let outcome = attempt(|| invoke(channel.as_ref()));
            match &outcome {
                DeliveryOutcome::Delivered => {
                    info!(
                        trigger = trigger.as_str(),
                        channel = kind.as_str(),
                        "Notification delivered"
                    );
                }
                DeliveryOutcome::Skipped(skip_reason) => {
                    info!(
                        trigger = trigger.as_str(),
                        channel = kind.as_str(),
                        reason = %skip_reason,
                        "Notification skipped"
                    );
                }
                DeliveryOutcome::Failed(fail_reason) => {
                    error!(
                        trigger = trigger.as_str(),
                        channel = kind.as_str(),
                        error = %fail_reason,
                        "Failed to deliver notification, not blocking"
                    );
                }
            }
            self.metrics.record_attempt(trigger, kind, &outcome);
            outcomes.push((kind, outcome));
        }
        outcomes
    }

    /// 至少有一个非 skip 结果时上报一条埋点事件，上报失败只记日志
    fn report(
        &self,
        workspace_id: Uuid,
        trigger: NotificationTrigger,
        connection_id: Uuid,
        outcomes: &[(ChannelKind, DeliveryOutcome)],
    ) {
        let fired: Vec<&'static str> = outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_skip())
            .map(|(kind, _)| kind.as_str())
            .collect();
        if fired.is_empty() {
            return;
        }

        let attributes = json!({
            "connection_id": connection_id,
            "notification_channels": fired,
        });
        if let Err(e) = self.tracking.record_event(workspace_id, trigger, &attributes) {
            warn!(
                workspace_id = %workspace_id,
                error = %e,
                "Failed to emit tracking event, not blocking"
            );
        }
    }
}

/// 查找绑定；策略或绑定缺失都是正常的 skip
fn binding_for_workspace(
    workspace: &Workspace,
    trigger: NotificationTrigger,
) -> Option<&ChannelBinding> {
    let Some(policy) = &workspace.notification_policy else {
        warn!(
            workspace_id = %workspace.id,
            "Notification policy missing, skipping notification"
        );
        return None;
    };
    let binding = policy.binding_for(trigger);
    if binding.is_none() {
        info!(
            workspace_id = %workspace.id,
            trigger = trigger.as_str(),
            "No channel binding configured for trigger, skipping notification"
        );
    }
    binding
}

/// "sync started on ..., running for ..." 描述行
///
/// updated_at 等于启动时间说明作业还没收尾，用当前时间估算时长。
fn job_description(job: &Job, reason_suffix: &str) -> String {
    let started_at = job.started_at.unwrap_or(job.created_at);
    let finished_at = if job.updated_at == started_at {
        Utc::now()
    } else {
        job.updated_at
    };
    format!(
        "sync started on {}, running for {}{}.",
        started_at.format("%B %d, %Y at %H:%M UTC"),
        format_duration(started_at, finished_at),
        reason_suffix
    )
}

fn fail_reason_suffix(reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!(", as the {}", reason),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobStatus;
    use chrono::TimeZone;

    fn job() -> Job {
        Job {
            id: 1,
            connection_id: Uuid::from_u128(2),
            status: JobStatus::Failed,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            started_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 35, 0).unwrap(),
        }
    }

    #[test]
    fn test_fail_reason_suffix() {
        assert_eq!(fail_reason_suffix(None), "");
        assert_eq!(fail_reason_suffix(Some("")), "");
        assert_eq!(
            fail_reason_suffix(Some("source connector failed")),
            ", as the source connector failed"
        );
    }

    #[test]
    fn test_job_description_uses_start_and_duration() {
        let description = job_description(&job(), "");
        assert_eq!(
            description,
            "sync started on May 01, 2024 at 08:30 UTC, running for 5 min 0 sec."
        );
    }

    #[test]
    fn test_job_description_with_reason() {
        let description = job_description(&job(), ", as the source connector failed");
        assert!(description.ends_with(", as the source connector failed."));
    }

    #[test]
    fn test_job_description_falls_back_to_created_at() {
        let mut j = job();
        j.started_at = None;
        let description = job_description(&j, "");
        assert!(description.contains("08:00 UTC"));
        assert!(description.contains("35 min 0 sec"));
    }
}
