//! 渠道无关的事件摘要
//!
//! 每次 dispatch 都基于作业、attempt 统计和已解析的元数据重新构建一个
//! [`SyncSummary`]，构建后不再修改，dispatch 结束即丢弃。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AttemptStats, Job, SyncStats};
use crate::notification::diff::CatalogDiff;

/// 消息中引用的参与方（工作区/连接/源/目的地）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: Uuid,
    pub name: String,
    /// 指向 web app 的规范链接
    pub url: String,
}

impl ParticipantInfo {
    pub fn new(id: Uuid, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
        }
    }
}

/// 作业事件的渠道无关描述，渲染消息的唯一数据来源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub workspace: ParticipantInfo,
    pub connection: ParticipantInfo,
    pub source: ParticipantInfo,
    pub destination: ParticipantInfo,
    /// 任一为空时不渲染持续时间
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub is_success: bool,
    pub job_id: i64,
    pub error_message: Option<String>,
    pub records_emitted: u64,
    pub records_committed: u64,
    pub bytes_emitted: u64,
    pub bytes_committed: u64,
}

/// 构建摘要所需的参与方集合
#[derive(Debug, Clone)]
pub struct SummaryParticipants {
    pub workspace: ParticipantInfo,
    pub connection: ParticipantInfo,
    pub source: ParticipantInfo,
    pub destination: ParticipantInfo,
}

/// 跨 attempt 累加统计
///
/// 缺失的统计记录按零贡献计；committed 与 emitted 各自独立累加，
/// 任何一方都不得覆盖另一方。上游偶发的 committed > emitted 不在
/// 这里校验，渲染侧必须容忍。
pub fn aggregate_stats(attempts: &[AttemptStats]) -> SyncStats {
    let mut total = SyncStats::default();
    for attempt in attempts {
        if let Some(stats) = &attempt.combined_stats {
            total.records_emitted += stats.records_emitted;
            total.records_committed += stats.records_committed;
            total.bytes_emitted += stats.bytes_emitted;
            total.bytes_committed += stats.bytes_committed;
        }
    }
    total
}

impl SyncSummary {
    /// 从作业、attempt 统计和已解析的参与方构建摘要
    ///
    /// started_at/finished_at 原样取自作业的启动/更新时间。
    pub fn for_job(
        job: &Job,
        attempts: &[AttemptStats],
        participants: SummaryParticipants,
        error_message: Option<String>,
    ) -> Self {
        let stats = aggregate_stats(attempts);
        Self {
            workspace: participants.workspace,
            connection: participants.connection,
            source: participants.source,
            destination: participants.destination,
            started_at: job.started_at,
            finished_at: Some(job.updated_at),
            is_success: job.status.is_success(),
            job_id: job.id,
            error_message,
            records_emitted: stats.records_emitted,
            records_committed: stats.records_committed,
            bytes_emitted: stats.bytes_emitted,
            bytes_committed: stats.bytes_committed,
        }
    }
}

/// schema 变更通知的上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaUpdateNotification {
    pub workspace: ParticipantInfo,
    pub connection: ParticipantInfo,
    pub source: ParticipantInfo,
    pub catalog_diff: CatalogDiff,
    pub is_breaking_change: bool,
}

/// 连接停用/停用预警通知的上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisableContext {
    /// 工作区邮箱，邮件渠道的收件人
    pub receiver_email: Option<String>,
    pub source_connector: String,
    pub destination_connector: String,
    /// 形如 "sync started on ..., running for ..." 的描述行
    pub job_description: String,
    pub workspace_id: Uuid,
    pub connection_id: Uuid,
}

/// 连接器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Source,
    Destination,
}

/// 连接器的不兼容变更
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingChange {
    pub connector_version: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_deadline: Option<chrono::NaiveDate>,
}

/// 不兼容变更通知的上下文（需要批量送达多个收件人）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingChangeContext {
    pub receiver_emails: Vec<String>,
    pub connector_name: String,
    pub actor_kind: ActorKind,
    pub breaking_change: BreakingChange,
}
