//! 作业与元数据模型 - 通知子系统消费的领域对象
//!
//! Job 和 attempt 统计来自作业持久层，workspace/connection/source/destination
//! 元数据通过 [`MetadataStore`] 按 id 解析。解析失败由调度器捕获并记录日志，
//! 不会传播到触发通知的工作流。

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::policy::NotificationPolicy;

/// 作业状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Incomplete,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// 唯一的成功状态是 Succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }
}

/// 同步作业
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 作业 ID
    pub id: i64,
    /// 所属 connection
    pub connection_id: Uuid,
    /// 当前状态
    pub status: JobStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 启动时间（还在排队的作业为空）
    pub started_at: Option<DateTime<Utc>>,
    /// 最近一次状态变更时间
    pub updated_at: DateTime<Utc>,
}

/// 单次 attempt 的聚合统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub records_emitted: u64,
    pub records_committed: u64,
    pub bytes_emitted: u64,
    pub bytes_committed: u64,
}

/// attempt 统计记录
///
/// combined_stats 缺失时（attempt 在产出统计前就失败了）按零贡献计算。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttemptStats {
    pub combined_stats: Option<SyncStats>,
}

/// 工作区
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    /// 工作区邮箱（邮件渠道的收件人）
    pub email: Option<String>,
    /// 通知策略（未配置时所有触发都不发送）
    pub notification_policy: Option<NotificationPolicy>,
}

/// source 与 destination 之间的连接
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub name: String,
    pub source_id: Uuid,
    pub destination_id: Uuid,
}

/// 数据源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
}

/// 数据目的地
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub id: Uuid,
    pub name: String,
}

/// 元数据查询接口，由持久层实现
pub trait MetadataStore: Send + Sync {
    /// 按作业 ID 解析所属工作区
    fn workspace_for_job(&self, job_id: i64) -> Result<Workspace>;

    fn connection(&self, connection_id: Uuid) -> Result<Connection>;

    fn source(&self, source_id: Uuid) -> Result<Source>;

    fn destination(&self, destination_id: Uuid) -> Result<Destination>;
}
