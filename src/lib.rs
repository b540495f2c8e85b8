//! Sync Notifier - 数据同步作业的事件通知分发
//!
//! 作业完成（或状态变化）后，根据工作区的通知策略挑选渠道，构建渠道
//! 无关的事件摘要，按渠道渲染并投递。单个渠道的失败不会阻塞其他渠道，
//! 也不会让触发通知的作业失败。

pub mod metrics;
pub mod model;
pub mod notification;
pub mod settings;
pub mod web_url;

pub use metrics::{LogMetricsSink, LogTrackingSink, MetricsSink, TrackingSink};
pub use model::{
    AttemptStats, Connection, Destination, Job, JobStatus, MetadataStore, Source, SyncStats,
    Workspace,
};
pub use notification::channel::{DeliveryOutcome, NotificationChannel, NotificationError};
pub use notification::channels::{
    GenericWebhookChannel, SlackChannel, TemplateDelivery, TemplatedEmailChannel,
};
pub use notification::diff::{summarize_catalog_diff, CatalogDiff};
pub use notification::dispatcher::JobNotifier;
pub use notification::policy::{
    ChannelBinding, ChannelKind, NotificationPolicy, NotificationTrigger, SlackConfig,
    WebhookConfig,
};
pub use notification::summary::{ParticipantInfo, SyncSummary};
pub use settings::Settings;
pub use web_url::WebUrlHelper;
