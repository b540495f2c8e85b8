//! 作业事件通知子系统
//!
//! # 设计目标
//! 1. 统一接口：所有渠道实现 `NotificationChannel` trait
//! 2. 渠道解耦：每个渠道独立投递，互不影响
//! 3. 尽力而为：任何失败都不会传播到触发通知的作业工作流
//! 4. 确定性渲染：catalog diff 摘要与输入顺序无关，可逐字节比对
//!
//! # 使用示例
//! ```ignore
//! use std::sync::Arc;
//! use sync_notifier::{JobNotifier, LogMetricsSink, LogTrackingSink, WebUrlHelper};
//!
//! let notifier = JobNotifier::new(
//!     store,
//!     WebUrlHelper::new("https://app.example.com"),
//!     template_delivery,
//!     Arc::new(LogMetricsSink),
//!     Arc::new(LogTrackingSink),
//! );
//! notifier.fail_job("source connector failed", &job, &attempt_stats);
//! ```

pub mod channel;
pub mod channels;
pub mod diff;
pub mod dispatcher;
pub mod format;
pub mod policy;
pub mod summary;

pub use channel::{attempt, DeliveryOutcome, NotificationChannel, NotificationError};
pub use channels::{GenericWebhookChannel, SlackChannel, TemplateDelivery, TemplatedEmailChannel};
pub use diff::{
    summarize_catalog_diff, CatalogDiff, FieldTransform, FieldTransformKind, StreamDescriptor,
    StreamTransform,
};
pub use dispatcher::JobNotifier;
pub use format::{format_duration, format_volume};
pub use policy::{
    ChannelBinding, ChannelKind, NotificationPolicy, NotificationTrigger, SlackConfig,
    WebhookConfig,
};
pub use summary::{
    ActorKind, BreakingChange, BreakingChangeContext, DisableContext, ParticipantInfo,
    SchemaUpdateNotification, SummaryParticipants, SyncSummary,
};
