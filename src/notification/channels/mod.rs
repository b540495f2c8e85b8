//! 通知渠道实现

pub mod email;
pub mod slack;
pub mod webhook;

pub use email::{TemplateDelivery, TemplatedEmailChannel};
pub use slack::SlackChannel;
pub use webhook::GenericWebhookChannel;

/// 纯文本消息模板
///
/// Slack 的 text 回退字段和通用 webhook 渠道共用这些文案。
pub(crate) mod templates {
    use crate::notification::summary::{DisableContext, SyncSummary};

    pub fn job_failure(summary: &SyncSummary) -> String {
        format!(
            "Your connection {} from {} to {} just failed.\n\
             This happened with: {}\n\n\
             You can access its logs here: {}\n\n\
             Job ID: {}",
            summary.connection.name,
            summary.source.name,
            summary.destination.name,
            summary
                .error_message
                .as_deref()
                .unwrap_or("no error message"),
            summary.connection.url,
            summary.job_id,
        )
    }

    pub fn job_success(summary: &SyncSummary) -> String {
        format!(
            "Your connection {} from {} to {} succeeded.\n\
             You can access its logs here: {}\n\n\
             Job ID: {}",
            summary.connection.name,
            summary.source.name,
            summary.destination.name,
            summary.connection.url,
            summary.job_id,
        )
    }

    pub fn connection_disabled(context: &DisableContext) -> String {
        format!(
            "Your connection from {} to {} was automatically disabled because it failed repeatedly.\n\
             Please address any issues to re-enable it. The most recent attempted {}\n\n\
             Workspace ID: {}\n\
             Connection ID: {}",
            context.source_connector,
            context.destination_connector,
            context.job_description,
            context.workspace_id,
            context.connection_id,
        )
    }

    pub fn connection_disable_warning(context: &DisableContext) -> String {
        format!(
            "Your connection from {} to {} is scheduled to be automatically disabled because it failed repeatedly.\n\
             Please address any issues to keep it enabled. The most recent attempted {}\n\n\
             Workspace ID: {}\n\
             Connection ID: {}",
            context.source_connector,
            context.destination_connector,
            context.job_description,
            context.workspace_id,
            context.connection_id,
        )
    }
}
