//! Canonical web app URLs for workspaces, connections, sources and
//! destinations. These links are embedded in notification messages.

use uuid::Uuid;

/// URL builder for the web app
#[derive(Debug, Clone)]
pub struct WebUrlHelper {
    base_url: String,
}

impl WebUrlHelper {
    /// Trailing slashes on the base URL are trimmed so joined paths stay
    /// single-slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn workspace_url(&self, workspace_id: Uuid) -> String {
        format!("{}/workspaces/{}", self.base_url, workspace_id)
    }

    pub fn connection_url(&self, workspace_id: Uuid, connection_id: Uuid) -> String {
        format!(
            "{}/workspaces/{}/connections/{}",
            self.base_url, workspace_id, connection_id
        )
    }

    pub fn source_url(&self, workspace_id: Uuid, source_id: Uuid) -> String {
        format!(
            "{}/workspaces/{}/source/{}",
            self.base_url, workspace_id, source_id
        )
    }

    pub fn destination_url(&self, workspace_id: Uuid, destination_id: Uuid) -> String {
        format!(
            "{}/workspaces/{}/destination/{}",
            self.base_url, workspace_id, destination_id
        )
    }
}
