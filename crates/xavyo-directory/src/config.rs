//! Directory connection configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::{DirectoryError, DirectoryResult};

/// Largest `$top` Microsoft Graph accepts on directory collections.
pub const MAX_PAGE_SIZE: u32 = 999;

/// Microsoft cloud the tenant lives in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CloudEnvironment {
    /// Global Azure.
    #[default]
    Commercial,
    /// Azure US Government (GCC High / DoD).
    UsGovernment,
    /// Azure China (21Vianet).
    China,
    /// Explicit endpoints, e.g. a sovereign cloud or a test server.
    Custom {
        graph_endpoint: String,
        login_endpoint: String,
    },
}

impl CloudEnvironment {
    /// Microsoft Graph endpoint, without trailing slash.
    #[must_use]
    pub fn graph_endpoint(&self) -> &str {
        match self {
            Self::Commercial => "https://graph.microsoft.com",
            Self::UsGovernment => "https://graph.microsoft.us",
            Self::China => "https://microsoftgraph.chinacloudapi.cn",
            Self::Custom { graph_endpoint, .. } => graph_endpoint.trim_end_matches('/'),
        }
    }

    /// Azure AD login endpoint, without trailing slash.
    #[must_use]
    pub fn login_endpoint(&self) -> &str {
        match self {
            Self::Commercial => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
            Self::China => "https://login.chinacloudapi.cn",
            Self::Custom { login_endpoint, .. } => login_endpoint.trim_end_matches('/'),
        }
    }
}

/// App registration credentials for the client credentials flow.
#[derive(Debug)]
pub struct DirectoryCredentials {
    /// Application (client) ID.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
}

/// Configuration for directory lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory (tenant) ID.
    pub tenant_id: String,

    /// Cloud hosting the tenant.
    #[serde(default)]
    pub cloud_environment: CloudEnvironment,

    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Page size (`$top`) for member listings.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Check membership through nested groups.
    #[serde(default)]
    pub transitive_members: bool,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for throttled or transient responses, per request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound on a server-requested `Retry-After` wait.
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,
}

fn default_api_version() -> String {
    "v1.0".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_retry_after_secs() -> u64 {
    60
}

impl DirectoryConfig {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::default()
    }

    /// Checks field constraints.
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(DirectoryError::Config("tenant_id is required".into()));
        }
        if self.api_version.trim().is_empty() {
            return Err(DirectoryError::Config("api_version must not be empty".into()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(DirectoryError::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(DirectoryError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if let CloudEnvironment::Custom {
            graph_endpoint,
            login_endpoint,
        } = &self.cloud_environment
        {
            url::Url::parse(graph_endpoint)?;
            url::Url::parse(login_endpoint)?;
        }
        Ok(())
    }

    /// Graph base URL including the API version.
    #[must_use]
    pub fn graph_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.cloud_environment.graph_endpoint(),
            self.api_version
        )
    }
}

/// Builder for [`DirectoryConfig`].
#[derive(Debug, Default)]
pub struct DirectoryConfigBuilder {
    tenant_id: Option<String>,
    cloud_environment: Option<CloudEnvironment>,
    api_version: Option<String>,
    page_size: Option<u32>,
    transitive_members: Option<bool>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    max_retry_after_secs: Option<u64>,
}

impl DirectoryConfigBuilder {
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn cloud_environment(mut self, cloud_environment: CloudEnvironment) -> Self {
        self.cloud_environment = Some(cloud_environment);
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn transitive_members(mut self, transitive: bool) -> Self {
        self.transitive_members = Some(transitive);
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    #[must_use]
    pub fn max_retry_after_secs(mut self, secs: u64) -> Self {
        self.max_retry_after_secs = Some(secs);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> DirectoryResult<DirectoryConfig> {
        let config = DirectoryConfig {
            tenant_id: self
                .tenant_id
                .ok_or_else(|| DirectoryError::Config("tenant_id is required".into()))?,
            cloud_environment: self.cloud_environment.unwrap_or_default(),
            api_version: self.api_version.unwrap_or_else(default_api_version),
            page_size: self.page_size.unwrap_or_else(default_page_size),
            transitive_members: self.transitive_members.unwrap_or(false),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or_else(default_request_timeout_secs),
            max_retries: self.max_retries.unwrap_or_else(default_max_retries),
            max_retry_after_secs: self
                .max_retry_after_secs
                .unwrap_or_else(default_max_retry_after_secs),
        };
        config.validate()?;
        Ok(config)
    }
}
