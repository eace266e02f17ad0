//! Configuration types for a sync run.
//!
//! A [`SyncConfig`] is built once at startup and passed by reference to every
//! collaborator; nothing reads the process environment after that.

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default Microsoft Entra ID authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default Azure Resource Manager endpoint.
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";

/// Which of the two subscriptions a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The subscription whose registrations are copied.
    Source,
    /// The subscription that receives the registrations.
    Target,
}

impl Side {
    /// Infix used in environment variable names (`<PREFIX>_<INFIX>_CLIENT_ID`).
    #[must_use]
    pub const fn env_infix(self) -> &'static str {
        match self {
            Self::Source => "SRC",
            Self::Target => "TARGET",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Source => "source",
            Self::Target => "target",
        };
        write!(f, "{s}")
    }
}

/// Service principal credentials and subscription id for one side.
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Which side this configuration is for.
    pub side: Side,
    /// Application (client) id of the service principal.
    pub client_id: String,
    /// Client secret of the service principal.
    pub client_secret: String,
    /// Directory (tenant) id.
    pub tenant_id: String,
    /// Subscription id.
    pub subscription_id: String,
}

impl fmt::Debug for SubscriptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionConfig")
            .field("side", &self.side)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

/// Endpoints of the Azure cloud being talked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureEndpoints {
    /// Authority host used for token requests.
    pub authority_host: Url,
    /// Azure Resource Manager endpoint.
    pub resource_manager: Url,
}

impl AzureEndpoints {
    /// Creates endpoints from explicit URLs.
    #[must_use]
    pub const fn new(authority_host: Url, resource_manager: Url) -> Self {
        Self {
            authority_host,
            resource_manager,
        }
    }

    /// Token scope for the resource manager (`<endpoint>/.default`).
    #[must_use]
    pub fn scope(&self) -> String {
        format!(
            "{}/.default",
            self.resource_manager.as_str().trim_end_matches('/')
        )
    }
}

impl Default for AzureEndpoints {
    // Both constants are valid absolute URLs.
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            authority_host: Url::parse(DEFAULT_AUTHORITY_HOST).expect("valid authority host"),
            resource_manager: Url::parse(DEFAULT_RESOURCE_MANAGER_ENDPOINT)
                .expect("valid resource manager endpoint"),
        }
    }
}

/// Complete configuration for commands that touch both subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Source subscription.
    pub source: SubscriptionConfig,
    /// Target subscription.
    pub target: SubscriptionConfig,
    /// Cloud endpoints shared by both sides.
    pub endpoints: AzureEndpoints,
}
