//! The subscription operations the planner and applier depend on.

use async_trait::async_trait;

use crate::config::Side;
use crate::error::Result;
use crate::registration::Registration;

use super::types::SubscriptionInfo;

/// Operations against a single Azure subscription.
///
/// [`super::ArmClient`] implements this over HTTP; tests substitute fakes.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Which side of the sync this subscription is.
    fn side(&self) -> Side;

    /// Fetches subscription metadata.
    async fn get_subscription(&self) -> Result<SubscriptionInfo>;

    /// Lists every resource provider, draining all pages.
    async fn list_resource_providers(&self) -> Result<Vec<Registration>>;

    /// Lists every preview feature, draining all pages.
    async fn list_preview_features(&self) -> Result<Vec<Registration>>;

    /// Registers a resource provider. Registering twice is a no-op success.
    async fn register_resource_provider(&self, namespace: &str) -> Result<()>;

    /// Registers a preview feature. Registering twice is a no-op success.
    async fn register_preview_feature(&self, namespace: &str, key: &str) -> Result<()>;
}
