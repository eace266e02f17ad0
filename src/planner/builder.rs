//! Plan construction from two live subscriptions.

use tracing::info;

use crate::azure::SubscriptionApi;
use crate::error::{Result, ResultExt};

use super::diff::DiffEngine;
use super::plan::Plan;

/// Builds a [`Plan`] by listing both subscriptions and diffing them.
pub struct Planner<'a> {
    source: &'a dyn SubscriptionApi,
    target: &'a dyn SubscriptionApi,
    engine: DiffEngine,
}

impl std::fmt::Debug for Planner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("source", &self.source.side())
            .field("target", &self.target.side())
            .finish_non_exhaustive()
    }
}

impl<'a> Planner<'a> {
    /// Creates a planner over a source and a target subscription.
    #[must_use]
    pub const fn new(source: &'a dyn SubscriptionApi, target: &'a dyn SubscriptionApi) -> Self {
        Self {
            source,
            target,
            engine: DiffEngine::new(),
        }
    }

    /// Lists providers then features on both sides and diffs them.
    ///
    /// Every call is sequential: source providers, target providers, source
    /// features, target features.
    ///
    /// # Errors
    ///
    /// Returns the first listing failure, wrapped with the side and the
    /// listing that failed. No partial plan is produced.
    pub async fn plan(&self) -> Result<Plan> {
        let source_providers = self
            .source
            .list_resource_providers()
            .await
            .with_context(|| format!("failed to list resource providers in {} subscription", self.source.side()))?;
        let target_providers = self
            .target
            .list_resource_providers()
            .await
            .with_context(|| format!("failed to list resource providers in {} subscription", self.target.side()))?;
        let (rp_registrations, rp_summary) = self
            .engine
            .diff_with_summary(&source_providers, &target_providers);
        info!(
            "Resource providers: {} registered in source, {} missing in target, {} not registered in target",
            rp_summary.registered_in_source, rp_summary.not_found, rp_summary.not_registered
        );

        let source_features = self
            .source
            .list_preview_features()
            .await
            .with_context(|| format!("failed to list preview features in {} subscription", self.source.side()))?;
        let target_features = self
            .target
            .list_preview_features()
            .await
            .with_context(|| format!("failed to list preview features in {} subscription", self.target.side()))?;
        let (preview_features, feature_summary) = self
            .engine
            .diff_with_summary(&source_features, &target_features);
        info!(
            "Preview features: {} registered in source, {} missing in target, {} not registered in target",
            feature_summary.registered_in_source,
            feature_summary.not_found,
            feature_summary.not_registered
        );

        Ok(Plan::new(rp_registrations, preview_features))
    }
}
