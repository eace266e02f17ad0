//! Azure Resource Manager integration module.
//!
//! This module provides everything needed to talk to one subscription:
//! client-credential tokens, authenticated requests with transport retries,
//! `nextLink` pagination, and the provider/feature listing and registration
//! calls behind [`SubscriptionApi`].

mod api;
mod client;
mod credential;
mod retry;
mod types;

pub use api::SubscriptionApi;
pub use client::ArmClient;
pub use credential::ClientSecretCredential;
pub use retry::{MAX_RETRIES, RetryPolicy};
pub use types::SubscriptionInfo;

use tracing::info;

use crate::error::{Result, ResultExt};

/// Fetches subscription metadata for each client in order.
///
/// Used by `credcheck`: the first side that cannot authenticate or read its
/// subscription aborts the check with an error naming that side.
///
/// # Errors
///
/// Returns the first failure, wrapped with the side it occurred on.
pub async fn check_access(apis: &[&dyn SubscriptionApi]) -> Result<Vec<SubscriptionInfo>> {
    let mut found = Vec::with_capacity(apis.len());

    for api in apis {
        let side = api.side();
        let info = api
            .get_subscription()
            .await
            .with_context(|| format!("failed to read {side} subscription"))?;
        info!("{side} subscription OK: {} ({})", info.display_name, info.subscription_id);
        found.push(info);
    }

    Ok(found)
}
