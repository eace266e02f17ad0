//! Plan applier.
//!
//! Replays each plan entry against the target subscription. A failing entry
//! is logged and recorded; the remaining entries are still attempted.

use tracing::{error, info};

use crate::azure::SubscriptionApi;
use crate::error::AzsubsynError;

use super::plan::{Plan, PlanEntry};

/// Applies plans to a target subscription.
pub struct Applier<'a> {
    /// Target subscription.
    target: &'a dyn SubscriptionApi,
}

impl std::fmt::Debug for Applier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Applier")
            .field("target", &self.target.side())
            .finish()
    }
}

/// An entry that could not be applied.
#[derive(Debug)]
pub struct ApplyFailure {
    /// The entry that failed.
    pub entry: PlanEntry,
    /// Why it failed.
    pub error: AzsubsynError,
}

/// Result of applying a plan.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Entries registered successfully, in apply order.
    pub succeeded: Vec<PlanEntry>,
    /// Entries that failed, in apply order.
    pub failed: Vec<ApplyFailure>,
}

impl<'a> Applier<'a> {
    /// Creates an applier for the target subscription.
    #[must_use]
    pub const fn new(target: &'a dyn SubscriptionApi) -> Self {
        Self { target }
    }

    /// Applies every entry, providers first, then features, in plan order.
    ///
    /// Never aborts early: per-entry failures are collected in the report.
    pub async fn apply(&self, plan: &Plan) -> ApplyReport {
        let mut report = ApplyReport::default();

        if plan.is_empty() {
            info!("Plan is empty, nothing to apply");
            return report;
        }

        info!(
            "Applying plan to {} subscription: {} resource providers, {} preview features",
            self.target.side(),
            plan.rp_registrations.len(),
            plan.preview_features.len()
        );

        for entry in plan.entries() {
            let result = match entry.key.as_deref() {
                Some(key) => {
                    self.target
                        .register_preview_feature(&entry.namespace, key)
                        .await
                }
                None => self.target.register_resource_provider(&entry.namespace).await,
            };

            match result {
                Ok(()) => {
                    info!("Registered {} {entry}", entry.kind());
                    report.succeeded.push(entry.clone());
                }
                Err(e) => {
                    error!("Failed to register {} {entry}: {e}", entry.kind());
                    report.failed.push(ApplyFailure {
                        entry: entry.clone(),
                        error: e,
                    });
                }
            }
        }

        info!("{report}");
        report
    }
}

impl ApplyReport {
    /// Returns true if no entry failed.
    #[must_use]
    pub fn all_successful(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of entries attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

impl std::fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Applied {} entries: {} succeeded, {} failed",
            self.total(),
            self.succeeded.len(),
            self.failed.len()
        )
    }
}
