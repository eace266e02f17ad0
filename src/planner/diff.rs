//! Diff engine for comparing source and target registrations.
//!
//! This module computes which registrations the target subscription is
//! missing. The diff is strictly additive: nothing registered in the target
//! is ever scheduled for removal.

use std::collections::HashMap;
use tracing::debug;

use crate::registration::Registration;

use super::plan::{PlanEntry, PlanReason};

/// Engine for computing diffs between source and target registrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffEngine;

/// Summary counts for one diff.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    /// Source records that are registered.
    pub registered_in_source: usize,
    /// Entries with [`PlanReason::NotFoundInTarget`].
    pub not_found: usize,
    /// Entries with [`PlanReason::NotRegisteredInTarget`].
    pub not_registered: usize,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the entries needed to bring `target` in line with `source`.
    ///
    /// Only source records in the `Registered` state produce entries. Output
    /// order follows the source order. When the target lists the same
    /// identity twice, the last record wins.
    #[must_use]
    pub fn diff(&self, source: &[Registration], target: &[Registration]) -> Vec<PlanEntry> {
        self.diff_with_summary(source, target).0
    }

    /// Like [`DiffEngine::diff`], also returning summary counts.
    #[must_use]
    pub fn diff_with_summary(
        &self,
        source: &[Registration],
        target: &[Registration],
    ) -> (Vec<PlanEntry>, DiffSummary) {
        let target_by_identity: HashMap<(&str, Option<&str>), &Registration> =
            target.iter().map(|r| (r.identity(), r)).collect();

        let mut entries = Vec::new();
        let mut summary = DiffSummary::default();

        for record in source.iter().filter(|r| r.state.is_registered()) {
            summary.registered_in_source += 1;

            let reason = match target_by_identity.get(&record.identity()) {
                None => PlanReason::NotFoundInTarget,
                Some(existing) if !existing.state.is_registered() => {
                    PlanReason::NotRegisteredInTarget
                }
                Some(_) => continue,
            };

            debug!("{} {record}: {reason}", record.kind());
            match reason {
                PlanReason::NotFoundInTarget => summary.not_found += 1,
                PlanReason::NotRegisteredInTarget => summary.not_registered += 1,
            }

            entries.push(PlanEntry {
                key: record.key.clone(),
                namespace: record.namespace.clone(),
                reason,
            });
        }

        (entries, summary)
    }
}
