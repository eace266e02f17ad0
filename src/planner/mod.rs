//! Planning module for subscription sync.
//!
//! This module handles the comparison between source and target
//! registrations, the plan file, and applying a plan to the target.

mod builder;
mod diff;
mod executor;
mod jsonc;
mod plan;

pub use builder::Planner;
pub use diff::{DiffEngine, DiffSummary};
pub use executor::{Applier, ApplyFailure, ApplyReport};
pub use jsonc::strip_json_comments;
pub use plan::{DEFAULT_PLAN_FILE, Plan, PlanEntry, PlanHeader, PlanReason};
