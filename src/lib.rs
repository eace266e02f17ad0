// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # azsubsyn
//!
//! Brings the resource provider registrations and preview feature flags of a
//! target Azure subscription in line with a source subscription.
//!
//! ## Overview
//!
//! The workflow is plan, review, apply:
//!
//! - `azsubsyn credcheck` checks both service principals can read their subscription
//! - `azsubsyn plan` lists both subscriptions and writes `azsubsyn-plan.jsonc`
//! - the plan file may be edited by hand (comments are allowed)
//! - `azsubsyn apply` registers every remaining entry in the target
//!
//! The sync is strictly additive: nothing is ever unregistered in the target.
//!
//! ## Modules
//!
//! - [`config`]: Environment-based configuration
//! - [`azure`]: Azure Resource Manager client and the [`azure::SubscriptionApi`] seam
//! - [`registration`]: Normalized provider and feature records
//! - [`planner`]: Diff engine, plan file, and applier
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```jsonc
//! // Generated by azsubsyn 0.1.0 at 2026-10-19T10:00:00Z
//! {
//!   "rpRegistrations": [
//!     { "namespace": "Microsoft.Compute", "reason": "NotFoundInTarget" }
//!   ],
//!   "previewFeatures": [
//!     { "key": "Dev", "namespace": "Microsoft.DevAI", "reason": "NotRegisteredInTarget" }
//!   ]
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod azure;
pub mod cli;
pub mod config;
pub mod error;
pub mod planner;
pub mod registration;

// ============================================================================
// Re-exports
// ============================================================================

pub use azure::{ArmClient, SubscriptionApi, SubscriptionInfo};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, Side, SubscriptionConfig, SyncConfig};
pub use error::{AzsubsynError, Result};
pub use planner::{Applier, ApplyReport, DiffEngine, Plan, PlanEntry, PlanReason, Planner};
pub use registration::{Registration, RegistrationKind, RegistrationState};
