//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::azure::SubscriptionInfo;
use crate::config::Side;
use crate::planner::{ApplyReport, Plan, PlanEntry, PlanReason};
use crate::registration::RegistrationKind;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan entry row for table display.
#[derive(Tabled)]
struct PlanEntryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Subscription row for table display.
#[derive(Tabled)]
struct SubscriptionRow {
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Display name")]
    display_name: String,
    #[tabled(rename = "Subscription ID")]
    subscription_id: String,
    #[tabled(rename = "Tenant ID")]
    tenant_id: String,
    #[tabled(rename = "State")]
    state: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan for display. `path` is where the plan was written.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan, path: Option<&Path>) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&PlanJson {
                path: path.map(|p| p.display().to_string()),
                rp_registrations: plan.rp_registrations.len(),
                preview_features: plan.preview_features.len(),
                plan,
            })
            .unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan, path),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &Plan, path: Option<&Path>) -> String {
        if plan.is_empty() {
            return format!(
                "{} No changes required - target subscription is in sync.\n",
                "✓".green()
            );
        }

        let mut output = String::new();

        let _ = writeln!(output, "\nPlan");

        let rows: Vec<PlanEntryRow> = plan
            .entries()
            .enumerate()
            .map(|(i, e)| PlanEntryRow {
                index: i + 1,
                kind: Self::format_kind(e),
                name: e.to_string(),
                reason: Self::format_reason(e.reason),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\nPlan: {} resource providers, {} preview features to register\n",
            plan.rp_registrations.len().to_string().green(),
            plan.preview_features.len().to_string().green()
        );

        if let Some(path) = path {
            let _ = writeln!(
                output,
                "\nWritten to {}. Review it, delete any entry you do not want, then run `azsubsyn apply`.",
                path.display()
            );
        }

        output
    }

    /// Formats the result of applying a plan.
    #[must_use]
    pub fn format_apply_report(&self, report: &ApplyReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&ApplyJson::from(report)).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();

                for entry in &report.succeeded {
                    let _ = writeln!(output, "  {} {} {entry}", "✓".green(), entry.kind());
                }
                for failure in &report.failed {
                    let _ = writeln!(
                        output,
                        "  {} {} {}: {}",
                        "✗".red(),
                        failure.entry.kind(),
                        failure.entry,
                        failure.error
                    );
                }

                let summary = report.to_string();
                if report.all_successful() {
                    let _ = writeln!(output, "\n{}", summary.green());
                } else {
                    let _ = writeln!(output, "\n{}", summary.yellow());
                }

                output
            }
        }
    }

    /// Formats the subscriptions found by `credcheck`.
    #[must_use]
    pub fn format_subscriptions(&self, subscriptions: &[(Side, SubscriptionInfo)]) -> String {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<SubscriptionJson<'_>> = subscriptions
                    .iter()
                    .map(|(side, info)| SubscriptionJson { side: *side, info })
                    .collect();
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let rows: Vec<SubscriptionRow> = subscriptions
                    .iter()
                    .map(|(side, info)| SubscriptionRow {
                        side: side.to_string(),
                        display_name: info.display_name.clone(),
                        subscription_id: info.subscription_id.clone(),
                        tenant_id: info.tenant_id.clone().unwrap_or_else(|| String::from("-")),
                        state: info.state.clone().unwrap_or_else(|| String::from("-")),
                    })
                    .collect();

                let mut output = String::new();
                let _ = writeln!(output, "{} Credentials OK\n", "✓".green());
                output.push_str(&Table::new(rows).to_string());
                let _ = writeln!(output, "\n\nNext: run `azsubsyn plan` to compare the subscriptions.");
                output
            }
        }
    }

    /// Formats an entry kind with color.
    fn format_kind(entry: &PlanEntry) -> String {
        match entry.kind() {
            RegistrationKind::ResourceProvider => "provider".cyan().to_string(),
            RegistrationKind::PreviewFeature => "feature".magenta().to_string(),
        }
    }

    /// Formats a plan reason with color.
    fn format_reason(reason: PlanReason) -> String {
        match reason {
            PlanReason::NotFoundInTarget => reason.as_str().green().to_string(),
            PlanReason::NotRegisteredInTarget => reason.as_str().yellow().to_string(),
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    rp_registrations: usize,
    preview_features: usize,
    plan: &'a Plan,
}

#[derive(serde::Serialize)]
struct ApplyJson<'a> {
    succeeded: &'a [PlanEntry],
    failed: Vec<FailureJson<'a>>,
}

#[derive(serde::Serialize)]
struct FailureJson<'a> {
    #[serde(flatten)]
    entry: &'a PlanEntry,
    error: String,
}

impl<'a> From<&'a ApplyReport> for ApplyJson<'a> {
    fn from(report: &'a ApplyReport) -> Self {
        Self {
            succeeded: &report.succeeded,
            failed: report
                .failed
                .iter()
                .map(|f| FailureJson {
                    entry: &f.entry,
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(serde::Serialize)]
struct SubscriptionJson<'a> {
    side: Side,
    #[serde(flatten)]
    info: &'a SubscriptionInfo,
}
