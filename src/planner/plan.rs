//! Plan types and the plan file format.
//!
//! A plan lists the resource providers and preview features that should be
//! registered in the target subscription. It is written as JSON preceded by
//! a `//` comment header, may be hand-edited, and is read back by `apply`.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::registration::RegistrationKind;

use super::jsonc::strip_json_comments;

/// Default plan file name, relative to the working directory.
pub const DEFAULT_PLAN_FILE: &str = "azsubsyn-plan.jsonc";

const RP_SECTION: &str = "rpRegistrations";
const FEATURE_SECTION: &str = "previewFeatures";

/// Why a registration is in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanReason {
    /// Registered in the source, absent from the target.
    NotFoundInTarget,
    /// Registered in the source, present but not registered in the target.
    NotRegisteredInTarget,
}

impl PlanReason {
    /// Serialized spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFoundInTarget => "NotFoundInTarget",
            Self::NotRegisteredInTarget => "NotRegisteredInTarget",
        }
    }
}

impl fmt::Display for PlanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registration to perform in the target subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Feature key; absent for resource providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Provider namespace.
    pub namespace: String,
    /// Why the entry was planned.
    pub reason: PlanReason,
}

impl PlanEntry {
    /// Creates a resource provider entry.
    #[must_use]
    pub fn provider(namespace: impl Into<String>, reason: PlanReason) -> Self {
        Self {
            key: None,
            namespace: namespace.into(),
            reason,
        }
    }

    /// Creates a preview feature entry.
    #[must_use]
    pub fn feature(namespace: impl Into<String>, key: impl Into<String>, reason: PlanReason) -> Self {
        Self {
            key: Some(key.into()),
            namespace: namespace.into(),
            reason,
        }
    }

    /// Whether this entry registers a provider or a feature.
    #[must_use]
    pub const fn kind(&self) -> RegistrationKind {
        if self.key.is_some() {
            RegistrationKind::PreviewFeature
        } else {
            RegistrationKind::ResourceProvider
        }
    }
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}/{key}", self.namespace),
            None => f.write_str(&self.namespace),
        }
    }
}

/// The full set of registrations to apply to the target subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Resource providers to register, in source order.
    #[serde(rename = "rpRegistrations", default)]
    pub rp_registrations: Vec<PlanEntry>,
    /// Preview features to register, in source order.
    #[serde(rename = "previewFeatures", default)]
    pub preview_features: Vec<PlanEntry>,
}

/// Metadata written as comments above the plan JSON.
#[derive(Debug, Clone)]
pub struct PlanHeader {
    /// When the plan was generated.
    pub generated_at: DateTime<Utc>,
    /// Source subscription id.
    pub source_subscription: String,
    /// Target subscription id.
    pub target_subscription: String,
}

impl PlanHeader {
    /// Creates a header stamped with the current time.
    #[must_use]
    pub fn new(source_subscription: impl Into<String>, target_subscription: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            source_subscription: source_subscription.into(),
            target_subscription: target_subscription.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "// Generated by azsubsyn {} at {}\n\
             // Source subscription: {}\n\
             // Target subscription: {}\n\
             // Delete any entry you do not want to apply, then run `azsubsyn apply`.\n",
            env!("CARGO_PKG_VERSION"),
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.source_subscription,
            self.target_subscription,
        )
    }
}

impl Plan {
    /// Creates a plan from its two sections.
    #[must_use]
    pub const fn new(rp_registrations: Vec<PlanEntry>, preview_features: Vec<PlanEntry>) -> Self {
        Self {
            rp_registrations,
            preview_features,
        }
    }

    /// Returns true if there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rp_registrations.is_empty() && self.preview_features.is_empty()
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rp_registrations.len() + self.preview_features.len()
    }

    /// All entries, providers first, each section in plan order.
    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.rp_registrations.iter().chain(&self.preview_features)
    }

    /// Serializes the plan as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            PlanError::SerializeError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serializes the plan as JSON preceded by a comment header.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_jsonc(&self, header: &PlanHeader) -> Result<String> {
        let mut out = header.render();
        out.push_str(&self.to_json()?);
        out.push('\n');
        Ok(out)
    }

    /// Parses a plan from JSON that may contain comments, then validates it.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed JSON and an invalid entry error
    /// for structurally wrong entries.
    pub fn from_jsonc(text: &str) -> Result<Self> {
        let stripped = strip_json_comments(text);
        let plan: Self = serde_json::from_str(&stripped).map_err(|e| PlanError::ParseError {
            message: e.to_string(),
            location: Some(format!(
                "line {}, column {} after comment removal",
                e.line(),
                e.column()
            )),
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Checks that every entry is well formed for its section.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidEntry`] for the first offending entry.
    pub fn validate(&self) -> Result<()> {
        for (index, entry) in self.rp_registrations.iter().enumerate() {
            check_namespace(RP_SECTION, index, entry)?;
            if entry.key.is_some() {
                return Err(invalid(RP_SECTION, index, "resource provider entries must not have a key"));
            }
        }

        for (index, entry) in self.preview_features.iter().enumerate() {
            check_namespace(FEATURE_SECTION, index, entry)?;
            if entry.key.as_deref().is_none_or(|k| k.trim().is_empty()) {
                return Err(invalid(FEATURE_SECTION, index, "preview feature entries need a non-empty key"));
            }
        }

        Ok(())
    }

    /// Writes the plan to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be serialized or written.
    pub async fn save(&self, path: &Path, header: &PlanHeader) -> Result<()> {
        let content = self.to_jsonc(header)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temporary file first, then rename
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, path).await?;

        info!("Plan saved to: {}", path.display());
        Ok(())
    }

    /// Reads and validates a plan file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::FileNotFound`] if the file does not exist, or a
    /// parse or validation error.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PlanError::FileNotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        let plan = Self::from_jsonc(&content)?;
        debug!(
            "Loaded plan from {}: {} providers, {} features",
            path.display(),
            plan.rp_registrations.len(),
            plan.preview_features.len()
        );
        Ok(plan)
    }
}

fn check_namespace(section: &'static str, index: usize, entry: &PlanEntry) -> Result<()> {
    if entry.namespace.trim().is_empty() {
        return Err(invalid(section, index, "namespace must not be empty"));
    }
    Ok(())
}

fn invalid(section: &'static str, index: usize, message: &str) -> crate::error::AzsubsynError {
    PlanError::InvalidEntry {
        section,
        index,
        message: message.to_string(),
    }
    .into()
}
