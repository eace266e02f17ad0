//! Normalized registration records.
//!
//! Resource providers and preview features are both reduced to a
//! [`Registration`]: a namespace, an optional feature key, and a parsed
//! [`RegistrationState`]. Raw state strings from the API are parsed once,
//! case-insensitively, when a record is built.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AzureError, Result};

/// Registration state of a resource provider or preview feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistrationState {
    /// Registered and usable.
    Registered,
    /// Never registered, or unregistered (providers).
    NotRegistered,
    /// Registration in progress.
    Registering,
    /// Unregistration in progress.
    Unregistering,
    /// Unregistered (features).
    Unregistered,
    /// Registration requested and awaiting approval (features).
    Pending,
    /// Any other value reported by the API, kept verbatim.
    Unknown(String),
}

impl RegistrationState {
    /// Parses a state string, ignoring ASCII case.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "registered" => Self::Registered,
            "notregistered" => Self::NotRegistered,
            "registering" => Self::Registering,
            "unregistering" => Self::Unregistering,
            "unregistered" => Self::Unregistered,
            "pending" => Self::Pending,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Returns true only for [`RegistrationState::Registered`].
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }

    /// Canonical spelling of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Registered => "Registered",
            Self::NotRegistered => "NotRegistered",
            Self::Registering => "Registering",
            Self::Unregistering => "Unregistering",
            Self::Unregistered => "Unregistered",
            Self::Pending => "Pending",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for RegistrationState {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a registration record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationKind {
    /// A resource provider namespace.
    ResourceProvider,
    /// A preview feature within a namespace.
    PreviewFeature,
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ResourceProvider => "resource provider",
            Self::PreviewFeature => "preview feature",
        };
        write!(f, "{s}")
    }
}

/// A resource provider or preview feature as seen in one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Provider namespace, e.g. `Microsoft.Compute`.
    pub namespace: String,
    /// Feature key for preview features, `None` for providers.
    pub key: Option<String>,
    /// Parsed registration state.
    pub state: RegistrationState,
}

impl Registration {
    /// Creates a resource provider record.
    #[must_use]
    pub fn provider(namespace: impl Into<String>, state: impl Into<RegistrationState>) -> Self {
        Self {
            namespace: namespace.into(),
            key: None,
            state: state.into(),
        }
    }

    /// Creates a preview feature record.
    #[must_use]
    pub fn feature(
        namespace: impl Into<String>,
        key: impl Into<String>,
        state: impl Into<RegistrationState>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: Some(key.into()),
            state: state.into(),
        }
    }

    /// Builds a preview feature record from a full feature name such as
    /// `Microsoft.DevAI/Dev`. The name is split on the first `/`.
    ///
    /// # Errors
    ///
    /// Returns [`AzureError::MalformedFeatureName`] if the name has no `/`
    /// or either half is empty.
    pub fn from_feature_name(name: &str, state: impl Into<RegistrationState>) -> Result<Self> {
        match name.split_once('/') {
            Some((namespace, key)) if !namespace.is_empty() && !key.is_empty() => {
                Ok(Self::feature(namespace, key, state))
            }
            _ => Err(AzureError::MalformedFeatureName {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Whether this is a provider or a feature.
    #[must_use]
    pub const fn kind(&self) -> RegistrationKind {
        if self.key.is_some() {
            RegistrationKind::PreviewFeature
        } else {
            RegistrationKind::ResourceProvider
        }
    }

    /// Lookup identity: namespace plus optional key, compared exactly.
    #[must_use]
    pub fn identity(&self) -> (&str, Option<&str>) {
        (self.namespace.as_str(), self.key.as_deref())
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}/{key} ({})", self.namespace, self.state),
            None => write!(f, "{} ({})", self.namespace, self.state),
        }
    }
}
