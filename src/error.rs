//! Error types for azsubsyn.
//!
//! This module provides the error hierarchy for every stage of a sync run:
//! configuration, authentication, Azure Resource Manager calls, and the
//! plan file.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::Side;

/// The main error type for azsubsyn.
#[derive(Debug, Error)]
pub enum AzsubsynError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication errors.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Azure Resource Manager API errors.
    #[error("Azure API error: {0}")]
    Azure(#[from] AzureError),

    /// Plan file errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error wrapped with a description of what was being attempted.
    #[error("{message}: {source}")]
    Context {
        /// What was being attempted.
        message: String,
        /// The underlying error.
        #[source]
        source: Box<AzsubsynError>,
    },

    /// Some plan entries failed and the run was asked to be strict.
    #[error("{failed} of {total} plan entries failed to apply")]
    ApplyIncomplete {
        /// Number of failed entries.
        failed: usize,
        /// Number of entries attempted.
        total: usize,
    },

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required environment variables are missing or blank.
    #[error("Missing required environment variables: {}", .names.join(", "))]
    MissingEnvVars {
        /// Names of every missing variable, in check order.
        names: Vec<String>,
    },

    /// An environment variable has an unusable value.
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        /// Name of the variable.
        name: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The dotenv file could not be loaded.
    #[error("Failed to load env file {}: {message}", .path.display())]
    EnvFile {
        /// Path of the dotenv file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Authentication errors. Always names the subscription side.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected the client credentials or was unreachable.
    #[error("Failed to acquire {side} token: {message}")]
    TokenRequestFailed {
        /// Which subscription the credential belongs to.
        side: Side,
        /// Description of the failure.
        message: String,
    },

    /// The token endpoint answered with something that is not a token.
    #[error("Invalid {side} token response: {message}")]
    InvalidTokenResponse {
        /// Which subscription the credential belongs to.
        side: Side,
        /// Description of the response issue.
        message: String,
    },
}

/// Azure Resource Manager API errors.
#[derive(Debug, Error)]
pub enum AzureError {
    /// The API rejected the bearer token.
    #[error("Request to {side} subscription was not authorized ({status}): {message}")]
    Unauthorized {
        /// Which subscription was called.
        side: Side,
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// API request failed.
    #[error("Request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },

    /// A preview feature name is not of the form `<namespace>/<key>`.
    #[error("Malformed preview feature name: {name:?}")]
    MalformedFeatureName {
        /// The offending name.
        name: String,
    },
}

/// Plan file errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file does not exist.
    #[error("Plan file not found: {} (run `azsubsyn plan` first)", .path.display())]
    FileNotFound {
        /// Path of the missing file.
        path: PathBuf,
    },

    /// The plan could not be parsed after stripping comments.
    #[error("Failed to parse plan: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The plan could not be serialized.
    #[error("Failed to serialize plan: {message}")]
    SerializeError {
        /// Description of the serialization error.
        message: String,
    },

    /// A plan entry is structurally invalid.
    #[error("Invalid entry {section}[{index}]: {message}")]
    InvalidEntry {
        /// Plan section (`rpRegistrations` or `previewFeatures`).
        section: &'static str,
        /// Index of the entry in its section.
        index: usize,
        /// What is wrong with the entry.
        message: String,
    },
}

/// Result type alias for azsubsyn operations.
pub type Result<T> = std::result::Result<T, AzsubsynError>;

impl AzsubsynError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps this error with a description of what was being attempted.
    #[must_use]
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Returns true if this error is worth retrying at the transport level.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Azure(AzureError::RateLimited { .. } | AzureError::NetworkError { .. }) => true,
            Self::Azure(AzureError::ApiRequestFailed { status, .. }) => {
                *status == 408 || *status == 429 || *status >= 500
            }
            Self::Context { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns the suggested retry delay in seconds, if the error carries one.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Azure(AzureError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl AzureError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl PlanError {
    /// Creates a parse error without a location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }
}

/// Adds context to the error of a [`Result`].
pub trait ResultExt<T> {
    /// Wraps the error, if any, with a lazily built context message.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`AzsubsynError::Context`].
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<AzsubsynError>,
{
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.into().context(f()))
    }
}
