//! Configuration parser for environment variables and `.env` files.
//!
//! Every required variable is checked before an error is returned, so a user
//! sees the full list of what is missing in one run.

use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::{debug, info};

use crate::error::{AzsubsynError, ConfigError, Result};

use super::spec::{
    AzureEndpoints, DEFAULT_AUTHORITY_HOST, DEFAULT_RESOURCE_MANAGER_ENDPOINT, Side,
    SubscriptionConfig, SyncConfig,
};

/// Prefix of every environment variable read by the tool.
pub const ENV_PREFIX: &str = "AZSUBSYN";

/// Default dotenv file name, resolved against the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Reads configuration through a variable lookup function.
///
/// Production code uses [`ConfigParser::from_env`]; tests inject a closure.
pub struct ConfigParser<F> {
    lookup: F,
}

impl ConfigParser<fn(&str) -> Option<String>> {
    /// Creates a parser backed by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            lookup: |name: &str| std::env::var(name).ok(),
        }
    }
}

impl<F> ConfigParser<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Creates a parser backed by an arbitrary lookup function.
    #[must_use]
    pub const fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    /// Loads both subscriptions and the cloud endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVars`] listing every missing variable
    /// across both sides, or [`ConfigError::InvalidValue`] for a bad endpoint.
    pub fn load(&self) -> Result<SyncConfig> {
        let mut missing = Vec::new();
        let source = self.subscription(Side::Source, &mut missing);
        let target = self.subscription(Side::Target, &mut missing);

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars { names: missing }.into());
        }

        let endpoints = self.endpoints()?;
        debug!(
            source = %source.subscription_id,
            target = %target.subscription_id,
            "Loaded configuration"
        );

        Ok(SyncConfig {
            source,
            target,
            endpoints,
        })
    }

    /// Loads a single subscription side.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVars`] listing every missing variable
    /// of that side.
    pub fn load_side(&self, side: Side) -> Result<SubscriptionConfig> {
        let mut missing = Vec::new();
        let config = self.subscription(side, &mut missing);

        if missing.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::MissingEnvVars { names: missing }.into())
        }
    }

    /// Loads the cloud endpoints, falling back to the public cloud.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if an override is not an
    /// absolute http(s) URL.
    pub fn endpoints(&self) -> Result<AzureEndpoints> {
        let authority_host = self.url_var("AUTHORITY_HOST", DEFAULT_AUTHORITY_HOST)?;
        let resource_manager =
            self.url_var("RESOURCE_MANAGER_ENDPOINT", DEFAULT_RESOURCE_MANAGER_ENDPOINT)?;

        Ok(AzureEndpoints::new(authority_host, resource_manager))
    }

    /// Reads one side, pushing the names of blank or unset variables.
    fn subscription(&self, side: Side, missing: &mut Vec<String>) -> SubscriptionConfig {
        let mut read = |suffix: &str| {
            let name = side_var_name(side, suffix);
            self.non_blank(&name).unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        SubscriptionConfig {
            side,
            client_id: read("CLIENT_ID"),
            client_secret: read("CLIENT_SECRET"),
            tenant_id: read("TENANT_ID"),
            subscription_id: read("SUBSCRIPTION_ID"),
        }
    }

    fn url_var(&self, suffix: &str, default: &str) -> Result<Url> {
        let name = format!("{ENV_PREFIX}_{suffix}");
        let Some(raw) = self.non_blank(&name) else {
            return parse_url(&name, default);
        };

        debug!("Overriding {name} from environment");
        parse_url(&name, &raw)
    }

    fn non_blank(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Builds the variable name for one side, e.g. `AZSUBSYN_SRC_CLIENT_ID`.
#[must_use]
pub fn side_var_name(side: Side, suffix: &str) -> String {
    format!("{ENV_PREFIX}_{}_{suffix}", side.env_infix())
}

fn parse_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        message: format!("{raw:?} is not a valid URL: {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("{raw:?} must use http or https"),
        }
        .into());
    }

    Ok(url)
}

/// Loads a dotenv file into the process environment.
///
/// Variables already set in the environment are left untouched. When no
/// path is given, `./.env` is loaded if it exists.
///
/// # Errors
///
/// Returns an error if an explicitly requested file does not exist or any
/// file cannot be parsed.
pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
    let (env_path, explicit) = path.map_or_else(
        || (PathBuf::from(DEFAULT_ENV_FILE), false),
        |p| (p.to_path_buf(), true),
    );

    if !env_path.exists() {
        if explicit {
            return Err(AzsubsynError::Config(ConfigError::EnvFile {
                path: env_path,
                message: String::from("file does not exist"),
            }));
        }
        debug!(".env file not found at: {}", env_path.display());
        return Ok(());
    }

    info!("Loading environment from: {}", env_path.display());
    dotenvy::from_path(&env_path).map_err(|e| {
        AzsubsynError::Config(ConfigError::EnvFile {
            path: env_path.clone(),
            message: e.to_string(),
        })
    })
}
