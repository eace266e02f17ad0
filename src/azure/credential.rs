//! Client secret credential for a service principal.
//!
//! Tokens are requested with the OAuth2 client credentials grant and cached
//! until shortly before they expire.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, Url};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{AzureEndpoints, Side, SubscriptionConfig};
use crate::error::{AuthError, AzsubsynError, AzureError, ConfigError, Result};

use super::retry::RetryPolicy;
use super::types::{TokenErrorResponse, TokenResponse};

/// Tokens this close to expiry are refreshed.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// A bearer token and its expiry.
#[derive(Clone)]
struct AccessToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Service principal credential for one subscription side.
pub struct ClientSecretCredential {
    side: Side,
    client_id: String,
    client_secret: String,
    token_url: Url,
    scope: String,
    cached: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("side", &self.side)
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url.as_str())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    /// Creates a credential from one side's configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token URL cannot be built from
    /// the authority host and tenant id.
    pub fn new(config: &SubscriptionConfig, endpoints: &AzureEndpoints) -> Result<Self> {
        let token_url = endpoints
            .authority_host
            .join(&format!("{}/oauth2/v2.0/token", config.tenant_id))
            .map_err(|e| ConfigError::InvalidValue {
                name: format!("{} tenant id", config.side),
                message: format!("cannot build token URL: {e}"),
            })?;

        Ok(Self {
            side: config.side,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url,
            scope: endpoints.scope(),
            cached: Mutex::new(None),
        })
    }

    /// Which subscription this credential belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns a valid bearer token, requesting a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] naming the side if no token can be obtained.
    pub async fn token(&self, http: &Client, retry: &RetryPolicy) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.secret.clone());
        }

        debug!("Requesting {} access token", self.side);
        let fresh = retry
            .run("token request", || self.request_token(http))
            .await
            .map_err(|e| match e {
                AzsubsynError::Auth(_) => e,
                other => AuthError::TokenRequestFailed {
                    side: self.side,
                    message: other.to_string(),
                }
                .into(),
            })?;

        info!("Acquired {} access token (expires {})", self.side, fresh.expires_at);
        let secret = fresh.secret.clone();
        *cached = Some(fresh);
        Ok(secret)
    }

    async fn request_token(&self, http: &Client) -> Result<AccessToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = http
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| AzureError::network(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AzureError::network(format!("Failed to read token response: {e}")))?;

        if status.as_u16() == 429 || status.as_u16() == 408 || status.is_server_error() {
            return Err(AzureError::api_error(status.as_u16(), TokenErrorResponse::message_from(&body)).into());
        }

        if !status.is_success() {
            return Err(AuthError::TokenRequestFailed {
                side: self.side,
                message: format!("{status}: {}", TokenErrorResponse::message_from(&body)),
            }
            .into());
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidTokenResponse {
                side: self.side,
                message: e.to_string(),
            })?;

        let lifetime = i64::try_from(token.expires_in).unwrap_or(i64::MAX / 2);
        Ok(AccessToken {
            secret: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime.min(86_400)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tenant: &str) -> SubscriptionConfig {
        SubscriptionConfig {
            side: Side::Target,
            client_id: String::from("client"),
            client_secret: String::from("secret"),
            tenant_id: tenant.to_string(),
            subscription_id: String::from("sub"),
        }
    }

    #[test]
    fn test_token_url_and_scope() {
        let credential =
            ClientSecretCredential::new(&config("my-tenant"), &AzureEndpoints::default()).unwrap();

        assert_eq!(
            credential.token_url.as_str(),
            "https://login.microsoftonline.com/my-tenant/oauth2/v2.0/token"
        );
        assert_eq!(credential.scope, "https://management.azure.com/.default");
        assert_eq!(credential.side(), Side::Target);
    }

    #[test]
    fn test_debug_hides_secret() {
        let credential =
            ClientSecretCredential::new(&config("t"), &AzureEndpoints::default()).unwrap();
        assert!(!format!("{credential:?}").contains("secret\""));
    }

    #[test]
    fn test_freshness_margin() {
        let now = Utc::now();
        let token = AccessToken {
            secret: String::from("x"),
            expires_at: now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS - 1),
        };
        assert!(!token.is_fresh(now));

        let token = AccessToken {
            secret: String::from("x"),
            expires_at: now + ChronoDuration::seconds(3600),
        };
        assert!(token.is_fresh(now));
    }
}
