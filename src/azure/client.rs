//! Azure Resource Manager client.
//!
//! This module provides the HTTP client for listing and registering resource
//! providers and preview features in one subscription.

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::{AzureEndpoints, Side, SubscriptionConfig};
use crate::error::{AzsubsynError, AzureError, Result};
use crate::registration::Registration;

use super::api::SubscriptionApi;
use super::credential::ClientSecretCredential;
use super::retry::RetryPolicy;
use super::types::{
    ArmErrorResponse, FeatureResource, Page, ProviderResource, SubscriptionInfo,
    SubscriptionResource,
};

/// API version for `Microsoft.Resources` provider operations.
const PROVIDERS_API_VERSION: &str = "2021-04-01";

/// API version for `Microsoft.Features` operations.
const FEATURES_API_VERSION: &str = "2021-07-01";

/// API version for subscription reads.
const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Header used to correlate requests with Azure activity logs.
const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Azure Resource Manager client scoped to one subscription.
#[derive(Debug)]
pub struct ArmClient {
    /// HTTP client.
    http: Client,
    /// Credential for this subscription's service principal.
    credential: ClientSecretCredential,
    /// Resource manager endpoint.
    endpoint: Url,
    /// Subscription id.
    subscription_id: String,
    /// Transport retry policy.
    retry: RetryPolicy,
}

impl ArmClient {
    /// Creates a client for one subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or credential cannot be created.
    pub fn new(config: &SubscriptionConfig, endpoints: &AzureEndpoints) -> Result<Self> {
        Self::with_timeout(config, endpoints, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or credential cannot be created.
    pub fn with_timeout(
        config: &SubscriptionConfig,
        endpoints: &AzureEndpoints,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("azsubsyn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AzureError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            credential: ClientSecretCredential::new(config, endpoints)?,
            endpoint: endpoints.resource_manager.clone(),
            subscription_id: config.subscription_id.clone(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the transport retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Subscription id this client is scoped to.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Builds `<endpoint>/subscriptions/<id>/<segments...>?api-version=<v>`.
    fn url(&self, segments: &[&str], api_version: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| AzsubsynError::internal("Resource manager endpoint cannot be a base URL"))?
            .pop_if_empty()
            .push("subscriptions")
            .push(&self.subscription_id)
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Sends a request with retries and returns the response body.
    async fn execute(&self, method: Method, url: &Url, body: Option<&serde_json::Value>) -> Result<String> {
        let what = format!("{method} {}", url.path());
        self.retry
            .run(&what, || self.execute_once(method.clone(), url, body))
            .await
    }

    /// Sends a single authenticated request.
    async fn execute_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let token = self.credential.token(&self.http, &self.retry).await?;
        let request_id = Uuid::new_v4();
        trace!(%request_id, "{method} {url}");

        let mut request = self
            .http
            .request(method, url.clone())
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID, request_id.to_string())
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AzureError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let retry_after = if retry_after == 0 { 60 } else { retry_after };

            return Err(AzureError::RateLimited {
                retry_after_secs: retry_after,
            }
            .into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| AzureError::network(format!("Failed to read response: {e}")))?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AzureError::Unauthorized {
                side: self.credential.side(),
                status: status.as_u16(),
                message: ArmErrorResponse::message_from(&text),
            }
            .into());
        }

        if !status.is_success() {
            debug!(%request_id, "Request failed with {status}");
            return Err(AzureError::api_error(
                status.as_u16(),
                ArmErrorResponse::message_from(&text),
            )
            .into());
        }

        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let text = self.execute(Method::GET, url, None).await?;
        serde_json::from_str(&text).map_err(|e| {
            AzureError::invalid_response(format!("Failed to parse response from {}: {e}", url.path()))
                .into()
        })
    }

    /// Follows `nextLink` until every page has been read.
    async fn list_all<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0_u32;

        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(&url).await?;
            pages += 1;
            items.extend(page.value);

            next = match page.next_link.filter(|link| !link.is_empty()) {
                Some(link) => Some(Url::parse(&link).map_err(|e| {
                    AzureError::invalid_response(format!("Invalid nextLink {link:?}: {e}"))
                })?),
                None => None,
            };
        }

        debug!("Read {} items in {pages} pages", items.len());
        Ok(items)
    }
}

#[async_trait]
impl SubscriptionApi for ArmClient {
    fn side(&self) -> Side {
        self.credential.side()
    }

    async fn get_subscription(&self) -> Result<SubscriptionInfo> {
        let url = self.url(&[], SUBSCRIPTIONS_API_VERSION)?;
        let sub: SubscriptionResource = self.get_json(&url).await?;
        let display_name = sub.display_name.ok_or_else(|| {
            AzureError::invalid_response(format!(
                "{} subscription {} returned no display name",
                self.side(),
                self.subscription_id
            ))
        })?;

        Ok(SubscriptionInfo {
            subscription_id: sub.subscription_id.unwrap_or_else(|| self.subscription_id.clone()),
            display_name,
            tenant_id: sub.tenant_id,
            state: sub.state,
        })
    }

    async fn list_resource_providers(&self) -> Result<Vec<Registration>> {
        info!("Listing resource providers in {} subscription", self.side());
        let url = self.url(&["providers"], PROVIDERS_API_VERSION)?;
        let providers: Vec<ProviderResource> = self.list_all(url).await?;

        providers
            .into_iter()
            .map(|p| -> Result<Registration> {
                trace!(id = ?p.id, policy = ?p.registration_policy, "provider");
                let namespace = p.namespace.filter(|ns| !ns.is_empty()).ok_or_else(|| {
                    AzureError::invalid_response(format!("Resource provider without namespace: {:?}", p.id))
                })?;
                Ok(Registration::provider(
                    namespace,
                    p.registration_state.as_deref().unwrap_or_default(),
                ))
            })
            .collect()
    }

    async fn list_preview_features(&self) -> Result<Vec<Registration>> {
        info!("Listing preview features in {} subscription", self.side());
        let url = self.url(
            &["providers", "Microsoft.Features", "features"],
            FEATURES_API_VERSION,
        )?;
        let features: Vec<FeatureResource> = self.list_all(url).await?;

        features
            .into_iter()
            .map(|f| {
                trace!(id = ?f.id, "feature");
                let state = f
                    .properties
                    .and_then(|p| p.state)
                    .unwrap_or_default();
                Registration::from_feature_name(f.name.as_deref().unwrap_or_default(), state.as_str())
            })
            .collect()
    }

    async fn register_resource_provider(&self, namespace: &str) -> Result<()> {
        let url = self.url(&["providers", namespace, "register"], PROVIDERS_API_VERSION)?;
        let body = serde_json::json!({
            "thirdPartyProviderConsent": { "consentToAuthorization": true }
        });

        self.execute(Method::POST, &url, Some(&body)).await?;
        info!("Registered resource provider {namespace} in {} subscription", self.side());
        Ok(())
    }

    async fn register_preview_feature(&self, namespace: &str, key: &str) -> Result<()> {
        let url = self.url(
            &[
                "providers",
                "Microsoft.Features",
                "providers",
                namespace,
                "features",
                key,
                "register",
            ],
            FEATURES_API_VERSION,
        )?;

        self.execute(Method::POST, &url, None).await?;
        info!("Registered preview feature {namespace}/{key} in {} subscription", self.side());
        Ok(())
    }
}
