//! Wire types for the Azure Resource Manager and token endpoints.
//!
//! Only the fields the tool reads are modelled; everything is optional on the
//! way in and normalized by the client.

use serde::{Deserialize, Serialize};

/// One page of a list operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Absolute URL of the next page, if any.
    #[serde(default)]
    pub next_link: Option<String>,
}

/// A resource provider as returned by `GET /providers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResource {
    /// Fully qualified resource id.
    #[serde(default)]
    pub id: Option<String>,
    /// Provider namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Registration state string.
    #[serde(default)]
    pub registration_state: Option<String>,
    /// Registration policy (`RegistrationRequired`, ...).
    #[serde(default)]
    pub registration_policy: Option<String>,
}

/// A preview feature as returned by `GET /providers/Microsoft.Features/features`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResource {
    /// Fully qualified resource id.
    #[serde(default)]
    pub id: Option<String>,
    /// Feature name in the form `<namespace>/<key>`.
    #[serde(default)]
    pub name: Option<String>,
    /// Feature properties.
    #[serde(default)]
    pub properties: Option<FeatureProperties>,
}

/// Properties of a preview feature.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureProperties {
    /// Registration state string.
    #[serde(default)]
    pub state: Option<String>,
}

/// A subscription as returned by `GET /subscriptions/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResource {
    /// Subscription id.
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Home tenant id.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Subscription state (`Enabled`, `Disabled`, ...).
    #[serde(default)]
    pub state: Option<String>,
}

/// Summary of a subscription, as shown by `credcheck`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    /// Subscription id.
    pub subscription_id: String,
    /// Display name.
    pub display_name: String,
    /// Home tenant id, if reported.
    pub tenant_id: Option<String>,
    /// Subscription state, if reported.
    pub state: Option<String>,
}

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Error response from the token endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenErrorResponse {
    /// OAuth error code, e.g. `invalid_client`.
    #[serde(default)]
    pub error: Option<String>,
    /// Human readable description.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Error envelope returned by Azure Resource Manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmErrorResponse {
    /// Error details.
    #[serde(default)]
    pub error: Option<ArmErrorBody>,
}

/// Error details returned by Azure Resource Manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmErrorBody {
    /// Error code, e.g. `SubscriptionNotFound`.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ArmErrorResponse {
    /// Extracts a readable message from an error body, falling back to the
    /// raw text when it is not an ARM error envelope.
    #[must_use]
    pub fn message_from(body: &str) -> String {
        let parsed = serde_json::from_str::<Self>(body).ok().and_then(|r| r.error);
        match parsed {
            Some(ArmErrorBody {
                code: Some(code),
                message: Some(message),
            }) => format!("{code}: {message}"),
            Some(ArmErrorBody {
                code: None,
                message: Some(message),
            }) => message,
            Some(ArmErrorBody {
                code: Some(code),
                message: None,
            }) => code,
            _ => body.trim().to_string(),
        }
    }
}

impl TokenErrorResponse {
    /// Extracts a readable message from a token endpoint error body.
    #[must_use]
    pub fn message_from(body: &str) -> String {
        let parsed = serde_json::from_str::<Self>(body).unwrap_or_default();
        match (parsed.error, parsed.error_description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(code), None) => code,
            (None, Some(description)) => description,
            (None, None) => body.trim().to_string(),
        }
    }
}
