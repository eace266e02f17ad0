//! ARM client tests against a local mock server.

use azsubsyn::azure::{ArmClient, RetryPolicy, SubscriptionApi};
use azsubsyn::config::{AzureEndpoints, Side, SubscriptionConfig};
use azsubsyn::error::{AuthError, AzsubsynError, AzureError};
use azsubsyn::registration::{Registration, RegistrationState};
use reqwest::Url;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "tenant-id";
const SUBSCRIPTION: &str = "sub-id";

fn config(side: Side) -> SubscriptionConfig {
    SubscriptionConfig {
        side,
        client_id: String::from("client-id"),
        client_secret: String::from("client-secret"),
        tenant_id: String::from(TENANT),
        subscription_id: String::from(SUBSCRIPTION),
    }
}

fn client(server: &MockServer, side: Side) -> ArmClient {
    let uri = Url::parse(&server.uri()).unwrap();
    let endpoints = AzureEndpoints::new(uri.clone(), uri);
    ArmClient::new(&config(side), &endpoints)
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate(3))
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "test-token"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_providers_follows_next_link() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .and(query_param("api-version", "2021-04-01"))
        .and(header("authorization", "Bearer test-token"))
        .and(header_exists("x-ms-client-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "/subscriptions/sub-id/providers/Microsoft.Compute", "namespace": "Microsoft.Compute", "registrationState": "Registered" },
                { "namespace": "Microsoft.Cache", "registrationState": "notregistered" }
            ],
            "nextLink": format!("{}/page-2?token=abc", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page-2"))
        .and(query_param("token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "namespace": "Microsoft.Storage", "registrationState": "Registering", "registrationPolicy": "RegistrationRequired" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let providers = client(&server, Side::Source)
        .list_resource_providers()
        .await
        .unwrap();

    assert_eq!(
        providers,
        vec![
            Registration::provider("Microsoft.Compute", RegistrationState::Registered),
            Registration::provider("Microsoft.Cache", RegistrationState::NotRegistered),
            Registration::provider("Microsoft.Storage", RegistrationState::Registering),
        ]
    );
}

#[tokio::test]
async fn test_list_features_splits_names() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Features/features"
        )))
        .and(query_param("api-version", "2021-07-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "name": "Microsoft.DevAI/Dev", "properties": { "state": "registered" } },
                { "name": "Microsoft.Compute/Preview", "properties": { "state": "Pending" } }
            ]
        })))
        .mount(&server)
        .await;

    let features = client(&server, Side::Source)
        .list_preview_features()
        .await
        .unwrap();

    assert_eq!(
        features,
        vec![
            Registration::feature("Microsoft.DevAI", "Dev", RegistrationState::Registered),
            Registration::feature("Microsoft.Compute", "Preview", RegistrationState::Pending),
        ]
    );
}

#[tokio::test]
async fn test_malformed_feature_name_aborts() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Features/features"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [ { "name": "NoSlashHere", "properties": { "state": "Registered" } } ]
        })))
        .mount(&server)
        .await;

    let err = client(&server, Side::Source)
        .list_preview_features()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AzsubsynError::Azure(AzureError::MalformedFeatureName { ref name }) if name == "NoSlashHere"
    ));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let providers = client(&server, Side::Target)
        .list_resource_providers()
        .await
        .unwrap();
    assert!(providers.is_empty());
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .expect(4)
        .mount(&server)
        .await;

    let err = client(&server, Side::Target)
        .list_resource_providers()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AzsubsynError::Azure(AzureError::RateLimited { retry_after_secs: 1 })
    ));
}

#[tokio::test]
async fn test_client_errors_surface_arm_message() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "SubscriptionNotFound", "message": "The subscription 'sub-id' could not be found." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, Side::Source)
        .list_resource_providers()
        .await
        .unwrap_err();

    match err {
        AzsubsynError::Azure(AzureError::ApiRequestFailed { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.starts_with("SubscriptionNotFound: "));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_forbidden_names_side() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": "AuthorizationFailed", "message": "no access" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, Side::Target)
        .list_resource_providers()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AzsubsynError::Azure(AzureError::Unauthorized { side: Side::Target, status: 403, .. })
    ));
}

#[tokio::test]
async fn test_token_rejection_names_side() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, Side::Source)
        .list_resource_providers()
        .await
        .unwrap_err();

    match err {
        AzsubsynError::Auth(AuthError::TokenRequestFailed { side, message }) => {
            assert_eq!(side, Side::Source);
            assert!(message.contains("invalid_client"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_register_provider_grants_consent() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Compute/register"
        )))
        .and(query_param("api-version", "2021-04-01"))
        .and(body_json(json!({
            "thirdPartyProviderConsent": { "consentToAuthorization": true }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "namespace": "Microsoft.Compute",
            "registrationState": "Registering"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, Side::Target)
        .register_resource_provider("Microsoft.Compute")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_register_feature() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Features/providers/Microsoft.DevAI/features/Dev/register"
        )))
        .and(query_param("api-version", "2021-07-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Microsoft.DevAI/Dev",
            "properties": { "state": "Registering" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, Side::Target)
        .register_preview_feature("Microsoft.DevAI", "Dev")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_subscription() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}")))
        .and(query_param("api-version", "2022-12-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscriptionId": SUBSCRIPTION,
            "displayName": "Dev Subscription",
            "tenantId": TENANT,
            "state": "Enabled"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server, Side::Source).get_subscription().await.unwrap();

    assert_eq!(info.display_name, "Dev Subscription");
    assert_eq!(info.subscription_id, SUBSCRIPTION);
    assert_eq!(info.tenant_id.as_deref(), Some(TENANT));
    assert_eq!(info.state.as_deref(), Some("Enabled"));
}

#[tokio::test]
async fn test_get_subscription_without_display_name() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscriptionId": SUBSCRIPTION
        })))
        .mount(&server)
        .await;

    let err = client(&server, Side::Source).get_subscription().await.unwrap_err();
    assert!(matches!(
        err,
        AzsubsynError::Azure(AzureError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_token_is_cached_across_requests() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUBSCRIPTION}/providers")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, Side::Source);
    client.list_resource_providers().await.unwrap();
    client.list_resource_providers().await.unwrap();
}
