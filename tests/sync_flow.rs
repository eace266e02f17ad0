//! Plan and apply flow against mocked subscriptions.

use async_trait::async_trait;
use azsubsyn::azure::{SubscriptionApi, SubscriptionInfo, check_access};
use azsubsyn::config::Side;
use azsubsyn::error::{AzsubsynError, AzureError, Result};
use azsubsyn::planner::{Applier, Plan, PlanEntry, PlanHeader, PlanReason, Planner};
use azsubsyn::registration::Registration;
use mockall::{Sequence, mock};
use tempfile::TempDir;

mock! {
    pub Subscription {}

    #[async_trait]
    impl SubscriptionApi for Subscription {
        fn side(&self) -> Side;
        async fn get_subscription(&self) -> Result<SubscriptionInfo>;
        async fn list_resource_providers(&self) -> Result<Vec<Registration>>;
        async fn list_preview_features(&self) -> Result<Vec<Registration>>;
        async fn register_resource_provider(&self, namespace: &str) -> Result<()>;
        async fn register_preview_feature(&self, namespace: &str, key: &str) -> Result<()>;
    }
}

fn subscription(side: Side) -> MockSubscription {
    let mut mock = MockSubscription::new();
    mock.expect_side().return_const(side);
    mock
}

fn info(id: &str, name: &str) -> SubscriptionInfo {
    SubscriptionInfo {
        subscription_id: id.to_string(),
        display_name: name.to_string(),
        tenant_id: Some(String::from("tenant")),
        state: Some(String::from("Enabled")),
    }
}

#[tokio::test]
async fn test_plan_save_load_apply() {
    let mut source = subscription(Side::Source);
    source.expect_list_resource_providers().times(1).returning(|| {
        Ok(vec![
            Registration::provider("Microsoft.Compute", "Registered"),
            Registration::provider("Microsoft.Cache", "NotRegistered"),
            Registration::provider("Microsoft.Network", "Registered"),
        ])
    });
    source.expect_list_preview_features().times(1).returning(|| {
        Ok(vec![
            Registration::feature("Microsoft.DevAI", "Dev", "Registered"),
            Registration::feature("Microsoft.DevAI", "Old", "Unregistered"),
        ])
    });

    let mut target = subscription(Side::Target);
    target.expect_list_resource_providers().times(1).returning(|| {
        Ok(vec![
            Registration::provider("Microsoft.Compute", "NotRegistered"),
            Registration::provider("Microsoft.Network", "Registered"),
        ])
    });
    target
        .expect_list_preview_features()
        .times(1)
        .returning(|| Ok(Vec::new()));

    let plan = Planner::new(&source, &target).plan().await.unwrap();
    assert_eq!(
        plan,
        Plan::new(
            vec![PlanEntry::provider("Microsoft.Compute", PlanReason::NotRegisteredInTarget)],
            vec![PlanEntry::feature("Microsoft.DevAI", "Dev", PlanReason::NotFoundInTarget)],
        )
    );

    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("azsubsyn-plan.jsonc");
    plan.save(&path, &PlanHeader::new("src", "dst")).await.unwrap();
    let loaded = Plan::load(&path).await.unwrap();
    assert_eq!(loaded, plan);

    let mut seq = Sequence::new();
    target
        .expect_register_resource_provider()
        .withf(|namespace: &str| namespace == "Microsoft.Compute")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    target
        .expect_register_preview_feature()
        .withf(|namespace: &str, key: &str| namespace == "Microsoft.DevAI" && key == "Dev")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));

    let report = Applier::new(&target).apply(&loaded).await;
    assert!(report.all_successful());
    assert_eq!(report.succeeded.len(), 2);
}

#[tokio::test]
async fn test_apply_is_best_effort() {
    let mut target = subscription(Side::Target);
    target
        .expect_register_resource_provider()
        .withf(|namespace: &str| namespace == "Microsoft.Denied")
        .times(1)
        .returning(|_| Err(AzureError::api_error(403, "AuthorizationFailed").into()));
    target
        .expect_register_resource_provider()
        .withf(|namespace: &str| namespace == "Microsoft.Allowed")
        .times(1)
        .returning(|_| Ok(()));
    target
        .expect_register_preview_feature()
        .times(1)
        .returning(|_, _| Ok(()));

    let plan = Plan::new(
        vec![
            PlanEntry::provider("Microsoft.Denied", PlanReason::NotFoundInTarget),
            PlanEntry::provider("Microsoft.Allowed", PlanReason::NotFoundInTarget),
        ],
        vec![PlanEntry::feature("Microsoft.DevAI", "Dev", PlanReason::NotFoundInTarget)],
    );

    let report = Applier::new(&target).apply(&plan).await;

    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].entry.namespace, "Microsoft.Denied");
}

#[tokio::test]
async fn test_planning_stops_at_first_listing_failure() {
    let mut source = subscription(Side::Source);
    source
        .expect_list_resource_providers()
        .times(1)
        .returning(|| Err(AzureError::network("connection reset").into()));
    source.expect_list_preview_features().never();

    let mut target = subscription(Side::Target);
    target.expect_list_resource_providers().never();
    target.expect_list_preview_features().never();

    let err = Planner::new(&source, &target).plan().await.unwrap_err();

    assert!(matches!(err, AzsubsynError::Context { .. }));
    assert!(err.to_string().starts_with("failed to list resource providers in source subscription"));
}

#[tokio::test]
async fn test_check_access_reads_both_sides() {
    let mut source = subscription(Side::Source);
    source
        .expect_get_subscription()
        .times(1)
        .returning(|| Ok(info("src-id", "Source Sub")));
    let mut target = subscription(Side::Target);
    target
        .expect_get_subscription()
        .times(1)
        .returning(|| Ok(info("dst-id", "Target Sub")));

    let apis: [&dyn SubscriptionApi; 2] = [&source, &target];
    let found = check_access(&apis).await.unwrap();

    assert_eq!(found, vec![info("src-id", "Source Sub"), info("dst-id", "Target Sub")]);
}

#[tokio::test]
async fn test_check_access_stops_at_failing_side() {
    let mut source = subscription(Side::Source);
    source
        .expect_get_subscription()
        .times(1)
        .returning(|| Err(AzureError::invalid_response("no display name").into()));
    let mut target = subscription(Side::Target);
    target.expect_get_subscription().never();

    let apis: [&dyn SubscriptionApi; 2] = [&source, &target];
    let err = check_access(&apis).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to read source subscription"));
}
