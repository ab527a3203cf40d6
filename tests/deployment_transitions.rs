// ABOUTME: Tests for deployment state transitions.
// ABOUTME: Verifies transition signatures and resource naming against the in-memory hosting fake.

mod support;

use chrono::{TimeZone, Utc};
use sagedeploy::cloud::{EndpointOps, EndpointStatus, HostingError, LogOps, ProvisioningOps};
use sagedeploy::config::{MonitorConfig, RollbackConfig};
use sagedeploy::deploy::{
    DeployError, DeployPlan, DeployStrategy, Deployment, DeploymentMonitor, Live, MonitorFailure,
    MonitorResult, NullSink, Requested, RequestFailure, RollbackController, RollbackError,
    RollbackReport, Shortfall, TransitionResult, Validated,
};
use sagedeploy::types::{InstanceType, ModelPackageArn, RoleArn};
use std::time::Duration;
use support::{FakeHosting, FakeLogs, PACKAGE_ARN, Probe, ROLE_ARN, endpoint};

// =============================================================================
// Transition Type Signature Tests
// =============================================================================

/// Test: Verifies the type signatures of all transition methods compile correctly.
#[test]
fn transition_type_signatures_compile() {
    // This function is never called, but it must compile.
    #[allow(dead_code)]
    async fn check_signatures<H, L>(
        hosting: &H,
        monitor: &DeploymentMonitor<'_, H, L>,
        controller: &RollbackController<'_, H>,
        plan: DeployPlan,
    ) where
        H: EndpointOps + ProvisioningOps,
        L: LogOps,
    {
        // Validated -> Requested
        let d1: Deployment<Validated> = Deployment::new(plan);
        let d2: Result<Deployment<Requested>, RequestFailure> = d1.request(hosting, Utc::now()).await;

        // Requested -> Live, or back to Requested with why it fell short
        let d3: TransitionResult<Live, Requested, MonitorFailure> =
            d2.unwrap().monitor(monitor, &NullSink).await;

        match d3 {
            Ok(live) => {
                let _ = live.retire_previous(hosting, &NullSink).await;
                let _result: MonitorResult = live.finish();
            }
            Err((requested, _failure)) => {
                let _: Result<RollbackReport, RollbackError> = requested.rollback(controller).await;
            }
        }
    }
}

// =============================================================================
// Behaviour
// =============================================================================

fn plan(name: &str, update: bool) -> DeployPlan {
    DeployPlan {
        package: ModelPackageArn::parse(PACKAGE_ARN).unwrap(),
        instance_type: InstanceType::default(),
        endpoint: endpoint(name),
        execution_role: RoleArn::parse(ROLE_ARN).unwrap(),
        update,
    }
}

fn monitor_config() -> MonitorConfig {
    MonitorConfig {
        timeout: Duration::from_secs(600),
        poll_interval: Duration::from_secs(30),
        ..Default::default()
    }
}

#[tokio::test]
async fn new_endpoint_resources_share_its_name() {
    let hosting = FakeHosting::new();
    let requested = Deployment::new(plan("fraud-ep", false))
        .request(&hosting, Utc::now())
        .await
        .unwrap();

    assert_eq!(requested.strategy(), &DeployStrategy::Create);
    assert_eq!(requested.config().as_str(), "fraud-ep");
    assert_eq!(requested.model().as_str(), "fraud-ep");

    let target = requested.rollback_target();
    assert_eq!(target.endpoint, Some(endpoint("fraud-ep")));
    assert!(hosting.endpoint_exists("fraud-ep"));
}

#[tokio::test]
async fn update_names_carry_a_timestamp_and_spare_the_endpoint() {
    let hosting = FakeHosting::new().with_existing("fraud-ep", "fraud-ep", "fraud-ep");
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    let requested = Deployment::new(plan("fraud-ep", true))
        .request(&hosting, now)
        .await
        .unwrap();

    assert_eq!(
        requested.strategy(),
        &DeployStrategy::Update {
            previous_config: Some("fraud-ep".to_string())
        }
    );
    assert_eq!(requested.config().as_str(), "fraud-ep-20250314-092653");
    assert_eq!(requested.model().as_str(), "fraud-ep-20250314-092653");
    let target = requested.rollback_target();
    assert_eq!(target.endpoint, None);
    let restore = target.restore.expect("update targets restore the endpoint");
    assert_eq!(restore.endpoint.as_str(), "fraud-ep");
    assert_eq!(restore.previous.map(|c| c.to_string()).as_deref(), Some("fraud-ep"));
}

#[tokio::test]
async fn existing_endpoint_without_update_creates_nothing() {
    let hosting = FakeHosting::new().with_existing("fraud-ep", "fraud-ep", "fraud-ep");
    let failure = Deployment::new(plan("fraud-ep", false))
        .request(&hosting, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(failure.error, DeployError::EndpointExists(_)));
    assert!(failure.created.is_empty());
    assert_eq!(hosting.count(|c| c.is_creation()), 0);
}

#[tokio::test]
async fn failed_config_reports_the_model_it_created() {
    let hosting = FakeHosting::new()
        .failing_config_creation(HostingError::Rejected("bad instance type".to_string()));
    let failure = Deployment::new(plan("fraud-ep", false))
        .request(&hosting, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(failure.error, DeployError::CreationFailed { .. }));
    assert_eq!(
        failure.created.model.as_ref().map(|m| m.as_str()),
        Some("fraud-ep")
    );
    assert!(failure.created.config.is_none());
    assert!(failure.created.endpoint.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_monitor_hands_back_a_rollbackable_deployment() {
    let hosting = FakeHosting::new().with_script([
        Probe::Status(EndpointStatus::Creating),
        Probe::Failed("model container exited"),
    ]);
    let logs = FakeLogs::new();
    let monitor = DeploymentMonitor::new(&hosting, &logs, monitor_config());

    let requested = Deployment::new(plan("fraud-ep", false))
        .request(&hosting, Utc::now())
        .await
        .unwrap();
    let (requested, failure) = requested.monitor(&monitor, &NullSink).await.unwrap_err();
    assert!(matches!(failure.shortfall, Shortfall::Failed { .. }));
    assert!(!failure.result.succeeded());

    let controller = RollbackController::new(&hosting, RollbackConfig::default());
    let report = requested.rollback(&controller).await.unwrap();
    assert_eq!(report.deleted().count(), 3);
    assert!(!hosting.endpoint_exists("fraud-ep"));
    assert!(!hosting.config_exists("fraud-ep"));
    assert!(!hosting.model_exists("fraud-ep"));
}

#[tokio::test(start_paused = true)]
async fn live_update_retires_the_previous_generation() {
    let hosting = FakeHosting::new()
        .with_existing("fraud-ep", "fraud-ep-old", "fraud-model-old")
        .with_script([
            Probe::Status(EndpointStatus::Updating),
            Probe::Status(EndpointStatus::InService),
        ]);
    let logs = FakeLogs::new();
    let monitor = DeploymentMonitor::new(&hosting, &logs, monitor_config());

    let live = Deployment::new(plan("fraud-ep", true))
        .request(&hosting, Utc::now())
        .await
        .unwrap()
        .monitor(&monitor, &NullSink)
        .await
        .unwrap();

    let retired = live.retire_previous(&hosting, &NullSink).await;
    assert_eq!(retired.len(), 2);
    assert!(!hosting.config_exists("fraud-ep-old"));
    assert!(!hosting.model_exists("fraud-model-old"));
    assert!(hosting.config_exists(live.config().as_str()));
    assert!(live.finish().succeeded());
}
