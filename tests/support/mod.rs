// ABOUTME: Test support utilities.
// ABOUTME: In-memory SageMaker and CloudWatch Logs fakes plus a recording progress sink.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sagedeploy::cloud::{
    ApprovalStatus, ConfigVariant, EndpointConfigDescription, EndpointConfigSpec,
    EndpointDescription, EndpointOps, EndpointStatus, HostingError, LogError, LogEvent, LogOps,
    LogPage, LogQuery, ModelPackageSummary, ModelSpec, ProvisioningOps, RegistryOps,
    VARIANT_NAME, VariantSummary,
};
use sagedeploy::deploy::{LogRecord, ProgressSink};
use sagedeploy::types::{EndpointConfigName, EndpointName, ModelName};
use std::collections::{HashMap, VecDeque};
use std::sync::Once;
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("sagedeploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const PACKAGE_ARN: &str =
    "arn:aws:sagemaker:ca-central-1:123456789012:model-package/fraud-detector/3";
pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/SageMakerExecution";

pub fn endpoint(name: &str) -> EndpointName {
    EndpointName::new(name).unwrap()
}

// =============================================================================
// Hosting fake
// =============================================================================

/// One scripted answer to `describe_endpoint`.
#[derive(Debug, Clone)]
pub enum Probe {
    Status(EndpointStatus),
    /// Terminal failure with a reason.
    Failed(&'static str),
    /// Back InService on the previous configuration after an update.
    Reverted(&'static str),
    Error(HostingError),
}

/// Every call the fake received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DescribeEndpoint(String),
    CreateEndpoint(String, String),
    UpdateEndpoint(String, String),
    DeleteEndpoint(String),
    CreateModel(String),
    DeleteModel(String),
    CreateEndpointConfig(String, String),
    DescribeEndpointConfig(String),
    DeleteEndpointConfig(String),
    ListModelPackages(String),
}

impl Call {
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            Call::CreateEndpoint(..)
                | Call::UpdateEndpoint(..)
                | Call::CreateModel(_)
                | Call::CreateEndpointConfig(..)
        )
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Call::DeleteEndpoint(_) | Call::DeleteModel(_) | Call::DeleteEndpointConfig(_)
        )
    }
}

#[derive(Debug, Clone)]
struct FakeEndpoint {
    config: String,
    /// Scripted answers start once a create or update has been requested.
    armed: bool,
    deleted: bool,
}

#[derive(Default)]
struct HostingState {
    calls: Vec<Call>,
    endpoints: HashMap<String, FakeEndpoint>,
    /// config name -> model name
    configs: HashMap<String, String>,
    models: Vec<String>,
    script: VecDeque<Probe>,
    /// Replaces the script when an already updated endpoint is updated again.
    restore_script: Option<VecDeque<Probe>>,
    create_config_error: Option<HostingError>,
    create_endpoint_error: Option<HostingError>,
    delete_errors: VecDeque<HostingError>,
    /// Endpoint deletion is accepted but never takes effect.
    stuck_delete: bool,
    packages: Vec<ModelPackageSummary>,
}

/// In-memory SageMaker hosting service.
///
/// `describe_endpoint` replays the script one answer per call; the last
/// answer repeats. With an empty script an endpoint reports InService.
#[derive(Default)]
pub struct FakeHosting {
    state: Mutex<HostingState>,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, probes: impl IntoIterator<Item = Probe>) -> Self {
        self.state.lock().script = probes.into_iter().collect();
        self
    }

    /// Answers once rollback switches an updated endpoint back.
    pub fn with_restore_script(self, probes: impl IntoIterator<Item = Probe>) -> Self {
        self.state.lock().restore_script = Some(probes.into_iter().collect());
        self
    }

    /// Configuration the endpoint is bound to, if it exists.
    pub fn bound_config(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .endpoints
            .get(name)
            .filter(|e| !e.deleted)
            .map(|e| e.config.clone())
    }

    /// An endpoint that already exists, InService on `config` backed by `model`.
    pub fn with_existing(self, name: &str, config: &str, model: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.endpoints.insert(
                name.to_string(),
                FakeEndpoint {
                    config: config.to_string(),
                    armed: false,
                    deleted: false,
                },
            );
            state.configs.insert(config.to_string(), model.to_string());
            state.models.push(model.to_string());
        }
        self
    }

    /// An endpoint that is mid-deployment: scripted answers apply at once.
    pub fn with_deploying(self, name: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.endpoints.insert(
                name.to_string(),
                FakeEndpoint {
                    config: name.to_string(),
                    armed: true,
                    deleted: false,
                },
            );
            state.configs.insert(name.to_string(), name.to_string());
            state.models.push(name.to_string());
        }
        self
    }

    pub fn failing_config_creation(self, error: HostingError) -> Self {
        self.state.lock().create_config_error = Some(error);
        self
    }

    pub fn failing_endpoint_creation(self, error: HostingError) -> Self {
        self.state.lock().create_endpoint_error = Some(error);
        self
    }

    /// Errors returned, in order, by the next delete calls.
    pub fn failing_deletes(self, errors: impl IntoIterator<Item = HostingError>) -> Self {
        self.state.lock().delete_errors = errors.into_iter().collect();
        self
    }

    pub fn with_stuck_delete(self) -> Self {
        self.state.lock().stuck_delete = true;
        self
    }

    pub fn with_packages(self, packages: Vec<ModelPackageSummary>) -> Self {
        self.state.lock().packages = packages;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn describes(&self) -> usize {
        self.count(|c| matches!(c, Call::DescribeEndpoint(_)))
    }

    pub fn endpoint_exists(&self, name: &str) -> bool {
        self.state
            .lock()
            .endpoints
            .get(name)
            .is_some_and(|e| !e.deleted)
    }

    pub fn config_exists(&self, name: &str) -> bool {
        self.state.lock().configs.contains_key(name)
    }

    pub fn model_exists(&self, name: &str) -> bool {
        self.state.lock().models.iter().any(|m| m == name)
    }

    fn next_probe(state: &mut HostingState) -> Option<Probe> {
        if state.script.len() > 1 {
            state.script.pop_front()
        } else {
            state.script.front().cloned()
        }
    }

    fn take_delete_error(state: &mut HostingState) -> Option<HostingError> {
        state.delete_errors.pop_front()
    }
}

fn description(name: &str, status: EndpointStatus, config: &str) -> EndpointDescription {
    EndpointDescription {
        name: name.to_string(),
        status,
        config_name: Some(config.to_string()),
        failure_reason: None,
        created_at: Some(Utc::now()),
        last_modified_at: Some(Utc::now()),
        variants: vec![VariantSummary {
            name: VARIANT_NAME.to_string(),
            current_instance_count: Some(1),
            desired_instance_count: Some(1),
        }],
    }
}

#[async_trait]
impl EndpointOps for FakeHosting {
    async fn describe_endpoint(
        &self,
        name: &EndpointName,
    ) -> Result<EndpointDescription, HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DescribeEndpoint(name.to_string()));

        let Some(endpoint) = state.endpoints.get(name.as_str()).cloned() else {
            return Err(HostingError::NotFound(name.to_string()));
        };
        if endpoint.deleted {
            return Err(HostingError::NotFound(name.to_string()));
        }
        if !endpoint.armed {
            return Ok(description(name.as_str(), EndpointStatus::InService, &endpoint.config));
        }

        match Self::next_probe(&mut state) {
            None => Ok(description(name.as_str(), EndpointStatus::InService, &endpoint.config)),
            Some(Probe::Status(status)) => Ok(description(name.as_str(), status, &endpoint.config)),
            Some(Probe::Failed(reason)) => {
                let mut d = description(name.as_str(), EndpointStatus::Failed, &endpoint.config);
                d.failure_reason = Some(reason.to_string());
                Ok(d)
            }
            Some(Probe::Reverted(previous)) => {
                let mut d = description(name.as_str(), EndpointStatus::InService, previous);
                d.failure_reason = Some("update rolled back".to_string());
                Ok(d)
            }
            Some(Probe::Error(e)) => Err(e),
        }
    }

    async fn create_endpoint(
        &self,
        name: &EndpointName,
        config: &EndpointConfigName,
    ) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::CreateEndpoint(name.to_string(), config.to_string()));
        if let Some(e) = state.create_endpoint_error.clone() {
            return Err(e);
        }
        if state.endpoints.get(name.as_str()).is_some_and(|e| !e.deleted) {
            return Err(HostingError::AlreadyExists(name.to_string()));
        }
        state.endpoints.insert(
            name.to_string(),
            FakeEndpoint {
                config: config.to_string(),
                armed: true,
                deleted: false,
            },
        );
        Ok(())
    }

    async fn update_endpoint(
        &self,
        name: &EndpointName,
        config: &EndpointConfigName,
    ) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::UpdateEndpoint(name.to_string(), config.to_string()));
        let switching_back = match state.endpoints.get_mut(name.as_str()) {
            Some(endpoint) if !endpoint.deleted => {
                let was_armed = endpoint.armed;
                endpoint.config = config.to_string();
                endpoint.armed = true;
                was_armed
            }
            _ => return Err(HostingError::NotFound(name.to_string())),
        };
        if switching_back {
            if let Some(script) = state.restore_script.take() {
                state.script = script;
            }
        }
        Ok(())
    }

    async fn delete_endpoint(&self, name: &EndpointName) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteEndpoint(name.to_string()));
        if let Some(e) = Self::take_delete_error(&mut state) {
            return Err(e);
        }
        let stuck = state.stuck_delete;
        match state.endpoints.get_mut(name.as_str()) {
            Some(endpoint) if !endpoint.deleted => {
                if stuck {
                    // Deletion accepted, but the endpoint keeps answering InService.
                    endpoint.armed = false;
                } else {
                    endpoint.deleted = true;
                }
                Ok(())
            }
            _ => Err(HostingError::NotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl ProvisioningOps for FakeHosting {
    async fn create_model(&self, spec: &ModelSpec) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateModel(spec.name.to_string()));
        if state.models.iter().any(|m| m == spec.name.as_str()) {
            return Err(HostingError::AlreadyExists(spec.name.to_string()));
        }
        state.models.push(spec.name.to_string());
        Ok(())
    }

    async fn delete_model(&self, name: &ModelName) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteModel(name.to_string()));
        if let Some(e) = Self::take_delete_error(&mut state) {
            return Err(e);
        }
        let before = state.models.len();
        state.models.retain(|m| m != name.as_str());
        if state.models.len() == before {
            return Err(HostingError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn create_endpoint_config(&self, spec: &EndpointConfigSpec) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateEndpointConfig(
            spec.name.to_string(),
            spec.model.to_string(),
        ));
        if let Some(e) = state.create_config_error.clone() {
            return Err(e);
        }
        if state.configs.contains_key(spec.name.as_str()) {
            return Err(HostingError::AlreadyExists(spec.name.to_string()));
        }
        state
            .configs
            .insert(spec.name.to_string(), spec.model.to_string());
        Ok(())
    }

    async fn describe_endpoint_config(
        &self,
        name: &EndpointConfigName,
    ) -> Result<EndpointConfigDescription, HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DescribeEndpointConfig(name.to_string()));
        let model = state
            .configs
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| HostingError::NotFound(name.to_string()))?;
        Ok(EndpointConfigDescription {
            name: name.to_string(),
            variants: vec![ConfigVariant {
                name: VARIANT_NAME.to_string(),
                model_name: Some(model),
                instance_type: Some("ml.c5.2xlarge".to_string()),
                initial_instance_count: Some(1),
            }],
        })
    }

    async fn delete_endpoint_config(
        &self,
        name: &EndpointConfigName,
    ) -> Result<(), HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteEndpointConfig(name.to_string()));
        if let Some(e) = Self::take_delete_error(&mut state) {
            return Err(e);
        }
        state
            .configs
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| HostingError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl RegistryOps for FakeHosting {
    async fn list_model_package_groups(&self) -> Result<Vec<String>, HostingError> {
        let state = self.state.lock();
        let mut groups: Vec<String> = state
            .packages
            .iter()
            .filter_map(|p| p.group.clone())
            .collect();
        groups.sort();
        groups.dedup();
        Ok(groups)
    }

    async fn list_model_packages(
        &self,
        group: &str,
        approval: Option<&ApprovalStatus>,
    ) -> Result<Vec<ModelPackageSummary>, HostingError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListModelPackages(group.to_string()));
        Ok(state
            .packages
            .iter()
            .filter(|p| p.group.as_deref() == Some(group))
            .filter(|p| approval.is_none_or(|a| *a == p.approval))
            .cloned()
            .collect())
    }
}

pub fn package(group: &str, version: i32, approval: ApprovalStatus, age: Duration) -> ModelPackageSummary {
    ModelPackageSummary {
        arn: format!("arn:aws:sagemaker:ca-central-1:123456789012:model-package/{group}/{version}"),
        group: Some(group.to_string()),
        version: Some(version),
        approval,
        created_at: Some(Utc::now() - chrono::Duration::from_std(age).unwrap()),
        description: None,
    }
}

// =============================================================================
// Log fake
// =============================================================================

#[derive(Default)]
struct LogState {
    group_visible_after: usize,
    existence_checks: usize,
    events: Vec<LogEvent>,
    fetches: usize,
    fetch_errors: VecDeque<LogError>,
    retention: Option<i32>,
    /// Earlier events repeated at the head of every later page.
    resend: usize,
}

/// In-memory log group. Fetches honour the inclusive start time and page
/// limit, so successive fetches overlap on the boundary timestamp.
#[derive(Default)]
pub struct FakeLogs {
    state: Mutex<LogState>,
}

impl FakeLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group only appears after `checks` existence checks.
    pub fn visible_after(self, checks: usize) -> Self {
        self.state.lock().group_visible_after = checks;
        self
    }

    pub fn with_events(self, events: Vec<LogEvent>) -> Self {
        self.state.lock().events = events;
        self
    }

    pub fn failing_fetches(self, errors: impl IntoIterator<Item = LogError>) -> Self {
        self.state.lock().fetch_errors = errors.into_iter().collect();
        self
    }

    /// Every page after the first also carries the `count` events before it,
    /// the way an eventually consistent backend re-sends across tokens.
    pub fn resending(self, count: usize) -> Self {
        self.state.lock().resend = count;
        self
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().fetches
    }

    pub fn retention(&self) -> Option<i32> {
        self.state.lock().retention
    }
}

/// Events `offsets_ms` after now, one per offset, on a single stream.
pub fn events_from_now(stream: &str, offsets_ms: &[i64]) -> Vec<LogEvent> {
    let base = Utc::now().timestamp_millis();
    offsets_ms
        .iter()
        .enumerate()
        .map(|(i, offset)| LogEvent {
            stream: stream.to_string(),
            timestamp_ms: base + offset,
            message: format!("line {i}"),
        })
        .collect()
}

#[async_trait]
impl LogOps for FakeLogs {
    async fn log_group_exists(&self, _group: &str) -> Result<bool, LogError> {
        let mut state = self.state.lock();
        state.existence_checks += 1;
        Ok(state.existence_checks > state.group_visible_after)
    }

    async fn fetch_events(&self, query: &LogQuery) -> Result<LogPage, LogError> {
        let mut state = self.state.lock();
        state.fetches += 1;
        if let Some(e) = state.fetch_errors.pop_front() {
            return Err(e);
        }

        let mut matching: Vec<LogEvent> = state
            .events
            .iter()
            .filter(|e| e.timestamp_ms >= query.start_time_ms)
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.timestamp_ms);

        let offset: usize = query
            .next_token
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let limit = query.limit.max(1) as usize;
        let from = offset.saturating_sub(state.resend);
        let to = (offset + limit).min(matching.len());
        let page: Vec<LogEvent> = matching.get(from..to).unwrap_or_default().to_vec();
        let next_token = (offset + limit < matching.len()).then(|| (offset + limit).to_string());

        Ok(LogPage {
            events: page,
            next_token,
        })
    }

    async fn set_retention(&self, _group: &str, days: i32) -> Result<(), LogError> {
        self.state.lock().retention = Some(days);
        Ok(())
    }
}

// =============================================================================
// Progress sink
// =============================================================================

/// Remembers everything the deployment reported.
#[derive(Default)]
pub struct RecordingSink {
    pub steps: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<String>>,
    pub records: Mutex<Vec<LogRecord>>,
}

impl ProgressSink for RecordingSink {
    fn step(&self, message: &str) {
        self.steps.lock().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }

    fn status_changed(&self, _endpoint: &EndpointName, status: &EndpointStatus, _elapsed: Duration) {
        self.statuses.lock().push(status.to_string());
    }

    fn log_record(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}
