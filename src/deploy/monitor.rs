// ABOUTME: Deployment monitor driving status polling and log tailing concurrently.
// ABOUTME: Applies the overall deadline and produces a single terminal verdict.

use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cloud::{EndpointOps, EndpointStatus, LogError, LogOps};
use crate::config::MonitorConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::types::{EndpointConfigName, EndpointName};

use super::endpoint_state::EndpointState;
use super::prober::{ProbeError, StatusProber};
use super::sink::ProgressSink;
use super::tailer::{Discovery, FetchCadence, LogCursor, LogTailer, TailSettings};

/// Consecutive non-transient probe failures tolerated before giving up.
const MAX_FATAL_PROBES: u32 = 3;

/// What the monitor watches.
#[derive(Debug, Clone)]
pub struct MonitorTarget {
    pub endpoint: EndpointName,
    /// When set, InService only counts once the endpoint runs this configuration.
    pub expected_config: Option<EndpointConfigName>,
}

impl MonitorTarget {
    pub fn endpoint(endpoint: EndpointName) -> Self {
        Self {
            endpoint,
            expected_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MonitorOutcome {
    Succeeded,
    Failed { reason: String },
    TimedOut,
}

/// Terminal verdict of one monitor run.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorResult {
    #[serde(flatten)]
    pub outcome: MonitorOutcome,
    pub state: EndpointState,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub log_group: Option<String>,
    pub log_records: usize,
}

impl MonitorResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == MonitorOutcome::Succeeded
    }

    pub fn diagnostic_messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}

/// Why a monitor run fell short. No `Succeeded` variant: a run that
/// succeeded never becomes a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortfall {
    Failed { reason: String },
    TimedOut,
}

/// A monitor run that did not end with the endpoint InService.
#[derive(Debug, Clone)]
pub struct MonitorFailure {
    pub shortfall: Shortfall,
    pub result: MonitorResult,
}

impl MonitorFailure {
    /// Split a run into success or a failure carrying its shortfall.
    pub fn check(result: MonitorResult) -> Result<MonitorResult, MonitorFailure> {
        let shortfall = match &result.outcome {
            MonitorOutcome::Succeeded => return Ok(result),
            MonitorOutcome::Failed { reason } => Shortfall::Failed {
                reason: reason.clone(),
            },
            MonitorOutcome::TimedOut => Shortfall::TimedOut,
        };
        Err(MonitorFailure { shortfall, result })
    }
}

/// Polling side: owns the endpoint state.
struct PollState {
    endpoint: EndpointState,
    diag: Diagnostics,
    saw_transition: bool,
    fatal_streak: u32,
}

/// Tailing side: owns the log bookkeeping.
struct TailState {
    diag: Diagnostics,
    group: Option<String>,
    records: usize,
}

enum Verdict {
    Succeeded,
    Failed(String),
}

pub struct DeploymentMonitor<'a, E: EndpointOps + ?Sized, L: LogOps + ?Sized> {
    prober: StatusProber<'a, E>,
    tailer: LogTailer<'a, L>,
    config: MonitorConfig,
}

impl<'a, E: EndpointOps + ?Sized, L: LogOps + ?Sized> DeploymentMonitor<'a, E, L> {
    pub fn new(endpoints: &'a E, logs: &'a L, config: MonitorConfig) -> Self {
        Self {
            prober: StatusProber::new(endpoints),
            tailer: LogTailer::new(logs, TailSettings::from(&config)),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Watch the endpoint until it is InService, fails, or the timeout elapses.
    ///
    /// The first status probe happens one poll interval after the call.
    /// Log tailing runs alongside and never decides the verdict. Nothing
    /// started here outlives the call.
    pub async fn monitor(&self, target: &MonitorTarget, sink: &dyn ProgressSink) -> MonitorResult {
        let origin = Instant::now();
        let deadline = origin + self.config.timeout;
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let mut poll = PollState {
            endpoint: EndpointState::new(target.endpoint.clone(), target.expected_config.clone()),
            diag: Diagnostics::starting_at(origin),
            saw_transition: false,
            fatal_streak: 0,
        };
        let mut tail = TailState {
            diag: Diagnostics::starting_at(origin),
            group: None,
            records: 0,
        };

        let verdict = tokio::time::timeout_at(deadline, async {
            let (verdict, ()) = tokio::join!(
                self.poll_loop(target, &mut poll, &cancel_tx, origin, sink),
                self.tail_loop(&target.endpoint, &mut tail, cancel_rx, sink),
            );
            verdict
        })
        .await;

        let outcome = match verdict {
            Ok(Verdict::Succeeded) => MonitorOutcome::Succeeded,
            Ok(Verdict::Failed(reason)) => MonitorOutcome::Failed { reason },
            Err(_elapsed) => {
                poll.diag.warn(format!(
                    "no terminal status for {} within {}",
                    target.endpoint,
                    crate::output::format_duration(self.config.timeout.as_secs_f64())
                ));
                MonitorOutcome::TimedOut
            }
        };

        let mut diag = poll.diag;
        diag.merge(tail.diag);

        MonitorResult {
            outcome,
            state: poll.endpoint,
            diagnostics: diag.into_entries(),
            elapsed: origin.elapsed(),
            log_group: tail.group,
            log_records: tail.records,
        }
    }

    async fn poll_loop(
        &self,
        target: &MonitorTarget,
        poll: &mut PollState,
        cancel: &watch::Sender<bool>,
        origin: Instant,
        sink: &dyn ProgressSink,
    ) -> Verdict {
        let interval = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(origin + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let verdict = loop {
            ticker.tick().await;
            if let Some(verdict) = self.poll_once(target, poll, origin, sink).await {
                break verdict;
            }
        };

        let _ = cancel.send(true);
        verdict
    }

    async fn poll_once(
        &self,
        target: &MonitorTarget,
        poll: &mut PollState,
        origin: Instant,
        sink: &dyn ProgressSink,
    ) -> Option<Verdict> {
        let endpoint = &target.endpoint;
        let description = match self.prober.probe(endpoint).await {
            Ok(description) => description,
            Err(ProbeError::NotFound(_)) if poll.endpoint.has_been_seen() => {
                return Some(Verdict::Failed(format!(
                    "endpoint {endpoint} disappeared while deploying"
                )));
            }
            Err(ProbeError::NotFound(_)) => {
                poll.endpoint.record_missing(Utc::now());
                poll.diag
                    .transient(format!("endpoint {endpoint} not visible yet, retrying"));
                return None;
            }
            Err(ProbeError::Transient(msg)) => {
                poll.diag.transient(format!("status probe failed: {msg}"));
                return None;
            }
            Err(ProbeError::Fatal(msg)) => {
                poll.fatal_streak += 1;
                poll.diag.warn(format!("status probe failed: {msg}"));
                if poll.fatal_streak >= MAX_FATAL_PROBES {
                    return Some(Verdict::Failed(format!(
                        "status probes failed {MAX_FATAL_PROBES} times in a row: {msg}"
                    )));
                }
                return None;
            }
        };
        poll.fatal_streak = 0;

        if poll.endpoint.record(&description, Utc::now()) {
            let status = &description.status;
            poll.diag.info(format!("{endpoint} is {status}"));
            sink.status_changed(endpoint, status, origin.elapsed());
            if let Some(reason) = &description.failure_reason {
                sink.failure_reason(reason);
            }
        }

        let status = &description.status;
        if status.is_transitional() {
            poll.saw_transition = true;
        }

        let reason = || {
            description
                .failure_reason
                .clone()
                .unwrap_or_else(|| "no failure reason reported".to_string())
        };

        match status {
            EndpointStatus::InService if poll.endpoint.runs_desired_config() => {
                Some(Verdict::Succeeded)
            }
            // Service-side update rollback: back in service on the old configuration.
            EndpointStatus::InService if poll.saw_transition => Some(Verdict::Failed(format!(
                "update reverted by the service; endpoint still runs {}: {}",
                description.config_name.as_deref().unwrap_or("an unknown configuration"),
                reason()
            ))),
            EndpointStatus::InService => None,
            EndpointStatus::Failed
            | EndpointStatus::OutOfService
            | EndpointStatus::UpdateRollbackFailed => {
                Some(Verdict::Failed(format!("endpoint is {status}: {}", reason())))
            }
            EndpointStatus::Deleting => Some(Verdict::Failed(format!(
                "endpoint {endpoint} is being deleted"
            ))),
            _ => None,
        }
    }

    async fn tail_loop(
        &self,
        endpoint: &EndpointName,
        tail: &mut TailState,
        mut cancel: watch::Receiver<bool>,
        sink: &dyn ProgressSink,
    ) {
        let mut cursor: Option<LogCursor> = None;
        let mut cadence =
            FetchCadence::new(self.config.log_poll_interval, self.config.log_poll_max_interval);

        loop {
            let delay = match cursor.as_mut() {
                None => {
                    let Some(found) =
                        until_cancelled(&mut cancel, self.tailer.discover_stream(endpoint)).await
                    else {
                        return;
                    };
                    match found {
                        Ok(Discovery::Available(handle)) => {
                            tail.diag.info(format!("log group {} found", handle.group()));
                            sink.log_stream_found(handle.group());
                            tail.group = Some(handle.group().to_string());

                            let Some(retention) =
                                until_cancelled(&mut cancel, self.tailer.apply_retention(&handle))
                                    .await
                            else {
                                return;
                            };
                            if let Err(e) = retention {
                                tail.diag.warn(format!("could not set log retention: {e}"));
                            }

                            cursor = Some(self.tailer.open(handle));
                            Duration::ZERO
                        }
                        Ok(Discovery::NotYetAvailable) => self.config.log_discovery_interval,
                        Err(e) => {
                            tail.diag.transient(format!("log group lookup failed: {e}"));
                            self.config.log_discovery_interval
                        }
                    }
                }
                Some(open) => {
                    let Some(fetched) =
                        until_cancelled(&mut cancel, self.tailer.fetch_new(open)).await
                    else {
                        return;
                    };
                    match fetched {
                        Ok(records) => {
                            for record in &records {
                                sink.log_record(record);
                            }
                            tail.records += records.len();
                            cadence.observe(records.len())
                        }
                        Err(LogError::GroupNotFound(group)) => {
                            tail.diag
                                .transient(format!("log group {group} went away, rediscovering"));
                            cursor = None;
                            self.config.log_discovery_interval
                        }
                        Err(e) => {
                            tail.diag.transient(format!("log fetch failed: {e}"));
                            cadence.observe(0)
                        }
                    }
                }
            };

            if !delay.is_zero()
                && until_cancelled(&mut cancel, tokio::time::sleep(delay))
                    .await
                    .is_none()
            {
                return;
            }
        }
    }
}

/// Run `fut` unless the cancel signal fires first.
async fn until_cancelled<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    fut: F,
) -> Option<F::Output> {
    if *cancel.borrow() {
        return None;
    }
    tokio::select! {
        biased;
        _ = cancel.changed() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: MonitorOutcome) -> MonitorResult {
        MonitorResult {
            outcome,
            state: EndpointState::new(EndpointName::new("fraud-ep").unwrap(), None),
            diagnostics: Vec::new(),
            elapsed: Duration::from_secs(42),
            log_group: None,
            log_records: 0,
        }
    }

    #[test]
    fn check_passes_a_successful_run_through() {
        let passed = MonitorFailure::check(result(MonitorOutcome::Succeeded)).unwrap();
        assert!(passed.succeeded());
    }

    #[test]
    fn check_names_the_shortfall_of_a_failed_run() {
        let failure = MonitorFailure::check(result(MonitorOutcome::Failed {
            reason: "model failed to load".into(),
        }))
        .unwrap_err();
        assert_eq!(
            failure.shortfall,
            Shortfall::Failed {
                reason: "model failed to load".into()
            }
        );

        let failure = MonitorFailure::check(result(MonitorOutcome::TimedOut)).unwrap_err();
        assert_eq!(failure.shortfall, Shortfall::TimedOut);
        assert_eq!(failure.result.elapsed, Duration::from_secs(42));
    }
}
