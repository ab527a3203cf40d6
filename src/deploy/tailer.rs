// ABOUTME: Incremental reader for an endpoint's CloudWatch log group.
// ABOUTME: Discovers the group, fetches new events page by page, and never emits a record twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::time::Duration;

use crate::cloud::{LogError, LogOps, LogQuery, log_group_name};
use crate::config::MonitorConfig;
use crate::types::EndpointName;

/// A discovered log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    group: String,
}

impl StreamHandle {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Available(StreamHandle),
    NotYetAvailable,
}

/// One line of endpoint container output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub stream: String,
    pub timestamp_ms: i64,
    pub message: String,
}

impl LogRecord {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    fn identity(&self) -> RecordId {
        RecordId {
            stream: self.stream.clone(),
            timestamp_ms: self.timestamp_ms,
            digest: Sha256::digest(self.message.as_bytes()).into(),
        }
    }
}

/// Dedup key: (stream, timestamp, content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordId {
    stream: String,
    timestamp_ms: i64,
    digest: [u8; 32],
}

/// Read position in one log group.
#[derive(Debug, Clone)]
pub struct LogCursor {
    handle: StreamHandle,
    /// Inclusive lower bound of the next query.
    last_timestamp_ms: i64,
    seen: HashSet<RecordId>,
    /// Where a fetch stopped at the page cap; the next fetch resumes there.
    resume: Option<Resume>,
}

#[derive(Debug, Clone)]
struct Resume {
    floor: i64,
    token: String,
}

impl LogCursor {
    pub fn starting_at(handle: StreamHandle, start_ms: i64) -> Self {
        Self {
            handle,
            last_timestamp_ms: start_ms,
            seen: HashSet::new(),
            resume: None,
        }
    }

    pub fn handle(&self) -> &StreamHandle {
        &self.handle
    }

    pub fn last_timestamp_ms(&self) -> i64 {
        self.last_timestamp_ms
    }

    /// Identities still tracked for dedup.
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    /// Floor of the next query: a pending resume keeps the floor of the
    /// query its token belongs to.
    fn query_floor(&self) -> i64 {
        self.resume
            .as_ref()
            .map_or(self.last_timestamp_ms, |resume| resume.floor)
    }

    fn advance(&mut self, fresh: Vec<RecordId>, resume: Option<Resume>) {
        if let Some(newest) = fresh.iter().map(|id| id.timestamp_ms).max() {
            self.last_timestamp_ms = self.last_timestamp_ms.max(newest);
        }
        self.seen.extend(fresh);
        self.resume = resume;
        // A resumed query can still return anything at or above its own floor.
        let floor = self.query_floor();
        self.seen.retain(|id| id.timestamp_ms >= floor);
    }
}

/// Knobs for fetching.
#[derive(Debug, Clone)]
pub struct TailSettings {
    pub lookback: Duration,
    pub page_limit: i32,
    pub max_pages: usize,
    pub retention_days: Option<i32>,
}

impl From<&MonitorConfig> for TailSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            lookback: config.log_lookback,
            page_limit: config.log_page_limit,
            max_pages: config.log_max_pages,
            retention_days: config.log_retention_days,
        }
    }
}

pub struct LogTailer<'a, L: LogOps + ?Sized> {
    logs: &'a L,
    settings: TailSettings,
}

impl<'a, L: LogOps + ?Sized> LogTailer<'a, L> {
    pub fn new(logs: &'a L, settings: TailSettings) -> Self {
        Self { logs, settings }
    }

    /// Check whether the endpoint's log group exists yet.
    pub async fn discover_stream(&self, endpoint: &EndpointName) -> Result<Discovery, LogError> {
        let group = log_group_name(endpoint);
        if self.logs.log_group_exists(&group).await? {
            tracing::debug!(group = %group, "log group available");
            Ok(Discovery::Available(StreamHandle::new(group)))
        } else {
            Ok(Discovery::NotYetAvailable)
        }
    }

    /// Start a cursor `lookback` before now.
    pub fn open(&self, handle: StreamHandle) -> LogCursor {
        let lookback = i64::try_from(self.settings.lookback.as_millis()).unwrap_or(i64::MAX);
        let start = Utc::now().timestamp_millis().saturating_sub(lookback).max(0);
        LogCursor::starting_at(handle, start)
    }

    /// Apply the configured retention policy, if any.
    pub async fn apply_retention(&self, handle: &StreamHandle) -> Result<(), LogError> {
        match self.settings.retention_days {
            Some(days) => self.logs.set_retention(handle.group(), days).await,
            None => Ok(()),
        }
    }

    /// Fetch records newer than the cursor, in timestamp order.
    ///
    /// Follows pagination up to the configured page cap. The cursor only
    /// moves when the whole call succeeds, so a failed page never loses
    /// records.
    pub async fn fetch_new(&self, cursor: &mut LogCursor) -> Result<Vec<LogRecord>, LogError> {
        // A token only means something for the query that produced it.
        let floor = cursor.query_floor();
        let mut next_token = cursor.resume.as_ref().map(|resume| resume.token.clone());
        let mut records = Vec::new();
        let mut fresh = Vec::new();
        let mut staged = HashSet::new();
        let mut resume = None;

        for page_number in 1..=self.settings.max_pages {
            let page = self
                .logs
                .fetch_events(&LogQuery {
                    group: cursor.handle.group.clone(),
                    start_time_ms: floor,
                    next_token: next_token.take(),
                    limit: self.settings.page_limit,
                })
                .await?;

            for event in page.events {
                if event.timestamp_ms < floor {
                    continue;
                }
                let record = LogRecord {
                    stream: event.stream,
                    timestamp_ms: event.timestamp_ms,
                    message: event.message,
                };
                let id = record.identity();
                if cursor.seen.contains(&id) || !staged.insert(id.clone()) {
                    tracing::trace!(
                        stream = %id.stream,
                        timestamp_ms = id.timestamp_ms,
                        digest = %hex::encode(&id.digest[..8]),
                        "skipping duplicate record"
                    );
                    continue;
                }
                fresh.push(id);
                records.push(record);
            }

            match page.next_token {
                Some(token) if page_number < self.settings.max_pages => next_token = Some(token),
                Some(token) => {
                    tracing::debug!(
                        group = %cursor.handle.group,
                        "page cap reached, resuming next fetch"
                    );
                    resume = Some(Resume { floor, token });
                    break;
                }
                None => break,
            }
        }

        cursor.advance(fresh, resume);
        records.sort_by_key(|r| r.timestamp_ms);
        Ok(records)
    }
}

/// Adaptive fetch cadence: back off while the group is quiet, snap back when
/// records arrive.
#[derive(Debug, Clone)]
pub struct FetchCadence {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl FetchCadence {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            current: base,
        }
    }

    /// Record how many records the last fetch returned and get the next delay.
    pub fn observe(&mut self, records: usize) -> Duration {
        if records > 0 {
            self.current = self.base;
            return self.base;
        }
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}
