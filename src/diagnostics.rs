// ABOUTME: Diagnostics accumulator for non-fatal problems during a deployment.
// ABOUTME: Collects time-stamped entries that shouldn't fail a deployment but should be shown.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Collects non-fatal problems seen while monitoring or cleaning up.
///
/// Entries carry their offset from a shared origin so that accumulators
/// owned by concurrent activities can be merged back into time order.
#[derive(Debug)]
pub struct Diagnostics {
    origin: Instant,
    entries: Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl Diagnostics {
    pub fn starting_at(origin: Instant) -> Self {
        Self {
            origin,
            entries: Vec::new(),
        }
    }

    /// Record an entry, auto-logging it via tracing.
    pub fn record(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            DiagnosticKind::Info => tracing::info!("{message}"),
            _ => tracing::warn!("{message}"),
        }
        self.entries.push(Diagnostic {
            kind,
            offset: Instant::now().saturating_duration_since(self.origin),
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(DiagnosticKind::Info, message);
    }

    pub fn transient(&mut self, message: impl Into<String>) {
        self.record(DiagnosticKind::Transient, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(DiagnosticKind::Warning, message);
    }

    /// Fold another accumulator in, keeping entries ordered by time.
    pub fn merge(&mut self, other: Diagnostics) {
        let shift = other.origin.saturating_duration_since(self.origin);
        self.entries.extend(other.entries.into_iter().map(|mut d| {
            d.offset += shift;
            d
        }));
        // Stable sort keeps insertion order for entries at the same instant.
        self.entries.sort_by_key(|d| d.offset);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.message.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// A single non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(with = "humantime_serde")]
    pub offset: Duration,
    pub message: String,
}

/// Categories of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Progress worth keeping in the record (status changes, stream discovery).
    Info,
    /// A call failed in a way that was retried.
    Transient,
    /// Something the operator should look at.
    Warning,
}
