// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::cloud::EndpointStatus;
use crate::deploy::{LogRecord, ProgressSink};
use crate::types::EndpointName;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet mode).
    pub fn progress(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => println!("{message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit("progress", message),
        }
    }

    /// Print a section heading followed by indented lines.
    pub fn section(&self, title: &str, lines: &[String]) {
        match self.mode {
            OutputMode::Normal => {
                println!();
                println!("{title}");
                for line in lines {
                    println!("  {line}");
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let event = JsonSection {
                    event: "section",
                    title,
                    lines,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print one line of endpoint container output.
    pub fn log_line(&self, timestamp: &str, message: &str) {
        match self.mode {
            OutputMode::Normal => println!("  [{timestamp}] {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let event = JsonLog {
                    event: "log",
                    timestamp,
                    message,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print a warning message.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit("warning", message),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({})", format_duration(elapsed));
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => self.emit("success", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a structured result: JSON document in JSON mode, nothing otherwise.
    pub fn report<T: Serialize>(&self, value: &T) {
        if self.mode == OutputMode::Json
            && let Ok(json) = serde_json::to_string(&JsonReport {
                event: "result",
                result: value,
            })
        {
            println!("{json}");
        }
    }

    fn emit(&self, event: &str, message: &str) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            println!("{json}");
        }
    }
}

impl ProgressSink for Output {
    fn step(&self, message: &str) {
        self.progress(message);
    }

    fn warning(&self, message: &str) {
        Output::warning(self, message);
    }

    fn status_changed(&self, endpoint: &EndpointName, status: &EndpointStatus, elapsed: Duration) {
        self.progress(&format!(
            "  {endpoint}: {status} ({})",
            format_duration(elapsed.as_secs_f64())
        ));
    }

    fn failure_reason(&self, reason: &str) {
        self.progress(&format!("  Failure reason: {reason}"));
    }

    fn log_stream_found(&self, group: &str) {
        self.progress(&format!("  Streaming logs from {group}"));
    }

    fn log_record(&self, record: &LogRecord) {
        let timestamp = record
            .timestamp()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| record.timestamp_ms.to_string());
        self.log_line(&timestamp, &record.message);
    }
}

/// Render seconds as `42.0s`, `3m 05s`, or `1h 02m`.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let total = secs.round() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonLog<'a> {
    event: &'a str,
    timestamp: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonSection<'a> {
    event: &'a str,
    title: &'a str,
    lines: &'a [String],
}

#[derive(Serialize)]
struct JsonReport<'a, T: Serialize> {
    event: &'a str,
    result: &'a T,
}
