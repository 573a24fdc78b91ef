use std::fmt;

use chrono::Local;
use serde_json::Value;

/// Who caused an event: the engine itself, the user, or the remote value
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    System,
    User,
    External,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::System => write!(f, "SYSTEM"),
            LogSource::User => write!(f, "USER"),
            LogSource::External => write!(f, "EXTERNAL"),
        }
    }
}

/// One immutable log record. Created by every observable event and never
/// mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: String,
    pub source: LogSource,
    pub message: String,
    pub payload: Option<Value>,
}

/// Append-only event log. Ids and timestamps are assigned at append time;
/// the display layer shows only the most recent few entries but the log
/// itself keeps everything for the session.
pub struct EventLog {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_id: 0 }
    }

    pub fn push(&mut self, source: LogSource, message: impl Into<String>, payload: Option<Value>) {
        let entry = LogEntry {
            id: self.next_id,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            source,
            message: message.into(),
            payload,
        };
        self.next_id += 1;
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The most recent `k` entries, oldest first.
    pub fn tail(&self, k: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(k);
        &self.entries[start..]
    }
}
