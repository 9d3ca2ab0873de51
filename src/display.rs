//! Operator-facing progress output
//!
//! Every line the pipeline prints for the operator goes through
//! `ProgressDisplay` and carries a severity prefix. Structured diagnostics go
//! to `tracing` instead.

use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Success,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Severity::Info => "[INFO]",
            Severity::Warn => "[WARN]",
            Severity::Error => "[ERROR]",
            Severity::Success => "[SUCCESS]",
        };
        f.write_str(tag)
    }
}

/// Trait for displaying progress and messages
pub trait ProgressDisplay: Send + Sync {
    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);

    fn success(&self, message: &str);
}

/// Writes to the terminal; warnings and errors go to stderr
#[derive(Debug, Default, Clone)]
pub struct ConsoleDisplay;

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressDisplay for ConsoleDisplay {
    fn info(&self, message: &str) {
        println!("{} {message}", Severity::Info);
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", Severity::Warn);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {message}", Severity::Error);
    }

    fn success(&self, message: &str) {
        println!("{} {message}", Severity::Success);
    }
}

/// Keeps every line in memory, for tests
#[derive(Debug, Default, Clone)]
pub struct RecordingDisplay {
    lines: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, severity: Severity, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines rendered with their prefix, as the console would show them
    pub fn rendered(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .map(|(severity, message)| format!("{} {}", severity, message))
            .collect()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, m)| m.contains(needle))
    }
}

impl ProgressDisplay for RecordingDisplay {
    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(Severity::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }

    fn success(&self, message: &str) {
        self.push(Severity::Success, message);
    }
}
