//! Non-fatal outcome messages returned by poser operations.
//!
//! Per-item problems (missing bones, skipped poses, failed action
//! assignment) do not abort an operation; they are recorded here and logged.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub level: ReportLevel,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.push(ReportLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.push(ReportLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.push(ReportLevel::Error, message);
    }

    fn push(&mut self, level: ReportLevel, message: String) {
        self.entries.push(ReportEntry { level, message });
    }

    pub fn extend(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    pub fn has_errors(&self) -> bool {
        self.count(ReportLevel::Error) > 0
    }

    pub fn count(&self, level: ReportLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    /// Messages at `level`, in report order.
    pub fn messages(&self, level: ReportLevel) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.as_str())
            .collect()
    }
}
