//! ---
//! mof_section: "01-core-functionality"
//! mof_subsection: "module"
//! mof_type: "source"
//! mof_scope: "code"
//! mof_description: "Operator-facing event journal."
//! mof_version: "v0.1.0"
//! mof_owner: "tbd"
//! ---
use chrono::{DateTime, Local};
use mof_iot_common::time::clock_label;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::buffer::BoundedBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogCategory {
    Info,
    Alert,
    Action,
}

/// Immutable journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub category: LogCategory,
}

impl LogEntry {
    pub fn new(category: LogCategory, message: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: at,
            message: message.into(),
            category,
        }
    }

    /// `HH:MM:SS` label used by the log panel.
    pub fn clock_label(&self) -> String {
        clock_label(&self.timestamp)
    }
}

/// Append-only journal keeping the most recent entries.
#[derive(Debug, Clone)]
pub struct EventJournal {
    entries: BoundedBuffer<LogEntry>,
}

impl EventJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedBuffer::new(capacity),
        }
    }

    pub fn record(
        &mut self,
        category: LogCategory,
        message: impl Into<String>,
        at: DateTime<Local>,
    ) -> LogEntry {
        let entry = LogEntry::new(category, message, at);
        self.entries.push(entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.to_vec()
    }

    /// Number of entries in `category`.
    pub fn count(&self, category: LogCategory) -> usize {
        self.iter().filter(|entry| entry.category == category).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_is_capped_fifo() {
        let mut journal = EventJournal::new(100);
        for index in 0..150 {
            journal.record(LogCategory::Info, format!("entry {index}"), Local::now());
        }
        assert_eq!(journal.len(), 100);
        let entries = journal.entries();
        assert_eq!(entries.first().unwrap().message, "entry 50");
        assert_eq!(entries.last().unwrap().message, "entry 149");
    }

    #[test]
    fn entries_get_unique_ids() {
        let mut journal = EventJournal::new(4);
        let first = journal.record(LogCategory::Action, "a", Local::now()).id;
        let second = journal.record(LogCategory::Action, "b", Local::now()).id;
        assert_ne!(first, second);
        assert_eq!(journal.count(LogCategory::Action), 2);
        assert_eq!(journal.count(LogCategory::Alert), 0);
    }

    #[test]
    fn category_renders_uppercase() {
        assert_eq!(LogCategory::Alert.to_string(), "ALERT");
        assert_eq!("ACTION".parse::<LogCategory>().unwrap(), LogCategory::Action);
        assert_eq!(serde_json::to_string(&LogCategory::Info).unwrap(), "\"INFO\"");
    }
}
