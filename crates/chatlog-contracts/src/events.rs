use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatHistoryItem, ChatRole};

/// Totals over a batch of processed history items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub items: usize,
    pub ai_items: usize,
    pub annotated_items: usize,
    pub llm_module_account: u64,
    pub total_running_time: f64,
    pub total_quotes: usize,
}

impl HistorySummary {
    pub fn from_histories(histories: &[ChatHistoryItem]) -> Self {
        let running_time: f64 = histories
            .iter()
            .filter_map(|item| item.total_running_time)
            .sum();
        Self {
            items: histories.len(),
            ai_items: histories
                .iter()
                .filter(|item| item.role == ChatRole::Ai)
                .count(),
            annotated_items: histories
                .iter()
                .filter(|item| item.llm_module_account.is_some())
                .count(),
            llm_module_account: histories
                .iter()
                .filter_map(|item| item.llm_module_account)
                .sum(),
            // display precision for the log only
            total_running_time: (running_time * 100.0).round() / 100.0,
            total_quotes: histories
                .iter()
                .filter_map(|item| item.total_quote_list.as_ref())
                .map(Vec::len)
                .sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    HistoryAnnotated {
        input: String,
        mode: String,
        summary: HistorySummary,
    },
    IconResolved {
        filename: String,
        icon: String,
    },
}

/// One line of `events.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub session_id: String,
    pub ts: String,
    #[serde(flatten)]
    pub event: LogEvent,
}

/// Appends typed history events to a JSONL file, one record per line.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    session_id: String,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_histories(
        &self,
        input: &Path,
        mode: &str,
        histories: &[ChatHistoryItem],
    ) -> anyhow::Result<EventRecord> {
        self.record(LogEvent::HistoryAnnotated {
            input: input.to_string_lossy().to_string(),
            mode: mode.to_string(),
            summary: HistorySummary::from_histories(histories),
        })
    }

    pub fn record_icon(&self, filename: &str, icon: &str) -> anyhow::Result<EventRecord> {
        self.record(LogEvent::IconResolved {
            filename: filename.to_string(),
            icon: icon.to_string(),
        })
    }

    pub fn record(&self, event: LogEvent) -> anyhow::Result<EventRecord> {
        let record = EventRecord {
            session_id: self.session_id.clone(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            event,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // one write per record
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(&line))
            .with_context(|| format!("failed to append event to {}", self.path.display()))?;
        Ok(record)
    }
}
