//! Operator-facing event log.
//!
//! Bounded like the on-screen journal: once full, the oldest entry goes.
//! Every entry is mirrored to `tracing` so `debug.log` has the full history.

use crate::error::{Error, Result};
use crate::export::artifact_path;
use chrono::{DateTime, Local, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    Camera,
    Video,
    Save,
    Cmd,
    Data,
    Warn,
    Error,
}

impl EventTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Camera => "CAMERA",
            EventTag::Video => "VIDEO",
            EventTag::Save => "SAVE",
            EventTag::Cmd => "CMD",
            EventTag::Data => "DATA",
            EventTag::Warn => "WARN",
            EventTag::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub tag: EventTag,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.at.format("%H:%M:%S"), self.tag.as_str(), self.message)
    }
}

/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct EventLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, tag: EventTag, message: impl Into<String>) {
        let message = message.into();
        match tag {
            EventTag::Warn => tracing::warn!("[{}] {}", tag.as_str(), message),
            EventTag::Error => tracing::error!("[{}] {}", tag.as_str(), message),
            EventTag::Data => tracing::debug!("[{}] {}", tag.as_str(), message),
            _ => tracing::info!("[{}] {}", tag.as_str(), message),
        }

        let mut entries = self.entries.lock();
        entries.push_back(LogEntry {
            at: Local::now(),
            tag,
            message,
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<LogEntry> {
        self.entries.lock().back().cloned()
    }

    /// Write every entry to `<dir>/telemetry_<timestamp>.txt`.
    pub fn save(&self, dir: &Path, at: NaiveDateTime) -> Result<PathBuf> {
        let path = artifact_path(dir, "telemetry", "txt", at);
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, 0, e))?;

        let text: String = self
            .entries
            .lock()
            .iter()
            .map(|e| format!("{}\n", e))
            .collect();

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::io(&path, 0, e))?;
        file.write_all(text.as_bytes()).map_err(|e| Error::io(&path, 0, e))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn keeps_only_the_newest_entries() {
        let log = EventLog::new(100);
        for i in 0..150 {
            log.push(EventTag::Data, format!("reading {}", i));
        }
        assert_eq!(log.len(), 100);
        let recent = log.recent(2);
        assert_eq!(recent[0].message, "reading 148");
        assert_eq!(recent[1].message, "reading 149");
        assert_eq!(log.recent(500).first().map(|e| e.message.clone()), Some("reading 50".into()));
    }

    #[test]
    fn clones_share_entries() {
        let log = EventLog::new(10);
        let other = log.clone();
        other.push(EventTag::Cmd, "forward");
        assert_eq!(log.last().map(|e| e.tag), Some(EventTag::Cmd));
        assert!(log.last().unwrap().to_string().contains("[CMD] forward"));
    }

    #[test]
    fn save_writes_all_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(10);
        log.push(EventTag::Camera, "simulated");
        log.push(EventTag::Video, "quality low");

        let at = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        let path = log.save(dir.path(), at).unwrap();
        assert_eq!(path.file_name().unwrap(), "telemetry_20250102_030405.txt");

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("[VIDEO] quality low"));
    }
}
