use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::CompressionResponse;
use crate::config;
use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Compression log entry (JSONL history)
// ---------------------------------------------------------------------------

/// Where a compression was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A trigger injected into a page.
    Page,
    /// The popup's manual test action.
    Popup,
    /// `greenprompt compress` on the command line.
    Cli,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Popup => write!(f, "popup"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

/// One line of the compression history (`~/.greenprompt/compression-log.jsonl`).
///
/// Records the service-reported metrics of a successful compression. Prompt
/// text is deliberately not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionLogEntry {
    pub timestamp: String,
    pub source: Source,
    pub original_tokens: u64,
    pub compressed_tokens: u64,
    pub tokens_saved: u64,
    pub compression_ratio: f64,
    pub energy_saved_kwh: f64,
    pub co2_saved_kg: f64,
}

impl CompressionLogEntry {
    pub fn from_response(source: Source, response: &CompressionResponse) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            source,
            original_tokens: response.original_tokens,
            compressed_tokens: response.compressed_tokens,
            tokens_saved: response.tokens_saved,
            compression_ratio: response.compression_ratio,
            energy_saved_kwh: response.energy_saved_kwh,
            co2_saved_kg: response.co2_saved_kg,
        }
    }
}

// ---------------------------------------------------------------------------
// History log
// ---------------------------------------------------------------------------

/// Append-only JSONL log of successful compressions.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured log, or `None` when history logging is disabled.
    pub fn from_config(logging: &LoggingConfig) -> Option<Self> {
        logging
            .enabled
            .then(|| Self::new(config::expand_home(&logging.path)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a successful compression.
    ///
    /// Best-effort: a write failure is logged and otherwise ignored so it
    /// never turns a successful compression into a failure.
    pub fn record(&self, source: Source, response: &CompressionResponse) {
        let entry = CompressionLogEntry::from_response(source, response);
        if let Err(e) = self.append(&entry) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append compression log");
        }
    }

    pub fn append(&self, entry: &CompressionLogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read all entries, silently skipping malformed lines. Returns an empty
    /// vec if the file does not exist or cannot be read.
    pub fn read_all(&self) -> Vec<CompressionLogEntry> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<CompressionLogEntry>(&line).ok())
            .collect()
    }

    /// Read entries from the last `days` days, or all entries if `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<CompressionLogEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(saved: u64) -> CompressionResponse {
        CompressionResponse {
            original_prompt: "secret original".to_string(),
            compressed_prompt: "secret".to_string(),
            original_tokens: 100,
            compressed_tokens: 100 - saved,
            compression_ratio: 1.43,
            tokens_saved: saved,
            energy_saved_kwh: 0.009,
            co2_saved_kg: 0.004275,
        }
    }

    #[test]
    fn record_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("nested").join("log.jsonl"));

        log.record(Source::Page, &response(30));
        log.record(Source::Popup, &response(10));

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, Source::Page);
        assert_eq!(entries[0].tokens_saved, 30);
        assert_eq!(entries[1].source, Source::Popup);
    }

    #[test]
    fn prompt_text_is_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("log.jsonl"));
        log.record(Source::Cli, &response(5));

        let raw = fs::read_to_string(log.path()).unwrap();
        assert!(!raw.contains("secret"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("log.jsonl"));
        log.record(Source::Page, &response(30));
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "not json").unwrap();
        log.record(Source::Page, &response(20));

        assert_eq!(log.read_all().len(), 2);
    }

    #[test]
    fn missing_file_reads_empty() {
        let log = HistoryLog::new("/nonexistent/dir/log.jsonl");
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn read_since_days_drops_old_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("log.jsonl"));
        let mut old = CompressionLogEntry::from_response(Source::Page, &response(1));
        old.timestamp = "2020-01-01T00:00:00+00:00".to_string();
        log.append(&old).unwrap();
        log.record(Source::Page, &response(2));

        assert_eq!(log.read_since_days(None).len(), 2);
        let recent = log.read_since_days(Some(7));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].tokens_saved, 2);
    }

    #[test]
    fn disabled_logging_yields_no_log() {
        let logging = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(HistoryLog::from_config(&logging).is_none());
    }
}
