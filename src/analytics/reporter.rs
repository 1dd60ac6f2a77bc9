//! Aggregation over the compression history for `greenprompt stats`.
//!
//! - **Stats**: totals, average ratio, and a per-source breakdown
//! - **Trends**: per-day compressions and savings

use std::collections::HashMap;

use crate::analytics::logger::{CompressionLogEntry, HistoryLog, Source};

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics over a set of history entries.
#[derive(Debug, Default)]
pub struct Stats {
    pub total_compressions: usize,
    pub total_original_tokens: u64,
    pub total_compressed_tokens: u64,
    pub total_tokens_saved: u64,
    pub total_energy_saved_kwh: f64,
    pub total_co2_saved_kg: f64,
    /// Mean of the service-reported ratios.
    pub avg_compression_ratio: f64,
    pub by_source: Vec<SourceStat>,
}

/// Per-source aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStat {
    pub source: Source,
    pub count: usize,
    pub tokens_saved: u64,
}

/// A single data point in a time-based trend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendEntry {
    pub date: String,
    pub compressions: usize,
    pub tokens_saved: u64,
    pub energy_saved_kwh: f64,
}

/// Compute stats from the log, optionally limited to the last `days` days.
pub fn compute_stats(log: &HistoryLog, days: Option<u32>) -> Stats {
    build_stats(&log.read_since_days(days))
}

/// Compute daily trends from the log over the last `days` days.
pub fn compute_trends(log: &HistoryLog, days: u32) -> Vec<TrendEntry> {
    build_trends(&log.read_since_days(Some(days)))
}

fn build_stats(entries: &[CompressionLogEntry]) -> Stats {
    if entries.is_empty() {
        return Stats::default();
    }

    let total_compressions = entries.len();
    let avg_compression_ratio =
        entries.iter().map(|e| e.compression_ratio).sum::<f64>() / total_compressions as f64;

    Stats {
        total_compressions,
        total_original_tokens: entries.iter().map(|e| e.original_tokens).sum(),
        total_compressed_tokens: entries.iter().map(|e| e.compressed_tokens).sum(),
        total_tokens_saved: entries.iter().map(|e| e.tokens_saved).sum(),
        total_energy_saved_kwh: entries.iter().map(|e| e.energy_saved_kwh).sum(),
        total_co2_saved_kg: entries.iter().map(|e| e.co2_saved_kg).sum(),
        avg_compression_ratio,
        by_source: compute_source_stats(entries),
    }
}

/// Group entries by source, sorted by tokens saved (descending).
fn compute_source_stats(entries: &[CompressionLogEntry]) -> Vec<SourceStat> {
    let mut groups: HashMap<Source, SourceStat> = HashMap::new();
    for entry in entries {
        let stat = groups.entry(entry.source).or_insert(SourceStat {
            source: entry.source,
            count: 0,
            tokens_saved: 0,
        });
        stat.count += 1;
        stat.tokens_saved += entry.tokens_saved;
    }

    let mut stats: Vec<SourceStat> = groups.into_values().collect();
    stats.sort_by(|a, b| {
        b.tokens_saved
            .cmp(&a.tokens_saved)
            .then_with(|| a.source.to_string().cmp(&b.source.to_string()))
    });
    stats
}

fn build_trends(entries: &[CompressionLogEntry]) -> Vec<TrendEntry> {
    let mut daily: HashMap<String, Vec<&CompressionLogEntry>> = HashMap::new();
    for entry in entries {
        // RFC 3339 timestamp: first 10 chars are YYYY-MM-DD
        let date = entry.timestamp.get(..10).unwrap_or("unknown").to_string();
        daily.entry(date).or_default().push(entry);
    }

    let mut trends: Vec<TrendEntry> = daily
        .into_iter()
        .map(|(date, group)| TrendEntry {
            date,
            compressions: group.len(),
            tokens_saved: group.iter().map(|e| e.tokens_saved).sum(),
            energy_saved_kwh: group.iter().map(|e| e.energy_saved_kwh).sum(),
        })
        .collect();

    trends.sort_by(|a, b| a.date.cmp(&b.date));
    trends
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: &str, source: Source, saved: u64, ratio: f64) -> CompressionLogEntry {
        CompressionLogEntry {
            timestamp: timestamp.to_string(),
            source,
            original_tokens: 100,
            compressed_tokens: 100 - saved,
            tokens_saved: saved,
            compression_ratio: ratio,
            energy_saved_kwh: saved as f64 * 0.0003,
            co2_saved_kg: saved as f64 * 0.0003 * 0.475,
        }
    }

    fn sample_entries() -> Vec<CompressionLogEntry> {
        vec![
            entry("2025-01-15T10:00:00+00:00", Source::Page, 30, 1.43),
            entry("2025-01-15T11:00:00+00:00", Source::Page, 40, 1.67),
            entry("2025-01-16T09:00:00+00:00", Source::Popup, 10, 1.11),
        ]
    }

    #[test]
    fn build_stats_totals() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.total_compressions, 3);
        assert_eq!(stats.total_original_tokens, 300);
        assert_eq!(stats.total_compressed_tokens, 220);
        assert_eq!(stats.total_tokens_saved, 80);
        assert!((stats.total_energy_saved_kwh - 0.024).abs() < 1e-9);
        assert!((stats.avg_compression_ratio - 1.40333).abs() < 1e-4);
    }

    #[test]
    fn source_breakdown_sorted_by_savings() {
        let stats = build_stats(&sample_entries());
        assert_eq!(
            stats.by_source,
            vec![
                SourceStat {
                    source: Source::Page,
                    count: 2,
                    tokens_saved: 70
                },
                SourceStat {
                    source: Source::Popup,
                    count: 1,
                    tokens_saved: 10
                },
            ]
        );
    }

    #[test]
    fn empty_entries_give_zero_stats() {
        let stats = build_stats(&[]);
        assert_eq!(stats.total_compressions, 0);
        assert_eq!(stats.avg_compression_ratio, 0.0);
        assert!(stats.by_source.is_empty());
    }

    #[test]
    fn trends_grouped_by_day_ascending() {
        let trends = build_trends(&sample_entries());
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].date, "2025-01-15");
        assert_eq!(trends[0].compressions, 2);
        assert_eq!(trends[0].tokens_saved, 70);
        assert_eq!(trends[1].date, "2025-01-16");
    }

    #[test]
    fn compute_stats_reads_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("log.jsonl"));
        for e in sample_entries() {
            log.append(&e).unwrap();
        }
        let stats = compute_stats(&log, None);
        assert_eq!(stats.total_compressions, 3);
    }
}
