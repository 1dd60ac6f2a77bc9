//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `greenprompt health`: popup status snapshot
//! - `greenprompt compress [TEXT]`: one-shot compression with results view
//! - `greenprompt test`: popup manual test, updates persisted counters
//! - `greenprompt stats`: counters and compression history summary
//! - `greenprompt dashboard`: open the dashboard in a browser
//! - `greenprompt scan <page.json>`: preview which inputs get a trigger
//! - `greenprompt config show|init|set|reset`: configuration management

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::{HistoryLog, Source};
use crate::analytics::reporter::{self, Stats, TrendEntry};
use crate::api::{CompressionRequest, CompressionService, HttpCompressionClient};
use crate::config::{self, GreenPromptConfig};
use crate::host::memory::MemoryPage;
use crate::host::{ElementId, Host, NoticeKind};
use crate::injector::overlay::OverlayView;
use crate::injector::{ContentInjector, FAILURE_MESSAGE, trigger};
use crate::popup::store::{Counters, FileStore};
use crate::popup::{ConnectionStatus, PopupPanel, TestOutcome};

/// Output format for `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn client(config: &GreenPromptConfig) -> HttpCompressionClient {
    HttpCompressionClient::from_config(&config.service)
}

fn state_store() -> Result<FileStore> {
    FileStore::default_location().context("could not determine home directory")
}

// ---------------------------------------------------------------------------
// greenprompt health
// ---------------------------------------------------------------------------

/// Take the popup's status snapshot: service health plus stored counters.
pub fn run_health() -> Result<()> {
    let config = config::load();
    let client = client(&config);
    let panel = PopupPanel::new(&config);
    let store = state_store()?;
    let snapshot = panel.open(&client, &store);

    println!("{}", "greenprompt Status".bold().cyan());
    println!("{}", "=".repeat(50));

    let connected = snapshot.status.is_connected();
    print_health_item("Compression service", connected, client.base_url());
    let status_line = snapshot.status.label();
    println!(
        "    {}",
        if connected {
            status_line.green()
        } else {
            status_line.red()
        }
    );
    match &snapshot.status {
        ConnectionStatus::Connected { methods, .. } if !methods.is_empty() => {
            println!("    {} {}", "Methods:".dimmed(), methods.join(", "));
        }
        ConnectionStatus::Disconnected { reason } => {
            println!("    {}", reason.dimmed());
        }
        _ => {}
    }

    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Config file",
        config_exists,
        if config_exists {
            "~/.greenprompt/config.toml"
        } else {
            "using defaults"
        },
    );

    println!();
    print_counters(&snapshot.counters);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<22} {}", status, name, detail.dimmed());
}

fn print_counters(counters: &Counters) {
    println!(
        "  {} {}",
        "Total compressions:".bold(),
        format_number(counters.total_compressions)
    );
    println!(
        "  {} {}",
        "Tokens saved:      ".bold(),
        format_number(counters.total_savings)
    );
}

// ---------------------------------------------------------------------------
// greenprompt compress
// ---------------------------------------------------------------------------

/// Compress a prompt given on the command line (or stdin) and show the
/// results view.
pub fn run_compress(text: Option<String>, ratio: Option<f64>) -> Result<()> {
    let config = config::load();

    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            buf
        }
    };

    let prompt = match trigger::validate(&text, config.detector.min_prompt_chars) {
        Ok(prompt) => prompt,
        Err(err) => {
            print_notice(err.notice_kind(), &err.to_string());
            return Ok(());
        }
    };

    let request = CompressionRequest::new(
        prompt,
        Some(ratio.unwrap_or(config.trigger.compression_ratio)),
    );
    let response = match client(&config).compress(&request) {
        Ok(response) => response,
        Err(err) => {
            print_notice(NoticeKind::Error, FAILURE_MESSAGE);
            return Err(err).context("compression request failed");
        }
    };

    if let Some(log) = HistoryLog::from_config(&config.logging) {
        log.record(Source::Cli, &response);
    }

    let view = OverlayView::new(
        ElementId(0),
        prompt,
        &response,
        config.overlay.preview_chars,
    );
    print_results(&view);

    println!();
    println!("{}", "--- Compressed prompt ---".dimmed());
    println!("{}", response.compressed_prompt);

    Ok(())
}

fn print_results(view: &OverlayView) {
    println!("{}", "🌱 Compression Results".bold().cyan());
    println!("{}", "=".repeat(50));
    for (label, value) in view.metrics() {
        println!("  {:<20} {}", format!("{label}:").bold(), value.green());
    }
    println!();
    println!("  {}", view.original_heading().bold());
    println!("    {}", view.original_preview.dimmed());
    println!("  {}", view.compressed_heading().bold());
    println!("    {}", view.compressed_preview);
}

fn print_notice(kind: NoticeKind, message: &str) {
    let line = match kind {
        NoticeKind::Info => message.normal(),
        NoticeKind::Warning => message.yellow(),
        NoticeKind::Error => message.red(),
        NoticeKind::Success => message.green(),
    };
    eprintln!("{line}");
}

// ---------------------------------------------------------------------------
// greenprompt test
// ---------------------------------------------------------------------------

/// Run the popup's manual test compression and update the counters.
pub fn run_test() -> Result<()> {
    let config = config::load();
    let client = client(&config);
    let mut panel = PopupPanel::new(&config);
    if let Some(log) = HistoryLog::from_config(&config.logging) {
        panel = panel.with_history(log);
    }
    let mut store = state_store()?;

    let outcome = panel.test_compression(&client, &mut store);
    let notice = panel.notice(&outcome);
    print_notice(notice.kind, &notice.message);

    match outcome {
        TestOutcome::Succeeded {
            counters: Some(counters),
            ..
        } => {
            println!();
            print_counters(&counters);
        }
        TestOutcome::Succeeded { counters: None, .. } => {
            print_notice(NoticeKind::Warning, "Counters could not be saved");
        }
        TestOutcome::Failed { .. } => {}
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// greenprompt stats
// ---------------------------------------------------------------------------

/// Show the persisted counters and a summary of the compression history.
pub fn run_stats(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let config = config::load();
    let counters = Counters::load_or_default(&state_store()?);
    let log = HistoryLog::new(config::expand_home(&config.logging.path));
    let stats = reporter::compute_stats(&log, days);
    let trends = reporter::compute_trends(&log, days.unwrap_or(7));

    match format {
        OutputFormat::Json => print_stats_json(&counters, &stats, &trends)?,
        OutputFormat::Csv => print_trends_csv(&trends),
        OutputFormat::Table => print_stats_table(&counters, &stats, &trends),
    }

    Ok(())
}

fn print_stats_table(counters: &Counters, stats: &Stats, trends: &[TrendEntry]) {
    println!("{}", "greenprompt Savings Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!("{}", "Popup Counters".bold().cyan());
    print_counters(counters);
    println!();

    if stats.total_compressions == 0 {
        println!(
            "{}",
            "No compression history yet. Compress a prompt to see stats.".yellow()
        );
        return;
    }

    println!("{}", "Compression History".bold().cyan());
    println!(
        "  {} {}",
        "Compressions:  ".bold(),
        stats.total_compressions
    );
    println!(
        "  {} {} → {}",
        "Tokens:        ".bold(),
        format_number(stats.total_original_tokens),
        format_number(stats.total_compressed_tokens)
    );
    println!(
        "  {} {}",
        "Tokens saved:  ".bold(),
        format_number(stats.total_tokens_saved)
    );
    println!(
        "  {} {:.2}x",
        "Avg ratio:     ".bold(),
        stats.avg_compression_ratio
    );
    println!(
        "  {} {:.6} kWh",
        "Energy saved:  ".bold(),
        stats.total_energy_saved_kwh
    );
    println!(
        "  {} {:.6} kg",
        "CO₂ saved:     ".bold(),
        stats.total_co2_saved_kg
    );
    println!();

    println!("{}", "By Source".bold().cyan());
    for source in &stats.by_source {
        println!(
            "  {:<8} {:>6} compressions {:>10} tokens",
            source.source.to_string(),
            source.count,
            format_number(source.tokens_saved)
        );
    }

    if !trends.is_empty() {
        println!();
        println!("{}", "Daily".bold().cyan());
        println!(
            "  {:<12} {:>12} {:>12} {:>14}",
            "Date", "Compressions", "Saved", "Energy (kWh)"
        );
        println!("  {}", "-".repeat(52));
        for (i, t) in trends.iter().enumerate() {
            let line = format!(
                "  {:<12} {:>12} {:>12} {:>14.6}",
                t.date,
                t.compressions,
                format_number(t.tokens_saved),
                t.energy_saved_kwh
            );
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
    }
}

fn print_stats_json(counters: &Counters, stats: &Stats, trends: &[TrendEntry]) -> Result<()> {
    let value = serde_json::json!({
        "counters": {
            "total_compressions": counters.total_compressions,
            "total_savings": counters.total_savings,
        },
        "history": {
            "total_compressions": stats.total_compressions,
            "total_original_tokens": stats.total_original_tokens,
            "total_compressed_tokens": stats.total_compressed_tokens,
            "total_tokens_saved": stats.total_tokens_saved,
            "avg_compression_ratio": stats.avg_compression_ratio,
            "total_energy_saved_kwh": stats.total_energy_saved_kwh,
            "total_co2_saved_kg": stats.total_co2_saved_kg,
            "by_source": stats.by_source.iter().map(|s| serde_json::json!({
                "source": s.source,
                "count": s.count,
                "tokens_saved": s.tokens_saved,
            })).collect::<Vec<_>>(),
        },
        "trends": trends.iter().map(|t| serde_json::json!({
            "date": t.date,
            "compressions": t.compressions,
            "tokens_saved": t.tokens_saved,
            "energy_saved_kwh": t.energy_saved_kwh,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_trends_csv(trends: &[TrendEntry]) {
    println!("date,compressions,tokens_saved,energy_saved_kwh");
    for t in trends {
        println!(
            "{},{},{},{:.6}",
            t.date, t.compressions, t.tokens_saved, t.energy_saved_kwh
        );
    }
}

// ---------------------------------------------------------------------------
// greenprompt dashboard
// ---------------------------------------------------------------------------

/// Open the dashboard in the default browser.
pub fn run_dashboard() -> Result<()> {
    let config = config::load();
    let panel = PopupPanel::new(&config);
    let url = panel.dashboard_url();

    println!("Opening dashboard at {}", url.bold());
    if let Err(e) = open_browser(url) {
        println!("{} {e}", "Could not open a browser:".yellow());
    }
    Ok(())
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// greenprompt scan
// ---------------------------------------------------------------------------

/// Run the prompt-input detector over a page description file.
pub fn run_scan(path: &Path) -> Result<()> {
    let config = config::load();
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read page description {}", path.display()))?;
    let mut page = MemoryPage::from_json(&json)?;

    let mut injector = ContentInjector::new(config);
    let decorated = injector.start(&mut page);

    println!("{}", "Prompt Input Scan".bold().cyan());
    println!("{}", "=".repeat(60));
    if !page.location().is_empty() {
        println!("  {} {}", "Location:".bold(), page.location());
    }
    println!(
        "  {:<6} {:<11} {:<24} Keyword",
        "Elem", "Kind", "Placeholder / id"
    );
    println!("  {}", "-".repeat(58));

    for element in page.candidate_inputs() {
        let kind = format!("{:?}", element.kind);
        let name = element
            .placeholder
            .as_deref()
            .or(element.dom_id.as_deref())
            .or(element.class_name.as_deref())
            .unwrap_or("-");
        let keyword = injector.detector().matched_keyword(&element);
        let line = format!(
            "  {:<6} {:<11} {:<24} {}",
            element.id.to_string(),
            kind,
            truncate(name, 24),
            keyword.unwrap_or("-")
        );
        if keyword.is_some() {
            println!("{}", line.green());
        } else {
            println!("{}", line.dimmed());
        }
    }

    println!();
    println!(
        "  {} trigger(s) attached to {} input(s)",
        decorated.len(),
        page.candidate_inputs().len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// greenprompt config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective greenprompt Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.greenprompt/config.toml", global_exists);
    print_source(".greenprompt.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "GREENPROMPT_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.greenprompt/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_chars` characters, appending "…" if truncated.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("héllo wörld", 5), "héll…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }
}
