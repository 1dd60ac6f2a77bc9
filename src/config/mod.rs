/// Configuration system for greenprompt.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::GreenPromptConfig::default()`]
/// 2. **User global config**: `~/.greenprompt/config.toml`
/// 3. **Project local config**: `.greenprompt.toml` in the current directory
/// 4. **Environment variables**: `GREENPROMPT_*` overrides (highest precedence)
///
/// Each TOML file is deserialized with `serde(default)`, so a later file
/// replaces the earlier layer wholesale; unset keys carry built-in defaults.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::GreenPromptConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> GreenPromptConfig {
    let mut config = GreenPromptConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Malformed files are skipped with a warning rather than aborting: a broken
/// config must not take the extension surface down with it.
fn load_toml_file(path: Option<PathBuf>) -> Option<GreenPromptConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Base directory for all greenprompt state: `~/.greenprompt`.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".greenprompt"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".greenprompt.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `GREENPROMPT_URL`: compression service base URL
/// - `GREENPROMPT_TIMEOUT_MS`: request deadline (`0` clears it)
/// - `GREENPROMPT_MIN_CHARS`: minimum prompt length
/// - `GREENPROMPT_RATIO`: target compression ratio
/// - `GREENPROMPT_LOGGING`: history log on/off
fn apply_env_overrides(config: &mut GreenPromptConfig) {
    if let Ok(val) = std::env::var("GREENPROMPT_URL")
        && !val.is_empty()
    {
        config.service.base_url = val;
    }
    if let Ok(val) = std::env::var("GREENPROMPT_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.service.timeout_ms = (ms > 0).then_some(ms);
    }
    if let Ok(val) = std::env::var("GREENPROMPT_MIN_CHARS")
        && let Ok(chars) = val.parse::<usize>()
    {
        config.detector.min_prompt_chars = chars;
    }
    if let Ok(val) = std::env::var("GREENPROMPT_RATIO")
        && let Ok(ratio) = val.parse::<f64>()
        && ratio > 0.0
    {
        config.trigger.compression_ratio = ratio;
    }
    if let Ok(val) = std::env::var("GREENPROMPT_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.greenprompt/config.toml`.
///
/// Returns an error if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, GreenPromptConfig::default_toml()).context("failed to write config file")
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `detector.min_prompt_chars`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let source = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&GreenPromptConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer load as a config.
    let rendered = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<GreenPromptConfig>(&rendered)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, rendered).context("failed to write config file")
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// Keys absent from the tree are accepted when they name a known config
/// field (e.g. the optional `service.timeout_ms`); the value is parsed as an
/// integer, float or boolean before falling back to a string.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    if let Some(section_path) = section_path {
        for part in section_path.split('.') {
            current = current
                .get_mut(part)
                .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
        }
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{}'", section_path.unwrap_or("")))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw_value
                .split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect(),
        ),
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => infer_toml_value(raw_value),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

fn infer_toml_value(raw_value: &str) -> toml::Value {
    if let Ok(n) = raw_value.parse::<i64>() {
        toml::Value::Integer(n)
    } else if let Ok(f) = raw_value.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = raw_value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(raw_value.to_string())
    }
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root: toml::Value = toml::from_str("[detector]\nmin_prompt_chars = 50\n").unwrap();
        set_toml_value(&mut root, "detector.min_prompt_chars", "80").unwrap();
        assert_eq!(root["detector"]["min_prompt_chars"].as_integer(), Some(80));
    }

    #[test]
    fn set_toml_value_updates_float() {
        let mut root: toml::Value =
            toml::from_str("[trigger]\ncompression_ratio = 1.5\n").unwrap();
        set_toml_value(&mut root, "trigger.compression_ratio", "2.0").unwrap();
        let ratio = root["trigger"]["compression_ratio"].as_float().unwrap();
        assert!((ratio - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn set_toml_value_splits_keyword_list() {
        let mut root: toml::Value =
            toml::from_str("[detector]\nkeywords = [\"chat\"]\n").unwrap();
        set_toml_value(&mut root, "detector.keywords", "reply, compose").unwrap();
        let keywords = root["detector"]["keywords"].as_array().unwrap();
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[1].as_str(), Some("compose"));
    }

    #[test]
    fn set_toml_value_accepts_absent_optional_key() {
        let mut root: toml::Value =
            toml::from_str("[service]\nbase_url = \"http://localhost:8000\"\n").unwrap();
        set_toml_value(&mut root, "service.timeout_ms", "5000").unwrap();
        assert_eq!(root["service"]["timeout_ms"].as_integer(), Some(5000));
    }

    #[test]
    fn set_toml_value_rejects_unknown_section() {
        let mut root: toml::Value = toml::from_str("[service]\nbase_url = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
    }

    #[test]
    fn set_config_value_at_writes_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value_at(&path, "navigation.settle_delay_ms", "250").unwrap();

        let config: GreenPromptConfig =
            toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.navigation.settle_delay_ms, 250);
        assert_eq!(config.detector.min_prompt_chars, 50);
    }

    #[test]
    fn set_config_value_at_rejects_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let result = set_config_value_at(&path, "detector.min_prompt_chars", "many");
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn write_default_config_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        assert!(write_default_config(&path, true).is_ok());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/tmp/log.jsonl"), PathBuf::from("/tmp/log.jsonl"));
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: GreenPromptConfig = toml::from_str(&toml_str).unwrap();
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn malformed_file_warning_reaches_scoped_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service\nbase_url = 1\n").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let loaded = tracing::subscriber::with_default(subscriber, || load_toml_file(Some(path)));

        assert!(loaded.is_none());
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ignoring malformed config file"));
    }
}
