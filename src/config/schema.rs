/// Configuration schema and defaults for greenprompt.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[service]`, `[detector]`, `[trigger]`, `[navigation]`, `[overlay]`,
/// `[notifications]`, `[popup]`, and `[logging]`.
///
/// Every field has a built-in default. The detector keywords and the
/// minimum prompt length are heuristics kept here as plain settings so they
/// can be tuned without touching the detection code.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level greenprompt configuration.
///
/// Maps directly to `~/.greenprompt/config.toml` and `.greenprompt.toml`.
/// Missing sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreenPromptConfig {
    pub service: ServiceConfig,
    pub detector: DetectorConfig,
    pub trigger: TriggerConfig,
    pub navigation: NavigationConfig,
    pub overlay: OverlayConfig,
    pub notifications: NotificationConfig,
    pub popup: PopupConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [service]
// ---------------------------------------------------------------------------

/// Where the compression service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP base URL of the compression service.
    pub base_url: String,
    /// Optional per-request deadline. Unset means requests wait until the
    /// service answers or the connection drops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [detector]
// ---------------------------------------------------------------------------

/// Prompt-input detection heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Keywords matched case-insensitively against placeholder, class and id.
    pub keywords: Vec<String>,
    /// Minimum trimmed prompt length (in characters) worth compressing.
    pub min_prompt_chars: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            min_prompt_chars: 50,
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "message", "prompt", "question", "ask", "chat", "input", "what", "how", "tell", "explain",
        "describe",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ---------------------------------------------------------------------------
// [trigger]
// ---------------------------------------------------------------------------

/// Trigger control appearance and request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Target compression ratio sent with every request.
    pub compression_ratio: f64,
    /// Label shown while idle.
    pub idle_label: String,
    /// Label shown while a request is in flight.
    pub busy_label: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            compression_ratio: 1.5,
            idle_label: "🌱 Compress".to_string(),
            busy_label: "⏳ Compressing...".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [navigation]
// ---------------------------------------------------------------------------

/// Single-page-app navigation handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Delay after a location change before re-scanning the page.
    pub settle_delay_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// [overlay]
// ---------------------------------------------------------------------------

/// Results overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Maximum characters of each prompt shown in the comparison preview.
    pub preview_chars: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { preview_chars: 200 }
    }
}

// ---------------------------------------------------------------------------
// [notifications]
// ---------------------------------------------------------------------------

/// Transient notice settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a notice stays visible.
    pub duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { duration_ms: 3000 }
    }
}

// ---------------------------------------------------------------------------
// [popup]
// ---------------------------------------------------------------------------

/// Popup status panel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Sample sentence used by the manual test action.
    pub test_prompt: String,
    /// Address opened by the "open dashboard" action.
    pub dashboard_url: String,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            test_prompt: "This is a test prompt to verify that the compression functionality is \
                          working correctly. It should be compressed to save tokens and energy."
                .to_string(),
            dashboard_url: "http://localhost:3000".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Compression history log and console verbosity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether successful compressions are appended to the history log.
    pub enabled: bool,
    /// Path of the JSONL history log. A leading `~/` expands to the home dir.
    pub path: String,
    /// Default console log level when `GREENPROMPT_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.greenprompt/compression-log.jsonl".to_string(),
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl GreenPromptConfig {
    /// Annotated default config written by `greenprompt config init`.
    pub fn default_toml() -> String {
        r#"# greenprompt Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (GREENPROMPT_*)
#   2. Project config (.greenprompt.toml in current directory)
#   3. User global config (~/.greenprompt/config.toml)
#   4. Built-in defaults

[service]
base_url = "http://localhost:8000"
# timeout_ms = 30000                  # Unset: wait for the service indefinitely

[detector]
keywords = ["message", "prompt", "question", "ask", "chat", "input", "what", "how", "tell", "explain", "describe"]
min_prompt_chars = 50                 # Shorter prompts are not worth compressing

[trigger]
compression_ratio = 1.5
idle_label = "🌱 Compress"
busy_label = "⏳ Compressing..."

[navigation]
settle_delay_ms = 1000                # Wait for the new view before re-scanning

[overlay]
preview_chars = 200

[notifications]
duration_ms = 3000

[popup]
test_prompt = "This is a test prompt to verify that the compression functionality is working correctly. It should be compressed to save tokens and energy."
dashboard_url = "http://localhost:3000"

[logging]
enabled = true
path = "~/.greenprompt/compression-log.jsonl"
level = "warn"                        # Overridden by GREENPROMPT_LOG
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
