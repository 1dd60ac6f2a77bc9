/// Integration tests for layered configuration.
///
/// # Safety
///
/// The env override test uses `std::env::set_var` / `remove_var`, which are
/// `unsafe` in Rust 2024 edition. All mutation happens inside one `#[test]`
/// and nothing else in this binary reads `GREENPROMPT_*` variables.
use greenprompt::config::{self, GreenPromptConfig};

/// Helper: set an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn set_env(key: &str, val: &str) {
    unsafe { std::env::set_var(key, val) }
}

/// Helper: remove an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) }
}

const VARS: [&str; 5] = [
    "GREENPROMPT_URL",
    "GREENPROMPT_TIMEOUT_MS",
    "GREENPROMPT_MIN_CHARS",
    "GREENPROMPT_RATIO",
    "GREENPROMPT_LOGGING",
];

#[test]
fn env_overrides_take_precedence() {
    unsafe { set_env("GREENPROMPT_URL", "http://compress.internal:9000") };
    unsafe { set_env("GREENPROMPT_TIMEOUT_MS", "2500") };
    unsafe { set_env("GREENPROMPT_MIN_CHARS", "20") };
    unsafe { set_env("GREENPROMPT_RATIO", "2.0") };
    unsafe { set_env("GREENPROMPT_LOGGING", "off") };

    let config = config::load();
    assert_eq!(config.service.base_url, "http://compress.internal:9000");
    assert_eq!(config.service.timeout_ms, Some(2500));
    assert_eq!(config.detector.min_prompt_chars, 20);
    assert_eq!(config.trigger.compression_ratio, 2.0);
    assert!(!config.logging.enabled);

    // --- zero clears the deadline ---
    unsafe { set_env("GREENPROMPT_TIMEOUT_MS", "0") };
    assert_eq!(config::load().service.timeout_ms, None);

    // --- unparseable and non-positive values are ignored ---
    unsafe { set_env("GREENPROMPT_MIN_CHARS", "lots") };
    unsafe { set_env("GREENPROMPT_RATIO", "-1") };
    let config = config::load();
    assert_ne!(config.detector.min_prompt_chars, 0);
    assert!(config.trigger.compression_ratio > 0.0);

    // --- truthy spellings ---
    for value in ["1", "TRUE", "yes", "On"] {
        unsafe { set_env("GREENPROMPT_LOGGING", value) };
        assert!(config::load().logging.enabled, "{value} should enable logging");
    }

    for var in VARS {
        unsafe { remove_env(var) };
    }
}

#[test]
fn default_config_matches_documented_defaults() {
    let config = GreenPromptConfig::default();
    assert_eq!(config.service.base_url, "http://localhost:8000");
    assert_eq!(config.service.timeout_ms, None);
    assert_eq!(config.detector.min_prompt_chars, 50);
    assert_eq!(config.detector.keywords.len(), 11);
    assert_eq!(config.trigger.compression_ratio, 1.5);
    assert_eq!(config.navigation.settle_delay_ms, 1000);
    assert_eq!(config.overlay.preview_chars, 200);
    assert_eq!(config.notifications.duration_ms, 3000);
}
