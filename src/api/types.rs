/// Wire types for the compression service.
///
/// Field names follow the service's JSON contract exactly, so these types
/// are (de)serialized without any renaming.
use serde::{Deserialize, Serialize};

/// Request body for `POST /compress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionRequest {
    pub prompt: String,
    /// Target ratio of original to compressed tokens. Omitted from the body
    /// when unset so the service falls back to its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
}

impl CompressionRequest {
    pub fn new(prompt: impl Into<String>, compression_ratio: Option<f64>) -> Self {
        Self {
            prompt: prompt.into(),
            compression_ratio,
        }
    }
}

/// Response body from `POST /compress`.
///
/// Held verbatim for display; nothing in this crate recomputes the metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResponse {
    pub original_prompt: String,
    pub compressed_prompt: String,
    pub original_tokens: u64,
    pub compressed_tokens: u64,
    pub compression_ratio: f64,
    pub tokens_saved: u64,
    pub energy_saved_kwh: f64,
    pub co2_saved_kg: f64,
}

/// Response body from `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub llmlingua_available: bool,
    /// Advertised compression methods. The service reports `null` for a
    /// method that is compiled in but unavailable, so entries are optional.
    #[serde(default)]
    pub compression_methods: Vec<Option<String>>,
}

impl HealthResponse {
    /// Human-readable name of the backend the service will use.
    pub fn backend_name(&self) -> &'static str {
        if self.llmlingua_available {
            "LLM-Lingua"
        } else {
            "Simple"
        }
    }

    /// The advertised methods with `null` entries dropped.
    pub fn available_methods(&self) -> Vec<&str> {
        self.compression_methods
            .iter()
            .filter_map(|m| m.as_deref())
            .collect()
    }
}
