//! Popup status panel.
//!
//! On open, the panel takes a one-shot health snapshot of the compression
//! service and loads the persisted counters. The manual test action sends a
//! fixed sample prompt and, on success, adds to the counters. There is no
//! polling: the status stays whatever it was when the panel opened.

pub mod store;

use std::time::Duration;

use crate::analytics::logger::{HistoryLog, Source};
use crate::api::{CompressionRequest, CompressionService, ServiceError};
use crate::config::GreenPromptConfig;
use crate::host::{Notice, NoticeKind};

use store::{Counters, StateStore};

/// Service reachability as seen when the panel opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected {
        /// Backend the service reports it will use.
        backend: String,
        methods: Vec<String>,
    },
    Disconnected {
        reason: String,
    },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Status line as shown in the panel.
    pub fn label(&self) -> String {
        match self {
            Self::Connected { backend, .. } => format!("✓ Connected ({backend})"),
            Self::Disconnected { .. } => "✗ Backend not running".to_string(),
        }
    }
}

/// What the panel shows right after opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSnapshot {
    pub status: ConnectionStatus,
    pub counters: Counters,
}

/// Result of the manual test action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Succeeded {
        tokens_saved: u64,
        /// Updated counters, or `None` when they could not be persisted.
        counters: Option<Counters>,
    },
    Failed { reason: String },
}

impl TestOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Succeeded { tokens_saved, .. } => {
                format!("Test successful! {tokens_saved} tokens saved")
            }
            Self::Failed { reason } => format!("Test failed: {reason}"),
        }
    }
}

pub struct PopupPanel {
    test_prompt: String,
    dashboard_url: String,
    compression_ratio: f64,
    notice_duration: Duration,
    history: Option<HistoryLog>,
}

impl PopupPanel {
    pub fn new(config: &GreenPromptConfig) -> Self {
        Self {
            test_prompt: config.popup.test_prompt.clone(),
            dashboard_url: config.popup.dashboard_url.clone(),
            compression_ratio: config.trigger.compression_ratio,
            notice_duration: Duration::from_millis(config.notifications.duration_ms),
            history: None,
        }
    }

    /// Record successful test compressions in `log`.
    pub fn with_history(mut self, log: HistoryLog) -> Self {
        self.history = Some(log);
        self
    }

    /// Address of the dashboard opened by the panel's second button.
    pub fn dashboard_url(&self) -> &str {
        &self.dashboard_url
    }

    /// Open the panel: one health check plus the stored counters.
    ///
    /// An unreadable store shows zero counters; the status is always
    /// reported.
    pub fn open<C, S>(&self, service: &C, store: &S) -> PopupSnapshot
    where
        C: CompressionService + ?Sized,
        S: StateStore + ?Sized,
    {
        PopupSnapshot {
            status: self.check_connection(service),
            counters: Counters::load_or_default(store),
        }
    }

    /// Issue a single health check. Any failure reads as disconnected.
    pub fn check_connection<C: CompressionService + ?Sized>(&self, service: &C) -> ConnectionStatus {
        match service.health() {
            Ok(health) => ConnectionStatus::Connected {
                backend: health.backend_name().to_string(),
                methods: health
                    .available_methods()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            Err(err) => {
                tracing::debug!(error = %err, "health check failed");
                ConnectionStatus::Disconnected {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Compress the fixed sample prompt and, on success, add one compression
    /// and the reported `tokens_saved` to the stored counters.
    ///
    /// A compression that succeeds is reported as such even when the
    /// counters cannot be written; the store error is logged.
    pub fn test_compression<C, S>(&self, service: &C, store: &mut S) -> TestOutcome
    where
        C: CompressionService + ?Sized,
        S: StateStore + ?Sized,
    {
        let request = CompressionRequest::new(self.test_prompt.clone(), Some(self.compression_ratio));

        let response = match service.compress(&request) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "test compression failed");
                return TestOutcome::Failed {
                    reason: failure_reason(&err),
                };
            }
        };

        if let Some(log) = &self.history {
            log.record(Source::Popup, &response);
        }
        let counters = match Counters::record(store, response.tokens_saved) {
            Ok(counters) => Some(counters),
            Err(err) => {
                tracing::warn!(error = %err, "failed to update counters");
                None
            }
        };

        TestOutcome::Succeeded {
            tokens_saved: response.tokens_saved,
            counters,
        }
    }

    /// Notice for a test outcome.
    pub fn notice(&self, outcome: &TestOutcome) -> Notice {
        let kind = match outcome {
            TestOutcome::Succeeded { .. } => NoticeKind::Success,
            TestOutcome::Failed { .. } => NoticeKind::Error,
        };
        Notice::new(kind, outcome.message(), self.notice_duration)
    }
}

fn failure_reason(err: &ServiceError) -> String {
    match err {
        ServiceError::Status(_) => "Compression failed".to_string(),
        other => other.to_string(),
    }
}
