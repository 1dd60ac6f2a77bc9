/// Location tracking for single-page apps.
///
/// A single-page app swaps views without reloading, so the injector's
/// initial scan goes stale. The host reports "view changed" events; the
/// observer compares the current location with the last one seen and asks
/// for a re-scan after a settle delay when it moved. Best-effort: a view
/// change that keeps the same location is not detected.
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NavigationObserver {
    last_location: String,
    settle_delay: Duration,
}

impl NavigationObserver {
    pub fn new(initial_location: impl Into<String>, settle_delay: Duration) -> Self {
        Self {
            last_location: initial_location.into(),
            settle_delay,
        }
    }

    pub fn last_location(&self) -> &str {
        &self.last_location
    }

    /// Record `location` and return the settle delay if it differs from the
    /// last location seen.
    pub fn observe(&mut self, location: &str) -> Option<Duration> {
        if location == self.last_location {
            return None;
        }
        self.last_location = location.to_string();
        Some(self.settle_delay)
    }
}
