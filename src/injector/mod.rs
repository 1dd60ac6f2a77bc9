//! Content-script injector.
//!
//! Ties the pieces of the page-side flow together:
//!
//! 1. [`detector`] finds prompt-like inputs and attaches a trigger to each.
//! 2. [`navigation`] re-runs detection after single-page-app route changes.
//! 3. [`trigger`] runs the per-element request lifecycle on click.
//! 4. [`overlay`] shows the result and handles its exits.
//!
//! The injector is driven by host events: [`ContentInjector::start`] on page
//! load, [`ContentInjector::on_view_changed`] on document mutations, and
//! [`ContentInjector::click`] / [`ContentInjector::overlay_action`] on user
//! input. A click can also be split into [`ContentInjector::begin`] and
//! [`ContentInjector::finish`] when the host completes requests
//! asynchronously; requests from different triggers may then interleave.

pub mod detector;
pub mod navigation;
pub mod overlay;
pub mod trigger;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::analytics::logger::{HistoryLog, Source};
use crate::api::{CompressionResponse, CompressionService, ServiceError};
use crate::config::GreenPromptConfig;
use crate::host::{Host, Notice, NoticeKind, TriggerId};

use detector::{Decorated, PromptDetector};
use navigation::NavigationObserver;
use overlay::{OverlayAction, OverlayView};
use trigger::{Begin, InputError, PendingRequest, TriggerControl, TriggerState};

/// Notice shown when the service call fails.
pub const FAILURE_MESSAGE: &str =
    "Failed to compress prompt. Make sure the backend server is running.";

/// Final result of a click.
#[derive(Debug)]
pub enum ClickOutcome {
    /// Unknown trigger, or the trigger was already requesting.
    Ignored,
    /// Validation refused the text; no request was made.
    Rejected(InputError),
    /// The element now holds the compressed prompt.
    Compressed(CompressionResponse),
    /// The request failed; the element is unchanged.
    Failed(ServiceError),
}

/// Result of [`ContentInjector::begin`].
#[derive(Debug)]
pub enum Started {
    Ignored,
    Rejected(InputError),
    Pending(PendingRequest),
}

pub struct ContentInjector {
    config: GreenPromptConfig,
    detector: PromptDetector,
    observer: Option<NavigationObserver>,
    triggers: BTreeMap<TriggerId, TriggerControl>,
    overlay: Option<OverlayView>,
    history: Option<HistoryLog>,
}

impl ContentInjector {
    pub fn new(config: GreenPromptConfig) -> Self {
        Self {
            detector: PromptDetector::from_config(&config.detector),
            config,
            observer: None,
            triggers: BTreeMap::new(),
            overlay: None,
            history: None,
        }
    }

    /// Record successful compressions in `log`.
    pub fn with_history(mut self, log: HistoryLog) -> Self {
        self.history = Some(log);
        self
    }

    pub fn detector(&self) -> &PromptDetector {
        &self.detector
    }

    /// State of a trigger this injector attached.
    pub fn trigger_state(&self, trigger: TriggerId) -> Option<TriggerState> {
        self.triggers.get(&trigger).map(TriggerControl::state)
    }

    /// The overlay currently tracked as open.
    pub fn overlay(&self) -> Option<&OverlayView> {
        self.overlay.as_ref()
    }

    /// Page is ready: remember its location and decorate prompt inputs.
    pub fn start<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<Decorated> {
        self.observer = Some(NavigationObserver::new(
            host.location(),
            Duration::from_millis(self.config.navigation.settle_delay_ms),
        ));
        self.rescan(host)
    }

    /// Drop controls whose element is gone, then run the detector and adopt
    /// any triggers it attached.
    pub fn rescan<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<Decorated> {
        let before = self.triggers.len();
        self.triggers
            .retain(|_, control| host.value(control.element()).is_some());
        if self.triggers.len() < before {
            tracing::debug!(pruned = before - self.triggers.len(), "dropped detached triggers");
        }

        let decorated = self.detector.scan(host, &self.config.trigger.idle_label);
        for d in &decorated {
            self.triggers
                .insert(d.trigger, TriggerControl::new(d.trigger, d.element));
        }
        decorated
    }

    /// The document changed. If the location moved, wait for the new view
    /// to settle and re-scan. Returns the triggers attached by the re-scan,
    /// or `None` when the location is unchanged.
    pub fn on_view_changed<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<Vec<Decorated>> {
        let location = host.location();
        let observer = self.observer.get_or_insert_with(|| {
            NavigationObserver::new(
                location.clone(),
                Duration::from_millis(self.config.navigation.settle_delay_ms),
            )
        });
        let delay = observer.observe(&location)?;

        tracing::debug!(%location, "view changed, re-scanning");
        host.wait(delay);
        Some(self.rescan(host))
    }

    /// Click a trigger and run the request to completion.
    pub fn click<H, S>(&mut self, host: &mut H, service: &S, trigger: TriggerId) -> ClickOutcome
    where
        H: Host + ?Sized,
        S: CompressionService + ?Sized,
    {
        match self.begin(host, trigger) {
            Started::Ignored => ClickOutcome::Ignored,
            Started::Rejected(err) => ClickOutcome::Rejected(err),
            Started::Pending(pending) => {
                let result = service.compress(&pending.request);
                self.finish(host, pending, result)
            }
        }
    }

    /// First half of a click: validate and enter `Requesting`.
    ///
    /// Refusals are reported to the user here with the matching notice.
    pub fn begin<H: Host + ?Sized>(&mut self, host: &mut H, trigger: TriggerId) -> Started {
        let Some(control) = self.triggers.get_mut(&trigger) else {
            return Started::Ignored;
        };

        match control.begin(host, &self.config.trigger, self.config.detector.min_prompt_chars) {
            Begin::Busy => Started::Ignored,
            Begin::Rejected(err) => {
                host.notify(self.notice(err.notice_kind(), err.to_string()));
                Started::Rejected(err)
            }
            Begin::Started(pending) => Started::Pending(pending),
        }
    }

    /// Second half of a click: apply the service result and return the
    /// trigger to `Idle`.
    pub fn finish<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        pending: PendingRequest,
        result: Result<CompressionResponse, ServiceError>,
    ) -> ClickOutcome {
        let outcome = match result {
            Ok(response) => {
                self.apply_success(host, &pending, &response);
                ClickOutcome::Compressed(response)
            }
            Err(err) => {
                tracing::warn!(trigger = pending.trigger.0, error = %err, "compression error");
                host.notify(self.notice(NoticeKind::Error, FAILURE_MESSAGE));
                ClickOutcome::Failed(err)
            }
        };

        if let Some(control) = self.triggers.get_mut(&pending.trigger) {
            control.finish(host, &self.config.trigger);
        }

        outcome
    }

    fn apply_success<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        pending: &PendingRequest,
        response: &CompressionResponse,
    ) {
        let view = OverlayView::new(
            pending.element,
            &pending.original,
            response,
            self.config.overlay.preview_chars,
        );
        host.show_overlay(&view);
        self.overlay = Some(view);

        host.set_value(pending.element, &response.compressed_prompt);
        host.dispatch_input(pending.element);

        if let Some(log) = &self.history {
            log.record(Source::Page, response);
        }
    }

    /// Dismiss the overlay through one of its exits.
    ///
    /// `KeepOriginal` writes the original prompt back into the element the
    /// compression was applied to, provided it still holds the compressed
    /// text (an edit made since then is left alone). Returns `true` when the
    /// original was restored.
    pub fn overlay_action<H: Host + ?Sized>(&mut self, host: &mut H, action: OverlayAction) -> bool {
        let Some(view) = self.overlay.take() else {
            return false;
        };

        let mut restored = false;
        if action == OverlayAction::KeepOriginal
            && host.value(view.element).as_deref() == Some(view.compressed.as_str())
        {
            host.set_value(view.element, &view.original);
            host.dispatch_input(view.element);
            restored = true;
        }

        host.close_overlay();
        restored
    }

    fn notice(&self, kind: NoticeKind, message: impl Into<String>) -> Notice {
        Notice::new(
            kind,
            message,
            Duration::from_millis(self.config.notifications.duration_ms),
        )
    }
}
