/// Per-element compression trigger.
///
/// Each trigger runs its own `Idle → Requesting → Idle` cycle. While
/// requesting, the control is disabled and shows the busy label, so the same
/// trigger cannot start a second request; other triggers are unaffected.
/// There is no cancellation: a request that never completes leaves its
/// trigger busy.
use thiserror::Error;

use crate::api::CompressionRequest;
use crate::config::schema::TriggerConfig;
use crate::host::{ElementId, Host, NoticeKind, TriggerId};

/// Why a click was refused before any request was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter a prompt first")]
    Empty,
    #[error("Prompt is too short to benefit from compression")]
    TooShort { len: usize, min: usize },
}

impl InputError {
    /// Severity of the notice shown for this refusal.
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::Empty => NoticeKind::Warning,
            Self::TooShort { .. } => NoticeKind::Info,
        }
    }
}

/// Trim `text` and check it is long enough to be worth compressing.
///
/// Length is counted in characters, not bytes.
pub fn validate(text: &str, min_chars: usize) -> Result<&str, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let len = trimmed.chars().count();
    if len < min_chars {
        return Err(InputError::TooShort {
            len,
            min: min_chars,
        });
    }
    Ok(trimmed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Requesting,
}

/// A request that has been started but not yet completed.
///
/// Carries the element handle captured at click time, so the result lands
/// on the element that was clicked even if the page changed meanwhile.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub trigger: TriggerId,
    pub element: ElementId,
    pub original: String,
    pub request: CompressionRequest,
}

/// Result of clicking a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Begin {
    /// The trigger is already requesting; the click is dropped.
    Busy,
    /// The input failed validation; the trigger stays idle.
    Rejected(InputError),
    /// The trigger is now requesting.
    Started(PendingRequest),
}

/// One trigger control bound to one input element.
#[derive(Debug, Clone)]
pub struct TriggerControl {
    id: TriggerId,
    element: ElementId,
    state: TriggerState,
}

impl TriggerControl {
    pub fn new(id: TriggerId, element: ElementId) -> Self {
        Self {
            id,
            element,
            state: TriggerState::Idle,
        }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Handle a click: validate the bound text and, if acceptable, enter
    /// `Requesting` (disable the control and show the busy label).
    pub fn begin<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        config: &TriggerConfig,
        min_chars: usize,
    ) -> Begin {
        if self.state == TriggerState::Requesting {
            return Begin::Busy;
        }

        let text = host.value(self.element).unwrap_or_default();
        let prompt = match validate(&text, min_chars) {
            Ok(prompt) => prompt.to_string(),
            Err(err) => return Begin::Rejected(err),
        };

        self.state = TriggerState::Requesting;
        host.set_trigger(self.id, &config.busy_label, true);

        Begin::Started(PendingRequest {
            trigger: self.id,
            element: self.element,
            original: prompt.clone(),
            request: CompressionRequest::new(prompt, Some(config.compression_ratio)),
        })
    }

    /// Return to `Idle`: re-enable the control and restore its label.
    pub fn finish<H: Host + ?Sized>(&mut self, host: &mut H, config: &TriggerConfig) {
        self.state = TriggerState::Idle;
        host.set_trigger(self.id, &config.idle_label, false);
    }
}
