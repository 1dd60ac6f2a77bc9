//! Host-environment abstraction for the content injector.
//!
//! The injector never touches a concrete DOM. Everything it needs from the
//! page (candidate inputs, trigger controls, values, notices, the overlay
//! and the current location) goes through the [`Host`] trait. A browser
//! binding implements it over the real document; [`memory::MemoryPage`]
//! implements it in memory for tests and the `scan` command.

pub mod memory;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::injector::overlay::OverlayView;

/// Stable handle to an input element on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to an injected trigger control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

/// The two element kinds the injector considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A multi-line `textarea`.
    TextArea,
    /// A single-line `input type="text"`.
    TextInput,
}

/// The attributes the detector inspects on a candidate element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub id: ElementId,
    pub kind: ElementKind,
    pub placeholder: Option<String>,
    pub class_name: Option<String>,
    pub dom_id: Option<String>,
}

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// A dismissible, self-expiring message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            duration,
        }
    }
}

/// The page, as seen by the injector.
///
/// Methods taking an unknown handle are no-ops (or return `None`/`false`);
/// elements may disappear between a scan and a click.
pub trait Host {
    /// Current (possibly virtual) location of the page.
    fn location(&self) -> String;

    /// Every `textarea` and single-line text input currently in the page.
    fn candidate_inputs(&self) -> Vec<ElementInfo>;

    /// Whether a trigger control already sits next to `element`.
    fn has_trigger(&self, element: ElementId) -> bool;

    /// Insert a trigger control immediately after `element`.
    fn insert_trigger_after(&mut self, element: ElementId, label: &str) -> TriggerId;

    /// Update a trigger's label and enabled state.
    fn set_trigger(&mut self, trigger: TriggerId, label: &str, disabled: bool);

    /// Current text of `element`.
    fn value(&self, element: ElementId) -> Option<String>;

    /// Replace the text of `element`.
    fn set_value(&mut self, element: ElementId, value: &str);

    /// Fire a bubbling input-changed notification on `element` so any
    /// framework bound to it re-renders.
    fn dispatch_input(&mut self, element: ElementId);

    /// Show a transient notice.
    fn notify(&mut self, notice: Notice);

    /// Show the results overlay.
    fn show_overlay(&mut self, view: &OverlayView);

    /// Remove the results overlay, if shown.
    fn close_overlay(&mut self);

    /// Let the page settle for `delay` before continuing.
    fn wait(&mut self, delay: Duration);
}
