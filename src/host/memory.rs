/// In-memory page implementing [`Host`].
///
/// Records every side effect the injector produces (triggers, notices,
/// overlay, input events, settle waits) so callers can inspect them. Pages
/// can also be loaded from a JSON description:
///
/// ```json
/// {
///   "location": "https://chat.example.com/c/1",
///   "elements": [
///     { "kind": "text_area", "placeholder": "Send a message", "value": "" },
///     { "kind": "text_input", "id": "search-box" }
///   ]
/// }
/// ```
use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{ElementId, ElementInfo, ElementKind, Host, Notice, TriggerId};
use crate::injector::overlay::OverlayView;

/// Declarative description of one element, as found in a page file.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub kind: ElementKind,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default, rename = "id")]
    pub dom_id: Option<String>,
    #[serde(default)]
    pub value: String,
}

impl ElementSpec {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            placeholder: None,
            class_name: None,
            dom_id: None,
            value: String::new(),
        }
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn class(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    pub fn id(mut self, dom_id: &str) -> Self {
        self.dom_id = Some(dom_id.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct PageSpec {
    #[serde(default)]
    location: String,
    #[serde(default)]
    elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone)]
struct PageElement {
    id: ElementId,
    spec: ElementSpec,
    trigger: Option<TriggerId>,
}

/// A trigger control as rendered on the in-memory page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerButton {
    pub element: ElementId,
    pub label: String,
    pub disabled: bool,
}

/// In-memory page.
#[derive(Debug, Default)]
pub struct MemoryPage {
    location: String,
    elements: Vec<PageElement>,
    next_element: u32,
    triggers: BTreeMap<TriggerId, TriggerButton>,
    next_trigger: u32,
    notices: Vec<Notice>,
    overlay: Option<OverlayView>,
    overlays_shown: usize,
    input_events: Vec<ElementId>,
    waits: Vec<Duration>,
}

impl MemoryPage {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            ..Self::default()
        }
    }

    /// Build a page from its JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: PageSpec = serde_json::from_str(json).context("failed to parse page description")?;
        let mut page = Self::new(&spec.location);
        for element in spec.elements {
            page.add(element);
        }
        Ok(page)
    }

    /// Append an element to the page.
    pub fn add(&mut self, spec: ElementSpec) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.elements.push(PageElement {
            id,
            spec,
            trigger: None,
        });
        id
    }

    /// Remove an element together with its trigger, as a re-render would.
    pub fn remove(&mut self, element: ElementId) {
        if let Some(pos) = self.elements.iter().position(|e| e.id == element) {
            let removed = self.elements.remove(pos);
            if let Some(trigger) = removed.trigger {
                self.triggers.remove(&trigger);
            }
        }
    }

    /// Simulate the user typing: replaces the value without an input event.
    pub fn type_text(&mut self, element: ElementId, text: &str) {
        if let Some(e) = self.element_mut(element) {
            e.spec.value = text.to_string();
        }
    }

    /// Change the virtual location, as a single-page app route change would.
    pub fn navigate(&mut self, location: &str) {
        self.location = location.to_string();
    }

    pub fn trigger_for(&self, element: ElementId) -> Option<TriggerId> {
        self.elements
            .iter()
            .find(|e| e.id == element)
            .and_then(|e| e.trigger)
    }

    pub fn trigger(&self, trigger: TriggerId) -> Option<&TriggerButton> {
        self.triggers.get(&trigger)
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn overlay(&self) -> Option<&OverlayView> {
        self.overlay.as_ref()
    }

    /// How many times an overlay has been shown.
    pub fn overlays_shown(&self) -> usize {
        self.overlays_shown
    }

    pub fn input_events(&self) -> &[ElementId] {
        &self.input_events
    }

    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    fn element(&self, element: ElementId) -> Option<&PageElement> {
        self.elements.iter().find(|e| e.id == element)
    }

    fn element_mut(&mut self, element: ElementId) -> Option<&mut PageElement> {
        self.elements.iter_mut().find(|e| e.id == element)
    }
}

impl Host for MemoryPage {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn candidate_inputs(&self) -> Vec<ElementInfo> {
        self.elements
            .iter()
            .map(|e| ElementInfo {
                id: e.id,
                kind: e.spec.kind,
                placeholder: e.spec.placeholder.clone(),
                class_name: e.spec.class_name.clone(),
                dom_id: e.spec.dom_id.clone(),
            })
            .collect()
    }

    fn has_trigger(&self, element: ElementId) -> bool {
        self.element(element).is_some_and(|e| e.trigger.is_some())
    }

    fn insert_trigger_after(&mut self, element: ElementId, label: &str) -> TriggerId {
        let trigger = TriggerId(self.next_trigger);
        self.next_trigger += 1;
        if let Some(e) = self.element_mut(element) {
            e.trigger = Some(trigger);
        }
        self.triggers.insert(
            trigger,
            TriggerButton {
                element,
                label: label.to_string(),
                disabled: false,
            },
        );
        trigger
    }

    fn set_trigger(&mut self, trigger: TriggerId, label: &str, disabled: bool) {
        if let Some(button) = self.triggers.get_mut(&trigger) {
            button.label = label.to_string();
            button.disabled = disabled;
        }
    }

    fn value(&self, element: ElementId) -> Option<String> {
        self.element(element).map(|e| e.spec.value.clone())
    }

    fn set_value(&mut self, element: ElementId, value: &str) {
        if let Some(e) = self.element_mut(element) {
            e.spec.value = value.to_string();
        }
    }

    fn dispatch_input(&mut self, element: ElementId) {
        self.input_events.push(element);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn show_overlay(&mut self, view: &OverlayView) {
        self.overlay = Some(view.clone());
        self.overlays_shown += 1;
    }

    fn close_overlay(&mut self) {
        self.overlay = None;
    }

    fn wait(&mut self, delay: Duration) {
        self.waits.push(delay);
    }
}
