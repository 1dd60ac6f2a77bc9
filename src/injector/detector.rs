/// Prompt-input detection.
///
/// An element qualifies as a prompt input when its placeholder, class name
/// or id contains any configured keyword (case-insensitive substring). There
/// is no exclusion list: a search box with "ask" in its placeholder will be
/// decorated too.
use crate::config::schema::DetectorConfig;
use crate::host::{ElementId, ElementInfo, Host, TriggerId};

/// A trigger attached during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decorated {
    pub element: ElementId,
    pub trigger: TriggerId,
}

/// Keyword-based prompt-input classifier.
#[derive(Debug, Clone)]
pub struct PromptDetector {
    keywords: Vec<String>,
}

impl PromptDetector {
    /// Build a detector from a keyword list. Keywords are lower-cased and
    /// empty entries dropped (an empty keyword would match everything).
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(&config.keywords)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether the element looks like somewhere a user types a prompt.
    pub fn is_prompt_input(&self, element: &ElementInfo) -> bool {
        self.matched_keyword(element).is_some()
    }

    /// The first keyword found in the element's placeholder, class or id.
    pub fn matched_keyword(&self, element: &ElementInfo) -> Option<&str> {
        let attributes: Vec<String> = [
            element.placeholder.as_deref(),
            element.class_name.as_deref(),
            element.dom_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();

        self.keywords
            .iter()
            .find(|keyword| attributes.iter().any(|attr| attr.contains(keyword.as_str())))
            .map(String::as_str)
    }

    /// Attach one trigger to every undecorated prompt input on the page.
    ///
    /// Elements that already carry a trigger are skipped, so repeated scans
    /// never stack a second control on the same input.
    pub fn scan<H: Host + ?Sized>(&self, host: &mut H, label: &str) -> Vec<Decorated> {
        let mut decorated = Vec::new();
        for element in host.candidate_inputs() {
            if !self.is_prompt_input(&element) || host.has_trigger(element.id) {
                continue;
            }
            let trigger = host.insert_trigger_after(element.id, label);
            decorated.push(Decorated {
                element: element.id,
                trigger,
            });
        }
        tracing::debug!(attached = decorated.len(), "prompt input scan finished");
        decorated
    }
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}
