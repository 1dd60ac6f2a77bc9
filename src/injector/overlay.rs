/// Results overlay shown after a successful compression.
///
/// The view holds everything the overlay displays: previews of both
/// prompts and the service-reported metrics, passed through verbatim.
use crate::api::CompressionResponse;
use crate::host::ElementId;

/// Ways the user can dismiss the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    /// The close button.
    Close,
    /// A click on the backdrop outside the modal.
    OutsideClick,
    /// Put the original prompt back into the element.
    KeepOriginal,
    /// Accept the compressed prompt (already in place).
    UseCompressed,
}

/// Renderable content of the results overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    /// Element the compressed text was written into.
    pub element: ElementId,
    pub original: String,
    pub compressed: String,
    pub original_preview: String,
    pub compressed_preview: String,
    pub original_tokens: u64,
    pub compressed_tokens: u64,
    pub tokens_saved: u64,
    pub compression_ratio: f64,
    pub energy_saved_kwh: f64,
    pub co2_saved_kg: f64,
}

impl OverlayView {
    pub fn new(
        element: ElementId,
        original: &str,
        response: &CompressionResponse,
        preview_chars: usize,
    ) -> Self {
        Self {
            element,
            original: original.to_string(),
            compressed: response.compressed_prompt.clone(),
            original_preview: preview(original, preview_chars),
            compressed_preview: preview(&response.compressed_prompt, preview_chars),
            original_tokens: response.original_tokens,
            compressed_tokens: response.compressed_tokens,
            tokens_saved: response.tokens_saved,
            compression_ratio: response.compression_ratio,
            energy_saved_kwh: response.energy_saved_kwh,
            co2_saved_kg: response.co2_saved_kg,
        }
    }

    /// Label/value pairs for the metrics block, in display order.
    pub fn metrics(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Compression Ratio", format!("{}x", self.compression_ratio)),
            ("Tokens Saved", self.tokens_saved.to_string()),
            ("Energy Saved", format!("{:.6} kWh", self.energy_saved_kwh)),
            ("CO₂ Saved", format!("{:.6} kg", self.co2_saved_kg)),
        ]
    }

    pub fn original_heading(&self) -> String {
        format!("Original ({} tokens)", self.original_tokens)
    }

    pub fn compressed_heading(&self) -> String {
        format!("Compressed ({} tokens)", self.compressed_tokens)
    }
}

/// Cut `text` to `max_chars` characters, appending `...` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> CompressionResponse {
        CompressionResponse {
            original_prompt: "original".to_string(),
            compressed_prompt: "short".to_string(),
            original_tokens: 100,
            compressed_tokens: 70,
            compression_ratio: 1.43,
            tokens_saved: 30,
            energy_saved_kwh: 0.009,
            co2_saved_kg: 0.004275,
        }
    }

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("abc", 3), "abc");
        assert_eq!(preview("", 3), "");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
    }

    #[test]
    fn metrics_are_rendered_verbatim() {
        let view = OverlayView::new(ElementId(1), "original", &response(), 200);
        let metrics = view.metrics();
        assert_eq!(metrics[0], ("Compression Ratio", "1.43x".to_string()));
        assert_eq!(metrics[1], ("Tokens Saved", "30".to_string()));
        assert_eq!(metrics[2], ("Energy Saved", "0.009000 kWh".to_string()));
        assert_eq!(metrics[3], ("CO₂ Saved", "0.004275 kg".to_string()));
        assert_eq!(view.original_heading(), "Original (100 tokens)");
        assert_eq!(view.compressed_heading(), "Compressed (70 tokens)");
    }

    #[test]
    fn view_keeps_full_text_alongside_previews() {
        let original = "o".repeat(250);
        let view = OverlayView::new(ElementId(1), &original, &response(), 200);
        assert_eq!(view.original.len(), 250);
        assert_eq!(view.original_preview.len(), 203);
        assert_eq!(view.compressed_preview, "short");
    }
}
