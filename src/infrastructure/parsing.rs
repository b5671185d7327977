//! Availability signal extraction
//!
//! Three independent extractors read the same parsed page and each report
//! a verdict with a fixed confidence rank:
//! - [`EmbeddedDataExtractor`]: authoritative data island inside the page
//! - [`StructuralMarkerExtractor`]: known purchase-action markers
//! - [`KeywordFallbackExtractor`]: phrases in the rendered text
//!
//! Extractors never fail outward. Internal errors become UNKNOWN verdicts.

pub mod config;
pub mod context;
pub mod data_island;
pub mod embedded;
pub mod error;
pub mod keyword;
pub mod structural;

pub use config::{EmbeddedDataConfig, ExtractionConfig, KeywordConfig, MarkerSelectors, TextMarker};
pub use context::PageContext;
pub use data_island::DataIslandDecoder;
pub use embedded::EmbeddedDataExtractor;
pub use error::{ExtractionError, ExtractionResult};
pub use keyword::KeywordFallbackExtractor;
pub use structural::StructuralMarkerExtractor;

use scraper::{ElementRef, Node, Selector};
use tracing::{debug, warn};

use crate::domain::{AvailabilityVerdict, Confidence, ExtractorResult};

/// One availability extraction strategy
pub trait SignalExtractor: Send + Sync {
    /// Fixed rank used when extractors disagree
    fn confidence(&self) -> Confidence;

    /// Evaluate the page; errors mean "inconclusive"
    fn evaluate(&self, page: &PageContext<'_>) -> ExtractionResult<AvailabilityVerdict>;

    /// Evaluate the page, folding errors into an UNKNOWN verdict
    fn extract(&self, page: &PageContext<'_>) -> ExtractorResult {
        let verdict = self.evaluate(page).unwrap_or_else(|e| {
            debug!("{} extractor inconclusive: {}", self.confidence(), e);
            AvailabilityVerdict::unknown(e.to_string())
        });
        ExtractorResult::new(verdict, self.confidence())
    }
}

/// Compile selector strings, skipping the invalid ones
pub(crate) fn compile_selectors(selector_strings: &[String]) -> ExtractionResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ExtractionError::InvalidSelector {
            selector: selector_strings.join(", "),
            reason: errors.join(", "),
        });
    }

    Ok(selectors)
}

/// Elements whose text is never rendered
const NON_RENDERED: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible text of an element, lower-cased with whitespace collapsed
pub(crate) fn rendered_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();

    for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| NON_RENDERED.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    normalize_text(&raw)
}

/// Lower-case and collapse runs of whitespace to a single space
pub(crate) fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First phrase from `phrases` found in already-normalized `text`
pub(crate) fn find_phrase<'p>(text: &str, phrases: &'p [String]) -> Option<&'p str> {
    phrases
        .iter()
        .map(String::as_str)
        .find(|phrase| !phrase.is_empty() && text.contains(&normalize_text(phrase)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn rendered_text_skips_scripts_and_styles() {
        let html = Html::parse_document(
            "<html><head><style>.a{}</style></head><body><p>Add   to\nCart</p>\
             <script>var s = 'Sold out';</script></body></html>",
        );
        let text = rendered_text(html.root_element());
        assert_eq!(text, "add to cart");
    }

    #[test]
    fn invalid_selectors_are_skipped_when_others_compile() {
        let selectors = compile_selectors(&["[[bad".to_string(), "button".to_string()]).unwrap();
        assert_eq!(selectors.len(), 1);
        assert!(compile_selectors(&["[[bad".to_string()]).is_err());
    }

    #[test]
    fn find_phrase_normalizes_configured_phrases() {
        let phrases = vec!["Out  of Stock".to_string()];
        assert_eq!(find_phrase("item is out of stock today", &phrases), Some("Out  of Stock"));
        assert_eq!(find_phrase("in stock", &phrases), None);
    }
}
