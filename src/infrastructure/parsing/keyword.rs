//! Keyword fallback extractor
//!
//! Last resort when neither the data island nor the markers are conclusive.
//! Negative phrases are checked first, so a page saying both "sold out" and
//! "add to cart" is reported UNAVAILABLE.

use super::config::KeywordConfig;
use super::context::PageContext;
use super::error::ExtractionResult;
use super::{SignalExtractor, find_phrase, rendered_text};
use crate::domain::{AvailabilityVerdict, Confidence};

#[derive(Debug, Clone, Default)]
pub struct KeywordFallbackExtractor {
    keywords: KeywordConfig,
}

impl KeywordFallbackExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_config(keywords: KeywordConfig) -> Self {
        Self { keywords }
    }

    /// Judge already-normalized page text
    #[must_use]
    pub fn judge_text(&self, text: &str) -> AvailabilityVerdict {
        if let Some(phrase) = find_phrase(text, &self.keywords.negative) {
            return AvailabilityVerdict::unavailable(format!("page text says '{phrase}'"));
        }
        if let Some(phrase) = find_phrase(text, &self.keywords.positive) {
            return AvailabilityVerdict::available(format!("page text says '{phrase}'"));
        }
        AvailabilityVerdict::unknown("no stock phrases in page text")
    }
}

impl SignalExtractor for KeywordFallbackExtractor {
    fn confidence(&self) -> Confidence {
        Confidence::KeywordFallback
    }

    fn evaluate(&self, page: &PageContext<'_>) -> ExtractionResult<AvailabilityVerdict> {
        Ok(self.judge_text(&rendered_text(page.html.root_element())))
    }
}
