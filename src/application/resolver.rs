//! Availability resolver
//!
//! Runs every extractor against one parsed page and folds their results
//! into a single verdict. The highest-confidence definitive verdict wins.

use scraper::Html;
use tracing::debug;

use crate::domain::{AvailabilityVerdict, CanonicalId, ExtractorResult};
use crate::infrastructure::RawDocument;
use crate::infrastructure::parsing::{
    EmbeddedDataExtractor, ExtractionConfig, ExtractionResult, KeywordFallbackExtractor,
    PageContext, SignalExtractor, StructuralMarkerExtractor,
};

/// Merge extractor results: first non-UNKNOWN in descending confidence wins
#[must_use]
pub fn merge_verdicts(results: &[ExtractorResult]) -> AvailabilityVerdict {
    let mut ranked: Vec<&ExtractorResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    ranked
        .into_iter()
        .find(|result| result.verdict.is_definitive())
        .map_or_else(
            || AvailabilityVerdict::unknown("every extractor was inconclusive"),
            |result| {
                let reason = result.verdict.reason.as_deref().unwrap_or("no reason given");
                AvailabilityVerdict {
                    availability: result.verdict.availability,
                    reason: Some(format!("{}: {reason}", result.confidence)),
                }
            },
        )
}

/// Ordered extractor cascade
pub struct AvailabilityResolver {
    extractors: Vec<Box<dyn SignalExtractor>>,
}

impl AvailabilityResolver {
    /// Resolver over the given extractors, ordered by confidence
    #[must_use]
    pub fn new(mut extractors: Vec<Box<dyn SignalExtractor>>) -> Self {
        extractors.sort_by(|a, b| b.confidence().cmp(&a.confidence()));
        Self { extractors }
    }

    /// The standard three-layer cascade
    pub fn from_config(config: &ExtractionConfig) -> ExtractionResult<Self> {
        Ok(Self::new(vec![
            Box::new(EmbeddedDataExtractor::with_config(config.embedded.clone())?),
            Box::new(StructuralMarkerExtractor::with_config(
                &config.markers,
                &config.keywords,
            )?),
            Box::new(KeywordFallbackExtractor::with_config(config.keywords.clone())),
        ]))
    }

    pub fn with_defaults() -> ExtractionResult<Self> {
        Self::from_config(&ExtractionConfig::default())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Results of every extractor, highest confidence first
    #[must_use]
    pub fn evaluate(&self, page: &PageContext<'_>) -> Vec<ExtractorResult> {
        self.extractors
            .iter()
            .map(|extractor| extractor.extract(page))
            .collect()
    }

    /// Resolve an already-parsed page
    #[must_use]
    pub fn resolve_page(&self, page: &PageContext<'_>) -> AvailabilityVerdict {
        let results = self.evaluate(page);
        for result in &results {
            debug!("{} -> {}", result.confidence, result.verdict);
        }
        merge_verdicts(&results)
    }

    /// Parse a fetched document and resolve it
    #[must_use]
    pub fn resolve(
        &self,
        document: &RawDocument,
        canonical_id: Option<&CanonicalId>,
    ) -> AvailabilityVerdict {
        let html = Html::parse_document(&document.body);
        let page = PageContext::new(&html, canonical_id, document.fetched_at);
        self.resolve_page(&page)
    }
}
