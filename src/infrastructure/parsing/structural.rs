//! Structural-marker extractor
//!
//! Looks for known purchase-action markers in the document tree.
//! A sold-out block carrying negative stock text short-circuits to
//! UNAVAILABLE before any purchase button is considered.

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::config::{MarkerSelectors, KeywordConfig};
use super::context::PageContext;
use super::error::ExtractionResult;
use super::{SignalExtractor, compile_selectors, find_phrase, normalize_text, rendered_text};
use crate::domain::{AvailabilityVerdict, Confidence};

struct CompiledTextMarker {
    selector: Selector,
    contains: String,
}

pub struct StructuralMarkerExtractor {
    sold_out_selectors: Vec<Selector>,
    purchase_selectors: Vec<Selector>,
    text_markers: Vec<CompiledTextMarker>,
    negative_phrases: Vec<String>,
}

impl StructuralMarkerExtractor {
    pub fn new() -> ExtractionResult<Self> {
        Self::with_config(&MarkerSelectors::default(), &KeywordConfig::default())
    }

    pub fn with_config(markers: &MarkerSelectors, keywords: &KeywordConfig) -> ExtractionResult<Self> {
        let mut text_markers = Vec::new();
        for marker in &markers.text_markers {
            if let Some(selector) = compile_selectors(std::slice::from_ref(&marker.selector))?.pop() {
                text_markers.push(CompiledTextMarker {
                    selector,
                    contains: normalize_text(&marker.contains),
                });
            }
        }

        Ok(Self {
            sold_out_selectors: compile_selectors(&markers.sold_out)?,
            purchase_selectors: compile_selectors(&markers.purchase_action)?,
            text_markers,
            negative_phrases: keywords.negative.clone(),
        })
    }

    fn sold_out(&self, page: &PageContext<'_>) -> Option<AvailabilityVerdict> {
        for (priority, selector) in self.sold_out_selectors.iter().enumerate() {
            for block in page.html.select(selector) {
                let text = rendered_text(block);
                if let Some(phrase) = find_phrase(&text, &self.negative_phrases) {
                    debug!("Sold-out marker {} carries '{}'", priority, phrase);
                    return Some(AvailabilityVerdict::unavailable(format!(
                        "sold-out marker says '{phrase}'"
                    )));
                }
            }
        }
        None
    }

    fn purchase_action(&self, page: &PageContext<'_>) -> Option<AvailabilityVerdict> {
        for (priority, selector) in self.purchase_selectors.iter().enumerate() {
            if page.html.select(selector).any(|el| !is_disabled(el)) {
                debug!("Purchase-action marker {} is active", priority);
                return Some(AvailabilityVerdict::available(format!(
                    "active purchase-action marker #{priority}"
                )));
            }
        }

        for marker in &self.text_markers {
            let active = page
                .html
                .select(&marker.selector)
                .any(|el| !is_disabled(el) && rendered_text(el).contains(&marker.contains));
            if active {
                return Some(AvailabilityVerdict::available(format!(
                    "active '{}' element",
                    marker.contains
                )));
            }
        }

        None
    }
}

/// `disabled` attribute, `aria-disabled="true"`, or inside a disabled fieldset
fn is_disabled(element: ElementRef<'_>) -> bool {
    let flagged = |el: ElementRef<'_>| {
        el.value().attr("disabled").is_some()
            || el
                .value()
                .attr("aria-disabled")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    };

    flagged(element)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().name() == "fieldset" && el.value().attr("disabled").is_some())
}

impl SignalExtractor for StructuralMarkerExtractor {
    fn confidence(&self) -> Confidence {
        Confidence::StructuralMarker
    }

    fn evaluate(&self, page: &PageContext<'_>) -> ExtractionResult<AvailabilityVerdict> {
        Ok(self
            .sold_out(page)
            .or_else(|| self.purchase_action(page))
            .unwrap_or_else(|| AvailabilityVerdict::unknown("no purchase-action marker")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Availability;
    use chrono::Utc;
    use scraper::Html;

    fn judge(body: &str) -> Availability {
        let html = Html::parse_document(&format!("<html><body>{body}</body></html>"));
        let page = PageContext::new(&html, None, Utc::now());
        StructuralMarkerExtractor::new()
            .unwrap()
            .extract(&page)
            .availability()
    }

    #[test]
    fn sold_out_block_beats_a_stray_purchase_button() {
        let body = r#"
            <button data-test="shippingButton">Ship it</button>
            <div data-test="soldOutBlock"><p>Sold out</p><p>Check back later</p></div>
        "#;
        assert_eq!(judge(body), Availability::Unavailable);
    }

    #[test]
    fn sold_out_block_without_negative_text_is_ignored() {
        let body = r#"
            <div data-test="soldOutBlock"></div>
            <button data-test="shippingButton">Ship it</button>
        "#;
        assert_eq!(judge(body), Availability::Available);
    }

    #[test]
    fn active_purchase_button_is_available() {
        assert_eq!(
            judge(r#"<button data-test="addToCartButton">Add to cart</button>"#),
            Availability::Available
        );
    }

    #[test]
    fn disabled_buttons_do_not_count() {
        let body = r#"
            <button data-test="shippingButton" disabled>Ship it</button>
            <button data-test="addToCartButton" aria-disabled="true">Add to cart</button>
            <fieldset disabled><button data-test="orderPickupButton">Pick it up</button></fieldset>
        "#;
        assert_eq!(judge(body), Availability::Unknown);
    }

    #[test]
    fn text_markers_catch_unlabelled_buttons() {
        assert_eq!(judge("<button>Add to cart</button>"), Availability::Available);
        assert_eq!(judge("<span>Qty 1</span>"), Availability::Available);
        assert_eq!(judge("<p>Nothing here</p>"), Availability::Unknown);
    }
}
