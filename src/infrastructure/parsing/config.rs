//! Extraction configuration
//!
//! Centralized marker selectors, phrase lists and embedded-data paths.
//! Every list is ordered by priority; earlier entries are tried first.

use serde::{Deserialize, Serialize};

use crate::domain::constants::{embedded, keywords};

/// Main extraction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub markers: MarkerSelectors,
    pub keywords: KeywordConfig,
    pub embedded: EmbeddedDataConfig,
}

/// CSS selectors for purchase-action and sold-out markers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSelectors {
    /// Blocks announcing the product is sold out
    pub sold_out: Vec<String>,

    /// Purchase-action elements, highest priority first
    pub purchase_action: Vec<String>,

    /// Purchase-action elements recognised only by their text
    pub text_markers: Vec<TextMarker>,
}

impl Default for MarkerSelectors {
    fn default() -> Self {
        Self {
            sold_out: vec![
                "[data-test='soldOutBlock']".to_string(),
                "[data-test='outOfStockMessage']".to_string(),
                "[data-test='NonbuyableSection']".to_string(),
            ],
            purchase_action: vec![
                "[data-test='shippingButton']".to_string(),
                "[data-test='shipItButton']".to_string(),
                "[data-test='addToCartButton']".to_string(),
                "[data-test='orderPickupButton']".to_string(),
            ],
            text_markers: vec![
                TextMarker::new("button", "add to cart"),
                TextMarker::new("span", "qty 1"),
            ],
        }
    }
}

/// An element matched by selector whose text must contain a phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMarker {
    pub selector: String,
    /// Lower-case phrase
    pub contains: String,
}

impl TextMarker {
    pub fn new(selector: impl Into<String>, contains: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            contains: contains.into(),
        }
    }
}

/// Phrases for the keyword fallback and the sold-out check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub negative: Vec<String>,
    pub positive: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            negative: keywords::NEGATIVE_PHRASES.iter().map(ToString::to_string).collect(),
            positive: keywords::POSITIVE_PHRASES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Where the embedded data island lives and which fields are authoritative.
///
/// Pointers are JSON pointers (RFC 6901). Record field pointers are relative
/// to the product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedDataConfig {
    pub sentinel: String,
    pub queries_pointer: String,
    pub query_name: String,
    pub id_param: String,
    pub product_pointer: String,

    /// Future-dated release fields
    pub release_date_pointers: Vec<String>,

    /// Boolean flags; `false` means the item cannot be purchased
    pub purchasable_pointers: Vec<String>,

    /// Online fulfillment eligibility record
    pub shipping_pointer: String,
    pub status_field: String,
    pub positive_statuses: Vec<String>,
    pub order_limit_fields: Vec<String>,
}

impl Default for EmbeddedDataConfig {
    fn default() -> Self {
        Self {
            sentinel: embedded::SENTINEL_TOKEN.to_string(),
            queries_pointer: embedded::PRELOADED_QUERIES_POINTER.to_string(),
            query_name: embedded::PDP_QUERY_NAME.to_string(),
            id_param: embedded::CANONICAL_ID_PARAM.to_string(),
            product_pointer: embedded::PRODUCT_POINTER.to_string(),
            release_date_pointers: vec![
                "/item/street_date".to_string(),
                "/item/release_date".to_string(),
            ],
            purchasable_pointers: vec![
                "/purchasable".to_string(),
                "/item/purchasable".to_string(),
            ],
            shipping_pointer: "/fulfillment/shipping_options".to_string(),
            status_field: "availability_status".to_string(),
            positive_statuses: embedded::POSITIVE_SHIPPING_STATUSES
                .iter()
                .map(ToString::to_string)
                .collect(),
            order_limit_fields: vec!["order_limit".to_string(), "purchase_limit".to_string()],
        }
    }
}
