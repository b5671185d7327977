//! Embedded-data extractor
//!
//! Reads the product record out of the page's data island and applies the
//! authoritative gates in order: release date, purchasability flag, online
//! fulfillment eligibility. Highest confidence of all extractors.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::debug;

use super::config::EmbeddedDataConfig;
use super::context::PageContext;
use super::data_island::DataIslandDecoder;
use super::error::{ExtractionError, ExtractionResult};
use super::SignalExtractor;
use crate::domain::{AvailabilityVerdict, CanonicalId, Confidence};

pub struct EmbeddedDataExtractor {
    decoder: DataIslandDecoder,
    config: EmbeddedDataConfig,
}

impl EmbeddedDataExtractor {
    pub fn new() -> ExtractionResult<Self> {
        Self::with_config(EmbeddedDataConfig::default())
    }

    pub fn with_config(config: EmbeddedDataConfig) -> ExtractionResult<Self> {
        Ok(Self {
            decoder: DataIslandDecoder::new(config.sentinel.clone())?,
            config,
        })
    }

    /// Locate the product record for `id` among the preloaded queries
    pub fn find_product_record<'v>(
        &self,
        data: &'v Value,
        id: &CanonicalId,
    ) -> ExtractionResult<&'v Value> {
        let queries = data
            .pointer(&self.config.queries_pointer)
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractionError::QueriesMissing {
                pointer: self.config.queries_pointer.clone(),
            })?;

        queries
            .iter()
            .filter_map(|entry| {
                let pair = entry.as_array()?;
                Some((pair.first()?, pair.get(1)?))
            })
            .find(|(descriptor, _)| self.descriptor_matches(descriptor, id))
            .and_then(|(_, result)| result.pointer(&self.config.product_pointer))
            .ok_or_else(|| ExtractionError::RecordNotFound {
                query: self.config.query_name.clone(),
                id: id.to_string(),
            })
    }

    /// Descriptor is `[name, params]` or `{"name": .., "params": ..}`
    fn descriptor_matches(&self, descriptor: &Value, id: &CanonicalId) -> bool {
        let (name, params) = match descriptor {
            Value::Array(parts) => (parts.first(), parts.get(1)),
            Value::Object(map) => (map.get("name"), map.get("params")),
            _ => return false,
        };

        let name_matches = name.and_then(Value::as_str) == Some(self.config.query_name.as_str());
        let id_matches = params
            .and_then(|p| p.get(&self.config.id_param))
            .is_some_and(|value| match value {
                Value::String(s) => s == id.as_str(),
                Value::Number(n) => n.to_string() == id.as_str(),
                _ => false,
            });

        name_matches && id_matches
    }

    /// Apply the gates to a located product record
    pub fn judge_record(&self, product: &Value, now: DateTime<Utc>) -> AvailabilityVerdict {
        if let Some(release) = self.release_date(product).filter(|release| *release > now) {
            return AvailabilityVerdict::unavailable(format!(
                "not released until {}",
                release.to_rfc3339()
            ));
        }

        let not_purchasable = self
            .config
            .purchasable_pointers
            .iter()
            .any(|pointer| product.pointer(pointer) == Some(&Value::Bool(false)));
        if not_purchasable {
            return AvailabilityVerdict::unavailable("marked not purchasable");
        }

        self.judge_shipping(product)
    }

    fn judge_shipping(&self, product: &Value) -> AvailabilityVerdict {
        let Some(shipping) = product.pointer(&self.config.shipping_pointer) else {
            return AvailabilityVerdict::unknown("no online fulfillment record");
        };

        let status = shipping
            .get(&self.config.status_field)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let positive = self
            .config
            .positive_statuses
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status));
        if !positive {
            return AvailabilityVerdict::unknown(format!("shipping status '{status}'"));
        }

        let limit = self
            .config
            .order_limit_fields
            .iter()
            .find_map(|field| shipping.get(field).and_then(order_limit));

        match limit {
            Some(0) => {
                AvailabilityVerdict::unavailable(format!("shipping {status} with order limit 0"))
            }
            Some(limit) => {
                AvailabilityVerdict::available(format!("shipping {status}, order limit {limit}"))
            }
            None => AvailabilityVerdict::unknown(format!("shipping {status} without order limit")),
        }
    }

    fn release_date(&self, product: &Value) -> Option<DateTime<Utc>> {
        self.config
            .release_date_pointers
            .iter()
            .filter_map(|pointer| product.pointer(pointer).and_then(Value::as_str))
            .find_map(parse_release_date)
    }
}

/// Order limits arrive as integers or numeric strings
fn order_limit(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RFC 3339 timestamp or plain `YYYY-MM-DD` (midnight UTC)
fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());
    if parsed.is_none() {
        debug!("Ignoring unparseable release date '{}'", raw);
    }
    parsed
}

impl SignalExtractor for EmbeddedDataExtractor {
    fn confidence(&self) -> Confidence {
        Confidence::EmbeddedData
    }

    fn evaluate(&self, page: &PageContext<'_>) -> ExtractionResult<AvailabilityVerdict> {
        let id = page.canonical_id.ok_or(ExtractionError::MissingCanonicalId)?;
        let data = self.decoder.decode(page.html)?;
        let product = self.find_product_record(&data, id)?;
        Ok(self.judge_record(product, page.observed_at))
    }
}
