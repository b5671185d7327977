//! Test utilities for restock-monitor
//!
//! In-memory stand-ins for the network edges (document source, notifier)
//! plus fixture builders for product pages, so monitor behaviour can be
//! exercised without touching the network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::application::{AvailabilityResolver, RestockMonitor};
use crate::domain::{CanonicalId, ProductReference};
use crate::domain::constants::{embedded, site};
use crate::infrastructure::{
    DocumentSource, FetchError, Notifier, NotifyError, RawDocument, ScheduleConfig,
};

/// Scripted reply for one fetch
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Page { status: u16, body: String },
    Error(FetchError),
}

/// Document source replaying scripted responses per locator.
///
/// Responses are consumed in order; the last one repeats forever.
#[derive(Debug, Clone, Default)]
pub struct FakeDocumentSource {
    responses: Arc<Mutex<HashMap<String, VecDeque<FakeResponse>>>>,
    fetches: Arc<AtomicUsize>,
    fetch_times: Arc<Mutex<Vec<Instant>>>,
}

impl FakeDocumentSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, locator: &str, response: FakeResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(locator.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn push_page(&self, locator: &str, body: impl Into<String>) {
        self.push(
            locator,
            FakeResponse::Page {
                status: 200,
                body: body.into(),
            },
        );
    }

    pub fn push_status(&self, locator: &str, status: u16) {
        self.push(
            locator,
            FakeResponse::Error(FetchError::HttpStatus {
                url: locator.to_string(),
                status,
            }),
        );
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// When each fetch started, in call order
    #[must_use]
    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DocumentSource for FakeDocumentSource {
    async fn fetch(
        &self,
        locator: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<RawDocument, FetchError> {
        if cancellation_token.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: locator.to_string(),
            });
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());

        let response = {
            let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
            let queue = responses.get_mut(locator);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(FakeResponse::Page { status, body }) => {
                let mut document = RawDocument::new(locator, body);
                document.http_status = status;
                Ok(document)
            }
            Some(FakeResponse::Error(error)) => Err(error),
            None => Err(FetchError::Network {
                url: locator.to_string(),
                message: "no scripted response".to_string(),
            }),
        }
    }
}

/// Notifier that records every delivery attempt
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    attempts: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delivered notifications as `(product name, url)`
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn sent_for(&self, product_name: &str) -> usize {
        self.sent().iter().filter(|(name, _)| name == product_name).count()
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, product_name: &str, url: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Status { status: 500 });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((product_name.to_string(), url.to_string()));
        Ok(())
    }
}

/// Product with a detail-page locator for `id`
#[must_use]
pub fn product(name: &str, id: &str) -> ProductReference {
    let locator = format!("{}{id}", site::CANONICAL_ID_PREFIX);
    let url = CanonicalId::extract(&locator).map_or_else(|| locator.clone(), |canonical| canonical.detail_url());
    ProductReference::new(name, url)
}

/// Schedule without any waiting
#[must_use]
pub fn instant_schedule() -> ScheduleConfig {
    ScheduleConfig {
        check_interval_seconds: 1,
        product_delay_ms: 0,
        product_delay_jitter_ms: 0,
        max_concurrent_checks: 1,
        run_once: false,
    }
}

/// Monitor over fakes with the default extractor cascade
pub fn fake_monitor(
    products: Vec<ProductReference>,
    source: &FakeDocumentSource,
    notifier: &RecordingNotifier,
    schedule: ScheduleConfig,
) -> anyhow::Result<RestockMonitor> {
    Ok(RestockMonitor::new(
        products,
        Box::new(source.clone()),
        AvailabilityResolver::with_defaults()?,
        Box::new(notifier.clone()),
        schedule,
    ))
}

/// Product record with an online fulfillment entry
#[must_use]
pub fn shipping_record(status: &str, order_limit: Option<i64>) -> Value {
    let mut shipping = json!({ "availability_status": status });
    if let (Some(limit), Some(map)) = (order_limit, shipping.as_object_mut()) {
        map.insert("order_limit".to_string(), json!(limit));
    }
    json!({ "fulfillment": { "shipping_options": shipping } })
}

/// Page whose data island holds `record` as the product for `id`
#[must_use]
pub fn embedded_page(id: &str, record: &Value, body: &str) -> String {
    let data = json!({
        "__PRELOADED_QUERIES__": {
            "queries": [
                [[embedded::PDP_QUERY_NAME, { (embedded::CANONICAL_ID_PARAM): id }], { "data": { "product": record } }]
            ]
        }
    });
    let literal = serde_json::to_string(&data.to_string()).unwrap_or_default();
    format!(
        "<html><head><script>Object.defineProperties(window, {{'{}': {{value: deepFreeze(JSON.parse({}))}}}})</script></head><body>{}</body></html>",
        embedded::SENTINEL_TOKEN,
        literal,
        body
    )
}

/// Page with only markup, no data island
#[must_use]
pub fn plain_page(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}
