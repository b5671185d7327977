//! Restock monitor: the polling loop around the detection engine
//!
//! One check is fetch → resolve → alert transition → optional notification.
//! Every per-product failure is absorbed at the check boundary and turned
//! into an UNKNOWN verdict, so a bad page never stops the cycle.

use std::num::NonZeroU32;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use governor::{
    Jitter, Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::resolver::AvailabilityResolver;
use crate::domain::{
    AlertState, AlertStore, AlertTransition, Availability, AvailabilityVerdict, ProductReference,
};
use crate::infrastructure::{
    AppConfig, DocumentSource, FetchError, FetchErrorKind, HttpClient, Notifier, ScheduleConfig,
    build_notifier,
};

/// Result of checking one product once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub product: String,
    pub verdict: AvailabilityVerdict,
    pub transition: AlertTransition,
    /// A notification was due and delivered
    pub notified: bool,
    /// A notification was due but delivery failed
    pub notify_failed: bool,
    pub fetch_error: Option<FetchErrorKind>,
}

/// Counters for one full pass over the product list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub checked: usize,
    pub available: usize,
    pub unavailable: usize,
    pub unknown: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
    pub fetch_failures: usize,
    /// Products left in the alerted state after the cycle
    pub alerted: usize,
    /// The cycle stopped early on shutdown
    pub cancelled: bool,
}

impl CycleReport {
    pub fn record(&mut self, outcome: &CheckOutcome) {
        self.checked += 1;
        match outcome.verdict.availability {
            Availability::Available => self.available += 1,
            Availability::Unavailable => self.unavailable += 1,
            Availability::Unknown => self.unknown += 1,
        }
        if outcome.notified {
            self.notifications_sent += 1;
        }
        if outcome.notify_failed {
            self.notification_failures += 1;
        }
        if outcome.fetch_error.is_some() {
            self.fetch_failures += 1;
        }
    }
}

pub struct RestockMonitor {
    products: Vec<ProductReference>,
    source: Box<dyn DocumentSource>,
    resolver: AvailabilityResolver,
    notifier: Box<dyn Notifier>,
    store: Mutex<AlertStore>,
    schedule: ScheduleConfig,
    /// Politeness gate shared by concurrent checks; `None` when the delay is zero
    pacer: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RestockMonitor {
    pub fn new(
        products: Vec<ProductReference>,
        source: Box<dyn DocumentSource>,
        resolver: AvailabilityResolver,
        notifier: Box<dyn Notifier>,
        schedule: ScheduleConfig,
    ) -> Self {
        let pacer = Quota::with_period(Duration::from_millis(schedule.product_delay_ms))
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));

        Self {
            products,
            source,
            resolver,
            notifier,
            store: Mutex::new(AlertStore::new()),
            schedule,
            pacer,
        }
    }

    /// Wire up the HTTP fetcher, extractor cascade and notifier from config
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let source = HttpClient::new(config.fetch.clone())?;
        let resolver = AvailabilityResolver::from_config(&config.extraction)
            .context("Failed to build extractor cascade")?;
        let notifier = build_notifier(&config.notifier).context("Failed to build notifier")?;

        Ok(Self::new(
            config.products.clone(),
            Box::new(source),
            resolver,
            notifier,
            config.schedule.clone(),
        ))
    }

    #[must_use]
    pub fn products(&self) -> &[ProductReference] {
        &self.products
    }

    pub async fn alert_state(&self, product_name: &str) -> AlertState {
        self.store.lock().await.state(product_name)
    }

    /// Check one product. `None` when shutdown interrupted the fetch.
    pub async fn check_product(
        &self,
        product: &ProductReference,
        cancellation_token: &CancellationToken,
    ) -> Option<CheckOutcome> {
        let canonical_id = product.canonical_id();
        match &canonical_id {
            Some(id) => debug!("Checking {} (canonical page {})", product.name, id.detail_url()),
            None => warn!("No canonical id in locator for '{}': {}", product.name, product.url),
        }

        let (verdict, fetch_error) = match self.source.fetch(&product.url, cancellation_token).await {
            Ok(document) if (200..300).contains(&document.http_status) => {
                (self.resolver.resolve(&document, canonical_id.as_ref()), None)
            }
            Ok(document) => {
                warn!("⚠️ {} answered HTTP {}", product.name, document.http_status);
                (
                    AvailabilityVerdict::unknown(format!("HTTP {}", document.http_status)),
                    Some(FetchErrorKind::HttpStatus),
                )
            }
            Err(FetchError::Cancelled { .. }) => {
                debug!("Check for {} cancelled", product.name);
                return None;
            }
            Err(e) => {
                warn!(
                    product = %product.name,
                    recoverable = e.is_recoverable(),
                    "⚠️ Fetch failed: {}",
                    e
                );
                (AvailabilityVerdict::unknown(e.to_string()), Some(e.kind()))
            }
        };

        let transition = self
            .store
            .lock()
            .await
            .apply(&product.name, verdict.availability);

        let (mut notified, mut notify_failed) = (false, false);
        if transition.should_notify() {
            match self.notifier.notify(&product.name, &product.url).await {
                Ok(()) => notified = true,
                Err(e) => {
                    notify_failed = true;
                    warn!("⚠️ Notification for {} failed: {}", product.name, e);
                }
            }
        }

        info!(
            product = %product.name,
            verdict = %verdict.availability,
            reason = verdict.reason.as_deref().unwrap_or(""),
            previous = %transition.previous,
            next = %transition.next,
            changed = transition.changed(),
            notified,
            "Checked product"
        );

        Some(CheckOutcome {
            product: product.name.clone(),
            verdict,
            transition,
            notified,
            notify_failed,
            fetch_error,
        })
    }

    /// One pass over every configured product
    pub async fn run_cycle(&self, cancellation_token: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        let concurrency = self.schedule.max_concurrent_checks.max(1);

        if concurrency == 1 {
            for (index, product) in self.products.iter().enumerate() {
                if index > 0 && !pause(self.schedule.product_delay(), cancellation_token).await {
                    report.cancelled = true;
                    break;
                }
                match self.check_product(product, cancellation_token).await {
                    Some(outcome) => report.record(&outcome),
                    None => {
                        report.cancelled = true;
                        break;
                    }
                }
            }
        } else {
            let outcomes: Vec<Option<CheckOutcome>> = stream::iter(self.products.iter())
                .map(|product| async move {
                    if !self.wait_for_slot(cancellation_token).await {
                        return None;
                    }
                    self.check_product(product, cancellation_token).await
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for outcome in outcomes {
                match outcome {
                    Some(outcome) => report.record(&outcome),
                    None => report.cancelled = true,
                }
            }
        }

        report.alerted = self
            .store
            .lock()
            .await
            .snapshot()
            .iter()
            .filter(|(_, record)| record.state == AlertState::Alerted)
            .count();

        info!(
            "📊 Cycle complete: {} checked, {} available, {} unavailable, {} unknown, {} alert(s) sent, {} alerted",
            report.checked,
            report.available,
            report.unavailable,
            report.unknown,
            report.notifications_sent,
            report.alerted
        );
        report
    }

    /// Wait for the next fetch slot so concurrent checks still start one
    /// politeness delay apart; `false` means shutdown
    async fn wait_for_slot(&self, cancellation_token: &CancellationToken) -> bool {
        let Some(pacer) = &self.pacer else {
            return !cancellation_token.is_cancelled();
        };
        let jitter = Jitter::up_to(Duration::from_millis(self.schedule.product_delay_jitter_ms));
        tokio::select! {
            () = pacer.until_ready_with_jitter(jitter) => !cancellation_token.is_cancelled(),
            () = cancellation_token.cancelled() => false,
        }
    }

    /// Run cycles until cancelled (or once, in run-once mode). Returns the cycle count.
    pub async fn run(&self, cancellation_token: CancellationToken) -> usize {
        info!(
            "🚀 Monitoring {} product(s) every {}s",
            self.products.len(),
            self.schedule.check_interval_seconds
        );

        let mut cycles = 0;
        loop {
            let report = self.run_cycle(&cancellation_token).await;
            cycles += 1;

            if report.cancelled || self.schedule.run_once {
                break;
            }
            if !pause(self.schedule.check_interval(), &cancellation_token).await {
                break;
            }
        }

        info!("🛑 Monitor stopped after {} cycle(s)", cycles);
        cycles
    }
}

/// Sleep unless shutdown comes first; `false` means shutdown
async fn pause(duration: Duration, cancellation_token: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancellation_token.is_cancelled();
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        () = cancellation_token.cancelled() => false,
    }
}
