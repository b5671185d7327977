//! Resolver and check-cycle benchmarks
//!
//! - Full cascade over a page with a data island and purchase markup
//! - Cascade over a markup-only page (embedded layer fails fast)
//! - One monitor cycle over in-memory fakes

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use restock_monitor::application::AvailabilityResolver;
use restock_monitor::domain::CanonicalId;
use restock_monitor::infrastructure::RawDocument;
use restock_monitor::test_utils::{
    FakeDocumentSource, RecordingNotifier, embedded_page, fake_monitor, instant_schedule,
    plain_page, product, shipping_record,
};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const ID: &str = "94336414";

fn product_page_body() -> String {
    let filler: String = (0..200)
        .map(|i| format!("<div class=\"tile\"><a href=\"/p/-/A-{i}\">Related item {i}</a></div>"))
        .collect();
    embedded_page(
        ID,
        &shipping_record("IN_STOCK", Some(2)),
        &format!(r#"{filler}<button data-test="shippingButton">Ship it</button>"#),
    )
}

fn resolver_benchmarks(c: &mut Criterion) {
    let resolver = AvailabilityResolver::with_defaults().unwrap();
    let id = CanonicalId::extract(&format!("A-{ID}")).unwrap();

    let full = RawDocument::new("bench", product_page_body());
    c.bench_function("resolve product page", |b| {
        b.iter(|| black_box(resolver.resolve(black_box(&full), Some(&id))));
    });

    let markup_only = RawDocument::new(
        "bench",
        plain_page(r#"<div data-test="soldOutBlock">Sold out</div>"#),
    );
    c.bench_function("resolve markup-only page", |b| {
        b.iter(|| black_box(resolver.resolve(black_box(&markup_only), Some(&id))));
    });
}

fn cycle_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let products: Vec<_> = (0..4)
        .map(|i| product(&format!("Item {i}"), ID))
        .collect();
    let source = FakeDocumentSource::new();
    for item in &products {
        source.push_page(&item.url, product_page_body());
    }
    let notifier = RecordingNotifier::new();
    let monitor = fake_monitor(products, &source, &notifier, instant_schedule()).unwrap();
    let token = CancellationToken::new();

    c.bench_function("monitor cycle (4 products)", |b| {
        b.iter(|| black_box(rt.block_on(monitor.run_cycle(&token))));
    });
}

criterion_group!(benches, resolver_benchmarks, cycle_benchmark);
criterion_main!(benches);
