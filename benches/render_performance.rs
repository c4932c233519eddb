//! Render Performance Benchmarks
//!
//! Rendering a long contract with many highlights, in both overlap layouts,
//! plus CSV export of the same set.
//!
//! Run with: `cargo bench --bench render_performance`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use contract_highlights::annotations::{CategoryRegistry, HighlightStore, SelectionPayload};
use contract_highlights::export::export_csv;
use contract_highlights::html::{render_with, OverlapStrategy, RenderOptions};
use contract_highlights::storage::Persister;

const CLAUSE: &str = "The Tenant shall indemnify & hold harmless the Landlord against <all> claims arising within 30 days. ";

/// Build a contract of `clauses` clauses and a store with two highlights per
/// clause, one of which overlaps the next clause
fn build(clauses: usize) -> (String, HighlightStore, CategoryRegistry) {
    let document = CLAUSE.repeat(clauses);
    let clause_len = CLAUSE.chars().count();
    let mut categories = CategoryRegistry::new("bench-categories", Persister::disabled());
    let mut store = HighlightStore::new("bench-highlights", Persister::disabled());

    for i in 0..clauses {
        let base = i * clause_len;
        categories
            .set_active(if i % 2 == 0 { "risk" } else { "obligation" })
            .ok();
        for (start, end) in [(base + 4, base + 26), (base + 60, base + clause_len + 10)] {
            store
                .create(
                    SelectionPayload {
                        text: String::new(),
                        start_index: start,
                        end_index: end,
                    },
                    &document,
                    &categories,
                )
                .ok();
        }
    }

    (document, store, categories)
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    for clauses in [10, 100, 1000] {
        let (document, store, categories) = build(clauses);

        for overlap in [OverlapStrategy::Nest, OverlapStrategy::Segment] {
            let options = RenderOptions {
                overlap,
                ..RenderOptions::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", overlap).to_lowercase(), clauses),
                &clauses,
                |b, _| {
                    b.iter(|| {
                        let output = render_with(
                            black_box(&document),
                            black_box(store.all()),
                            categories.list(),
                            &options,
                        );
                        black_box(output)
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let (_, store, _) = build(1000);

    c.bench_function("export_csv_2000", |b| {
        b.iter(|| black_box(export_csv(black_box(store.all()))))
    });
}

criterion_group!(benches, bench_render, bench_export);
criterion_main!(benches);
