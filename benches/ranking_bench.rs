//! Benchmarks for leaderboard ranking and metrics
//!
//! Run with: cargo bench

use blockwatch::metrics::compare;
use blockwatch::model::{AccountSnapshot, CounterPair, RankedList};
use blockwatch::upstream::parse_blocked;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::time::Duration;

fn create_snapshots(count: usize) -> Vec<AccountSnapshot> {
    (0..count)
        .map(|i| {
            // deterministic shuffle with plenty of ties
            let count = ((i * 7919) % 5000) as u64;
            AccountSnapshot::new(format!("did:plc:{:024}", i), format!("user{}.test", i), count)
        })
        .collect()
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    for size in [20, 100, 1000] {
        let snapshots = create_snapshots(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("sort_{}", size), |b| {
            b.iter(|| RankedList::from_unsorted(black_box(snapshots.clone())))
        });

        let list = RankedList::from_unsorted(snapshots.clone());
        let last = format!("did:plc:{:024}", size - 1);
        group.bench_function(format!("rank_of_{}", size), |b| {
            b.iter(|| list.rank_of(black_box(&last)))
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let entries: Vec<_> = (0..100)
        .map(|i| serde_json::json!({"did": format!("did:plc:{}", i), "count": 10_000 - i}))
        .collect();
    let body = serde_json::json!({"data": {"blocked": entries}});

    c.bench_function("parse_blocked_100", |b| {
        b.iter(|| parse_blocked(black_box(&body)).unwrap())
    });
}

fn bench_metrics(c: &mut Criterion) {
    let current = CounterPair::new(6821, 6600);
    let previous = CounterPair::new(6815, 6550);

    c.bench_function("compare", |b| {
        b.iter(|| compare(black_box(current), black_box(Some(previous)), Duration::from_secs(60)))
    });
}

criterion_group!(benches, bench_ranking, bench_parse, bench_metrics);
criterion_main!(benches);
