//! Benchmarks for Undis store operations

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use undis::Store;

fn store_benchmarks(c: &mut Criterion) {
    let store = Store::new();
    for i in 0..10_000 {
        store.set(format!("key{}", i), format!("value{}", i), 0, 0);
    }

    c.bench_function("store_set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(format!("bench{}", i % 10_000), &b"payload"[..], 7, 0);
            i += 1;
        })
    });

    c.bench_function("store_get_hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.get(&format!("key{}", i % 10_000)));
            i += 1;
        })
    });

    c.bench_function("store_get_miss", |b| {
        b.iter(|| black_box(store.get("missing")))
    });

    c.bench_function("snapshot_save_10k", |b| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.db");
        b.iter(|| black_box(store.save_to(&path).unwrap()))
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
