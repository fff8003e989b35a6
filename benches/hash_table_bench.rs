//! Extendible hash table benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use interchangedb::buffer::BufferPoolManager;
use interchangedb::storage::DiskManager;
use interchangedb::{DefaultComparator, DefaultHashFunction, ExtendibleHashTable};
use std::sync::Arc;
use tempfile::tempdir;

type BenchTable =
    ExtendibleHashTable<i32, i32, 32, DefaultComparator<i32>, DefaultHashFunction<i32>>;

fn make_table(pool_size: usize) -> (BenchTable, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench_hash.db");
    let dm = DiskManager::create(&path).unwrap();
    let bpm = Arc::new(BufferPoolManager::new(pool_size, dm));
    let table =
        ExtendibleHashTable::new(bpm, DefaultComparator::new(), DefaultHashFunction::new())
            .unwrap();
    (table, dir)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_table_insert");
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_into_warm_table", |b| {
        b.iter_batched(
            || make_table(128),
            |(table, _dir)| {
                black_box(table.insert(42, 42).unwrap());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_get_value(c: &mut Criterion) {
    let (table, _dir) = make_table(128);
    for i in 0..500 {
        table.insert(i, i * 2).unwrap();
    }

    let mut group = c.benchmark_group("hash_table_get_value");
    group.throughput(Throughput::Elements(1));
    group.bench_function("lookup_existing_key", |b| {
        b.iter(|| {
            black_box(table.get_value(&250).unwrap());
        });
    });
    group.finish();
}

fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_table_bulk_insert");
    group.throughput(Throughput::Elements(500));

    group.bench_function("insert_500_keys", |b| {
        b.iter_batched(
            || make_table(256),
            |(table, _dir)| {
                for i in 0..500 {
                    black_box(table.insert(i, i * 2).unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get_value, bench_bulk_insert);
criterion_main!(benches);
