//! Benchmarks for CollectionChangeBuilder.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tether_incremental::CollectionChangeBuilder;

fn bench_table_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_changes");

    for size in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("append_rows", size), &size, |b, &size| {
            b.iter(|| {
                let mut builder = CollectionChangeBuilder::without_moves();
                for row in 0..size {
                    builder.insert(black_box(row));
                }
                builder.parse_complete();
                builder.finalize()
            })
        });

        group.bench_with_input(BenchmarkId::new("modify_every_other", size), &size, |b, &size| {
            b.iter(|| {
                let mut builder = CollectionChangeBuilder::without_moves();
                for row in (0..size).step_by(2) {
                    builder.modify(black_box(row));
                }
                builder.parse_complete();
                builder.finalize()
            })
        });

        group.bench_with_input(BenchmarkId::new("move_over_front", size), &size, |b, &size| {
            b.iter(|| {
                let mut builder = CollectionChangeBuilder::new();
                let mut last = size - 1;
                for _ in 0..size / 2 {
                    builder.move_over(black_box(0), last);
                    last -= 1;
                }
                builder.parse_complete();
                builder.finalize()
            })
        });
    }

    group.finish();
}

fn bench_list_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_changes");

    for count in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::new("moves", count), &count, |b, &count| {
            b.iter(|| {
                let mut builder = CollectionChangeBuilder::new();
                for i in 0..count {
                    builder.move_item(black_box(count * 2 - i), i);
                }
                builder.parse_complete();
                builder.finalize()
            })
        });

        group.bench_with_input(BenchmarkId::new("merge", count), &count, |b, &count| {
            let mut first = CollectionChangeBuilder::new();
            for i in 0..count {
                first.insert(i * 2);
            }
            first.parse_complete();
            let mut second = CollectionChangeBuilder::new();
            for i in 0..count {
                second.erase(i);
                second.modify(i * 2);
            }
            second.parse_complete();
            let first = first.finalize();
            let second = second.finalize();

            b.iter(|| {
                let mut merged = CollectionChangeBuilder::from_changes(first.clone());
                merged.merge(black_box(second.clone()));
                merged.finalize()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_table_ops, bench_list_ops);
criterion_main!(benches);
