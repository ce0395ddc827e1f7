//! Benchmarks for replaying transaction logs and deep change checks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tether_core::schema::{Schema, TableBuilder};
use tether_core::{DataType, SchemaMode};
use tether_reactive::{advance, DeepChangeChecker, ObservedRows, TransactionChangeInfo};
use tether_storage::{Database, VersionId};

fn create_database(rows: usize) -> Database {
    let node = TableBuilder::new("node")
        .unwrap()
        .add_column("value", DataType::Int)
        .unwrap()
        .add_link("next", "node")
        .unwrap()
        .add_link_list("children", "node")
        .unwrap()
        .build()
        .unwrap();
    let mut db = Database::from_schema(&Schema::from_tables(vec![node]).unwrap()).unwrap();
    let mut tx = db.begin_write();
    tx.add_empty_rows(0, rows).unwrap();
    for row in 0..rows - 1 {
        tx.set_link(0, 1, row, Some(row + 1)).unwrap();
    }
    tx.commit().unwrap();
    db
}

/// Commits a mix of sets, deletions and list edits; returns the version
/// before the commit.
fn churn(db: &mut Database, rows: usize) -> VersionId {
    let start = db.version();
    let mut tx = db.begin_write();
    for row in (0..rows).step_by(3) {
        tx.set(0, 0, row, row as i64).unwrap();
    }
    for row in 0..rows / 10 {
        tx.list_add(0, 2, row, rows / 2).unwrap();
    }
    for _ in 0..rows / 10 {
        tx.move_last_over(0, 0).unwrap();
    }
    tx.commit().unwrap();
    start
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for rows in [100, 1000] {
        let mut db = create_database(rows);
        let start = churn(&mut db, rows);

        for moves in [false, true] {
            let name = if moves { "table_with_moves" } else { "table" };
            group.bench_with_input(BenchmarkId::new(name, rows), &rows, |b, _| {
                b.iter(|| {
                    let mut info = TransactionChangeInfo::new();
                    info.track_table(0, moves);
                    advance(
                        &db,
                        black_box(start),
                        db.version(),
                        SchemaMode::Automatic,
                        &mut info,
                        &mut ObservedRows::new(),
                    )
                    .unwrap();
                    info
                })
            });
        }
    }

    group.finish();
}

fn bench_deep_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_change");

    for rows in [100, 1000] {
        let mut db = create_database(rows);
        let start = db.version();
        let mut tx = db.begin_write();
        tx.set(0, 0, rows - 1, 1i64).unwrap();
        tx.commit().unwrap();

        let mut info = TransactionChangeInfo::new();
        info.track_table(0, false);
        advance(
            &db,
            start,
            db.version(),
            SchemaMode::Automatic,
            &mut info,
            &mut ObservedRows::new(),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("chain", rows), &rows, |b, &rows| {
            b.iter(|| {
                let mut checker = DeepChangeChecker::new(&info, &db, 0);
                (0..rows).filter(|&row| checker.check(black_box(row))).count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_replay, bench_deep_check);
criterion_main!(benches);
