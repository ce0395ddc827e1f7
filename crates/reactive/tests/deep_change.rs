//! Deep change detection over link chains and cycles.

use tether_core::schema::{Schema, TableBuilder};
use tether_core::{DataType, SchemaMode};
use tether_reactive::{advance, DeepChangeChecker, ObservedRows, TransactionChangeInfo};
use tether_storage::{Database, WriteTransaction};

const NODE: usize = 0;
const VALUE: usize = 0;
const NEXT: usize = 1;
const CHILDREN: usize = 2;

fn schema() -> Schema {
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
    Schema::from_tables(vec![node]).unwrap()
}

/// `len` nodes where node `k` links to node `k + 1`.
fn chain(len: usize) -> Database {
    let mut db = Database::from_schema(&schema()).unwrap();
    let mut tx = db.begin_write();
    tx.add_empty_rows(NODE, len).unwrap();
    for row in 0..len - 1 {
        tx.set_link(NODE, NEXT, row, Some(row + 1)).unwrap();
    }
    tx.commit().unwrap();
    db
}

/// `len` nodes without links.
fn unlinked(len: usize) -> Database {
    let mut db = Database::from_schema(&schema()).unwrap();
    let mut tx = db.begin_write();
    tx.add_empty_rows(NODE, len).unwrap();
    tx.commit().unwrap();
    db
}

/// Commits `change` and replays it with every table tracked.
fn changes_of(
    db: &mut Database,
    moves: bool,
    change: impl FnOnce(&mut WriteTransaction<'_>),
) -> TransactionChangeInfo {
    let start = db.version();
    let mut tx = db.begin_write();
    change(&mut tx);
    tx.commit().unwrap();

    let mut info = TransactionChangeInfo::new();
    info.track_table(NODE, moves);
    advance(
        &*db,
        start,
        db.version(),
        SchemaMode::Automatic,
        &mut info,
        &mut ObservedRows::new(),
    )
    .unwrap();
    info
}

#[test]
fn change_seen_up_to_sixteen_hops_away() {
    let mut db = chain(20);
    let info = changes_of(&mut db, false, |tx| tx.set(NODE, VALUE, 19, 1i64).unwrap());

    let expected = |row: usize| row >= 4;
    let orders: Vec<Vec<usize>> = vec![
        (0..20).collect(),
        (0..20).rev().collect(),
        vec![3, 10, 0, 19, 4, 2, 15, 1, 5, 18, 6, 17, 7, 16, 8, 14, 9, 13, 11, 12],
    ];
    for order in orders {
        let mut checker = DeepChangeChecker::new(&info, &db, NODE);
        for row in order {
            assert_eq!(checker.check(row), expected(row), "row {}", row);
        }
    }
}

#[test]
fn unchanged_chain() {
    let mut db = chain(20);
    let info = changes_of(&mut db, false, |tx| tx.set_link(NODE, NEXT, 19, None).unwrap());
    let mut checker = DeepChangeChecker::new(&info, &db, NODE);
    // node 19 itself changed; nothing links onwards from it
    assert!(checker.check(19));
    assert!(checker.check(18));
    assert!(!checker.check(2));
    assert!(!checker.check(2));
}

#[test]
fn self_link_terminates() {
    let mut db = chain(2);
    let info = changes_of(&mut db, false, |tx| {
        tx.set_link(NODE, NEXT, 0, Some(0)).unwrap();
        tx.list_add(NODE, CHILDREN, 1, 1).unwrap();
    });
    let mut checker = DeepChangeChecker::new(&info, &db, NODE);
    assert!(checker.check(0));
    assert!(checker.check(1));

    let info = changes_of(&mut db, false, |tx| tx.add_empty_rows(NODE, 1).map(|_| ()).unwrap());
    let mut checker = DeepChangeChecker::new(&info, &db, NODE);
    assert!(!checker.check(0));
    assert!(!checker.check(1));
}

#[test]
fn cycles_through_lists() {
    // 0 -> [1], 1 -> [0, 2], 2 -> [3], 3 -> nothing
    let mut db = Database::from_schema(&schema()).unwrap();
    let mut tx = db.begin_write();
    tx.add_empty_rows(NODE, 4).unwrap();
    tx.list_add(NODE, CHILDREN, 0, 1).unwrap();
    tx.list_add(NODE, CHILDREN, 1, 0).unwrap();
    tx.list_add(NODE, CHILDREN, 1, 2).unwrap();
    tx.list_add(NODE, CHILDREN, 2, 3).unwrap();
    tx.commit().unwrap();

    let info = changes_of(&mut db, false, |tx| tx.set(NODE, VALUE, 3, 5i64).unwrap());
    let mut checker = DeepChangeChecker::new(&info, &db, NODE);
    assert!((0..4).all(|row| checker.check(row)));

    let info = changes_of(&mut db, false, |tx| tx.set(NODE, VALUE, 0, 5i64).unwrap());
    let mut checker = DeepChangeChecker::new(&info, &db, NODE);
    assert!(!checker.check(3));
    assert!(!checker.check(2));
    assert!(checker.check(1));
    assert!(checker.check(0));
}

fn directly_modified(info: &TransactionChangeInfo, row: usize) -> bool {
    info.table_changes(NODE).is_some_and(|changes| changes.modifications().contains(row))
}

#[test]
fn moving_a_target_is_not_a_change() {
    let mut db = unlinked(10);
    let mut tx = db.begin_write();
    tx.set_link(NODE, NEXT, 0, Some(9)).unwrap();
    tx.list_add(NODE, CHILDREN, 0, 9).unwrap();
    tx.commit().unwrap();

    let info = changes_of(&mut db, true, |tx| tx.move_last_over(NODE, 5).unwrap());
    // node 9 now sits at 5 and the links followed it
    assert_eq!(db.group().link(NODE, NEXT, 0), Some(5));
    assert_eq!(db.group().link_list(NODE, CHILDREN, 0), &[5]);
    assert!(!DeepChangeChecker::new(&info, &db, NODE).check(0));
}

#[test]
fn change_before_target_moves_is_seen() {
    let mut db = unlinked(10);
    let mut tx = db.begin_write();
    tx.set_link(NODE, NEXT, 0, Some(9)).unwrap();
    tx.commit().unwrap();

    let info = changes_of(&mut db, true, |tx| {
        tx.set(NODE, VALUE, 9, 5i64).unwrap();
        tx.move_last_over(NODE, 5).unwrap();
    });
    assert!(!directly_modified(&info, 0));
    assert!(DeepChangeChecker::new(&info, &db, NODE).check(0));

    let mut tx = db.begin_write();
    tx.set_link(NODE, NEXT, 0, None).unwrap();
    tx.list_add(NODE, CHILDREN, 0, 8).unwrap();
    tx.commit().unwrap();

    let info = changes_of(&mut db, true, |tx| {
        tx.set(NODE, VALUE, 8, 5i64).unwrap();
        tx.move_last_over(NODE, 5).unwrap();
    });
    assert_eq!(db.group().link_list(NODE, CHILDREN, 0), &[5]);
    assert!(!directly_modified(&info, 0));
    assert!(DeepChangeChecker::new(&info, &db, NODE).check(0));
}

#[test]
fn change_after_target_moves_is_seen() {
    let mut db = unlinked(10);
    let mut tx = db.begin_write();
    tx.set_link(NODE, NEXT, 0, Some(9)).unwrap();
    tx.commit().unwrap();

    let info = changes_of(&mut db, true, |tx| {
        tx.move_last_over(NODE, 5).unwrap();
        tx.set(NODE, VALUE, 5, 5i64).unwrap();
    });
    assert!(!directly_modified(&info, 0));
    assert!(DeepChangeChecker::new(&info, &db, NODE).check(0));

    let mut tx = db.begin_write();
    tx.set_link(NODE, NEXT, 0, None).unwrap();
    tx.list_add(NODE, CHILDREN, 0, 8).unwrap();
    tx.commit().unwrap();

    let info = changes_of(&mut db, true, |tx| {
        tx.move_last_over(NODE, 5).unwrap();
        tx.set(NODE, VALUE, 5, 5i64).unwrap();
    });
    assert!(!directly_modified(&info, 0));
    assert!(DeepChangeChecker::new(&info, &db, NODE).check(0));
}
