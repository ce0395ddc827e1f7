//! Property-based tests: random write transactions on a table, replayed
//! through the interpreter, yield changesets that turn the old contents into
//! the new ones.

use proptest::prelude::*;
use tether_core::schema::{Schema, TableBuilder};
use tether_core::{DataType, SchemaMode, Value};
use tether_reactive::{advance, ObservedRows, TransactionChangeInfo};
use tether_storage::{Database, WriteTransaction};

const ITEM: usize = 0;
const ID: usize = 0;
const VERSION: usize = 1;

#[derive(Clone, Debug)]
enum Op {
    Add(usize),
    Insert(usize),
    Delete(usize),
    Swap(usize, usize),
    Touch(usize),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..4).prop_map(Op::Add),
        3 => any::<usize>().prop_map(Op::Insert),
        4 => any::<usize>().prop_map(Op::Delete),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Swap(a, b)),
        4 => any::<usize>().prop_map(Op::Touch),
        1 => Just(Op::Clear),
    ]
}

fn database(len: usize) -> (Database, i64) {
    let item = TableBuilder::new("item")
        .unwrap()
        .add_column("id", DataType::Int)
        .unwrap()
        .add_column("version", DataType::Int)
        .unwrap()
        .build()
        .unwrap();
    let mut db = Database::from_schema(&Schema::from_tables(vec![item]).unwrap()).unwrap();
    let mut tx = db.begin_write();
    tx.add_empty_rows(ITEM, len).unwrap();
    for row in 0..len {
        tx.set_default(ITEM, ID, row, row as i64).unwrap();
    }
    tx.commit().unwrap();
    (db, len as i64)
}

/// Labels a fresh row without it counting as a change.
fn label(tx: &mut WriteTransaction<'_>, row: usize, next_id: &mut i64) {
    tx.set_default(ITEM, ID, row, *next_id).unwrap();
    *next_id += 1;
}

fn apply(tx: &mut WriteTransaction<'_>, op: &Op, next_id: &mut i64) {
    let len = tx.group().row_count(ITEM);
    match *op {
        Op::Add(count) => {
            let first = tx.add_empty_rows(ITEM, count).unwrap();
            for row in first..first + count {
                label(tx, row, next_id);
            }
        }
        Op::Insert(at) => {
            let at = at % (len + 1);
            tx.insert_empty_row(ITEM, at).unwrap();
            label(tx, at, next_id);
        }
        Op::Clear => tx.clear_table(ITEM).unwrap(),
        _ if len == 0 => {}
        Op::Delete(at) => tx.move_last_over(ITEM, at % len).unwrap(),
        Op::Swap(a, b) => tx.swap_rows(ITEM, a % len, b % len).unwrap(),
        Op::Touch(at) => {
            let at = at % len;
            let version = match tx.group().get(ITEM, VERSION, at).unwrap() {
                Value::Int(v) => *v,
                other => panic!("unexpected {:?}", other),
            };
            tx.set(ITEM, VERSION, at, version + 1).unwrap();
        }
    }
}

fn contents(db: &Database) -> Vec<(Value, Value)> {
    let group = db.group();
    (0..group.row_count(ITEM))
        .map(|row| {
            (
                group.get(ITEM, ID, row).unwrap().clone(),
                group.get(ITEM, VERSION, row).unwrap().clone(),
            )
        })
        .collect()
}

fn replay(len: usize, commits: &[Vec<Op>], moves: bool) -> Result<(), TestCaseError> {
    let (mut db, mut next_id) = database(len);
    let start = db.version();
    let before = contents(&db);
    for ops in commits {
        let mut tx = db.begin_write();
        for op in ops {
            apply(&mut tx, op, &mut next_id);
        }
        tx.commit().unwrap();
    }
    let after = contents(&db);

    let mut info = TransactionChangeInfo::new();
    info.track_table(ITEM, moves);
    advance(&db, start, db.version(), SchemaMode::Automatic, &mut info, &mut ObservedRows::new()).unwrap();
    let changes = info
        .table_changes(ITEM)
        .cloned()
        .map(|builder| builder.finalize())
        .unwrap_or_default();
    changes.verify();

    if moves {
        let mut replayed = before.clone();
        changes.apply(&mut replayed, &after).unwrap();
        prop_assert_eq!(&replayed, &after);
        for m in &changes.moves {
            prop_assert_eq!(&before[m.from].0, &after[m.to].0);
        }
    } else {
        prop_assert!(changes.moves.is_empty());
        prop_assert_eq!(
            before.len() - changes.deletions.count() + changes.insertions.count(),
            after.len()
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn table_changes_replay(
        len in 0usize..12,
        commits in prop::collection::vec(prop::collection::vec(op_strategy(), 0..8), 1..4),
    ) {
        replay(len, &commits, true)?;
    }

    #[test]
    fn table_changes_without_moves_stay_consistent(
        len in 0usize..12,
        commits in prop::collection::vec(prop::collection::vec(op_strategy(), 0..8), 1..4),
    ) {
        replay(len, &commits, false)?;
    }
}
