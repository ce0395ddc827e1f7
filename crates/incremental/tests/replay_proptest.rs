//! Property-based tests: the changeset built from a random operation stream
//! replays the old contents into the new ones.

use proptest::prelude::*;
use tether_incremental::{CollectionChangeBuilder, CollectionChangeSet};

/// (identity, version) pairs so both moves and modifications are visible.
type Item = (u32, u32);

#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Erase(usize),
    Modify(usize),
    Move(usize, usize),
    Swap(usize, usize),
    MoveOver(usize),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<usize>().prop_map(Op::Insert),
        3 => any::<usize>().prop_map(Op::Erase),
        3 => any::<usize>().prop_map(Op::Modify),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Move(a, b)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Swap(a, b)),
        2 => any::<usize>().prop_map(Op::MoveOver),
        1 => Just(Op::Clear),
    ]
}

struct Model {
    items: Vec<Item>,
    next_id: u32,
}

impl Model {
    fn new(len: usize) -> Self {
        Self {
            items: (0..len as u32).map(|id| (id, 0)).collect(),
            next_id: len as u32,
        }
    }

    /// Applies `op` to the list and the builder alike.
    fn apply(&mut self, op: &Op, builder: &mut CollectionChangeBuilder) {
        let len = self.items.len();
        match *op {
            Op::Insert(i) => {
                let i = i % (len + 1);
                self.items.insert(i, (self.next_id, 0));
                self.next_id += 1;
                builder.insert(i);
            }
            Op::Clear => {
                self.items.clear();
                builder.clear(len).unwrap();
            }
            _ if len == 0 => {}
            Op::Erase(i) => {
                let i = i % len;
                self.items.remove(i);
                builder.erase(i);
            }
            Op::Modify(i) => {
                let i = i % len;
                self.items[i].1 += 1;
                builder.modify(i);
            }
            Op::Move(from, to) => {
                let (from, to) = (from % len, to % len);
                let item = self.items.remove(from);
                self.items.insert(to, item);
                builder.move_item(from, to);
            }
            Op::Swap(a, b) => {
                let (a, b) = (a % len, b % len);
                self.items.swap(a, b);
                builder.swap(a, b);
            }
            Op::MoveOver(row) => {
                let row = row % len;
                self.items.swap_remove(row);
                builder.move_over(row, len - 1);
            }
        }
    }
}

fn check_replay(
    initial: &[Item],
    current: &[Item],
    changes: &CollectionChangeSet,
) -> Result<(), TestCaseError> {
    changes.verify();

    let mut mirror = initial.to_vec();
    prop_assert!(changes.apply(&mut mirror, current).is_ok());
    prop_assert_eq!(&mirror, &current.to_vec());

    for m in &changes.moves {
        prop_assert_eq!(initial[m.from].0, current[m.to].0, "move {:?}", m);
    }
    for w in changes.moves.windows(2) {
        prop_assert!(w[0].from < w[1].from);
    }
    Ok(())
}

proptest! {
    /// A single builder fed a random stream replays exactly.
    #[test]
    fn builder_replays_operations(len in 0usize..12, ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut model = Model::new(len);
        let initial = model.items.clone();
        let mut builder = CollectionChangeBuilder::new();
        for op in &ops {
            model.apply(op, &mut builder);
        }
        builder.parse_complete();
        let changes = builder.finalize();
        check_replay(&initial, &model.items, &changes)?;
    }

    /// Without move tracking, a stream of appends, modifications and
    /// move-last-over deletions reports each surviving original row
    /// as untouched or modified and never reports moves.
    #[test]
    fn table_changes_without_moves(len in 1usize..12, ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut model = Model::new(len);
        let initial = model.items.clone();
        let mut builder = CollectionChangeBuilder::without_moves();
        for op in &ops {
            let op = match *op {
                Op::Insert(_) => Op::Insert(model.items.len()),
                Op::Modify(i) => Op::Modify(i),
                Op::MoveOver(i) => Op::MoveOver(i),
                _ => continue,
            };
            model.apply(&op, &mut builder);
        }
        builder.parse_complete();
        let changes = builder.finalize();
        changes.verify();
        prop_assert!(changes.moves.is_empty());

        let survivors = initial.iter().filter(|item| model.items.iter().any(|c| c.0 == item.0)).count();
        prop_assert_eq!(initial.len() - changes.deletions.count(), survivors);
        prop_assert_eq!(model.items.len() - changes.insertions.count(), survivors);
        for (index, item) in model.items.iter().enumerate() {
            let is_new = item.0 as usize >= len;
            prop_assert_eq!(changes.insertions.contains(index), is_new);
            if !is_new && item.1 > 0 {
                prop_assert!(changes.modifications.contains(index), "row {} modified", index);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20000))]

    /// Merging the changesets of two consecutive streams replays like one.
    #[test]
    fn merged_changesets_replay(
        len in 0usize..12,
        first in prop::collection::vec(op_strategy(), 0..20),
        second in prop::collection::vec(op_strategy(), 0..20),
    ) {
        let mut model = Model::new(len);
        let initial = model.items.clone();

        let mut merged = CollectionChangeBuilder::new();
        for op in &first {
            model.apply(op, &mut merged);
        }
        merged.parse_complete();

        let mut later = CollectionChangeBuilder::new();
        for op in &second {
            model.apply(op, &mut later);
        }
        later.parse_complete();

        merged.merge(later.finalize());
        let changes = merged.finalize();
        check_replay(&initial, &model.items, &changes)?;
    }
}
