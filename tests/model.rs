//! Randomized comparison of `AvlSet` against `std::collections::BTreeSet`.

use std::collections::BTreeSet;
use std::ops::Bound;

use avlset::AvlSet;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Values drawn from a narrow range so inserts and removes collide.
fn value_strategy() -> impl Strategy<Value = i32> {
    -500i32..500i32
}

#[derive(Debug, Clone)]
enum SetOp {
    Insert(i32),
    Remove(i32),
    Find(i32),
    LowerBound(i32),
    PopFirst,
    PopLast,
}

fn set_op_strategy() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        5 => value_strategy().prop_map(SetOp::Insert),
        3 => value_strategy().prop_map(SetOp::Remove),
        2 => value_strategy().prop_map(SetOp::Find),
        2 => value_strategy().prop_map(SetOp::LowerBound),
        1 => Just(SetOp::PopFirst),
        1 => Just(SetOp::PopLast),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Replays a random sequence of operations on both sets and asserts
    /// identical results at every step.
    #[test]
    fn set_ops_match_btreeset(ops in proptest::collection::vec(set_op_strategy(), TEST_SIZE)) {
        let mut avl_set: AvlSet<i32> = AvlSet::new();
        let mut bt_set: BTreeSet<i32> = BTreeSet::new();

        for op in &ops {
            match op {
                SetOp::Insert(v) => {
                    prop_assert_eq!(avl_set.insert(*v), bt_set.insert(*v), "insert({})", v);
                }
                SetOp::Remove(v) => {
                    prop_assert_eq!(avl_set.remove(v), bt_set.remove(v), "remove({})", v);
                }
                SetOp::Find(v) => {
                    prop_assert_eq!(avl_set.find(v).get(), bt_set.get(v), "find({})", v);
                }
                SetOp::LowerBound(v) => {
                    let expected = bt_set.range((Bound::Included(*v), Bound::Unbounded)).next();
                    let cursor = avl_set.lower_bound(v);
                    prop_assert_eq!(cursor.get(), expected, "lower_bound({})", v);
                    prop_assert_eq!(cursor.is_end(), expected.is_none());
                }
                SetOp::PopFirst => {
                    prop_assert_eq!(avl_set.pop_first(), bt_set.pop_first());
                }
                SetOp::PopLast => {
                    prop_assert_eq!(avl_set.pop_last(), bt_set.pop_last());
                }
            }
            prop_assert_eq!(avl_set.len(), bt_set.len());
        }

        let avl_items: Vec<_> = avl_set.iter().copied().collect();
        let bt_items: Vec<_> = bt_set.iter().copied().collect();
        prop_assert_eq!(avl_items, bt_items);
    }

    /// Forward and backward iteration, both by iterator and by cursor, agree
    /// with the sorted, deduplicated input.
    #[test]
    fn iteration_matches_btreeset(values in proptest::collection::vec(value_strategy(), 0..TEST_SIZE)) {
        let avl_set: AvlSet<i32> = values.iter().copied().collect();
        let bt_set: BTreeSet<i32> = values.iter().copied().collect();

        let forward: Vec<_> = avl_set.iter().copied().collect();
        let expected: Vec<_> = bt_set.iter().copied().collect();
        prop_assert_eq!(&forward, &expected);
        prop_assert_eq!(avl_set.len(), forward.len());

        let backward: Vec<_> = avl_set.iter().rev().copied().collect();
        let expected_rev: Vec<_> = bt_set.iter().rev().copied().collect();
        prop_assert_eq!(&backward, &expected_rev);

        let mut cursor = avl_set.end();
        let mut by_cursor = Vec::new();
        while cursor.move_prev() {
            by_cursor.push(*cursor.get().unwrap());
        }
        prop_assert_eq!(&by_cursor, &expected_rev);
        prop_assert!(cursor == avl_set.begin());
    }

    /// Inserting a present value or removing an absent one changes nothing.
    #[test]
    fn redundant_mutations_are_noops(
        values in proptest::collection::vec(value_strategy(), 1..200),
        probe in value_strategy(),
    ) {
        let mut set: AvlSet<i32> = values.iter().copied().collect();
        let before: Vec<_> = set.iter().copied().collect();

        prop_assert!(!set.insert(values[0]));
        if !values.contains(&probe) {
            prop_assert!(!set.remove(&probe));
        }
        let after: Vec<_> = set.iter().copied().collect();
        prop_assert_eq!(before, after);
    }

    /// A clone keeps its contents while the original is mutated.
    #[test]
    fn clone_is_independent(
        values in proptest::collection::vec(value_strategy(), 0..200),
        extra in proptest::collection::vec(value_strategy(), 0..50),
    ) {
        let mut original: AvlSet<i32> = values.iter().copied().collect();
        let copy = original.clone();
        let snapshot: Vec<_> = copy.iter().copied().collect();

        for v in &extra {
            if !original.insert(*v) {
                original.remove(v);
            }
        }
        let after: Vec<_> = copy.iter().copied().collect();
        prop_assert_eq!(snapshot, after);
    }

    /// A position stays on its value across unrelated mutations.
    #[test]
    fn position_tracks_its_value(
        values in proptest::collection::vec(value_strategy(), 1..300),
        churn in proptest::collection::vec(value_strategy(), 0..300),
    ) {
        let mut set: AvlSet<i32> = values.iter().copied().collect();
        let anchor = values[values.len() / 2];
        let position = set.find(&anchor).position();

        for v in churn.iter().filter(|&&v| v != anchor) {
            if !set.insert(*v) {
                set.remove(v);
            }
        }

        let cursor = set.cursor_at(position);
        prop_assert!(cursor.is_some());
        let cursor = cursor.unwrap();
        prop_assert_eq!(cursor.get(), Some(&anchor));
        prop_assert_eq!(cursor.peek_next(), set.iter().find(|&&v| v > anchor));
        prop_assert_eq!(cursor.peek_prev(), set.iter().rev().find(|&&v| v < anchor));
    }
}
