use std::collections::BTreeMap;

use bplus_tree::{BPlusTreeMap, TreeError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Generates random keys in a range small enough to cause collisions.
fn key_strategy() -> impl Strategy<Value = i64> {
    -1_000i64..1_000i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

/// Node capacities worth exercising: the minimum legal order, an odd order,
/// and the default.
fn order_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(3), Just(5), Just(16)]
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    Remove(i64),
    Get(i64),
    ContainsKey(i64),
    GetKeyValue(i64),
    FirstKeyValue,
    LastKeyValue,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::ContainsKey),
        1 => key_strategy().prop_map(MapOp::GetKeyValue),
        1 => Just(MapOp::FirstKeyValue),
        1 => Just(MapOp::LastKeyValue),
    ]
}

// ─── Core CRUD operations ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of insert/remove/get operations on both
    /// BPlusTreeMap and BTreeMap and asserts identical results at every step.
    #[test]
    fn map_ops_match_btreemap(
        order in order_strategy(),
        ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE),
    ) {
        let mut bp_map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(order);
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    let bp_result = bp_map.insert(*k, *v);
                    let bt_result = bt_map.insert(*k, *v);
                    prop_assert_eq!(bp_result, bt_result, "insert({}, {})", k, v);
                }
                MapOp::Remove(k) => {
                    let bp_result = bp_map.remove(k);
                    let bt_result = bt_map.remove(k);
                    prop_assert_eq!(bp_result, bt_result, "remove({})", k);
                }
                MapOp::Get(k) => {
                    let bp_result = bp_map.get(k);
                    let bt_result = bt_map.get(k);
                    prop_assert_eq!(bp_result, bt_result, "get({})", k);
                }
                MapOp::ContainsKey(k) => {
                    let bp_result = bp_map.contains_key(k);
                    let bt_result = bt_map.contains_key(k);
                    prop_assert_eq!(bp_result, bt_result, "contains_key({})", k);
                }
                MapOp::GetKeyValue(k) => {
                    let bp_result = bp_map.get_key_value(k);
                    let bt_result = bt_map.get_key_value(k);
                    prop_assert_eq!(bp_result, bt_result, "get_key_value({})", k);
                }
                MapOp::FirstKeyValue => {
                    let bp_result = bp_map.first_key_value().ok();
                    let bt_result = bt_map.first_key_value();
                    prop_assert_eq!(bp_result, bt_result, "first_key_value");
                }
                MapOp::LastKeyValue => {
                    let bp_result = bp_map.last_key_value().ok();
                    let bt_result = bt_map.last_key_value();
                    prop_assert_eq!(bp_result, bt_result, "last_key_value");
                }
            }
            prop_assert_eq!(bp_map.len(), bt_map.len(), "len mismatch after {:?}", op);
            prop_assert_eq!(bp_map.is_empty(), bt_map.is_empty(), "is_empty mismatch after {:?}", op);
        }
    }

    /// Tests that iteration order matches BTreeMap after random insertions.
    #[test]
    fn iter_matches_btreemap(
        order in order_strategy(),
        entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE),
    ) {
        let mut bp_map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(order);
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for (k, v) in &entries {
            bp_map.insert(*k, *v);
            bt_map.insert(*k, *v);
        }

        // Forward iteration
        let bp_items: Vec<_> = bp_map.iter().map(|(&k, &v)| (k, v)).collect();
        let bt_items: Vec<_> = bt_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&bp_items, &bt_items, "iter() mismatch");

        // Reverse iteration
        let bp_rev: Vec<_> = bp_map.iter().rev().map(|(&k, &v)| (k, v)).collect();
        let bt_rev: Vec<_> = bt_map.iter().rev().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&bp_rev, &bt_rev, "iter().rev() mismatch");

        // Keys
        let bp_keys: Vec<_> = bp_map.keys().copied().collect();
        let bt_keys: Vec<_> = bt_map.keys().copied().collect();
        prop_assert_eq!(&bp_keys, &bt_keys, "keys() mismatch");

        // Values
        let bp_vals: Vec<_> = bp_map.values().copied().collect();
        let bt_vals: Vec<_> = bt_map.values().copied().collect();
        prop_assert_eq!(&bp_vals, &bt_vals, "values() mismatch");

        // &map into_iter
        let bp_ref: Vec<_> = (&bp_map).into_iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&bp_ref, &bt_items, "(&map).into_iter() mismatch");
    }

    /// Tests ExactSizeIterator and DoubleEndedIterator behavior.
    #[test]
    fn iter_size_and_double_ended(
        order in order_strategy(),
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..TEST_SIZE),
    ) {
        let mut bp_map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(order);
        for (k, v) in &entries {
            bp_map.insert(*k, *v);
        }

        let iter = bp_map.iter();
        prop_assert_eq!(iter.len(), bp_map.len(), "ExactSizeIterator len mismatch");

        // Alternating front/back should yield all elements exactly once
        let mut from_front = Vec::new();
        let mut from_back = Vec::new();
        let mut iter = bp_map.iter();
        let mut toggle = true;
        loop {
            if toggle {
                if let Some(item) = iter.next() {
                    from_front.push(item);
                } else {
                    break;
                }
            } else if let Some(item) = iter.next_back() {
                from_back.push(item);
            } else {
                break;
            }
            toggle = !toggle;
        }
        prop_assert_eq!(from_front.len() + from_back.len(), bp_map.len());

        from_back.reverse();
        from_front.extend(from_back);
        let expected: Vec<_> = bp_map.iter().collect();
        prop_assert_eq!(from_front, expected, "front/back interleave mismatch");
    }

    /// Tests get_mut mutations persist and match BTreeMap.
    #[test]
    fn get_mut_matches_btreemap(
        order in order_strategy(),
        entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE),
        keys_to_mutate in proptest::collection::vec(key_strategy(), 100),
    ) {
        let mut bp_map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(order);
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for (k, v) in &entries {
            bp_map.insert(*k, *v);
            bt_map.insert(*k, *v);
        }

        for k in &keys_to_mutate {
            if let Some(v) = bp_map.get_mut(k) {
                *v = v.wrapping_add(1);
            }
            if let Some(v) = bt_map.get_mut(k) {
                *v = v.wrapping_add(1);
            }
        }

        let bp_items: Vec<_> = bp_map.iter().map(|(&k, &v)| (k, v)).collect();
        let bt_items: Vec<_> = bt_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&bp_items, &bt_items, "get_mut mismatch");
    }

    /// Tests that clear produces an empty, reusable map.
    #[test]
    fn clear_empties_map(
        order in order_strategy(),
        entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE),
    ) {
        let mut bp_map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(order);
        for (k, v) in &entries {
            bp_map.insert(*k, *v);
        }

        bp_map.clear();
        prop_assert!(bp_map.is_empty());
        prop_assert_eq!(bp_map.len(), 0);
        prop_assert_eq!(bp_map.iter().count(), 0);
        prop_assert_eq!(bp_map.height(), 1);

        // The map stays usable after clear
        bp_map.insert(1, 10);
        prop_assert_eq!(bp_map.get(&1), Some(&10));
    }

    /// Tests FromIterator and Extend match BTreeMap.
    #[test]
    fn from_iter_and_extend_match_btreemap(
        initial in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE / 2),
        extra in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE / 2),
    ) {
        let mut bp_map: BPlusTreeMap<i64, i64> = initial.iter().copied().collect();
        let mut bt_map: BTreeMap<i64, i64> = initial.iter().copied().collect();

        bp_map.extend(extra.iter().copied());
        bt_map.extend(extra.iter().copied());

        let bp_items: Vec<_> = bp_map.iter().map(|(&k, &v)| (k, v)).collect();
        let bt_items: Vec<_> = bt_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&bp_items, &bt_items, "FromIterator/Extend mismatch");
    }

    /// Tests PartialEq compares by contents, independent of order and history.
    #[test]
    fn eq_compares_by_contents(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE),
    ) {
        let bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        let mut forward: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(4);
        let mut backward: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(7);
        for (&k, &v) in &bt_map {
            forward.insert(k, v);
        }
        for (&k, &v) in bt_map.iter().rev() {
            backward.insert(k, v);
        }

        prop_assert_eq!(&forward, &backward, "content equality mismatch");

        if let Some((&k, &v)) = bt_map.iter().next() {
            backward.insert(k, v.wrapping_add(1));
            prop_assert_ne!(&forward, &backward, "maps differ in one value");
        }
    }
}

// ─── Deterministic scenarios ─────────────────────────────────────────────────

#[test]
fn empty_map_behaves() {
    let mut map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(4);
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.height(), 1);
    assert_eq!(map.get(&1), None);
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.first_key_value(), Err(TreeError::EmptyTree));
    assert_eq!(map.last_key_value(), Err(TreeError::EmptyTree));
    assert_eq!(map.iter().next(), None);
}

#[test]
fn sequential_fill_and_drain() {
    let mut map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(4);
    for k in 0..1_000 {
        assert_eq!(map.insert(k, k * 10), None);
    }
    assert_eq!(map.len(), 1_000);
    assert!(map.height() > 1);
    assert_eq!(map.first_key_value(), Ok((&0, &0)));
    assert_eq!(map.last_key_value(), Ok((&999, &9_990)));
    assert_eq!(map.first_key(), Ok(&0));
    assert_eq!(map.last_key(), Ok(&999));

    for k in 0..1_000 {
        assert_eq!(map.remove(&k), Some(k * 10), "remove({k})");
    }
    assert!(map.is_empty());
    assert_eq!(map.height(), 1);
}

#[test]
fn reverse_fill_and_drain() {
    let mut map: BPlusTreeMap<i64, i64> = BPlusTreeMap::new(3);
    for k in (0..500).rev() {
        map.insert(k, k);
    }
    let keys: Vec<i64> = map.keys().copied().collect();
    let expected: Vec<i64> = (0..500).collect();
    assert_eq!(keys, expected);

    // Draining from the middle outward exercises both borrow directions.
    for k in 125..375 {
        assert_eq!(map.remove(&k), Some(k));
    }
    assert_eq!(map.len(), 250);
    assert!(map.keys().all(|&k| !(125..375).contains(&k)));
}

#[test]
fn insert_replaces_existing_value() {
    let mut map: BPlusTreeMap<&str, i32> = BPlusTreeMap::new(4);
    assert_eq!(map.insert("a", 1), None);
    assert_eq!(map.insert("a", 2), Some(1));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"a"), Some(&2));
}

#[test]
fn borrowed_key_lookups() {
    let mut map: BPlusTreeMap<String, i32> = BPlusTreeMap::new(4);
    map.insert("alpha".to_owned(), 1);
    map.insert("beta".to_owned(), 2);

    // Queries go through Borrow<str>, no String allocation needed.
    assert_eq!(map.get("alpha"), Some(&1));
    assert!(map.contains_key("beta"));
    assert_eq!(map.remove("alpha"), Some(1));
    assert_eq!(map.get("alpha"), None);
}

#[test]
fn debug_renders_as_map() {
    let mut map: BPlusTreeMap<i32, &str> = BPlusTreeMap::new(4);
    map.insert(2, "b");
    map.insert(1, "a");
    assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
}

#[test]
#[should_panic(expected = "order must be at least 3")]
fn order_two_is_rejected() {
    let _ = BPlusTreeMap::<i32, i32>::new(2);
}
