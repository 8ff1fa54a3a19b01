#![cfg(test)]

// Property tests for TreeMap: equivalence with BTreeMap plus the red-black
// shape checks, which need crate-private access to the node links.

use crate::compare::ReverseOrder;
use crate::error::CollectionError;
use crate::ownership::Position;
use crate::tree_map::TreeMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap as StdHashMap};

#[derive(Clone, Debug)]
enum Op {
    Put(u8, i32),
    Remove(u8),
    RemoveAt(u8),
    RemoveFirst,
    RemoveLast,
    RemoveNext(u8),
    RemovePrevious(u8),
    Next(u8),
    Previous(u8),
    Get(u8),
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // Keys drawn from a small range so removals and overwrites hit often.
    let key = 0u8..48;
    let op = prop_oneof![
        8 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Put(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::RemoveAt),
        1 => Just(Op::RemoveFirst),
        1 => Just(Op::RemoveLast),
        1 => key.clone().prop_map(Op::RemoveNext),
        1 => key.clone().prop_map(Op::RemovePrevious),
        2 => key.clone().prop_map(Op::Next),
        2 => key.clone().prop_map(Op::Previous),
        2 => key.clone().prop_map(Op::Get),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..120)
}

fn model_next(model: &BTreeMap<u8, i32>, k: u8) -> Option<(u8, i32)> {
    model.range(k.saturating_add(1)..).next().map(|(k, v)| (*k, *v)).filter(|(n, _)| *n > k)
}

fn model_previous(model: &BTreeMap<u8, i32>, k: u8) -> Option<(u8, i32)> {
    model.range(..k).next_back().map(|(k, v)| (*k, *v))
}

// Outcome of a neighbour query: Ok(neighbour) or the error the tree must report.
fn expected_neighbour(
    model: &BTreeMap<u8, i32>,
    k: u8,
    forward: bool,
) -> Result<(u8, i32), &'static str> {
    if model.is_empty() {
        return Err("empty");
    }
    if !model.contains_key(&k) {
        return Err("missing");
    }
    let n = if forward {
        model_next(model, k)
    } else {
        model_previous(model, k)
    };
    n.ok_or("end")
}

fn error_name(e: &CollectionError) -> &'static str {
    match e {
        CollectionError::EmptyContainer => "empty",
        CollectionError::KeyNotFound => "missing",
        CollectionError::ElementNotFound => "end",
        _ => "other",
    }
}

// Property: state-machine equivalence against BTreeMap.
// - every mutation keeps root black, no red-red edge, equal black heights,
//   consistent parent links and a strictly ascending in-order walk;
// - navigation reports empty / missing / past-the-end exactly like the model;
// - positions of untouched entries survive every rotation and splice.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut: TreeMap<u8, i32> = TreeMap::new();
        let mut model: BTreeMap<u8, i32> = BTreeMap::new();
        let mut live: StdHashMap<u8, Position> = StdHashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let (p, old) = sut.put_position(k, v);
                    prop_assert_eq!(old, model.insert(k, v));
                    if let Some(&lp) = live.get(&k) {
                        prop_assert_eq!(p, lp);
                    }
                    live.insert(k, p);
                }
                Op::Remove(k) => {
                    let got = sut.remove(&k).map_err(|e| error_name(&e));
                    let want = if model.is_empty() {
                        Err("empty")
                    } else {
                        model.remove(&k).ok_or("missing")
                    };
                    prop_assert_eq!(got, want);
                    live.remove(&k);
                }
                Op::RemoveAt(k) => {
                    if let Some(p) = live.remove(&k) {
                        prop_assert_eq!(sut.remove_at(p).unwrap(), (k, model.remove(&k).unwrap()));
                        prop_assert!(matches!(sut.get_at(p), Err(CollectionError::NotOwned)));
                    }
                }
                Op::RemoveFirst => {
                    let got = sut.remove_first().map_err(|e| error_name(&e));
                    let want = model.pop_first().ok_or("empty");
                    if let Ok((k, _)) = want {
                        live.remove(&k);
                    }
                    prop_assert_eq!(got, want);
                }
                Op::RemoveLast => {
                    let got = sut.remove_last().map_err(|e| error_name(&e));
                    let want = model.pop_last().ok_or("empty");
                    if let Ok((k, _)) = want {
                        live.remove(&k);
                    }
                    prop_assert_eq!(got, want);
                }
                Op::RemoveNext(k) | Op::RemovePrevious(k) => {
                    let forward = matches!(op, Op::RemoveNext(_));
                    let want = expected_neighbour(&model, k, forward);
                    let got = if forward { sut.remove_next(&k) } else { sut.remove_previous(&k) }
                        .map_err(|e| error_name(&e));
                    prop_assert_eq!(got, want);
                    if let Ok((n, _)) = want {
                        model.remove(&n);
                        live.remove(&n);
                    }
                }
                Op::Next(k) | Op::Previous(k) => {
                    let forward = matches!(op, Op::Next(_));
                    let want = expected_neighbour(&model, k, forward);
                    let got = if forward { sut.next(&k) } else { sut.previous(&k) }
                        .map(|(k, v)| (*k, *v))
                        .map_err(|e| error_name(&e));
                    prop_assert_eq!(got, want);
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k).ok(), model.get(&k));
                }
                Op::Iterate => {
                    let fwd: Vec<(u8, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                    let want: Vec<(u8, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(&fwd, &want);
                    let mut back: Vec<(u8, i32)> = sut.iter().rev().map(|(k, v)| (*k, *v)).collect();
                    back.reverse();
                    prop_assert_eq!(back, want);
                }
            }

            sut.assert_invariants();
            prop_assert_eq!(sut.len(), model.len());
            for (k, &p) in &live {
                prop_assert_eq!(sut.key_at(p).ok(), Some(k));
            }
        }
    }

    // Property: a reverse comparator yields the model's order reversed and
    // keeps the same shape invariants.
    #[test]
    fn prop_reverse_order(keys in proptest::collection::vec(any::<i16>(), 0..200)) {
        let mut sut = TreeMap::with_comparator(ReverseOrder);
        let mut model = BTreeMap::new();
        for &k in &keys {
            prop_assert_eq!(sut.put(k, ()), model.insert(k, ()));
        }
        sut.assert_invariants();
        let got: Vec<i16> = sut.keys().copied().collect();
        let want: Vec<i16> = model.keys().rev().copied().collect();
        prop_assert_eq!(got, want);
        for &k in keys.iter().step_by(2) {
            let _ = sut.remove(&k);
            model.remove(&k);
            sut.assert_invariants();
        }
        prop_assert_eq!(sut.len(), model.len());
    }
}
