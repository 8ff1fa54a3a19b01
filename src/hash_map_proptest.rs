#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can check chain
// structure through crate-private helpers.

use crate::config::HashConfig;
use crate::error::CollectionError;
use crate::hash_map::HashMap;
use crate::ownership::Position;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap as StdHashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    RemoveAt(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Retain(i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::RemoveAt),
            2 => idx.clone().prop_map(Op::Get),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(Op::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (2..5i32).prop_map(Op::Retain),
            2 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Collision variant: every key lands in bucket 0.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

fn run_state_machine<S: BuildHasher>(
    mut sut: HashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: StdHashMap<Key, i32> = StdHashMap::new();
    let mut live: StdHashMap<Key, Position> = StdHashMap::new();
    let mut stale: Vec<Position> = Vec::new();

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = key_from(&pool, i);
                let prev = sut.put(k.clone(), v).expect("default maximum is never reached");
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                let p = sut.find(&k).expect("just inserted");
                if let Some(&lp) = live.get(&k) {
                    prop_assert_eq!(p, lp, "overwrite must keep the entry's position");
                }
                live.insert(k, p);
            }
            Op::Replace(i, v) => {
                let k = key_from(&pool, i);
                let expected = model.get_mut(&k).map(|mv| std::mem::replace(mv, v));
                prop_assert_eq!(sut.replace(k, v), expected);
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                match sut.remove(&k) {
                    Ok(v) => {
                        prop_assert_eq!(Some(v), model.remove(&k));
                        stale.push(live.remove(&k).expect("tracked"));
                    }
                    Err(CollectionError::EmptyContainer) => prop_assert!(model.is_empty()),
                    Err(CollectionError::KeyNotFound) => {
                        prop_assert!(!model.is_empty() && !model.contains_key(&k))
                    }
                    Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                }
            }
            Op::RemoveAt(i) => {
                let k = key_from(&pool, i);
                if let Some(p) = live.remove(&k) {
                    let (kk, vv) = sut.remove_at(p).expect("live position");
                    prop_assert!(kk == k);
                    prop_assert_eq!(Some(vv), model.remove(&kk));
                    stale.push(p);
                }
            }
            Op::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(&k).ok(), model.get(&k));
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(&p) = live.get(&k) {
                    let vr = sut.get_at_mut(p).expect("live position");
                    *vr = vr.wrapping_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.wrapping_add(d);
                }
            }
            Op::Retain(m) => {
                sut.retain(|_, v| *v % m != 0);
                model.retain(|_, v| *v % m != 0);
                let gone: Vec<Key> = live
                    .keys()
                    .filter(|k| !model.contains_key(*k))
                    .cloned()
                    .collect();
                for k in gone {
                    stale.push(live.remove(&k).expect("tracked"));
                }
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                stale.extend(live.drain().map(|(_, p)| p));
                prop_assert_eq!(sut.capacity(), sut.config().initial_capacity);
            }
        }

        // Post-conditions after each op
        for &p in &stale {
            prop_assert!(matches!(sut.get_at(p), Err(CollectionError::NotOwned)));
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.assert_chains();
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - put/replace/remove agree with the model on returned values;
// - positions stay stable across overwrites and growth, go stale on removal;
// - chains hold every entry exactly once, each in its hash's bucket;
// - the load never exceeds the configured factor.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(HashMap::new(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_small_load_factor((pool, ops) in arb_scenario()) {
        run_state_machine(HashMap::with_load_factor(0.25).unwrap(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = HashMap::with_config_and_hasher(HashConfig::default(), ConstBuildHasher).unwrap();
        run_state_machine(sut, pool, ops)?;
    }
}
