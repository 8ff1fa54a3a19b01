use owned_collections::{CollectionError, OrderBy, ReverseOrder, TreeMap};

fn sample() -> TreeMap<i32, &'static str> {
    let mut t = TreeMap::new();
    for (k, v) in [
        (5, "five"),
        (3, "three"),
        (8, "eight"),
        (1, "one"),
        (4, "four"),
        (7, "seven"),
        (9, "nine"),
    ] {
        assert_eq!(t.put(k, v), None);
    }
    t
}

#[test]
fn navigation_on_seven_keys() {
    let mut t = sample();
    assert_eq!(t.first().unwrap(), (&1, &"one"));
    assert_eq!(t.last().unwrap(), (&9, &"nine"));
    assert_eq!(t.next(&5).unwrap().0, &7);
    assert_eq!(t.previous(&5).unwrap().0, &4);

    assert_eq!(t.remove(&5).unwrap(), "five");
    assert!(!t.contains_key(&5));
    assert_eq!(t.len(), 6);
    // neighbours close over the removed key
    assert_eq!(t.next(&4).unwrap().0, &7);
    assert_eq!(t.keys().copied().collect::<Vec<_>>(), [1, 3, 4, 7, 8, 9]);
}

#[test]
fn error_kinds_are_distinct() {
    let mut t: TreeMap<i32, i32> = TreeMap::new();
    assert!(matches!(t.get(&1), Err(CollectionError::EmptyContainer)));
    assert!(matches!(t.remove_first(), Err(CollectionError::EmptyContainer)));
    assert!(matches!(t.previous(&1), Err(CollectionError::EmptyContainer)));

    t.put(1, 1);
    assert!(matches!(t.get(&2), Err(CollectionError::KeyNotFound)));
    assert!(matches!(t.remove(&2), Err(CollectionError::KeyNotFound)));
    assert!(matches!(t.next(&1), Err(CollectionError::ElementNotFound)));
    assert!(matches!(t.previous(&1), Err(CollectionError::ElementNotFound)));
}

#[test]
fn remove_ends_and_neighbours() {
    let mut t = sample();
    assert_eq!(t.remove_first().unwrap(), (1, "one"));
    assert_eq!(t.remove_last().unwrap(), (9, "nine"));
    assert_eq!(t.remove_next(&4).unwrap(), (5, "five"));
    assert_eq!(t.remove_previous(&4).unwrap(), (3, "three"));
    assert_eq!(t.keys().copied().collect::<Vec<_>>(), [4, 7, 8]);
}

#[test]
fn large_random_workload_stays_sorted() {
    let mut t = TreeMap::new();
    let mut s = 0x2545_f491_4f6c_dd1du64;
    let mut inserted = std::collections::BTreeSet::new();
    for _ in 0..5_000 {
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        let k = (s % 2_000) as u32;
        t.put(k, k);
        inserted.insert(k);
    }
    assert_eq!(t.len(), inserted.len());
    assert!(t.keys().copied().eq(inserted.iter().copied()));
    for k in inserted.iter().filter(|k| *k % 2 == 0) {
        assert_eq!(t.remove(k).unwrap(), *k);
    }
    assert!(t.keys().all(|k| k % 2 == 1));
    assert!(t.keys().rev().copied().eq(inserted.iter().rev().copied().filter(|k| k % 2 == 1)));
}

#[test]
fn comparator_defines_key_identity() {
    let mut t = TreeMap::with_comparator(OrderBy(|a: &String, b: &String| {
        a.to_lowercase().cmp(&b.to_lowercase())
    }));
    t.put("Apple".to_string(), 1);
    assert_eq!(t.put("APPLE".to_string(), 2), Some(1));
    assert_eq!(t.len(), 1);

    let mut r = TreeMap::with_comparator(ReverseOrder);
    r.extend([(1, 'a'), (3, 'c'), (2, 'b')]);
    assert_eq!(r.first().unwrap(), (&3, &'c'));
    assert_eq!(r.next(&3).unwrap(), (&2, &'b'));
}

#[test]
fn positions_survive_rebalancing() {
    let mut t = TreeMap::new();
    let mut positions = Vec::new();
    for k in 0..64 {
        let (p, _) = t.put_position(k, k * 2);
        positions.push(p);
    }
    for k in (0..64).filter(|k| k % 4 == 0) {
        t.remove(&k).unwrap();
    }
    for (k, p) in positions.iter().enumerate() {
        let k = k as i32;
        if k % 4 == 0 {
            assert!(matches!(t.get_at(*p), Err(CollectionError::NotOwned)));
        } else {
            assert_eq!(t.key_at(*p).unwrap(), &k);
            assert_eq!(*t.get_at(*p).unwrap(), k * 2);
        }
    }
    *t.get_at_mut(positions[1]).unwrap() = -1;
    assert_eq!(t.remove_at(positions[1]).unwrap(), (1, -1));
}

#[test]
fn cursor_drains_matching_entries() {
    let mut t: TreeMap<i32, i32> = (0..10).map(|k| (k, k)).collect();
    {
        let mut c = t.cursor_first_mut();
        while !c.is_at_end() {
            if c.key().map_or(false, |k| k % 3 == 0) {
                c.remove_current();
            } else {
                c.move_next();
            }
        }
    }
    assert_eq!(t.keys().copied().collect::<Vec<_>>(), [1, 2, 4, 5, 7, 8]);
}

#[test]
fn equality_and_debug() {
    let a = sample();
    let b = sample();
    assert_eq!(a, b);
    let mut c = sample();
    *c.get_mut(&1).unwrap() = "uno";
    assert_ne!(a, c);
    let small: TreeMap<i32, i32> = [(2, 20), (1, 10)].into_iter().collect();
    assert_eq!(format!("{:?}", small), "{1: 10, 2: 20}");
}

mod nested_reads {
    use owned_collections::TreeMap;
    use std::cell::RefCell;
    use std::cmp::Ordering;
    use std::rc::{Rc, Weak};

    /// A key whose ordering may read the tree it is being compared in.
    struct Key {
        id: i32,
        peek: Option<Weak<RefCell<TreeMap<Key, &'static str>>>>,
    }

    impl Key {
        fn plain(id: i32) -> Self {
            Key { id, peek: None }
        }
    }

    impl Ord for Key {
        fn cmp(&self, other: &Self) -> Ordering {
            if let Some(tree) = self.peek.as_ref().and_then(Weak::upgrade) {
                assert!(!tree.borrow().is_empty());
                assert!(tree.borrow().contains_key(&Key::plain(self.id)));
            }
            self.id.cmp(&other.id)
        }
    }

    impl PartialOrd for Key {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl PartialEq for Key {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for Key {}

    /// Invariant: a comparator may read the same tree during a lookup.
    #[test]
    fn comparator_can_read_the_tree() {
        let tree = Rc::new(RefCell::new(TreeMap::new()));
        for (id, v) in [(1, "one"), (2, "two"), (3, "three")] {
            tree.borrow_mut().put(Key::plain(id), v);
        }
        let key = Key {
            id: 3,
            peek: Some(Rc::downgrade(&tree)),
        };
        assert_eq!(*tree.borrow().get(&key).unwrap(), "three");
        assert!(tree.borrow().find(&key).is_some());
    }
}
