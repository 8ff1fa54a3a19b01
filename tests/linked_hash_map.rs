use owned_collections::{CollectionError, LinkedHashMap};

fn keys(m: &LinkedHashMap<&'static str, i32>) -> Vec<&'static str> {
    m.keys().copied().collect()
}

#[test]
fn iteration_follows_insertion_order() {
    let mut m = LinkedHashMap::new();
    for (i, k) in ["delta", "alpha", "charlie", "bravo"].into_iter().enumerate() {
        m.put(k, i as i32).unwrap();
    }
    assert_eq!(keys(&m), ["delta", "alpha", "charlie", "bravo"]);
    assert_eq!(
        m.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
        [0, 1, 2, 3]
    );
    assert_eq!(m.iter().rev().next(), Some((&"bravo", &3)));
}

#[test]
fn reinserting_never_duplicates() {
    let mut m = LinkedHashMap::new();
    m.put("a", 1).unwrap();
    m.put("b", 2).unwrap();
    for v in 0..10 {
        m.put("a", v).unwrap();
    }
    assert_eq!(keys(&m), ["a", "b"]);
    assert_eq!(m.len(), 2);
    assert_eq!(m.iter().count(), 2);
    assert_eq!(*m.get("a").unwrap(), 9);
}

#[test]
fn remove_then_reinsert_moves_to_back() {
    let mut m = LinkedHashMap::new();
    for (i, k) in ["x", "y", "z"].into_iter().enumerate() {
        m.put(k, i as i32).unwrap();
    }
    assert_eq!(m.remove("x").unwrap(), 0);
    m.put("x", 7).unwrap();
    assert_eq!(keys(&m), ["y", "z", "x"]);
    assert_eq!(m.first().unwrap(), (&"y", &1));
    assert_eq!(m.last().unwrap(), (&"x", &7));
}

#[test]
fn navigation_errors_mirror_the_sequence() {
    let mut m: LinkedHashMap<&'static str, i32> = LinkedHashMap::new();
    assert!(matches!(m.first(), Err(CollectionError::EmptyContainer)));
    assert!(matches!(m.next("a"), Err(CollectionError::EmptyContainer)));
    m.put("a", 1).unwrap();
    assert!(matches!(m.next("q"), Err(CollectionError::KeyNotFound)));
    assert!(matches!(m.next("a"), Err(CollectionError::ElementNotFound)));
    assert!(matches!(m.remove_previous("a"), Err(CollectionError::ElementNotFound)));
    assert_eq!(m.len(), 1);
}

#[test]
fn sort_then_navigate() {
    let mut m = LinkedHashMap::new();
    for k in [40, 10, 30, 20] {
        m.put(k, k / 10).unwrap();
    }
    m.sort_keys_by(|a, b| a.cmp(b));
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), [10, 20, 30, 40]);
    assert_eq!(m.next(&20).unwrap(), (&30, &3));
    assert_eq!(m.remove_next(&10).unwrap(), (20, 2));
    assert_eq!(m.previous(&30).unwrap(), (&10, &1));
    *m.get_mut(&40).unwrap() = 0;
    assert_eq!(m.remove_last().unwrap(), (40, 0));
    assert_eq!(m.remove_first().unwrap(), (10, 1));
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), [30]);
}
