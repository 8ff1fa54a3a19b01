//! HashSet: membership over a `HashMap<E, ()>`.

use crate::config::HashConfig;
use crate::error::Result;
use crate::hash_map::HashMap;
use crate::persist::{Persist, Record};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use std::io::{Read, Write};

pub struct HashSet<E, S = DefaultHashBuilder> {
    map: HashMap<E, (), S>,
}

impl<E> HashSet<E, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn with_load_factor(load_factor: f64) -> Result<Self> {
        Ok(Self {
            map: HashMap::with_load_factor(load_factor)?,
        })
    }

    pub fn with_config(config: HashConfig) -> Result<Self> {
        Ok(Self {
            map: HashMap::with_config(config)?,
        })
    }
}

impl<E> Default for HashSet<E, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, S> HashSet<E, S> {
    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            map: HashMap::with_config_and_hasher(config, hasher)?,
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &E> + '_ {
        self.map.iter().map(|(e, _)| e)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&E) -> bool,
    {
        self.map.retain(|e, _| keep(e));
    }
}

impl<E, S> HashSet<E, S>
where
    E: Eq + Hash,
    S: BuildHasher,
{
    /// Add `element`; `Ok(false)` when it was already present.
    pub fn insert(&mut self, element: E) -> Result<bool> {
        Ok(self.map.put(element, ())?.is_none())
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<()>
    where
        E: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(q)
    }

    pub fn take<Q>(&mut self, q: &Q) -> Result<E>
    where
        E: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove_entry(q).map(|(e, _)| e)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(q)
    }
}

impl<E, S> PartialEq for HashSet<E, S>
where
    E: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<E: Eq + Hash, S: BuildHasher> Eq for HashSet<E, S> {}

impl<E: core::fmt::Debug, S> core::fmt::Debug for HashSet<E, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<E, S> Persist for HashSet<E, S>
where
    E: Eq + Hash + Record,
    S: BuildHasher + Default,
{
    fn persist<W: Write>(&self, w: &mut W) -> Result<()> {
        self.map.persist(w)
    }

    fn restore<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            map: HashMap::restore(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectionError;

    #[test]
    fn insert_reports_novelty() {
        let mut s: HashSet<String> = HashSet::new();
        assert!(s.insert("a".to_string()).unwrap());
        assert!(!s.insert("a".to_string()).unwrap());
        assert_eq!(s.len(), 1);
        assert!(s.contains("a"));
    }

    #[test]
    fn remove_missing_is_an_error() {
        let mut s: HashSet<i32> = HashSet::new();
        assert!(matches!(s.remove(&1), Err(CollectionError::EmptyContainer)));
        s.insert(2).unwrap();
        assert!(matches!(s.remove(&1), Err(CollectionError::KeyNotFound)));
        s.remove(&2).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn retain_and_equality() {
        let mut a: HashSet<i32> = HashSet::new();
        let mut b: HashSet<i32> = HashSet::new();
        for i in 0..10 {
            a.insert(i).unwrap();
        }
        for i in (0..10).rev().filter(|i| i % 2 == 0) {
            b.insert(i).unwrap();
        }
        assert_ne!(a, b);
        a.retain(|i| i % 2 == 0);
        assert_eq!(a, b);
        assert_eq!(b.take(&4).unwrap(), 4);
        assert_eq!(b.len(), 4);
    }
}
