//! TreeSet: ordered membership over a `TreeMap<E, ()>`.

use crate::compare::{Comparator, NaturalOrder};
use crate::error::Result;
use crate::persist::{Persist, Record};
use crate::tree_map::TreeMap;
use core::borrow::Borrow;
use std::io::{Read, Write};

pub struct TreeSet<E, C = NaturalOrder> {
    map: TreeMap<E, (), C>,
}

impl<E> TreeSet<E, NaturalOrder> {
    pub fn new() -> Self {
        Self {
            map: TreeMap::new(),
        }
    }
}

impl<E, C: Default> Default for TreeSet<E, C> {
    fn default() -> Self {
        Self {
            map: TreeMap::default(),
        }
    }
}

impl<E, C> TreeSet<E, C> {
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            map: TreeMap::with_comparator(comparator),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn first(&self) -> Result<&E> {
        self.map.first().map(|(e, _)| e)
    }

    pub fn last(&self) -> Result<&E> {
        self.map.last().map(|(e, _)| e)
    }

    pub fn remove_first(&mut self) -> Result<E> {
        self.map.remove_first().map(|(e, _)| e)
    }

    pub fn remove_last(&mut self) -> Result<E> {
        self.map.remove_last().map(|(e, _)| e)
    }

    /// Ascending by the set's comparator.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &E> + ExactSizeIterator + '_ {
        self.map.iter().map(|(e, _)| e)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.contains_key(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<()>
    where
        E: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.remove(q)
    }

    pub fn previous<Q>(&self, q: &Q) -> Result<&E>
    where
        E: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.previous(q).map(|(e, _)| e)
    }

    pub fn next<Q>(&self, q: &Q) -> Result<&E>
    where
        E: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.next(q).map(|(e, _)| e)
    }

    pub fn remove_previous<Q>(&mut self, q: &Q) -> Result<E>
    where
        E: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.remove_previous(q).map(|(e, _)| e)
    }

    pub fn remove_next<Q>(&mut self, q: &Q) -> Result<E>
    where
        E: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.remove_next(q).map(|(e, _)| e)
    }
}

impl<E, C: Comparator<E>> TreeSet<E, C> {
    /// Add `element`; false when an equal element was already present.
    pub fn insert(&mut self, element: E) -> bool {
        self.map.put(element, ()).is_none()
    }
}

impl<E: PartialEq, C> PartialEq for TreeSet<E, C> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<E: Eq, C> Eq for TreeSet<E, C> {}

impl<E: core::fmt::Debug, C> core::fmt::Debug for TreeSet<E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<E, C: Comparator<E> + Default> FromIterator<E> for TreeSet<E, C> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut set = TreeSet::default();
        set.extend(iter);
        set
    }
}

impl<E, C: Comparator<E>> Extend<E> for TreeSet<E, C> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for e in iter {
            self.insert(e);
        }
    }
}

impl<E, C> Persist for TreeSet<E, C>
where
    E: Record,
    C: Comparator<E> + Record,
{
    fn persist<W: Write>(&self, w: &mut W) -> Result<()> {
        self.map.persist(w)
    }

    fn restore<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            map: TreeMap::restore(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ReverseOrder;
    use crate::error::CollectionError;

    #[test]
    fn ordered_navigation() {
        let s: TreeSet<i32> = [5, 1, 9, 3].into_iter().collect();
        assert_eq!(*s.first().unwrap(), 1);
        assert_eq!(*s.last().unwrap(), 9);
        assert_eq!(*s.next(&3).unwrap(), 5);
        assert_eq!(*s.previous(&3).unwrap(), 1);
        assert!(matches!(s.next(&9), Err(CollectionError::ElementNotFound)));
        assert!(matches!(s.next(&4), Err(CollectionError::KeyNotFound)));
        assert_eq!(s.iter().rev().copied().collect::<Vec<_>>(), [9, 5, 3, 1]);
    }

    #[test]
    fn insert_dedups_and_removal_variants() {
        let mut s: TreeSet<i32, ReverseOrder> = TreeSet::with_comparator(ReverseOrder);
        assert!(s.insert(1));
        assert!(s.insert(2));
        assert!(!s.insert(2));
        s.extend([3, 4]);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), [4, 3, 2, 1]);
        assert_eq!(s.remove_first().unwrap(), 4);
        assert_eq!(s.remove_last().unwrap(), 1);
        assert_eq!(s.remove_next(&3).unwrap(), 2);
        assert!(matches!(
            s.remove_previous(&3),
            Err(CollectionError::ElementNotFound)
        ));
        s.remove(&3).unwrap();
        assert!(s.is_empty());
        assert!(matches!(s.first(), Err(CollectionError::EmptyContainer)));
    }

    #[test]
    fn equality_follows_order() {
        let a: TreeSet<&str> = ["b", "a"].into_iter().collect();
        let b: TreeSet<&str> = ["a", "b"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(format!("{:?}", a), r#"{"a", "b"}"#);
    }
}
