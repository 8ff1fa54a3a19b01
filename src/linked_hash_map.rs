//! LinkedHashMap: hash-table lookups with a caller-visible key sequence.
//!
//! Values live in a `HashMap<K, (V, Position)>`; the key order lives in a
//! `LinkedList<K>`, and each table entry remembers the list position of its
//! key. The two views change together inside one method call, so no caller
//! can observe a key in one view and not the other.

use crate::config::HashConfig;
use crate::error::{CollectionError, Result};
use crate::hash_map::HashMap;
use crate::linked_list::LinkedList;
use crate::ownership::Position;
use crate::persist::{read_len, read_load_factor, write_len, write_load_factor, Persist, Record};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use std::io::{Read, Write};

pub struct LinkedHashMap<K, V, S = DefaultHashBuilder> {
    table: HashMap<K, (V, Position), S>,
    order: LinkedList<K>,
}

impl<K, V> LinkedHashMap<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            order: LinkedList::new(),
        }
    }

    pub fn with_load_factor(load_factor: f64) -> Result<Self> {
        Self::with_config(HashConfig::with_load_factor(load_factor))
    }

    pub fn with_config(config: HashConfig) -> Result<Self> {
        Ok(Self {
            table: HashMap::with_config(config)?,
            order: LinkedList::new(),
        })
    }
}

impl<K, V> Default for LinkedHashMap<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> LinkedHashMap<K, V, S> {
    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            table: HashMap::with_config_and_hasher(config, hasher)?,
            order: LinkedList::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.order.clear();
    }

    /// Keys in sequence order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.order.iter()
    }

    /// Reorder the key sequence. Lookups are unaffected.
    pub fn sort_keys_by<F>(&mut self, compare: F)
    where
        F: FnMut(&K, &K) -> core::cmp::Ordering,
    {
        self.order.sort_by(compare);
    }
}

impl<K, V, S> LinkedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Table and list positions for `q`, both resolved before anything moves.
    fn locate<Q>(&self, q: &Q) -> Result<(Position, Position)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        let slot = self.table.find(q).ok_or(CollectionError::KeyNotFound)?;
        let link = self.table.get_at(slot)?.1;
        self.order.get_at(link)?;
        Ok((slot, link))
    }

    /// Table position of the key stored at list position `link`.
    fn slot_of(&self, link: Position) -> Result<Position> {
        let key = self.order.get_at(link)?;
        self.table.find(key).ok_or(CollectionError::KeyNotFound)
    }

    /// Remove one entry from both views. Both positions must already be
    /// resolved, so a failure here means the views disagree.
    fn unlink(&mut self, slot: Position, link: Position) -> (K, V) {
        self.order
            .remove_at(link)
            .expect("resolved sequence position must unlink");
        let (key, (value, _)) = self
            .table
            .remove_at(slot)
            .expect("resolved table position must unlink");
        (key, value)
    }

    fn value_of(&self, key: &K) -> &V {
        &self
            .table
            .get(key)
            .expect("sequenced key must be present in the table")
            .0
    }

    pub fn get<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(q).map(|(v, _)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_mut(q).map(|(v, _)| v)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (slot, link) = self.locate(q)?;
        Ok(self.unlink(slot, link))
    }

    pub fn first(&self) -> Result<(&K, &V)> {
        let key = self.order.first()?;
        Ok((key, self.value_of(key)))
    }

    pub fn last(&self) -> Result<(&K, &V)> {
        let key = self.order.last()?;
        Ok((key, self.value_of(key)))
    }

    /// Entry sequenced just before `q`.
    pub fn previous<Q>(&self, q: &Q) -> Result<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, link) = self.locate(q)?;
        let key = self.order.previous(link)?;
        Ok((key, self.value_of(key)))
    }

    /// Entry sequenced just after `q`.
    pub fn next<Q>(&self, q: &Q) -> Result<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, link) = self.locate(q)?;
        let key = self.order.next(link)?;
        Ok((key, self.value_of(key)))
    }

    pub fn remove_first(&mut self) -> Result<(K, V)> {
        let link = self.order.first_position()?;
        let slot = self.slot_of(link)?;
        Ok(self.unlink(slot, link))
    }

    pub fn remove_last(&mut self) -> Result<(K, V)> {
        let link = self.order.last_position()?;
        let slot = self.slot_of(link)?;
        Ok(self.unlink(slot, link))
    }

    pub fn remove_previous<Q>(&mut self, q: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, link) = self.locate(q)?;
        let link = self.order.previous_position(link)?;
        let slot = self.slot_of(link)?;
        Ok(self.unlink(slot, link))
    }

    pub fn remove_next<Q>(&mut self, q: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, link) = self.locate(q)?;
        let link = self.order.next_position(link)?;
        let slot = self.slot_of(link)?;
        Ok(self.unlink(slot, link))
    }

    /// Entries in sequence order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.order.iter().map(move |k| (k, self.value_of(k)))
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> LinkedHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Insert or overwrite. A new key goes to the end of the sequence; an
    /// existing key keeps its place and only its value changes.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        if let Ok((slot, _)) = self.table.get_mut(&key) {
            return Ok(Some(std::mem::replace(slot, value)));
        }
        let link = self.order.push_back(key.clone());
        match self.table.put(key, (value, link)) {
            Ok(_) => Ok(None),
            Err(err) => {
                // Undo the staged append so both views agree again.
                let rolled_back = self.order.remove_at(link);
                debug_assert!(rolled_back.is_ok(), "staged append must be removable");
                Err(err)
            }
        }
    }
}

impl<K, V, S> PartialEq for LinkedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> core::fmt::Debug for LinkedHashMap<K, V, S>
where
    K: Eq + Hash + core::fmt::Debug,
    V: core::fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Persist for LinkedHashMap<K, V, S>
where
    K: Eq + Hash + Clone + Record,
    V: Record,
    S: BuildHasher + Default,
{
    fn persist<W: Write>(&self, w: &mut W) -> Result<()> {
        write_len(w, self.len())?;
        write_load_factor(w, self.load_factor())?;
        for (k, v) in self.iter() {
            k.write_record(w)?;
            v.write_record(w)?;
        }
        Ok(())
    }

    fn restore<R: Read>(r: &mut R) -> Result<Self> {
        let len = read_len(r)?;
        let load_factor = read_load_factor(r)?;
        let mut map = LinkedHashMap::with_config_and_hasher(
            HashConfig::with_load_factor(load_factor),
            S::default(),
        )?;
        for _ in 0..len {
            let k = K::read_record(r)?;
            let v = V::read_record(r)?;
            map.put(k, v)?;
        }
        tracing::debug!(len, "restored linked hash map");
        Ok(map)
    }
}
