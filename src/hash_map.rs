//! HashMap: separate-chaining table over a slot arena, with positions.
//!
//! Buckets hold the slot key of their chain head; entries link forward to
//! the next entry in the same bucket. Every entry caches its key's hash, so
//! growing the table re-indexes without calling `Hash` again. The table
//! doubles when the next new key would push the load past the configured
//! factor, and refuses to grow past `max_capacity`.

use crate::config::HashConfig;
use crate::error::{CollectionError, Result};
use crate::ownership::{validate, Owned, OwnerId, Position};
use crate::persist::{read_len, read_load_factor, write_len, write_load_factor, Persist, Record};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{DefaultKey, Key, SlotMap};
use std::io::{Read, Write};

/// Largest entry count `restore` sizes the table for before reading records.
const PRESIZE_LIMIT: usize = 1 << 16;

#[derive(Debug)]
struct Entry<K, V> {
    owned: Owned<(K, V)>,
    hash: u64,
    next: DefaultKey,
}

impl<K, V> Entry<K, V> {
    #[inline]
    fn key(&self) -> &K {
        &self.owned.get().0
    }
}

/// Bucket array plus entry arena, split out so chain surgery borrows it
/// apart from the config and hasher.
struct Chains<K, V> {
    buckets: Vec<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> Chains<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: vec![DefaultKey::null(); capacity],
            slots: SlotMap::with_key(),
        }
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    fn find<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut k = self.buckets[self.bucket_of(hash)];
        while !k.is_null() {
            let e = &self.slots[k];
            if e.hash == hash && e.key().borrow() == q {
                return Some(k);
            }
            k = e.next;
        }
        None
    }

    /// Link a fresh entry at the tail of its chain.
    fn append(&mut self, owner: OwnerId, hash: u64, key: K, value: V) -> DefaultKey {
        let k = self.slots.insert(Entry {
            owned: Owned::new((key, value), owner),
            hash,
            next: DefaultKey::null(),
        });
        let b = self.bucket_of(hash);
        let mut cur = self.buckets[b];
        if cur.is_null() {
            self.buckets[b] = k;
            return k;
        }
        while !self.slots[cur].next.is_null() {
            cur = self.slots[cur].next;
        }
        self.slots[cur].next = k;
        k
    }

    fn unlink(&mut self, k: DefaultKey) -> (K, V) {
        let b = self.bucket_of(self.slots[k].hash);
        let next = self.slots[k].next;
        if self.buckets[b] == k {
            self.buckets[b] = next;
        } else {
            let mut cur = self.buckets[b];
            while self.slots[cur].next != k {
                cur = self.slots[cur].next;
                assert!(!cur.is_null(), "entry missing from its bucket chain");
            }
            self.slots[cur].next = next;
        }
        let entry = self
            .slots
            .remove(k)
            .expect("chained slot must be live when unlinked");
        entry.owned.into_disowned()
    }

    /// Re-index every entry into `capacity` buckets, preserving relative
    /// chain order.
    fn rehash(&mut self, capacity: usize) {
        let old = std::mem::replace(&mut self.buckets, vec![DefaultKey::null(); capacity]);
        let mut tails = vec![DefaultKey::null(); capacity];
        for head in old {
            let mut k = head;
            while !k.is_null() {
                let next = self.slots[k].next;
                self.slots[k].next = DefaultKey::null();
                let b = self.bucket_of(self.slots[k].hash);
                if tails[b].is_null() {
                    self.buckets[b] = k;
                } else {
                    self.slots[tails[b]].next = k;
                }
                tails[b] = k;
                k = next;
            }
        }
    }

    #[cfg(test)]
    fn chain_len(&self, bucket: usize) -> usize {
        let mut n = 0;
        let mut k = self.buckets[bucket];
        while !k.is_null() {
            n += 1;
            k = self.slots[k].next;
        }
        n
    }
}

pub struct HashMap<K, V, S = DefaultHashBuilder> {
    owner: OwnerId,
    config: HashConfig,
    hasher: S,
    chains: Chains<K, V>,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self::build(HashConfig::default(), DefaultHashBuilder::default())
    }

    pub fn with_load_factor(load_factor: f64) -> Result<Self> {
        Self::with_config(HashConfig::with_load_factor(load_factor))
    }

    pub fn with_config(config: HashConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for HashMap<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashMap<K, V, S> {
    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, hasher))
    }

    fn build(config: HashConfig, hasher: S) -> Self {
        Self {
            owner: OwnerId::fresh(),
            chains: Chains::with_capacity(config.initial_capacity),
            config,
            hasher,
        }
    }

    pub fn len(&self) -> usize {
        self.chains.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.slots.is_empty()
    }

    /// Current bucket count; always a power of two.
    pub fn capacity(&self) -> usize {
        self.chains.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.config.load_factor
    }

    pub fn config(&self) -> &HashConfig {
        &self.config
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drop every entry and shrink back to the initial capacity.
    pub fn clear(&mut self) {
        // Clear the arena in place: freed slots keep their bumped generations,
        // so positions from before the clear cannot resolve afterwards.
        self.chains.slots.clear();
        self.chains.buckets = vec![DefaultKey::null(); self.config.initial_capacity];
    }

    fn resolve(&self, position: Position) -> Result<DefaultKey> {
        validate(position, self.owner, self.len(), |k| {
            self.chains
                .slots
                .get(k)
                .map_or(false, |e| e.owned.is_owned_by(self.owner))
        })
    }

    pub fn key_at(&self, position: Position) -> Result<&K> {
        let k = self.resolve(position)?;
        Ok(self.chains.slots[k].key())
    }

    pub fn get_at(&self, position: Position) -> Result<&V> {
        let k = self.resolve(position)?;
        Ok(&self.chains.slots[k].owned.get().1)
    }

    pub fn get_at_mut(&mut self, position: Position) -> Result<&mut V> {
        let k = self.resolve(position)?;
        Ok(&mut self.chains.slots[k].owned.get_mut().1)
    }

    /// Unlink by position. Uses the cached hash; no user code runs.
    pub fn remove_at(&mut self, position: Position) -> Result<(K, V)> {
        let k = self.resolve(position)?;
        Ok(self.chains.unlink(k))
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let doomed: Vec<DefaultKey> = self
            .chains
            .slots
            .iter_mut()
            .filter_map(|(k, e)| {
                let (key, value) = e.owned.get_mut();
                if keep(key, value) {
                    None
                } else {
                    Some(k)
                }
            })
            .collect();
        for k in doomed {
            self.chains.unlink(k);
        }
    }

    /// Entries in bucket order, each chain head to tail.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            chains: &self.chains,
            bucket: 0,
            cursor: DefaultKey::null(),
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Entries with mutable values, in arena order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.chains.slots.iter_mut(),
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_chains(&self) {
        let total: usize = (0..self.capacity()).map(|b| self.chains.chain_len(b)).sum();
        assert_eq!(total, self.len());
        for b in 0..self.capacity() {
            let mut k = self.chains.buckets[b];
            while !k.is_null() {
                let e = &self.chains.slots[k];
                assert_eq!(self.chains.bucket_of(e.hash), b, "entry in wrong bucket");
                assert!(e.owned.is_owned_by(self.owner));
                k = e.next;
            }
        }
        assert!(self.len() as f64 <= self.config.threshold(self.capacity()));
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Insert or overwrite. Returns the previous value for an existing key.
    ///
    /// Fails with `ResourceExhausted` when the new entry would require
    /// growing past `max_capacity`; the table is left untouched.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.make_hash(&key);
        if let Some(k) = self.chains.find(hash, &key) {
            let slot = &mut self.chains.slots[k].owned.get_mut().1;
            return Ok(Some(std::mem::replace(slot, value)));
        }
        let len = self.chains.slots.len();
        let capacity = self.chains.buckets.len();
        if (len + 1) as f64 > self.config.threshold(capacity) {
            let grown = capacity
                .checked_mul(2)
                .filter(|&c| c <= self.config.max_capacity)
                .ok_or(CollectionError::ResourceExhausted { capacity })?;
            self.chains.rehash(grown);
            tracing::debug!(from = capacity, to = grown, len, "hash table resized");
        }
        self.chains.append(self.owner, hash, key, value);
        Ok(None)
    }

    /// Overwrite the value of an existing key only.
    pub fn replace(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let k = self.chains.find(hash, &key)?;
        Some(std::mem::replace(
            &mut self.chains.slots[k].owned.get_mut().1,
            value,
        ))
    }

    fn lookup<Q>(&self, q: &Q) -> Result<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        self.chains
            .find(self.make_hash(q), q)
            .ok_or(CollectionError::KeyNotFound)
    }

    pub fn get<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.lookup(q)?;
        Ok(&self.chains.slots[k].owned.get().1)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.lookup(q)?;
        Ok(&mut self.chains.slots[k].owned.get_mut().1)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Result<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.lookup(q)?;
        let (key, value) = self.chains.slots[k].owned.get();
        Ok((key, value))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(q).is_ok()
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(q)
            .ok()
            .map(|k| Position::new(self.owner, k))
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
        let k = self.lookup(q)?;
        Ok(self.chains.unlink(k))
    }

    /// Size the bucket array for `len` entries up front. A count read from a
    /// stream is untrusted, so only the first `PRESIZE_LIMIT` entries are
    /// allocated for; `put` grows the table past that as records arrive.
    fn presize(&mut self, len: usize) {
        let capacity = self.config.capacity_for(len.min(PRESIZE_LIMIT));
        if capacity > self.capacity() {
            self.chains.rehash(capacity);
        }
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
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

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: core::fmt::Debug, V: core::fmt::Debug, S> core::fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &V)` in bucket/chain order.
pub struct Iter<'a, K, V> {
    chains: &'a Chains<K, V>,
    bucket: usize,
    cursor: DefaultKey,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while self.cursor.is_null() {
            self.cursor = self.chains.buckets[self.bucket];
            self.bucket += 1;
        }
        let e = &self.chains.slots[self.cursor];
        self.cursor = e.next;
        self.remaining -= 1;
        let (k, v) = e.owned.get();
        Some((k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| {
            let (k, v) = e.owned.get_mut();
            (&*k, v)
        })
    }
}

impl<K, V, S> Persist for HashMap<K, V, S>
where
    K: Eq + Hash + Record,
    V: Record,
    S: BuildHasher + Default,
{
    fn persist<W: Write>(&self, w: &mut W) -> Result<()> {
        write_len(w, self.len())?;
        write_load_factor(w, self.config.load_factor)?;
        for (k, v) in self.iter() {
            k.write_record(w)?;
            v.write_record(w)?;
        }
        Ok(())
    }

    fn restore<R: Read>(r: &mut R) -> Result<Self> {
        let len = read_len(r)?;
        let load_factor = read_load_factor(r)?;
        let mut map = HashMap::with_config_and_hasher(
            HashConfig::with_load_factor(load_factor),
            S::default(),
        )?;
        map.presize(len);
        for _ in 0..len {
            let k = K::read_record(r)?;
            let v = V::read_record(r)?;
            map.put(k, v)?;
        }
        tracing::debug!(len, capacity = map.capacity(), "restored hash table");
        Ok(map)
    }
}
