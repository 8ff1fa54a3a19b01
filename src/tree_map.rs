//! TreeMap: red-black tree over a slot arena, ordered by a `Comparator`.
//!
//! Nodes link to parent and children by slot key. One shared `nil` slot,
//! always black and without payload, stands in for every absent child and
//! for the root's parent; fixups may write its parent link, as in the
//! textbook formulation. Deletion splices the doomed node itself out of the
//! tree, so positions of every other node survive any removal.

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{CollectionError, Result};
use crate::ownership::{validate, Owned, OwnerId, Position};
use crate::persist::{read_len, write_len, Persist, Record};
use core::borrow::Borrow;
use core::cmp::Ordering;
use slotmap::{DefaultKey, SlotMap};
use std::io::{Read, Write};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node<K, V> {
    // None only for nil.
    entry: Option<Owned<(K, V)>>,
    color: Color,
    parent: DefaultKey,
    left: DefaultKey,
    right: DefaultKey,
}

/// Link structure without the comparator; all rebalancing lives here.
struct RawTree<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    nil: DefaultKey,
    root: DefaultKey,
}

impl<K, V> RawTree<K, V> {
    fn new() -> Self {
        let mut slots = SlotMap::with_key();
        let nil = slots.insert(Node {
            entry: None,
            color: Color::Black,
            parent: DefaultKey::default(),
            left: DefaultKey::default(),
            right: DefaultKey::default(),
        });
        let n = &mut slots[nil];
        n.parent = nil;
        n.left = nil;
        n.right = nil;
        Self {
            slots,
            nil,
            root: nil,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    fn left(&self, x: DefaultKey) -> DefaultKey {
        self.slots[x].left
    }

    #[inline]
    fn right(&self, x: DefaultKey) -> DefaultKey {
        self.slots[x].right
    }

    #[inline]
    fn parent(&self, x: DefaultKey) -> DefaultKey {
        self.slots[x].parent
    }

    #[inline]
    fn color(&self, x: DefaultKey) -> Color {
        self.slots[x].color
    }

    #[inline]
    fn set_color(&mut self, x: DefaultKey, color: Color) {
        self.slots[x].color = color;
    }

    #[inline]
    fn owned(&self, x: DefaultKey) -> &Owned<(K, V)> {
        self.slots[x].entry.as_ref().expect("nil carries no entry")
    }

    #[inline]
    fn key(&self, x: DefaultKey) -> &K {
        &self.owned(x).get().0
    }

    #[inline]
    fn entry(&self, x: DefaultKey) -> (&K, &V) {
        let (k, v) = self.owned(x).get();
        (k, v)
    }

    #[inline]
    fn value_mut(&mut self, x: DefaultKey) -> &mut V {
        &mut self.slots[x]
            .entry
            .as_mut()
            .expect("nil carries no entry")
            .get_mut()
            .1
    }

    /// Descend from the root. `steer` orders the target
    /// against a node's key. Returns nil when nothing matches.
    fn search<F>(&self, mut steer: F) -> DefaultKey
    where
        F: FnMut(&K) -> Ordering,
    {
        let mut x = self.root;
        while x != self.nil {
            x = match steer(self.key(x)) {
                Ordering::Less => self.left(x),
                Ordering::Greater => self.right(x),
                Ordering::Equal => return x,
            };
        }
        x
    }

    fn minimum(&self, mut x: DefaultKey) -> DefaultKey {
        while self.left(x) != self.nil {
            x = self.left(x);
        }
        x
    }

    fn maximum(&self, mut x: DefaultKey) -> DefaultKey {
        while self.right(x) != self.nil {
            x = self.right(x);
        }
        x
    }

    fn successor(&self, mut x: DefaultKey) -> DefaultKey {
        if self.right(x) != self.nil {
            return self.minimum(self.right(x));
        }
        let mut y = self.parent(x);
        while y != self.nil && x == self.right(y) {
            x = y;
            y = self.parent(y);
        }
        y
    }

    fn predecessor(&self, mut x: DefaultKey) -> DefaultKey {
        if self.left(x) != self.nil {
            return self.maximum(self.left(x));
        }
        let mut y = self.parent(x);
        while y != self.nil && x == self.left(y) {
            x = y;
            y = self.parent(y);
        }
        y
    }

    fn first(&self) -> DefaultKey {
        if self.root == self.nil {
            return self.nil;
        }
        self.minimum(self.root)
    }

    fn last(&self) -> DefaultKey {
        if self.root == self.nil {
            return self.nil;
        }
        self.maximum(self.root)
    }

    /// Point `parent`'s link that used to reach `old` at `new` instead.
    fn replace_child(&mut self, parent: DefaultKey, old: DefaultKey, new: DefaultKey) {
        if parent == self.nil {
            self.root = new;
        } else if self.left(parent) == old {
            self.slots[parent].left = new;
        } else {
            self.slots[parent].right = new;
        }
    }

    fn rotate_left(&mut self, x: DefaultKey) {
        let y = self.right(x);
        let beta = self.left(y);
        self.slots[x].right = beta;
        if beta != self.nil {
            self.slots[beta].parent = x;
        }
        let px = self.parent(x);
        self.slots[y].parent = px;
        self.replace_child(px, x, y);
        self.slots[y].left = x;
        self.slots[x].parent = y;
        tracing::trace!("rotate left");
    }

    fn rotate_right(&mut self, x: DefaultKey) {
        let y = self.left(x);
        let beta = self.right(y);
        self.slots[x].left = beta;
        if beta != self.nil {
            self.slots[beta].parent = x;
        }
        let px = self.parent(x);
        self.slots[y].parent = px;
        self.replace_child(px, x, y);
        self.slots[y].right = x;
        self.slots[x].parent = y;
        tracing::trace!("rotate right");
    }

    /// Hang a fresh red leaf under `parent` and rebalance.
    fn attach(
        &mut self,
        owner: OwnerId,
        parent: DefaultKey,
        go_left: bool,
        key: K,
        value: V,
    ) -> DefaultKey {
        let nil = self.nil;
        let z = self.slots.insert(Node {
            entry: Some(Owned::new((key, value), owner)),
            color: Color::Red,
            parent,
            left: nil,
            right: nil,
        });
        if parent == nil {
            self.root = z;
        } else if go_left {
            self.slots[parent].left = z;
        } else {
            self.slots[parent].right = z;
        }
        self.insert_fixup(z);
        z
    }

    fn insert_fixup(&mut self, mut z: DefaultKey) {
        while self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z);
            let g = self.parent(p);
            if p == self.left(g) {
                let uncle = self.right(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Put `v` where `u` was. `v` may be nil; its parent is written anyway.
    fn transplant(&mut self, u: DefaultKey, v: DefaultKey) {
        let pu = self.parent(u);
        self.replace_child(pu, u, v);
        self.slots[v].parent = pu;
    }

    /// Splice `z` out, rebalance, and hand back its disowned entry.
    fn delete(&mut self, z: DefaultKey) -> (K, V) {
        let nil = self.nil;
        let mut removed_color = self.color(z);
        let x;
        if self.left(z) == nil {
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z) == nil {
            x = self.left(z);
            self.transplant(z, x);
        } else {
            // Two children: the in-order successor takes z's place and colour.
            let y = self.minimum(self.right(z));
            removed_color = self.color(y);
            x = self.right(y);
            if self.parent(y) == z {
                self.slots[x].parent = y;
            } else {
                self.transplant(y, x);
                let zr = self.right(z);
                self.slots[y].right = zr;
                self.slots[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.left(z);
            self.slots[y].left = zl;
            self.slots[zl].parent = y;
            let zc = self.color(z);
            self.set_color(y, zc);
        }
        if removed_color == Color::Black {
            self.delete_fixup(x);
        }
        self.slots[nil].parent = nil;
        let node = self
            .slots
            .remove(z)
            .expect("tree slot must be live when deleted");
        node.entry
            .expect("nil is never deleted")
            .into_disowned()
    }

    fn delete_fixup(&mut self, mut x: DefaultKey) {
        while x != self.root && self.color(x) == Color::Black {
            let p = self.parent(x);
            if x == self.left(p) {
                let mut w = self.right(p);
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_left(p);
                    w = self.right(self.parent(x));
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        let wl = self.left(w);
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(self.parent(x));
                    }
                    let p = self.parent(x);
                    let pc = self.color(p);
                    self.set_color(w, pc);
                    self.set_color(p, Color::Black);
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.left(p);
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_right(p);
                    w = self.left(self.parent(x));
                }
                if self.color(self.right(w)) == Color::Black
                    && self.color(self.left(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        let wr = self.right(w);
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(self.parent(x));
                    }
                    let p = self.parent(x);
                    let pc = self.color(p);
                    self.set_color(w, pc);
                    self.set_color(p, Color::Black);
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    fn clear(&mut self) {
        let nil = self.nil;
        self.slots.retain(|k, _| k == nil);
        self.root = nil;
        self.slots[nil].parent = nil;
    }
}

pub struct TreeMap<K, V, C = NaturalOrder> {
    owner: OwnerId,
    comparator: C,
    tree: RawTree<K, V>,
}

impl<K, V> TreeMap<K, V, NaturalOrder> {
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C: Default> Default for TreeMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            owner: OwnerId::fresh(),
            comparator,
            tree: RawTree::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.root == self.tree.nil
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    fn non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        Ok(())
    }

    fn resolve(&self, position: Position) -> Result<DefaultKey> {
        validate(position, self.owner, self.len(), |k| {
            self.tree
                .slots
                .get(k)
                .and_then(|n| n.entry.as_ref())
                .map_or(false, |owned| owned.is_owned_by(self.owner))
        })
    }

    pub fn first(&self) -> Result<(&K, &V)> {
        self.non_empty()?;
        Ok(self.tree.entry(self.tree.first()))
    }

    pub fn last(&self) -> Result<(&K, &V)> {
        self.non_empty()?;
        Ok(self.tree.entry(self.tree.last()))
    }

    pub fn remove_first(&mut self) -> Result<(K, V)> {
        self.non_empty()?;
        let x = self.tree.first();
        Ok(self.tree.delete(x))
    }

    pub fn remove_last(&mut self) -> Result<(K, V)> {
        self.non_empty()?;
        let x = self.tree.last();
        Ok(self.tree.delete(x))
    }

    pub fn first_position(&self) -> Result<Position> {
        self.non_empty()?;
        Ok(Position::new(self.owner, self.tree.first()))
    }

    pub fn last_position(&self) -> Result<Position> {
        self.non_empty()?;
        Ok(Position::new(self.owner, self.tree.last()))
    }

    pub fn key_at(&self, position: Position) -> Result<&K> {
        let x = self.resolve(position)?;
        Ok(self.tree.key(x))
    }

    pub fn get_at(&self, position: Position) -> Result<&V> {
        let x = self.resolve(position)?;
        Ok(self.tree.entry(x).1)
    }

    pub fn get_at_mut(&mut self, position: Position) -> Result<&mut V> {
        let x = self.resolve(position)?;
        Ok(self.tree.value_mut(x))
    }

    /// Unlink by position; no comparisons run.
    pub fn remove_at(&mut self, position: Position) -> Result<(K, V)> {
        let x = self.resolve(position)?;
        Ok(self.tree.delete(x))
    }

    /// In-order, double-ended.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: &self.tree,
            front: self.tree.first(),
            back: self.tree.last(),
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Mutable cursor at the smallest key.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V, C> {
        let current = self.tree.first();
        CursorMut { map: self, current }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        C: Comparator<K>,
    {
        let t = &self.tree;
        assert_eq!(t.color(t.nil), Color::Black, "nil must be black");
        assert_eq!(t.color(t.root), Color::Black, "root must be black");
        if t.root != t.nil {
            assert_eq!(t.parent(t.root), t.nil, "root parent must be nil");
        }
        fn black_height<K, V>(t: &RawTree<K, V>, x: DefaultKey) -> usize {
            if x == t.nil {
                return 1;
            }
            let (l, r) = (t.left(x), t.right(x));
            if l != t.nil {
                assert_eq!(t.parent(l), x, "broken parent link");
            }
            if r != t.nil {
                assert_eq!(t.parent(r), x, "broken parent link");
            }
            if t.color(x) == Color::Red {
                assert_eq!(t.color(l), Color::Black, "red node with red child");
                assert_eq!(t.color(r), Color::Black, "red node with red child");
            }
            let lh = black_height(t, l);
            let rh = black_height(t, r);
            assert_eq!(lh, rh, "unequal black height");
            lh + usize::from(t.color(x) == Color::Black)
        }
        black_height(t, t.root);
        let keys: Vec<&K> = self.keys().collect();
        assert_eq!(keys.len(), self.len());
        for w in keys.windows(2) {
            assert_eq!(
                self.comparator.compare(w[0], w[1]),
                Ordering::Less,
                "in-order walk must be strictly ascending"
            );
        }
        for (_, n) in t.slots.iter().filter(|(k, _)| *k != t.nil) {
            assert!(n.entry.as_ref().unwrap().is_owned_by(self.owner));
        }
    }
}

impl<K, V, C> TreeMap<K, V, C>
where
    C: Comparator<K>,
{
    /// Insert or overwrite. Returns the previous value for an equal key.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.upsert(key, value).1
    }

    /// Like [`put`](Self::put), also returning the position of the node
    /// that holds `key` afterwards.
    pub fn put_position(&mut self, key: K, value: V) -> (Position, Option<V>) {
        let (x, old) = self.upsert(key, value);
        (Position::new(self.owner, x), old)
    }

    fn upsert(&mut self, key: K, value: V) -> (DefaultKey, Option<V>) {
        let t = &mut self.tree;
        let mut parent = t.nil;
        let mut go_left = false;
        let mut x = t.root;
        while x != t.nil {
            parent = x;
            match self.comparator.compare(&key, t.key(x)) {
                Ordering::Less => {
                    go_left = true;
                    x = t.left(x);
                }
                Ordering::Greater => {
                    go_left = false;
                    x = t.right(x);
                }
                Ordering::Equal => {
                    let old = std::mem::replace(t.value_mut(x), value);
                    return (x, Some(old));
                }
            }
        }
        (t.attach(self.owner, parent, go_left, key, value), None)
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    fn locate<Q>(&self, q: &Q) -> Result<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.non_empty()?;
        let x = self
            .tree
            .search(|k| self.comparator.compare(q, k.borrow()));
        if x == self.tree.nil {
            return Err(CollectionError::KeyNotFound);
        }
        Ok(x)
    }

    pub fn get<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let x = self.locate(q)?;
        Ok(self.tree.entry(x).1)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Result<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let x = self.locate(q)?;
        Ok(self.tree.entry(x))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let x = self.locate(q)?;
        Ok(self.tree.value_mut(x))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.locate(q).is_ok()
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.locate(q)
            .ok()
            .map(|x| Position::new(self.owner, x))
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let x = self.locate(q)?;
        Ok(self.tree.delete(x))
    }

    fn neighbour<Q>(&self, q: &Q, forward: bool) -> Result<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let x = self.locate(q)?;
        let y = if forward {
            self.tree.successor(x)
        } else {
            self.tree.predecessor(x)
        };
        if y == self.tree.nil {
            return Err(CollectionError::ElementNotFound);
        }
        Ok(y)
    }

    /// Entry with the largest key smaller than `q`, which must be present.
    pub fn previous<Q>(&self, q: &Q) -> Result<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let y = self.neighbour(q, false)?;
        Ok(self.tree.entry(y))
    }

    /// Entry with the smallest key larger than `q`, which must be present.
    pub fn next<Q>(&self, q: &Q) -> Result<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let y = self.neighbour(q, true)?;
        Ok(self.tree.entry(y))
    }

    pub fn remove_previous<Q>(&mut self, q: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let y = self.neighbour(q, false)?;
        Ok(self.tree.delete(y))
    }

    pub fn remove_next<Q>(&mut self, q: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let y = self.neighbour(q, true)?;
        Ok(self.tree.delete(y))
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for TreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for TreeMap<K, V, C> {}

impl<K: core::fmt::Debug, V: core::fmt::Debug, C> core::fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for TreeMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TreeMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

/// In-order iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    tree: &'a RawTree<K, V>,
    front: DefaultKey,
    back: DefaultKey,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front;
        self.front = self.tree.successor(x);
        self.remaining -= 1;
        Some(self.tree.entry(x))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back;
        self.back = self.tree.predecessor(x);
        self.remaining -= 1;
        Some(self.tree.entry(x))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks the tree in order and can remove the entry under it.
pub struct CursorMut<'a, K, V, C> {
    map: &'a mut TreeMap<K, V, C>,
    current: DefaultKey,
}

impl<K, V, C> CursorMut<'_, K, V, C> {
    pub fn is_at_end(&self) -> bool {
        self.current == self.map.tree.nil
    }

    pub fn key(&self) -> Option<&K> {
        if self.is_at_end() {
            return None;
        }
        Some(self.map.tree.key(self.current))
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        if self.is_at_end() {
            return None;
        }
        Some(self.map.tree.value_mut(self.current))
    }

    pub fn move_next(&mut self) {
        if !self.is_at_end() {
            self.current = self.map.tree.successor(self.current);
        }
    }

    /// Remove the current entry; the cursor moves to its in-order successor.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        if self.is_at_end() {
            return None;
        }
        let doomed = self.current;
        // Successor first: deletion relinks nodes but never moves payloads
        // between slots, so the successor's slot stays valid.
        self.current = self.map.tree.successor(doomed);
        Some(self.map.tree.delete(doomed))
    }
}

impl<K, V, C> Persist for TreeMap<K, V, C>
where
    K: Record,
    V: Record,
    C: Comparator<K> + Record,
{
    fn persist<W: Write>(&self, w: &mut W) -> Result<()> {
        write_len(w, self.len())?;
        self.comparator.write_record(w)?;
        for (k, v) in self.iter() {
            k.write_record(w)?;
            v.write_record(w)?;
        }
        Ok(())
    }

    fn restore<R: Read>(r: &mut R) -> Result<Self> {
        let len = read_len(r)?;
        let comparator = C::read_record(r)?;
        let mut map = TreeMap::with_comparator(comparator);
        for _ in 0..len {
            let k = K::read_record(r)?;
            let v = V::read_record(r)?;
            map.put(k, v);
        }
        tracing::debug!(len, "restored tree");
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{OrderBy, ReverseOrder};

    fn tree_of(keys: &[i32]) -> TreeMap<i32, i32> {
        let mut t = TreeMap::new();
        for &k in keys {
            t.put(k, k * 10);
        }
        t
    }

    /// Invariant: navigation and removal on the textbook seven-key tree.
    #[test]
    fn seven_key_walkthrough() {
        let mut t = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
        t.assert_invariants();
        assert_eq!(t.first().unwrap(), (&1, &10));
        assert_eq!(t.next(&5).unwrap(), (&7, &70));
        assert_eq!(t.previous(&5).unwrap(), (&4, &40));
        assert_eq!(t.remove(&5).unwrap(), 50);
        t.assert_invariants();
        assert!(!t.contains_key(&5));
        assert_eq!(t.keys().copied().collect::<Vec<_>>(), [1, 3, 4, 7, 8, 9]);
    }

    /// Invariant: ascending inserts trigger rotations and stay balanced.
    #[test]
    fn ascending_inserts_rebalance() {
        let mut t = TreeMap::new();
        for i in 0..256 {
            t.put(i, ());
            t.assert_invariants();
        }
        // Height of a red-black tree is at most 2*log2(n+1).
        fn height<K, V>(t: &RawTree<K, V>, x: DefaultKey) -> usize {
            if x == t.nil {
                0
            } else {
                1 + height(t, t.left(x)).max(height(t, t.right(x)))
            }
        }
        assert!(height(&t.tree, t.tree.root) <= 16);
    }

    /// Invariant: removal in every structural case keeps the invariants.
    #[test]
    fn removals_keep_invariants() {
        let keys: Vec<i32> = (0..64).map(|i| (i * 37) % 64).collect();
        let mut t = tree_of(&keys);
        for k in (0..64).step_by(3) {
            assert_eq!(t.remove(&k).unwrap(), k * 10);
            t.assert_invariants();
        }
        while let Ok((k, _)) = t.remove_first() {
            assert!(!t.contains_key(&k));
            t.assert_invariants();
        }
        assert!(t.is_empty());
    }

    /// Invariant: overwrite keeps the node and reports the old value.
    #[test]
    fn put_overwrites_in_place() {
        let mut t = tree_of(&[2, 1, 3]);
        let p = t.find(&2).unwrap();
        assert_eq!(t.put(2, 99), Some(20));
        assert_eq!(t.len(), 3);
        assert_eq!(*t.get_at(p).unwrap(), 99);

        let (q, old) = t.put_position(4, 40);
        assert_eq!(old, None);
        assert_eq!(t.key_at(q).unwrap(), &4);
        assert_eq!(t.put_position(4, 41), (q, Some(40)));
    }

    /// Invariant: empty, missing and past-the-end are distinct errors.
    #[test]
    fn navigation_errors() {
        let mut t: TreeMap<i32, i32> = TreeMap::new();
        assert!(matches!(t.first(), Err(CollectionError::EmptyContainer)));
        assert!(matches!(t.next(&1), Err(CollectionError::EmptyContainer)));
        assert!(matches!(t.remove(&1), Err(CollectionError::EmptyContainer)));
        t.put(1, 1);
        t.put(2, 2);
        assert!(matches!(t.next(&3), Err(CollectionError::KeyNotFound)));
        assert!(matches!(t.next(&2), Err(CollectionError::ElementNotFound)));
        assert!(matches!(
            t.previous(&1),
            Err(CollectionError::ElementNotFound)
        ));
        assert!(matches!(
            t.remove_next(&2),
            Err(CollectionError::ElementNotFound)
        ));
        assert_eq!(t.remove_previous(&2).unwrap(), (1, 1));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: removing a two-child node keeps the successor's position valid.
    #[test]
    fn successor_position_survives_splice() {
        let mut t = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
        let p7 = t.find(&7).unwrap();
        let p5 = t.find(&5).unwrap();
        assert_eq!(t.remove_at(p5).unwrap(), (5, 50));
        assert_eq!(t.key_at(p7).unwrap(), &7);
        assert!(matches!(t.get_at(p5), Err(CollectionError::NotOwned)));
        t.assert_invariants();
    }

    /// Invariant: the cursor removes while walking and lands on the successor.
    #[test]
    fn cursor_removes_odd_keys() {
        let mut t = tree_of(&(0..20).collect::<Vec<_>>());
        let mut c = t.cursor_first_mut();
        while let Some(&k) = c.key() {
            if k % 2 == 1 {
                assert_eq!(c.remove_current().map(|(k, _)| k), Some(k));
            } else {
                *c.value_mut().unwrap() += 1;
                c.move_next();
            }
        }
        t.assert_invariants();
        assert_eq!(
            t.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            (0..20).step_by(2).map(|k| (k, k * 10 + 1)).collect::<Vec<_>>()
        );
    }

    /// Invariant: iteration is ordered from both ends by the configured comparator.
    #[test]
    fn reverse_and_custom_orders() {
        let mut t: TreeMap<i32, (), ReverseOrder> = TreeMap::with_comparator(ReverseOrder);
        for k in [3, 1, 2] {
            t.put(k, ());
        }
        t.assert_invariants();
        assert_eq!(t.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);
        assert_eq!(t.keys().rev().copied().collect::<Vec<_>>(), [1, 2, 3]);

        let by_len = OrderBy(|a: &String, b: &String| a.len().cmp(&b.len()));
        let mut s = TreeMap::with_comparator(by_len);
        s.put("ccc".to_string(), 1);
        s.put("a".to_string(), 2);
        // Same length means same key under this order.
        assert_eq!(s.put("b".to_string(), 3), Some(2));
        assert_eq!(s.len(), 2);
        assert_eq!(s.first().unwrap(), (&"a".to_string(), &3));
    }

    /// Invariant: borrowed lookups work when the comparator orders the borrowed form.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut t: TreeMap<String, i32> = TreeMap::new();
        t.put("pear".to_string(), 1);
        t.put("apple".to_string(), 2);
        assert_eq!(*t.get("pear").unwrap(), 1);
        assert_eq!(t.next("apple").unwrap().0, "pear");
        *t.get_mut("apple").unwrap() += 5;
        assert_eq!(t.remove("apple").unwrap(), 7);
    }

    #[test]
    fn clear_and_equality() {
        let mut a = tree_of(&[3, 1, 2]);
        let b = tree_of(&[1, 2, 3]);
        assert_eq!(a, b);
        let p = a.first_position().unwrap();
        a.clear();
        assert!(a.is_empty());
        a.assert_invariants();
        a.put(1, 10);
        assert!(matches!(a.get_at(p), Err(CollectionError::NotOwned)));
        assert_ne!(a, b);
        assert_eq!(format!("{:?}", a), "{1: 10}");
    }
}
