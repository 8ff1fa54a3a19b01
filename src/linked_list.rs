//! LinkedList: sentinel-bounded doubly linked sequence over a slot arena.
//!
//! Nodes live in a `SlotMap` and link to each other by slot key, so there
//! are no owning pointers in either direction. Two sentinel slots bound the
//! chain; they carry no payload and never escape as positions. Every
//! positional insert or unlink is O(1); index-based access walks from the
//! nearer sentinel.

use crate::error::{CollectionError, Result};
use crate::ownership::{validate, Owned, OwnerId, Position};
use crate::persist::{read_len, write_len, Persist, Record};
use slotmap::{DefaultKey, SlotMap};
use std::io::{Read, Write};

#[derive(Debug)]
struct Node<E> {
    // None only for the two sentinels.
    item: Option<Owned<E>>,
    prev: DefaultKey,
    next: DefaultKey,
}

pub struct LinkedList<E> {
    owner: OwnerId,
    slots: SlotMap<DefaultKey, Node<E>>,
    head: DefaultKey,
    tail: DefaultKey,
    len: usize,
}

impl<E> LinkedList<E> {
    pub fn new() -> Self {
        let mut slots = SlotMap::with_key();
        let sentinel = || Node {
            item: None,
            prev: DefaultKey::default(),
            next: DefaultKey::default(),
        };
        let head = slots.insert(sentinel());
        let tail = slots.insert(sentinel());
        slots[head].next = tail;
        slots[tail].prev = head;
        Self {
            owner: OwnerId::fresh(),
            slots,
            head,
            tail,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Identity that every position minted by this list carries.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Remove every element. Outstanding positions become stale.
    pub fn clear(&mut self) {
        let (head, tail) = (self.head, self.tail);
        self.slots.retain(|k, _| k == head || k == tail);
        self.slots[head].next = tail;
        self.slots[tail].prev = head;
        self.len = 0;
    }

    // ---- internal link plumbing ----

    #[inline]
    fn item(&self, k: DefaultKey) -> &E {
        self.slots[k]
            .item
            .as_ref()
            .expect("sentinel slot has no payload")
            .get()
    }

    #[inline]
    fn item_mut(&mut self, k: DefaultKey) -> &mut E {
        self.slots[k]
            .item
            .as_mut()
            .expect("sentinel slot has no payload")
            .get_mut()
    }

    fn resolve(&self, position: Position) -> Result<DefaultKey> {
        validate(position, self.owner, self.len, |k| {
            self.slots
                .get(k)
                .and_then(|n| n.item.as_ref())
                .map_or(false, |owned| owned.is_owned_by(self.owner))
        })
    }

    fn link(&mut self, element: E, prev: DefaultKey, next: DefaultKey) -> Position {
        let k = self.slots.insert(Node {
            item: Some(Owned::new(element, self.owner)),
            prev,
            next,
        });
        self.slots[prev].next = k;
        self.slots[next].prev = k;
        self.len += 1;
        Position::new(self.owner, k)
    }

    fn unlink(&mut self, k: DefaultKey) -> E {
        debug_assert!(k != self.head && k != self.tail, "unlinking a sentinel");
        let node = self
            .slots
            .remove(k)
            .expect("linked slot must be live when unlinked");
        self.slots[node.prev].next = node.next;
        self.slots[node.next].prev = node.prev;
        self.len -= 1;
        node.item
            .expect("payload-bearing node carries an item")
            .into_disowned()
    }

    fn check_index(&self, index: usize, is_insertion: bool) -> Result<()> {
        if !is_insertion && self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        let bound = if is_insertion { self.len + 1 } else { self.len };
        if index >= bound {
            return Err(CollectionError::IndexOutOfRange { index, bound });
        }
        Ok(())
    }

    /// Slot of the node at `index` (`index < len`), walking from the nearer end.
    fn traverse_to_index(&self, index: usize) -> DefaultKey {
        debug_assert!(index < self.len);
        if index < self.len / 2 {
            let mut k = self.slots[self.head].next;
            for _ in 0..index {
                k = self.slots[k].next;
            }
            k
        } else {
            let mut k = self.slots[self.tail].prev;
            for _ in index + 1..self.len {
                k = self.slots[k].prev;
            }
            k
        }
    }

    fn first_key(&self) -> Result<DefaultKey> {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        Ok(self.slots[self.head].next)
    }

    fn last_key(&self) -> Result<DefaultKey> {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        Ok(self.slots[self.tail].prev)
    }

    fn prev_key(&self, position: Position) -> Result<DefaultKey> {
        let p = self.slots[self.resolve(position)?].prev;
        if p == self.head {
            return Err(CollectionError::ElementNotFound);
        }
        Ok(p)
    }

    fn next_key(&self, position: Position) -> Result<DefaultKey> {
        let n = self.slots[self.resolve(position)?].next;
        if n == self.tail {
            return Err(CollectionError::ElementNotFound);
        }
        Ok(n)
    }

    // ---- insertion ----

    pub fn push_front(&mut self, element: E) -> Position {
        let next = self.slots[self.head].next;
        self.link(element, self.head, next)
    }

    pub fn push_back(&mut self, element: E) -> Position {
        let prev = self.slots[self.tail].prev;
        self.link(element, prev, self.tail)
    }

    /// Insert so that `element` ends up at `index`. `index == len` appends.
    pub fn insert(&mut self, index: usize, element: E) -> Result<Position> {
        self.check_index(index, true)?;
        if index == self.len {
            return Ok(self.push_back(element));
        }
        let at = self.traverse_to_index(index);
        let prev = self.slots[at].prev;
        Ok(self.link(element, prev, at))
    }

    pub fn insert_before(&mut self, position: Position, element: E) -> Result<Position> {
        let k = self.resolve(position)?;
        let prev = self.slots[k].prev;
        Ok(self.link(element, prev, k))
    }

    pub fn insert_after(&mut self, position: Position, element: E) -> Result<Position> {
        let k = self.resolve(position)?;
        let next = self.slots[k].next;
        Ok(self.link(element, k, next))
    }

    // ---- removal ----

    pub fn remove(&mut self, index: usize) -> Result<E> {
        self.check_index(index, false)?;
        let k = self.traverse_to_index(index);
        Ok(self.unlink(k))
    }

    pub fn pop_front(&mut self) -> Result<E> {
        let k = self.first_key()?;
        Ok(self.unlink(k))
    }

    pub fn pop_back(&mut self) -> Result<E> {
        let k = self.last_key()?;
        Ok(self.unlink(k))
    }

    /// Unlink the node at `position`. The position is disowned afterwards.
    pub fn remove_at(&mut self, position: Position) -> Result<E> {
        let k = self.resolve(position)?;
        Ok(self.unlink(k))
    }

    pub fn remove_previous(&mut self, position: Position) -> Result<E> {
        let k = self.prev_key(position)?;
        Ok(self.unlink(k))
    }

    pub fn remove_next(&mut self, position: Position) -> Result<E> {
        let k = self.next_key(position)?;
        Ok(self.unlink(k))
    }

    // ---- access ----

    pub fn get(&self, index: usize) -> Result<&E> {
        self.check_index(index, false)?;
        Ok(self.item(self.traverse_to_index(index)))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut E> {
        self.check_index(index, false)?;
        let k = self.traverse_to_index(index);
        Ok(self.item_mut(k))
    }

    pub fn first(&self) -> Result<&E> {
        Ok(self.item(self.first_key()?))
    }

    pub fn last(&self) -> Result<&E> {
        Ok(self.item(self.last_key()?))
    }

    pub fn get_at(&self, position: Position) -> Result<&E> {
        Ok(self.item(self.resolve(position)?))
    }

    pub fn get_at_mut(&mut self, position: Position) -> Result<&mut E> {
        let k = self.resolve(position)?;
        Ok(self.item_mut(k))
    }

    /// Element just before `position`.
    pub fn previous(&self, position: Position) -> Result<&E> {
        Ok(self.item(self.prev_key(position)?))
    }

    /// Element just after `position`.
    pub fn next(&self, position: Position) -> Result<&E> {
        Ok(self.item(self.next_key(position)?))
    }

    pub fn set(&mut self, index: usize, element: E) -> Result<E> {
        self.check_index(index, false)?;
        let k = self.traverse_to_index(index);
        Ok(self.replace_item(k, element))
    }

    pub fn set_at(&mut self, position: Position, element: E) -> Result<E> {
        let k = self.resolve(position)?;
        Ok(self.replace_item(k, element))
    }

    fn replace_item(&mut self, k: DefaultKey, element: E) -> E {
        self.slots[k]
            .item
            .as_mut()
            .expect("sentinel slot has no payload")
            .replace(element)
    }

    // ---- positions ----

    pub fn first_position(&self) -> Result<Position> {
        Ok(Position::new(self.owner, self.first_key()?))
    }

    pub fn last_position(&self) -> Result<Position> {
        Ok(Position::new(self.owner, self.last_key()?))
    }

    pub fn position_at(&self, index: usize) -> Result<Position> {
        self.check_index(index, false)?;
        Ok(Position::new(self.owner, self.traverse_to_index(index)))
    }

    pub fn previous_position(&self, position: Position) -> Result<Position> {
        Ok(Position::new(self.owner, self.prev_key(position)?))
    }

    pub fn next_position(&self, position: Position) -> Result<Position> {
        Ok(Position::new(self.owner, self.next_key(position)?))
    }

    /// Iterate `(position, element)` pairs front to back.
    pub fn positions(&self) -> impl Iterator<Item = (Position, &E)> + '_ {
        let owner = self.owner;
        self.keys()
            .map(move |k| (Position::new(owner, k), self.item(k)))
    }

    fn keys(&self) -> impl Iterator<Item = DefaultKey> + '_ {
        let mut k = self.slots[self.head].next;
        core::iter::from_fn(move || {
            if k == self.tail {
                return None;
            }
            let cur = k;
            k = self.slots[k].next;
            Some(cur)
        })
    }

    // ---- iteration ----

    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            list: self,
            front: self.slots[self.head].next,
            back: self.slots[self.tail].prev,
            remaining: self.len,
        }
    }

    /// Mutable cursor starting at the first element (or past the end when empty).
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, E> {
        let current = self.slots[self.head].next;
        CursorMut {
            list: self,
            current,
        }
    }

    /// Mutable cursor starting at `position`.
    pub fn cursor_at_mut(&mut self, position: Position) -> Result<CursorMut<'_, E>> {
        let current = self.resolve(position)?;
        Ok(CursorMut {
            list: self,
            current,
        })
    }

    /// Reorder by relinking the existing nodes; stable. Positions stay valid.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&E, &E) -> core::cmp::Ordering,
    {
        let mut order: Vec<DefaultKey> = self.keys().collect();
        order.sort_by(|&a, &b| compare(self.item(a), self.item(b)));
        let mut prev = self.head;
        for k in order {
            self.slots[prev].next = k;
            self.slots[k].prev = prev;
            prev = k;
        }
        self.slots[prev].next = self.tail;
        self.slots[self.tail].prev = prev;
    }

    #[cfg(test)]
    pub(crate) fn assert_links(&self) {
        let mut count = 0;
        let mut k = self.head;
        while k != self.tail {
            let next = self.slots[k].next;
            assert_eq!(self.slots[next].prev, k, "prev/next mismatch");
            if k != self.head {
                count += 1;
                assert!(self.slots[k].item.as_ref().unwrap().is_owned_by(self.owner));
            }
            k = next;
        }
        assert_eq!(count, self.len);
        assert_eq!(self.slots.len(), self.len + 2);
    }
}

impl<E: PartialEq> LinkedList<E> {
    pub fn contains(&self, element: &E) -> bool {
        self.iter().any(|e| e == element)
    }

    pub fn index_of(&self, element: &E) -> Result<usize> {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        self.iter()
            .position(|e| e == element)
            .ok_or(CollectionError::ElementNotFound)
    }

    pub fn last_index_of(&self, element: &E) -> Result<usize> {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        self.iter()
            .rposition(|e| e == element)
            .ok_or(CollectionError::ElementNotFound)
    }

    /// Position of the first element equal to `element`.
    pub fn position_of(&self, element: &E) -> Result<Position> {
        if self.is_empty() {
            return Err(CollectionError::EmptyContainer);
        }
        self.positions()
            .find(|(_, e)| *e == element)
            .map(|(p, _)| p)
            .ok_or(CollectionError::ElementNotFound)
    }
}

impl<E> Default for LinkedList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PartialEq> PartialEq for LinkedList<E> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<E: Eq> Eq for LinkedList<E> {}

impl<E: core::fmt::Debug> core::fmt::Debug for LinkedList<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<E: Clone> Clone for LinkedList<E> {
    /// The clone is a distinct container: positions of `self` do not resolve in it.
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<E> FromIterator<E> for LinkedList<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut list = LinkedList::new();
        list.extend(iter);
        list
    }
}

impl<E> Extend<E> for LinkedList<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for e in iter {
            self.push_back(e);
        }
    }
}

/// Front-to-back iterator over `&E`.
pub struct Iter<'a, E> {
    list: &'a LinkedList<E>,
    front: DefaultKey,
    back: DefaultKey,
    remaining: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front;
        self.front = self.list.slots[k].next;
        self.remaining -= 1;
        Some(self.list.item(k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> DoubleEndedIterator for Iter<'_, E> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back;
        self.back = self.list.slots[k].prev;
        self.remaining -= 1;
        Some(self.list.item(k))
    }
}

impl<E> ExactSizeIterator for Iter<'_, E> {}

impl<'a, E> IntoIterator for &'a LinkedList<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator; drains front to back.
pub struct IntoIter<E> {
    list: LinkedList<E>,
}

impl<E> Iterator for IntoIter<E> {
    type Item = E;
    fn next(&mut self) -> Option<E> {
        self.list.pop_front().ok()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<E> DoubleEndedIterator for IntoIter<E> {
    fn next_back(&mut self) -> Option<E> {
        self.list.pop_back().ok()
    }
}

impl<E> IntoIterator for LinkedList<E> {
    type Item = E;
    type IntoIter = IntoIter<E>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

/// Cursor that can remove and insert while walking.
///
/// The cursor holds the list's unique borrow, so no other path can mutate
/// the list while it is live. Sitting on the tail sentinel means "past the end".
pub struct CursorMut<'a, E> {
    list: &'a mut LinkedList<E>,
    current: DefaultKey,
}

impl<E> CursorMut<'_, E> {
    pub fn is_at_end(&self) -> bool {
        self.current == self.list.tail
    }

    pub fn current(&mut self) -> Option<&mut E> {
        if self.is_at_end() {
            return None;
        }
        Some(self.list.item_mut(self.current))
    }

    pub fn position(&self) -> Option<Position> {
        if self.is_at_end() {
            return None;
        }
        Some(Position::new(self.list.owner, self.current))
    }

    pub fn move_next(&mut self) {
        if !self.is_at_end() {
            self.current = self.list.slots[self.current].next;
        }
    }

    /// Step back; stays on the first element when already there.
    pub fn move_prev(&mut self) {
        let prev = self.list.slots[self.current].prev;
        if prev != self.list.head {
            self.current = prev;
        }
    }

    /// Unlink the current element and move to its successor.
    pub fn remove_current(&mut self) -> Option<E> {
        if self.is_at_end() {
            return None;
        }
        let doomed = self.current;
        self.current = self.list.slots[doomed].next;
        Some(self.list.unlink(doomed))
    }

    /// Insert before the current element (appends when past the end).
    pub fn insert_before(&mut self, element: E) -> Position {
        let prev = self.list.slots[self.current].prev;
        self.list.link(element, prev, self.current)
    }
}

impl<E: Record> Persist for LinkedList<E> {
    fn persist<W: Write>(&self, w: &mut W) -> Result<()> {
        write_len(w, self.len)?;
        for e in self.iter() {
            e.write_record(w)?;
        }
        Ok(())
    }

    fn restore<R: Read>(r: &mut R) -> Result<Self> {
        let len = read_len(r)?;
        let mut list = LinkedList::new();
        for _ in 0..len {
            list.push_back(E::read_record(r)?);
        }
        tracing::debug!(len, "restored linked list");
        Ok(list)
    }
}
