//! Ownership kernel: owner identities, position handles and the node wrapper
//! every engine stores in its slot arena.
//!
//! A `Position` pairs the identity of the container that minted it with a
//! generational `slotmap` key. `validate` rejects foreign handles, stale
//! generations and disowned nodes as `NotOwned`, and only then reports an
//! empty container.

use crate::error::{CollectionError, Result};
use core::num::NonZeroU64;
use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::DefaultKey;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity of one container instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OwnerId(NonZeroU64);

impl OwnerId {
    /// Mint an identity no other container in this process shares.
    pub fn fresh() -> Self {
        let raw = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
        match NonZeroU64::new(raw) {
            Some(id) => OwnerId(id),
            // 2^64 container constructions; treat like an allocation failure.
            None => std::process::abort(),
        }
    }
}

/// Opaque handle to one stored element inside exactly one container.
///
/// Valid until the element is removed. Handles are `Copy`; using one after
/// removal, or against another container, fails with `NotOwned`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position {
    owner: OwnerId,
    slot: DefaultKey,
}

impl Position {
    pub(crate) fn new(owner: OwnerId, slot: DefaultKey) -> Self {
        Position { owner, slot }
    }

    pub(crate) fn slot(&self) -> DefaultKey {
        self.slot
    }

    /// Identity of the container that minted this position.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }
}

/// Payload paired with the container that currently owns it.
#[derive(Debug)]
pub struct Owned<E> {
    payload: E,
    owner: Option<OwnerId>,
}

impl<E> Owned<E> {
    /// Wrap `payload` for `owner`. Fails with `InvalidArgument` when no owner
    /// is given.
    pub fn create(payload: E, owner: Option<OwnerId>) -> Result<Self> {
        match owner {
            Some(owner) => Ok(Owned::new(payload, owner)),
            None => Err(CollectionError::InvalidArgument("node requires an owner")),
        }
    }

    #[inline]
    pub(crate) fn new(payload: E, owner: OwnerId) -> Self {
        Owned {
            payload,
            owner: Some(owner),
        }
    }

    #[inline]
    pub fn is_owned_by(&self, claimant: OwnerId) -> bool {
        self.owner == Some(claimant)
    }

    #[inline]
    pub fn is_disowned(&self) -> bool {
        self.owner.is_none()
    }

    /// Clear ownership. Must be called exactly once, at unlink time.
    pub(crate) fn invalidate(&mut self) {
        debug_assert!(self.owner.is_some(), "node invalidated twice");
        self.owner = None;
    }

    #[inline]
    pub fn get(&self) -> &E {
        &self.payload
    }

    #[inline]
    pub(crate) fn get_mut(&mut self) -> &mut E {
        &mut self.payload
    }

    pub(crate) fn replace(&mut self, payload: E) -> E {
        core::mem::replace(&mut self.payload, payload)
    }

    /// Disown and hand back the payload.
    pub(crate) fn into_disowned(mut self) -> E {
        self.invalidate();
        self.payload
    }
}

/// Check that `position` was minted by `owner` and still names a live node,
/// then that the container holds at least one element. `owns` reports
/// whether the slot holds a payload node owned by `owner`.
///
/// A handle whose removal emptied the container fails the liveness check,
/// so it reads as `NotOwned` rather than `EmptyContainer`.
pub(crate) fn validate<F>(
    position: Position,
    owner: OwnerId,
    len: usize,
    owns: F,
) -> Result<DefaultKey>
where
    F: FnOnce(DefaultKey) -> bool,
{
    if position.owner != owner || !owns(position.slot) {
        return Err(CollectionError::NotOwned);
    }
    if len == 0 {
        return Err(CollectionError::EmptyContainer);
    }
    Ok(position.slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn fresh_owner_ids_are_distinct() {
        let a = OwnerId::fresh();
        let b = OwnerId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn create_without_owner_is_rejected() {
        match Owned::create(1, None) {
            Err(CollectionError::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn invalidate_clears_ownership() {
        let me = OwnerId::fresh();
        let mut node = Owned::create("x", Some(me)).unwrap();
        assert!(node.is_owned_by(me));
        assert!(!node.is_owned_by(OwnerId::fresh()));
        node.invalidate();
        assert!(!node.is_owned_by(me));
        assert!(node.is_disowned());
    }

    #[test]
    fn validate_checks_owner_and_liveness_before_emptiness() {
        let mut slots: SlotMap<DefaultKey, ()> = SlotMap::new();
        let me = OwnerId::fresh();
        let other = OwnerId::fresh();
        let pos = Position::new(me, slots.insert(()));
        let live = |k: DefaultKey| slots.contains_key(k);

        assert_eq!(validate(pos, me, 1, live).unwrap(), pos.slot());
        assert!(matches!(validate(pos, other, 1, live), Err(CollectionError::NotOwned)));
        assert!(matches!(validate(pos, other, 0, live), Err(CollectionError::NotOwned)));
        assert!(matches!(
            validate(pos, me, 0, live),
            Err(CollectionError::EmptyContainer)
        ));

        // A freed slot is NotOwned even when the container is empty.
        slots.remove(pos.slot());
        let live = |k: DefaultKey| slots.contains_key(k);
        assert!(matches!(validate(pos, me, 0, live), Err(CollectionError::NotOwned)));
        assert!(matches!(validate(pos, me, 3, live), Err(CollectionError::NotOwned)));
    }

    #[test]
    fn replace_returns_previous_payload() {
        let mut node = Owned::create(1, Some(OwnerId::fresh())).unwrap();
        assert_eq!(node.replace(2), 1);
        assert_eq!(*node.get(), 2);
        *node.get_mut() += 1;
        assert_eq!(node.into_disowned(), 3);
    }
}
