//! Optimistic updates with rollback.
//!
//! A mutation snapshots the state it is about to change, applies the new
//! state to the view right away, and hands back an [`Optimistic`] token. The
//! remote call runs elsewhere; when its result arrives the token is settled.
//! Success keeps the new state. Failure returns the snapshot so the caller
//! can put it back exactly as it was.
//!
//! The [`InFlight`] set makes a second mutation of the same item a no-op
//! until the first one settles.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

/// Ids of items that currently have a mutation in flight
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned set is still a valid set of ids
    fn lock(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim `id`. Returns `None` if it is already claimed.
    pub fn try_acquire(&self, id: Uuid) -> Option<InFlightGuard> {
        if self.lock().insert(id) {
            Some(InFlightGuard {
                id,
                ids: Arc::clone(&self.ids),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases its id when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    id: Uuid,
    ids: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&self.id);
    }
}

/// One item's place in a list: where it sits and what it holds.
///
/// `item` is `None` when the item is absent, so deletes and creates are
/// ordinary slot changes. `after` is the key of the item that preceded it
/// when captured; writing the slot back prefers that anchor over the raw
/// index, so restoring one slot does not shuffle other items.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<T> {
    pub key: Uuid,
    pub index: usize,
    pub after: Option<Uuid>,
    pub item: Option<T>,
}

impl<T: Clone> Slot<T> {
    /// Capture the slot for `key`. A missing item is captured at the front of the list.
    pub fn capture(list: &[T], key: Uuid, key_of: fn(&T) -> Uuid) -> Self {
        match list.iter().position(|item| key_of(item) == key) {
            Some(index) => Self {
                key,
                index,
                after: index.checked_sub(1).map(|prev| key_of(&list[prev])),
                item: Some(list[index].clone()),
            },
            None => Self {
                key,
                index: 0,
                after: None,
                item: None,
            },
        }
    }

    /// Make `list` agree with this slot
    pub fn write(&self, list: &mut Vec<T>, key_of: fn(&T) -> Uuid) {
        if let Some(current) = list.iter().position(|item| key_of(item) == self.key) {
            list.remove(current);
        }

        let Some(item) = &self.item else {
            return;
        };

        let anchored = self.after.and_then(|after| {
            list.iter()
                .position(|other| key_of(other) == after)
                .map(|p| p + 1)
        });
        let position = match (self.after, anchored) {
            (_, Some(position)) => position,
            (None, None) => 0,
            (Some(_), None) => self.index.min(list.len()),
        };
        list.insert(position, item.clone());
    }

    /// Same place, item changed by `f`. An absent item stays absent.
    pub fn map_item(&self, f: impl FnOnce(&mut T)) -> Self {
        let mut next = self.clone();
        if let Some(item) = next.item.as_mut() {
            f(item);
        }
        next
    }

    pub fn vacated(&self) -> Self {
        Self {
            item: None,
            ..self.clone()
        }
    }

    pub fn filled(&self, item: T) -> Self {
        Self {
            item: Some(item),
            ..self.clone()
        }
    }
}

/// An applied but unconfirmed mutation. Holds the snapshot and the in-flight claim.
#[derive(Debug)]
pub struct Optimistic<S> {
    snapshot: S,
    applied: S,
    guard: InFlightGuard,
}

/// How an optimistic mutation ended
#[derive(Debug, PartialEq)]
pub enum Settled<S, E> {
    /// The remote write succeeded; the view already shows it
    Confirmed,
    /// The remote write failed; `snapshot` must be written back
    RolledBack { snapshot: S, error: E },
}

impl<S> Optimistic<S> {
    pub fn key(&self) -> Uuid {
        self.guard.id()
    }

    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    /// The state shown while the mutation is unconfirmed
    pub fn applied(&self) -> &S {
        &self.applied
    }

    /// Resolve the mutation with the remote result. Releases the in-flight claim.
    pub fn settle<T, E>(self, result: Result<T, E>) -> Settled<S, E> {
        match result {
            Ok(_) => Settled::Confirmed,
            Err(error) => Settled::RolledBack {
                snapshot: self.snapshot,
                error,
            },
        }
    }
}

/// Start a mutation of `key`.
///
/// Returns the new state to show and the token to settle later, or `None`
/// if `key` already has a mutation in flight.
pub fn begin<S: Clone>(
    inflight: &InFlight,
    key: Uuid,
    current: &S,
    transform: impl FnOnce(&S) -> S,
) -> Option<(S, Optimistic<S>)> {
    let guard = inflight.try_acquire(key)?;
    let next = transform(current);
    Some((
        next.clone(),
        Optimistic {
            snapshot: current.clone(),
            applied: next,
            guard,
        },
    ))
}

/// [`begin`] for an item in a list: captures its slot, transforms it and writes it back
pub fn begin_in_list<T: Clone>(
    inflight: &InFlight,
    list: &mut Vec<T>,
    key: Uuid,
    key_of: fn(&T) -> Uuid,
    transform: impl FnOnce(&Slot<T>) -> Slot<T>,
) -> Option<Optimistic<Slot<T>>> {
    let current = Slot::capture(list, key, key_of);
    let (next, token) = begin(inflight, key, &current, transform)?;
    next.write(list, key_of);
    Some(token)
}

/// Result of [`mutate`]
#[derive(Debug, PartialEq)]
pub enum Outcome<E> {
    /// Another mutation of the same item was in flight
    Skipped,
    Confirmed,
    RolledBack(E),
}

/// Run a whole optimistic mutation in place, awaiting the remote call.
///
/// `state` shows the transformed value while `remote` runs and is restored
/// to the snapshot if it fails.
pub async fn mutate<S, T, E, Fut>(
    inflight: &InFlight,
    key: Uuid,
    state: &mut S,
    transform: impl FnOnce(&S) -> S,
    remote: impl FnOnce() -> Fut,
) -> Outcome<E>
where
    S: Clone,
    Fut: Future<Output = Result<T, E>>,
{
    let Some((next, token)) = begin(inflight, key, state, transform) else {
        return Outcome::Skipped;
    };
    *state = next;

    match token.settle(remote().await) {
        Settled::Confirmed => Outcome::Confirmed,
        Settled::RolledBack { snapshot, error } => {
            *state = snapshot;
            Outcome::RolledBack(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Uuid,
        count: u32,
    }

    fn key_of(item: &Item) -> Uuid {
        item.id
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item {
                id: Uuid::new_v4(),
                count: i as u32,
            })
            .collect()
    }

    #[test]
    fn test_second_acquire_is_refused_until_release() {
        let inflight = InFlight::new();
        let id = Uuid::new_v4();

        let guard = inflight.try_acquire(id).unwrap();
        assert!(inflight.try_acquire(id).is_none());
        assert!(inflight.contains(&id));

        drop(guard);
        assert!(inflight.is_empty());
        assert!(inflight.try_acquire(id).is_some());
    }

    #[test]
    fn test_settle_releases_claim() {
        let inflight = InFlight::new();
        let id = Uuid::new_v4();
        let (next, token) = begin(&inflight, id, &3u32, |n| n + 1).unwrap();
        assert_eq!(next, 4);
        assert_eq!((*token.snapshot(), *token.applied()), (3, 4));
        assert!(begin(&inflight, id, &next, |n| n + 1).is_none());

        let settled = token.settle::<(), &str>(Err("offline"));
        assert_eq!(
            settled,
            Settled::RolledBack {
                snapshot: 3,
                error: "offline"
            }
        );
        assert!(!inflight.contains(&id));
    }

    #[test]
    fn test_vacated_slot_restores_at_original_position() {
        let mut list = items(4);
        let original = list.clone();
        let inflight = InFlight::new();
        let key = list[2].id;

        let token = begin_in_list(&inflight, &mut list, key, key_of, Slot::vacated).unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|i| i.id != key));

        if let Settled::RolledBack { snapshot, .. } = token.settle::<(), ()>(Err(())) {
            snapshot.write(&mut list, key_of);
        }
        assert_eq!(list, original);
    }

    #[test]
    fn test_concurrent_deletes_restore_independently() {
        let mut list = items(5);
        let original = list.clone();
        let inflight = InFlight::new();
        let (a, b) = (list[1].id, list[2].id);

        let first = begin_in_list(&inflight, &mut list, a, key_of, Slot::vacated).unwrap();
        let second = begin_in_list(&inflight, &mut list, b, key_of, Slot::vacated).unwrap();
        assert_eq!(list.len(), 3);

        // Roll back in the opposite order they were applied
        if let Settled::RolledBack { snapshot, .. } = second.settle::<(), ()>(Err(())) {
            snapshot.write(&mut list, key_of);
        }
        if let Settled::RolledBack { snapshot, .. } = first.settle::<(), ()>(Err(())) {
            snapshot.write(&mut list, key_of);
        }
        assert_eq!(list, original);
    }

    #[test]
    fn test_filled_slot_inserts_and_rolls_back_to_absent() {
        let mut list = items(2);
        let original = list.clone();
        let inflight = InFlight::new();
        let new_item = Item {
            id: Uuid::new_v4(),
            count: 0,
        };

        let token = begin_in_list(&inflight, &mut list, new_item.id, key_of, |slot| {
            slot.filled(new_item.clone())
        })
        .unwrap();
        assert_eq!(list[0], new_item);

        if let Settled::RolledBack { snapshot, .. } = token.settle::<(), ()>(Err(())) {
            snapshot.write(&mut list, key_of);
        }
        assert_eq!(list, original);
    }

    #[test]
    fn test_map_item_keeps_position() {
        let mut list = items(3);
        let inflight = InFlight::new();
        let key = list[1].id;

        let token = begin_in_list(&inflight, &mut list, key, key_of, |slot| {
            slot.map_item(|item| item.count += 10)
        })
        .unwrap();
        assert_eq!(list[1].id, key);
        assert_eq!(list[1].count, 11);
        assert_eq!(token.settle::<(), ()>(Ok(())), Settled::Confirmed);
        assert_eq!(list[1].count, 11);
    }

    #[tokio::test]
    async fn test_mutate_rolls_back_on_failure() {
        let inflight = InFlight::new();
        let id = Uuid::new_v4();
        let mut count = 3u32;

        let outcome = mutate(&inflight, id, &mut count, |n| n + 1, || async {
            Err::<(), _>("server said no")
        })
        .await;
        assert_eq!(outcome, Outcome::RolledBack("server said no"));
        assert_eq!(count, 3);

        let outcome = mutate(&inflight, id, &mut count, |n| n + 1, || async {
            Ok::<_, &str>(())
        })
        .await;
        assert_eq!(outcome, Outcome::Confirmed);
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_mutate_skips_item_already_in_flight() {
        let inflight = InFlight::new();
        let id = Uuid::new_v4();
        let _held = inflight.try_acquire(id).unwrap();
        let mut count = 1u32;

        let outcome = mutate(&inflight, id, &mut count, |n| n + 1, || async {
            Ok::<_, ()>(())
        })
        .await;
        assert_eq!(outcome, Outcome::Skipped);
        assert_eq!(count, 1);
    }
}
