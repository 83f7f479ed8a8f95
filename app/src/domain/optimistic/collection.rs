//! Synchronous bookkeeping for optimistic mutations.

use std::collections::HashMap;

use serde_json::json;
use tracing::debug;

use super::Keyed;
use crate::domain::Error;

/// Handle for one in-flight mutation, returned by
/// [`OptimisticCollection::begin`] and consumed by
/// [`OptimisticCollection::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationTicket<K> {
    key: K,
    sequence: u64,
}

impl<K> MutationTicket<K> {
    /// Key of the mutated item.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Sequence number; strictly increasing across the collection.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// How a mutation ended once its remote write settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The write succeeded; the optimistic value stands.
    Confirmed,
    /// The write failed and the item was restored to its snapshot.
    RolledBack,
    /// The write failed but a newer mutation, an external change, or a
    /// reload owns the item now, so the rollback was not applied.
    RollbackDiscarded,
}

/// Row-level change pushed by the realtime feed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T: Keyed> {
    /// A row was created.
    Inserted(T),
    /// A row was modified.
    Updated(T),
    /// A row was removed.
    Deleted(T::Key),
}

#[derive(Debug, Clone)]
struct InFlight<T> {
    sequence: u64,
    restore: T,
}

#[derive(Debug, Clone)]
struct Ledger<T> {
    in_flight: Vec<InFlight<T>>,
    confirmed: Option<u64>,
}

impl<T> Ledger<T> {
    fn new() -> Self {
        Self {
            in_flight: Vec::new(),
            confirmed: None,
        }
    }

    fn superseded(&self, sequence: u64) -> bool {
        self.confirmed.is_some_and(|confirmed| confirmed > sequence)
    }
}

/// Ordered collection of items with per-item mutation ledgers.
///
/// The collection is the displayed state. Items keep their position when
/// mutated or rolled back.
///
/// # Examples
/// ```
/// use wild_robot::domain::{
///     AttendanceStatus, EnrollmentId, OptimisticCollection, RosterEntry, SessionId, Settlement,
/// };
///
/// let session = SessionId::random();
/// let id = EnrollmentId::new(1).expect("positive id");
/// let mut roster = OptimisticCollection::new(vec![RosterEntry::new(
///     id,
///     session,
///     "Kai",
///     AttendanceStatus::Pending,
/// )]);
///
/// let ticket = roster
///     .begin(&id, |entry| entry.with_status(AttendanceStatus::Present))
///     .expect("entry exists");
/// assert_eq!(roster.get(&id).map(RosterEntry::status), Some(AttendanceStatus::Present));
///
/// assert_eq!(roster.settle(&ticket, false), Settlement::RolledBack);
/// assert_eq!(roster.get(&id).map(RosterEntry::status), Some(AttendanceStatus::Pending));
/// ```
#[derive(Debug, Clone)]
pub struct OptimisticCollection<T: Keyed> {
    items: Vec<T>,
    ledgers: HashMap<T::Key, Ledger<T>>,
    next_sequence: u64,
}

impl<T: Keyed> Default for OptimisticCollection<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Keyed> OptimisticCollection<T> {
    /// Wrap freshly fetched items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            ledgers: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Displayed items in order.
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Displayed item for `key`.
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.key() == *key)
    }

    /// Number of unsettled mutations for `key`.
    pub fn pending_for(&self, key: &T::Key) -> usize {
        self.ledgers
            .get(key)
            .map_or(0, |ledger| ledger.in_flight.len())
    }

    fn position(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|item| item.key() == *key)
    }

    /// Snapshot the item for `key`, then display `update(snapshot)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::not_found`] when no item has `key`, and
    /// [`Error::invalid_request`] when `update` changes the key. The
    /// collection is untouched in both cases.
    pub fn begin(
        &mut self,
        key: &T::Key,
        update: impl FnOnce(&T) -> T,
    ) -> Result<MutationTicket<T::Key>, Error> {
        let Some(slot) = self.items.iter_mut().find(|item| item.key() == *key) else {
            return Err(Error::not_found(format!("item {key} is not in the collection"))
                .with_details(json!({ "key": key.to_string() })));
        };
        let pending = update(slot);
        if pending.key() != *key {
            return Err(Error::invalid_request(format!(
                "mutation of item {key} must not change its key"
            ))
            .with_details(json!({
                "key": key.to_string(),
                "changedTo": pending.key().to_string(),
            })));
        }
        let previous = std::mem::replace(slot, pending);

        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.ledgers
            .entry(key.clone())
            .or_insert_with(Ledger::new)
            .in_flight
            .push(InFlight {
                sequence,
                restore: previous,
            });
        debug!(%key, sequence, "optimistic mutation applied");

        Ok(MutationTicket {
            key: key.clone(),
            sequence,
        })
    }

    /// Resolve the mutation behind `ticket` once its remote write settled.
    pub fn settle(&mut self, ticket: &MutationTicket<T::Key>, succeeded: bool) -> Settlement {
        let missed = if succeeded {
            Settlement::Confirmed
        } else {
            Settlement::RollbackDiscarded
        };
        let Some(ledger) = self.ledgers.get_mut(&ticket.key) else {
            return missed;
        };
        let Some(index) = ledger
            .in_flight
            .iter()
            .position(|entry| entry.sequence == ticket.sequence)
        else {
            return missed;
        };
        let entry = ledger.in_flight.remove(index);

        let rollback = if succeeded {
            ledger.confirmed = ledger.confirmed.max(Some(entry.sequence));
            None
        } else if ledger.superseded(entry.sequence) {
            None
        } else if let Some(newer) = ledger.in_flight.get_mut(index) {
            newer.restore = entry.restore;
            None
        } else {
            Some(entry.restore)
        };

        let settlement = match rollback {
            _ if succeeded => Settlement::Confirmed,
            Some(snapshot) => self.restore(&ticket.key, snapshot),
            None => Settlement::RollbackDiscarded,
        };

        self.forget_idle(&ticket.key);
        debug!(key = %ticket.key, sequence = ticket.sequence, ?settlement, "optimistic mutation settled");
        settlement
    }

    fn restore(&mut self, key: &T::Key, snapshot: T) -> Settlement {
        match self.items.iter_mut().find(|item| item.key() == *key) {
            Some(slot) => {
                *slot = snapshot;
                Settlement::RolledBack
            }
            None => Settlement::RollbackDiscarded,
        }
    }

    fn forget_idle(&mut self, key: &T::Key) {
        if self
            .ledgers
            .get(key)
            .is_some_and(|ledger| ledger.in_flight.is_empty())
        {
            self.ledgers.remove(key);
        }
    }

    /// Merge a change pushed by the realtime feed.
    ///
    /// Inserts and updates are authoritative: the pushed row replaces the
    /// displayed item (or is appended) and becomes the restore target of
    /// every in-flight mutation for that key. Deletes remove the item and
    /// void its pending rollbacks.
    pub fn apply_change(&mut self, event: ChangeEvent<T>) {
        match event {
            ChangeEvent::Inserted(item) | ChangeEvent::Updated(item) => {
                let key = item.key();
                if let Some(ledger) = self.ledgers.get_mut(&key) {
                    for entry in &mut ledger.in_flight {
                        entry.restore = item.clone();
                    }
                }
                match self.position(&key) {
                    Some(index) => {
                        if let Some(slot) = self.items.get_mut(index) {
                            *slot = item;
                        }
                    }
                    None => self.items.push(item),
                }
                debug!(%key, "external change merged");
            }
            ChangeEvent::Deleted(key) => {
                self.items.retain(|item| item.key() != key);
                self.ledgers.remove(&key);
                debug!(%key, "external delete merged");
            }
        }
    }

    /// Replace every item with a fresh fetch and drop all ledgers.
    ///
    /// Writes still in flight settle as [`Settlement::Confirmed`] or
    /// [`Settlement::RollbackDiscarded`] without touching the new items.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.ledgers.clear();
    }
}
