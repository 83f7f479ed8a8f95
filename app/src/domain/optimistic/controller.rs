//! Async driver that pairs optimistic mutations with their remote writes.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use tracing::debug;

use super::{ChangeEvent, Keyed, OptimisticCollection, Settlement};
use crate::domain::Error;
use crate::domain::ports::{Notification, Notifier};

/// Per-key results of [`OptimisticMutationController::mutate_many`].
#[derive(Debug, Clone, PartialEq)]
pub struct BulkMutationReport<K> {
    /// Keys whose writes succeeded.
    pub confirmed: Vec<K>,
    /// Keys restored to their snapshot after a failed write.
    pub rolled_back: Vec<K>,
    /// Keys whose failed write was superseded before it settled.
    pub discarded: Vec<K>,
    /// Keys that could not be mutated at all; no write was issued.
    pub rejected: Vec<(K, Error)>,
}

impl<K> Default for BulkMutationReport<K> {
    fn default() -> Self {
        Self {
            confirmed: Vec::new(),
            rolled_back: Vec::new(),
            discarded: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<K> BulkMutationReport<K> {
    fn record(&mut self, key: K, outcome: Result<Settlement, Error>) {
        match outcome {
            Ok(Settlement::Confirmed) => self.confirmed.push(key),
            Ok(Settlement::RolledBack) => self.rolled_back.push(key),
            Ok(Settlement::RollbackDiscarded) => self.discarded.push(key),
            Err(error) => self.rejected.push((key, error)),
        }
    }

    /// Number of writes that did not persist.
    pub fn failed(&self) -> usize {
        self.rolled_back.len() + self.discarded.len()
    }
}

/// Applies mutations locally, issues their writes, and rolls back failures.
///
/// The collection lock is never held across the remote write, so the
/// optimistic value is visible to readers while the write is in flight.
pub struct OptimisticMutationController<T: Keyed> {
    state: Mutex<OptimisticCollection<T>>,
    notifier: Arc<dyn Notifier>,
}

impl<T: Keyed> OptimisticMutationController<T> {
    /// Create a controller over `items`, reporting failures to `notifier`.
    pub fn new(items: Vec<T>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(OptimisticCollection::new(items)),
            notifier,
        }
    }

    fn state(&self) -> MutexGuard<'_, OptimisticCollection<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the displayed items.
    pub fn snapshot(&self) -> Vec<T> {
        self.state().items().to_vec()
    }

    /// Copy of the displayed item for `key`.
    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.state().get(key).cloned()
    }

    /// Number of unsettled mutations for `key`.
    pub fn pending_for(&self, key: &T::Key) -> usize {
        self.state().pending_for(key)
    }

    /// Merge a realtime change; see [`OptimisticCollection::apply_change`].
    pub fn apply_change(&self, event: ChangeEvent<T>) {
        self.state().apply_change(event);
    }

    /// Swap in freshly fetched items; see [`OptimisticCollection::replace_all`].
    pub fn replace_all(&self, items: Vec<T>) {
        self.state().replace_all(items);
    }

    /// Display `update(current)` for `key`, then run `commit` with the new
    /// value and roll back if it fails.
    ///
    /// Each failed write produces exactly one notification naming `action`
    /// and `key`, whether or not its rollback was applied. Nothing is
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns an error without issuing the write when `key` is unknown or
    /// `update` changes the key.
    pub async fn mutate<U, C, Fut, E>(
        &self,
        key: &T::Key,
        action: &str,
        update: U,
        commit: C,
    ) -> Result<Settlement, Error>
    where
        U: FnOnce(&T) -> T,
        C: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let (ticket, pending) = {
            let mut state = self.state();
            let ticket = state.begin(key, update)?;
            let pending = state
                .get(key)
                .cloned()
                .ok_or_else(|| Error::internal(format!("item {key} vanished mid-mutation")))?;
            (ticket, pending)
        };

        let result = commit(pending).await;
        let settlement = self.state().settle(&ticket, result.is_ok());

        if let Err(cause) = result {
            debug!(%key, action, ?settlement, "remote write failed");
            self.notifier
                .notify(Notification::mutation_failed(action, key, cause));
        }
        Ok(settlement)
    }

    /// Apply the same update to every key as independent mutations whose
    /// writes run concurrently. One failure only rolls back its own key.
    pub async fn mutate_many<U, C, Fut, E>(
        &self,
        keys: &[T::Key],
        action: &str,
        update: U,
        commit: C,
    ) -> BulkMutationReport<T::Key>
    where
        U: Fn(&T) -> T,
        C: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let update = &update;
        let commit = &commit;
        let outcomes = join_all(keys.iter().map(|key| async move {
            let outcome = self
                .mutate(key, action, |item| update(item), |value| commit(value))
                .await;
            (key.clone(), outcome)
        }))
        .await;

        let mut report = BulkMutationReport::default();
        for (key, outcome) in outcomes {
            report.record(key, outcome);
        }
        report
    }
}
