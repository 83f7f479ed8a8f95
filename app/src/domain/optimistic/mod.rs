//! Optimistic mutations with rollback.
//!
//! A mutation is applied to the local collection before its remote write is
//! issued. If the write fails, the item is restored to the snapshot taken
//! when that mutation started, and the user is told which action did not
//! persist.
//!
//! Overlapping mutations on one item are ordered by a sequence number. A
//! failed mutation only rolls the item back while it is still the newest
//! mutation for that item; otherwise its rollback is discarded and its
//! snapshot is handed to the next in-flight mutation, because the failed
//! value never reached the backend. Once a newer mutation is confirmed,
//! older ones can no longer roll the item back.

mod collection;
mod controller;

pub use collection::{ChangeEvent, MutationTicket, OptimisticCollection, Settlement};
pub use controller::{BulkMutationReport, OptimisticMutationController};

use std::fmt;
use std::hash::Hash;

/// Items that can be addressed by a stable key inside a collection.
pub trait Keyed: Clone {
    /// Key type; must identify the item across mutations.
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync;

    /// Key of this item.
    fn key(&self) -> Self::Key;
}
