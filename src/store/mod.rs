//! Store - storage collaborators touched by import.
//!
//! Real back-ends (SQLite caches, the collection repository) live outside
//! this crate. They serialize their own writes; callers never lock.
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`TxStore`] | `delete_all` |
//! | [`UtxoStore`] | `delete_all` |
//! | [`CollectionStore`] | `collections`, `reset`, `add_new` |

mod memory;

pub use memory::MemoryStore;

use crate::models::PubKeyCollection;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Lock poisoned: {0}")]
    Lock(&'static str),

    #[error("Duplicate collection id: {0}")]
    Duplicate(String),

    #[error("Backend: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Cached transactions.
#[async_trait]
pub trait TxStore: Send + Sync {
    async fn delete_all(&self) -> StoreResult<()>;
}

/// Cached unspent outputs.
#[async_trait]
pub trait UtxoStore: Send + Sync {
    async fn delete_all(&self) -> StoreResult<()>;
}

/// The watched collections.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Snapshot of the current collections, in insertion order.
    fn collections(&self) -> Vec<PubKeyCollection>;
    async fn reset(&self) -> StoreResult<()>;
    async fn add_new(&self, collection: PubKeyCollection) -> StoreResult<()>;
}
