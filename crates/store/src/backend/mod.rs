//! Key-value store abstraction used by the registry.
//!
//! The trait models the subset of an etcd-style store the registry needs:
//! point reads, sorted prefix scans and all-or-nothing conditional
//! transactions. Implementations must apply a [`commit`](KvStore::commit)
//! atomically: either every write lands at one revision or none does.
//!
//! The trait is object safe so callers can inject any implementation as
//! `Arc<dyn KvStore>`.

mod memory;

use async_trait::async_trait;
pub use memory::InMemoryStore;

use crate::{
    error::Result,
    types::{KvEntry, TxnOutcome, WriteOp},
};

/// Async key-value store with conditional transactions.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a single key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` or `StoreError::Timeout` if the store
    /// cannot serve the read.
    async fn get(&self, key: &str) -> Result<Option<KvEntry>>;

    /// Reads every key starting with `prefix`, sorted ascending by key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` or `StoreError::Timeout` if the store
    /// cannot serve the scan.
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>>;

    /// Applies a batch of writes atomically.
    ///
    /// All conditions are evaluated against the state before the batch. If any
    /// condition fails, nothing is written and the first failing key is
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` for an empty batch or a batch that writes
    /// the same key twice, and `StoreError::Unavailable` or
    /// `StoreError::Timeout` if the store cannot serve the request.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<TxnOutcome>;

    /// Writes a key unconditionally.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`commit`](KvStore::commit).
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.commit(vec![WriteOp::put(key, value)]).await.map(|_| ())
    }

    /// Writes a key only if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`commit`](KvStore::commit).
    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<TxnOutcome> {
        self.commit(vec![WriteOp::put_if_absent(key, value)]).await
    }

    /// Writes a key only if it currently holds `expected`.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`commit`](KvStore::commit).
    async fn put_if_matches(
        &self,
        key: &str,
        expected: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<TxnOutcome> {
        self.commit(vec![WriteOp::put_if_matches(key, expected, value)]).await
    }
}
