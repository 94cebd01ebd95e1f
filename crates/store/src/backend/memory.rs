//! In-memory key-value store for tests and single-process embedding.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::KvStore;
use crate::{
    error::{RejectedSnafu, Result, UnavailableSnafu},
    types::{KvEntry, TxnOutcome, WriteOp},
};

/// Keys and the revision counter, guarded together so a commit is atomic.
#[derive(Debug, Default)]
struct Keyspace {
    entries: BTreeMap<String, KvEntry>,
    revision: u64,
}

/// Shared state behind every clone of an [`InMemoryStore`].
#[derive(Debug, Default)]
struct MemoryState {
    keyspace: RwLock<Keyspace>,

    /// Number of `Unavailable` errors to inject for the next requests.
    unavailable_count: AtomicUsize,

    /// Delay to inject before each request (milliseconds).
    delay_ms: AtomicU64,

    /// Total read requests received (`get` and `get_prefix`).
    read_count: AtomicUsize,

    /// Total commit requests received.
    write_count: AtomicUsize,

    /// Set by [`InMemoryStore::close`].
    closed: AtomicBool,
}

impl MemoryState {
    /// Checks if we should inject an unavailable error, decrementing counter if so.
    fn should_inject_unavailable(&self) -> bool {
        loop {
            let current = self.unavailable_count.load(Ordering::SeqCst);
            if current == 0 {
                return false;
            }
            if self
                .unavailable_count
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Applies configured delay, then fails if closed or an error is injected.
    async fn check_injection(&self) -> Result<()> {
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.closed.load(Ordering::SeqCst) {
            return UnavailableSnafu { message: "store closed" }.fail();
        }
        if self.should_inject_unavailable() {
            return UnavailableSnafu { message: "injected error" }.fail();
        }
        Ok(())
    }
}

/// In-memory [`KvStore`] backed by an ordered map.
///
/// All data is stored in memory and lost when the last clone is dropped.
/// Clones share the same keyspace, so one store can be handed to several
/// registries to simulate independent processes.
///
/// Provides controllable behavior for testing:
/// - Failure injection (`Unavailable` for the next N requests)
/// - Per-request delay injection
/// - Request counting
/// - Direct keyspace access for simulating external tampering
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<MemoryState>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects `Unavailable` errors for the next N requests.
    ///
    /// Each request decrements this counter and fails until it reaches 0.
    pub fn inject_unavailable(&self, count: usize) {
        self.state.unavailable_count.store(count, Ordering::SeqCst);
    }

    /// Injects a delay before every subsequent request.
    ///
    /// Set to zero to disable.
    pub fn inject_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Returns the total number of read requests received.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.state.read_count.load(Ordering::SeqCst)
    }

    /// Returns the total number of commit requests received.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.write_count.load(Ordering::SeqCst)
    }

    /// Returns the revision of the latest commit (0 for an empty store).
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.keyspace.read().revision
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.keyspace.read().entries.len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every stored key in ascending order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state.keyspace.read().entries.keys().cloned().collect()
    }

    /// Writes a key directly, bypassing fault injection and counters.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let mut keyspace = self.state.keyspace.write();
        keyspace.revision += 1;
        let revision = keyspace.revision;
        write_entry(&mut keyspace.entries, key.into(), value.into(), revision);
    }

    /// Removes a key directly, bypassing fault injection and counters.
    ///
    /// Returns true if the key existed.
    pub fn remove(&self, key: &str) -> bool {
        let mut keyspace = self.state.keyspace.write();
        let existed = keyspace.entries.remove(key).is_some();
        if existed {
            keyspace.revision += 1;
        }
        existed
    }

    /// Closes the store. Every later request fails with `Unavailable`.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    /// Returns true if [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

/// Inserts or overwrites an entry, keeping its create revision on overwrite.
fn write_entry(
    entries: &mut BTreeMap<String, KvEntry>,
    key: String,
    value: Vec<u8>,
    revision: u64,
) {
    let create_revision = entries.get(&key).map_or(revision, |e| e.create_revision);
    entries.insert(key.clone(), KvEntry { key, value, create_revision, mod_revision: revision });
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<KvEntry>> {
        self.state.read_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_injection().await?;

        Ok(self.state.keyspace.read().entries.get(key).cloned())
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        self.state.read_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_injection().await?;

        let keyspace = self.state.keyspace.read();
        Ok(keyspace
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<TxnOutcome> {
        self.state.write_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_injection().await?;

        if ops.is_empty() {
            return RejectedSnafu { message: "transaction has no operations" }.fail();
        }
        {
            let mut seen = HashSet::with_capacity(ops.len());
            for op in &ops {
                if !seen.insert(op.key.as_str()) {
                    return RejectedSnafu {
                        message: format!("duplicate key '{}' in transaction", op.key),
                    }
                    .fail();
                }
            }
        }

        let mut keyspace = self.state.keyspace.write();

        // All-or-nothing: every condition is checked before anything is written.
        for op in &ops {
            if let Some(condition) = &op.condition
                && !condition.is_met(keyspace.entries.get(&op.key))
            {
                return Ok(TxnOutcome::ConditionFailed { key: op.key.clone() });
            }
        }

        keyspace.revision += 1;
        let revision = keyspace.revision;
        for op in ops {
            write_entry(&mut keyspace.entries, op.key, op.value, revision);
        }

        Ok(TxnOutcome::Committed { revision })
    }
}
