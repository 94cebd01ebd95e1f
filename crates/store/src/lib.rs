//! Key-value store contract and in-memory implementation for Keyver.
//!
//! The registry treats the store as an external collaborator. This crate
//! defines what it needs from one:
//!
//! - [`KvStore`]: async, object-safe trait with point reads, sorted prefix
//!   scans, unconditional puts and all-or-nothing conditional transactions
//! - [`SetCondition`]: compare-and-swap predicates attached to writes
//! - [`InMemoryStore`]: ordered in-memory implementation with fault and delay
//!   injection, used for tests and single-process deployments
//!
//! # Example
//!
//! ```
//! use keyver_store::{InMemoryStore, KvStore, TxnOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> keyver_store::Result<()> {
//! let store = InMemoryStore::new();
//! let outcome = store.put_if_absent("crypto/used/BUY_VALUE", b"1".to_vec()).await?;
//! assert!(outcome.is_committed());
//!
//! let outcome = store.put_if_absent("crypto/used/BUY_VALUE", b"2".to_vec()).await?;
//! assert!(matches!(outcome, TxnOutcome::ConditionFailed { .. }));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{InMemoryStore, KvStore};
pub use error::{Result, StoreError};
pub use types::{KvEntry, SetCondition, TxnOutcome, WriteOp};
