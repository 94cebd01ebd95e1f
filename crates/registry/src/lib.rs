//! Versioned configuration registry over a key-value store.
//!
//! Every value published for a `(service, key_name)` pair is kept as an
//! immutable, numbered version. One active pointer per key names the version
//! readers see. Publishing can stage a version without activating it, and any
//! earlier version can be re-activated to roll back.
//!
//! # Features
//!
//! - **Race-free initialization**: Concurrent registrations of an unknown key
//!   all observe the same version 1
//! - **Atomic publish-and-activate**: The new version and the pointer move in
//!   one conditional transaction
//! - **Numeric ordering**: `v10` sorts after `v9`
//! - **Resilient store access**: Per-request timeout, jittered exponential
//!   backoff, cancellation and shutdown
//! - **Invariant checks**: Gaps and dangling pointers are reported, never
//!   repaired
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use keyver_registry::{RegistryConfig, VersionedKeyRegistry};
//! use keyver_store::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> keyver_registry::Result<()> {
//!     let config = RegistryConfig::builder().with_endpoint("localhost:2379").build()?;
//!     let registry = VersionedKeyRegistry::new(Arc::new(InMemoryStore::new()), config);
//!
//!     registry.create_or_register("crypto", "BUY_VALUE", "100").await?;
//!     registry.publish_new_version("crypto", "BUY_VALUE", "102", false).await?;
//!     registry.activate_version("crypto", "BUY_VALUE", 2).await?;
//!
//!     for version in registry.list_versions("crypto", "BUY_VALUE").await? {
//!         println!("v{} = {:?}", version.number, version.typed_value());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              VersionedKeyRegistry (Public API)              │
//! │  create_or_register │ publish_new_version │ activate │ reads│
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Conflict Loop                             │
//! │   Read state │ Conditional commit │ Re-read on lost race    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Resilience Layer                          │
//! │   Timeout │ Exponential backoff │ Cancellation              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   KvStore (keyver-store)                    │
//! │   get │ get_prefix │ commit(conditional writes)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod registry;
mod retry;

pub use config::{RegistryConfig, RegistryConfigBuilder, RetryPolicy, RetryPolicyBuilder};
pub use error::{OpContext, RegistryError, Result};
// Re-export the domain types that appear in the public API
pub use keyver_types::{LogicalKey, TypedValue, Version, VersionNumber, VersionRef};
pub use registry::VersionedKeyRegistry;
