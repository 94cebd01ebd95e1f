//! Core types, key-path layout and record codec for the Keyver registry.
//!
//! This crate provides the foundational types shared by the store and
//! registry crates:
//! - Logical keys, version numbers, versions and version references
//! - The `{service}/version/{key}/v{n}` and `{service}/used/{key}` path layout
//! - Postcard encoding of version records
//! - Name validation
//! - Error types using snafu

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod keys;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use codec::{CodecError, decode, encode};
pub use keys::KeyPathError;
pub use types::*;
pub use validation::ValidationError;
