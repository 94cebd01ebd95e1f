//! Centralized serialization and deserialization functions.
//!
//! Version records are stored as postcard bytes. All encoding goes through
//! [`encode`] and [`decode`] so that error handling stays uniform.

use serde::{Serialize, de::DeserializeOwned};
use snafu::Snafu;

/// Error type for codec operations.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// Encoding failed.
    #[snafu(display("Encoding failed: {source}"))]
    Encode {
        /// The underlying postcard error.
        source: postcard::Error,
    },

    /// Decoding failed.
    #[snafu(display("Decoding failed: {source}"))]
    Decode {
        /// The underlying postcard error.
        source: postcard::Error,
    },
}

/// Encodes a value to bytes using postcard serialization.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(|source| CodecError::Encode { source })
}

/// Decodes bytes to a value using postcard deserialization.
///
/// # Errors
///
/// Returns `CodecError::Decode` if deserialization fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    postcard::from_bytes(bytes).map_err(|source| CodecError::Decode { source })
}
