//! Core domain types for the versioned-key registry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, validate_key_name, validate_service};

// ============================================================================
// Logical Keys
// ============================================================================

/// A `(service, key_name)` pair whose values are tracked as numbered versions.
///
/// Both components are validated on construction, so every `LogicalKey`
/// renders to key paths that parse back to the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalKey {
    service: String,
    key_name: String,
}

impl LogicalKey {
    /// Creates a logical key after validating both names.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if either name is empty, too long, or
    /// contains characters outside the name whitelist.
    pub fn new(
        service: impl Into<String>,
        key_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let service = service.into();
        let key_name = key_name.into();
        validate_service(&service)?;
        validate_key_name(&key_name)?;
        Ok(Self { service, key_name })
    }

    /// Returns the service namespace.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the key name within the service.
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key_name
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.key_name)
    }
}

// ============================================================================
// Version Numbers
// ============================================================================

/// Position of a version in a key's history. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionNumber(u64);

impl VersionNumber {
    /// The first version of every logical key.
    pub const FIRST: Self = Self(1);

    /// Creates a version number, returning `None` for zero.
    #[must_use]
    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Returns the raw number.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns the number that follows this one, or `None` on overflow.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Parses the canonical decimal rendering: ASCII digits, no sign, no
    /// leading zeros, non-zero.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if input.starts_with('0') {
            return None;
        }
        input.parse::<u64>().ok().and_then(Self::new)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Versions
// ============================================================================

/// Payload persisted under a version path.
///
/// The key path already carries service, key name and version number, so the
/// stored record holds only what the path cannot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Opaque value bytes.
    pub value: Vec<u8>,
    /// When the version was published.
    pub created_at: DateTime<Utc>,
}

/// One immutable, numbered value published for a logical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// The logical key this version belongs to.
    pub key: LogicalKey,
    /// Position in the key's history.
    pub number: VersionNumber,
    /// Opaque value bytes.
    pub value: Vec<u8>,
    /// When the version was published.
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Assembles a version from its path components and stored record.
    #[must_use]
    pub fn from_record(key: LogicalKey, number: VersionNumber, record: VersionRecord) -> Self {
        Self { key, number, value: record.value, created_at: record.created_at }
    }

    /// Returns the value as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    /// Interprets the value bytes as a [`TypedValue`].
    #[must_use]
    pub fn typed_value(&self) -> TypedValue {
        TypedValue::from_bytes(&self.value)
    }
}

/// Reference to a version returned by mutating registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    /// The logical key.
    pub key: LogicalKey,
    /// The referenced version.
    pub number: VersionNumber,
    /// Whether the active pointer referenced this version when the operation
    /// committed.
    pub active: bool,
}

// ============================================================================
// Typed Values
// ============================================================================

/// Interpretation of stored configuration values.
///
/// Values are opaque bytes in the store; callers holding flags or counters can
/// read them back with their natural type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// Exactly `true` or `false`.
    Bool(bool),
    /// A decimal integer that fits in `i64`.
    Int(i64),
    /// Any other UTF-8 text.
    Text(String),
    /// Bytes that are not valid UTF-8.
    Bytes(Vec<u8>),
}

impl TypedValue {
    /// Classifies raw value bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Self::Bytes(bytes.to_vec());
        };
        match text {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => match text.parse::<i64>() {
                Ok(n) => Self::Int(n),
                Err(_) => Self::Text(text.to_string()),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_key_validates_components() {
        let key = LogicalKey::new("crypto", "BUY_VALUE").unwrap();
        assert_eq!(key.service(), "crypto");
        assert_eq!(key.key_name(), "BUY_VALUE");
        assert_eq!(key.to_string(), "crypto/BUY_VALUE");

        assert!(LogicalKey::new("", "BUY_VALUE").is_err());
        assert!(LogicalKey::new("crypto", "").is_err());
        assert!(LogicalKey::new("crypto/general", "BUY_VALUE").is_err());
    }

    #[test]
    fn test_version_number_zero_rejected() {
        assert!(VersionNumber::new(0).is_none());
        assert_eq!(VersionNumber::new(1), Some(VersionNumber::FIRST));
    }

    #[test]
    fn test_version_number_parse_canonical_only() {
        assert_eq!(VersionNumber::parse("1").map(VersionNumber::value), Some(1));
        assert_eq!(VersionNumber::parse("42").map(VersionNumber::value), Some(42));
        assert!(VersionNumber::parse("").is_none());
        assert!(VersionNumber::parse("0").is_none());
        assert!(VersionNumber::parse("007").is_none());
        assert!(VersionNumber::parse("+3").is_none());
        assert!(VersionNumber::parse("-3").is_none());
        assert!(VersionNumber::parse("3a").is_none());
        assert!(VersionNumber::parse("99999999999999999999999").is_none());
    }

    #[test]
    fn test_version_number_next() {
        assert_eq!(VersionNumber::FIRST.next().map(VersionNumber::value), Some(2));
        assert!(VersionNumber::new(u64::MAX).unwrap().next().is_none());
    }

    #[test]
    fn test_version_numbers_order_numerically() {
        let nine = VersionNumber::new(9).unwrap();
        let ten = VersionNumber::new(10).unwrap();
        assert!(nine < ten);
        assert!("v9" > "v10", "lexicographic path order differs from numeric order");
    }

    #[test]
    fn test_typed_value_classification() {
        assert_eq!(TypedValue::from_bytes(b"true"), TypedValue::Bool(true));
        assert_eq!(TypedValue::from_bytes(b"false"), TypedValue::Bool(false));
        assert_eq!(TypedValue::from_bytes(b"100"), TypedValue::Int(100));
        assert_eq!(TypedValue::from_bytes(b"-5"), TypedValue::Int(-5));
        assert_eq!(TypedValue::from_bytes(b"TRUE"), TypedValue::Text("TRUE".to_string()));
        assert_eq!(TypedValue::from_bytes(b"1.5"), TypedValue::Text("1.5".to_string()));
        assert_eq!(TypedValue::from_bytes(b""), TypedValue::Text(String::new()));
        assert_eq!(TypedValue::from_bytes(&[0xFF, 0xFE]), TypedValue::Bytes(vec![0xFF, 0xFE]));
    }

    #[test]
    fn test_version_accessors() {
        let version = Version {
            key: LogicalKey::new("crypto", "SELL_VALUE").unwrap(),
            number: VersionNumber::FIRST,
            value: b"250".to_vec(),
            created_at: Utc::now(),
        };
        assert_eq!(version.value_str(), Some("250"));
        assert_eq!(version.typed_value(), TypedValue::Int(250));
    }
}
