//! Store key-path layout.
//!
//! ```text
//! {service}/version/{key_name}/v{n}    immutable version record
//! {service}/used/{key_name}            active pointer, value = decimal n
//! ```
//!
//! Version numbers are rendered without leading zeros, so a prefix scan in
//! key order returns `v10` before `v9`. Callers that need history order sort
//! by the parsed [`VersionNumber`].

use snafu::Snafu;

use crate::types::{LogicalKey, VersionNumber};

/// Path segment for immutable version records.
pub const VERSION_SEGMENT: &str = "version";

/// Path segment for active pointers.
pub const USED_SEGMENT: &str = "used";

/// Prefix character of the version-number segment.
const VERSION_TAG: char = 'v';

/// Error raised when a stored path or pointer does not follow the layout.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum KeyPathError {
    /// The path does not have the expected segments.
    #[snafu(display("Malformed key path '{path}': {reason}"))]
    MalformedPath {
        /// The offending path.
        path: String,
        /// What was wrong.
        reason: String,
    },

    /// A version number segment or pointer value is not canonical decimal.
    #[snafu(display("Invalid version number '{input}'"))]
    InvalidVersionNumber {
        /// The text that failed to parse.
        input: String,
    },
}

/// Returns the path of one version record.
#[must_use]
pub fn version_path(key: &LogicalKey, number: VersionNumber) -> String {
    format!("{}{VERSION_TAG}{number}", version_prefix(key))
}

/// Returns the scan prefix covering every version of `key`.
///
/// The trailing separator keeps `BUY_VALUE` from matching `BUY_VALUE_2`.
#[must_use]
pub fn version_prefix(key: &LogicalKey) -> String {
    format!("{}/{VERSION_SEGMENT}/{}/", key.service(), key.key_name())
}

/// Returns the path of the active pointer for `key`.
#[must_use]
pub fn pointer_path(key: &LogicalKey) -> String {
    format!("{}{}", pointer_prefix(key.service()), key.key_name())
}

/// Returns the scan prefix covering every active pointer of a service.
#[must_use]
pub fn pointer_prefix(service: &str) -> String {
    format!("{service}/{USED_SEGMENT}/")
}

/// Parses a version path back into its logical key and version number.
///
/// # Errors
///
/// Returns [`KeyPathError`] if the path does not match
/// `{service}/version/{key_name}/v{n}` with valid names and a canonical number.
pub fn parse_version_path(path: &str) -> Result<(LogicalKey, VersionNumber), KeyPathError> {
    let segments: Vec<&str> = path.split('/').collect();
    let [service, segment, key_name, tagged] = segments.as_slice() else {
        return MalformedPathSnafu { path, reason: "expected 4 segments" }.fail();
    };
    if *segment != VERSION_SEGMENT {
        return MalformedPathSnafu { path, reason: format!("expected '{VERSION_SEGMENT}' segment") }
            .fail();
    }
    let Some(digits) = tagged.strip_prefix(VERSION_TAG) else {
        return MalformedPathSnafu { path, reason: "version segment must start with 'v'" }.fail();
    };
    let number =
        VersionNumber::parse(digits).ok_or_else(|| InvalidVersionNumberSnafu { input: digits }.build())?;
    let key = LogicalKey::new(*service, *key_name)
        .map_err(|e| MalformedPathSnafu { path, reason: e.to_string() }.build())?;
    Ok((key, number))
}

/// Extracts the key name from an active pointer path under `service`.
///
/// # Errors
///
/// Returns [`KeyPathError::MalformedPath`] if the path is not
/// `{service}/used/{key_name}` with a valid key name.
pub fn parse_pointer_path(service: &str, path: &str) -> Result<LogicalKey, KeyPathError> {
    let prefix = pointer_prefix(service);
    let Some(key_name) = path.strip_prefix(&prefix) else {
        return MalformedPathSnafu { path, reason: format!("expected prefix '{prefix}'") }.fail();
    };
    LogicalKey::new(service, key_name)
        .map_err(|e| MalformedPathSnafu { path, reason: e.to_string() }.build())
}

/// Encodes the value stored under an active pointer.
#[must_use]
pub fn encode_pointer(number: VersionNumber) -> Vec<u8> {
    number.to_string().into_bytes()
}

/// Decodes the value stored under an active pointer.
///
/// # Errors
///
/// Returns [`KeyPathError::InvalidVersionNumber`] if the bytes are not a
/// canonical decimal version number.
pub fn decode_pointer(bytes: &[u8]) -> Result<VersionNumber, KeyPathError> {
    let text = String::from_utf8_lossy(bytes);
    VersionNumber::parse(&text).ok_or_else(|| InvalidVersionNumberSnafu { input: text }.build())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn buy_value() -> LogicalKey {
        LogicalKey::new("crypto", "BUY_VALUE").unwrap()
    }

    #[test]
    fn test_version_path_layout() {
        let path = version_path(&buy_value(), VersionNumber::new(12).unwrap());
        assert_eq!(path, "crypto/version/BUY_VALUE/v12");
    }

    #[test]
    fn test_pointer_path_layout() {
        assert_eq!(pointer_path(&buy_value()), "crypto/used/BUY_VALUE");
        assert_eq!(pointer_prefix("crypto"), "crypto/used/");
    }

    #[test]
    fn test_version_prefix_is_separator_terminated() {
        let prefix = version_prefix(&buy_value());
        assert_eq!(prefix, "crypto/version/BUY_VALUE/");
        let sibling = LogicalKey::new("crypto", "BUY_VALUE_2").unwrap();
        assert!(!version_path(&sibling, VersionNumber::FIRST).starts_with(&prefix));
    }

    #[test]
    fn test_parse_version_path() {
        let (key, number) = parse_version_path("crypto/version/BUY_VALUE/v3").unwrap();
        assert_eq!(key, buy_value());
        assert_eq!(number.value(), 3);
    }

    #[test]
    fn test_parse_version_path_rejects_bad_layouts() {
        assert!(matches!(
            parse_version_path("crypto/version/BUY_VALUE"),
            Err(KeyPathError::MalformedPath { .. })
        ));
        assert!(matches!(
            parse_version_path("crypto/used/BUY_VALUE/v1"),
            Err(KeyPathError::MalformedPath { .. })
        ));
        assert!(matches!(
            parse_version_path("crypto/version/BUY_VALUE/3"),
            Err(KeyPathError::MalformedPath { .. })
        ));
        assert!(matches!(
            parse_version_path("crypto/version/BUY_VALUE/v03"),
            Err(KeyPathError::InvalidVersionNumber { .. })
        ));
        assert!(matches!(
            parse_version_path("crypto/version/BUY_VALUE/v0"),
            Err(KeyPathError::InvalidVersionNumber { .. })
        ));
        assert!(matches!(
            parse_version_path("/version/BUY_VALUE/v1"),
            Err(KeyPathError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_parse_pointer_path() {
        let key = parse_pointer_path("crypto", "crypto/used/SELL_VALUE").unwrap();
        assert_eq!(key.key_name(), "SELL_VALUE");
        assert!(parse_pointer_path("crypto", "general/used/SELL_VALUE").is_err());
        assert!(parse_pointer_path("crypto", "crypto/used/").is_err());
    }

    #[test]
    fn test_pointer_value_encoding() {
        let number = VersionNumber::new(27).unwrap();
        assert_eq!(encode_pointer(number), b"27".to_vec());
        assert_eq!(decode_pointer(b"27").unwrap(), number);
        assert!(decode_pointer(b"crypto/version/BUY_VALUE/v1").is_err());
        assert!(decode_pointer(b"").is_err());
        assert!(decode_pointer(&[0xFF]).is_err());
    }
}
