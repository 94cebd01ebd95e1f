//! Input validation for service and key names.
//!
//! Names become segments of store key paths (`{service}/version/{key}/v{n}`),
//! so they are restricted to a whitelist that can never contain the `/`
//! separator.
//!
//! ## Character Whitelist
//!
//! - Service and key names: `[a-zA-Z0-9:_.-]`, 1 to [`MAX_NAME_BYTES`] bytes.

use std::fmt;

/// Maximum length of a service or key name in UTF-8 bytes.
pub const MAX_NAME_BYTES: usize = 128;

/// Validation error with structured context.
///
/// Contains the specific constraint that was violated and the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

/// Validates a service namespace.
///
/// # Errors
///
/// Returns [`ValidationError`] if the name is empty, exceeds [`MAX_NAME_BYTES`],
/// or contains characters outside `[a-zA-Z0-9:_.-]`.
pub fn validate_service(service: &str) -> Result<(), ValidationError> {
    validate_name("service", service)
}

/// Validates a key name within a service.
///
/// # Errors
///
/// Returns [`ValidationError`] if the name is empty, exceeds [`MAX_NAME_BYTES`],
/// or contains characters outside `[a-zA-Z0-9:_.-]`.
pub fn validate_key_name(key_name: &str) -> Result<(), ValidationError> {
    validate_name("key_name", key_name)
}

fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: "must not be empty".to_string(),
        });
    }
    if value.len() > MAX_NAME_BYTES {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: format!(
                "length {} bytes exceeds maximum {} bytes",
                value.len(),
                MAX_NAME_BYTES
            ),
        });
    }
    if let Some(pos) = value.find(|c: char| !is_name_char(c)) {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: format!(
                "contains invalid character {:?} at byte offset {}; allowed: [a-zA-Z0-9:_.-]",
                value[pos..].chars().next().unwrap_or('\0'),
                pos
            ),
        });
    }
    Ok(())
}

/// Checks if a character is allowed in service and key names.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '-')
}
