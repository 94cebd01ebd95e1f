//! Raw store fixtures.
//!
//! Registry operations can only produce well-formed state. These helpers
//! write records and pointers directly into an [`InMemoryStore`] so tests can
//! set up histories the registry would never create: gaps, dangling
//! pointers, orphaned versions.

use chrono::{DateTime, TimeZone, Utc};
use keyver_store::InMemoryStore;
use keyver_types::{LogicalKey, VersionNumber, VersionRecord, encode, keys};

/// Timestamp stamped on fixture records (2024-01-01T00:00:00Z).
#[must_use]
pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default()
}

/// Builds a logical key, panicking on invalid names.
#[must_use]
pub fn logical_key(service: &str, key_name: &str) -> LogicalKey {
    LogicalKey::new(service, key_name).expect("fixture key names are valid")
}

/// Builds a version number, panicking on zero.
#[must_use]
pub fn version(number: u64) -> VersionNumber {
    VersionNumber::new(number).expect("fixture version numbers are >= 1")
}

/// Writes a version record directly, bypassing the registry.
pub fn write_version(store: &InMemoryStore, key: &LogicalKey, number: u64, value: &[u8]) {
    let record = VersionRecord { value: value.to_vec(), created_at: fixture_timestamp() };
    let bytes = encode(&record).expect("version records always encode");
    store.set(keys::version_path(key, version(number)), bytes);
}

/// Writes an active pointer directly, bypassing the registry.
pub fn write_pointer(store: &InMemoryStore, key: &LogicalKey, number: u64) {
    store.set(keys::pointer_path(key), keys::encode_pointer(version(number)));
}

/// Writes versions `1..=count` with values `"1"`, `"2"`, ... and points the
/// key at `active`.
pub fn seed_history(store: &InMemoryStore, key: &LogicalKey, count: u64, active: u64) {
    for number in 1..=count {
        write_version(store, key, number, number.to_string().as_bytes());
    }
    write_pointer(store, key, active);
}
