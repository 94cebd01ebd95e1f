//! Proptest strategies for Keyver domain types.
//!
//! Reusable generators for property-based testing across crates. Strategies
//! produce well-formed names and values while exploring edge cases through
//! random variation.
//!
//! # Usage
//!
//! ```no_run
//! use keyver_test_utils::strategies;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_property(key in strategies::arb_logical_key()) {
//!         // test invariant with a randomly generated key
//!     }
//! }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use keyver_store::SetCondition;
use keyver_types::{LogicalKey, VersionNumber, VersionRecord};
use proptest::prelude::*;

/// Generates a service name of 1-32 characters matching `[a-z][a-z0-9_-]{0,31}`.
pub fn arb_service() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,31}"
}

/// Generates a key name of 1-64 characters from the full name whitelist.
pub fn arb_key_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.:-]{1,64}"
}

/// Generates a valid [`LogicalKey`].
pub fn arb_logical_key() -> impl Strategy<Value = LogicalKey> {
    (arb_service(), arb_key_name()).prop_filter_map("valid logical key", |(service, key_name)| {
        LogicalKey::new(service, key_name).ok()
    })
}

/// Generates a name that violates the whitelist by containing `/` or a space.
pub fn arb_invalid_name() -> impl Strategy<Value = String> {
    ("[a-z]{0,8}", prop::sample::select(vec!["/", " ", "\n"]), "[a-z]{0,8}")
        .prop_map(|(head, bad, tail)| format!("{head}{bad}{tail}"))
}

/// Generates an arbitrary value of 0-255 random bytes.
pub fn arb_value() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

/// Generates a small value of 0-31 random bytes for compact tests.
pub fn arb_small_value() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..32)
}

/// Generates a version number across the full `u64` range, biased toward
/// small numbers and the digit-count boundaries where lexicographic and
/// numeric order disagree.
pub fn arb_version_number() -> impl Strategy<Value = VersionNumber> {
    prop_oneof![
        4 => 1u64..200,
        1 => prop::sample::select(vec![9u64, 10, 99, 100, 999, 1000, u64::MAX]),
        1 => 1u64..=u64::MAX,
    ]
    .prop_filter_map("non-zero version", VersionNumber::new)
}

/// Generates an arbitrary [`DateTime<Utc>`] between 2020-01-01 and 2030-01-01.
pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..1_893_456_000i64).prop_map(|secs| {
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH))
    })
}

/// Generates an arbitrary [`VersionRecord`].
pub fn arb_version_record() -> impl Strategy<Value = VersionRecord> {
    (arb_value(), arb_timestamp()).prop_map(|(value, created_at)| VersionRecord { value, created_at })
}

/// Generates an arbitrary [`SetCondition`]: `MustNotExist`, `MustExist`,
/// `ValueEquals(0-32 bytes)`, or `RevisionEquals(0..1M)`.
pub fn arb_set_condition() -> impl Strategy<Value = SetCondition> {
    prop_oneof![
        Just(SetCondition::MustNotExist),
        Just(SetCondition::MustExist),
        arb_small_value().prop_map(SetCondition::ValueEquals),
        (0u64..1_000_000).prop_map(SetCondition::RevisionEquals),
    ]
}
