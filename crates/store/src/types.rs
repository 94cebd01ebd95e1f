//! Entries, write operations and conditions exchanged with a store.

/// A stored key-value pair with its revision metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    /// Full store key.
    pub key: String,
    /// Opaque value bytes.
    pub value: Vec<u8>,
    /// Store revision of the commit that created the key.
    pub create_revision: u64,
    /// Store revision of the commit that last wrote the key.
    pub mod_revision: u64,
}

/// Conditional write predicates for compare-and-swap operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetCondition {
    /// Key must not exist.
    MustNotExist,
    /// Key must exist.
    MustExist,
    /// Key value must equal the specified bytes.
    ValueEquals(Vec<u8>),
    /// Key must have been last written at the specified revision.
    RevisionEquals(u64),
}

impl SetCondition {
    /// Evaluates the condition against the current entry for the key.
    #[must_use]
    pub fn is_met(&self, current: Option<&KvEntry>) -> bool {
        match self {
            Self::MustNotExist => current.is_none(),
            Self::MustExist => current.is_some(),
            Self::ValueEquals(expected) => current.is_some_and(|e| e.value == *expected),
            Self::RevisionEquals(revision) => current.is_some_and(|e| e.mod_revision == *revision),
        }
    }
}

/// One write inside an atomic transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOp {
    /// Full store key.
    pub key: String,
    /// Value to store.
    pub value: Vec<u8>,
    /// Optional precondition on the key's current state.
    pub condition: Option<SetCondition>,
}

impl WriteOp {
    /// Creates an unconditional write.
    #[must_use]
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), value: value.into(), condition: None }
    }

    /// Creates a write that only applies if the key does not exist.
    #[must_use]
    pub fn put_if_absent(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::put(key, value).with_condition(SetCondition::MustNotExist)
    }

    /// Creates a write that only applies if the key currently holds `expected`.
    #[must_use]
    pub fn put_if_matches(
        key: impl Into<String>,
        expected: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self::put(key, value).with_condition(SetCondition::ValueEquals(expected.into()))
    }

    /// Attaches a precondition.
    #[must_use]
    pub fn with_condition(mut self, condition: SetCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Result of a transaction whose writes may carry conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOutcome {
    /// Every write was applied at this store revision.
    Committed {
        /// Revision assigned to the commit.
        revision: u64,
    },
    /// A condition did not hold; nothing was written.
    ConditionFailed {
        /// First key, in operation order, whose condition failed.
        key: String,
    },
}

impl TxnOutcome {
    /// Returns true if the transaction was applied.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}
