//! The versioned-key registry.
//!
//! [`VersionedKeyRegistry`] stores every value ever published for a logical
//! key as an immutable numbered version and keeps one active pointer per key.
//! Two key families are written to the store:
//!
//! ```text
//! {service}/version/{key_name}/v{n}   postcard VersionRecord
//! {service}/used/{key_name}           decimal active version number
//! ```
//!
//! All writes are conditional. Initialization writes `v1` and the pointer in
//! one transaction guarded by "must not exist"; publishing writes `v{n+1}`
//! guarded by "must not exist" and, when activating, moves the pointer in the
//! same transaction guarded by the pointer's last-modified revision. A lost
//! condition means another writer got there first: the registry re-reads and
//! tries again, up to [`RegistryConfig::max_conflict_retries`] times.

use std::{fmt, future::Future, sync::Arc};

use chrono::Utc;
use keyver_store::{KvEntry, KvStore, SetCondition, StoreError, TxnOutcome, WriteOp};
use keyver_types::{
    LogicalKey, Version, VersionNumber, VersionRecord, VersionRef, encode, keys,
    validation::validate_service,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RegistryConfig,
    error::{OpContext, RegistryError, Result},
    retry::{CancelScope, with_retry_cancellable},
};

/// Registry of versioned configuration values backed by a [`KvStore`].
///
/// The registry is cheap to clone; clones share the store, the configuration
/// and the shutdown state. It holds no cached state, so any number of
/// registries in any number of processes may operate on the same store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use keyver_registry::{RegistryConfig, VersionedKeyRegistry};
/// use keyver_store::InMemoryStore;
///
/// # #[tokio::main]
/// # async fn main() -> keyver_registry::Result<()> {
/// let registry =
///     VersionedKeyRegistry::new(Arc::new(InMemoryStore::new()), RegistryConfig::default());
///
/// registry.create_or_register("crypto", "BUY_VALUE", "100").await?;
/// registry.publish_new_version("crypto", "BUY_VALUE", "101", true).await?;
///
/// let active = registry.get_active_value("crypto", "BUY_VALUE").await?;
/// assert_eq!(active.value_str(), Some("101"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VersionedKeyRegistry {
    store: Arc<dyn KvStore>,
    config: Arc<RegistryConfig>,
    cancellation: CancellationToken,
}

impl fmt::Debug for VersionedKeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedKeyRegistry")
            .field("config", &self.config)
            .field("shutdown", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl VersionedKeyRegistry {
    /// Creates a registry over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: RegistryConfig) -> Self {
        Self { store, config: Arc::new(config), cancellation: CancellationToken::new() }
    }

    /// Returns the registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Returns the registry's root cancellation token.
    ///
    /// Cancelling it has the same effect as [`shutdown`](Self::shutdown).
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Shuts the registry down.
    ///
    /// In-flight operations stop at their next store request or backoff
    /// sleep and return [`RegistryError::Shutdown`]; new operations fail
    /// immediately. Conditional writes are atomic, so an operation stopped
    /// mid-way never leaves a partial write behind. Shutdown is shared by
    /// every clone of this registry.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
        tracing::debug!("registry shut down");
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Ensures a logical key exists, creating it at version 1 if needed.
    ///
    /// If the key already has an active pointer, returns a reference to the
    /// currently active version and writes nothing; `initial_value` is
    /// ignored. Otherwise writes version 1 with `initial_value` and points
    /// the key at it, both in a single conditional transaction. Concurrent
    /// callers racing on an unknown key all observe the same version 1.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidArgument`] for malformed names
    /// - [`RegistryError::CorruptState`] if versions exist without a pointer
    ///   or the pointer names a missing version
    /// - [`RegistryError::Conflict`] if the transaction keeps losing races
    /// - [`RegistryError::StoreUnavailable`], [`RegistryError::Cancelled`],
    ///   [`RegistryError::Shutdown`]
    pub async fn create_or_register(
        &self,
        service: &str,
        key_name: &str,
        initial_value: impl Into<Vec<u8>>,
    ) -> Result<VersionRef> {
        self.create_or_register_inner(service, key_name, initial_value.into(), None).await
    }

    /// Like [`create_or_register`](Self::create_or_register), but also stops
    /// when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`create_or_register`](Self::create_or_register), plus
    /// [`RegistryError::Cancelled`] when `token` fires.
    pub async fn create_or_register_with_token(
        &self,
        service: &str,
        key_name: &str,
        initial_value: impl Into<Vec<u8>>,
        token: CancellationToken,
    ) -> Result<VersionRef> {
        self.create_or_register_inner(service, key_name, initial_value.into(), Some(&token)).await
    }

    async fn create_or_register_inner(
        &self,
        service: &str,
        key_name: &str,
        initial_value: Vec<u8>,
        token: Option<&CancellationToken>,
    ) -> Result<VersionRef> {
        let call = self.begin(OpContext::key("create_or_register", service, key_name), token)?;
        let key = call.logical_key(service, key_name)?;
        let pointer_key = keys::pointer_path(&key);
        let version_key = keys::version_path(&key, VersionNumber::FIRST);
        let ops = [
            WriteOp::put_if_absent(version_key.as_str(), call.encode_record(initial_value)?),
            WriteOp::put_if_absent(
                pointer_key.as_str(),
                keys::encode_pointer(VersionNumber::FIRST),
            ),
        ];

        let mut conflicts = 0;
        loop {
            if let Some(pointer) = call.get(&pointer_key).await? {
                let number = call.decode_pointer(&pointer)?;
                call.require_version(&key, number).await?;
                return Ok(VersionRef { key, number, active: true });
            }

            match call.commit(&ops).await? {
                TxnOutcome::Committed { revision } => {
                    tracing::debug!(key = %key, revision, "registered logical key at v1");
                    return Ok(VersionRef { key, number: VersionNumber::FIRST, active: true });
                },
                TxnOutcome::ConditionFailed { key: failed } => {
                    // v1 and the pointer are only ever written together.
                    if failed == version_key && call.get(&pointer_key).await?.is_none() {
                        return Err(call.corrupt("version records exist without an active pointer"));
                    }
                    call.record_conflict(&mut conflicts, &failed)?;
                },
            }
        }
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publishes `value` as the next version of an existing logical key.
    ///
    /// The new version number is one past the highest existing version. When
    /// `activate` is true the active pointer moves to the new version in the
    /// same transaction; otherwise the pointer is left alone and the version
    /// is staged for a later [`activate_version`](Self::activate_version).
    ///
    /// Concurrent publishers never produce duplicate or skipped version
    /// numbers, and an activating publisher never overwrites an activation
    /// it did not observe.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the key has no versions
    /// - [`RegistryError::CorruptState`] for a gap in the version sequence, a
    ///   missing pointer or a pointer naming a missing version
    /// - [`RegistryError::Conflict`] if concurrent publishers keep winning
    /// - [`RegistryError::InvalidArgument`], [`RegistryError::StoreUnavailable`],
    ///   [`RegistryError::Cancelled`], [`RegistryError::Shutdown`]
    pub async fn publish_new_version(
        &self,
        service: &str,
        key_name: &str,
        value: impl Into<Vec<u8>>,
        activate: bool,
    ) -> Result<VersionRef> {
        self.publish_new_version_inner(service, key_name, value.into(), activate, None).await
    }

    /// Like [`publish_new_version`](Self::publish_new_version), but also
    /// stops when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`publish_new_version`](Self::publish_new_version), plus
    /// [`RegistryError::Cancelled`] when `token` fires.
    pub async fn publish_new_version_with_token(
        &self,
        service: &str,
        key_name: &str,
        value: impl Into<Vec<u8>>,
        activate: bool,
        token: CancellationToken,
    ) -> Result<VersionRef> {
        self.publish_new_version_inner(service, key_name, value.into(), activate, Some(&token))
            .await
    }

    async fn publish_new_version_inner(
        &self,
        service: &str,
        key_name: &str,
        value: Vec<u8>,
        activate: bool,
        token: Option<&CancellationToken>,
    ) -> Result<VersionRef> {
        let call = self.begin(OpContext::key("publish_new_version", service, key_name), token)?;
        let key = call.logical_key(service, key_name)?;
        let pointer_key = keys::pointer_path(&key);
        // Encoded once so a retried attempt can recognize its own write.
        let record = call.encode_record(value)?;

        let mut conflicts = 0;
        loop {
            // The pointer is read before the scan. Versions are never removed,
            // so a pointer observed first can never name a version the scan
            // misses, even if another writer publishes in between.
            let pointer = if activate { call.get(&pointer_key).await? } else { None };
            let versions = call.scan_versions(&key).await?;
            call.check_contiguous(&versions)?;
            let Some(latest) = versions.last().map(|(number, _)| *number) else {
                return Err(call.not_found("key has no versions; register it first"));
            };
            let next = latest.next().ok_or_else(|| call.corrupt("version numbers exhausted"))?;
            let version_key = keys::version_path(&key, next);

            let mut ops = vec![WriteOp::put_if_absent(version_key.as_str(), record.clone())];
            if activate {
                let pointer = pointer
                    .ok_or_else(|| call.corrupt("versions exist without an active pointer"))?;
                let current = call.decode_pointer(&pointer)?;
                if current > latest {
                    return Err(call.dangling_pointer(current));
                }
                ops.push(
                    WriteOp::put(pointer_key.as_str(), keys::encode_pointer(next))
                        .with_condition(SetCondition::RevisionEquals(pointer.mod_revision)),
                );
            }

            match call.commit(&ops).await? {
                TxnOutcome::Committed { revision } => {
                    tracing::debug!(key = %key, version = %next, activate, revision, "published version");
                    return Ok(VersionRef { key, number: next, active: activate });
                },
                TxnOutcome::ConditionFailed { key: failed } => {
                    // A timed-out attempt may have committed before its
                    // response was lost. The record carries this call's
                    // timestamp, so identical bytes mean the write is ours.
                    if failed == version_key
                        && call.get(&version_key).await?.is_some_and(|entry| entry.value == record)
                    {
                        return Ok(VersionRef { key, number: next, active: activate });
                    }
                    call.record_conflict(&mut conflicts, &failed)?;
                },
            }
        }
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Points a logical key at an existing version.
    ///
    /// Used to promote a staged version or to roll back to an earlier one.
    /// Activating the version that is already active is a no-op.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidArgument`] for version 0 or malformed names
    /// - [`RegistryError::NotFound`] if the version does not exist
    /// - [`RegistryError::CorruptState`] if the key has versions but no pointer
    /// - [`RegistryError::Conflict`] if concurrent activations keep winning
    /// - [`RegistryError::StoreUnavailable`], [`RegistryError::Cancelled`],
    ///   [`RegistryError::Shutdown`]
    pub async fn activate_version(
        &self,
        service: &str,
        key_name: &str,
        version: u64,
    ) -> Result<VersionRef> {
        self.activate_version_inner(service, key_name, version, None).await
    }

    /// Like [`activate_version`](Self::activate_version), but also stops when
    /// `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`activate_version`](Self::activate_version), plus
    /// [`RegistryError::Cancelled`] when `token` fires.
    pub async fn activate_version_with_token(
        &self,
        service: &str,
        key_name: &str,
        version: u64,
        token: CancellationToken,
    ) -> Result<VersionRef> {
        self.activate_version_inner(service, key_name, version, Some(&token)).await
    }

    async fn activate_version_inner(
        &self,
        service: &str,
        key_name: &str,
        version: u64,
        token: Option<&CancellationToken>,
    ) -> Result<VersionRef> {
        let call = self.begin(OpContext::key("activate_version", service, key_name), token)?;
        let key = call.logical_key(service, key_name)?;
        let number = call.version_number(version)?;
        let pointer_key = keys::pointer_path(&key);
        let version_key = keys::version_path(&key, number);

        let mut conflicts = 0;
        loop {
            if call.get(&version_key).await?.is_none() {
                return Err(call.not_found(format!("version v{number} does not exist")));
            }
            let pointer = call
                .get(&pointer_key)
                .await?
                .ok_or_else(|| call.corrupt("versions exist without an active pointer"))?;
            if call.decode_pointer(&pointer)? == number {
                return Ok(VersionRef { key, number, active: true });
            }

            let ops = [WriteOp::put(pointer_key.as_str(), keys::encode_pointer(number))
                .with_condition(SetCondition::RevisionEquals(pointer.mod_revision))];
            match call.commit(&ops).await? {
                TxnOutcome::Committed { revision } => {
                    tracing::debug!(key = %key, version = %number, revision, "activated version");
                    return Ok(VersionRef { key, number, active: true });
                },
                TxnOutcome::ConditionFailed { key: failed } => {
                    call.record_conflict(&mut conflicts, &failed)?;
                },
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the version the active pointer currently names.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the key has no active pointer
    /// - [`RegistryError::CorruptState`] if the pointer names a missing
    ///   version or a record cannot be decoded
    /// - [`RegistryError::InvalidArgument`], [`RegistryError::StoreUnavailable`],
    ///   [`RegistryError::Cancelled`], [`RegistryError::Shutdown`]
    pub async fn get_active_value(&self, service: &str, key_name: &str) -> Result<Version> {
        self.get_active_value_inner(service, key_name, None).await
    }

    /// Like [`get_active_value`](Self::get_active_value), but also stops when
    /// `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`get_active_value`](Self::get_active_value), plus
    /// [`RegistryError::Cancelled`] when `token` fires.
    pub async fn get_active_value_with_token(
        &self,
        service: &str,
        key_name: &str,
        token: CancellationToken,
    ) -> Result<Version> {
        self.get_active_value_inner(service, key_name, Some(&token)).await
    }

    async fn get_active_value_inner(
        &self,
        service: &str,
        key_name: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Version> {
        let call = self.begin(OpContext::key("get_active_value", service, key_name), token)?;
        let key = call.logical_key(service, key_name)?;

        let pointer = call
            .get(&keys::pointer_path(&key))
            .await?
            .ok_or_else(|| call.not_found("no active version"))?;
        let number = call.decode_pointer(&pointer)?;
        let entry = call.require_version(&key, number).await?;
        call.decode_version(&key, number, &entry)
    }

    /// Returns every version of a logical key, ordered by version number.
    ///
    /// Ordering is numeric: `v10` follows `v9`. An unknown key yields an
    /// empty list. The list is a snapshot; versions published concurrently
    /// may or may not appear.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::CorruptState`] if a stored path or record is malformed
    /// - [`RegistryError::InvalidArgument`], [`RegistryError::StoreUnavailable`],
    ///   [`RegistryError::Cancelled`], [`RegistryError::Shutdown`]
    pub async fn list_versions(&self, service: &str, key_name: &str) -> Result<Vec<Version>> {
        self.list_versions_inner(service, key_name, None).await
    }

    /// Like [`list_versions`](Self::list_versions), but also stops when
    /// `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`list_versions`](Self::list_versions), plus
    /// [`RegistryError::Cancelled`] when `token` fires.
    pub async fn list_versions_with_token(
        &self,
        service: &str,
        key_name: &str,
        token: CancellationToken,
    ) -> Result<Vec<Version>> {
        self.list_versions_inner(service, key_name, Some(&token)).await
    }

    async fn list_versions_inner(
        &self,
        service: &str,
        key_name: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Vec<Version>> {
        let call = self.begin(OpContext::key("list_versions", service, key_name), token)?;
        let key = call.logical_key(service, key_name)?;

        call.scan_versions(&key)
            .await?
            .iter()
            .map(|(number, entry)| call.decode_version(&key, *number, entry))
            .collect()
    }

    /// Returns one specific version of a logical key.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidArgument`] for version 0 or malformed names
    /// - [`RegistryError::NotFound`] if the version does not exist
    /// - [`RegistryError::CorruptState`] if the record cannot be decoded
    /// - [`RegistryError::StoreUnavailable`], [`RegistryError::Cancelled`],
    ///   [`RegistryError::Shutdown`]
    pub async fn get_version(&self, service: &str, key_name: &str, version: u64) -> Result<Version> {
        self.get_version_inner(service, key_name, version, None).await
    }

    /// Like [`get_version`](Self::get_version), but also stops when `token`
    /// is cancelled.
    ///
    /// # Errors
    ///
    /// As [`get_version`](Self::get_version), plus
    /// [`RegistryError::Cancelled`] when `token` fires.
    pub async fn get_version_with_token(
        &self,
        service: &str,
        key_name: &str,
        version: u64,
        token: CancellationToken,
    ) -> Result<Version> {
        self.get_version_inner(service, key_name, version, Some(&token)).await
    }

    async fn get_version_inner(
        &self,
        service: &str,
        key_name: &str,
        version: u64,
        token: Option<&CancellationToken>,
    ) -> Result<Version> {
        let call = self.begin(OpContext::key("get_version", service, key_name), token)?;
        let key = call.logical_key(service, key_name)?;
        let number = call.version_number(version)?;

        let entry = call
            .get(&keys::version_path(&key, number))
            .await?
            .ok_or_else(|| call.not_found(format!("version v{number} does not exist")))?;
        call.decode_version(&key, number, &entry)
    }

    /// Returns every registered logical key of a service, sorted by key name.
    ///
    /// A key counts as registered once it has an active pointer.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidArgument`] for a malformed service name
    /// - [`RegistryError::CorruptState`] if a stored pointer path is malformed
    /// - [`RegistryError::StoreUnavailable`], [`RegistryError::Cancelled`],
    ///   [`RegistryError::Shutdown`]
    pub async fn list_keys(&self, service: &str) -> Result<Vec<LogicalKey>> {
        self.list_keys_inner(service, None).await
    }

    /// Like [`list_keys`](Self::list_keys), but also stops when `token` is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// As [`list_keys`](Self::list_keys), plus [`RegistryError::Cancelled`]
    /// when `token` fires.
    pub async fn list_keys_with_token(
        &self,
        service: &str,
        token: CancellationToken,
    ) -> Result<Vec<LogicalKey>> {
        self.list_keys_inner(service, Some(&token)).await
    }

    async fn list_keys_inner(
        &self,
        service: &str,
        token: Option<&CancellationToken>,
    ) -> Result<Vec<LogicalKey>> {
        let call = self.begin(OpContext::service("list_keys", service), token)?;
        validate_service(service).map_err(|e| call.invalid_argument(e.field, e.constraint))?;

        call.get_prefix(&keys::pointer_prefix(service))
            .await?
            .iter()
            .map(|entry| {
                keys::parse_pointer_path(service, &entry.key)
                    .map_err(|e| call.corrupt(e.to_string()))
            })
            .collect()
    }

    /// Starts an operation, failing fast if the registry is shut down or the
    /// request token already fired.
    fn begin<'a>(
        &'a self,
        op: OpContext,
        token: Option<&'a CancellationToken>,
    ) -> Result<Call<'a>> {
        let scope = CancelScope::new(&self.cancellation, token);
        if scope.is_cancelled() {
            return Err(scope.error(&op));
        }
        Ok(Call { store: self.store.as_ref(), config: &self.config, scope, op })
    }
}

/// State of one registry operation: the store, its cancellation scope and
/// the context attached to every error it raises.
struct Call<'a> {
    store: &'a dyn KvStore,
    config: &'a RegistryConfig,
    scope: CancelScope<'a>,
    op: OpContext,
}

impl Call<'_> {
    /// Sends one store request with per-request timeout, retry and
    /// cancellation.
    async fn request<T, F, Fut>(&self, mut request: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = keyver_store::Result<T>>,
    {
        let timeout = self.config.timeout();
        with_retry_cancellable(self.config.retry_policy(), &self.scope, &self.op, || {
            let fut = request();
            async move {
                match tokio::time::timeout(timeout, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout {
                        duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    }),
                }
            }
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<KvEntry>> {
        self.request(|| self.store.get(key)).await
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        self.request(|| self.store.get_prefix(prefix)).await
    }

    async fn commit(&self, ops: &[WriteOp]) -> Result<TxnOutcome> {
        self.request(|| self.store.commit(ops.to_vec())).await
    }

    /// Reads every version of `key`, sorted by version number.
    async fn scan_versions(&self, key: &LogicalKey) -> Result<Vec<(VersionNumber, KvEntry)>> {
        let mut versions = self
            .get_prefix(&keys::version_prefix(key))
            .await?
            .into_iter()
            .map(|entry| {
                let (_, number) =
                    keys::parse_version_path(&entry.key).map_err(|e| self.corrupt(e.to_string()))?;
                Ok((number, entry))
            })
            .collect::<Result<Vec<_>>>()?;
        versions.sort_by_key(|(number, _)| *number);
        Ok(versions)
    }

    /// Reads the version the active pointer names, which must exist.
    async fn require_version(&self, key: &LogicalKey, number: VersionNumber) -> Result<KvEntry> {
        self.get(&keys::version_path(key, number))
            .await?
            .ok_or_else(|| self.dangling_pointer(number))
    }

    /// Fails unless `versions` is exactly `v1..=vN`.
    fn check_contiguous(&self, versions: &[(VersionNumber, KvEntry)]) -> Result<()> {
        for (expected, (number, _)) in (1u64..).zip(versions) {
            if number.value() != expected {
                return Err(self.corrupt(format!(
                    "gap in version sequence: expected v{expected}, found v{number}"
                )));
            }
        }
        Ok(())
    }

    /// Counts a lost conditional write and fails once the budget is spent.
    fn record_conflict(&self, conflicts: &mut u32, failed_key: &str) -> Result<()> {
        *conflicts += 1;
        tracing::debug!(
            operation = self.op.operation(),
            context = %self.op,
            conflicts = *conflicts,
            failed_key,
            "conditional write lost to a concurrent writer"
        );
        if *conflicts > self.config.max_conflict_retries() {
            return Err(RegistryError::Conflict { op: self.op.clone(), attempts: *conflicts });
        }
        Ok(())
    }

    fn logical_key(&self, service: &str, key_name: &str) -> Result<LogicalKey> {
        LogicalKey::new(service, key_name).map_err(|e| self.invalid_argument(e.field, e.constraint))
    }

    fn version_number(&self, version: u64) -> Result<VersionNumber> {
        VersionNumber::new(version).ok_or_else(|| self.invalid_argument("version", "must be >= 1"))
    }

    fn encode_record(&self, value: Vec<u8>) -> Result<Vec<u8>> {
        encode(&VersionRecord { value, created_at: Utc::now() })
            .map_err(|e| RegistryError::Internal { op: self.op.clone(), message: e.to_string() })
    }

    fn decode_pointer(&self, entry: &KvEntry) -> Result<VersionNumber> {
        keys::decode_pointer(&entry.value)
            .map_err(|e| self.corrupt(format!("active pointer {}: {e}", entry.key)))
    }

    fn decode_version(
        &self,
        key: &LogicalKey,
        number: VersionNumber,
        entry: &KvEntry,
    ) -> Result<Version> {
        let record: VersionRecord = keyver_types::decode(&entry.value)
            .map_err(|e| self.corrupt(format!("undecodable record at {}: {e}", entry.key)))?;
        Ok(Version::from_record(key.clone(), number, record))
    }

    fn not_found(&self, message: impl Into<String>) -> RegistryError {
        RegistryError::NotFound { op: self.op.clone(), message: message.into() }
    }

    fn corrupt(&self, reason: impl Into<String>) -> RegistryError {
        RegistryError::CorruptState { op: self.op.clone(), reason: reason.into() }
    }

    fn dangling_pointer(&self, number: VersionNumber) -> RegistryError {
        self.corrupt(format!("active pointer names missing version v{number}"))
    }

    fn invalid_argument(
        &self,
        field: impl Into<String>,
        constraint: impl Into<String>,
    ) -> RegistryError {
        RegistryError::InvalidArgument {
            op: self.op.clone(),
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}
