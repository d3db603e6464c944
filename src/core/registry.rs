//! Thread-safe transaction registry
//!
//! This module provides the `TransactionRegistry` struct, which maps caller
//! supplied transaction ids to their records and enforces the creation and
//! transition rules of the API.
//!
//! # Design
//!
//! Records live in a `DashMap`, whose internal sharding gives per-id mutual
//! exclusion without a global lock. Operations that must see or change the
//! registry as a whole (`list`, `clear`) additionally take the write side of a
//! registry-wide gate; every per-id operation takes the read side. Per-id
//! operations therefore never block each other, while a flush can never
//! interleave with a half-finished create.
//!
//! # Rules
//!
//! - At most one record per id. A second create for an existing id is rejected
//!   with `Conflict`, whatever its payload.
//! - `create` is a single test-and-set on the map entry, so two concurrent
//!   creates for the same id cannot both succeed.
//! - Records are only ever inserted by `create`. Advancing a missing record
//!   fails instead of recreating it.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;

use crate::types::{
    validate_transaction_id, Amount, AuthorizationOutcome, Epoch, GatewayError, TransactionId,
    TransactionRecord, TransactionType,
};

/// Configuration for the registry
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Maximum number of transactions allowed in progress at once
    ///
    /// `None` means unlimited. A payment terminal can only drive one card
    /// interaction at a time and sets this to 1.
    pub max_in_progress: Option<usize>,
}

/// Thread-safe transaction registry
#[derive(Debug)]
pub struct TransactionRegistry {
    /// Records by transaction id
    records: DashMap<TransactionId, TransactionRecord>,

    /// Registry-wide gate: read side for per-id operations, write side for
    /// whole-registry operations
    gate: RwLock<()>,

    /// Last epoch handed out
    last_epoch: AtomicU64,

    /// Number of records currently in progress
    in_progress: AtomicUsize,

    config: RegistryConfig,
}

impl TransactionRegistry {
    /// Create a new empty registry with no in-progress limit
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new empty registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            records: DashMap::new(),
            gate: RwLock::new(()),
            last_epoch: AtomicU64::new(0),
            in_progress: AtomicUsize::new(0),
            config,
        }
    }

    // The gate guards no data, so a poisoned lock is still safe to use
    fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stall every registry operation until the guard is dropped
    #[cfg(test)]
    pub(crate) fn stall(&self) -> RwLockWriteGuard<'_, ()> {
        self.exclusive()
    }

    /// Create a new in-progress transaction
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionRecord)` - The newly stored record
    /// * `Err(GatewayError::Validation)` - If the id or amount is invalid
    /// * `Err(GatewayError::Conflict)` - If a record already exists for the id
    /// * `Err(GatewayError::Busy)` - If the in-progress limit is reached
    pub fn create(
        &self,
        id: TransactionId,
        tx_type: TransactionType,
        amount: Amount,
    ) -> Result<TransactionRecord, GatewayError> {
        validate_transaction_id(&id)?;
        if amount == 0 {
            return Err(GatewayError::invalid_amount(0));
        }

        let _gate = self.shared();

        // Duplicates are reported as conflicts even when the limit is reached
        if self.records.contains_key(&id) {
            return Err(GatewayError::conflict(&id));
        }
        self.reserve_slot()?;

        let epoch = self.last_epoch.fetch_add(1, Ordering::Relaxed) + 1;
        let candidate = TransactionRecord::new(id.clone(), tx_type, amount, epoch);

        let mut inserted = false;
        let stored = self
            .records
            .entry(id)
            .or_insert_with(|| {
                inserted = true;
                candidate
            })
            .value()
            .clone();

        if inserted {
            Ok(stored)
        } else {
            // Lost the race against a concurrent create for the same id
            self.release_slot();
            Err(GatewayError::conflict(&stored.id))
        }
    }

    fn reserve_slot(&self) -> Result<(), GatewayError> {
        let limit = self.config.max_in_progress;
        self.in_progress
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| match limit {
                Some(max) if current >= max => None,
                _ => Some(current + 1),
            })
            .map(|_| ())
            .map_err(|in_progress| GatewayError::Busy { in_progress })
    }

    fn release_slot(&self) {
        let _ = self
            .in_progress
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            });
    }

    /// Get a snapshot of a transaction
    pub fn get(&self, id: &str) -> Result<TransactionRecord, GatewayError> {
        let _gate = self.shared();
        self.records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GatewayError::not_found(id))
    }

    /// Whether a record exists for the id
    pub fn contains(&self, id: &str) -> bool {
        let _gate = self.shared();
        self.records.contains_key(id)
    }

    /// Whether the record for the id is still the one created with `epoch`
    pub fn holds_epoch(&self, id: &str, epoch: Epoch) -> bool {
        let _gate = self.shared();
        self.records
            .get(id)
            .is_some_and(|entry| entry.value().epoch == epoch)
    }

    /// Apply a terminal outcome to a transaction
    ///
    /// Re-applying the status the record already holds succeeds without
    /// changing anything; trying to change a terminal status fails with
    /// `InvalidTransition`.
    pub fn advance(
        &self,
        id: &str,
        outcome: AuthorizationOutcome,
    ) -> Result<TransactionRecord, GatewayError> {
        self.advance_matching(id, None, outcome)
    }

    /// Apply a terminal outcome only if the record still has the given epoch
    ///
    /// A record recreated under the same id after a flush has a new epoch, so
    /// an outcome meant for its predecessor is reported as `NotFound`.
    pub fn advance_epoch(
        &self,
        id: &str,
        epoch: Epoch,
        outcome: AuthorizationOutcome,
    ) -> Result<TransactionRecord, GatewayError> {
        self.advance_matching(id, Some(epoch), outcome)
    }

    fn advance_matching(
        &self,
        id: &str,
        epoch: Option<Epoch>,
        outcome: AuthorizationOutcome,
    ) -> Result<TransactionRecord, GatewayError> {
        let _gate = self.shared();

        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| GatewayError::not_found(id))?;
        let record = entry.value_mut();
        if epoch.is_some_and(|expected| expected != record.epoch) {
            return Err(GatewayError::not_found(id));
        }

        let was_in_progress = !record.status.is_terminal();
        record.apply(outcome)?;
        if was_in_progress {
            self.release_slot();
        }
        Ok(record.clone())
    }

    /// Snapshot of every record, oldest first
    pub fn list(&self) -> Vec<TransactionRecord> {
        let _gate = self.exclusive();
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.epoch);
        records
    }

    /// Remove every record atomically
    ///
    /// # Returns
    ///
    /// The `(id, epoch)` pair of each removed record, so that work scheduled
    /// for exactly those records can be cancelled.
    pub fn clear(&self) -> Vec<(TransactionId, Epoch)> {
        let _gate = self.exclusive();
        let removed: Vec<(TransactionId, Epoch)> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().epoch))
            .collect();
        self.records.clear();
        self.in_progress.store(0, Ordering::Release);
        removed
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records currently in progress
    pub fn in_progress(&self) -> usize {
        self.in_progress.load(Ordering::Acquire)
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
