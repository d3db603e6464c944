//! Transaction processing orchestration
//!
//! The `GatewayEngine` is the single entry point used by the HTTP layer and
//! the operator console. It wires the registry, the status advancer and the
//! batch controller together.
//!
//! # Architecture
//!
//! ```text
//! GatewayEngine
//!     ├── Arc<TransactionRegistry>  (records, creation and transition rules)
//!     ├── Arc<StatusAdvancer>       (background authorization tasks)
//!     └── BatchController           (list / flush)
//! ```
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and every clone shares the same state, so it
//! can be handed to each connection task.

use std::sync::Arc;

use log::info;

use super::advancer::StatusAdvancer;
use super::batch::{BatchController, FlushSummary};
use super::registry::{RegistryConfig, TransactionRegistry};
use super::traits::Authorizer;
use crate::types::{
    validate_transaction_id, AuthorizationOutcome, CreateTransactionRequest, GatewayError,
    TransactionRecord,
};

/// Orchestrates transaction creation, lookup, advancement and flushing
#[derive(Debug, Clone)]
pub struct GatewayEngine {
    registry: Arc<TransactionRegistry>,
    advancer: Arc<StatusAdvancer>,
    batch: BatchController,
}

impl GatewayEngine {
    /// Create an engine with an empty registry
    ///
    /// # Arguments
    ///
    /// * `config` - Registry configuration (in-progress limit)
    /// * `authorizer` - Source of authorization outcomes for created transactions
    pub fn new(config: RegistryConfig, authorizer: Arc<dyn Authorizer>) -> Self {
        let registry = Arc::new(TransactionRegistry::with_config(config));
        let advancer = Arc::new(StatusAdvancer::new(Arc::clone(&registry), authorizer));
        let batch = BatchController::new(Arc::clone(&registry), Arc::clone(&advancer));
        Self {
            registry,
            advancer,
            batch,
        }
    }

    /// Create a transaction and schedule its authorization
    ///
    /// A duplicate id is reported before the body is validated, so a repeated
    /// create fails with `Conflict` whatever its payload.
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionRecord)` - The new in-progress record
    /// * `Err(GatewayError::Validation)` - If the id or body is invalid
    /// * `Err(GatewayError::Conflict)` - If the id is already in use
    /// * `Err(GatewayError::Busy)` - If the in-progress limit is reached
    pub fn create(
        &self,
        id: &str,
        request: &CreateTransactionRequest,
    ) -> Result<TransactionRecord, GatewayError> {
        self.ensure_absent(id)?;
        let (tx_type, amount) = request.validate()?;
        let record = self.registry.create(id.to_string(), tx_type, amount)?;
        self.advancer.schedule(&record);
        info!(
            "engine: accepted {} {} for {}",
            record.tx_type, record.id, record.requested_amount
        );
        Ok(record)
    }

    /// Create a transaction from a raw JSON body
    ///
    /// Same rules as [`GatewayEngine::create`]; the body is only parsed once
    /// the id is known to be free.
    pub fn submit(&self, id: &str, body: &[u8]) -> Result<TransactionRecord, GatewayError> {
        self.ensure_absent(id)?;
        let request: CreateTransactionRequest = serde_json::from_slice(body)?;
        self.create(id, &request)
    }

    /// Fail with `Conflict` if the id is taken, or `Validation` if it is unusable
    pub fn ensure_absent(&self, id: &str) -> Result<(), GatewayError> {
        validate_transaction_id(id)?;
        if self.registry.contains(id) {
            return Err(GatewayError::conflict(id));
        }
        Ok(())
    }

    /// Current state of a transaction
    pub fn get(&self, id: &str) -> Result<TransactionRecord, GatewayError> {
        self.registry.get(id)
    }

    /// Every transaction in the current batch
    pub fn list(&self) -> Vec<TransactionRecord> {
        self.batch.list()
    }

    /// Clear the batch
    pub fn flush(&self) -> FlushSummary {
        self.batch.flush()
    }

    /// Apply an externally produced outcome to a transaction
    pub fn advance(
        &self,
        id: &str,
        outcome: AuthorizationOutcome,
    ) -> Result<TransactionRecord, GatewayError> {
        let record = self.registry.advance(id, outcome)?;
        info!("engine: transaction {} is now {}", record.id, record.status);
        Ok(record)
    }

    /// Number of background authorizations still running
    pub fn in_flight(&self) -> usize {
        self.advancer.in_flight()
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &TransactionRegistry {
        &self.registry
    }
}
