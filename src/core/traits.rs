//! Core traits for transaction authorization
//!
//! The registry never decides on its own when an in-progress transaction
//! completes. Some external party (a card network, a simulated callback, an
//! operator at the terminal) produces the outcome; this module defines the
//! seam through which that party is injected.

use async_trait::async_trait;

use crate::types::{Amount, AuthorizationOutcome, Epoch, GatewayError, TransactionId, TransactionType};

/// Everything an authorizer needs to know about a pending transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub id: TransactionId,
    pub epoch: Epoch,
    pub tx_type: TransactionType,
    pub amount: Amount,
}

/// Source of authorization outcomes
///
/// `authorize` is awaited on a background task, one per created transaction,
/// and may take arbitrarily long. The task is aborted when the transaction is
/// flushed, so implementations must tolerate their future being dropped.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Wait for the terminal outcome of a transaction
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, GatewayError>;
}
