//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Transaction records, statuses and authorization outcomes
//! - `error`: Error types for the gateway

pub mod error;
pub mod transaction;

pub use error::GatewayError;
pub use transaction::{
    validate_transaction_id, Amount, AuthorizationDetails, AuthorizationOutcome,
    CreateTransactionRequest, Epoch, TransactionId, TransactionRecord, TransactionStatus,
    TransactionType,
};
