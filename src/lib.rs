//! Transaction Gateway Library
//! # Overview
//!
//! This library provides the core of a payment terminal gateway: clients
//! create transactions over HTTP under ids they choose, poll them while an
//! authorizer decides their outcome, and flush the whole batch at once.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (TransactionRecord, GatewayError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::registry`] - Transaction records and their transition rules
//!   - [`core::advancer`] - Background tasks applying authorization outcomes
//!   - [`core::authorizer`] - Scheduled and operator-driven authorizers
//!   - [`core::batch`] - Listing and flushing the batch
//!   - [`core::engine`] - Orchestration of the above
//! - [`server`] - axum router, handlers and the listener
//! - [`console`] - Operator commands for manual authorization
//!
//! # API
//!
//! - `POST /v1/transactions/{id}.json` - Create a transaction (202, 422 if the id exists)
//! - `GET /v1/transactions/{id}.json` - Poll a transaction (200, 404)
//! - `GET /v1/transactions.json` - List the batch (200)
//! - `DELETE /v1/transactions.json` - Flush the batch (204)
//!
//! # Transaction Statuses
//!
//! Every transaction starts `in-progress` and moves exactly once to one of
//! `approved`, `partially-approved` or `declined`.

// Module declarations
pub mod cli;
pub mod console;
pub mod core;
pub mod server;
pub mod types;

pub use console::OperatorConsole;
pub use core::{GatewayEngine, ManualAuthorizer, RegistryConfig, ScheduledAuthorizer};
pub use server::{Server, ServerConfig};
pub use types::{
    AuthorizationOutcome, GatewayError, TransactionId, TransactionRecord, TransactionStatus,
    TransactionType,
};
