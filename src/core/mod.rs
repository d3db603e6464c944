//! Core business logic module
//!
//! This module contains the core transaction processing components:
//! - `traits` - The authorizer seam through which outcomes are injected
//! - `registry` - Transaction records with creation and transition rules
//! - `advancer` - Background tasks moving transactions to a terminal status
//! - `authorizer` - Scheduled and operator-driven authorizers
//! - `batch` - Listing and flushing the current batch
//! - `engine` - Orchestration used by the HTTP layer

pub mod advancer;
pub mod authorizer;
pub mod batch;
pub mod engine;
pub mod registry;
pub mod traits;

pub use advancer::StatusAdvancer;
pub use authorizer::{
    create_authorizer, generate_authorization_code, AuthorizerSetup, Decision, ManualAuthorizer,
    ScheduledAuthorizer,
};
pub use batch::{BatchController, FlushSummary};
pub use engine::GatewayEngine;
pub use registry::{RegistryConfig, TransactionRegistry};
pub use traits::{AuthorizationRequest, Authorizer};
