//! Authorizer implementations
//!
//! - [`ScheduledAuthorizer`] simulates a timed authorization callback: it waits
//!   a fixed delay and then answers with a fixed decision.
//! - [`ManualAuthorizer`] parks every request until an operator resolves it
//!   by id, replacing the "complete the transaction on the terminal" step.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use rand::Rng;
use tokio::sync::oneshot;

use super::traits::{AuthorizationRequest, Authorizer};
use crate::cli::AuthorizerMode;
use crate::types::{AuthorizationOutcome, Epoch, GatewayError, TransactionId};

/// Card type reported by simulated authorizations
pub const SIMULATED_CARD_TYPE: &str = "VISA";

/// Masked card number reported by simulated authorizations
pub const SIMULATED_MASKED_CARD: &str = "************1111";

/// Generate a six digit authorization code
pub fn generate_authorization_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// Fixed answer given by a [`ScheduledAuthorizer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Decline,
}

/// Authorizer that answers after a fixed delay
#[derive(Debug, Clone)]
pub struct ScheduledAuthorizer {
    delay: Duration,
    decision: Decision,
}

impl ScheduledAuthorizer {
    pub fn new(delay: Duration, decision: Decision) -> Self {
        Self { delay, decision }
    }

    /// Approve every transaction after `delay`
    pub fn approving(delay: Duration) -> Self {
        Self::new(delay, Decision::Approve)
    }

    /// Decline every transaction after `delay`
    pub fn declining(delay: Duration) -> Self {
        Self::new(delay, Decision::Decline)
    }
}

#[async_trait]
impl Authorizer for ScheduledAuthorizer {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, GatewayError> {
        tokio::time::sleep(self.delay).await;

        let outcome = match self.decision {
            Decision::Approve => {
                AuthorizationOutcome::approved(request.amount, generate_authorization_code())
            }
            Decision::Decline => AuthorizationOutcome::declined(),
        };
        Ok(outcome.with_card(SIMULATED_CARD_TYPE, SIMULATED_MASKED_CARD))
    }
}

/// Authorizer resolved by an operator
///
/// Each call to `authorize` registers the transaction as pending and waits
/// until [`ManualAuthorizer::resolve`] is called with its id.
#[derive(Debug, Default)]
pub struct ManualAuthorizer {
    pending: DashMap<TransactionId, (Epoch, oneshot::Sender<AuthorizationOutcome>)>,
}

impl ManualAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the outcome for a pending transaction
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the outcome was handed to the waiting task
    /// * `Err(GatewayError::NotFound)` - If nothing is waiting for that id
    pub fn resolve(&self, id: &str, outcome: AuthorizationOutcome) -> Result<(), GatewayError> {
        let (_, (_, sender)) = self
            .pending
            .remove(id)
            .ok_or_else(|| GatewayError::not_found(id))?;
        sender
            .send(outcome)
            .map_err(|_| GatewayError::not_found(id))
    }

    /// Ids waiting for an operator decision, sorted
    pub fn pending_ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<TransactionId> = self
            .pending
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }
}

/// Removes a pending registration when its waiting task goes away
struct PendingGuard<'a> {
    pending: &'a DashMap<TransactionId, (Epoch, oneshot::Sender<AuthorizationOutcome>)>,
    id: TransactionId,
    epoch: Epoch,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        // Only our own registration; a newer one for the same id stays
        self.pending
            .remove_if(&self.id, |_, (epoch, _)| *epoch == self.epoch);
    }
}

#[async_trait]
impl Authorizer for ManualAuthorizer {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, GatewayError> {
        let (sender, receiver) = oneshot::channel();
        self.pending
            .insert(request.id.clone(), (request.epoch, sender));
        let _guard = PendingGuard {
            pending: &self.pending,
            id: request.id.clone(),
            epoch: request.epoch,
        };
        debug!("authorizer: transaction {} awaiting operator", request.id);

        receiver
            .await
            .map_err(|_| GatewayError::internal(format!("authorization of {} abandoned", request.id)))
    }
}

/// Authorizer chosen at startup
///
/// `manual` is set only in manual mode, so the operator console can reach
/// the same instance the engine uses.
pub struct AuthorizerSetup {
    pub authorizer: Arc<dyn Authorizer>,
    pub manual: Option<Arc<ManualAuthorizer>>,
}

/// Create the authorizer for the selected mode
///
/// # Arguments
///
/// * `mode` - How transactions get their outcome
/// * `delay` - Delay used by the approve and decline modes (ignored for manual)
///
/// # Returns
///
/// The authorizer for the engine, plus the manual handle when there is one
pub fn create_authorizer(mode: AuthorizerMode, delay: Duration) -> AuthorizerSetup {
    match mode {
        AuthorizerMode::Manual => {
            let manual = Arc::new(ManualAuthorizer::new());
            AuthorizerSetup {
                authorizer: manual.clone(),
                manual: Some(manual),
            }
        }
        AuthorizerMode::Approve => AuthorizerSetup {
            authorizer: Arc::new(ScheduledAuthorizer::approving(delay)),
            manual: None,
        },
        AuthorizerMode::Decline => AuthorizerSetup {
            authorizer: Arc::new(ScheduledAuthorizer::declining(delay)),
            manual: None,
        },
    }
}
