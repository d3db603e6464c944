//! Background status advancement
//!
//! The `StatusAdvancer` spawns one tokio task per created transaction. The
//! task waits for the injected [`Authorizer`] and applies the outcome to the
//! registry, tagged with the record's epoch.
//!
//! # Failure Handling
//!
//! Nothing here is visible to clients. When the outcome cannot be applied
//! (the record was flushed, or an operator already settled it differently)
//! the error is logged and dropped.
//!
//! # Cancellation
//!
//! Flushing a record aborts its task. A task that finishes in the window
//! between the registry being cleared and the abort reaching it fails its
//! epoch check instead of resurrecting anything.

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info, warn};
use tokio::task::AbortHandle;

use super::registry::TransactionRegistry;
use super::traits::{AuthorizationRequest, Authorizer};
use crate::types::{Epoch, GatewayError, TransactionId, TransactionRecord};

type TaskTable = DashMap<TransactionId, (Epoch, AbortHandle)>;

/// Drives in-progress transactions to a terminal status
pub struct StatusAdvancer {
    registry: Arc<TransactionRegistry>,
    authorizer: Arc<dyn Authorizer>,

    /// Live tasks by transaction id, tagged with the epoch they serve
    tasks: Arc<TaskTable>,
}

impl StatusAdvancer {
    pub fn new(registry: Arc<TransactionRegistry>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            registry,
            authorizer,
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Spawn the advancement task for a freshly created record
    ///
    /// Must be called from within a tokio runtime. If the record was flushed
    /// before its task got registered, the task is aborted straight away.
    pub fn schedule(&self, record: &TransactionRecord) {
        let request = AuthorizationRequest {
            id: record.id.clone(),
            epoch: record.epoch,
            tx_type: record.tx_type,
            amount: record.requested_amount,
        };
        let registry = Arc::clone(&self.registry);
        let authorizer = Arc::clone(&self.authorizer);
        let tasks = Arc::clone(&self.tasks);

        let handle = tokio::spawn(async move {
            let result = match authorizer.authorize(&request).await {
                Ok(outcome) => registry.advance_epoch(&request.id, request.epoch, outcome),
                Err(e) => Err(e),
            };
            match result {
                Ok(record) => info!(
                    "advancer: transaction {} is now {}",
                    record.id, record.status
                ),
                Err(GatewayError::NotFound { id }) => {
                    debug!("advancer: transaction {} was flushed before completing", id)
                }
                Err(e) => warn!("advancer: transaction {}: {}", request.id, e),
            }
            forget(&tasks, &request.id, request.epoch);
        });

        let task = handle.abort_handle();
        // A task left over for an earlier record under the same id is stale
        if let Some((_, stale)) = self
            .tasks
            .insert(record.id.clone(), (record.epoch, task.clone()))
        {
            stale.abort();
        }

        // A flush that cleared the record before the insert above cannot
        // have seen this task, so it is cancelled here instead
        if !self.registry.holds_epoch(&record.id, record.epoch) {
            debug!("advancer: transaction {} flushed before scheduling", record.id);
            forget(&self.tasks, &record.id, record.epoch);
            task.abort();
        } else if task.is_finished() {
            forget(&self.tasks, &record.id, record.epoch);
        }
    }

    /// Abort the tasks serving the given records
    ///
    /// # Returns
    ///
    /// The number of tasks that were still running.
    pub fn cancel(&self, removed: &[(TransactionId, Epoch)]) -> usize {
        let mut cancelled = 0;
        for (id, epoch) in removed {
            if let Some((_, (_, task))) = self
                .tasks
                .remove_if(id, |_, (task_epoch, _)| task_epoch == epoch)
            {
                if !task.is_finished() {
                    cancelled += 1;
                }
                task.abort();
            }
        }
        cancelled
    }

    /// Number of tasks still waiting for an outcome
    pub fn in_flight(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| !entry.value().1.is_finished())
            .count()
    }
}

fn forget(tasks: &TaskTable, id: &str, epoch: Epoch) {
    tasks.remove_if(id, |_, (task_epoch, _)| *task_epoch == epoch);
}

impl std::fmt::Debug for StatusAdvancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusAdvancer")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
