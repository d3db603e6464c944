//! Batch control: listing and flushing the current batch of transactions

use std::sync::Arc;

use log::info;

use super::advancer::StatusAdvancer;
use super::registry::TransactionRegistry;
use crate::types::TransactionRecord;

/// Result of a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushSummary {
    /// Records removed from the registry
    pub removed: usize,

    /// Advancer tasks that were still running and got aborted
    pub cancelled: usize,
}

/// Administrative operations over the whole batch
#[derive(Debug, Clone)]
pub struct BatchController {
    registry: Arc<TransactionRegistry>,
    advancer: Arc<StatusAdvancer>,
}

impl BatchController {
    pub fn new(registry: Arc<TransactionRegistry>, advancer: Arc<StatusAdvancer>) -> Self {
        Self { registry, advancer }
    }

    /// Remove every transaction and cancel its pending advancement
    ///
    /// Never fails, and flushing an empty batch is indistinguishable from
    /// flushing a populated one apart from the summary counts.
    pub fn flush(&self) -> FlushSummary {
        let removed = self.registry.clear();
        let cancelled = self.advancer.cancel(&removed);
        let summary = FlushSummary {
            removed: removed.len(),
            cancelled,
        };
        info!(
            "batch: flushed {} transactions ({} still in progress)",
            summary.removed, summary.cancelled
        );
        summary
    }

    /// Every transaction in the current batch, oldest first
    pub fn list(&self) -> Vec<TransactionRecord> {
        self.registry.list()
    }
}
