//! Absent-state reconciliation

use super::{NodePhase, ReconciliationResult, Reconciler};
use crate::error::ReconcileError;
use crate::log::ReconcileLog;

impl Reconciler {
    /// Delete the node if it exists. No diffing: a found node is always removed.
    pub async fn ensure_absent(&self, name: &str, log: &mut ReconcileLog) -> ReconciliationResult {
        log.debug(format!("Reconciling node {} (absent)", name));

        match self.remove(name, log).await {
            Ok(deleted) => ReconciliationResult::success(deleted, name.to_string(), NodePhase::Deleted),
            Err(e) => {
                let message = e.to_string();
                log.error(message.clone());
                let phase = match e {
                    ReconcileError::DeletionFailed { .. } => NodePhase::Converging,
                    _ => NodePhase::Unknown,
                };
                ReconciliationResult::failure(false, message, phase)
            }
        }
    }

    /// Returns whether a node was deleted
    async fn remove(&self, name: &str, log: &mut ReconcileLog) -> Result<bool, ReconcileError> {
        let Some(node) = self.repository.lookup(name).await? else {
            log.debug(format!("Node {} does not exist, nothing to delete", name));
            return Ok(false);
        };

        self.repository
            .delete(&node)
            .await
            .map_err(|source| ReconcileError::DeletionFailed {
                node: name.to_string(),
                source,
            })?;
        log.info(format!("Deleted node {}", name));
        Ok(true)
    }
}
