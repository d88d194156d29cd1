//! Reconciliation logic for luna nodes.
//!
//! `ensure_present` converges an existing or new node towards a `DesiredNode`,
//! `ensure_absent` removes it. Both run one sequential chain of repository
//! calls, stop at the first failure and never retry: every step compares
//! before it writes, so running a pass again resumes where it stopped.
//!
//! - `fields`: descriptor tables for scalar and relational fields
//! - `present`: lookup-or-create, interface check, field/MAC/IP convergence
//! - `absent`: unconditional deletion

mod absent;
pub mod fields;
mod present;
#[cfg(test)]
mod present_test;

use luna_client::NodeRepository;
use serde::Serialize;

/// Where a node stands after a reconciliation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodePhase {
    /// No record exists (or it could not be determined)
    #[default]
    Unknown,
    /// Record was created by a pass that then stopped early
    Created,
    /// Record exists but the pass stopped before current matched desired
    Converging,
    /// Current state matches desired state
    Converged,
    /// Record no longer exists
    Deleted,
}

/// Outcome of a reconciler operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// At least one mutation was applied, including before a failure
    pub changed: bool,
    pub failed: bool,
    /// Node snapshot on success, failure description otherwise
    pub message: String,
    pub phase: NodePhase,
}

impl ReconciliationResult {
    pub(crate) fn success(changed: bool, message: String, phase: NodePhase) -> Self {
        Self {
            changed,
            failed: false,
            message,
            phase,
        }
    }

    pub(crate) fn failure(changed: bool, message: String, phase: NodePhase) -> Self {
        Self {
            changed,
            failed: true,
            message,
            phase,
        }
    }
}

/// Reconciles luna node records.
pub struct Reconciler {
    pub(crate) repository: Box<dyn NodeRepository>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(repository: Box<dyn NodeRepository>) -> Self {
        Self { repository }
    }
}
