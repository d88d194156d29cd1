//! Main controller implementation.
//!
//! Loads the inventory from the state file, reads and validates the request,
//! runs the reconciler (with an optional deadline and repeated passes) and
//! writes the inventory back, including partially applied changes.

use crate::backoff::FibonacciBackoff;
use crate::config::{Config, RequestSource};
use crate::error::ControllerError;
use crate::log::ReconcileLog;
use crate::reconciler::{NodePhase, ReconciliationResult, Reconciler};
use luna_client::{InMemoryNodeRepository, StateFile};
use node_spec::{DesiredNode, NodeRequest, NodeState};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// What the binary prints on stdout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutput {
    pub changed: bool,
    pub failed: bool,
    /// Collected reconcile log
    pub msg: String,
    /// Node snapshot, node name, or failure description
    pub meta: String,
}

impl ModuleOutput {
    /// Output for errors raised before any reconciliation ran
    pub fn from_error(error: &ControllerError) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: format!("ERROR: {error}"),
            meta: error.to_string(),
        }
    }
}

/// Runs one request against the inventory in the state file.
#[derive(Debug)]
pub struct Controller {
    config: Config,
    state_file: StateFile,
    repository: InMemoryNodeRepository,
    reconciler: Reconciler,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing node reconciler");

        let state_file = StateFile::new(config.state_file.clone());
        let repository = state_file.load().await?;
        let reconciler = Reconciler::new(Box::new(repository.clone()));

        Ok(Self {
            config,
            state_file,
            repository,
            reconciler,
        })
    }

    /// Read, parse and validate the configured request document
    pub async fn read_request(&self) -> Result<NodeRequest, ControllerError> {
        let document = match &self.config.request {
            RequestSource::Stdin => {
                let mut document = String::new();
                tokio::io::stdin().read_to_string(&mut document).await?;
                document
            }
            RequestSource::File(path) => tokio::fs::read_to_string(path).await?,
        };

        let request = NodeRequest::from_yaml(&document)?;
        request.validate()?;
        debug!("Read request for node {} (state {:?})", request.name, request.state);
        Ok(request)
    }

    /// Reconcile `request`, repeating failed passes up to the configured attempts,
    /// then persist the inventory.
    pub async fn run(&self, request: NodeRequest) -> Result<ModuleOutput, ControllerError> {
        let state = request.state;
        let desired = request.into_desired();
        let mut log = ReconcileLog::new();
        let mut backoff = FibonacciBackoff::default();
        let mut changed = false;
        let mut attempt = 1;

        let result = loop {
            let result = self.attempt(state, &desired, &mut log).await;
            changed |= result.changed;
            if !result.failed || attempt >= self.config.max_attempts {
                break result;
            }

            let delay = backoff.next_backoff();
            log.warn(format!(
                "Attempt {} of {} for node {} failed, retrying in {}s",
                attempt,
                self.config.max_attempts,
                desired.name,
                delay.as_secs()
            ));
            tokio::time::sleep(delay).await;
            attempt += 1;
        };

        self.state_file.save(&self.repository).await?;
        info!(
            "Node {} reconciled: changed={}, failed={}, phase={:?}",
            desired.name, changed, result.failed, result.phase
        );

        Ok(ModuleOutput {
            changed,
            failed: result.failed,
            msg: log.render(),
            meta: result.message,
        })
    }

    async fn attempt(&self, state: NodeState, desired: &DesiredNode, log: &mut ReconcileLog) -> ReconciliationResult {
        let applied_before = self.repository.mutations().len();
        let pass = async {
            match state {
                NodeState::Present => self.reconciler.ensure_present(desired, log).await,
                NodeState::Absent => self.reconciler.ensure_absent(&desired.name, log).await,
            }
        };

        let Some(deadline) = self.config.timeout else {
            return pass.await;
        };
        match tokio::time::timeout(deadline, pass).await {
            Ok(result) => result,
            Err(_) => {
                let message = ControllerError::Timeout {
                    node: desired.name.clone(),
                    after: deadline,
                }
                .to_string();
                log.error(message.clone());
                let changed = self.repository.mutations().len() > applied_before;
                ReconciliationResult::failure(changed, message, NodePhase::Unknown)
            }
        }
    }
}
