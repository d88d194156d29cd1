//! Controller-specific error types.
//!
//! `ReconcileError` covers everything that can stop a reconciliation pass;
//! `ControllerError` covers the binary around it (config, request, state file).

use luna_client::RepositoryError;
use node_spec::RequestError;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop a reconciliation pass.
///
/// None of these escape the reconciler: each is turned into a failed
/// `ReconciliationResult` carrying its message.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Node does not exist and no group was given to create it in
    #[error("Group needs to be specified to create node {node}")]
    MissingGroup { node: String },

    /// Desired interfaces the node does not have
    #[error("Node {node} does not have {} interfaces configured", .interfaces.join(" "))]
    UndefinedInterface { node: String, interfaces: Vec<String> },

    /// Repository refused to create the node
    #[error("Could not create node {node}: {source}")]
    CreationFailed {
        node: String,
        #[source]
        source: RepositoryError,
    },

    /// Repository refused a scalar, relational or MAC change
    #[error("Could not change {field} to {value}: {source}")]
    FieldMutationFailed {
        field: String,
        value: String,
        #[source]
        source: RepositoryError,
    },

    /// Repository refused an IP assignment
    #[error("Could not set ip {ip} on {interface}: {source}")]
    IpAssignmentFailed {
        ip: IpAddr,
        interface: String,
        #[source]
        source: RepositoryError,
    },

    /// Repository refused to delete the node
    #[error("Could not delete node {node}: {source}")]
    DeletionFailed {
        node: String,
        #[source]
        source: RepositoryError,
    },

    /// A read against the repository failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors that can occur in the node reconciler binary.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request document failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// State file could not be loaded or saved
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Request could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request document could not be parsed
    #[error("Request parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Output could not be rendered
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reconciliation did not finish within the configured deadline
    #[error("Reconciliation of node {node} timed out after {after:?}")]
    Timeout { node: String, after: Duration },
}
