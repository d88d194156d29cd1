//! NodeRepository trait for dependency injection and testing
//!
//! The reconciler depends on this trait rather than on a concrete store, so it
//! can run against the in-memory inventory in tests and in the CLI alike.

use crate::error::RepositoryError;
use crate::models::*;
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Trait for node record storage
///
/// Every read returns `Ok(None)` for "not set" rather than an error; errors are
/// reserved for calls the backend could not serve or refused.
#[async_trait::async_trait]
pub trait NodeRepository: Send + Sync {
    /// Find a node by name
    async fn lookup(&self, name: &str) -> Result<Option<NodeRecord>, RepositoryError>;

    /// Create a node; its interfaces are taken from the group
    async fn create(&self, node: NewNode) -> Result<NodeRecord, RepositoryError>;

    async fn get_field(&self, node: &NodeRecord, field: NodeField) -> Result<Option<FieldValue>, RepositoryError>;

    async fn set_field(&self, node: &NodeRecord, field: NodeField, value: FieldValue) -> Result<(), RepositoryError>;

    /// Current target of a relational reference
    async fn relation(&self, node: &NodeRecord, relation: Relation) -> Result<Option<String>, RepositoryError>;

    async fn set_group(&self, node: &NodeRecord, group: &str) -> Result<(), RepositoryError>;

    async fn set_switch(&self, node: &NodeRecord, switch: &str) -> Result<(), RepositoryError>;

    async fn mac(&self, node: &NodeRecord) -> Result<Option<MacAddress>, RepositoryError>;

    async fn set_mac(&self, node: &NodeRecord, mac: MacAddress) -> Result<(), RepositoryError>;

    /// Address of `family` configured on `interface`, if any
    async fn ip(&self, node: &NodeRecord, interface: &str, family: IpFamily) -> Result<Option<IpAddr>, RepositoryError>;

    async fn set_ip(&self, node: &NodeRecord, interface: &str, ip: IpAddr) -> Result<(), RepositoryError>;

    /// Names of the interfaces defined on the node
    async fn interfaces(&self, node: &NodeRecord) -> Result<BTreeSet<String>, RepositoryError>;

    async fn delete(&self, node: &NodeRecord) -> Result<(), RepositoryError>;

    async fn snapshot(&self, node: &NodeRecord) -> Result<NodeView, RepositoryError>;
}
