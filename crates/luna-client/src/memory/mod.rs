//! In-memory NodeRepository
//!
//! Keeps groups, switches and nodes in memory with the same rules luna applies:
//! nodes inherit their interfaces from the group, MACs and IPs are unique across
//! the cluster, and each interface holds one IPv4 and one IPv6 address.
//!
//! The implementation is organized like the repository surface:
//! - `nodes.rs` - lookup, create, scalar and relational fields, MAC, delete
//! - `interfaces.rs` - interface listing and IP assignment
//! - `inventory.rs` - the serializable state shared by both

mod interfaces;
pub mod inventory;
mod nodes;

use crate::error::RepositoryError;
use crate::models::*;
use crate::repository_trait::NodeRepository;
pub use inventory::{Inventory, StoredGroup, StoredNode};
use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Repository call that can be made to fail in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Lookup,
    Create,
    SetField(NodeField),
    SetGroup,
    SetSwitch,
    SetMac,
    SetIp,
    Delete,
}

/// Mutation applied to the inventory, in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created { node: String, group: String },
    FieldSet { node: String, field: NodeField, value: FieldValue },
    GroupSet { node: String, group: String },
    SwitchSet { node: String, switch: String },
    MacSet { node: String, mac: MacAddress },
    IpSet { node: String, interface: String, ip: IpAddr },
    Deleted { node: String },
}

/// NodeRepository backed by an in-memory [`Inventory`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryNodeRepository {
    pub(crate) inventory: Arc<Mutex<Inventory>>,
    pub(crate) journal: Arc<Mutex<Vec<Mutation>>>,
    pub(crate) failures: Arc<Mutex<HashSet<Operation>>>,
}

impl InMemoryNodeRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository serving an existing inventory
    pub fn from_inventory(inventory: Inventory) -> Self {
        Self {
            inventory: Arc::new(Mutex::new(inventory)),
            ..Self::default()
        }
    }

    /// Copy of the current inventory
    pub fn inventory(&self) -> Inventory {
        self.lock_inventory().clone()
    }

    /// Define a group and the interfaces its nodes get
    pub fn add_group<I, S>(&self, name: &str, interfaces: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = StoredGroup {
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        };
        self.lock_inventory().groups.insert(name.to_string(), group);
    }

    /// Define a switch nodes can be attached to
    pub fn add_switch(&self, name: &str) {
        self.lock_inventory().switches.insert(name.to_string());
    }

    /// Mutations applied since creation (or the last [`clear_mutations`](Self::clear_mutations))
    pub fn mutations(&self) -> Vec<Mutation> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear_mutations(&self) {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Make every subsequent call of `operation` fail with [`RepositoryError::Rejected`]
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_on(&self, operation: Operation) {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).insert(operation);
    }

    /// Undo [`fail_on`](Self::fail_on)
    #[cfg(any(test, feature = "test-util"))]
    pub fn recover(&self, operation: Operation) {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).remove(&operation);
    }

    pub(crate) fn lock_inventory(&self) -> MutexGuard<'_, Inventory> {
        self.inventory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn check(&self, operation: Operation) -> Result<(), RepositoryError> {
        let failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if failures.contains(&operation) {
            return Err(RepositoryError::Rejected(format!("{operation:?} refused by backend")));
        }
        Ok(())
    }

    pub(crate) fn record(&self, mutation: Mutation) {
        debug!("Applied {:?}", mutation);
        self.journal.lock().unwrap_or_else(PoisonError::into_inner).push(mutation);
    }
}

/// Stored node for `node`, or `NotFound`
pub(crate) fn stored_node<'a>(inventory: &'a mut Inventory, node: &NodeRecord) -> Result<&'a mut StoredNode, RepositoryError> {
    inventory
        .nodes
        .get_mut(&node.name)
        .ok_or_else(|| RepositoryError::NotFound(format!("Node {} not found", node.name)))
}

#[async_trait::async_trait]
impl NodeRepository for InMemoryNodeRepository {
    async fn lookup(&self, name: &str) -> Result<Option<NodeRecord>, RepositoryError> {
        nodes::lookup(self, name)
    }

    async fn create(&self, node: NewNode) -> Result<NodeRecord, RepositoryError> {
        nodes::create(self, node)
    }

    async fn get_field(&self, node: &NodeRecord, field: NodeField) -> Result<Option<FieldValue>, RepositoryError> {
        nodes::get_field(self, node, field)
    }

    async fn set_field(&self, node: &NodeRecord, field: NodeField, value: FieldValue) -> Result<(), RepositoryError> {
        nodes::set_field(self, node, field, value)
    }

    async fn relation(&self, node: &NodeRecord, relation: Relation) -> Result<Option<String>, RepositoryError> {
        nodes::relation(self, node, relation)
    }

    async fn set_group(&self, node: &NodeRecord, group: &str) -> Result<(), RepositoryError> {
        nodes::set_group(self, node, group)
    }

    async fn set_switch(&self, node: &NodeRecord, switch: &str) -> Result<(), RepositoryError> {
        nodes::set_switch(self, node, switch)
    }

    async fn mac(&self, node: &NodeRecord) -> Result<Option<MacAddress>, RepositoryError> {
        nodes::mac(self, node)
    }

    async fn set_mac(&self, node: &NodeRecord, mac: MacAddress) -> Result<(), RepositoryError> {
        nodes::set_mac(self, node, mac)
    }

    async fn ip(&self, node: &NodeRecord, interface: &str, family: IpFamily) -> Result<Option<IpAddr>, RepositoryError> {
        interfaces::ip(self, node, interface, family)
    }

    async fn set_ip(&self, node: &NodeRecord, interface: &str, ip: IpAddr) -> Result<(), RepositoryError> {
        interfaces::set_ip(self, node, interface, ip)
    }

    async fn interfaces(&self, node: &NodeRecord) -> Result<BTreeSet<String>, RepositoryError> {
        interfaces::list(self, node)
    }

    async fn delete(&self, node: &NodeRecord) -> Result<(), RepositoryError> {
        nodes::delete(self, node)
    }

    async fn snapshot(&self, node: &NodeRecord) -> Result<NodeView, RepositoryError> {
        nodes::snapshot(self, node)
    }
}
