//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use luna_client::{
    FieldValue, InMemoryNodeRepository, IpFamily, MacAddress, NewNode, NodeField, NodeRecord, NodeRepository, NodeView,
    Relation, RepositoryError,
};
#[cfg(test)]
use std::collections::BTreeSet;
#[cfg(test)]
use node_spec::{DesiredInterface, DesiredNode};
#[cfg(test)]
use std::net::IpAddr;

/// Repository with groups `g1` (eth0, ib0) and `g2` (eth0) and switch `sw01`
#[cfg(test)]
pub fn test_repository() -> InMemoryNodeRepository {
    let repo = InMemoryNodeRepository::new();
    repo.add_group("g1", ["eth0", "ib0"]);
    repo.add_group("g2", ["eth0"]);
    repo.add_switch("sw01");
    repo
}

/// Reconciler sharing state with `repo`
#[cfg(test)]
pub fn reconciler_for(repo: &InMemoryNodeRepository) -> Reconciler {
    Reconciler::new(Box::new(repo.clone()))
}

#[cfg(test)]
pub fn ip(address: &str) -> IpAddr {
    address.parse().unwrap()
}

/// Desired node `name` in `group` with one interface carrying `ips`
#[cfg(test)]
pub fn desired_with_ips(name: &str, group: &str, interface: &str, ips: &[&str]) -> DesiredNode {
    DesiredNode::new(name)
        .with_group(group)
        .with_interface(DesiredInterface::new(interface, ips.iter().map(|a| ip(a))))
}

/// Repository whose IP assignments wait `stall` before reaching `inner`
#[cfg(test)]
pub struct StallingRepository {
    inner: InMemoryNodeRepository,
    stall: std::time::Duration,
}

#[cfg(test)]
impl StallingRepository {
    pub fn new(inner: InMemoryNodeRepository, stall: std::time::Duration) -> Self {
        Self { inner, stall }
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl NodeRepository for StallingRepository {
    async fn lookup(&self, name: &str) -> Result<Option<NodeRecord>, RepositoryError> {
        self.inner.lookup(name).await
    }

    async fn create(&self, node: NewNode) -> Result<NodeRecord, RepositoryError> {
        self.inner.create(node).await
    }

    async fn get_field(&self, node: &NodeRecord, field: NodeField) -> Result<Option<FieldValue>, RepositoryError> {
        self.inner.get_field(node, field).await
    }

    async fn set_field(&self, node: &NodeRecord, field: NodeField, value: FieldValue) -> Result<(), RepositoryError> {
        self.inner.set_field(node, field, value).await
    }

    async fn relation(&self, node: &NodeRecord, relation: Relation) -> Result<Option<String>, RepositoryError> {
        self.inner.relation(node, relation).await
    }

    async fn set_group(&self, node: &NodeRecord, group: &str) -> Result<(), RepositoryError> {
        self.inner.set_group(node, group).await
    }

    async fn set_switch(&self, node: &NodeRecord, switch: &str) -> Result<(), RepositoryError> {
        self.inner.set_switch(node, switch).await
    }

    async fn mac(&self, node: &NodeRecord) -> Result<Option<MacAddress>, RepositoryError> {
        self.inner.mac(node).await
    }

    async fn set_mac(&self, node: &NodeRecord, mac: MacAddress) -> Result<(), RepositoryError> {
        self.inner.set_mac(node, mac).await
    }

    async fn ip(&self, node: &NodeRecord, interface: &str, family: IpFamily) -> Result<Option<IpAddr>, RepositoryError> {
        self.inner.ip(node, interface, family).await
    }

    async fn set_ip(&self, node: &NodeRecord, interface: &str, ip: IpAddr) -> Result<(), RepositoryError> {
        tokio::time::sleep(self.stall).await;
        self.inner.set_ip(node, interface, ip).await
    }

    async fn interfaces(&self, node: &NodeRecord) -> Result<BTreeSet<String>, RepositoryError> {
        self.inner.interfaces(node).await
    }

    async fn delete(&self, node: &NodeRecord) -> Result<(), RepositoryError> {
        self.inner.delete(node).await
    }

    async fn snapshot(&self, node: &NodeRecord) -> Result<NodeView, RepositoryError> {
        self.inner.snapshot(node).await
    }
}
