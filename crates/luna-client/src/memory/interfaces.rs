//! Interface operations for InMemoryNodeRepository

use super::{InMemoryNodeRepository, Mutation, Operation, stored_node};
use crate::error::RepositoryError;
use crate::models::*;
use std::collections::BTreeSet;
use std::net::IpAddr;
use tracing::info;

pub fn list(repo: &InMemoryNodeRepository, node: &NodeRecord) -> Result<BTreeSet<String>, RepositoryError> {
    let mut inventory = repo.lock_inventory();
    Ok(stored_node(&mut inventory, node)?.interfaces.keys().cloned().collect())
}

/// Configured address of `family`; unknown interfaces read as unconfigured
pub fn ip(repo: &InMemoryNodeRepository, node: &NodeRecord, interface: &str, family: IpFamily) -> Result<Option<IpAddr>, RepositoryError> {
    let mut inventory = repo.lock_inventory();
    let stored = stored_node(&mut inventory, node)?;
    Ok(stored.interfaces.get(interface).and_then(|iface| iface.ip(family)))
}

pub fn set_ip(repo: &InMemoryNodeRepository, node: &NodeRecord, interface: &str, ip: IpAddr) -> Result<(), RepositoryError> {
    repo.check(Operation::SetIp)?;
    let mut inventory = repo.lock_inventory();

    let holder = inventory.nodes.iter().find_map(|(name, other)| {
        other
            .interfaces
            .iter()
            .find(|(iface_name, iface)| iface.holds(&ip) && !(name == &node.name && iface_name.as_str() == interface))
            .map(|(iface_name, _)| format!("{}/{}", name, iface_name))
    });
    if let Some(holder) = holder {
        return Err(RepositoryError::Conflict(format!("IP {} is already assigned to {}", ip, holder)));
    }

    let stored = stored_node(&mut inventory, node)?;
    let iface = stored
        .interfaces
        .get_mut(interface)
        .ok_or_else(|| RepositoryError::NotFound(format!("Interface {} not found on node {}", interface, node.name)))?;
    iface.assign(ip);
    stored.touch();
    drop(inventory);

    info!("Assigned {} to {}/{}", ip, node.name, interface);
    repo.record(Mutation::IpSet {
        node: node.name.clone(),
        interface: interface.to_string(),
        ip,
    });
    Ok(())
}
