//! Node operations for InMemoryNodeRepository
//!
//! Handles lookup, creation, scalar fields, group/switch references, MAC and deletion

use super::{InMemoryNodeRepository, Mutation, Operation, StoredNode, stored_node};
use crate::error::RepositoryError;
use crate::models::*;
use chrono::Utc;
use tracing::info;

pub fn lookup(repo: &InMemoryNodeRepository, name: &str) -> Result<Option<NodeRecord>, RepositoryError> {
    repo.check(Operation::Lookup)?;
    let inventory = repo.lock_inventory();
    Ok(inventory.nodes.contains_key(name).then(|| NodeRecord::new(name)))
}

pub fn create(repo: &InMemoryNodeRepository, node: NewNode) -> Result<NodeRecord, RepositoryError> {
    repo.check(Operation::Create)?;
    let mut inventory = repo.lock_inventory();

    if inventory.nodes.contains_key(&node.name) {
        return Err(RepositoryError::Conflict(format!("Node {} already exists", node.name)));
    }
    let group = inventory
        .groups
        .get(&node.group)
        .ok_or_else(|| RepositoryError::NotFound(format!("Group {} not found", node.group)))?;

    let now = Utc::now();
    let stored = StoredNode {
        group: node.group.clone(),
        switch: None,
        port: None,
        mac: None,
        comment: node.comment,
        localboot: node.localboot.unwrap_or(false),
        setupbmc: node.setupbmc.unwrap_or(true),
        service: node.service.unwrap_or(false),
        interfaces: group
            .interfaces
            .iter()
            .map(|name| (name.clone(), InterfaceView::default()))
            .collect(),
        created: now,
        last_updated: now,
    };
    inventory.nodes.insert(node.name.clone(), stored);
    drop(inventory);

    info!("Created node {} in group {}", node.name, node.group);
    repo.record(Mutation::Created {
        node: node.name.clone(),
        group: node.group,
    });
    Ok(NodeRecord::new(node.name))
}

pub fn get_field(repo: &InMemoryNodeRepository, node: &NodeRecord, field: NodeField) -> Result<Option<FieldValue>, RepositoryError> {
    let mut inventory = repo.lock_inventory();
    let stored = stored_node(&mut inventory, node)?;
    let value = match field {
        NodeField::Localboot => Some(FieldValue::Flag(stored.localboot)),
        NodeField::Setupbmc => Some(FieldValue::Flag(stored.setupbmc)),
        NodeField::Service => Some(FieldValue::Flag(stored.service)),
        NodeField::Port => stored.port.clone().map(FieldValue::Text),
        NodeField::Comment => stored.comment.clone().map(FieldValue::Text),
    };
    Ok(value)
}

pub fn set_field(repo: &InMemoryNodeRepository, node: &NodeRecord, field: NodeField, value: FieldValue) -> Result<(), RepositoryError> {
    repo.check(Operation::SetField(field))?;
    let mut inventory = repo.lock_inventory();
    let stored = stored_node(&mut inventory, node)?;

    match (field, &value) {
        (NodeField::Localboot, FieldValue::Flag(flag)) => stored.localboot = *flag,
        (NodeField::Setupbmc, FieldValue::Flag(flag)) => stored.setupbmc = *flag,
        (NodeField::Service, FieldValue::Flag(flag)) => stored.service = *flag,
        (NodeField::Port, FieldValue::Text(text)) => stored.port = Some(text.clone()),
        (NodeField::Comment, FieldValue::Text(text)) => stored.comment = Some(text.clone()),
        _ => {
            return Err(RepositoryError::Rejected(format!(
                "Value '{}' has the wrong type for field {}",
                value, field
            )));
        }
    }
    stored.touch();
    drop(inventory);

    repo.record(Mutation::FieldSet {
        node: node.name.clone(),
        field,
        value,
    });
    Ok(())
}

pub fn relation(repo: &InMemoryNodeRepository, node: &NodeRecord, relation: Relation) -> Result<Option<String>, RepositoryError> {
    let mut inventory = repo.lock_inventory();
    let stored = stored_node(&mut inventory, node)?;
    Ok(match relation {
        Relation::Group => Some(stored.group.clone()),
        Relation::Switch => stored.switch.clone(),
    })
}

/// Move a node to another group
///
/// Interfaces the new group also defines keep their addresses; the others are
/// dropped and the new group's extra interfaces are added empty.
pub fn set_group(repo: &InMemoryNodeRepository, node: &NodeRecord, group: &str) -> Result<(), RepositoryError> {
    repo.check(Operation::SetGroup)?;
    let mut inventory = repo.lock_inventory();
    let group_interfaces = inventory
        .groups
        .get(group)
        .map(|g| g.interfaces.clone())
        .ok_or_else(|| RepositoryError::NotFound(format!("Group {} not found", group)))?;

    let stored = stored_node(&mut inventory, node)?;
    stored.group = group.to_string();
    stored.interfaces.retain(|name, _| group_interfaces.contains(name));
    for name in group_interfaces {
        stored.interfaces.entry(name).or_default();
    }
    stored.touch();
    drop(inventory);

    repo.record(Mutation::GroupSet {
        node: node.name.clone(),
        group: group.to_string(),
    });
    Ok(())
}

pub fn set_switch(repo: &InMemoryNodeRepository, node: &NodeRecord, switch: &str) -> Result<(), RepositoryError> {
    repo.check(Operation::SetSwitch)?;
    let mut inventory = repo.lock_inventory();
    if !inventory.switches.contains(switch) {
        return Err(RepositoryError::NotFound(format!("Switch {} not found", switch)));
    }

    let stored = stored_node(&mut inventory, node)?;
    stored.switch = Some(switch.to_string());
    stored.touch();
    drop(inventory);

    repo.record(Mutation::SwitchSet {
        node: node.name.clone(),
        switch: switch.to_string(),
    });
    Ok(())
}

pub fn mac(repo: &InMemoryNodeRepository, node: &NodeRecord) -> Result<Option<MacAddress>, RepositoryError> {
    let mut inventory = repo.lock_inventory();
    Ok(stored_node(&mut inventory, node)?.mac)
}

pub fn set_mac(repo: &InMemoryNodeRepository, node: &NodeRecord, mac: MacAddress) -> Result<(), RepositoryError> {
    repo.check(Operation::SetMac)?;
    let mut inventory = repo.lock_inventory();

    let holder = inventory
        .nodes
        .iter()
        .find(|(name, other)| *name != &node.name && other.mac == Some(mac))
        .map(|(name, _)| name.clone());
    if let Some(holder) = holder {
        return Err(RepositoryError::Conflict(format!("MAC {} is already assigned to node {}", mac, holder)));
    }

    let stored = stored_node(&mut inventory, node)?;
    stored.mac = Some(mac);
    stored.touch();
    drop(inventory);

    repo.record(Mutation::MacSet {
        node: node.name.clone(),
        mac,
    });
    Ok(())
}

pub fn delete(repo: &InMemoryNodeRepository, node: &NodeRecord) -> Result<(), RepositoryError> {
    repo.check(Operation::Delete)?;
    let removed = repo.lock_inventory().nodes.remove(&node.name);
    if removed.is_none() {
        return Err(RepositoryError::NotFound(format!("Node {} not found", node.name)));
    }

    info!("Deleted node {}", node.name);
    repo.record(Mutation::Deleted { node: node.name.clone() });
    Ok(())
}

pub fn snapshot(repo: &InMemoryNodeRepository, node: &NodeRecord) -> Result<NodeView, RepositoryError> {
    let mut inventory = repo.lock_inventory();
    Ok(stored_node(&mut inventory, node)?.view(&node.name))
}
