//! Present-state reconciliation

use super::fields::{relational_fields, scalar_fields};
use super::{NodePhase, ReconciliationResult, Reconciler};
use crate::error::ReconcileError;
use crate::log::ReconcileLog;
use luna_client::{IpFamily, NewNode, NodeRecord, NodeView, Relation};
use node_spec::DesiredNode;
use std::collections::HashSet;

/// Progress of one pass, kept so a failure can still report what was applied
#[derive(Debug, Default)]
struct Pass {
    changed: bool,
    phase: NodePhase,
}

impl Reconciler {
    /// Converge the node named by `desired` towards it, creating it if needed.
    pub async fn ensure_present(&self, desired: &DesiredNode, log: &mut ReconcileLog) -> ReconciliationResult {
        log.debug(format!("Reconciling node {} (present)", desired.name));
        let mut pass = Pass::default();

        match self.converge(desired, &mut pass, log).await {
            Ok(view) => {
                if pass.changed {
                    log.info(format!("Node {} converged", desired.name));
                } else {
                    log.debug(format!("Node {} already up-to-date", desired.name));
                }
                ReconciliationResult::success(pass.changed, view.to_string(), NodePhase::Converged)
            }
            Err(e) => {
                let message = e.to_string();
                log.error(message.clone());
                ReconciliationResult::failure(pass.changed, message, pass.phase)
            }
        }
    }

    async fn converge(&self, desired: &DesiredNode, pass: &mut Pass, log: &mut ReconcileLog) -> Result<NodeView, ReconcileError> {
        let node = self.lookup_or_create(desired, pass, log).await?;
        self.check_interfaces(&node, desired).await?;
        self.converge_scalar_fields(&node, desired, pass, log).await?;
        self.converge_relations(&node, desired, pass, log).await?;
        self.converge_mac(&node, desired, pass, log).await?;
        self.converge_ips(&node, desired, pass, log).await?;
        Ok(self.repository.snapshot(&node).await?)
    }

    async fn lookup_or_create(&self, desired: &DesiredNode, pass: &mut Pass, log: &mut ReconcileLog) -> Result<NodeRecord, ReconcileError> {
        if let Some(node) = self.repository.lookup(&desired.name).await? {
            pass.phase = NodePhase::Converging;
            return Ok(node);
        }

        let group = desired.group().ok_or_else(|| ReconcileError::MissingGroup {
            node: desired.name.clone(),
        })?;
        let new_node = NewNode {
            name: desired.name.clone(),
            group: group.to_string(),
            localboot: desired.localboot,
            setupbmc: desired.setupbmc,
            service: desired.service,
            comment: desired.comment.clone(),
        };
        let node = self
            .repository
            .create(new_node)
            .await
            .map_err(|source| ReconcileError::CreationFailed {
                node: desired.name.clone(),
                source,
            })?;

        pass.changed = true;
        pass.phase = NodePhase::Created;
        log.info(format!("Created node {} in group {}", desired.name, group));
        Ok(node)
    }

    /// Interfaces are never created here; every desired one must already exist.
    async fn check_interfaces(&self, node: &NodeRecord, desired: &DesiredNode) -> Result<(), ReconcileError> {
        let defined = self.repository.interfaces(node).await?;
        let undefined: Vec<String> = desired
            .interfaces
            .iter()
            .filter(|iface| !defined.contains(&iface.name))
            .map(|iface| iface.name.clone())
            .collect();

        if undefined.is_empty() {
            Ok(())
        } else {
            Err(ReconcileError::UndefinedInterface {
                node: node.name.clone(),
                interfaces: undefined,
            })
        }
    }

    async fn converge_scalar_fields(&self, node: &NodeRecord, desired: &DesiredNode, pass: &mut Pass, log: &mut ReconcileLog) -> Result<(), ReconcileError> {
        for descriptor in scalar_fields() {
            let Some(value) = (descriptor.desired)(desired) else {
                continue;
            };
            let current = self.repository.get_field(node, descriptor.field).await?;
            if current.as_ref() == Some(&value) {
                continue;
            }

            self.repository
                .set_field(node, descriptor.field, value.clone())
                .await
                .map_err(|source| ReconcileError::FieldMutationFailed {
                    field: descriptor.field.to_string(),
                    value: value.to_string(),
                    source,
                })?;
            pass.changed = true;
            log.info(format!("Changed {} of node {} to {}", descriptor.field, node.name, value));
        }
        Ok(())
    }

    async fn converge_relations(&self, node: &NodeRecord, desired: &DesiredNode, pass: &mut Pass, log: &mut ReconcileLog) -> Result<(), ReconcileError> {
        for descriptor in relational_fields() {
            let Some(target) = (descriptor.desired)(desired) else {
                continue;
            };
            let current = self.repository.relation(node, descriptor.relation).await?;
            if current.as_deref() == Some(target) {
                continue;
            }

            let applied = match descriptor.relation {
                Relation::Group => self.repository.set_group(node, target).await,
                Relation::Switch => self.repository.set_switch(node, target).await,
            };
            applied.map_err(|source| ReconcileError::FieldMutationFailed {
                field: descriptor.relation.to_string(),
                value: target.to_string(),
                source,
            })?;
            pass.changed = true;
            log.info(format!("Changed {} of node {} to {}", descriptor.relation, node.name, target));
        }
        Ok(())
    }

    async fn converge_mac(&self, node: &NodeRecord, desired: &DesiredNode, pass: &mut Pass, log: &mut ReconcileLog) -> Result<(), ReconcileError> {
        let Some(mac) = desired.mac else {
            return Ok(());
        };
        if self.repository.mac(node).await? == Some(mac) {
            return Ok(());
        }

        self.repository
            .set_mac(node, mac)
            .await
            .map_err(|source| ReconcileError::FieldMutationFailed {
                field: "mac".to_string(),
                value: mac.to_string(),
                source,
            })?;
        pass.changed = true;
        log.info(format!("Changed mac of node {} to {}", node.name, mac));
        Ok(())
    }

    /// Assign desired addresses that are not configured yet.
    ///
    /// Configured addresses that are no longer desired stay in place.
    async fn converge_ips(&self, node: &NodeRecord, desired: &DesiredNode, pass: &mut Pass, log: &mut ReconcileLog) -> Result<(), ReconcileError> {
        for iface in &desired.interfaces {
            let mut configured = HashSet::new();
            for family in IpFamily::ALL {
                if let Some(ip) = self.repository.ip(node, &iface.name, family).await? {
                    configured.insert(ip);
                }
            }

            let wanted = iface.unique_ips();
            for ip in configured.iter().filter(|ip| !wanted.contains(ip)) {
                log.warn(format!("{} is configured on {}/{} but not desired; addresses are never removed", ip, node.name, iface.name));
            }

            for ip in wanted {
                if configured.contains(&ip) {
                    continue;
                }
                self.repository
                    .set_ip(node, &iface.name, ip)
                    .await
                    .map_err(|source| ReconcileError::IpAssignmentFailed {
                        ip,
                        interface: iface.name.clone(),
                        source,
                    })?;
                pass.changed = true;
                log.info(format!("Assigned {} to {}/{}", ip, node.name, iface.name));
            }
        }
        Ok(())
    }
}
