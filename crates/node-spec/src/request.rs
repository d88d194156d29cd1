//! Node request document
//!
//! The declarative input of the `luna-node` binary: a desired node plus the
//! state it should be in. Accepted as YAML or JSON.

use crate::desired::{DesiredInterface, DesiredNode};
use luna_client::{IpFamily, MacAddress};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Whether the node should exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Present,
    Absent,
}

/// Request document describing one node
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NodeRequest {
    /// Node name (unique key)
    pub name: String,

    /// Group; required when the node does not exist yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Interfaces to assign addresses to; they must exist in the node's group
    #[serde(default)]
    pub interfaces: Vec<DesiredInterface>,

    /// Boot from local disk (default false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localboot: Option<bool>,

    /// Configure the BMC during install (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setupbmc: Option<bool>,

    /// Boot into service mode (default false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<bool>,

    /// Boot MAC address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub mac: Option<MacAddress>,

    /// Switch the node is cabled to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,

    /// Port on the switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    #[serde(default)]
    pub state: NodeState,
}

/// Reasons a request is refused before any repository call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("node name must not be empty")]
    EmptyName,

    #[error("interface name must not be empty")]
    EmptyInterfaceName,

    #[error("interface {0} is listed more than once")]
    DuplicateInterface(String),

    #[error("interface {interface} lists more than one {family} address")]
    RepeatedAddressFamily { interface: String, family: IpFamily },
}

impl NodeRequest {
    /// Parse a YAML or JSON request document
    pub fn from_yaml(document: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(document)
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.trim().is_empty() {
            return Err(RequestError::EmptyName);
        }
        let mut seen = HashSet::new();
        for iface in &self.interfaces {
            if iface.name.trim().is_empty() {
                return Err(RequestError::EmptyInterfaceName);
            }
            if !seen.insert(iface.name.as_str()) {
                return Err(RequestError::DuplicateInterface(iface.name.clone()));
            }
            if let Some(family) = iface.repeated_family() {
                return Err(RequestError::RepeatedAddressFamily {
                    interface: iface.name.clone(),
                    family,
                });
            }
        }
        Ok(())
    }

    /// Desired node with the flag defaults filled in
    ///
    /// Omitted flags are not "leave as is": like the luna playbook module,
    /// `localboot` and `service` default to false and `setupbmc` to true.
    pub fn into_desired(self) -> DesiredNode {
        DesiredNode {
            name: self.name,
            group: self.group,
            comment: self.comment,
            mac: self.mac,
            switch: self.switch,
            port: self.port,
            localboot: Some(self.localboot.unwrap_or(false)),
            setupbmc: Some(self.setupbmc.unwrap_or(true)),
            service: Some(self.service.unwrap_or(false)),
            interfaces: self.interfaces,
        }
    }
}
