//! Desired node state
//!
//! One reconciliation pass reads a [`DesiredNode`] and never modifies it.

use luna_client::{IpFamily, MacAddress};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

/// Addresses wanted on one pre-existing interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DesiredInterface {
    /// Interface name; must already exist on the node
    pub name: String,

    /// IPv4 and/or IPv6 addresses to assign
    #[serde(default)]
    pub ip: Vec<IpAddr>,
}

impl DesiredInterface {
    pub fn new<I>(name: impl Into<String>, ip: I) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        Self {
            name: name.into(),
            ip: ip.into_iter().collect(),
        }
    }

    /// Requested addresses in request order, without repeats
    pub fn unique_ips(&self) -> Vec<IpAddr> {
        let mut seen = Vec::with_capacity(self.ip.len());
        for ip in &self.ip {
            if !seen.contains(ip) {
                seen.push(*ip);
            }
        }
        seen
    }

    /// First address family requested more than once
    ///
    /// Interfaces hold one address per family, so a second distinct address of
    /// the same family would replace the first on every pass.
    pub fn repeated_family(&self) -> Option<IpFamily> {
        let mut families = HashSet::new();
        self.unique_ips()
            .iter()
            .map(IpFamily::of)
            .find(|family| !families.insert(*family))
    }
}

/// Desired state of a single node
///
/// `None` means "leave as is", except for `group`, which is also required to
/// create a node that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredNode {
    pub name: String,
    pub group: Option<String>,
    pub comment: Option<String>,
    pub mac: Option<MacAddress>,
    pub switch: Option<String>,
    pub port: Option<String>,
    pub localboot: Option<bool>,
    pub setupbmc: Option<bool>,
    pub service: Option<bool>,
    pub interfaces: Vec<DesiredInterface>,
}

impl DesiredNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_interface(mut self, interface: DesiredInterface) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Group, if set to something non-empty
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }
}
