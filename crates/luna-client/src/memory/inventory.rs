//! Serializable inventory held by the in-memory repository

use crate::models::{InterfaceView, MacAddress, NodeView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the in-memory repository knows: groups, switches and nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub groups: BTreeMap<String, StoredGroup>,
    #[serde(default)]
    pub switches: BTreeSet<String>,
    #[serde(default)]
    pub nodes: BTreeMap<String, StoredNode>,
}

/// Node group; nodes created in it get one interface per name listed here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGroup {
    #[serde(default)]
    pub interfaces: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub localboot: bool,
    pub setupbmc: bool,
    pub service: bool,
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceView>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl StoredNode {
    pub fn view(&self, name: &str) -> NodeView {
        NodeView {
            name: name.to_string(),
            group: self.group.clone(),
            switch: self.switch.clone(),
            port: self.port.clone(),
            mac: self.mac,
            comment: self.comment.clone(),
            localboot: self.localboot,
            setupbmc: self.setupbmc,
            service: self.service,
            interfaces: self.interfaces.clone(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
