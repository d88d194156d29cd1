//! Field descriptor tables
//!
//! Convergence walks these tables in order; the position of a field in its
//! table is the order it is checked in.

use luna_client::{FieldValue, NodeField, Relation};
use node_spec::DesiredNode;

/// Scalar field and how to read its desired value
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub field: NodeField,
    pub desired: fn(&DesiredNode) -> Option<FieldValue>,
}

/// Relational field and how to read its desired target
#[derive(Debug, Clone, Copy)]
pub struct RelationDescriptor {
    pub relation: Relation,
    pub desired: for<'a> fn(&'a DesiredNode) -> Option<&'a str>,
}

pub fn scalar_fields() -> [FieldDescriptor; 5] {
    [
        FieldDescriptor {
            field: NodeField::Localboot,
            desired: |d| d.localboot.map(FieldValue::Flag),
        },
        FieldDescriptor {
            field: NodeField::Setupbmc,
            desired: |d| d.setupbmc.map(FieldValue::Flag),
        },
        FieldDescriptor {
            field: NodeField::Service,
            desired: |d| d.service.map(FieldValue::Flag),
        },
        FieldDescriptor {
            field: NodeField::Port,
            desired: |d| d.port.clone().map(FieldValue::Text),
        },
        FieldDescriptor {
            field: NodeField::Comment,
            desired: |d| d.comment.clone().map(FieldValue::Text),
        },
    ]
}

/// Empty targets count as unset
pub fn relational_fields() -> [RelationDescriptor; 2] {
    [
        RelationDescriptor {
            relation: Relation::Group,
            desired: DesiredNode::group,
        },
        RelationDescriptor {
            relation: Relation::Switch,
            desired: desired_switch,
        },
    ]
}

fn desired_switch(desired: &DesiredNode) -> Option<&str> {
    desired.switch.as_deref().filter(|s| !s.is_empty())
}
