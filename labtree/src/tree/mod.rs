//! Equipment dependency tree: node type and snapshot operations.
//!
//! A tree snapshot is one immutable `Arc<EquipmentNode>` value. Every state
//! change builds a new root that structurally shares untouched subtrees, so
//! concurrent readers never observe a partially updated node.
//!
//! - [`store`]: pure snapshot operations (`find`, `replace`, `collect_names`).
//! - [`cell`]: the shared "latest snapshot" cell with the per-node lock.

pub mod cell;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Dependency strength of a node. `Root` appears exactly once, at the root.
///
/// Serialized in the oracle wire format (`ROOT`/`REQUIRED`/`COMPATIBLE`).
/// `Required` children drive automatic recursive expansion; `Compatible`
/// children wait for a user click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Root,
    Required,
    #[default]
    Compatible,
}

/// One vertex of the equipment dependency tree.
///
/// `children` empty together with `is_expanded == false` means "not yet
/// expanded" — that absence is the sentinel that triggers on-demand
/// expansion. A node expanded to zero children keeps `is_expanded == true`
/// so it is distinguishable from an unexpanded one. `is_generating` is the
/// transient in-flight latch; it is process state, not part of the design,
/// and is skipped when serializing.
///
/// **Interaction**: produced by `engine::materialize` from oracle candidates
/// (ids are always engine-assigned uuids); read by the store ops and the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub specs: HashMap<String, String>,
    #[serde(default)]
    pub in_inventory: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<EquipmentNode>>,
    #[serde(default, skip_serializing)]
    pub is_generating: bool,
    #[serde(default)]
    pub is_expanded: bool,
}

impl EquipmentNode {
    /// Creates a node with a fresh uuid and no children.
    pub fn new(name: impl Into<String>, kind: NodeKind, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            description: description.into(),
            specs: HashMap::new(),
            in_inventory: false,
            children: Vec::new(),
            is_generating: false,
            is_expanded: false,
        }
    }

    /// Sets one spec entry (builder).
    pub fn with_spec(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.specs.insert(key.into(), value.into());
        self
    }

    /// Sets children and marks the node expanded (builder, used by demo trees).
    pub fn with_children(mut self, children: Vec<Arc<EquipmentNode>>) -> Self {
        self.is_expanded = !children.is_empty();
        self.children = children;
        self
    }

    /// Sets the inventory flag (builder).
    pub fn with_inventory(mut self, in_inventory: bool) -> Self {
        self.in_inventory = in_inventory;
        self
    }

    /// True when the node has never completed an expansion and has no children.
    pub fn is_unexpanded(&self) -> bool {
        self.children.is_empty() && !self.is_expanded
    }
}
