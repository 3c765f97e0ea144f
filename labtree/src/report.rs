//! Report-ready snapshot serialization.
//!
//! The URS generator receives the whole tree as JSON. Nodes with empty
//! `children` drop the field entirely (and `is_generating` is never
//! serialized), keeping the payload bounded for large partially expanded
//! trees.

use std::sync::Arc;

use crate::tree::EquipmentNode;

/// Serializes a snapshot for document generation.
pub fn report_value(root: &Arc<EquipmentNode>) -> serde_json::Value {
    serde_json::to_value(root).unwrap_or(serde_json::Value::Null)
}
