//! ASCII rendering of the equipment tree for the terminal.
//!
//! One line per node: kind marker, name, short id, then affordances —
//! `(stocked)` for inventory hits, `(+)` for expandable leaves,
//! `(generating...)` while an oracle call is in flight.

use labtree::{EquipmentNode, NodeKind};

fn marker(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root => "[*]",
        NodeKind::Required => "[R]",
        NodeKind::Compatible => "[C]",
    }
}

/// First 8 chars of the uuid; enough to disambiguate in practice and short
/// enough to type back into `expand`.
pub fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

fn describe(node: &EquipmentNode) -> String {
    let mut line = format!("{} {} [{}]", marker(node.kind), node.name, short_id(&node.id));
    if node.in_inventory {
        line.push_str("  (stocked)");
    }
    if node.is_generating {
        line.push_str("  (generating...)");
    } else if node.is_unexpanded() {
        line.push_str("  (+)");
    }
    line
}

pub fn render(root: &EquipmentNode) -> String {
    let mut out = String::new();
    out.push_str(&describe(root));
    out.push('\n');
    render_children(root, "", &mut out);
    out
}

fn render_children(node: &EquipmentNode, prefix: &str, out: &mut String) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { "└─ " } else { "├─ " });
        out.push_str(&describe(child));
        out.push('\n');
        let child_prefix = format!("{prefix}{}", if last { "   " } else { "│  " });
        render_children(child, &child_prefix, out);
    }
}
