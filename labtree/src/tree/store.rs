//! Pure snapshot operations over the equipment tree.
//!
//! All three operations treat the tree as an immutable value. `replace` is
//! the only one that builds a new tree; it copies the path from the root to
//! the replaced node and shares every untouched subtree via `Arc` clones, so
//! the previous snapshot stays valid for concurrent readers.

use std::sync::Arc;

use super::EquipmentNode;

/// Pre-order depth-first search; returns the first node whose id matches.
///
/// The id-uniqueness invariant makes the first match the only match.
pub fn find<'a>(root: &'a Arc<EquipmentNode>, id: &str) -> Option<&'a Arc<EquipmentNode>> {
    if root.id == id {
        return Some(root);
    }
    for child in &root.children {
        if let Some(found) = find(child, id) {
            return Some(found);
        }
    }
    None
}

/// Returns a new tree where the node matching `updated.id` is structurally
/// replaced by `updated`. Ancestors are copied; siblings and unrelated
/// subtrees are shared. An absent id returns the input tree unchanged — a
/// stale id is a no-op, not an error.
pub fn replace(root: &Arc<EquipmentNode>, updated: EquipmentNode) -> Arc<EquipmentNode> {
    fn walk(node: &Arc<EquipmentNode>, updated: &EquipmentNode) -> Option<Arc<EquipmentNode>> {
        if node.id == updated.id {
            return Some(Arc::new(updated.clone()));
        }
        // Copy this node only if the target lives somewhere below it.
        for (i, child) in node.children.iter().enumerate() {
            if let Some(new_child) = walk(child, updated) {
                let mut copy = (**node).clone();
                copy.children[i] = new_child;
                return Some(Arc::new(copy));
            }
        }
        None
    }

    walk(root, &updated).unwrap_or_else(|| Arc::clone(root))
}

/// Collects every node's name in pre-order, including deeply nested
/// already-expanded subtrees. Used as the duplicate-avoidance context sent
/// to the oracle.
pub fn collect_names(root: &Arc<EquipmentNode>) -> Vec<String> {
    let mut names = Vec::new();
    fn walk(node: &Arc<EquipmentNode>, out: &mut Vec<String>) {
        out.push(node.name.clone());
        for child in &node.children {
            walk(child, out);
        }
    }
    walk(root, &mut names);
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn leaf(name: &str, kind: NodeKind) -> Arc<EquipmentNode> {
        Arc::new(EquipmentNode::new(name, kind, format!("desc {name}")))
    }

    fn sample_tree() -> Arc<EquipmentNode> {
        let gripper = leaf("Gripper", NodeKind::Required);
        let robot = Arc::new(
            EquipmentNode::new("Robot", NodeKind::Required, "arm")
                .with_children(vec![gripper]),
        );
        let reader = leaf("Reader", NodeKind::Compatible);
        Arc::new(
            EquipmentNode::new("Workcell", NodeKind::Root, "root")
                .with_children(vec![robot, reader]),
        )
    }

    /// **Scenario**: every id present in the tree is found; an absent id is None.
    #[test]
    fn find_hits_every_id_and_misses_absent() {
        let tree = sample_tree();
        let mut stack = vec![Arc::clone(&tree)];
        while let Some(node) = stack.pop() {
            let found = find(&tree, &node.id).expect("present id must be found");
            assert_eq!(found.id, node.id);
            stack.extend(node.children.iter().cloned());
        }
        assert!(find(&tree, "no-such-id").is_none());
    }

    /// **Scenario**: replace swaps a nested node, shares siblings, keeps the old snapshot intact.
    #[test]
    fn replace_copies_path_and_shares_siblings() {
        let tree = sample_tree();
        let gripper = find(&tree, &tree.children[0].children[0].id).unwrap();
        let mut updated = (**gripper).clone();
        updated.is_generating = true;

        let new_tree = replace(&tree, updated);

        // New snapshot sees the change, old one does not.
        assert!(find(&new_tree, &gripper.id).unwrap().is_generating);
        assert!(!find(&tree, &gripper.id).unwrap().is_generating);
        // Untouched sibling subtree is the same allocation.
        assert!(Arc::ptr_eq(&tree.children[1], &new_tree.children[1]));
        // Path to the target was copied.
        assert!(!Arc::ptr_eq(&tree.children[0], &new_tree.children[0]));
    }

    /// **Scenario**: replace with a stale id returns the input tree unchanged.
    #[test]
    fn replace_missing_id_is_noop() {
        let tree = sample_tree();
        let stranger = EquipmentNode::new("Stranger", NodeKind::Compatible, "");
        let out = replace(&tree, stranger);
        assert!(Arc::ptr_eq(&tree, &out));
    }

    /// **Scenario**: applying replace twice with the same node equals applying it once.
    #[test]
    fn replace_is_idempotent() {
        let tree = sample_tree();
        let robot = &tree.children[0];
        let mut updated = (**robot).clone();
        updated.description = "rail-mounted arm".to_string();

        let once = replace(&tree, updated.clone());
        let twice = replace(&once, updated);
        assert_eq!(*once, *twice);
    }

    /// **Scenario**: collect_names length equals the node count and contains every name.
    #[test]
    fn collect_names_visits_entire_tree() {
        let tree = sample_tree();
        let names = collect_names(&tree);
        assert_eq!(names.len(), 4);
        for expected in ["Workcell", "Robot", "Gripper", "Reader"] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }
}
