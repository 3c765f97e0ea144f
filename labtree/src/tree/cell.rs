//! Shared "latest snapshot" cell.
//!
//! The tree snapshot is the single piece of shared mutable state. `TreeCell`
//! wraps a `tokio::sync::watch` channel: `snapshot()` reads the latest value,
//! `send_modify` is the single-writer publish point, and the presentation
//! layer observes changes through `subscribe()`.
//!
//! The per-node expansion lock is `try_begin_generating`: the check of
//! `is_generating`/children and the flag set happen inside one `send_modify`
//! closure, so two chains racing on the same node cannot both acquire it.
//! Code that crosses an await must re-read through `snapshot()` (or mutate
//! through [`TreeCell::update`]) rather than hold a pre-await value.

use std::sync::Arc;

use tokio::sync::watch;

use super::{store, EquipmentNode};

/// Result of a lock attempt on one node.
///
/// Only `Acquired` lets the caller proceed to the oracle; every other
/// variant is a silent no-op at the user level.
#[derive(Debug, Clone)]
pub enum LockAttempt {
    /// Lock taken; carries the node value as published (with `is_generating` set).
    Acquired(Arc<EquipmentNode>),
    /// Another expansion for this node is already in flight.
    Busy,
    /// The node already has children; re-expansion is not allowed.
    AlreadyExpanded,
    /// No tree, or the id is absent from the current snapshot.
    NotFound,
}

/// Holder of the latest tree snapshot.
pub struct TreeCell {
    tx: watch::Sender<Option<Arc<EquipmentNode>>>,
}

impl TreeCell {
    /// Creates an empty cell (no tree loaded).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Returns the latest snapshot, or None when no tree is loaded.
    pub fn snapshot(&self) -> Option<Arc<EquipmentNode>> {
        self.tx.borrow().clone()
    }

    /// Subscribes to snapshot changes (read-only view for the presentation layer).
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<EquipmentNode>>> {
        self.tx.subscribe()
    }

    /// Publishes a whole new tree (initial analysis, demo load).
    pub fn publish(&self, root: Arc<EquipmentNode>) {
        self.tx.send_replace(Some(root));
    }

    /// Drops the current tree.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Atomically acquires the expansion lock for `id`: checks the *latest*
    /// snapshot, and on success publishes a new snapshot with the node marked
    /// `is_generating` before returning — so any racing caller observes the
    /// lock before the oracle call is even issued.
    pub fn try_begin_generating(&self, id: &str) -> LockAttempt {
        let mut outcome = LockAttempt::NotFound;
        self.tx.send_modify(|slot| {
            let Some(root) = slot.as_ref() else {
                return;
            };
            let Some(node) = store::find(root, id) else {
                return;
            };
            if node.is_generating {
                outcome = LockAttempt::Busy;
                return;
            }
            if !node.children.is_empty() {
                outcome = LockAttempt::AlreadyExpanded;
                return;
            }
            let mut locked = (**node).clone();
            locked.is_generating = true;
            let locked = Arc::new(locked);
            *slot = Some(store::replace(root, (*locked).clone()));
            outcome = LockAttempt::Acquired(locked);
        });
        outcome
    }

    /// Re-resolves `id` against the latest snapshot and publishes the tree
    /// with `f(node)` in its place. Returns false when the node (or the whole
    /// tree) has disappeared, in which case nothing is published.
    pub fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&EquipmentNode) -> EquipmentNode,
    {
        let mut updated = false;
        let mut f = Some(f);
        self.tx.send_modify(|slot| {
            let Some(root) = slot.as_ref() else {
                return;
            };
            let Some(node) = store::find(root, id) else {
                return;
            };
            if let Some(f) = f.take() {
                *slot = Some(store::replace(root, f(node)));
                updated = true;
            }
        });
        updated
    }
}

impl Default for TreeCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn one_node_tree(name: &str) -> Arc<EquipmentNode> {
        Arc::new(EquipmentNode::new(name, NodeKind::Root, "root"))
    }

    /// **Scenario**: an empty cell has no snapshot; lock attempts are NotFound.
    #[test]
    fn empty_cell_reports_not_found() {
        let cell = TreeCell::new();
        assert!(cell.snapshot().is_none());
        assert!(matches!(
            cell.try_begin_generating("anything"),
            LockAttempt::NotFound
        ));
        assert!(!cell.update("anything", |n| n.clone()));
    }

    /// **Scenario**: the lock is visible in the published snapshot immediately
    /// after acquisition, and a second attempt on the same node is Busy.
    #[test]
    fn lock_publishes_before_second_attempt() {
        let cell = TreeCell::new();
        let root = one_node_tree("Workcell");
        let id = root.id.clone();
        cell.publish(root);

        match cell.try_begin_generating(&id) {
            LockAttempt::Acquired(node) => assert!(node.is_generating),
            other => panic!("expected Acquired, got {other:?}"),
        }
        let snap = cell.snapshot().unwrap();
        assert!(snap.is_generating, "lock must be in the published snapshot");

        assert!(matches!(cell.try_begin_generating(&id), LockAttempt::Busy));
    }

    /// **Scenario**: a node with children cannot be locked for re-expansion.
    #[test]
    fn populated_node_is_already_expanded() {
        let cell = TreeCell::new();
        let child = Arc::new(EquipmentNode::new("Robot", NodeKind::Required, ""));
        let root = Arc::new(
            EquipmentNode::new("Workcell", NodeKind::Root, "").with_children(vec![child]),
        );
        let id = root.id.clone();
        cell.publish(root);
        assert!(matches!(
            cell.try_begin_generating(&id),
            LockAttempt::AlreadyExpanded
        ));
    }

    /// **Scenario**: update re-resolves by id and publishes; clear makes later updates no-ops.
    #[test]
    fn update_publishes_and_clear_invalidates() {
        let cell = TreeCell::new();
        let root = one_node_tree("Workcell");
        let id = root.id.clone();
        cell.publish(root);

        assert!(cell.update(&id, |n| {
            let mut n = n.clone();
            n.description = "updated".to_string();
            n
        }));
        assert_eq!(cell.snapshot().unwrap().description, "updated");

        cell.clear();
        assert!(!cell.update(&id, |n| n.clone()));
        assert!(cell.snapshot().is_none());
    }

    /// **Scenario**: subscribers observe published snapshots.
    #[tokio::test]
    async fn subscriber_sees_published_tree() {
        let cell = TreeCell::new();
        let mut rx = cell.subscribe();
        let root = one_node_tree("Workcell");
        cell.publish(Arc::clone(&root));
        rx.changed().await.unwrap();
        let seen = rx.borrow().clone().unwrap();
        assert_eq!(seen.id, root.id);
    }
}
