//! Expansion controller: grows the shared tree one node at a time.
//!
//! Each node walks Unexpanded → Generating → Expanded-WithChildren /
//! Expanded-Empty; a failed oracle call drops it back to Unexpanded so a
//! later click can retry it.
//!
//! Automatic recursion is an explicit work queue, not call-stack recursion:
//! a FIFO of `(node_id, depth)` entries drained by one loop, one outstanding
//! oracle call at a time, with a fixed delay between steps. The delay is a
//! backpressure policy against the oracle's request quota; concurrent
//! fan-out is deliberately rejected. Newly discovered `Required` children
//! are pushed to the *front* in order, so the drain order is depth-first,
//! matching the recursion it replaces.
//!
//! A user click starts an independent chain; chains racing on the same node
//! are serialized by the per-node lock in [`TreeCell::try_begin_generating`],
//! acquired and published before the oracle call is issued.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::inventory;
use crate::oracle::{CandidateNode, ExpansionOracle};
use crate::report;
use crate::tree::cell::{LockAttempt, TreeCell};
use crate::tree::{store, EquipmentNode, NodeKind};

/// Engine knobs. `LABTREE_MAX_DEPTH` and `LABTREE_STEP_DELAY_MS` override
/// the defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Recursion ceiling for automatic expansion; the only hard cutoff
    /// against unbounded suggestion chains from the oracle.
    pub max_depth: usize,
    /// Fixed delay between queue steps.
    pub step_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            step_delay: Duration::from_millis(300),
        }
    }
}

impl EngineConfig {
    /// Reads overrides from the environment; unset or unparseable values
    /// keep the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(depth) = std::env::var("LABTREE_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_depth = depth;
        }
        if let Some(ms) = std::env::var("LABTREE_STEP_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.step_delay = Duration::from_millis(ms);
        }
        config
    }
}

/// Result of one expansion attempt on one node.
///
/// Everything except `Expanded` is a guard no-op: silent for the user,
/// logged at debug level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Children merged; `required` lists the new child ids to auto-expand.
    Expanded {
        children: usize,
        required: Vec<String>,
    },
    /// Depth exceeded the recursion ceiling.
    DepthCeiling,
    /// Another expansion for this node is already in flight.
    Busy,
    /// The node already has children.
    AlreadyExpanded,
    /// No tree, or the node vanished (e.g. reset) — benign race, never an error.
    NotFound,
}

/// Summary of one queue drain (one expansion chain).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Nodes successfully expanded (possibly to zero children).
    pub expanded: usize,
    /// Guard no-ops (busy, populated, missing, depth ceiling).
    pub skipped: usize,
    /// Oracle failures; those nodes are back to Unexpanded and retryable.
    pub failed: usize,
}

/// The orchestration engine: owns the shared snapshot cell and the oracle.
///
/// All mutation goes through `initial_expand` / `on_node_clicked` (and the
/// demo loader); the presentation layer only ever gets read-only snapshots.
pub struct ExpansionEngine {
    oracle: Arc<dyn ExpansionOracle>,
    cell: TreeCell,
    config: EngineConfig,
}

impl ExpansionEngine {
    pub fn new(oracle: Arc<dyn ExpansionOracle>, config: EngineConfig) -> Self {
        Self {
            oracle,
            cell: TreeCell::new(),
            config,
        }
    }

    /// Latest tree snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<EquipmentNode>> {
        self.cell.snapshot()
    }

    /// Read-only change notifications for the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<EquipmentNode>>> {
        self.cell.subscribe()
    }

    /// Replaces the current tree wholesale (demo scenarios).
    pub fn load_tree(&self, root: Arc<EquipmentNode>) {
        self.cell.publish(root);
    }

    /// Drops the current tree.
    pub fn reset(&self) {
        self.cell.clear();
    }

    /// Initial analysis: asks the oracle for a root with immediate children,
    /// publishes it as the new tree, then auto-expands the root's `Required`
    /// children sequentially. The analysis failure itself is the one
    /// user-facing, retryable error; per-node failures afterwards are only
    /// counted in the report.
    pub async fn initial_expand(&self, problem: &str) -> Result<DrainReport, EngineError> {
        info!(problem, "initial analysis");
        let candidate = self.oracle.analyze_initial_problem(problem).await?;
        let root = Arc::new(materialize(candidate, Some(NodeKind::Root)));
        let seeds: Vec<(String, usize)> = root
            .children
            .iter()
            .filter(|c| c.kind == NodeKind::Required)
            .map(|c| (c.id.clone(), 0))
            .collect();
        let known: HashSet<String> = store::collect_names(&root).into_iter().collect();
        info!(
            root = %root.name,
            children = root.children.len(),
            auto = seeds.len(),
            "tree created"
        );
        self.cell.publish(root);
        Ok(self.drain(seeds, known).await)
    }

    /// Click callback from the presentation layer: expand a single childless
    /// node at depth 0, with duplicate-avoidance names collected from the
    /// entire current tree. Failures surface silently in-tree (the node
    /// reverts to its unexpanded affordance).
    pub async fn on_node_clicked(&self, node_id: &str) -> DrainReport {
        let Some(root) = self.cell.snapshot() else {
            return DrainReport::default();
        };
        let known: HashSet<String> = store::collect_names(&root).into_iter().collect();
        self.drain(vec![(node_id.to_string(), 0)], known).await
    }

    /// Generates the URS document for the current tree.
    pub async fn generate_report(&self) -> Result<String, EngineError> {
        let root = self.cell.snapshot().ok_or(EngineError::NoTree)?;
        let tree = report::report_value(&root);
        Ok(self.oracle.generate_urs(&tree).await?)
    }

    /// Drains one expansion chain: pop, delay (except before the first
    /// step), expand, schedule new `Required` children depth-first. Child
    /// *i* fully completes (success or failure) before child *i+1* starts.
    async fn drain(
        &self,
        seeds: Vec<(String, usize)>,
        mut known: HashSet<String>,
    ) -> DrainReport {
        let mut queue: VecDeque<(String, usize)> = seeds.into();
        let mut chain = DrainReport::default();
        let mut first = true;
        while let Some((id, depth)) = queue.pop_front() {
            if !first {
                tokio::time::sleep(self.config.step_delay).await;
            }
            first = false;
            match self.expand_one(&id, &mut known, depth).await {
                Ok(ExpandOutcome::Expanded { children, required }) => {
                    chain.expanded += 1;
                    debug!(node_id = %id, depth, children, queued = required.len(), "expanded");
                    for (i, child_id) in required.into_iter().enumerate() {
                        queue.insert(i, (child_id, depth + 1));
                    }
                }
                Ok(outcome) => {
                    chain.skipped += 1;
                    debug!(node_id = %id, depth, ?outcome, "expansion skipped");
                }
                Err(e) => {
                    chain.failed += 1;
                    warn!(node_id = %id, depth, error = %e, "expansion failed, node left retryable");
                }
            }
        }
        debug!(?chain, "expansion chain drained");
        chain
    }

    /// One node's expansion lifecycle: guards, lock-then-publish, oracle
    /// call, re-resolve against the latest snapshot, merge. On failure the
    /// lock is cleared and the error propagates to the drain loop.
    async fn expand_one(
        &self,
        id: &str,
        known: &mut HashSet<String>,
        depth: usize,
    ) -> Result<ExpandOutcome, EngineError> {
        if depth > self.config.max_depth {
            return Ok(ExpandOutcome::DepthCeiling);
        }

        // Lock and publish before the oracle call, so racing chains see it.
        let node = match self.cell.try_begin_generating(id) {
            LockAttempt::Acquired(node) => node,
            LockAttempt::Busy => return Ok(ExpandOutcome::Busy),
            LockAttempt::AlreadyExpanded => return Ok(ExpandOutcome::AlreadyExpanded),
            LockAttempt::NotFound => return Ok(ExpandOutcome::NotFound),
        };

        let names: Vec<String> = known.iter().cloned().collect();
        match self.oracle.expand_children(&node, &names).await {
            Ok(candidates) => {
                let children: Vec<Arc<EquipmentNode>> = candidates
                    .into_iter()
                    .map(|c| Arc::new(materialize(c, None)))
                    .collect();
                // Names join the shared set before any sibling expansion runs.
                for child in &children {
                    known.insert(child.name.clone());
                }
                let required: Vec<String> = children
                    .iter()
                    .filter(|c| c.kind == NodeKind::Required)
                    .map(|c| c.id.clone())
                    .collect();
                let count = children.len();

                // Re-resolve against the *current* snapshot; the tree may
                // have changed (or vanished) while the call was in flight.
                let merged = self.cell.update(id, |current| {
                    let mut updated = current.clone();
                    updated.children = children.clone();
                    updated.is_generating = false;
                    updated.is_expanded = true;
                    updated
                });
                if !merged {
                    return Ok(ExpandOutcome::NotFound);
                }
                Ok(ExpandOutcome::Expanded {
                    children: count,
                    required,
                })
            }
            Err(e) => {
                // Back to Unexpanded: clear the lock so a click can retry.
                self.cell.update(id, |current| {
                    let mut updated = current.clone();
                    updated.is_generating = false;
                    updated
                });
                Err(EngineError::Oracle(e))
            }
        }
    }
}

/// Accepts an oracle candidate into the tree: fresh engine-assigned id
/// (oracle ids are never reused), inventory tagging, string-valued specs
/// only, recursive materialization of any nested children. A candidate that
/// arrives with children is already expanded; one without is not.
pub(crate) fn materialize(candidate: CandidateNode, kind_override: Option<NodeKind>) -> EquipmentNode {
    let children: Vec<Arc<EquipmentNode>> = candidate
        .children
        .into_iter()
        .map(|c| Arc::new(materialize(c, None)))
        .collect();
    let specs = candidate
        .specs
        .into_iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect();
    EquipmentNode {
        id: uuid::Uuid::new_v4().to_string(),
        in_inventory: inventory::in_inventory(&candidate.name),
        kind: kind_override.unwrap_or(candidate.kind),
        is_expanded: !children.is_empty(),
        is_generating: false,
        name: candidate.name,
        description: candidate.description,
        specs,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: materialize assigns fresh ids, ignores oracle ids,
    /// tags inventory, keeps only string specs, and marks parents expanded.
    #[test]
    fn materialize_assigns_fresh_state() {
        let mut candidate = CandidateNode::new("Plate Handler", NodeKind::Required, "moves plates")
            .with_spec("vendor", "Thermo")
            .with_children(vec![CandidateNode::new(
                "Custom Fingers",
                NodeKind::Compatible,
                "",
            )]);
        candidate.id = Some("untrusted-oracle-id".to_string());
        candidate
            .specs
            .insert("capacity".to_string(), serde_json::Value::Null);

        let node = materialize(candidate, None);
        assert_ne!(node.id, "untrusted-oracle-id");
        assert!(node.in_inventory, "Handler is a stocked keyword");
        assert_eq!(node.specs.get("vendor").map(String::as_str), Some("Thermo"));
        assert!(!node.specs.contains_key("capacity"));
        assert!(node.is_expanded);
        assert_eq!(node.children.len(), 1);
        assert!(node.children[0].is_unexpanded());
        assert!(!node.children[0].in_inventory);
    }

    /// **Scenario**: the kind override forces ROOT regardless of what the oracle claimed.
    #[test]
    fn materialize_kind_override() {
        let candidate = CandidateNode::new("Workcell", NodeKind::Compatible, "");
        let node = materialize(candidate, Some(NodeKind::Root));
        assert_eq!(node.kind, NodeKind::Root);
    }

    /// **Scenario**: env overrides apply; junk values keep the defaults.
    #[test]
    fn engine_config_from_env_parses_overrides() {
        std::env::set_var("LABTREE_MAX_DEPTH", "4");
        std::env::set_var("LABTREE_STEP_DELAY_MS", "not-a-number");
        let config = EngineConfig::from_env();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.step_delay, Duration::from_millis(300));
        std::env::remove_var("LABTREE_MAX_DEPTH");
        std::env::remove_var("LABTREE_STEP_DELAY_MS");
    }
}
