//! Mock oracle for tests and offline runs.
//!
//! Scripted per-node children, optional per-node failures, optional
//! artificial latency (for racing two chains in tests), and call recording
//! so tests can assert ordering and mutual exclusion.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::OracleError;
use crate::tree::EquipmentNode;

use super::{CandidateNode, ExpansionOracle};

/// Scripted oracle: children looked up by parent *name*, since engine-side
/// ids are assigned fresh and unknowable to a test script.
///
/// **Interaction**: implements `ExpansionOracle`; stands in for the real
/// client in `ExpansionEngine` tests and the CLI demo path.
pub struct MockOracle {
    initial: Option<CandidateNode>,
    children_by_name: HashMap<String, Vec<CandidateNode>>,
    default_children: Vec<CandidateNode>,
    fail_names: HashSet<String>,
    latency: Option<Duration>,
    urs: String,
    expanded: Mutex<Vec<String>>,
    known_names_seen: Mutex<Vec<Vec<String>>>,
    expand_calls: AtomicUsize,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            initial: None,
            children_by_name: HashMap::new(),
            default_children: Vec::new(),
            fail_names: HashSet::new(),
            latency: None,
            urs: "# User Requirements Specification\n(mock)".to_string(),
            expanded: Mutex::new(Vec::new()),
            known_names_seen: Mutex::new(Vec::new()),
            expand_calls: AtomicUsize::new(0),
        }
    }

    /// Scripts the initial-analysis response (builder).
    pub fn with_initial(mut self, root: CandidateNode) -> Self {
        self.initial = Some(root);
        self
    }

    /// Scripts children for expansions of the node with this name (builder).
    pub fn with_children_for(
        mut self,
        parent_name: impl Into<String>,
        children: Vec<CandidateNode>,
    ) -> Self {
        self.children_by_name.insert(parent_name.into(), children);
        self
    }

    /// Children returned for any unscripted node; default is none (leaf).
    pub fn with_default_children(mut self, children: Vec<CandidateNode>) -> Self {
        self.default_children = children;
        self
    }

    /// Makes expansions of the named node fail (builder).
    pub fn failing_for(mut self, parent_name: impl Into<String>) -> Self {
        self.fail_names.insert(parent_name.into());
        self
    }

    /// Adds artificial latency to every call (builder; for race tests).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Scripts the URS document (builder).
    pub fn with_urs(mut self, urs: impl Into<String>) -> Self {
        self.urs = urs.into();
        self
    }

    /// Number of `expand_children` calls issued so far.
    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    /// Names of the nodes expanded, in call order.
    pub fn expanded_names(&self) -> Vec<String> {
        self.expanded.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// The known-names context received by each `expand_children` call, in
    /// call order; lets tests assert duplicate-suppression growth.
    pub fn known_names_seen(&self) -> Vec<Vec<String>> {
        self.known_names_seen
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpansionOracle for MockOracle {
    async fn analyze_initial_problem(&self, _problem: &str) -> Result<CandidateNode, OracleError> {
        self.simulate_latency().await;
        self.initial
            .clone()
            .ok_or_else(|| OracleError::GenerationFailed("no initial response scripted".into()))
    }

    async fn expand_children(
        &self,
        node: &EquipmentNode,
        known_names: &[String],
    ) -> Result<Vec<CandidateNode>, OracleError> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.expanded.lock() {
            log.push(node.name.clone());
        }
        if let Ok(mut log) = self.known_names_seen.lock() {
            log.push(known_names.to_vec());
        }
        self.simulate_latency().await;
        if self.fail_names.contains(&node.name) {
            return Err(OracleError::GenerationFailed(format!(
                "scripted failure for {}",
                node.name
            )));
        }
        Ok(self
            .children_by_name
            .get(&node.name)
            .cloned()
            .unwrap_or_else(|| self.default_children.clone()))
    }

    async fn generate_urs(&self, _tree: &serde_json::Value) -> Result<String, OracleError> {
        self.simulate_latency().await;
        Ok(self.urs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    /// **Scenario**: unscripted initial analysis fails; scripted one returns the root.
    #[tokio::test]
    async fn initial_analysis_requires_script() {
        let empty = MockOracle::new();
        assert!(empty.analyze_initial_problem("anything").await.is_err());

        let scripted = MockOracle::new()
            .with_initial(CandidateNode::new("Workcell", NodeKind::Root, "root"));
        let root = scripted.analyze_initial_problem("anything").await.unwrap();
        assert_eq!(root.name, "Workcell");
    }

    /// **Scenario**: expansions record call order and honor per-name scripts and failures.
    #[tokio::test]
    async fn expansion_scripts_and_failures() {
        let oracle = MockOracle::new()
            .with_children_for(
                "Robot",
                vec![CandidateNode::new("Gripper", NodeKind::Required, "")],
            )
            .failing_for("Centrifuge");

        let robot = EquipmentNode::new("Robot", NodeKind::Required, "");
        let children = oracle.expand_children(&robot, &[]).await.unwrap();
        assert_eq!(children.len(), 1);

        let centrifuge = EquipmentNode::new("Centrifuge", NodeKind::Required, "");
        assert!(oracle.expand_children(&centrifuge, &[]).await.is_err());

        let unscripted = EquipmentNode::new("Reader", NodeKind::Compatible, "");
        assert!(oracle.expand_children(&unscripted, &[]).await.unwrap().is_empty());

        assert_eq!(oracle.expand_calls(), 3);
        assert_eq!(oracle.expanded_names(), ["Robot", "Centrifuge", "Reader"]);
    }
}
