//! Expansion oracle: the external generative service that suggests equipment.
//!
//! The engine only sees this trait; implementations are `OpenAiOracle` (real
//! OpenAI-compatible Chat Completions endpoint) and `MockOracle` (scripted
//! responses for tests and examples).
//!
//! # Contract notes
//!
//! `expand_children` keeps the observed ambiguity of the original service:
//! a transport/API failure (after the internal retry budget) is an `Err`,
//! but *syntactically unusable content* yields `Ok(vec![])` — callers cannot
//! distinguish a true leaf from a parse failure, and must not try.

mod mock;
mod openai;
mod retry;

pub use mock::MockOracle;
pub use openai::OpenAiOracle;
pub use retry::RetryPolicy;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OracleError;
use crate::tree::{EquipmentNode, NodeKind};

/// One suggested node as returned by the oracle, before the engine accepts it.
///
/// Oracle-supplied `id`s are parsed but never used — they may collide or be
/// absent; the engine assigns a fresh uuid on merge. `specs` values arrive as
/// raw JSON because models frequently emit nulls or numbers for spec fields.
///
/// **Interaction**: produced by `ExpansionOracle` implementations, consumed
/// by `engine::materialize`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateNode {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub children: Vec<CandidateNode>,
}

impl CandidateNode {
    /// Creates a candidate with no specs or children (tests, demos).
    pub fn new(name: impl Into<String>, kind: NodeKind, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            description: description.into(),
            specs: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Sets one spec entry (builder).
    pub fn with_spec(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.specs
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Sets immediate children (builder; used for initial-analysis responses).
    pub fn with_children(mut self, children: Vec<CandidateNode>) -> Self {
        self.children = children;
        self
    }
}

/// External generative service supplying candidate nodes. Opaque, latent,
/// rate-limited; the engine serializes calls against it.
#[async_trait]
pub trait ExpansionOracle: Send + Sync {
    /// One-shot initial analysis: a root candidate with its immediate
    /// children. Fails on transport failure or malformed output.
    async fn analyze_initial_problem(&self, problem: &str) -> Result<CandidateNode, OracleError>;

    /// Suggests new children for `node`, avoiding `known_names`. `Ok(vec![])`
    /// means "leaf or unusable content" (see module docs); `Err` means the
    /// call itself failed and the node should stay retryable.
    async fn expand_children(
        &self,
        node: &EquipmentNode,
        known_names: &[String],
    ) -> Result<Vec<CandidateNode>, OracleError>;

    /// Generates a User Requirements Specification document from a
    /// serialized tree snapshot (empty-children nodes already omitted).
    async fn generate_urs(&self, tree: &serde_json::Value) -> Result<String, OracleError>;
}
