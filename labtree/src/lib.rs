//! # Labtree
//!
//! LLM-assisted lab-automation design: describe a laboratory problem in
//! natural language and grow a dependency tree of required and optional
//! equipment, one expansion at a time.
//!
//! ## Design principles
//!
//! - **Immutable snapshots**: the tree is one `Arc<EquipmentNode>` value;
//!   every change publishes a new root with structural sharing, so readers
//!   never see a half-updated node.
//! - **One call in flight per chain**: automatic expansion is an explicit
//!   work queue drained one node at a time with a fixed delay — serialized
//!   backpressure against the oracle's quota, not an optimization target.
//! - **Per-node locking in the cell**: the `is_generating` latch is checked
//!   and set inside the shared cell's single-writer critical section, so two
//!   chains cannot expand the same node twice.
//! - **Oracle behind a trait**: [`ExpansionOracle`] with a real
//!   OpenAI-compatible client ([`OpenAiOracle`]) and a scripted
//!   [`MockOracle`] for tests and offline demos.
//!
//! ## Main modules
//!
//! - [`tree`]: [`EquipmentNode`], [`NodeKind`]; `tree::store` snapshot ops;
//!   `tree::cell` shared latest-snapshot cell with the per-node lock.
//! - [`engine`]: [`ExpansionEngine`], [`EngineConfig`], [`ExpandOutcome`],
//!   [`DrainReport`] — the expansion controller.
//! - [`oracle`]: [`ExpansionOracle`], [`CandidateNode`], [`OpenAiOracle`],
//!   [`MockOracle`], [`RetryPolicy`].
//! - [`prompts`]: system instruction and prompt builders.
//! - [`inventory`]: stocked-hardware tagging.
//! - [`report`]: report-ready snapshot serialization.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use labtree::{EngineConfig, ExpansionEngine, OpenAiOracle};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = Arc::new(OpenAiOracle::new("gpt-4o-mini"));
//! let engine = ExpansionEngine::new(oracle, EngineConfig::default());
//!
//! let chain = engine.initial_expand("automate a cell culture lab").await?;
//! println!("expanded {} nodes automatically", chain.expanded);
//!
//! if let Some(root) = engine.snapshot() {
//!     println!("{} ({} children)", root.name, root.children.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod inventory;
pub mod oracle;
pub mod prompts;
pub mod report;
pub mod tree;

pub use engine::{DrainReport, EngineConfig, ExpandOutcome, ExpansionEngine};
pub use error::{EngineError, OracleError};
pub use oracle::{CandidateNode, ExpansionOracle, MockOracle, OpenAiOracle, RetryPolicy};
pub use tree::cell::{LockAttempt, TreeCell};
pub use tree::{store, EquipmentNode, NodeKind};
