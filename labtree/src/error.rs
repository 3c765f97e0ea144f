//! Error types for the expansion oracle and engine.
//!
//! The taxonomy is deliberately small: transient rate limits are retried
//! inside the oracle client and only surface as `RateLimited` once the retry
//! budget is exhausted; a node id missing from the current snapshot is never
//! an error (it is an `ExpandOutcome` in the engine, since it only happens on
//! benign races with tree resets).

use thiserror::Error;

/// Failure from one oracle call, after any internal retries.
///
/// Returned by `ExpansionOracle` implementations. The engine reacts to any
/// variant the same way: reset the node's lock and report upward.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Quota/429 failures persisted through the whole retry budget.
    #[error("rate limited after {attempts} attempts: {message}")]
    RateLimited { attempts: usize, message: String },

    /// Transport failure or unusable model output.
    #[error("generation failed: {0}")]
    GenerationFailed(String),
}

/// Engine-level error.
///
/// Per-node failures during an automatic expansion chain are *not* errors —
/// they are counted in `DrainReport` and the affected node stays retryable.
/// `EngineError` covers the operations that have a single caller to fail:
/// initial analysis and report generation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Operation needs a tree (e.g. report generation) but none is loaded.
    #[error("no tree loaded")]
    NoTree,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of RateLimited includes the attempt count and message.
    #[test]
    fn oracle_error_display_rate_limited() {
        let err = OracleError::RateLimited {
            attempts: 3,
            message: "quota exceeded".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("3 attempts"), "got: {}", s);
        assert!(s.contains("quota exceeded"), "got: {}", s);
    }

    /// **Scenario**: OracleError converts into EngineError::Oracle via From.
    #[test]
    fn engine_error_from_oracle_error() {
        let err: EngineError = OracleError::GenerationFailed("bad json".to_string()).into();
        assert!(err.to_string().contains("generation failed"));
        assert!(err.to_string().contains("bad json"));
    }
}
