//! Engine error types.
//!
//! Most bad input is recovered silently at the configuration layer
//! (`dtwin_config`) by substituting defaults — see that crate's `sanitize`.
//! What's left here are the ways a fully-validated scenario can still fail
//! to produce a trace: a scenario that is internally inconsistent (only
//! reachable by constructing `Scenario` directly, bypassing `dtwin_config`),
//! and a non-finite-state guard that catches a runaway numeric blow-up.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("non-finite value in {field} at step {step}")]
    NonFiniteState { field: &'static str, step: usize },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_stable() {
        assert_eq!(
            EngineError::InvalidScenario("dt must be > 0".to_string()).to_string(),
            "invalid scenario: dt must be > 0"
        );
        assert_eq!(
            EngineError::NonFiniteState {
                field: "TT106",
                step: 42
            }
            .to_string(),
            "non-finite value in TT106 at step 42"
        );
    }
}
