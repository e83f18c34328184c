//! Run results and aggregation.
//!
//! A run never mutates the suite definition. Its state lives in a
//! [`SuiteRun`]: the selected vector names in suite order plus a verdict
//! map keyed by name. Keying by name (never by position) makes the merge
//! independent of completion order, which is non-deterministic when
//! workers run in parallel.

use crate::vector::{TestOutcome, TestStatus};
use fxhash::FxHashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while folding outcomes into a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// An outcome arrived for a vector the run never selected.
    #[error("outcome for unselected vector '{0}'")]
    UnknownVector(String),
}

/// Verdict for one executed vector.
#[derive(Debug, Clone)]
pub struct VectorVerdict {
    /// Pass/fail/error classification.
    pub status: TestStatus,
    /// Ordered diagnostics; empty on a clean pass.
    pub diagnostics: Vec<String>,
    /// Digest of the decoded output, when one was produced.
    pub output_checksum: Option<String>,
}

/// Pass/fail totals of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Vectors that passed.
    pub passed: usize,
    /// Vectors with a non-pass verdict.
    pub failed: usize,
    /// Vectors the run selected.
    pub total: usize,
}

/// Mutable result of one suite run.
#[derive(Debug, Clone)]
pub struct SuiteRun {
    /// Name of the suite that was run.
    pub suite_name: String,
    /// Wall-clock duration of the dispatch phase.
    pub elapsed: Duration,
    selected: Vec<String>,
    verdicts: FxHashMap<String, VectorVerdict>,
}

impl SuiteRun {
    /// Start an empty run over the given selection (suite order).
    pub fn new(suite_name: impl Into<String>, selected: Vec<String>) -> Self {
        SuiteRun {
            suite_name: suite_name.into(),
            elapsed: Duration::ZERO,
            verdicts: FxHashMap::default(),
            selected,
        }
    }

    /// Fold one outcome into the run, locating its vector by name.
    ///
    /// Feeding a set of outcomes in any permutation yields the same
    /// final state.
    pub fn absorb(&mut self, outcome: TestOutcome) -> Result<(), RunError> {
        if !self.selected.iter().any(|name| *name == outcome.vector) {
            return Err(RunError::UnknownVector(outcome.vector));
        }
        self.verdicts.insert(
            outcome.vector,
            VectorVerdict {
                status: outcome.status,
                diagnostics: outcome.diagnostics,
                output_checksum: outcome.output_checksum,
            },
        );
        Ok(())
    }

    /// Vector names this run selected, in suite order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Verdict for one vector, if it has been executed.
    pub fn verdict(&self, name: &str) -> Option<&VectorVerdict> {
        self.verdicts.get(name)
    }

    /// Whether every selected vector has a verdict. False after a
    /// failfast abort.
    pub fn is_complete(&self) -> bool {
        self.selected
            .iter()
            .all(|name| self.verdicts.contains_key(name))
    }

    /// Pass/fail totals over the selection.
    pub fn summary(&self) -> RunSummary {
        let passed = self
            .verdicts
            .values()
            .filter(|v| v.status.is_pass())
            .count();
        RunSummary {
            passed,
            failed: self.verdicts.len() - passed,
            total: self.selected.len(),
        }
    }
}
