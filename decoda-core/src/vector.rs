//! Test vectors and per-test outcomes.

use std::fmt;

/// One named sample input plus its recorded reference result.
///
/// The definition fields (`name`, `source`, `source_checksum`,
/// `input_file`) are immutable by convention. `result` and `errors`
/// carry the baseline recorded by the last reference run; they are only
/// rewritten on disk when a reference run persists the suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVector {
    /// Vector name, unique within its suite.
    pub name: String,
    /// URL of the sample asset.
    pub source: String,
    /// Expected SHA-256 digest of the downloaded asset.
    pub source_checksum: String,
    /// Bitstream file handed to the decoder, relative to the vector's
    /// resource directory.
    pub input_file: String,
    /// Reference digest of the decoded output, if one has been recorded.
    pub result: Option<String>,
    /// Diagnostics recorded by the last persisted run.
    pub errors: Vec<String>,
}

/// Status of one executed conformance test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// Decoded output matched the reference (or a fresh reference was
    /// recorded).
    Passed,
    /// Decoding succeeded but the output did not match the reference.
    Failed,
    /// The test could not produce an output to compare (missing input,
    /// decoder crash, timeout).
    Error,
}

impl TestStatus {
    /// Whether this status counts as a success.
    pub fn is_pass(self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            TestStatus::Passed => "pass",
            TestStatus::Failed => "fail",
            TestStatus::Error => "error",
        };
        f.write_str(word)
    }
}

/// Result of executing one [`ConformanceTest`](crate::ConformanceTest).
///
/// Outcomes are associated with their vector by name, never by position:
/// parallel completion order is non-deterministic.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// Name of the vector this outcome belongs to.
    pub vector: String,
    /// Pass/fail/error classification.
    pub status: TestStatus,
    /// Ordered diagnostic messages; empty on a clean pass.
    pub diagnostics: Vec<String>,
    /// Digest of the decoded output, when one was produced.
    pub output_checksum: Option<String>,
}

impl TestOutcome {
    /// Outcome for a test that never produced a comparable output.
    pub fn error(vector: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        TestOutcome {
            vector: vector.into(),
            status: TestStatus::Error,
            diagnostics: vec![diagnostic.into()],
            output_checksum: None,
        }
    }
}
