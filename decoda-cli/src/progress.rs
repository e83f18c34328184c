//! Run progress reporting.
//!
//! The scheduler never prints directly; it reports through a
//! [`ProgressSink`] so it can be exercised in tests without stdout
//! coupling. Marks are advisory feedback only; interleaving across
//! parallel workers is expected and carries no meaning beyond "one more
//! test finished".

use decoda_core::TestStatus;
use std::io::{self, Write};

/// Observer for run progress.
pub trait ProgressSink: Send + Sync {
    /// One test finished; emit its advisory mark.
    fn mark(&self, status: TestStatus);

    /// One full line of run output.
    fn line(&self, text: &str);
}

/// Sink writing the classic progress stream to stdout: `.` for a pass,
/// `x` for anything else, flushed immediately.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn mark(&self, status: TestStatus) {
        let mark = if status.is_pass() { '.' } else { 'x' };
        print!("{mark}");
        let _ = io::stdout().flush();
    }

    fn line(&self, text: &str) {
        println!("{text}");
    }
}

/// Sink that swallows everything.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn mark(&self, _status: TestStatus) {}

    fn line(&self, _text: &str) {}
}
