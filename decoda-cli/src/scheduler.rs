//! Test execution scheduling.
//!
//! Drives one suite against one decoder, in one of two modes:
//!
//! - **Sequential** (`jobs == 1`): bindings run in suite order inside
//!   the calling thread; `failfast` aborts the remainder after the
//!   first non-pass.
//! - **Parallel** (`jobs > 1`): each binding runs to completion on an
//!   independent worker of a fixed-size pool and reports back over a
//!   bounded channel; the coordinator drains exactly one message per
//!   dispatched binding before proceeding (a full barrier: no partial
//!   results are consumed). `failfast` has no effect here.
//!
//! Decoders driving hardware contexts are forced to sequential
//! execution: concurrent hardware decoding contexts are assumed unsafe
//! to share, so correctness trumps throughput.

use crate::progress::ProgressSink;
use decoda_core::{
    ConformanceTest, Decoder, RunError, SuiteError, SuiteRun, TestOutcome, TestStatus, TestSuite,
    TestVector,
};
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort a suite run outright. Individual test failures are
/// never errors; they land in the run's verdicts.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The results working directory could not be prepared.
    #[error("results directory {path}: {source}")]
    Workdir {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be built.
    #[error("failed to build run pool: {0}")]
    Pool(String),

    /// A worker produced an outcome the run cannot place.
    #[error(transparent)]
    Merge(#[from] RunError),

    /// The reference suite file could not be rewritten.
    #[error(transparent)]
    Suite(#[from] SuiteError),
}

/// Options of one run invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Requested parallel workers; may be overridden to 1.
    pub jobs: usize,
    /// Per-test timeout, enforced by each binding independently.
    pub timeout: Duration,
    /// Abort remaining bindings after the first non-pass (sequential
    /// mode only).
    pub failfast: bool,
    /// Progress marks only, no per-test lines.
    pub quiet: bool,
    /// Root directory for decoder working files.
    pub results_dir: PathBuf,
    /// Record fresh reference digests and rewrite the suite file.
    pub reference: bool,
    /// Run only vectors whose name matches one of these,
    /// case-insensitively. Empty selects everything.
    pub vector_filter: Vec<String>,
    /// Keep decoder output files and the working directory.
    pub keep_files: bool,
}

/// Effective worker count after the hardware-acceleration override.
pub fn effective_jobs(decoder: &dyn Decoder, requested: usize) -> usize {
    let requested = requested.max(1);
    if decoder.hw_acceleration() && requested > 1 {
        1
    } else {
        requested
    }
}

/// Vectors selected by a case-insensitive name filter, in suite order.
pub fn select_vectors<'a>(suite: &'a TestSuite, filter: &[String]) -> Vec<&'a TestVector> {
    if filter.is_empty() {
        return suite.vectors.iter().collect();
    }
    let wanted: Vec<String> = filter.iter().map(|name| name.to_lowercase()).collect();
    suite
        .vectors
        .iter()
        .filter(|vector| {
            let name = vector.name.to_lowercase();
            wanted.iter().any(|w| *w == name)
        })
        .collect()
}

/// Run `suite` against `decoder`.
///
/// Returns `Ok(None)` when the decoder's readiness probe fails: the
/// suite is skipped without producing a results directory, and the
/// caller moves on to its next suite. All other paths return the
/// completed [`SuiteRun`].
pub fn run_suite(
    suite: &TestSuite,
    decoder: &dyn Decoder,
    options: &RunOptions,
    progress: &dyn ProgressSink,
) -> Result<Option<SuiteRun>, SchedulerError> {
    let jobs = effective_jobs(decoder, options.jobs);
    if jobs != options.jobs.max(1) {
        progress.line(&format!(
            "decoder {} uses hardware acceleration, using 1 job automatically",
            decoder.name()
        ));
    }

    let mut banner = format!(
        "Running test suite {} with decoder {}",
        suite.name,
        decoder.name()
    );
    if !options.vector_filter.is_empty() {
        banner.push_str(&format!(
            " and test vectors {}",
            options.vector_filter.join(", ")
        ));
    }
    banner.push_str(&format!(" using {jobs} parallel jobs"));
    progress.line(&banner);

    if !decoder.check_run() {
        progress.line(&format!(
            "Skipping decoder {} because it cannot be run",
            decoder.name()
        ));
        return Ok(None);
    }

    let workdir = options.results_dir.join(&suite.name).join("test_results");
    fs::create_dir_all(&workdir).map_err(|source| SchedulerError::Workdir {
        path: workdir.clone(),
        source,
    })?;

    let selected = select_vectors(suite, &options.vector_filter);
    let tests: Vec<ConformanceTest> = selected
        .iter()
        .map(|vector| {
            ConformanceTest::new(
                decoder,
                suite,
                vector,
                &workdir,
                options.reference,
                options.timeout,
                options.keep_files,
            )
        })
        .collect();
    let mut run = SuiteRun::new(
        &suite.name,
        selected.iter().map(|v| v.name.clone()).collect(),
    );
    info!(
        suite = %suite.name,
        decoder = %decoder.name(),
        selected = tests.len(),
        jobs,
        "starting run"
    );

    let start = Instant::now();
    if jobs == 1 {
        run_sequential(&tests, options, progress, &mut run)?;
    } else {
        run_parallel(&tests, jobs, progress, &mut run)?;
    }
    run.elapsed = start.elapsed();

    let summary = run.summary();
    progress.line(&format!(
        "Ran {}/{} tests successfully in {:.3} secs",
        summary.passed,
        summary.total,
        run.elapsed.as_secs_f64()
    ));

    if options.reference {
        suite.save_with_run(&run, &suite.path)?;
        progress.line(&format!(
            "Updated reference results in {}",
            suite.path.display()
        ));
    }

    if !options.keep_files {
        // Best-effort cleanup; an abnormal termination may leave it.
        if let Err(err) = fs::remove_dir_all(&workdir) {
            warn!("could not remove {}: {err}", workdir.display());
        }
    }

    Ok(Some(run))
}

fn run_sequential(
    tests: &[ConformanceTest],
    options: &RunOptions,
    progress: &dyn ProgressSink,
    run: &mut SuiteRun,
) -> Result<(), SchedulerError> {
    for test in tests {
        let outcome = test.execute();
        let status = outcome.status;
        report_outcome(&outcome, options.quiet, progress);
        run.absorb(outcome)?;
        if options.failfast && !status.is_pass() {
            progress.line("Stopping after first failure (failfast)");
            break;
        }
    }
    Ok(())
}

fn report_outcome(outcome: &TestOutcome, quiet: bool, progress: &dyn ProgressSink) {
    if quiet {
        progress.mark(outcome.status);
        return;
    }
    let word = match outcome.status {
        TestStatus::Passed => "ok",
        TestStatus::Failed => "FAIL",
        TestStatus::Error => "ERROR",
    };
    progress.line(&format!("{} ... {word}", outcome.vector));
    for diagnostic in &outcome.diagnostics {
        progress.line(&format!("    {diagnostic}"));
    }
}

fn run_parallel(
    tests: &[ConformanceTest],
    jobs: usize,
    progress: &dyn ProgressSink,
    run: &mut SuiteRun,
) -> Result<(), SchedulerError> {
    let total = tests.len();
    if total == 0 {
        return Ok(());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs.min(total))
        .build()
        .map_err(|e| SchedulerError::Pool(e.to_string()))?;

    // Each worker owns exactly one binding and sends one completion
    // message; the coordinator drains exactly `total` messages before
    // leaving the scope. The channel is bounded to the pool width.
    let (tx, rx) = mpsc::sync_channel::<TestOutcome>(jobs);
    let mut outcomes: Vec<TestOutcome> = Vec::with_capacity(total);

    pool.in_place_scope(|scope| {
        for test in tests {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let outcome = test.execute();
                progress.mark(outcome.status);
                // The coordinator outlives every worker; a send can only
                // fail if it already bailed out, in which case the
                // outcome is dropped along with the run.
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        for _ in 0..total {
            match rx.recv() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => break,
            }
        }
    });

    // End the advisory mark stream before the diagnostics block.
    progress.line("");

    for outcome in &outcomes {
        for diagnostic in &outcome.diagnostics {
            progress.line(diagnostic);
        }
    }
    for outcome in outcomes {
        run.absorb(outcome)?;
    }
    Ok(())
}
