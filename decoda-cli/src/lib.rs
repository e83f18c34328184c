#![warn(missing_docs)]
//! decoda CLI Library
//!
//! Command-line front end of the conformance framework: discovers the
//! `decoda.toml` configuration, builds the configured decoders, and
//! drives the download pipeline and the execution scheduler.

mod config;
mod decoders;
mod progress;
mod scheduler;

pub use config::{DecodaConfig, DecoderEntry, DownloadSection, RunnerSection};
pub use decoders::{CommandDecoder, build_decoders, find_decoder};
pub use progress::{ConsoleProgress, NullProgress, ProgressSink};
pub use scheduler::{RunOptions, SchedulerError, effective_jobs, run_suite, select_vectors};

use clap::{Parser, Subcommand};
use decoda_assets::{DownloadOptions, VectorStore};
use decoda_core::{Decoder, TestSuite};
use std::path::{Path, PathBuf};

/// decoda CLI arguments
#[derive(Parser, Debug)]
#[command(name = "decoda")]
#[command(author, version, about = "decoda - conformance test runner for codec decoders")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured decoders and the given suites
    List {
        /// Suite definition files to summarize
        suites: Vec<PathBuf>,
    },
    /// Download and extract the assets of one or more suites
    Download {
        /// Suite definition files
        #[arg(required = true)]
        suites: Vec<PathBuf>,

        /// Number of parallel download workers
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Trust cached files without checksum verification
        #[arg(long)]
        no_verify: bool,

        /// Unpack every archive member instead of only the input file
        #[arg(long)]
        extract_all: bool,

        /// Keep archives on disk after extraction
        #[arg(long)]
        keep_archive: bool,

        /// Root directory for downloaded assets
        #[arg(long)]
        resources_dir: Option<PathBuf>,
    },
    /// Run one or more suites against a decoder
    Run {
        /// Suite definition files
        #[arg(required = true)]
        suites: Vec<PathBuf>,

        /// Decoder name from the configuration
        #[arg(short, long)]
        decoder: String,

        /// Number of parallel test workers
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-test timeout (e.g. "30s", "2m")
        #[arg(long)]
        timeout: Option<String>,

        /// Stop after the first failing test (sequential mode only)
        #[arg(long)]
        failfast: bool,

        /// Progress marks only, no per-test lines
        #[arg(short, long)]
        quiet: bool,

        /// Directory for decoder working files
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Record fresh reference digests into the suite files
        #[arg(long)]
        reference: bool,

        /// Run only the named vectors (case-insensitive, repeatable)
        #[arg(long = "vector", value_name = "NAME")]
        vectors: Vec<String>,

        /// Keep decoder output files after the run
        #[arg(long)]
        keep_files: bool,

        /// Root directory holding downloaded assets
        #[arg(long)]
        resources_dir: Option<PathBuf>,
    },
}

/// Run the decoda CLI. Main entry point of the `decoda` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the decoda CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("decoda=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("decoda=info")
            .init();
    }

    let config = DecodaConfig::discover().unwrap_or_default();

    match cli.command {
        Commands::List { suites } => list(&config, &suites),
        Commands::Download {
            suites,
            jobs,
            no_verify,
            extract_all,
            keep_archive,
            resources_dir,
        } => {
            let options = DownloadOptions {
                jobs: jobs.unwrap_or(config.download.jobs),
                out_dir: resources_dir
                    .unwrap_or_else(|| PathBuf::from(&config.download.resources_dir)),
                verify: !no_verify && config.download.verify,
                extract_all: extract_all || config.download.extract_all,
                keep_archive: keep_archive || config.download.keep_archive,
            };
            download(&suites, &options)
        }
        Commands::Run {
            suites,
            decoder,
            jobs,
            timeout,
            failfast,
            quiet,
            results_dir,
            reference,
            vectors,
            keep_files,
            resources_dir,
        } => {
            let timeout = DecodaConfig::parse_duration(
                timeout.as_deref().unwrap_or(&config.runner.timeout),
            )?;
            let options = RunOptions {
                jobs: jobs.unwrap_or(config.runner.jobs),
                timeout,
                failfast: failfast || config.runner.failfast,
                quiet: quiet || config.runner.quiet,
                results_dir: results_dir
                    .unwrap_or_else(|| PathBuf::from(&config.runner.results_dir)),
                reference,
                vector_filter: vectors,
                keep_files: keep_files || config.runner.keep_files,
            };
            let resources_dir = resources_dir
                .unwrap_or_else(|| PathBuf::from(&config.download.resources_dir));
            run_suites(&config, &suites, &decoder, &resources_dir, &options)
        }
    }
}

fn list(config: &DecodaConfig, suites: &[PathBuf]) -> anyhow::Result<()> {
    let decoders = build_decoders(&config.decoders)?;
    if decoders.is_empty() {
        println!("No decoders configured; add [[decoders]] entries to decoda.toml");
    } else {
        println!("Decoders:");
        for decoder in &decoders {
            let mark = if decoder.check_run() { "✓" } else { "✗" };
            let hw = if decoder.hw_acceleration() { " [hw]" } else { "" };
            println!("  {mark} {} ({}){hw}", decoder.name(), decoder.codec());
        }
    }

    if !suites.is_empty() {
        println!("\nSuites:");
        for path in suites {
            let suite = TestSuite::load(path, ".")?;
            println!(
                "  {} ({}): {} - {} test vectors",
                suite.name,
                suite.codec,
                suite.description,
                suite.vectors.len()
            );
        }
    }
    Ok(())
}

fn download(suites: &[PathBuf], options: &DownloadOptions) -> anyhow::Result<()> {
    let store = VectorStore::new();
    for path in suites {
        let suite = TestSuite::load(path, &options.out_dir)?;
        println!(
            "Downloading test suite {} using {} parallel jobs",
            suite.name, options.jobs
        );
        store.download(&suite, options)?;
    }
    println!("All downloads finished");
    Ok(())
}

fn run_suites(
    config: &DecodaConfig,
    suites: &[PathBuf],
    decoder_name: &str,
    resources_dir: &Path,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let decoders = build_decoders(&config.decoders)?;
    let decoder = find_decoder(&decoders, decoder_name).ok_or_else(|| {
        let available: Vec<&str> = decoders.iter().map(|d| d.name()).collect();
        anyhow::anyhow!(
            "unknown decoder '{decoder_name}'; configured: {}",
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        )
    })?;

    let progress = ConsoleProgress;
    let mut failures = 0usize;

    for path in suites {
        let suite = TestSuite::load(path, resources_dir)?;
        if suite.codec != decoder.codec() {
            println!(
                "Skipping test suite {}: decoder {} handles {}, suite is {}",
                suite.name,
                decoder.name(),
                decoder.codec(),
                suite.codec
            );
            continue;
        }
        if let Some(run) = run_suite(&suite, decoder, options, &progress)? {
            let summary = run.summary();
            // Vectors failfast left unexecuted count against the run too.
            failures += summary.total - summary.passed;
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
