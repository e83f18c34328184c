//! The vector store: suite asset materialization.

use crate::archive::{extract, is_extractable};
use crate::error::AssetError;
use crate::fetch::{Fetcher, HttpFetcher, url_basename};
use decoda_core::{TestSuite, TestVector, sha256_file};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Options of one download invocation.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Number of parallel download workers.
    pub jobs: usize,
    /// Root directory for downloaded assets.
    pub out_dir: PathBuf,
    /// Verify cached files against their recorded checksum before
    /// deciding to skip the transfer.
    pub verify: bool,
    /// Unpack every archive member instead of only the input file.
    pub extract_all: bool,
    /// Keep archives on disk after extraction.
    pub keep_archive: bool,
}

/// Per-vector unit of download work. Built at dispatch time, worker
/// private, discarded after the task completes.
struct DownloadTask<'a> {
    dest_dir: PathBuf,
    verify: bool,
    extract_all: bool,
    keep_archive: bool,
    vector: &'a TestVector,
}

/// Downloads, verifies and extracts the assets of a test suite.
pub struct VectorStore {
    fetcher: Box<dyn Fetcher>,
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore {
    /// Store backed by the HTTP fetcher.
    pub fn new() -> Self {
        VectorStore {
            fetcher: Box::new(HttpFetcher),
        }
    }

    /// Store with a custom transport (offline tests).
    pub fn with_fetcher(fetcher: Box<dyn Fetcher>) -> Self {
        VectorStore { fetcher }
    }

    /// Materialize every asset of `suite` under
    /// `out_dir/suite_name/vector_name/`.
    ///
    /// Tasks run on a fixed-size pool of `jobs` workers, one task per
    /// dispatch slot. The first task failure aborts the whole call;
    /// already-completed sibling downloads stay on disk.
    pub fn download(&self, suite: &TestSuite, options: &DownloadOptions) -> Result<(), AssetError> {
        fs::create_dir_all(&options.out_dir)
            .map_err(|e| AssetError::io(&options.out_dir, e))?;

        let tasks: Vec<DownloadTask> = suite
            .vectors
            .iter()
            .map(|vector| DownloadTask {
                dest_dir: options.out_dir.join(&suite.name).join(&vector.name),
                verify: options.verify,
                extract_all: options.extract_all,
                keep_archive: options.keep_archive,
                vector,
            })
            .collect();

        let jobs = options.jobs.max(1);
        info!(
            suite = %suite.name,
            vectors = tasks.len(),
            jobs,
            "downloading test suite"
        );

        let pb = ProgressBar::new(tasks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        if jobs == 1 || tasks.len() <= 1 {
            for task in &tasks {
                pb.set_message(task.vector.name.clone());
                self.run_task(task)?;
                pb.inc(1);
            }
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(jobs.min(tasks.len()))
                .build()
                .map_err(|e| AssetError::Pool(e.to_string()))?;

            // One task per dispatch slot: max_len(1) disables rayon's
            // chunking so progress stays granular and per-worker memory
            // stays bounded.
            let outcomes: Vec<Result<(), AssetError>> = pool.install(|| {
                tasks
                    .par_iter()
                    .with_max_len(1)
                    .map(|task| {
                        let result = self.run_task(task);
                        pb.inc(1);
                        result
                    })
                    .collect()
            });

            for outcome in outcomes {
                outcome?;
            }
        }

        pb.finish_with_message("all downloads finished");
        Ok(())
    }

    /// Download and extract one vector.
    fn run_task(&self, task: &DownloadTask) -> Result<(), AssetError> {
        let vector = task.vector;
        fs::create_dir_all(&task.dest_dir).map_err(|e| AssetError::io(&task.dest_dir, e))?;

        let name = url_basename(&vector.source).ok_or_else(|| AssetError::Fetch {
            url: vector.source.clone(),
            reason: "URL has no file name".to_string(),
        })?;
        let dest_path = task.dest_dir.join(name);

        // Skip the transfer iff the file is present and, when verifying,
        // its digest matches the recorded source checksum.
        let mut cached = dest_path.is_file();
        if cached && task.verify {
            let digest = sha256_file(&dest_path).map_err(|e| AssetError::io(&dest_path, e))?;
            if digest != vector.source_checksum {
                debug!(vector = %vector.name, "cached file digest mismatch, refetching");
                cached = false;
            }
        }

        if !cached {
            debug!(vector = %vector.name, url = %vector.source, "fetching");
            self.fetcher.fetch(&vector.source, &task.dest_dir)?;
        }

        if is_extractable(&dest_path) {
            debug!(vector = %vector.name, "extracting {}", dest_path.display());
            let member = (!task.extract_all).then_some(vector.input_file.as_str());
            extract(&dest_path, &task.dest_dir, member)?;
            if !task.keep_archive {
                fs::remove_file(&dest_path).map_err(|e| AssetError::io(&dest_path, e))?;
            }
        }

        Ok(())
    }
}
