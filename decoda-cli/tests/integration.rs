//! Integration tests for decoda
//!
//! These exercise the end-to-end flow: suite file on disk → download
//! pipeline → scheduler → verdicts → reference rewrite, using a real
//! subprocess decoder (`cp`) and an offline fetcher.

use decoda_assets::{AssetError, DownloadOptions, Fetcher, VectorStore, url_basename};
use decoda_cli::{CommandDecoder, DecoderEntry, NullProgress, RunOptions, run_suite};
use decoda_core::{TestStatus, TestSuite, sha256_file};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

/// A decoder that "decodes" by copying the bitstream verbatim.
fn copy_decoder() -> CommandDecoder {
    CommandDecoder::from_entry(&DecoderEntry {
        name: "copy".to_string(),
        codec: "VP9".to_string(),
        command: "cp".to_string(),
        args: vec!["{input}".to_string(), "{output}".to_string()],
        hw_acceleration: false,
    })
    .unwrap()
}

fn digest_of(content: &[u8]) -> String {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    sha256_file(file.path()).unwrap()
}

/// Lay out a suite file plus its already-downloaded assets.
fn write_suite(
    root: &Path,
    vectors: &[(&str, &[u8], Option<String>)],
) -> (PathBuf, PathBuf) {
    let resources = root.join("resources");
    let mut records = Vec::new();
    for (name, content, result) in vectors {
        let vector_dir = resources.join("smoke-suite").join(name);
        fs::create_dir_all(&vector_dir).unwrap();
        fs::write(vector_dir.join(format!("{name}.ivf")), content).unwrap();
        let result_field = match result {
            Some(digest) => format!("\"{digest}\""),
            None => "null".to_string(),
        };
        records.push(format!(
            r#"{{"name":"{name}","source":"https://vectors.example.com/{name}.ivf",
               "source_checksum":"{}","input_file":"{name}.ivf","result":{result_field},"errors":[]}}"#,
            digest_of(content)
        ));
    }
    let suite_path = root.join("smoke-suite.json");
    fs::write(
        &suite_path,
        format!(
            r#"{{"name":"smoke-suite","codec":"VP9","description":"integration fixture","test_vectors":[{}]}}"#,
            records.join(",")
        ),
    )
    .unwrap();
    (suite_path, resources)
}

fn options(root: &Path, jobs: usize) -> RunOptions {
    RunOptions {
        jobs,
        timeout: Duration::from_secs(10),
        failfast: false,
        quiet: false,
        results_dir: root.join("results"),
        reference: false,
        vector_filter: Vec::new(),
        keep_files: false,
    }
}

/// Run a mixed suite with a real subprocess decoder on two workers.
#[test]
fn parallel_run_with_subprocess_decoder() {
    let dir = tempdir().unwrap();
    let (suite_path, resources) = write_suite(
        dir.path(),
        &[
            ("good", b"matching frames", Some(digest_of(b"matching frames"))),
            ("bad", b"frames", Some("0123456789abcdef".to_string())),
        ],
    );

    let suite = TestSuite::load(&suite_path, &resources).unwrap();
    let decoder = copy_decoder();
    let run = run_suite(&suite, &decoder, &options(dir.path(), 2), &NullProgress)
        .unwrap()
        .expect("decoder is runnable");

    assert!(run.is_complete());
    assert_eq!(run.verdict("good").unwrap().status, TestStatus::Passed);
    assert_eq!(run.verdict("bad").unwrap().status, TestStatus::Failed);
    let summary = run.summary();
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed + summary.failed, summary.total);
}

/// A reference run records digests; a subsequent normal run passes.
#[test]
fn reference_run_establishes_a_passing_baseline() {
    let dir = tempdir().unwrap();
    let (suite_path, resources) =
        write_suite(dir.path(), &[("clip", b"decoded frames", None)]);

    let suite = TestSuite::load(&suite_path, &resources).unwrap();
    let decoder = copy_decoder();

    // Fresh suite with no baseline: a normal run fails.
    let run = run_suite(&suite, &decoder, &options(dir.path(), 1), &NullProgress)
        .unwrap()
        .unwrap();
    assert_eq!(run.verdict("clip").unwrap().status, TestStatus::Failed);

    // Reference run rewrites the suite file in place.
    let mut reference_options = options(dir.path(), 1);
    reference_options.reference = true;
    run_suite(&suite, &decoder, &reference_options, &NullProgress)
        .unwrap()
        .unwrap();

    // The rewritten file now carries the digest; a normal run passes.
    let suite = TestSuite::load(&suite_path, &resources).unwrap();
    assert_eq!(
        suite.vectors[0].result.as_deref(),
        Some(digest_of(b"decoded frames").as_str())
    );
    let run = run_suite(&suite, &decoder, &options(dir.path(), 1), &NullProgress)
        .unwrap()
        .unwrap();
    assert_eq!(run.verdict("clip").unwrap().status, TestStatus::Passed);
}

/// Offline fetcher serving canned bytes per URL.
struct CannedFetcher {
    content: Vec<u8>,
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, AssetError> {
        let name = url_basename(url).expect("fixture URLs have file names");
        let dest = dest_dir.join(name);
        fs::write(&dest, &self.content).unwrap();
        Ok(dest)
    }
}

/// Full pipeline: download materializes the asset, then the run
/// consumes it.
#[test]
fn download_then_run() {
    let dir = tempdir().unwrap();
    let resources = dir.path().join("resources");
    let content = b"bitstream payload".to_vec();

    let suite_path = dir.path().join("dl-suite.json");
    fs::write(
        &suite_path,
        format!(
            r#"{{"name":"dl-suite","codec":"VP9","description":"","test_vectors":[
                {{"name":"clip","source":"https://vectors.example.com/clip.ivf",
                  "source_checksum":"{}","input_file":"clip.ivf",
                  "result":"{}","errors":[]}}
            ]}}"#,
            digest_of(&content),
            digest_of(&content)
        ),
    )
    .unwrap();

    let suite = TestSuite::load(&suite_path, &resources).unwrap();
    let store = VectorStore::with_fetcher(Box::new(CannedFetcher {
        content: content.clone(),
    }));
    store
        .download(
            &suite,
            &DownloadOptions {
                jobs: 2,
                out_dir: resources.clone(),
                verify: true,
                extract_all: false,
                keep_archive: false,
            },
        )
        .unwrap();
    assert!(resources.join("dl-suite/clip/clip.ivf").is_file());

    let decoder = copy_decoder();
    let run = run_suite(&suite, &decoder, &options(dir.path(), 1), &NullProgress)
        .unwrap()
        .unwrap();
    assert_eq!(run.verdict("clip").unwrap().status, TestStatus::Passed);
}

/// The vector filter narrows the run to the named subset.
#[test]
fn filtered_run_selects_case_insensitively() {
    let dir = tempdir().unwrap();
    let (suite_path, resources) = write_suite(
        dir.path(),
        &[
            ("Alpha", b"a", Some(digest_of(b"a"))),
            ("Beta", b"b", Some(digest_of(b"b"))),
        ],
    );

    let suite = TestSuite::load(&suite_path, &resources).unwrap();
    let decoder = copy_decoder();
    let mut opts = options(dir.path(), 1);
    opts.vector_filter = vec!["alpha".to_string()];

    let run = run_suite(&suite, &decoder, &opts, &NullProgress)
        .unwrap()
        .unwrap();
    assert_eq!(run.selected(), ["Alpha".to_string()]);
    assert_eq!(run.summary().total, 1);
}
