//! Test suites and their persisted form.
//!
//! A [`TestSuite`] is the immutable definition a run works against. The
//! on-disk representation is a separate pair of schema structs
//! ([`SuiteFile`] / [`VectorRecord`]) so that runtime-only state (the
//! path the suite was loaded from, the resources directory) can never
//! leak into a persisted file.

use crate::codec::Codec;
use crate::run::SuiteRun;
use crate::vector::TestVector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading or saving a suite file.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The suite file could not be read or written.
    #[error("suite file {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The suite file is not valid JSON or violates the schema.
    #[error("malformed suite file {path}: {source}")]
    Malformed {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Two vectors in one suite share a name, making lookup ambiguous.
    #[error("duplicate test vector '{0}' in suite")]
    DuplicateVector(String),
}

/// A named, ordered collection of test vectors for one codec.
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name, used as the directory name for its assets.
    pub name: String,
    /// Codec all vectors in this suite exercise.
    pub codec: Codec,
    /// Human-readable description.
    pub description: String,
    /// Ordered vectors; names are unique within the suite.
    pub vectors: Vec<TestVector>,
    /// Path this suite was loaded from. Runtime-only, never persisted.
    pub path: PathBuf,
    /// Root directory holding downloaded assets. Runtime-only, never
    /// persisted.
    pub resources_dir: PathBuf,
}

impl TestSuite {
    /// Build a suite in memory, validating vector-name uniqueness.
    pub fn new(
        name: impl Into<String>,
        codec: Codec,
        description: impl Into<String>,
        vectors: Vec<TestVector>,
    ) -> Result<Self, SuiteError> {
        check_unique_names(&vectors)?;
        Ok(TestSuite {
            name: name.into(),
            codec,
            description: description.into(),
            vectors,
            path: PathBuf::new(),
            resources_dir: PathBuf::new(),
        })
    }

    /// Load a suite definition from a JSON file.
    ///
    /// `resources_dir` is the root under which
    /// `suite_name/vector_name/` asset directories live.
    pub fn load(
        path: impl AsRef<Path>,
        resources_dir: impl AsRef<Path>,
    ) -> Result<Self, SuiteError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SuiteFile =
            serde_json::from_str(&data).map_err(|source| SuiteError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let mut suite = file.into_suite()?;
        suite.path = path.to_path_buf();
        suite.resources_dir = resources_dir.as_ref().to_path_buf();
        Ok(suite)
    }

    /// Persist the full suite definition to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SuiteError> {
        self.write_file(path.as_ref(), SuiteFile::from_suite(self))
    }

    /// Persist the suite with the results of `run` folded in.
    ///
    /// Only the vectors the run selected are written, in suite order.
    /// For each, the recorded reference digest replaces `result` and the
    /// run's diagnostics replace `errors`. This is the reference-run
    /// overwrite: the file at `path` is replaced in place.
    pub fn save_with_run(&self, run: &SuiteRun, path: impl AsRef<Path>) -> Result<(), SuiteError> {
        let test_vectors = run
            .selected()
            .iter()
            .filter_map(|name| self.vector(name))
            .map(|vector| {
                let mut record = VectorRecord::from_vector(vector);
                if let Some(verdict) = run.verdict(&vector.name) {
                    if let Some(digest) = &verdict.output_checksum {
                        record.result = Some(digest.clone());
                    }
                    record.errors = verdict.diagnostics.clone();
                }
                record
            })
            .collect();
        let file = SuiteFile {
            name: self.name.clone(),
            codec: self.codec,
            description: self.description.clone(),
            test_vectors,
        };
        self.write_file(path.as_ref(), file)
    }

    /// Look up a vector by name.
    pub fn vector(&self, name: &str) -> Option<&TestVector> {
        self.vectors.iter().find(|v| v.name == name)
    }

    fn write_file(&self, path: &Path, file: SuiteFile) -> Result<(), SuiteError> {
        let json = serde_json::to_string_pretty(&file).map_err(|source| SuiteError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Persisted form of a suite file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteFile {
    /// Suite name.
    pub name: String,
    /// Canonical codec name.
    pub codec: Codec,
    /// Human-readable description.
    pub description: String,
    /// Persisted vector records.
    pub test_vectors: Vec<VectorRecord>,
}

impl SuiteFile {
    /// Convert into the runtime model, validating name uniqueness.
    /// Runtime-only fields are left empty for the caller to fill.
    pub fn into_suite(self) -> Result<TestSuite, SuiteError> {
        let vectors: Vec<TestVector> = self
            .test_vectors
            .into_iter()
            .map(VectorRecord::into_vector)
            .collect();
        check_unique_names(&vectors)?;
        Ok(TestSuite {
            name: self.name,
            codec: self.codec,
            description: self.description,
            vectors,
            path: PathBuf::new(),
            resources_dir: PathBuf::new(),
        })
    }

    /// Project the runtime model to its persisted fields.
    pub fn from_suite(suite: &TestSuite) -> Self {
        SuiteFile {
            name: suite.name.clone(),
            codec: suite.codec,
            description: suite.description.clone(),
            test_vectors: suite.vectors.iter().map(VectorRecord::from_vector).collect(),
        }
    }
}

/// Persisted form of one test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Vector name.
    pub name: String,
    /// Asset URL.
    pub source: String,
    /// Expected digest of the downloaded asset.
    pub source_checksum: String,
    /// Bitstream file inside the asset.
    pub input_file: String,
    /// Reference digest of the decoded output.
    #[serde(default)]
    pub result: Option<String>,
    /// Diagnostics from the last persisted run.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl VectorRecord {
    /// Convert a persisted record into the runtime vector.
    pub fn into_vector(self) -> TestVector {
        TestVector {
            name: self.name,
            source: self.source,
            source_checksum: self.source_checksum,
            input_file: self.input_file,
            result: self.result,
            errors: self.errors,
        }
    }

    /// Project a runtime vector to its persisted fields.
    pub fn from_vector(vector: &TestVector) -> Self {
        VectorRecord {
            name: vector.name.clone(),
            source: vector.source.clone(),
            source_checksum: vector.source_checksum.clone(),
            input_file: vector.input_file.clone(),
            result: vector.result.clone(),
            errors: vector.errors.clone(),
        }
    }
}

fn check_unique_names(vectors: &[TestVector]) -> Result<(), SuiteError> {
    let mut seen = HashSet::new();
    for vector in vectors {
        if !seen.insert(vector.name.as_str()) {
            return Err(SuiteError::DuplicateVector(vector.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::SuiteRun;
    use crate::vector::{TestOutcome, TestStatus};
    use tempfile::tempdir;

    fn vector(name: &str) -> TestVector {
        TestVector {
            name: name.to_string(),
            source: format!("https://vectors.example.com/{name}.tar.gz"),
            source_checksum: "0".repeat(64),
            input_file: format!("{name}.bin"),
            result: None,
            errors: Vec::new(),
        }
    }

    fn sample_suite() -> TestSuite {
        TestSuite::new(
            "jvt-avc",
            Codec::H264,
            "JVT AVC conformance vectors",
            vec![vector("AUD_MW_E"), vector("BA1_FT_C")],
        )
        .unwrap()
    }

    #[test]
    fn round_trip_preserves_persisted_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jvt-avc.json");
        let mut suite = sample_suite();
        suite.vectors[0].result = Some("deadbeef".to_string());
        suite.vectors[0].errors = vec!["previous failure".to_string()];
        suite.save(&path).unwrap();

        let loaded = TestSuite::load(&path, dir.path()).unwrap();
        assert_eq!(loaded.name, suite.name);
        assert_eq!(loaded.codec, Codec::H264);
        assert_eq!(loaded.vectors.len(), 2);
        assert_eq!(loaded.vectors[0].result.as_deref(), Some("deadbeef"));
        assert_eq!(loaded.vectors[0].errors, vec!["previous failure"]);
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.resources_dir, dir.path());
    }

    #[test]
    fn runtime_fields_never_reach_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.json");
        let mut suite = sample_suite();
        suite.resources_dir = PathBuf::from("/private/resources");
        suite.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("resources_dir"));
        assert!(!raw.contains("/private/resources"));
        assert!(!raw.contains("\"path\""));
    }

    #[test]
    fn duplicate_vector_names_are_rejected() {
        let err = TestSuite::new(
            "dup",
            Codec::Vp9,
            "",
            vec![vector("clip"), vector("clip")],
        )
        .unwrap_err();
        assert!(matches!(err, SuiteError::DuplicateVector(name) if name == "clip"));
    }

    #[test]
    fn unknown_codec_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"name":"x","codec":"MPEG-7","description":"","test_vectors":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            TestSuite::load(&path, dir.path()),
            Err(SuiteError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_result_and_errors_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("minimal.json");
        fs::write(
            &path,
            r#"{"name":"s","codec":"AV1","description":"","test_vectors":[
                {"name":"v","source":"https://e/v.zip","source_checksum":"00","input_file":"v.ivf"}
            ]}"#,
        )
        .unwrap();
        let suite = TestSuite::load(&path, dir.path()).unwrap();
        assert!(suite.vectors[0].result.is_none());
        assert!(suite.vectors[0].errors.is_empty());
    }

    #[test]
    fn save_with_run_records_fresh_digests_for_selected_subset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.json");
        let suite = sample_suite();

        // Run covered only the first vector.
        let mut run = SuiteRun::new(&suite.name, vec!["AUD_MW_E".to_string()]);
        run.absorb(TestOutcome {
            vector: "AUD_MW_E".to_string(),
            status: TestStatus::Passed,
            diagnostics: Vec::new(),
            output_checksum: Some("cafe".to_string()),
        })
        .unwrap();
        suite.save_with_run(&run, &path).unwrap();

        let reloaded = TestSuite::load(&path, dir.path()).unwrap();
        assert_eq!(reloaded.vectors.len(), 1);
        assert_eq!(reloaded.vectors[0].name, "AUD_MW_E");
        assert_eq!(reloaded.vectors[0].result.as_deref(), Some("cafe"));
        assert!(reloaded.vectors[0].errors.is_empty());
    }
}
