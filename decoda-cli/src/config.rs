//! Configuration loading from decoda.toml
//!
//! Defaults can be specified in a `decoda.toml` file, discovered by
//! walking up from the current directory. CLI flags override anything
//! set here.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// decoda configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DecodaConfig {
    /// Download pipeline configuration
    #[serde(default)]
    pub download: DownloadSection,
    /// Test runner configuration
    #[serde(default)]
    pub runner: RunnerSection,
    /// Configured decoders
    #[serde(default)]
    pub decoders: Vec<DecoderEntry>,
}

/// Download pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSection {
    /// Root directory for downloaded assets
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,
    /// Number of parallel download workers
    #[serde(default = "default_download_jobs")]
    pub jobs: usize,
    /// Verify cached files against their recorded checksum
    #[serde(default = "default_verify")]
    pub verify: bool,
    /// Unpack every archive member instead of only the input file
    #[serde(default)]
    pub extract_all: bool,
    /// Keep archives on disk after extraction
    #[serde(default)]
    pub keep_archive: bool,
}

impl Default for DownloadSection {
    fn default() -> Self {
        Self {
            resources_dir: default_resources_dir(),
            jobs: default_download_jobs(),
            verify: default_verify(),
            extract_all: false,
            keep_archive: false,
        }
    }
}

fn default_resources_dir() -> String {
    "resources".to_string()
}
fn default_download_jobs() -> usize {
    4
}
fn default_verify() -> bool {
    true
}

/// Test runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSection {
    /// Number of parallel test workers
    #[serde(default = "default_run_jobs")]
    pub jobs: usize,
    /// Per-test timeout (e.g. "30s", "2m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Directory for decoder working files
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    /// Stop after the first failing test (sequential mode only)
    #[serde(default)]
    pub failfast: bool,
    /// Progress marks only, no per-test lines
    #[serde(default)]
    pub quiet: bool,
    /// Keep decoder output files after the run
    #[serde(default)]
    pub keep_files: bool,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            jobs: default_run_jobs(),
            timeout: default_timeout(),
            results_dir: default_results_dir(),
            failfast: false,
            quiet: false,
            keep_files: false,
        }
    }
}

fn default_run_jobs() -> usize {
    1
}
fn default_timeout() -> String {
    "30s".to_string()
}
fn default_results_dir() -> String {
    "results".to_string()
}

/// One configured decoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderEntry {
    /// Decoder name used on the command line
    pub name: String,
    /// Codec this decoder handles (e.g. "H.264")
    pub codec: String,
    /// Decoder binary
    pub command: String,
    /// Arguments; `{input}` and `{output}` are substituted per test
    #[serde(default)]
    pub args: Vec<String>,
    /// Whether the decoder drives a hardware context
    #[serde(default)]
    pub hw_acceleration: bool,
}

impl DecodaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the
    /// current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("decoda.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# decoda configuration

[download]
# Root directory for downloaded test vectors
resources_dir = "resources"
# Parallel download workers
jobs = 4
# Verify cached files against their recorded checksum
verify = true
# Unpack every archive member instead of only the input file
extract_all = false
# Keep archives after extraction
keep_archive = false

[runner]
# Parallel test workers (hardware decoders are forced to 1)
jobs = 1
# Per-test timeout
timeout = "30s"
# Directory for decoder working files
results_dir = "results"
# Stop after the first failing test (sequential mode only)
failfast = false
# Progress marks only, no per-test lines
quiet = false
# Keep decoder output files after the run
keep_files = false

# [[decoders]]
# name = "ffmpeg-h264"
# codec = "H.264"
# command = "ffmpeg"
# args = ["-y", "-i", "{input}", "-f", "rawvideo", "{output}"]
# hw_acceleration = false
"#
        .to_string()
    }

    /// Parse a duration string (e.g. "30s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and the unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let nanos: u64 = match unit_part.to_lowercase().as_str() {
            "ms" => (value * 1_000_000.0) as u64,
            "s" | "" => (value * 1_000_000_000.0) as u64,
            "m" | "min" => (value * 60_000_000_000.0) as u64,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecodaConfig::default();
        assert_eq!(config.download.resources_dir, "resources");
        assert_eq!(config.download.jobs, 4);
        assert!(config.download.verify);
        assert_eq!(config.runner.jobs, 1);
        assert!(config.decoders.is_empty());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            DecodaConfig::parse_duration("30s").unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            DecodaConfig::parse_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            DecodaConfig::parse_duration("2m").unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            DecodaConfig::parse_duration("1.5s").unwrap(),
            Duration::from_millis(1500)
        );
        assert!(DecodaConfig::parse_duration("").is_err());
        assert!(DecodaConfig::parse_duration("10fortnights").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [download]
            jobs = 8
            verify = false

            [runner]
            timeout = "2m"

            [[decoders]]
            name = "ffmpeg-h264"
            codec = "H.264"
            command = "ffmpeg"
            args = ["-i", "{input}", "{output}"]
        "#;

        let config: DecodaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.download.jobs, 8);
        assert!(!config.download.verify);
        assert_eq!(config.runner.timeout, "2m");
        // Defaults should still apply
        assert_eq!(config.runner.results_dir, "results");
        assert_eq!(config.decoders.len(), 1);
        assert_eq!(config.decoders[0].name, "ffmpeg-h264");
        assert!(!config.decoders[0].hw_acceleration);
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = DecodaConfig::default_toml();
        let config: DecodaConfig = toml::from_str(&default_toml).unwrap();
        assert_eq!(config.runner.timeout, "30s");
        assert_eq!(config.download.resources_dir, "resources");
    }
}
