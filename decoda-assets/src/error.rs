//! Asset pipeline errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the download pipeline.
///
/// Any of these aborts the whole download call; a checksum mismatch of
/// a cached file is not an error (it triggers a fresh fetch instead).
#[derive(Debug, Error)]
pub enum AssetError {
    /// The HTTP transfer failed.
    #[error("download of {url} failed: {reason}")]
    Fetch {
        /// URL of the asset.
        url: String,
        /// Transport or status description.
        reason: String,
    },

    /// Filesystem access failed.
    #[error("{path}: {source}")]
    Io {
        /// Path of the offending file or directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be read or unpacked.
    #[error("cannot extract {path}: {reason}")]
    Archive {
        /// Path of the archive.
        path: PathBuf,
        /// Decode or unpack failure description.
        reason: String,
    },

    /// The requested member is not present in the archive.
    #[error("archive {archive} does not contain member '{member}'")]
    MissingMember {
        /// Path of the archive.
        archive: PathBuf,
        /// Member that was requested.
        member: String,
    },

    /// The worker pool could not be built.
    #[error("failed to build download pool: {0}")]
    Pool(String),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}
