//! The decoder collaborator boundary.

use crate::codec::Codec;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors a decoder invocation can produce.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The decoder process could not be launched.
    #[error("failed to launch decoder: {0}")]
    Spawn(#[from] std::io::Error),

    /// The decoder ran but reported failure.
    #[error("decoder exited with status {code}: {stderr}")]
    Failed {
        /// Exit code, or -1 when killed by a signal.
        code: i32,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// The decoder exceeded its per-test deadline and was killed.
    #[error("decoder timed out after {0:?}")]
    Timeout(Duration),
}

/// A decoder capability the scheduler can drive.
///
/// Implementations must be shareable across worker threads; each worker
/// only ever calls `decode` with worker-private paths.
pub trait Decoder: Send + Sync {
    /// Decoder name, used for lookup and reporting.
    fn name(&self) -> &str;

    /// Codec this decoder handles.
    fn codec(&self) -> Codec;

    /// Whether this decoder drives a hardware context. Hardware contexts
    /// are assumed non-reentrant, so runs are forced sequential.
    fn hw_acceleration(&self) -> bool {
        false
    }

    /// Readiness probe: can this decoder run on the current host?
    fn check_run(&self) -> bool;

    /// Decode `input` into `output`, observing `timeout`.
    fn decode(&self, input: &Path, output: &Path, timeout: Duration) -> Result<(), DecodeError>;
}
