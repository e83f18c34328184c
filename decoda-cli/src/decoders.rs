//! Command-line decoder front ends.
//!
//! A [`CommandDecoder`] wraps an external decoder binary described in
//! `decoda.toml`. Decoding spawns the binary with `{input}`/`{output}`
//! substituted into its argument template and polls it against the
//! per-test deadline; an overrunning process gets SIGTERM, a short
//! grace window, then SIGKILL.

use crate::config::DecoderEntry;
use decoda_core::{Codec, DecodeError, Decoder};
use std::env;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const TERM_GRACE: Duration = Duration::from_millis(200);

/// Send SIGTERM to a process. Returns `Err` if the signal could not be
/// delivered.
fn send_sigterm(pid: u32) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Whether `binary` resolves to an executable file, either directly or
/// through PATH.
fn binary_available(binary: &str) -> bool {
    let path = Path::new(binary);
    if path.components().count() > 1 {
        return path.is_file();
    }
    env::split_paths(&env::var_os("PATH").unwrap_or_default())
        .any(|dir| dir.join(binary).is_file())
}

/// Decoder backed by an external command.
#[derive(Debug)]
pub struct CommandDecoder {
    name: String,
    codec: Codec,
    command: String,
    args: Vec<String>,
    hw_acceleration: bool,
}

impl CommandDecoder {
    /// Build a decoder from its configuration entry.
    pub fn from_entry(entry: &DecoderEntry) -> anyhow::Result<Self> {
        let codec: Codec = entry
            .codec
            .parse()
            .map_err(|e| anyhow::anyhow!("decoder '{}': {e}", entry.name))?;
        Ok(CommandDecoder {
            name: entry.name.clone(),
            codec,
            command: entry.command.clone(),
            args: entry.args.clone(),
            hw_acceleration: entry.hw_acceleration,
        })
    }

    fn build_command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.command);
        for arg in &self.args {
            let arg = arg
                .replace("{input}", &input.to_string_lossy())
                .replace("{output}", &output.to_string_lossy());
            command.arg(arg);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }

    /// Wait for `child` to exit before `timeout` elapses, escalating
    /// SIGTERM → SIGKILL if it does not.
    fn wait_with_deadline(
        &self,
        mut child: Child,
        timeout: Duration,
    ) -> Result<(), DecodeError> {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if status.success() {
                        return Ok(());
                    }
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_string(&mut stderr);
                    }
                    return Err(DecodeError::Failed {
                        code: status.code().unwrap_or(-1),
                        stderr: stderr.trim().to_string(),
                    });
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        debug!(decoder = %self.name, "deadline exceeded, terminating");
                        // Graceful first, then force.
                        let _ = send_sigterm(child.id());
                        std::thread::sleep(TERM_GRACE);
                        if child.try_wait().map(|s| s.is_none()).unwrap_or(false) {
                            let _ = child.kill();
                        }
                        let _ = child.wait();
                        return Err(DecodeError::Timeout(timeout));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DecodeError::Spawn(err));
                }
            }
        }
    }
}

impl Decoder for CommandDecoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn codec(&self) -> Codec {
        self.codec
    }

    fn hw_acceleration(&self) -> bool {
        self.hw_acceleration
    }

    fn check_run(&self) -> bool {
        binary_available(&self.command)
    }

    fn decode(&self, input: &Path, output: &Path, timeout: Duration) -> Result<(), DecodeError> {
        let child = self.build_command(input, output).spawn()?;
        self.wait_with_deadline(child, timeout)
    }
}

/// Instantiate every configured decoder.
pub fn build_decoders(entries: &[DecoderEntry]) -> anyhow::Result<Vec<CommandDecoder>> {
    entries.iter().map(CommandDecoder::from_entry).collect()
}

/// Look up a decoder by name, case-insensitively.
pub fn find_decoder<'a>(
    decoders: &'a [CommandDecoder],
    name: &str,
) -> Option<&'a CommandDecoder> {
    decoders
        .iter()
        .find(|d| d.name().eq_ignore_ascii_case(name))
}
