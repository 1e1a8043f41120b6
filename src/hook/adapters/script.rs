//! Script hooks run through a shell subprocess.

use crate::hook::domain::{HookExecutionError, HookPayload, ScriptHook};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Environment variable carrying the dotted event name.
pub const HOOK_EVENT_ENV: &str = "GANTRY_HOOK_EVENT";
/// Environment variable carrying the JSON payload.
pub const HOOK_PAYLOAD_ENV: &str = "GANTRY_HOOK_PAYLOAD";

const MAX_STDERR_CHARS: usize = 2_000;

/// Runs script hooks as `sh -c <command>`.
///
/// The payload is exported in [`HOOK_PAYLOAD_ENV`] and also written to the
/// child's stdin. A child still running at the timeout is killed.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    shell: PathBuf,
    working_directory: Option<PathBuf>,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("sh"),
            working_directory: None,
        }
    }
}

impl ScriptRunner {
    /// Creates a runner using `sh` in the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs scripts from `directory`, usually the project root.
    #[must_use]
    pub fn with_working_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(directory.into());
        self
    }

    /// Runs one script hook.
    ///
    /// # Errors
    ///
    /// Returns [`HookExecutionError::Spawn`] when the shell cannot start,
    /// [`HookExecutionError::NonZeroExit`] on failure exit and
    /// [`HookExecutionError::TimedOut`] when the deadline passes.
    pub async fn run(
        &self,
        script: &ScriptHook,
        payload: &HookPayload,
        timeout: Duration,
    ) -> Result<(), HookExecutionError> {
        let json = payload
            .to_json()
            .map_err(|err| HookExecutionError::Invalid(err.to_string()))?;
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(script.command())
            .env(HOOK_EVENT_ENV, payload.event.as_str())
            .env(HOOK_PAYLOAD_ENV, &json)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(directory) = &self.working_directory {
            command.current_dir(directory);
        }
        let mut child = command
            .spawn()
            .map_err(|err| HookExecutionError::Spawn(err.to_string()))?;
        let stdin = child.stdin.take();

        let run = async move {
            if let Some(mut pipe) = stdin {
                // Scripts that ignore stdin may exit before the write lands.
                if let Err(err) = pipe.write_all(json.as_bytes()).await {
                    debug!(error = %err, "script hook closed stdin early");
                }
            }
            child.wait_with_output().await
        };

        match tokio::time::timeout(timeout, run).await {
            Err(_) => Err(HookExecutionError::TimedOut(timeout)),
            Ok(Err(err)) => Err(HookExecutionError::Spawn(err.to_string())),
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(HookExecutionError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr)
                    .trim()
                    .chars()
                    .take(MAX_STDERR_CHARS)
                    .collect(),
            }),
        }
    }
}
