//! Running tabix as a child process.
//!

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;
use tracing::{debug, instrument};

use varquery_config::types::{LookupError, Result};

use crate::command::TabixCommand;

/// Runs tabix commands, one process per call.
///
/// Standard output and standard error are captured into one string because tabix reports
/// problems on either stream. A failed run is never retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabixRunner {
  timeout: Option<Duration>,
  log_output: bool,
}

impl TabixRunner {
  /// Create a runner. The child process is killed if it runs longer than `timeout`.
  pub fn new(timeout: Option<Duration>) -> Self {
    Self {
      timeout,
      log_output: false,
    }
  }

  /// Log the raw output of every command run by this runner.
  pub fn with_log_output(mut self, log_output: bool) -> Self {
    self.log_output = log_output;
    self
  }

  /// Get the timeout.
  pub fn timeout(&self) -> Option<Duration> {
    self.timeout
  }

  /// Run the command and return its captured output. A non-zero exit status, a timeout or a
  /// process that cannot be started all result in an `Execution` error.
  #[instrument(level = "debug", skip_all, fields(command = %command))]
  pub async fn run(&self, command: &TabixCommand) -> Result<String> {
    let child = Command::new(command.program())
      .args(command.args())
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|err| LookupError::execution(command.as_str(), err.to_string()))?;

    // Dropping the child on timeout kills it.
    let output = match self.timeout {
      Some(timeout) => time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
          LookupError::execution(command.as_str(), format!("timed out after {timeout:?}"))
        })?,
      None => child.wait_with_output().await,
    }
    .map_err(|err| LookupError::execution(command.as_str(), err.to_string()))?;

    let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
    captured.push_str(&String::from_utf8_lossy(&output.stderr));

    if self.log_output {
      debug!(status = %output.status, output = %captured, "tabix output");
    }

    if !output.status.success() {
      return Err(LookupError::execution(command.as_str(), captured));
    }

    Ok(captured)
  }
}
