use std::process::Command;

use crate::errors::{LauncherError, Result};

/// Executes an arbitrary shell command string and captures its output.
///
/// The string is handed to the platform shell verbatim; quoting and escaping
/// are the caller's responsibility. Used to launch installed games and for
/// one-off OS operations such as permission fix-ups.
#[derive(Clone, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, command: &str) -> Result<String> {
        tracing::info!("running command: {command}");

        let output = shell_command(command)
            .output()
            .map_err(|err| LauncherError::Process(format!("failed to spawn `{command}`: {err}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            stdout.trim().to_string()
        } else {
            stderr
        };
        Err(LauncherError::Process(format!(
            "`{command}` exited with {}: {detail}",
            output.status
        )))
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}
