//! Azure CLI command execution.
//!
//! Provides utilities for running Azure CLI commands with a time limit.

use crate::BoxError;
use colored::Colorize;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;

/// Upper bound on the stdout accepted from a single command.
const MAX_STDOUT_BYTES: usize = 64 * 1024 * 1024;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Run a shell command and return its stdout.
///
/// The command string is split on spaces, with quoted substrings preserved.
/// The child process is killed if it does not finish within `timeout`.
///
/// # Returns
/// * `Ok(String)` - The stdout output on success
/// * `Err` - If the command fails, times out or produces too much output
pub async fn run(cmd: &str, timeout: Duration) -> Result<String, BoxError> {
    log::debug!("run({cmd})", cmd = short(cmd).on_blue());

    let cmds: Vec<&str> = split_and_strip(cmd);
    log::trace!("split cmds={:?}", cmds);
    let (program, args) = cmds
        .split_first()
        .filter(|(program, _)| !program.is_empty())
        .ok_or("Empty command")?;

    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|e| {
            log::error!("Command execution failed: {}", e);
            format!("Failed to execute command {program}: {e}")
        })?,
        Err(_) => {
            log::warn!(
                "{timed_out} after {timeout:?}: {cmd}",
                timed_out = "timed out".on_red(),
                cmd = short(cmd).on_blue()
            );
            return Err(format!("Command {program} timed out after {timeout:?}").into());
        }
    };

    if output.status.success() {
        log::debug!("Success output.stdout.len(): {}", output.stdout.len());
        log::debug!("Success output.status.code(): {:?}", output.status.code());

        if output.stdout.len() > MAX_STDOUT_BYTES {
            return Err(format!(
                "Response too large: {} bytes for command: {}",
                output.stdout.len(),
                program
            )
            .into());
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = short(cmd).on_blue()
        );
        return Err(format!("ERROR running {program}: {}", stderr.trim()).into());
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| format!("Invalid UTF-8: {}", e))?;

    Ok(stdout)
}

/// First line of a command, queries span many.
fn short(cmd: &str) -> &str {
    cmd.lines().next().unwrap_or(cmd).trim()
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .collect()
}
