//! Host command execution for the data-plane probe.
//!
//! Commands run through `/bin/sh -c`. Anything taken from configuration must
//! go through [`shellquote`] before it is spliced into a command line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{IpsecError, IpsecResult};

pub const PING_CMD: &str = "/bin/ping";

/// `$`, backtick, `"`, `\` and newline keep their meaning inside double quotes.
static DQUOTE_SPECIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Wraps `arg` in double quotes, escaping the characters the shell would
/// still expand.
///
/// ```
/// use ipsec_common::shell::shellquote;
///
/// assert_eq!(shellquote("fd00::2"), "\"fd00::2\"");
/// assert_eq!(shellquote("a`b"), "\"a\\`b\"");
/// ```
pub fn shellquote(arg: &str) -> String {
    format!("\"{}\"", DQUOTE_SPECIAL_RE.replace_all(arg, r"\$1"))
}

/// Captured output of one command.
#[derive(Debug, Clone)]
pub struct Output {
    /// `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr joined, for error reports.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Runs `cmd` and captures its output.
///
/// A non-zero exit is returned as data, not as an error. Dropping the future
/// kills the child, so an outer `tokio::time::timeout` bounds the process too.
pub async fn exec(cmd: &str) -> IpsecResult<Output> {
    tracing::debug!(command = %cmd, "Running");

    let out = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| IpsecError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let output = Output {
        exit_code: out.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&out.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
    };
    if !output.success() {
        tracing::debug!(command = %cmd, exit_code = output.exit_code, "Non-zero exit");
    }
    Ok(output)
}
