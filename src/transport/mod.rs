//! SO-010/011: Remote execution over local bash, SSH, or a recorder.

pub mod local;
pub mod recording;
pub mod ssh;

use crate::core::error::{Error, Result};
use crate::core::types::Host;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Output from executing a command on a host.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`].
    pub fn into_result(self, host: &str, command: &str) -> Result<ExecOutput> {
        if self.success() {
            return Ok(self);
        }
        Err(Error::CommandFailed {
            host: host.to_string(),
            command: command.to_string(),
            exit_code: self.exit_code,
            stderr: self.stderr.trim().to_string(),
        })
    }
}

/// How a command's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Buffer output and log it once the command finishes.
    Run,
    /// Pass output straight through to our terminal.
    Stream,
    /// Buffer output and hand it back to the caller.
    Capture,
}

/// A connection to one host.
///
/// Implementors provide [`exec`](Remote::exec), [`put`](Remote::put) and
/// [`upload`](Remote::upload); `run`, `stream` and `capture` are built on top
/// and fail on a non-zero exit.
pub trait Remote {
    fn host(&self) -> &str;

    /// Execute `cmd` under bash and report its exit status.
    fn exec(&mut self, cmd: &str, mode: Mode) -> Result<ExecOutput>;

    /// Write `content` to `remote_path`.
    fn put(&mut self, content: &str, remote_path: &str) -> Result<()>;

    /// Copy the local file at `local` to `remote_path`.
    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<()>;

    fn run(&mut self, cmd: &str) -> Result<ExecOutput> {
        log::debug!("[{}] run: {}", self.host(), cmd);
        let out = self.exec(cmd, Mode::Run)?;
        for line in out.stdout.lines() {
            log::info!("[{}] {}", self.host(), line);
        }
        out.into_result(self.host(), cmd)
    }

    fn stream(&mut self, cmd: &str) -> Result<()> {
        log::debug!("[{}] stream: {}", self.host(), cmd);
        self.exec(cmd, Mode::Stream)?
            .into_result(self.host(), cmd)
            .map(|_| ())
    }

    fn capture(&mut self, cmd: &str) -> Result<String> {
        log::debug!("[{}] capture: {}", self.host(), cmd);
        self.exec(cmd, Mode::Capture)?
            .into_result(self.host(), cmd)
            .map(|out| out.stdout)
    }
}

/// Open a connection to a host.
/// Dispatches to local or SSH based on address.
pub fn connect(host: &Host) -> Box<dyn Remote> {
    if is_local_addr(&host.addr) {
        Box::new(local::LocalRemote::new(&host.hostname))
    } else {
        Box::new(ssh::SshRemote::new(host))
    }
}

/// Check if an address is this machine.
fn is_local_addr(addr: &str) -> bool {
    if addr == "127.0.0.1" || addr == "localhost" || addr == "::1" {
        return true;
    }
    if let Ok(hostname) = std::fs::read_to_string("/etc/hostname") {
        if addr == hostname.trim() {
            return true;
        }
    }
    false
}

/// Spawn `cmd`, feed `input` on stdin, and collect the result.
/// With [`Mode::Stream`] stdout/stderr are inherited and come back empty.
pub(crate) fn spawn_with_input(
    host: &str,
    mut cmd: Command,
    input: &[u8],
    mode: Mode,
) -> Result<ExecOutput> {
    let (out, err) = match mode {
        Mode::Stream => (Stdio::inherit(), Stdio::inherit()),
        Mode::Run | Mode::Capture => (Stdio::piped(), Stdio::piped()),
    };
    let program = cmd.get_program().to_string_lossy().to_string();
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(out)
        .stderr(err)
        .spawn()
        .map_err(|e| transport_error(host, format!("failed to spawn {}: {}", program, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input)
            .map_err(|e| transport_error(host, format!("stdin write error: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| transport_error(host, format!("{} wait error: {}", program, e)))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn transport_error(host: &str, message: String) -> Error {
    Error::Transport {
        host: host.to_string(),
        message,
    }
}

/// Single-quote a value for bash.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
