//! SO-012: Recording transport for dry runs.
//!
//! Nothing leaves this machine. Every operation is recorded in order so it
//! can be printed (`--dry-run`) or asserted on. `which` probes succeed only
//! for commands registered with [`RecordingRemote::with_installed`].

use super::{transport_error, ExecOutput, Mode, Remote};
use crate::core::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Exec { mode: Mode, command: String },
    Put { path: String, content: String },
    Upload { local: PathBuf, remote: String, bytes: u64 },
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec { mode, command } => {
                let verb = match mode {
                    Mode::Run => "run",
                    Mode::Stream => "stream",
                    Mode::Capture => "capture",
                };
                write!(f, "{:<7} {}", verb, command)
            }
            Self::Put { path, content } => {
                write!(f, "{:<7} {} ({} bytes)", "put", path, content.len())
            }
            Self::Upload { local, remote, bytes } => write!(
                f,
                "{:<7} {} -> {} ({} bytes)",
                "upload",
                local.display(),
                remote,
                bytes
            ),
        }
    }
}

/// A [`Remote`] that records instead of executing.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    host: String,
    ops: Vec<Op>,
    installed: Vec<String>,
    fail_matching: Option<String>,
    fail_uploads: bool,
}

impl RecordingRemote {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            ..Self::default()
        }
    }

    /// Report `command` as present to `which` probes.
    pub fn with_installed(mut self, command: &str) -> Self {
        self.installed.push(command.to_string());
        self
    }

    /// Exit non-zero for any command containing `pattern`.
    pub fn failing_on(mut self, pattern: &str) -> Self {
        self.fail_matching = Some(pattern.to_string());
        self
    }

    /// Fail every upload at the transport level.
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Commands executed so far, in order.
    pub fn commands(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Exec { command, .. } => Some(command.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Content written to `path` by the most recent `put`.
    pub fn put_content(&self, path: &str) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Put { path: p, content } if p == path => Some(content.as_str()),
            _ => None,
        })
    }

    fn probe_result(&self, cmd: &str) -> Option<bool> {
        let name = cmd.strip_prefix("which ")?;
        Some(self.installed.iter().any(|c| c == name.trim()))
    }
}

impl Remote for RecordingRemote {
    fn host(&self) -> &str {
        &self.host
    }

    fn exec(&mut self, cmd: &str, mode: Mode) -> Result<ExecOutput> {
        self.ops.push(Op::Exec {
            mode,
            command: cmd.to_string(),
        });

        let failed = match self.fail_matching {
            Some(ref pattern) => cmd.contains(pattern.as_str()),
            None => false,
        };
        let ok = !failed && self.probe_result(cmd).unwrap_or(true);

        Ok(ExecOutput {
            exit_code: if ok { 0 } else { 1 },
            stdout: String::new(),
            stderr: if ok { String::new() } else { "simulated failure".to_string() },
        })
    }

    fn put(&mut self, content: &str, remote_path: &str) -> Result<()> {
        self.ops.push(Op::Put {
            path: remote_path.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<()> {
        let bytes = std::fs::metadata(local)?.len();
        self.ops.push(Op::Upload {
            local: local.to_path_buf(),
            remote: remote_path.to_string(),
            bytes,
        });
        if self.fail_uploads {
            return Err(transport_error(
                &self.host,
                format!("simulated upload failure for {}", local.display()),
            ));
        }
        Ok(())
    }
}
