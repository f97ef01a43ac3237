//! SO-011: SSH execution transport.
//!
//! Uses the `ssh` and `scp` binaries directly, without libssh2.
//! Commands are piped to stdin (not passed as argument) to avoid
//! argument length limits and injection vectors.

use super::{shell_quote, spawn_with_input, transport_error, ExecOutput, Mode, Remote};
use crate::core::error::Result;
use crate::core::types::Host;
use std::path::Path;
use std::process::Command;

const SSH_OPTIONS: [&str; 6] = [
    "-o",
    "BatchMode=yes",
    "-o",
    "ConnectTimeout=5",
    "-o",
    "StrictHostKeyChecking=accept-new",
];

/// Runs commands on a remote host over SSH.
pub struct SshRemote {
    host: Host,
    key: Option<String>,
}

impl SshRemote {
    pub fn new(host: &Host) -> Self {
        Self {
            key: host.ssh_key.as_deref().map(expand_home),
            host: host.clone(),
        }
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.host.user, self.host.addr)
    }

    fn ssh(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(SSH_OPTIONS);
        if let Some(ref key) = self.key {
            cmd.args(["-i", key]);
        }
        cmd.arg(self.destination());
        cmd
    }
}

impl Remote for SshRemote {
    fn host(&self) -> &str {
        &self.host.hostname
    }

    fn exec(&mut self, cmd: &str, mode: Mode) -> Result<ExecOutput> {
        let mut ssh = self.ssh();
        ssh.arg("bash");
        spawn_with_input(&self.host.hostname, ssh, cmd.as_bytes(), mode)
    }

    fn put(&mut self, content: &str, remote_path: &str) -> Result<()> {
        log::debug!("[{}] put: {}", self.host.hostname, remote_path);
        let mut ssh = self.ssh();
        ssh.arg(format!("cat > {}", shell_quote(remote_path)));
        let target = format!("put {}", remote_path);
        spawn_with_input(&self.host.hostname, ssh, content.as_bytes(), Mode::Capture)?
            .into_result(&self.host.hostname, &target)
            .map(|_| ())
    }

    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<()> {
        log::debug!(
            "[{}] upload: {} -> {}",
            self.host.hostname,
            local.display(),
            remote_path
        );
        let mut scp = Command::new("scp");
        scp.args(["-q"]).args(SSH_OPTIONS);
        if let Some(ref key) = self.key {
            scp.args(["-i", key]);
        }
        scp.arg(local)
            .arg(format!("{}:{}", self.destination(), remote_path));

        let output = scp
            .output()
            .map_err(|e| transport_error(&self.host.hostname, format!("failed to spawn scp: {}", e)))?;
        if !output.status.success() {
            return Err(transport_error(
                &self.host.hostname,
                format!(
                    "scp {} failed: {}",
                    local.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(())
    }
}

/// Expand a leading `~/` to `$HOME`.
fn expand_home(key: &str) -> String {
    match (key.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home, rest),
        _ => key.to_string(),
    }
}
