//! SO-010: Local execution transport.

use super::{spawn_with_input, ExecOutput, Mode, Remote};
use crate::core::error::Result;
use std::path::Path;
use std::process::Command;

/// Runs commands on this machine via `bash`.
/// Uses bash (not sh/dash) because generated scripts use `[[ ]]`.
pub struct LocalRemote {
    host: String,
}

impl LocalRemote {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }
}

impl Remote for LocalRemote {
    fn host(&self) -> &str {
        &self.host
    }

    fn exec(&mut self, cmd: &str, mode: Mode) -> Result<ExecOutput> {
        spawn_with_input(&self.host, Command::new("bash"), cmd.as_bytes(), mode)
    }

    fn put(&mut self, content: &str, remote_path: &str) -> Result<()> {
        log::debug!("[{}] put: {}", self.host, remote_path);
        std::fs::write(remote_path, content)?;
        Ok(())
    }

    fn upload(&mut self, local: &Path, remote_path: &str) -> Result<()> {
        log::debug!("[{}] upload: {} -> {}", self.host, local.display(), remote_path);
        std::fs::copy(local, remote_path)?;
        Ok(())
    }
}
