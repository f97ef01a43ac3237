//! SO-026: chef-solo invocation.

use super::error::Result;
use super::payload::{SOLO_JSON, SOLO_RB};
use super::types::SoloConfig;
use crate::transport::Remote;

/// Run `cmd` streamed when `streaming`, buffered otherwise.
pub fn stream_or_run(remote: &mut dyn Remote, streaming: bool, cmd: &str) -> Result<()> {
    if streaming {
        remote.stream(cmd)
    } else {
        remote.run(cmd).map(|_| ())
    }
}

/// Runs chef-solo against the staged payload.
pub struct Driver<'a> {
    config: &'a SoloConfig,
}

impl<'a> Driver<'a> {
    pub fn new(config: &'a SoloConfig) -> Self {
        Self { config }
    }

    pub fn command(&self) -> String {
        self.config
            .elevate(&format!("chef-solo -c {} -j {}", SOLO_RB, SOLO_JSON))
    }

    /// Staging must have happened first.
    pub fn invoke(&self, remote: &mut dyn Remote) -> Result<()> {
        log::info!("[{}] Running chef-solo", remote.host());
        stream_or_run(remote, self.config.chef_streaming, &self.command())
    }
}
