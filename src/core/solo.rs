//! SO-027: `solo` converges one host with a run list.
//!
//! run list → cookbooks → bootstrap if needed → cache dir → stage → chef-solo.
//! Inputs are validated before the first remote call. Any failure aborts;
//! a retry starts over from the top.

use super::bootstrap::Installer;
use super::driver::Driver;
use super::error::{Error, Result};
use super::payload::{PayloadBuilder, CACHE_DIR};
use super::types::{DeployContext, SoloConfig};
use crate::transport::Remote;
use std::path::Path;

/// Everything a `solo` run needs besides the connection.
pub struct SoloRun<'a> {
    pub config: &'a SoloConfig,
    pub context: &'a DeployContext,
    /// Project root that cookbook paths are relative to
    pub root: &'a Path,
    pub run_list: &'a [String],
}

impl SoloRun<'_> {
    /// Local checks that need no host: a run list and at least one cookbook dir.
    pub fn check(&self) -> Result<Vec<String>> {
        if self.run_list.is_empty() {
            return Err(Error::EmptyRunList);
        }
        self.payload().cookbooks()
    }

    fn payload(&self) -> PayloadBuilder<'_> {
        PayloadBuilder::new(self.config, self.context, self.root)
    }
}

/// Provision one host.
pub fn solo(remote: &mut dyn Remote, run: &SoloRun) -> Result<()> {
    run.check()?;
    let payload = run.payload();

    Installer::new(run.config).ensure_installed(remote)?;

    remote.run(&format!("mkdir -p {}", CACHE_DIR))?;
    payload.stage(remote, run.run_list)?;
    Driver::new(run.config).invoke(remote)
}
