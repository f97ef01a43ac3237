//! SO-022: Bootstrap: get chef-solo onto a host.
//!
//! dist-upgrade → dependencies → Ruby from source (unless present) → chef gems.
//! The first failure aborts. Once the Ruby step has started, a failure
//! removes the downloaded tarball before the error is returned.

use super::driver::stream_or_run;
use super::error::Result;
use super::probe;
use super::script::{RubyInstall, SCRIPT_PATH};
use super::types::SoloConfig;
use crate::platform::{self, Step};
use crate::transport::{shell_quote, Remote};
use std::fmt;

/// A single bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InstallStep {
    DistUpgrade,
    Dependencies,
    Ruby,
    Chef,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistUpgrade => write!(f, "dist-upgrade"),
            Self::Dependencies => write!(f, "dependencies"),
            Self::Ruby => write!(f, "ruby"),
            Self::Chef => write!(f, "chef"),
        }
    }
}

/// Runs the bootstrap sequence with one set of options.
pub struct Installer<'a> {
    config: &'a SoloConfig,
}

impl<'a> Installer<'a> {
    pub fn new(config: &'a SoloConfig) -> Self {
        Self { config }
    }

    /// Install chef-solo unless it is already there.
    /// Returns whether a bootstrap ran.
    pub fn ensure_installed(&self, remote: &mut dyn Remote) -> Result<bool> {
        if probe::is_installed(remote, "chef-solo") {
            return Ok(false);
        }
        log::info!("[{}] Bootstrapping host to install chef-solo", remote.host());
        self.install(remote)?;
        Ok(true)
    }

    /// Install chef-solo whether or not it is installed.
    pub fn install(&self, remote: &mut dyn Remote) -> Result<()> {
        self.dist_upgrade(remote)?;
        self.dependencies(remote)?;

        let ruby = if probe::is_installed(remote, "ruby") {
            None
        } else {
            Some(RubyInstall::from_config(self.config))
        };

        let result = match ruby {
            Some(ref r) => self
                .install_ruby(remote, r)
                .and_then(|()| self.chef(remote)),
            None => self.chef(remote),
        };

        if let (Err(_), Some(r)) = (&result, &ruby) {
            rollback(remote, r);
        }
        result
    }

    /// Run one step on its own.
    pub fn run_step(&self, remote: &mut dyn Remote, step: InstallStep) -> Result<()> {
        match step {
            InstallStep::DistUpgrade => self.dist_upgrade(remote),
            InstallStep::Dependencies => self.dependencies(remote),
            InstallStep::Ruby => self.ruby(remote),
            InstallStep::Chef => self.chef(remote),
        }
    }

    pub fn dist_upgrade(&self, remote: &mut dyn Remote) -> Result<()> {
        self.planned(remote, Step::DistUpgrade)
    }

    pub fn dependencies(&self, remote: &mut dyn Remote) -> Result<()> {
        self.planned(remote, Step::Dependencies)
    }

    /// Compile and install Ruby from source.
    pub fn ruby(&self, remote: &mut dyn Remote) -> Result<()> {
        let ruby = RubyInstall::from_config(self.config);
        let result = self.install_ruby(remote, &ruby);
        if result.is_err() {
            rollback(remote, &ruby);
        }
        result
    }

    /// Install the chef and ruby-shadow gems.
    pub fn chef(&self, remote: &mut dyn Remote) -> Result<()> {
        for cmd in self.chef_commands() {
            remote.run(&cmd)?;
        }
        Ok(())
    }

    pub fn chef_commands(&self) -> Vec<String> {
        vec![
            self.config.elevate(&format!(
                "gem install chef --version '{}' --no-ri --no-rdoc",
                self.config.chef_version()
            )),
            self.config
                .elevate("gem install ruby-shadow --no-ri --no-rdoc"),
        ]
    }

    fn planned(&self, remote: &mut dyn Remote, step: Step) -> Result<()> {
        let commands = platform::commands_for(step, &self.config.os);
        if !commands.is_empty() {
            log::info!("[{}] {} ({})", remote.host(), step, self.config.os);
        }
        for cmd in commands {
            stream_or_run(remote, self.config.chef_streaming, &self.config.elevate(&cmd))?;
        }
        Ok(())
    }

    fn install_ruby(&self, remote: &mut dyn Remote, ruby: &RubyInstall) -> Result<()> {
        log::info!("[{}] Installing {} from source", remote.host(), ruby.version);
        remote.put(&ruby.render(), SCRIPT_PATH)?;
        remote.run(&format!("bash {}", SCRIPT_PATH))?;
        Ok(())
    }
}

/// Remove the downloaded tarball. Failures here are logged, not returned.
fn rollback(remote: &mut dyn Remote, ruby: &RubyInstall) {
    let cmd = format!("rm -f {}", shell_quote(&ruby.archive_path()));
    log::warn!("[{}] rolling back: {}", remote.host(), cmd);
    if let Err(e) = remote.run(&cmd) {
        log::warn!("[{}] rollback failed: {}", remote.host(), e);
    }
}
