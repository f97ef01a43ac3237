//! SO-025: Stage what chef-solo needs on the host.
//!
//! Writes `solo.rb` and `solo.json`, then ships the cookbook archive and
//! unpacks it under the remote root. Every step overwrites the previous
//! run's files, so staging can be repeated.

use super::archive;
use super::attributes::{self, Attributes};
use super::error::{Error, Result};
use super::types::{DeployContext, SoloConfig};
use crate::transport::Remote;
use std::io::Write;
use std::path::Path;

pub const REMOTE_ROOT: &str = "/tmp/chef";
pub const CACHE_DIR: &str = "/tmp/chef/cache";
pub const SOLO_RB: &str = "/tmp/chef/solo.rb";
pub const SOLO_JSON: &str = "/tmp/chef/solo.json";
pub const REMOTE_ARCHIVE: &str = "/tmp/chef/cookbooks.tar";

/// Builds and uploads the provisioning payload for one project.
pub struct PayloadBuilder<'a> {
    config: &'a SoloConfig,
    context: &'a DeployContext,
    root: &'a Path,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(config: &'a SoloConfig, context: &'a DeployContext, root: &'a Path) -> Self {
        Self {
            config,
            context,
            root,
        }
    }

    /// Cookbook directories to ship. Errors when there are none.
    pub fn cookbooks(&self) -> Result<Vec<String>> {
        let cookbooks = self.config.cookbooks(self.root);
        if cookbooks.is_empty() {
            return Err(Error::NoCookbooks);
        }
        Ok(cookbooks)
    }

    /// The node attribute document for `run_list`.
    pub fn attributes(&self, run_list: &[String]) -> Result<Attributes> {
        if run_list.is_empty() {
            return Err(Error::EmptyRunList);
        }
        let defaults = self
            .config
            .default_chef_attributes
            .then(|| attributes::context_defaults(self.context, &self.context.release_name()));
        Ok(attributes::build(
            &self.config.chef_attributes,
            defaults.as_ref(),
            run_list,
        ))
    }

    /// Upload config, attributes and cookbooks.
    ///
    /// Both inputs are checked before anything is sent.
    pub fn stage(&self, remote: &mut dyn Remote, run_list: &[String]) -> Result<()> {
        let cookbooks = self.cookbooks()?;
        let attrs = self.attributes(run_list)?;

        remote.put(&render_config(&cookbooks), SOLO_RB)?;

        let json = serde_json::to_string_pretty(&attrs)?;
        remote.put(&json, SOLO_JSON)?;

        self.copy_cookbooks(remote, &cookbooks)
    }

    /// Archive into a scratch file, upload, extract. The scratch file is
    /// removed whatever happens to the upload.
    fn copy_cookbooks(&self, remote: &mut dyn Remote, cookbooks: &[String]) -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix("cookbooks")
            .suffix(".tar")
            .tempfile()?;

        let skip_apple_double = self.config.copyfile_disable && cfg!(target_os = "macos");
        archive::write_archive(tmp.as_file_mut(), self.root, cookbooks, skip_apple_double)?
            .flush()?;
        log::debug!(
            "[{}] archived {} into {}",
            remote.host(),
            cookbooks.join(", "),
            tmp.path().display()
        );

        let shipped = remote.upload(tmp.path(), REMOTE_ARCHIVE).and_then(|()| {
            remote
                .run(&format!("cd {} && tar -xjf cookbooks.tar", REMOTE_ROOT))
                .map(|_| ())
        });
        let removed = tmp.close();

        shipped?;
        removed?;
        Ok(())
    }
}

/// chef-solo configuration. Paths resolve relative to the file itself so the
/// remote root can move without regenerating cookbook paths.
pub fn render_config(cookbooks: &[String]) -> String {
    let cookbook_paths = cookbooks
        .iter()
        .map(|c| format!("File.join(root, {})", ruby_string(&archive::archive_name(c))))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "root = File.absolute_path(File.dirname(__FILE__))\n\
         file_cache_path File.join(root, \"cache\")\n\
         cookbook_path [ {} ]\n",
        cookbook_paths
    )
}

/// Double-quoted Ruby literal with `#` escaped against interpolation.
fn ruby_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('#', "\\#");
    format!("\"{}\"", escaped)
}
