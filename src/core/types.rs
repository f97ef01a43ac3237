//! SO-001: Project file types.
//!
//! Defines the YAML schema for hosts, the deployment context that feeds
//! default node attributes, and the chef-solo options. All types derive
//! Serialize/Deserialize for YAML roundtripping.

use crate::platform::Os;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cookbook directories probed when `solo.cookbooks` is not set.
pub const DEFAULT_COOKBOOKS: [&str; 2] = ["config/cookbooks", "vendor/cookbooks"];

pub const DEFAULT_RUBY_VERSION: &str = "ruby-1.9.2-p290";
pub const DEFAULT_CHEF_VERSION: &str = ">= 0";

// ============================================================================
// Top-level soloist.yaml
// ============================================================================

/// Root configuration for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Human-readable project name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Host inventory (order-preserving)
    #[serde(default)]
    pub hosts: IndexMap<String, Host>,

    /// Deployment context used for default node attributes
    #[serde(default)]
    pub deploy: DeployContext,

    /// chef-solo options
    #[serde(default)]
    pub solo: SoloConfig,
}

impl ProjectConfig {
    /// Hosts that take part in releases, in inventory order.
    pub fn release_hosts(&self) -> impl Iterator<Item = (&String, &Host)> {
        self.hosts.iter().filter(|(_, h)| !h.no_release)
    }

    /// Deployment context with `main_server` defaulted to the first
    /// releasable host and the release name fixed for this invocation.
    pub fn resolved_context(&self) -> DeployContext {
        let mut ctx = self.deploy.clone();
        if ctx.main_server.is_none() {
            ctx.main_server = self.release_hosts().next().map(|(_, h)| h.addr.clone());
        }
        ctx.release_name = Some(ctx.release_name());
        ctx
    }
}

// ============================================================================
// Hosts
// ============================================================================

/// A target host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// Host name
    pub hostname: String,

    /// Network address (IP or DNS)
    pub addr: String,

    /// SSH user
    #[serde(default = "default_user")]
    pub user: String,

    /// Path to SSH private key
    #[serde(default)]
    pub ssh_key: Option<String>,

    /// Skip this host for every task
    #[serde(default)]
    pub no_release: bool,
}

fn default_user() -> String {
    "root".to_string()
}

// ============================================================================
// Deployment context
// ============================================================================

/// Values from the deployment that become default node attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployContext {
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub deploy_to: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub main_server: Option<String>,
    #[serde(default)]
    pub migrate_env: Option<String>,
    #[serde(default)]
    pub scm: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,

    /// Release directory name; a UTC timestamp when unset
    #[serde(default)]
    pub release_name: Option<String>,
}

impl DeployContext {
    /// Deploy root: explicit, or `/u/apps/<application>`.
    pub fn deploy_to(&self) -> Option<String> {
        self.deploy_to.clone().or_else(|| {
            self.application
                .as_ref()
                .map(|app| format!("/u/apps/{}", app))
        })
    }

    pub fn current_path(&self) -> Option<String> {
        self.deploy_to().map(|d| format!("{}/current", d))
    }

    pub fn shared_path(&self) -> Option<String> {
        self.deploy_to().map(|d| format!("{}/shared", d))
    }

    pub fn release_path(&self, release_name: &str) -> Option<String> {
        self.deploy_to()
            .map(|d| format!("{}/releases/{}", d, release_name))
    }

    /// Release name for this invocation.
    pub fn release_name(&self) -> String {
        self.release_name
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d%H%M%S").to_string())
    }
}

// ============================================================================
// chef-solo options
// ============================================================================

/// chef-solo bootstrap and run options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoloConfig {
    /// Target OS family
    #[serde(default)]
    pub os: Os,

    /// Local cookbook directories; probed defaults when unset
    #[serde(default)]
    pub cookbooks: Option<Vec<String>>,

    /// Seed node attributes
    #[serde(default)]
    pub chef_attributes: serde_json::Map<String, serde_json::Value>,

    /// Fill attributes from the deployment context
    #[serde(default = "default_true")]
    pub default_chef_attributes: bool,

    /// Stream long-running command output unbuffered
    #[serde(default = "default_true")]
    pub chef_streaming: bool,

    #[serde(default)]
    pub ruby_version: Option<String>,

    #[serde(default)]
    pub ruby_url: Option<String>,

    #[serde(default)]
    pub ruby_dir: Option<String>,

    /// Apply the GC tuning and require patches to 1.9.2 rubies
    #[serde(default = "default_true")]
    pub apply_ruby_patches: bool,

    /// Version constraint passed to `gem install chef`
    #[serde(default)]
    pub chef_version: Option<String>,

    /// Leave AppleDouble files out of the cookbook archive on macOS
    #[serde(default)]
    pub copyfile_disable: bool,

    /// Prefix privileged commands with sudo
    #[serde(default = "default_true")]
    pub use_sudo: bool,
}

impl Default for SoloConfig {
    fn default() -> Self {
        Self {
            os: Os::default(),
            cookbooks: None,
            chef_attributes: serde_json::Map::new(),
            default_chef_attributes: true,
            chef_streaming: true,
            ruby_version: None,
            ruby_url: None,
            ruby_dir: None,
            apply_ruby_patches: true,
            chef_version: None,
            copyfile_disable: false,
            use_sudo: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl SoloConfig {
    pub fn ruby_version(&self) -> &str {
        self.ruby_version.as_deref().unwrap_or(DEFAULT_RUBY_VERSION)
    }

    pub fn ruby_url(&self) -> String {
        self.ruby_url.clone().unwrap_or_else(|| {
            format!(
                "http://ftp.ruby-lang.org/pub/ruby/1.9/{}.tar.gz",
                self.ruby_version()
            )
        })
    }

    pub fn ruby_dir(&self) -> &str {
        self.ruby_dir.as_deref().unwrap_or_else(|| self.ruby_version())
    }

    pub fn chef_version(&self) -> &str {
        self.chef_version.as_deref().unwrap_or(DEFAULT_CHEF_VERSION)
    }

    /// Cookbook directories for a project rooted at `root`.
    ///
    /// An explicit list is used as given; the defaults are kept only when
    /// they exist.
    pub fn cookbooks(&self, root: &Path) -> Vec<String> {
        match self.cookbooks {
            Some(ref list) => list.clone(),
            None => DEFAULT_COOKBOOKS
                .iter()
                .filter(|p| root.join(p).exists())
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Wrap a command for privileged execution.
    ///
    /// Every elevated command gets the same OS-specific environment prefix.
    pub fn elevate(&self, cmd: &str) -> String {
        if !self.use_sudo {
            return cmd.to_string();
        }
        match self.os.sudo_env() {
            Some(env) => format!("sudo {} {}", env, cmd),
            None => format!("sudo {}", cmd),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_so001_config_parse() {
        let yaml = r#"
version: "1.0"
name: myapp
hosts:
  web1:
    hostname: web1
    addr: 10.0.0.5
    user: deploy
deploy:
  application: myapp
  deploy_to: /srv/myapp
solo:
  os: centos
  chef_attributes:
    nginx:
      port: 80
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.name, "myapp");
        assert_eq!(config.hosts["web1"].user, "deploy");
        assert_eq!(config.solo.os, Os::Centos);
        assert_eq!(config.solo.chef_attributes["nginx"]["port"], 80);
        assert!(config.solo.chef_streaming);
    }

    #[test]
    fn test_so001_host_defaults() {
        let yaml = r#"
hostname: test
addr: 1.2.3.4
"#;
        let h: Host = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(h.user, "root");
        assert!(h.ssh_key.is_none());
        assert!(!h.no_release);
    }

    #[test]
    fn test_so001_solo_defaults() {
        let s = SoloConfig::default();
        assert_eq!(s.os, Os::Ubuntu);
        assert!(s.default_chef_attributes);
        assert!(s.chef_streaming);
        assert!(s.apply_ruby_patches);
        assert!(!s.copyfile_disable);
        assert_eq!(s.ruby_version(), "ruby-1.9.2-p290");
        assert_eq!(
            s.ruby_url(),
            "http://ftp.ruby-lang.org/pub/ruby/1.9/ruby-1.9.2-p290.tar.gz"
        );
        assert_eq!(s.ruby_dir(), "ruby-1.9.2-p290");
        assert_eq!(s.chef_version(), ">= 0");
    }

    #[test]
    fn test_so001_ruby_dir_follows_version() {
        let s = SoloConfig {
            ruby_version: Some("ruby-1.9.3-p0".into()),
            ..SoloConfig::default()
        };
        assert_eq!(s.ruby_dir(), "ruby-1.9.3-p0");
        assert!(s.ruby_url().ends_with("/ruby-1.9.3-p0.tar.gz"));
    }

    #[test]
    fn test_so001_elevate_per_os() {
        let ubuntu = SoloConfig::default();
        assert_eq!(ubuntu.elevate("yum update -y"), "sudo yum update -y");

        let centos = SoloConfig {
            os: Os::Centos,
            ..SoloConfig::default()
        };
        assert_eq!(
            centos.elevate("gem install chef"),
            "sudo env PATH=$PATH gem install chef"
        );

        let plain = SoloConfig {
            use_sudo: false,
            ..centos
        };
        assert_eq!(plain.elevate("make install"), "make install");
    }

    #[test]
    fn test_so001_default_cookbooks_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let s = SoloConfig::default();
        assert!(s.cookbooks(dir.path()).is_empty());

        std::fs::create_dir_all(dir.path().join("vendor/cookbooks")).unwrap();
        assert_eq!(s.cookbooks(dir.path()), vec!["vendor/cookbooks"]);

        std::fs::create_dir_all(dir.path().join("config/cookbooks")).unwrap();
        assert_eq!(
            s.cookbooks(dir.path()),
            vec!["config/cookbooks", "vendor/cookbooks"]
        );
    }

    #[test]
    fn test_so001_explicit_cookbooks_unfiltered() {
        let dir = tempfile::tempdir().unwrap();
        let s = SoloConfig {
            cookbooks: Some(vec!["site-cookbooks".into()]),
            ..SoloConfig::default()
        };
        assert_eq!(s.cookbooks(dir.path()), vec!["site-cookbooks"]);
    }

    #[test]
    fn test_so001_deploy_paths() {
        let ctx = DeployContext {
            application: Some("myapp".into()),
            ..DeployContext::default()
        };
        assert_eq!(ctx.deploy_to().as_deref(), Some("/u/apps/myapp"));
        assert_eq!(ctx.current_path().as_deref(), Some("/u/apps/myapp/current"));
        assert_eq!(ctx.shared_path().as_deref(), Some("/u/apps/myapp/shared"));
        assert_eq!(
            ctx.release_path("20260101120000").as_deref(),
            Some("/u/apps/myapp/releases/20260101120000")
        );
        assert!(DeployContext::default().current_path().is_none());
    }

    #[test]
    fn test_so001_release_name_timestamp() {
        let name = DeployContext::default().release_name();
        assert_eq!(name.len(), 14);
        assert!(name.chars().all(|c| c.is_ascii_digit()));

        let fixed = DeployContext {
            release_name: Some("r1".into()),
            ..DeployContext::default()
        };
        assert_eq!(fixed.release_name(), "r1");
    }

    #[test]
    fn test_so001_main_server_from_hosts() {
        let yaml = r#"
version: "1.0"
name: myapp
hosts:
  builder:
    hostname: builder
    addr: 10.0.0.9
    no_release: true
  web1:
    hostname: web1
    addr: 10.0.0.5
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            config.resolved_context().main_server.as_deref(),
            Some("10.0.0.5")
        );
        assert_eq!(config.release_hosts().count(), 1);
    }

    #[test]
    fn test_so001_resolved_release_name_is_stable() {
        let config: ProjectConfig =
            serde_yaml_ng::from_str("version: \"1.0\"\nname: myapp\n").unwrap();
        let ctx = config.resolved_context();
        let name = ctx.release_name.clone().unwrap();
        assert_eq!(name.len(), 14);
        assert_eq!(ctx.release_name(), name);
    }
}
