//! SO-021: Ruby source install script, composed from named fragments.
//!
//! The script runs under `set -e` on the host. Compiler output goes to a
//! timestamped log under /tmp whose path is echoed first thing.

use super::types::SoloConfig;
use crate::transport::shell_quote;

/// Remote path the script is written to before running it.
pub const SCRIPT_PATH: &str = "/tmp/install-ruby.sh";

/// Performance patches for 1.9.2: REE-style GC tuning and the optimized
/// require by Xavier Shay. Both landed upstream in 1.9.3.
pub const RUBY_PATCHES: [(&str, &str); 2] = [
    (
        "ree_gc_tuning.diff",
        "https://raw.github.com/michaeledgar/ruby-patches/master/1.9/ree_gc_tuning/ree_gc_tuning.diff",
    ),
    (
        "by_xavier_shay.diff",
        "https://raw.github.com/michaeledgar/ruby-patches/master/1.9/optimized_require/by_xavier_shay.diff",
    ),
];

const PATCHABLE_PREFIX: &str = "ruby-1.9.2";

/// A resolved Ruby source install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubyInstall {
    pub version: String,
    pub url: String,
    pub dir: String,
    pub tar_name: String,
    pub patches: bool,
    make_install: String,
}

impl RubyInstall {
    pub fn from_config(cfg: &SoloConfig) -> Self {
        let version = cfg.ruby_version().to_string();
        let url = cfg.ruby_url();
        let tar_name = url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.tar.gz", version));
        Self {
            patches: wants_patches(&version, cfg.apply_ruby_patches),
            dir: cfg.ruby_dir().to_string(),
            make_install: cfg.elevate("make install"),
            version,
            url,
            tar_name,
        }
    }

    /// Where the downloaded tarball lives on the host.
    pub fn archive_path(&self) -> String {
        format!("/tmp/{}", self.tar_name)
    }

    pub fn preamble(&self) -> String {
        [
            "set -e",
            "cd /tmp",
            "",
            "log=/tmp/install-ruby-$(date +%s).log",
            "echo \"=== Note: output is saved to $log\"",
            "touch $log",
        ]
        .join("\n")
    }

    /// Download the tarball unless it is already in /tmp.
    pub fn fetch(&self) -> String {
        let tar = shell_quote(&self.tar_name);
        format!(
            "if [[ ! -f {tar} ]]; then\n  \
               echo \"=== Downloading {version} from {url}\"\n  \
               curl -s -o {tar} {quoted_url}\n\
             else\n  \
               echo \"=== $(pwd)/{name} already present, using that one instead of downloading a new one\"\n\
             fi",
            tar = tar,
            version = self.version,
            url = self.url,
            quoted_url = shell_quote(&self.url),
            name = self.tar_name,
        )
    }

    pub fn extract(&self) -> String {
        let dir = shell_quote(&self.dir);
        format!(
            "rm -rf {dir}\ntar -zxf {tar}\ncd {dir}",
            dir = dir,
            tar = shell_quote(&self.tar_name)
        )
    }

    /// Empty when patching does not apply.
    pub fn patch(&self) -> String {
        if !self.patches {
            return String::new();
        }
        let mut lines = vec!["echo \"=== Applying Ruby patches\"".to_string()];
        for (file, url) in RUBY_PATCHES {
            lines.push(format!("curl -s -o {} {}", file, url));
        }
        for (file, _) in RUBY_PATCHES {
            lines.push(format!("patch -p 1 < {} >> $log", file));
        }
        lines.join("\n")
    }

    pub fn build(&self) -> String {
        let v = &self.version;
        [
            format!("echo \"=== Configuring {}\"", v),
            "./configure --disable-install-doc >> $log".to_string(),
            String::new(),
            format!("echo \"=== Compiling {}\"", v),
            "make >> $log 2>&1".to_string(),
            String::new(),
            format!("echo \"=== Installing {}\"", v),
            format!("{} >> $log", self.make_install),
        ]
        .join("\n")
    }

    /// The full script.
    pub fn render(&self) -> String {
        let fragments = [
            self.preamble(),
            self.fetch(),
            self.extract(),
            self.patch(),
            self.build(),
        ];
        let mut script = fragments
            .iter()
            .filter(|f| !f.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n");
        script.push('\n');
        script
    }
}

/// Patches only apply to 1.9.2 and can be switched off.
pub fn wants_patches(version: &str, enabled: bool) -> bool {
    enabled && version.starts_with(PATCHABLE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Os;

    fn install(version: &str, patches: bool) -> RubyInstall {
        RubyInstall::from_config(&SoloConfig {
            ruby_version: Some(version.to_string()),
            apply_ruby_patches: patches,
            ..SoloConfig::default()
        })
    }

    #[test]
    fn test_so021_patches_for_192() {
        let script = install("ruby-1.9.2-p189", true).render();
        assert!(script.contains("curl -s -o ree_gc_tuning.diff"));
        assert!(script.contains("curl -s -o by_xavier_shay.diff"));
        assert!(script.contains("patch -p 1 < ree_gc_tuning.diff >> $log"));
        assert!(script.contains("patch -p 1 < by_xavier_shay.diff >> $log"));
    }

    #[test]
    fn test_so021_no_patches_for_193() {
        for flag in [true, false] {
            let script = install("ruby-1.9.3-p0", flag).render();
            assert!(!script.contains("patch -p 1"));
            assert!(!script.contains("Applying Ruby patches"));
        }
    }

    #[test]
    fn test_so021_patches_disabled() {
        let script = install("ruby-1.9.2-p290", false).render();
        assert!(!script.contains(".diff"));
    }

    #[test]
    fn test_so021_wants_patches() {
        assert!(wants_patches("ruby-1.9.2-p290", true));
        assert!(!wants_patches("ruby-1.9.2-p290", false));
        assert!(!wants_patches("ruby-1.8.7", true));
        assert!(!wants_patches("jruby-1.9.2", true));
    }

    #[test]
    fn test_so021_default_resolution() {
        let r = RubyInstall::from_config(&SoloConfig::default());
        assert_eq!(r.tar_name, "ruby-1.9.2-p290.tar.gz");
        assert_eq!(r.dir, "ruby-1.9.2-p290");
        assert_eq!(r.archive_path(), "/tmp/ruby-1.9.2-p290.tar.gz");
        assert!(r.patches);
    }

    #[test]
    fn test_so021_custom_url_and_dir() {
        let r = RubyInstall::from_config(&SoloConfig {
            ruby_url: Some("http://mirror.example.com/rubies/ruby.tar.gz".into()),
            ruby_dir: Some("ruby-src-snapshot".into()),
            ..SoloConfig::default()
        });
        assert_eq!(r.tar_name, "ruby.tar.gz");
        let script = r.render();
        assert!(script.contains("tar -zxf 'ruby.tar.gz'"));
        assert!(script.contains("cd 'ruby-src-snapshot'"));
        assert!(script.contains("curl -s -o 'ruby.tar.gz' 'http://mirror.example.com/rubies/ruby.tar.gz'"));
    }

    #[test]
    fn test_so021_url_without_basename() {
        let r = RubyInstall::from_config(&SoloConfig {
            ruby_url: Some("http://mirror.example.com/rubies/".into()),
            ..SoloConfig::default()
        });
        assert_eq!(r.tar_name, "ruby-1.9.2-p290.tar.gz");
        assert!(r.fetch().contains("curl -s -o 'ruby-1.9.2-p290.tar.gz'"));
        assert_eq!(r.archive_path(), "/tmp/ruby-1.9.2-p290.tar.gz");
    }

    #[test]
    fn test_so021_fragment_order() {
        let script = install("ruby-1.9.2-p290", true).render();
        let pos = |s: &str| script.find(s).unwrap();
        assert!(script.starts_with("set -e\n"));
        assert!(pos("=== Note: output is saved to $log") < pos("if [[ ! -f"));
        assert!(pos("if [[ ! -f") < pos("tar -zxf"));
        assert!(pos("tar -zxf") < pos("Applying Ruby patches"));
        assert!(pos("Applying Ruby patches") < pos("./configure"));
        assert!(pos("./configure") < pos("make >> $log 2>&1"));
        assert!(script.ends_with("sudo make install >> $log\n"));
    }

    #[test]
    fn test_so021_make_install_elevated_per_os() {
        let r = RubyInstall::from_config(&SoloConfig {
            os: Os::Centos,
            ..SoloConfig::default()
        });
        assert!(r.render().contains("sudo env PATH=$PATH make install >> $log"));
    }

    #[test]
    fn test_so021_download_guarded() {
        let fetch = install("ruby-1.9.2-p290", true).fetch();
        assert!(fetch.starts_with("if [[ ! -f 'ruby-1.9.2-p290.tar.gz' ]]; then"));
        assert!(fetch.contains("already present"));
    }
}
